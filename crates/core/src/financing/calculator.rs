//! Fee and installment calculator.
//!
//! All money math is `rust_decimal` with banker-unfriendly explicit rounding:
//! monetary results are quantized to two decimal places, away from zero on
//! the midpoint, matching what the payment gateways settle.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::financing::error::FinancingError;

/// Maximum repayment period in months.
pub const MAX_PERIOD_MONTHS: u32 = 120;

/// The computed terms for a financing amount, period, and fee percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingQuote {
    /// Principal amount requested.
    pub amount: Decimal,
    /// Repayment period in months.
    pub period_months: u32,
    /// Fee percentage applied.
    pub fee_percentage: Decimal,
    /// One-time fee: `amount * fee_percentage / 100`, quantized to 2dp.
    pub fee_amount: Decimal,
    /// Per-month installment: `amount / period_months`, quantized to 2dp.
    pub monthly_installment: Decimal,
    /// Principal plus fee.
    pub total_with_fee: Decimal,
}

fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the quote for a financing request.
///
/// # Errors
///
/// Returns an error if the amount is not positive, the period is out of
/// range, or the fee percentage is outside `[0, 100]`.
pub fn calculate_quote(
    amount: Decimal,
    period_months: u32,
    fee_percentage: Decimal,
) -> Result<FinancingQuote, FinancingError> {
    if amount <= Decimal::ZERO {
        return Err(FinancingError::InvalidAmount);
    }
    if period_months == 0 || period_months > MAX_PERIOD_MONTHS {
        return Err(FinancingError::InvalidPeriod {
            max: MAX_PERIOD_MONTHS,
        });
    }
    if fee_percentage < Decimal::ZERO || fee_percentage > Decimal::ONE_HUNDRED {
        return Err(FinancingError::InvalidFeePercentage);
    }

    let fee_amount = quantize(amount * fee_percentage / Decimal::ONE_HUNDRED);
    let monthly_installment = quantize(amount / Decimal::from(period_months));
    let total_with_fee = quantize(amount + fee_amount);

    Ok(FinancingQuote {
        amount,
        period_months,
        fee_percentage,
        fee_amount,
        monthly_installment,
        total_with_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_quote() {
        let quote = calculate_quote(dec!(6000), 12, dec!(4.00)).unwrap();
        assert_eq!(quote.fee_amount, dec!(240.00));
        assert_eq!(quote.monthly_installment, dec!(500.00));
        assert_eq!(quote.total_with_fee, dec!(6240.00));
    }

    #[test]
    fn test_uneven_division_rounds_to_cents() {
        let quote = calculate_quote(dec!(1000), 3, dec!(4.00)).unwrap();
        assert_eq!(quote.monthly_installment, dec!(333.33));
        assert_eq!(quote.fee_amount, dec!(40.00));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        // 1.25% of 1234 = 15.425 -> 15.43
        let quote = calculate_quote(dec!(1234), 12, dec!(1.25)).unwrap();
        assert_eq!(quote.fee_amount, dec!(15.43));
    }

    #[test]
    fn test_zero_fee_percentage_is_allowed() {
        let quote = calculate_quote(dec!(500), 5, Decimal::ZERO).unwrap();
        assert_eq!(quote.fee_amount, dec!(0.00));
        assert_eq!(quote.total_with_fee, dec!(500.00));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            calculate_quote(Decimal::ZERO, 12, dec!(4)),
            Err(FinancingError::InvalidAmount)
        ));
        assert!(matches!(
            calculate_quote(dec!(-100), 12, dec!(4)),
            Err(FinancingError::InvalidAmount)
        ));
        assert!(matches!(
            calculate_quote(dec!(1000), 0, dec!(4)),
            Err(FinancingError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            calculate_quote(dec!(1000), 121, dec!(4)),
            Err(FinancingError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            calculate_quote(dec!(1000), 12, dec!(101)),
            Err(FinancingError::InvalidFeePercentage)
        ));
        assert!(matches!(
            calculate_quote(dec!(1000), 12, dec!(-1)),
            Err(FinancingError::InvalidFeePercentage)
        ));
    }
}
