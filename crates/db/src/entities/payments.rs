//! `SeaORM` Entity for payments across both gateways.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub financing_application_id: Option<Uuid>,
    pub installment_id: Option<Uuid>,
    pub payment_type: String,
    pub payment_method: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub transaction_reference: String,
    pub card_session_id: Option<String>,
    pub card_payment_intent_id: Option<String>,
    pub crypto_payment_id: Option<String>,
    pub crypto_order_id: Option<String>,
    pub crypto_address: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((18, 8)))", nullable)]
    pub crypto_amount: Option<Decimal>,
    pub crypto_currency: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::financing_applications::Entity",
        from = "Column::FinancingApplicationId",
        to = "super::financing_applications::Column::Id"
    )]
    FinancingApplications,
    #[sea_orm(
        belongs_to = "super::installments::Entity",
        from = "Column::InstallmentId",
        to = "super::installments::Column::Id"
    )]
    Installments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::financing_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancingApplications.def()
    }
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
