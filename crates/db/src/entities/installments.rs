//! `SeaORM` Entity for repayment installments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub financing_application_id: Uuid,
    pub sequence: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount_paid: Decimal,
    pub due_date: Date,
    pub status: String,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::financing_applications::Entity",
        from = "Column::FinancingApplicationId",
        to = "super::financing_applications::Column::Id"
    )]
    FinancingApplications,
    #[sea_orm(has_many = "super::scheduled_payments::Entity")]
    ScheduledPayments,
}

impl Related<super::financing_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancingApplications.def()
    }
}

impl Related<super::scheduled_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduledPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
