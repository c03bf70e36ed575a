//! `SeaORM` Entity for generated documents.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub financing_application_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
    pub document_type: String,
    pub document_number: String,
    pub title: String,
    pub storage_key: String,
    pub verification_code: String,
    pub is_signed: bool,
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
    #[sea_orm(has_many = "super::signature_requests::Entity")]
    SignatureRequests,
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

impl Related<super::signature_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SignatureRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
