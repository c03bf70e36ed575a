//! `SeaORM` Entity for uploaded KYC evidence files.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "kyc_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kyc_application_id: Uuid,
    pub document_type: String,
    pub storage_key: String,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub is_verified: bool,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::kyc_applications::Entity",
        from = "Column::KycApplicationId",
        to = "super::kyc_applications::Column::Id"
    )]
    KycApplications,
}

impl Related<super::kyc_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KycApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
