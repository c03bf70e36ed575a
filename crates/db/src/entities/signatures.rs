//! `SeaORM` Entity for recorded signatures with consent evidence.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "signatures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub signature_request_id: Uuid,
    pub signature_text: String,
    pub consent_text: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::signature_requests::Entity",
        from = "Column::SignatureRequestId",
        to = "super::signature_requests::Column::Id"
    )]
    SignatureRequests,
}

impl Related<super::signature_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SignatureRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
