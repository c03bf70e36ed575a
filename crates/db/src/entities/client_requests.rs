//! `SeaORM` Entity for client service requests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "client_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub financing_application_id: Option<Uuid>,
    pub request_type: String,
    pub status: String,
    pub subject: String,
    pub description: Option<String>,
    pub details: Json,
    pub admin_response: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
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

impl ActiveModelBehavior for ActiveModel {}
