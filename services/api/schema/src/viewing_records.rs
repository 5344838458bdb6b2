use sea_orm::entity::prelude::*;

/// A prospective-tenant lead / viewing appointment.
///
/// `viewing_status`, `business_type` and `source` hold the snake_case wire
/// names of the matching `crm_domain::viewing` enums.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "viewing_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_name: String,
    pub primary_phone: Option<String>,
    pub backup_phone: Option<String>,
    pub wechat: Option<String>,
    pub viewing_date: Option<chrono::DateTime<chrono::Utc>>,
    pub property_id: Option<Uuid>,
    pub room_address: Option<String>,
    pub preferred_location: Option<String>,
    pub budget_range: Option<String>,
    pub requirements: Option<String>,
    pub viewing_status: String,
    pub business_type: String,
    pub source: String,
    pub api_key_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub remarks: Option<String>,
    pub viewing_feedback: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AgentId",
        to = "super::users::Column::Id"
    )]
    Agent,
    #[sea_orm(
        belongs_to = "super::api_keys::Entity",
        from = "Column::ApiKeyId",
        to = "super::api_keys::Column::Id"
    )]
    ApiKey,
    #[sea_orm(
        belongs_to = "super::properties::Entity",
        from = "Column::PropertyId",
        to = "super::properties::Column::Id"
    )]
    Property,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agent.def()
    }
}

impl Related<super::api_keys::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiKey.def()
    }
}

impl Related<super::properties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
