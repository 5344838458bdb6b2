use sea_orm::entity::prelude::*;

/// Credentials for one third-party ingestion channel.
/// The secret is stored only as a bcrypt hash.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub channel_name: String,
    #[sea_orm(unique)]
    pub api_key: String,
    pub api_secret_hash: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::viewing_records::Entity")]
    ViewingRecords,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::viewing_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ViewingRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
