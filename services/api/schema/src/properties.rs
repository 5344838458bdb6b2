use sea_orm::entity::prelude::*;

/// A rentable property a viewing can refer to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::viewing_records::Entity")]
    ViewingRecords,
}

impl Related<super::viewing_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ViewingRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
