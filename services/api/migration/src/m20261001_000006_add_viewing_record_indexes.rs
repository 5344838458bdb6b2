use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(ViewingRecords::Table)
                    .col(ViewingRecords::AgentId)
                    .col(ViewingRecords::CreatedAt)
                    .name("idx_viewing_records_agent_id_created_at")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(ViewingRecords::Table)
                    .col(ViewingRecords::ApiKeyId)
                    .name("idx_viewing_records_api_key_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(ViewingRecords::Table)
                    .col(ViewingRecords::ViewingStatus)
                    .name("idx_viewing_records_viewing_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_viewing_records_viewing_status")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_viewing_records_api_key_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_viewing_records_agent_id_created_at")
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum ViewingRecords {
    Table,
    AgentId,
    ApiKeyId,
    ViewingStatus,
    CreatedAt,
}
