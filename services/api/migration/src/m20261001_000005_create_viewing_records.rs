use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ViewingRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ViewingRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ViewingRecords::TenantName)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ViewingRecords::PrimaryPhone).string_len(20).null())
                    .col(ColumnDef::new(ViewingRecords::BackupPhone).string_len(20).null())
                    .col(ColumnDef::new(ViewingRecords::Wechat).string_len(50).null())
                    .col(
                        ColumnDef::new(ViewingRecords::ViewingDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ViewingRecords::PropertyId).uuid().null())
                    .col(ColumnDef::new(ViewingRecords::RoomAddress).string_len(255).null())
                    .col(
                        ColumnDef::new(ViewingRecords::PreferredLocation)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(ViewingRecords::BudgetRange).string_len(50).null())
                    .col(ColumnDef::new(ViewingRecords::Requirements).text().null())
                    .col(
                        ColumnDef::new(ViewingRecords::ViewingStatus)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ViewingRecords::BusinessType)
                            .string_len(20)
                            .not_null()
                            .default("whole_rent"),
                    )
                    .col(
                        ColumnDef::new(ViewingRecords::Source)
                            .string_len(20)
                            .not_null()
                            .default("manual"),
                    )
                    .col(ColumnDef::new(ViewingRecords::ApiKeyId).uuid().null())
                    .col(ColumnDef::new(ViewingRecords::AgentId).uuid().null())
                    .col(ColumnDef::new(ViewingRecords::Remarks).text().null())
                    .col(ColumnDef::new(ViewingRecords::ViewingFeedback).text().null())
                    .col(
                        ColumnDef::new(ViewingRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ViewingRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ViewingRecords::Table, ViewingRecords::AgentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ViewingRecords::Table, ViewingRecords::ApiKeyId)
                            .to(ApiKeys::Table, ApiKeys::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ViewingRecords::Table, ViewingRecords::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ViewingRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ViewingRecords {
    Table,
    Id,
    TenantName,
    PrimaryPhone,
    BackupPhone,
    Wechat,
    ViewingDate,
    PropertyId,
    RoomAddress,
    PreferredLocation,
    BudgetRange,
    Requirements,
    ViewingStatus,
    BusinessType,
    Source,
    ApiKeyId,
    AgentId,
    Remarks,
    ViewingFeedback,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum ApiKeys {
    Table,
    Id,
}

#[derive(Iden)]
enum Properties {
    Table,
    Id,
}
