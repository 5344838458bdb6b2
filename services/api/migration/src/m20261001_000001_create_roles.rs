use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roles::Name).string_len(20).not_null().unique_key())
                    .col(ColumnDef::new(Roles::Description).string_len(200).null())
                    .to_owned(),
            )
            .await?;

        // Role ids are resolved by name at runtime.
        let seed = Query::insert()
            .into_table(Roles::Table)
            .columns([Roles::Name, Roles::Description])
            .values_panic(["admin".into(), "Administrator with full access".into()])
            .values_panic(["agent".into(), "Agent scoped to own viewing records".into()])
            .on_conflict(OnConflict::column(Roles::Name).do_nothing().to_owned())
            .to_owned();
        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
    Description,
}
