use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only log of every fresh ledger read
        manager
            .create_table(
                Table::create()
                    .table(Dividends::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dividends::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dividends::Netuid).integer().not_null())
                    .col(ColumnDef::new(Dividends::Hotkey).string_len(64).not_null())
                    .col(ColumnDef::new(Dividends::Dividends).double().not_null())
                    .col(
                        ColumnDef::new(Dividends::ObservedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dividends::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Dividends {
    Table,
    Id,
    Netuid,
    Hotkey,
    Dividends,
    ObservedAt,
}
