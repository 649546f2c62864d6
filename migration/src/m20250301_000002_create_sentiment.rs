use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sentiment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sentiment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sentiment::Netuid).integer().not_null())
                    .col(ColumnDef::new(Sentiment::Hotkey).string_len(64).not_null())
                    .col(ColumnDef::new(Sentiment::SentimentScore).double().not_null())
                    .col(
                        ColumnDef::new(Sentiment::TweetCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Sentiment::ObservedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // 'stake' or 'unstake'
                    .col(ColumnDef::new(Sentiment::ActionTaken).string_len(16).null())
                    .col(ColumnDef::new(Sentiment::ActionAmount).double().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sentiment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Sentiment {
    Table,
    Id,
    Netuid,
    Hotkey,
    SentimentScore,
    TweetCount,
    ObservedAt,
    ActionTaken,
    ActionAmount,
}
