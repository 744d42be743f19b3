use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseEvents::UserId).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseEvents::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseEvents::ProductId).string().null())
                    .col(ColumnDef::new(PurchaseEvents::Platform).string().not_null())
                    .col(ColumnDef::new(PurchaseEvents::AppVersion).string().null())
                    .col(
                        ColumnDef::new(PurchaseEvents::EventType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseEvents::CreditsGranted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseEvents::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PurchaseEvents::ReceiptHash).string().null())
                    .col(
                        ColumnDef::new(PurchaseEvents::VerifiedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Replay protection: one row per store transaction.
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_events_transaction_id")
                    .table(PurchaseEvents::Table)
                    .col(PurchaseEvents::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_events_user_id")
                    .table(PurchaseEvents::Table)
                    .col(PurchaseEvents::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PurchaseEvents {
    Table,
    Id,
    UserId,
    TransactionId,
    ProductId,
    Platform,
    AppVersion,
    EventType,
    CreditsGranted,
    ExpiresAt,
    ReceiptHash,
    VerifiedAt,
}
