use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::SubscriptionStatus)
                            .string()
                            .not_null()
                            .default("free"),
                    )
                    .col(ColumnDef::new(Accounts::SubscriptionTier).string().null())
                    .col(
                        ColumnDef::new(Accounts::SubscriptionPlatform)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::SubscriptionExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::SubscriptionStartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsPremium)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::FreeCredits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::PaidCredits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::RegistrationDate).string().null())
                    .col(ColumnDef::new(Accounts::B2b2cOrgId).string().null())
                    .col(
                        ColumnDef::new(Accounts::GiftCodeActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index on user_id; account creation relies on
        // ON CONFLICT DO NOTHING against this index.
        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_user_id")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Both counters must stay non-negative; the services reject
        // underflow, the database enforces it as a last line.
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE accounts ADD CONSTRAINT chk_accounts_credits_non_negative \
                 CHECK (free_credits >= 0 AND paid_credits >= 0)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    UserId,
    SubscriptionStatus,
    SubscriptionTier,
    SubscriptionPlatform,
    SubscriptionExpiresAt,
    SubscriptionStartedAt,
    IsPremium,
    FreeCredits,
    PaidCredits,
    RegistrationDate,
    B2b2cOrgId,
    GiftCodeActive,
    CreatedAt,
    UpdatedAt,
}
