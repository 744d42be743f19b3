use crate::{
    error::{ApiError, Result},
    models::{account_ext::AccountExt, common::CreditBalance},
};
use sea_orm::{
    entity::*, query::*, DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use tracing::{info, instrument};

/// Owns every mutation of the free/paid credit counters.
///
/// All writes go through a row lock inside a transaction, so two
/// concurrent grants (or a grant racing a consume) never lose an update.
pub struct LedgerService {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct ConsumedCredits {
    pub from_free: i32,
    pub from_paid: i32,
    pub balance: CreditBalance,
}

impl LedgerService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current balance; an account that was never provisioned reads as zero.
    #[instrument(skip(self))]
    pub async fn balance(&self, user_id: &str) -> Result<CreditBalance> {
        let account = entity::accounts::Entity::find()
            .filter(entity::accounts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(account
            .map(|a| a.balance())
            .unwrap_or(CreditBalance::new(0, 0)))
    }

    /// Consume credits, free counter first, remainder from paid.
    ///
    /// Rejected (not clamped) when the total balance is short; neither
    /// counter can go negative.
    #[instrument(skip(self))]
    pub async fn consume(&self, user_id: &str, amount: i32) -> Result<ConsumedCredits> {
        if amount <= 0 {
            return Err(ApiError::InvalidArgument(
                "Consume amount must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let account = self.find_and_lock(user_id, &txn).await?;

        let mut free_credits = account.free_credits;
        let mut paid_credits = account.paid_credits;
        let total = free_credits + paid_credits;

        if total < amount {
            txn.rollback().await?;
            return Err(ApiError::InsufficientCredits(format!(
                "Needed {}, have {} ({} free + {} paid)",
                amount, total, free_credits, paid_credits
            )));
        }

        // Free credits are consumed first; they have no purchase backing them
        let from_free = amount.min(free_credits);
        let from_paid = amount - from_free;
        free_credits -= from_free;
        paid_credits -= from_paid;

        let mut account_active: entity::accounts::ActiveModel = account.into();
        account_active.free_credits = Set(free_credits);
        account_active.paid_credits = Set(paid_credits);
        account_active.updated_at = Set(time::OffsetDateTime::now_utc());
        account_active.update(&txn).await?;

        txn.commit().await?;

        info!(
            "Consumed {} credits for user {}: {} from free, {} from paid",
            amount, user_id, from_free, from_paid
        );

        Ok(ConsumedCredits {
            from_free,
            from_paid,
            balance: CreditBalance::new(free_credits, paid_credits),
        })
    }

    /// Grant paid credits within an existing transaction.
    ///
    /// Used by purchase processing so the grant commits or rolls back
    /// together with the purchase event row.
    #[instrument(skip(self, txn))]
    pub async fn grant_paid_in_txn(
        &self,
        user_id: &str,
        amount: i32,
        txn: &DatabaseTransaction,
    ) -> Result<entity::accounts::Model> {
        if amount <= 0 {
            return Err(ApiError::InvalidArgument(
                "Grant amount must be positive".to_string(),
            ));
        }

        let account = self.find_and_lock(user_id, txn).await?;

        let new_paid = account.paid_credits + amount;
        let mut account_active: entity::accounts::ActiveModel = account.into();
        account_active.paid_credits = Set(new_paid);
        account_active.updated_at = Set(time::OffsetDateTime::now_utc());
        let updated = account_active.update(txn).await?;

        info!(
            "Granted {} paid credits to user {} (new paid balance: {})",
            amount, user_id, new_paid
        );

        Ok(updated)
    }

    /// Helper: fetch the account row with an exclusive lock.
    async fn find_and_lock(
        &self,
        user_id: &str,
        txn: &DatabaseTransaction,
    ) -> Result<entity::accounts::Model> {
        entity::accounts::Entity::find()
            .filter(entity::accounts::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No account for user {}", user_id)))
    }
}
