use crate::{
    config::BillingConfig,
    error::{ApiError, Result},
    models::{
        account_ext::AccountExt,
        common::{PurchaseKind, PurchasePlatform, SubscriptionStatus},
        purchases::{SubscriptionFields, VerifiedReceipt, VerifyPurchaseData, VerifyPurchaseRequest},
    },
    services::{receipt_service::hash_receipt, LedgerService, ReceiptGateway},
};
use anyhow::anyhow;
use sea_orm::{
    entity::*, query::*, sea_query::OnConflict, DatabaseConnection, DatabaseTransaction,
    TransactionTrait,
};
use std::sync::Arc;
use time::{format_description::FormatItem, macros::format_description};
use tracing::{info, instrument};
use uuid::Uuid;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Applies verified purchase outcomes to the account record and owns
/// account provisioning. All mutation of an account funnels through here
/// or through [`LedgerService`].
pub struct AccountService {
    db: DatabaseConnection,
    gateway: Arc<dyn ReceiptGateway>,
    ledger: Arc<LedgerService>,
    billing: BillingConfig,
}

impl AccountService {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn ReceiptGateway>,
        ledger: Arc<LedgerService>,
        billing: &BillingConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            ledger,
            billing: billing.clone(),
        }
    }

    /// Get the account row, provisioning it on first touch.
    ///
    /// New accounts start on the free plan with the seeded free credits
    /// and today as the registration date. Insert uses ON CONFLICT DO
    /// NOTHING + re-read so concurrent first requests are safe.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: &str) -> Result<entity::accounts::Model> {
        if let Some(account) = entity::accounts::Entity::find()
            .filter(entity::accounts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
        {
            return Ok(account);
        }

        let now = time::OffsetDateTime::now_utc();
        let registration_date = now
            .date()
            .format(&DATE_FORMAT)
            .map_err(|e| ApiError::Internal(anyhow!("Failed to format date: {}", e)))?;

        let new_account = entity::accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            subscription_status: Set(SubscriptionStatus::Free.as_str().to_string()),
            subscription_tier: Set(None),
            subscription_platform: Set(None),
            subscription_expires_at: Set(None),
            subscription_started_at: Set(None),
            is_premium: Set(false),
            free_credits: Set(self.billing.initial_free_credits),
            paid_credits: Set(0),
            registration_date: Set(Some(registration_date)),
            b2b2c_org_id: Set(None),
            gift_code_active: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        entity::accounts::Entity::insert(new_account)
            .on_conflict(
                OnConflict::column(entity::accounts::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        // Return the existing or newly-inserted row
        entity::accounts::Entity::find()
            .filter(entity::accounts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(anyhow!("Failed to find account record after upsert"))
            })
    }

    /// Verify a purchase receipt and commit its outcome to the account.
    ///
    /// The purchase event row and the account mutation share one
    /// transaction: a replayed transaction_id is rejected with Conflict
    /// before any counter moves, and a crash between the two leaves no
    /// partial state.
    #[instrument(skip(self, request))]
    pub async fn process_purchase(
        &self,
        user_id: &str,
        request: &VerifyPurchaseRequest,
    ) -> Result<VerifyPurchaseData> {
        // An unsupported platform is rejected before the gateway is called
        // and before any database access
        let platform = PurchasePlatform::from_str(&request.platform).ok_or_else(|| {
            ApiError::InvalidArgument(format!("Unsupported platform: {}", request.platform))
        })?;

        // Verify the receipt against the store before touching any state
        let verified = self.gateway.verify(platform, &request.receipt).await?;

        // Make sure the account row exists outside the purchase transaction
        self.get_or_create(user_id).await?;

        let txn = self.db.begin().await?;

        self.record_event(user_id, platform, request, &verified, &txn)
            .await?;

        let updated = match verified.kind {
            PurchaseKind::Subscription => {
                self.apply_subscription(user_id, &verified, platform, &txn)
                    .await?
            }
            PurchaseKind::Consumable => {
                let credits = verified.credits.ok_or_else(|| {
                    ApiError::InvalidReceipt(
                        "Consumable purchase without a credit amount".to_string(),
                    )
                })?;
                self.ledger.grant_paid_in_txn(user_id, credits, &txn).await?
            }
        };

        txn.commit().await?;

        let credits_granted = match verified.kind {
            PurchaseKind::Subscription => self.billing.subscription_grant_credits,
            PurchaseKind::Consumable => verified.credits.unwrap_or(0),
        };

        info!(
            "Processed {} purchase for user {}: transaction={}, credits_granted={}",
            verified.kind.as_str(),
            user_id,
            verified.transaction_id,
            credits_granted
        );

        let subscription = match verified.kind {
            PurchaseKind::Subscription => Some(SubscriptionFields {
                status: updated.subscription_status.clone(),
                tier: updated.subscription_tier.clone(),
                platform: updated.subscription_platform.clone(),
                expires_at: updated.subscription_expires_at,
                started_at: updated.subscription_started_at,
            }),
            PurchaseKind::Consumable => None,
        };

        Ok(VerifyPurchaseData {
            verified: true,
            purchase_type: verified.kind,
            is_premium: updated.is_premium,
            subscription,
            credits_granted,
            balance: updated.balance(),
        })
    }

    /// Insert the purchase event row; a transaction_id seen before means
    /// a replayed receipt and is rejected with Conflict.
    async fn record_event(
        &self,
        user_id: &str,
        platform: PurchasePlatform,
        request: &VerifyPurchaseRequest,
        verified: &VerifiedReceipt,
        txn: &DatabaseTransaction,
    ) -> Result<Uuid> {
        let now = time::OffsetDateTime::now_utc();
        let event_id = Uuid::new_v4();

        let credits_granted = match verified.kind {
            PurchaseKind::Subscription => self.billing.subscription_grant_credits,
            PurchaseKind::Consumable => verified.credits.unwrap_or(0),
        };

        let new_event = entity::purchase_events::ActiveModel {
            id: Set(event_id),
            user_id: Set(user_id.to_string()),
            transaction_id: Set(verified.transaction_id.clone()),
            product_id: Set(verified.product_id.clone()),
            platform: Set(platform.as_str().to_string()),
            app_version: Set(request.app_version.clone()),
            event_type: Set(verified.kind.as_str().to_string()),
            credits_granted: Set(credits_granted),
            expires_at: Set(verified.expires_at),
            receipt_hash: Set(Some(hash_receipt(&request.receipt))),
            verified_at: Set(now),
        };

        // Insert atomically; if the transaction_id already exists, do nothing instead of erroring.
        entity::purchase_events::Entity::insert(new_event)
            .on_conflict(
                OnConflict::column(entity::purchase_events::Column::TransactionId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;

        // Check whether this event was inserted or already existed
        let persisted = entity::purchase_events::Entity::find()
            .filter(
                entity::purchase_events::Column::TransactionId.eq(&verified.transaction_id),
            )
            .one(txn)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(anyhow!(
                    "Failed to read purchase event after insert for transaction {}",
                    verified.transaction_id
                ))
            })?;

        if persisted.id != event_id {
            // Another transaction already processed this receipt
            return Err(ApiError::Conflict(format!(
                "Transaction {} already processed at {}",
                verified.transaction_id, persisted.verified_at
            )));
        }

        Ok(event_id)
    }

    /// Activate the subscription: grant the flat credit bonus, then set
    /// the subscription fields and the legacy is_premium flag.
    async fn apply_subscription(
        &self,
        user_id: &str,
        verified: &VerifiedReceipt,
        platform: PurchasePlatform,
        txn: &DatabaseTransaction,
    ) -> Result<entity::accounts::Model> {
        let granted = self
            .ledger
            .grant_paid_in_txn(user_id, self.billing.subscription_grant_credits, txn)
            .await?;

        let now = time::OffsetDateTime::now_utc();

        let mut account_active: entity::accounts::ActiveModel = granted.into();
        account_active.subscription_status =
            Set(SubscriptionStatus::Active.as_str().to_string());
        account_active.subscription_tier = Set(Some("premium".to_string()));
        account_active.subscription_platform = Set(Some(platform.as_str().to_string()));
        account_active.subscription_expires_at = Set(verified.expires_at);
        account_active.subscription_started_at = Set(Some(now));
        account_active.is_premium = Set(true);
        account_active.updated_at = Set(now);

        Ok(account_active.update(txn).await?)
    }
}
