use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Verified purchase record, one row per store transaction.
///
/// `transaction_id` carries a unique index; inserting with
/// ON CONFLICT DO NOTHING is what makes purchase processing idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub product_id: Option<String>,
    /// "android" | "ios"
    pub platform: String,
    /// Client app version that submitted the receipt, when reported.
    pub app_version: Option<String>,
    /// "subscription" | "consumable"
    pub event_type: String,
    pub credits_granted: i32,
    pub expires_at: Option<TimeDateTimeWithTimeZone>,
    /// SHA-256 of the raw receipt; raw receipts are never persisted.
    pub receipt_hash: Option<String>,
    pub verified_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
