use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per user, keyed by the opaque identity from the auth token.
///
/// The subscription fields are kept both nested-style (status/tier/platform/
/// expiry/start) and as the `is_premium` flat flag the mobile clients read.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: String,
    /// "free" | "active" | "cancelled" | "expired"
    pub subscription_status: String,
    pub subscription_tier: Option<String>,
    pub subscription_platform: Option<String>,
    pub subscription_expires_at: Option<TimeDateTimeWithTimeZone>,
    pub subscription_started_at: Option<TimeDateTimeWithTimeZone>,
    pub is_premium: bool,
    pub free_credits: i32,
    pub paid_credits: i32,
    /// Registration day as YYYY-MM-DD, the format the clients store.
    pub registration_date: Option<String>,
    pub b2b2c_org_id: Option<String>,
    pub gift_code_active: bool,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
