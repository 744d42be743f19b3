use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{CreditBalance, PurchaseKind};

/// POST /api/v1/purchases/verify request
///
/// `platform` arrives as a raw string and is parsed against the known
/// stores, so an unsupported value is answered with the normal
/// invalid-argument envelope rather than a deserialization rejection.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPurchaseRequest {
    #[validate(length(min = 1, max = 20))]
    pub platform: String,
    #[validate(length(min = 10, max = 100000))]
    pub receipt: String,
    #[validate(length(max = 50))]
    pub app_version: Option<String>,
}

/// POST /api/v1/purchases/verify response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPurchaseResponse {
    pub success: bool,
    pub data: VerifyPurchaseData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPurchaseData {
    pub verified: bool,
    pub purchase_type: PurchaseKind,
    pub is_premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionFields>,
    pub credits_granted: i32,
    pub balance: CreditBalance,
}

/// Flat subscription fields mirrored back to the client after activation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFields {
    pub status: String,
    pub tier: Option<String>,
    pub platform: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<time::OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<time::OffsetDateTime>,
}

/// Result of a gateway verification call, consumed exactly once
/// to produce an account mutation.
#[derive(Debug, Clone)]
pub struct VerifiedReceipt {
    pub transaction_id: String,
    pub product_id: Option<String>,
    pub kind: PurchaseKind,
    /// Pack size for consumables; absent for subscriptions.
    pub credits: Option<i32>,
    /// Billing period end for subscriptions; absent for consumables.
    pub expires_at: Option<time::OffsetDateTime>,
}

/// Map a store product id to its consumable pack size.
///
/// The clients sell 50/150/300 packs under both dotted and underscored ids.
pub fn credit_pack_amount(product_id: &str) -> Option<i32> {
    for amount in [50, 150, 300] {
        if product_id.contains(&format!("credits.{}", amount))
            || product_id.contains(&format!("credits_{}", amount))
        {
            return Some(amount);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_pack_amount_known_packs() {
        assert_eq!(credit_pack_amount("com.coachplus.credits.50"), Some(50));
        assert_eq!(credit_pack_amount("com.coachplus.credits.150"), Some(150));
        assert_eq!(credit_pack_amount("coachplus_credits_300"), Some(300));
    }

    #[test]
    fn test_credit_pack_amount_unknown_product() {
        assert_eq!(credit_pack_amount("com.coachplus.premium.monthly"), None);
        assert_eq!(credit_pack_amount("com.coachplus.credits.999"), None);
    }
}
