use crate::{
    config::IAPConfig,
    error::{ApiError, Result},
    models::{
        common::{PurchaseKind, PurchasePlatform},
        purchases::{credit_pack_amount, VerifiedReceipt},
    },
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

/// External collaborator boundary for store receipt verification.
///
/// The production implementation talks to the Apple/Google endpoints;
/// tests substitute a mock so purchase processing can be exercised
/// without network access.
#[async_trait::async_trait]
pub trait ReceiptGateway: Send + Sync {
    async fn verify(
        &self,
        platform: PurchasePlatform,
        receipt: &str,
    ) -> Result<VerifiedReceipt>;
}

pub struct StoreReceiptGateway {
    config: IAPConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AppleReceiptResponse {
    status: i32,
    receipt: Option<AppleReceipt>,
    latest_receipt_info: Option<Vec<AppleTransaction>>,
}

#[derive(Debug, Deserialize)]
struct AppleReceipt {
    original_transaction_id: String,
    product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppleTransaction {
    original_transaction_id: String,
    product_id: String,
    expires_date_ms: Option<String>,
}

/// Client-side Play purchase payload presented as the "receipt"
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleReceipt {
    product_id: String,
    purchase_token: String,
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSubscriptionPurchase {
    expiry_time_millis: Option<String>,
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleProductPurchase {
    /// 0 = purchased, 1 = cancelled, 2 = pending
    purchase_state: i32,
    order_id: Option<String>,
}

impl StoreReceiptGateway {
    pub fn new(config: &IAPConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.verify_timeout_seconds))
            .build()
            .map_err(|e| {
                ApiError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            config: config.clone(),
            http_client,
        })
    }

    /// Verify an App Store receipt
    async fn verify_apple_receipt(&self, receipt: &str) -> Result<VerifiedReceipt> {
        // Determine endpoint based on environment
        let endpoint = match self.config.apple_environment.as_str() {
            "production" => "https://buy.itunes.apple.com/verifyReceipt",
            _ => "https://sandbox.itunes.apple.com/verifyReceipt",
        };

        let request_body = serde_json::json!({
            "receipt-data": receipt,
            "password": self.config.apple_shared_secret,
            "exclude-old-transactions": true,
        });

        let response = self
            .http_client
            .post(endpoint)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiError::InvalidReceipt(format!("Failed to verify receipt: {}", e)))?;

        let apple_response: AppleReceiptResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidReceipt(format!("Invalid response format: {}", e)))?;

        // Check status code
        if apple_response.status != 0 {
            return Err(ApiError::InvalidReceipt(format!(
                "Invalid receipt status: {}",
                apple_response.status
            )));
        }

        // Extract transaction info from latest_receipt_info or receipt
        let transaction_opt = apple_response
            .latest_receipt_info
            .as_ref()
            .and_then(|txns| txns.first());

        let (transaction_id, product_id, expires_date_ms) =
            if let Some(transaction) = transaction_opt {
                (
                    transaction.original_transaction_id.clone(),
                    Some(transaction.product_id.clone()),
                    transaction.expires_date_ms.clone(),
                )
            } else if let Some(receipt) = &apple_response.receipt {
                // No transaction info - likely a non-subscription purchase
                (
                    receipt.original_transaction_id.clone(),
                    receipt.product_id.clone(),
                    None,
                )
            } else {
                return Err(ApiError::InvalidReceipt(
                    "No receipt or transaction found".to_string(),
                ));
            };

        let expires_at = expires_date_ms
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ts_ms| time::OffsetDateTime::from_unix_timestamp(ts_ms / 1000).ok());

        let verified = classify_product(transaction_id, product_id, expires_at)?;

        info!(
            "Successfully verified Apple IAP receipt: type={:?}, product_id={:?}",
            verified.kind, verified.product_id
        );

        Ok(verified)
    }

    /// Verify a Play Billing purchase against the Play Developer API
    async fn verify_google_receipt(&self, receipt: &str) -> Result<VerifiedReceipt> {
        let parsed: GoogleReceipt = serde_json::from_str(receipt).map_err(|e| {
            ApiError::InvalidReceipt(format!("Malformed Play purchase payload: {}", e))
        })?;

        let access_token = self.config.google_access_token.as_deref().ok_or_else(|| {
            ApiError::InvalidReceipt("Google Play verification is not configured".to_string())
        })?;

        let is_subscription = is_subscription_product(&parsed.product_id);

        if is_subscription {
            let url = format!(
                "{}/androidpublisher/v3/applications/{}/purchases/subscriptions/{}/tokens/{}",
                self.config.google_api_base,
                self.config.google_package_name,
                parsed.product_id,
                parsed.purchase_token,
            );

            let purchase: GoogleSubscriptionPurchase = self
                .http_client
                .get(&url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| ApiError::InvalidReceipt(format!("Failed to verify receipt: {}", e)))?
                .error_for_status()
                .map_err(|e| ApiError::InvalidReceipt(format!("Receipt rejected by store: {}", e)))?
                .json()
                .await
                .map_err(|e| ApiError::InvalidReceipt(format!("Invalid response format: {}", e)))?;

            let expires_at = purchase
                .expiry_time_millis
                .and_then(|ms| ms.parse::<i64>().ok())
                .and_then(|ts_ms| time::OffsetDateTime::from_unix_timestamp(ts_ms / 1000).ok());

            let transaction_id = purchase
                .order_id
                .or(parsed.order_id)
                .unwrap_or(parsed.purchase_token);

            classify_product(transaction_id, Some(parsed.product_id), expires_at)
        } else {
            let url = format!(
                "{}/androidpublisher/v3/applications/{}/purchases/products/{}/tokens/{}",
                self.config.google_api_base,
                self.config.google_package_name,
                parsed.product_id,
                parsed.purchase_token,
            );

            let purchase: GoogleProductPurchase = self
                .http_client
                .get(&url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| ApiError::InvalidReceipt(format!("Failed to verify receipt: {}", e)))?
                .error_for_status()
                .map_err(|e| ApiError::InvalidReceipt(format!("Receipt rejected by store: {}", e)))?
                .json()
                .await
                .map_err(|e| ApiError::InvalidReceipt(format!("Invalid response format: {}", e)))?;

            if purchase.purchase_state != 0 {
                return Err(ApiError::InvalidReceipt(format!(
                    "Purchase not in purchased state: {}",
                    purchase.purchase_state
                )));
            }

            let transaction_id = purchase
                .order_id
                .or(parsed.order_id)
                .unwrap_or(parsed.purchase_token);

            classify_product(transaction_id, Some(parsed.product_id), None)
        }
    }
}

#[async_trait::async_trait]
impl ReceiptGateway for StoreReceiptGateway {
    #[instrument(skip(self, receipt))]
    async fn verify(
        &self,
        platform: PurchasePlatform,
        receipt: &str,
    ) -> Result<VerifiedReceipt> {
        match platform {
            PurchasePlatform::Ios => self.verify_apple_receipt(receipt).await,
            PurchasePlatform::Android => self.verify_google_receipt(receipt).await,
        }
    }
}

fn is_subscription_product(product_id: &str) -> bool {
    product_id.contains("premium")
}

/// Classify a verified transaction as subscription or consumable pack.
fn classify_product(
    transaction_id: String,
    product_id: Option<String>,
    expires_at: Option<time::OffsetDateTime>,
) -> Result<VerifiedReceipt> {
    if let Some(id) = product_id.as_deref() {
        if is_subscription_product(id) {
            return Ok(VerifiedReceipt {
                transaction_id,
                product_id,
                kind: PurchaseKind::Subscription,
                credits: None,
                expires_at,
            });
        }

        if let Some(amount) = credit_pack_amount(id) {
            return Ok(VerifiedReceipt {
                transaction_id,
                product_id,
                kind: PurchaseKind::Consumable,
                credits: Some(amount),
                expires_at: None,
            });
        }
    }

    Err(ApiError::InvalidReceipt(format!(
        "Unknown product: {:?}",
        product_id
    )))
}

/// Generate hash for receipt storage; raw receipts never hit the database.
pub fn hash_receipt(receipt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(receipt.as_bytes());
    format!("{:x}", hasher.finalize())
}
