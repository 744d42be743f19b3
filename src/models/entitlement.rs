use serde::{Deserialize, Serialize};

use super::common::{CreditBalance, SubscriptionStatus};

/// Free-trial window derived from the registration date; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTrialStatus {
    pub is_active: bool,
    pub days_remaining: i32,
    pub is_in_trial: bool,
}

impl FreeTrialStatus {
    /// Status for an absent or unparseable registration date.
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            days_remaining: 0,
            is_in_trial: false,
        }
    }
}

/// Outcome of the analysis access gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAccess {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AccessDenialReason>,
}

impl AnalysisAccess {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: AccessDenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenialReason {
    /// Premium or in-trial, but the credit balance is zero.
    InsufficientCredits,
    /// Trial over and no subscription, org membership, or gift code.
    MustSubscribe,
}

/// GET /api/v1/entitlement
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    pub success: bool,
    pub data: EntitlementData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementData {
    pub is_premium: bool,
    pub subscription_status: SubscriptionStatus,
    pub trial: FreeTrialStatus,
    pub balance: CreditBalance,
}

/// POST /api/v1/analysis/access
///
/// Denial is a domain answer, not a transport error, so the endpoint
/// takes no body and always answers 200 with the gate outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAccessResponse {
    pub success: bool,
    pub data: AnalysisAccess,
}
