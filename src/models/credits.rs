use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::CreditBalance;

/// GET /api/v1/credits
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalanceResponse {
    pub success: bool,
    pub data: CreditBalance,
}

/// POST /api/v1/credits/consume request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeCreditsRequest {
    #[validate(range(min = 1, max = 1000))]
    pub amount: i32,
}

/// POST /api/v1/credits/consume response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeCreditsResponse {
    pub success: bool,
    pub data: ConsumeCreditsData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeCreditsData {
    pub consumed: i32,
    pub from_free: i32,
    pub from_paid: i32,
    pub balance: CreditBalance,
}
