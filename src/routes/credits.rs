use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::credits::{
        ConsumeCreditsData, ConsumeCreditsRequest, ConsumeCreditsResponse, CreditBalanceResponse,
    },
};

/// GET /api/v1/credits
#[instrument(skip(state, identity))]
pub async fn get_credit_balance(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<CreditBalanceResponse>> {
    let balance = state.ledger_service.balance(&identity.user_id).await?;

    Ok(Json(CreditBalanceResponse {
        success: true,
        data: balance,
    }))
}

/// POST /api/v1/credits/consume
#[instrument(skip(state, request))]
pub async fn consume_credits(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<ConsumeCreditsRequest>,
) -> Result<Json<ConsumeCreditsResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidArgument(format!("Validation error: {}", e)))?;

    // The account must exist before credits can move
    state
        .account_service
        .get_or_create(&identity.user_id)
        .await?;

    let consumed = state
        .ledger_service
        .consume(&identity.user_id, request.amount)
        .await?;

    Ok(Json(ConsumeCreditsResponse {
        success: true,
        data: ConsumeCreditsData {
            consumed: request.amount,
            from_free: consumed.from_free,
            from_paid: consumed.from_paid,
            balance: consumed.balance,
        },
    }))
}
