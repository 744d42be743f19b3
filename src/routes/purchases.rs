use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::purchases::{VerifyPurchaseRequest, VerifyPurchaseResponse},
};

/// POST /api/v1/purchases/verify
#[instrument(skip(state, request))]
pub async fn verify_purchase(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<VerifyPurchaseRequest>,
) -> Result<Json<VerifyPurchaseResponse>> {
    // Validate request shape before calling the store
    request
        .validate()
        .map_err(|e| ApiError::InvalidArgument(format!("Validation error: {}", e)))?;

    let data = state
        .account_service
        .process_purchase(&identity.user_id, &request)
        .await?;

    Ok(Json(VerifyPurchaseResponse {
        success: true,
        data,
    }))
}
