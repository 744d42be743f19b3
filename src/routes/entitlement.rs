use axum::{extract::State, Json};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::Result,
    middleware::UserIdentity,
    models::{
        account_ext::AccountExt,
        entitlement::{AnalysisAccessResponse, EntitlementData, EntitlementResponse},
    },
    services::entitlement_service::{
        can_access_analysis, check_free_trial_status, is_premium_user, usage_days,
        FREE_TRIAL_DAYS,
    },
};

/// GET /api/v1/entitlement
#[instrument(skip(state, identity))]
pub async fn get_entitlement(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<EntitlementResponse>> {
    let account = state
        .account_service
        .get_or_create(&identity.user_id)
        .await?;

    let registration = account.registration_date.as_deref();
    let trial = check_free_trial_status(registration);
    // A missing or unparseable registration date counts as out of trial
    let days = usage_days(registration).unwrap_or(FREE_TRIAL_DAYS + 1);
    let is_premium = is_premium_user(
        account.status(),
        days,
        account.b2b2c_org_id.as_deref(),
        account.gift_code_active,
    );

    Ok(Json(EntitlementResponse {
        success: true,
        data: EntitlementData {
            is_premium,
            subscription_status: account.status(),
            trial,
            balance: account.balance(),
        },
    }))
}

/// POST /api/v1/analysis/access
///
/// The gate for the AI analysis feature. Denial comes back as a 200 with
/// `allowed=false` and a reason; the client decides what to show.
#[instrument(skip(state, identity))]
pub async fn check_analysis_access(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<AnalysisAccessResponse>> {
    let account = state
        .account_service
        .get_or_create(&identity.user_id)
        .await?;

    let registration = account.registration_date.as_deref();
    let trial = check_free_trial_status(registration);
    let days = usage_days(registration).unwrap_or(FREE_TRIAL_DAYS + 1);
    let is_premium = is_premium_user(
        account.status(),
        days,
        account.b2b2c_org_id.as_deref(),
        account.gift_code_active,
    );

    let access = can_access_analysis(
        account.balance().total_credits,
        is_premium,
        trial.is_active,
    );

    Ok(Json(AnalysisAccessResponse {
        success: true,
        data: access,
    }))
}
