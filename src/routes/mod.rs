// Route modules
pub mod credits;
pub mod entitlement;
pub mod purchases;

use crate::{
    app_state::AppState,
    middleware::{create_rate_limiter, jwt_auth_middleware, logging_middleware},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Credit-moving routes get rate limiting on top of authentication
    let rate_limiter = create_rate_limiter(state.redis.clone());
    let rate_limited_routes = Router::new()
        .route("/analysis/access", post(entitlement::check_analysis_access))
        .route("/credits/consume", post(credits::consume_credits))
        .route_layer(middleware::from_fn(rate_limiter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Auth-only routes (no rate limiting, require JWT)
    let auth_only_routes = Router::new()
        .route("/entitlement", get(entitlement::get_entitlement))
        .route("/credits", get(credits::get_credit_balance))
        .route("/purchases/verify", post(purchases::verify_purchase))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Combine all routes with request/response body logging
    Router::new()
        .merge(rate_limited_routes)
        .merge(auth_only_routes)
        .layer(middleware::from_fn(logging_middleware))
}
