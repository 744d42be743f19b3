use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    models::common::AccountTier,
    services::jwt_service::JWTService,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

/// Request extension storing verified user identity from JWT
#[derive(Debug, Clone)]
pub struct UserIdentity {
    /// Opaque account identifier from the token subject
    pub user_id: String,
    pub account_tier: AccountTier,
}

/// JWT authentication middleware
///
/// Extracts the Authorization header, validates the JWT access token,
/// and stores the verified user identity in request extensions.
///
/// Rejects before any database read: an unauthenticated caller never
/// reaches a handler.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let headers = request.headers();

    // Extract Authorization header
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".to_string()))?;

    // Parse "Bearer <token>" format
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::InvalidToken(
            "Invalid Authorization format, expected 'Bearer <token>'".to_string(),
        )
    })?;

    // Validate JWT token
    let claims = state.jwt_service.validate_token(token)?;

    let account_tier = JWTService::account_tier_from_claims(&claims)?;

    // Store verified identity in request extensions
    let identity = UserIdentity {
        user_id: claims.sub,
        account_tier,
    };

    request.extensions_mut().insert(identity);

    // Continue to next middleware/handler
    Ok(next.run(request).await)
}

/// Axum extractor for user identity
///
/// Automatically extracts the verified user identity from request extensions.
/// Only works on routes protected by jwt_auth_middleware.
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserIdentity>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Unauthenticated(
                    "User identity not found - route must be protected by jwt_auth_middleware"
                        .to_string(),
                )
            })
    }
}
