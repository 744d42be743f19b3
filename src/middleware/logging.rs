use crate::services::receipt_service::hash_receipt;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

/// Middleware that logs request and response bodies
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    // Extract and log request body
    let (parts, body) = request.into_parts();

    // Read the request body (limit to 1MB to prevent memory issues)
    let bytes = match to_bytes(body, 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read request body: {}", e);
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    // Log request with body (truncate if too long; receipts can be huge)
    let request_body = redact_receipt(&String::from_utf8_lossy(&bytes));
    let truncated_request = truncate_body(&request_body, 2000);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        body = %truncated_request,
        "→ Request"
    );

    // Reconstruct the request with the body
    let request = Request::from_parts(parts, Body::from(bytes));

    // Call the next middleware/handler
    let response = next.run(request).await;

    // Extract response status before consuming body
    let status = response.status();
    let (parts, body) = response.into_parts();

    // Read the response body (limit to 1MB)
    let bytes = match to_bytes(body, 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read response body: {}", e);
            Bytes::new()
        }
    };

    // Log response with body (truncate if too long)
    let response_body = String::from_utf8_lossy(&bytes);
    let truncated_response = truncate_body(&response_body, 2000);
    let latency = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        body = %truncated_response,
        "← Response"
    );

    // Reconstruct the response with the body
    Response::from_parts(parts, Body::from(bytes))
}

/// Replace a `receipt` field in a JSON request body with its hash.
///
/// Raw store receipts are only ever persisted as a SHA-256 hash; the
/// request log follows the same rule.
fn redact_receipt(body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    if let Some(receipt) = value.get_mut("receipt") {
        if let Some(raw) = receipt.as_str() {
            *receipt = serde_json::Value::String(format!(
                "sha256:{} ({} bytes)",
                hash_receipt(raw),
                raw.len()
            ));
            return value.to_string();
        }
    }

    body.to_string()
}

/// Truncate body for logging, adding ellipsis if truncated
fn truncate_body(body: &str, max_len: usize) -> String {
    let body = body.trim();
    if body.len() <= max_len {
        body.to_string()
    } else {
        format!(
            "{}...[truncated, {} bytes total]",
            &body[..max_len],
            body.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_receipt_replaces_raw_token() {
        let body = r#"{"platform":"android","receipt":"opaque-store-token"}"#;
        let redacted = redact_receipt(body);

        assert!(!redacted.contains("opaque-store-token"));
        assert!(redacted.contains("sha256:"));
        assert!(redacted.contains("(18 bytes)"));
        // Other fields survive
        assert!(redacted.contains("android"));
    }

    #[test]
    fn test_redact_receipt_leaves_other_bodies_alone() {
        let body = r#"{"amount":5}"#;
        assert_eq!(redact_receipt(body), body);

        let not_json = "plain text";
        assert_eq!(redact_receipt(not_json), not_json);
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short", 2000), "short");

        let long = "x".repeat(3000);
        let truncated = truncate_body(&long, 2000);
        assert!(truncated.starts_with(&"x".repeat(2000)));
        assert!(truncated.contains("3000 bytes total"));
    }
}
