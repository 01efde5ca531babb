//! Authentication middleware layer for protecting the API endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::ApiError;

use super::jwt::TokenService;
use super::types::{AccessPolicy, Identity, OperationSource};

const BEARER_PREFIX: &str = "Bearer ";

/// State shared by every invocation of [`require_auth`].
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub policy: Arc<AccessPolicy>,
}

#[derive(Debug, Deserialize)]
struct OperationEnvelope {
    #[serde(rename = "operationName")]
    operation_name: Option<String>,
}

/// Middleware function that requires authentication unless the policy exempts the request.
///
/// This can be used with `axum::middleware::from_fn_with_state` to protect routes.
/// On success the resolved [`Identity`] is available in the request extensions.
pub async fn require_auth(
    State(state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let policy = &state.policy;

    // CORS pre-flight
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    if policy.is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let mut request = if request.method() == Method::POST && request.uri().path() == policy.api_path
    {
        let (request, operation) = match resolve_operation(request, policy).await {
            Ok(resolved) => resolved,
            Err(err) => return err.into_response(),
        };

        if let Some(operation) = operation.filter(|op| policy.is_exempt_operation(op)) {
            tracing::debug!(operation = %operation, "Forwarding exempt operation without auth");
            return next.run(request).await;
        }

        request
    } else {
        request
    };

    let token = match extract_token_from_header(request.headers()) {
        Ok(t) => t,
        Err(err) => {
            tracing::debug!(path = %request.uri().path(), "Rejecting request: {}", err);
            return err.into_response();
        }
    };

    let user_id = match state.tokens.validate(&token) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(path = %request.uri().path(), "Token rejected: {}", e);
            return ApiError::Unauthorized(format!("Invalid token: {}", e)).into_response();
        }
    };

    request.extensions_mut().insert(Identity(user_id));

    next.run(request).await
}

/// Work out the GraphQL operation name of a request, handing back a request
/// whose body is byte-for-byte what the client sent.
async fn resolve_operation(
    request: Request<Body>,
    policy: &AccessPolicy,
) -> Result<(Request<Body>, Option<String>), ApiError> {
    match &policy.operation_source {
        OperationSource::Header(name) => {
            let operation = request
                .headers()
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string());
            Ok((request, operation))
        }
        OperationSource::Body => {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, policy.max_body_bytes)
                .await
                .map_err(|e| {
                    tracing::warn!("Failed to buffer request body: {}", e);
                    ApiError::bad_request("Error reading request body")
                })?;

            // Anything that isn't a JSON object with `operationName` is
            // simply not exempt.
            let operation = serde_json::from_slice::<OperationEnvelope>(&bytes)
                .ok()
                .and_then(|envelope| envelope.operation_name);

            Ok((Request::from_parts(parts, Body::from(bytes)), operation))
        }
    }
}

fn extract_token_from_header(headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header missing or invalid".to_string())
        })?
        .trim();

    if token.is_empty() {
        return Err(ApiError::Unauthorized("Empty token".to_string()));
    }

    Ok(token.to_string())
}
