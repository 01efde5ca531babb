//! Auth-related types and configuration.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Subject-type label carried in every token's `sub` claim.
pub const SUBJECT_LABEL: &str = "user-authentication";

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user identifier
    pub user_id: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Not valid before this timestamp
    pub nbf: i64,
    /// Issuer label
    pub iss: String,
    /// Subject-type label, always [`SUBJECT_LABEL`]
    pub sub: String,
}

/// Token signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub issuer: String,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Identity resolved from a valid bearer token.
///
/// Inserted into request extensions by [`require_auth`](super::require_auth)
/// and only present when authentication succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Look up the authenticated identity attached to a request.
pub fn current_identity(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(&parts.extensions)
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// Where the middleware looks for the GraphQL operation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationSource {
    /// The `operationName` field of the JSON request body.
    Body,
    /// A request header carrying the operation name.
    Header(String),
}

/// Rules deciding which requests bypass authentication.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// The single GraphQL endpoint.
    pub api_path: String,
    pub public_prefixes: Vec<String>,
    /// Operation names allowed without a token, compared case-insensitively.
    pub exempt_operations: Vec<String>,
    pub operation_source: OperationSource,
    pub max_body_bytes: usize,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            api_path: "/query".to_string(),
            public_prefixes: vec!["/public/".to_string()],
            exempt_operations: ["publicfile", "login", "register", "refreshtoken"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            operation_source: OperationSource::Body,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl AccessPolicy {
    /// Check if a path falls under one of the public prefixes.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Check if an operation name is on the allow-list (case-insensitive).
    pub fn is_exempt_operation(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.exempt_operations
            .iter()
            .any(|op| op.to_lowercase() == name)
    }
}
