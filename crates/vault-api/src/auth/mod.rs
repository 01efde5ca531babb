//! Authentication module for JWT-based auth in front of the GraphQL endpoint.
//!
//! This module provides:
//! - Token issuance and validation
//! - `require_auth` middleware gating the API router
//! - Accessors for the authenticated identity

mod jwt;
mod middleware;
pub mod types;

pub use jwt::{AuthError, IssuedToken, TokenService};
pub use middleware::{require_auth, AuthState};
pub use types::{current_identity, AccessPolicy, Identity, OperationSource, TokenConfig};
