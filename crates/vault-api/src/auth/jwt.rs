//! JWT token creation and validation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;

use super::types::{Claims, TokenConfig, SUBJECT_LABEL};

/// Errors produced while issuing or validating tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Empty subject or empty token string
    #[error("{0}")]
    InvalidInput(&'static str),

    /// Input could not be parsed as a token at all
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Bad signature, unexpected algorithm, expired or not yet valid
    #[error("token validation failed: {0}")]
    VerificationFailed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::Malformed(err.to_string()),
            _ => AuthError::VerificationFailed(err.to_string()),
        }
    }
}

/// Refuse any token whose header names an algorithm outside the HMAC family.
///
/// Runs before `decode`, which cannot deserialize a header naming `none` or
/// an unknown algorithm.
fn check_algorithm(token: &str) -> Result<(), AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::Malformed("InvalidToken".to_string()));
    }

    let header = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
    let header: serde_json::Value =
        serde_json::from_slice(&header).map_err(|e| AuthError::Malformed(e.to_string()))?;

    match header.get("alg").and_then(serde_json::Value::as_str) {
        Some("HS256" | "HS384" | "HS512") => Ok(()),
        Some(alg) => Err(AuthError::VerificationFailed(format!(
            "unexpected signing method: {}",
            alg
        ))),
        None => Err(AuthError::VerificationFailed(
            "missing signing method".to_string(),
        )),
    }
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HMAC-signed identity tokens.
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Any HMAC variant is fine; everything else is refused before the
        // signature is even looked at.
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.sub = Some(SUBJECT_LABEL.to_string());
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Create a new token for a user.
    pub fn issue(&self, user_id: &str) -> Result<IssuedToken, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidInput("userID cannot be empty"));
        }

        let now = Utc::now();
        let expires_at = Some(self.config.token_ttl_hours)
            .filter(|hours| *hours > 0)
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::Signing(format!(
                    "token lifetime of {} hours is out of range",
                    self.config.token_ttl_hours
                ))
            })?;

        let claims = Claims {
            user_id: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.issuer.clone(),
            sub: SUBJECT_LABEL.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return the user identifier it was issued for.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token string is empty"));
        }

        check_algorithm(token)?;

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.user_id.is_empty() {
            return Err(AuthError::VerificationFailed(
                "token carries no user id".to_string(),
            ));
        }

        Ok(token_data.claims.user_id)
    }
}
