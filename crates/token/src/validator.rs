//! Per-request token validation.
//!
//! One invocation walks a fixed state machine:
//! extract raw token → decode/verify → revocation check → verified claims.
//! Every failure is terminal for the request; the engine never retries — a
//! client recovers by obtaining a new token from the issuer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use gatewarden_core::{AuthError, AuthResult};

use crate::claims::Claims;
use crate::codec::TokenCodec;
use crate::revocation::RevocationSet;

/// Scheme prefix of the documented token location.
const BEARER_PREFIX: &str = "Bearer ";

/// Validates incoming tokens into verified [`Claims`].
///
/// Stateless across requests; the same validator instance is safe to share
/// between concurrent requests.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    codec: TokenCodec,
    revocations: Option<Arc<RevocationSet>>,
}

impl TokenValidator {
    pub fn new(codec: TokenCodec) -> Self {
        Self {
            codec,
            revocations: None,
        }
    }

    /// Wire in a revocation set; without one the validator is purely
    /// stateless.
    pub fn with_revocations(codec: TokenCodec, revocations: Arc<RevocationSet>) -> Self {
        Self {
            codec,
            revocations: Some(revocations),
        }
    }

    pub fn revocations(&self) -> Option<&Arc<RevocationSet>> {
        self.revocations.as_ref()
    }

    /// Validate starting from the raw `Authorization` header value, the one
    /// documented token location. Anything else is `MissingToken`.
    pub fn validate_header(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<Claims> {
        let raw = extract_bearer(authorization)?;
        self.validate(raw, now)
    }

    /// Validate an already-extracted raw token string.
    pub fn validate(&self, raw: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let claims = self.codec.decode(raw, now).inspect_err(|e| {
            tracing::debug!(kind = %e, "token rejected");
        })?;

        if let (Some(revocations), Some(token_id)) = (&self.revocations, claims.token_id) {
            if revocations.is_revoked(&token_id, now) {
                tracing::debug!(%token_id, subject = %claims.sub, "revoked token rejected");
                return Err(AuthError::RevokedToken);
            }
        }

        Ok(claims)
    }
}

/// Extract the raw token from a bearer-style `Authorization` header value.
fn extract_bearer(authorization: Option<&str>) -> AuthResult<&str> {
    let header = authorization.ok_or(AuthError::MissingToken)?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}
