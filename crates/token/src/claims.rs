use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatewarden_core::{AuthError, AuthResult, Authority, Subject, TokenId};

/// Claims carried inside a token.
///
/// Serialized with standard JWT claim names (`sub`, `iat`, `exp`, `jti`)
/// plus a custom `authorities` array. Authorities are kept in a `BTreeSet`
/// so a given claims value always encodes to the same payload bytes.
///
/// # Invariants
/// - `sub` is non-empty (enforced by [`Subject`] and re-checked at encode).
/// - `expires_at` is strictly greater than `issued_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / authenticated identity.
    pub sub: Subject,

    /// Authorities granted to the subject, embedded at issuance.
    ///
    /// Embedded authorities are stale until the subject logs in again; the
    /// trade-off is that validation needs no credential-store round-trip.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub authorities: BTreeSet<Authority>,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Opaque token identifier, the revocation handle.
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
}

impl Claims {
    /// Build claims, rejecting an inverted or empty validity window.
    pub fn new(
        sub: Subject,
        authorities: BTreeSet<Authority>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<Self> {
        if expires_at <= issued_at {
            return Err(AuthError::issuer_precondition(
                "expires_at must be strictly after issued_at",
            ));
        }
        Ok(Self {
            sub,
            authorities,
            issued_at,
            expires_at,
            token_id: None,
        })
    }

    pub fn with_token_id(mut self, token_id: TokenId) -> Self {
        self.token_id = Some(token_id);
        self
    }

    /// Whether the validity window has passed at `now`.
    ///
    /// Expiry is checked lazily against an injected clock; there is no
    /// background sweep.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn has_authority(&self, authority: &Authority) -> bool {
        self.authorities.contains(authority)
    }
}
