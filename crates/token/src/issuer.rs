//! Token issuance.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use gatewarden_core::{AuthError, AuthResult, Authority, Subject, TokenId};

use crate::claims::Claims;
use crate::codec::{SignedToken, TokenCodec};

/// Produces tokens after the caller has authenticated the subject.
///
/// Preconditions are the caller's job: the subject must already be verified
/// against the credential store, and the supplied authorities are embedded
/// as-is. Issuance has no side effects — no session record is written.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer with the configured time-to-live.
    ///
    /// The TTL comes from configuration, never hard-coded; a non-positive
    /// TTL is a wiring defect and is rejected up front.
    pub fn new(codec: TokenCodec, ttl: Duration) -> AuthResult<Self> {
        if ttl <= Duration::zero() {
            return Err(AuthError::issuer_precondition("ttl must be positive"));
        }
        Ok(Self { codec, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` carrying `authorities`, valid from now.
    pub fn issue(
        &self,
        subject: Subject,
        authorities: BTreeSet<Authority>,
    ) -> AuthResult<SignedToken> {
        self.issue_at(subject, authorities, Utc::now())
    }

    /// Issue with an explicit clock (deterministic in tests).
    pub fn issue_at(
        &self,
        subject: Subject,
        authorities: BTreeSet<Authority>,
        now: DateTime<Utc>,
    ) -> AuthResult<SignedToken> {
        let claims = Claims::new(subject, authorities, now, now + self.ttl)?
            .with_token_id(TokenId::new());

        tracing::debug!(subject = %claims.sub, expires_at = %claims.expires_at, "issuing token");

        self.codec.encode(&claims)
    }
}
