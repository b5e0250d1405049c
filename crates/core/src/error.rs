//! Authentication/authorization error taxonomy.

use thiserror::Error;

/// Result type used across the engine.
pub type AuthResult<T> = Result<T, AuthError>;

/// Terminal failure kinds of the authentication/authorization engine.
///
/// Every variant is final for the current request: the engine never retries.
/// `ContextMisuse` and `IssuerPrecondition` are defects (a miswired pipeline
/// or caller), not client input problems, and should be surfaced loudly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was found in the expected request location.
    #[error("missing token")]
    MissingToken,

    /// The presented string is not decodable as a token at all.
    #[error("malformed token")]
    MalformedToken,

    /// The token decoded but its signature does not verify.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Signature verified, but the token's validity window has passed.
    #[error("token has expired")]
    ExpiredToken,

    /// The token was explicitly revoked before its natural expiry.
    #[error("token has been revoked")]
    RevokedToken,

    /// The verified identity lacks a required authority.
    #[error("insufficient authority: missing '{0}'")]
    InsufficientAuthority(String),

    /// Security context read before population, or populated twice.
    /// Indicates a pipeline ordering bug, never a client error.
    #[error("security context misuse: {0}")]
    ContextMisuse(String),

    /// A token was requested for invalid inputs (empty subject,
    /// non-positive TTL).
    #[error("issuer precondition violated: {0}")]
    IssuerPrecondition(String),
}

impl AuthError {
    pub fn context_misuse(msg: impl Into<String>) -> Self {
        Self::ContextMisuse(msg.into())
    }

    pub fn issuer_precondition(msg: impl Into<String>) -> Self {
        Self::IssuerPrecondition(msg.into())
    }

    /// Whether this failure means "log in again" rather than "you lack
    /// permission". Used by transports to pick the outward signal without
    /// exposing the exact kind.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::MalformedToken
                | Self::InvalidSignature
                | Self::ExpiredToken
                | Self::RevokedToken
        )
    }

    /// Whether this failure indicates a programming error rather than a
    /// rejected request.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::ContextMisuse(_) | Self::IssuerPrecondition(_))
    }
}
