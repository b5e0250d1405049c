//! Token codec: binds [`Claims`] to signed token bytes.
//!
//! HS256 JWTs via `jsonwebtoken`. The codec is stateless apart from the
//! shared key ring reference and is safe to call from many requests
//! concurrently.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};

use gatewarden_core::{AuthError, AuthResult};

use crate::claims::Claims;
use crate::keys::KeyRingHandle;

/// An opaque signed token string.
///
/// Created once at issuance and owned by the client thereafter; the server
/// holds no copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<SignedToken> for String {
    fn from(value: SignedToken) -> Self {
        value.0
    }
}

impl core::fmt::Display for SignedToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes claims into signed tokens and verifies the reverse.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: KeyRingHandle,
}

impl TokenCodec {
    pub fn new(keys: KeyRingHandle) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyRingHandle {
        &self.keys
    }

    /// Sign `claims` with the active key.
    ///
    /// Fails only on an empty subject or an invalid validity window. Given
    /// identical claims and key the output is deterministic; distinct
    /// issuance times therefore yield distinct token bytes.
    pub fn encode(&self, claims: &Claims) -> AuthResult<SignedToken> {
        if claims.sub.as_str().trim().is_empty() {
            return Err(AuthError::issuer_precondition("subject must not be empty"));
        }
        if claims.expires_at <= claims.issued_at {
            return Err(AuthError::issuer_precondition(
                "expires_at must be strictly after issued_at",
            ));
        }

        let ring = self.keys.load();
        let active = ring.active();

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(active.kid().to_string());

        let token = encode(&header, claims, active.encoding())
            .map_err(|e| AuthError::issuer_precondition(format!("failed to sign claims: {e}")))?;

        Ok(SignedToken(token))
    }

    /// Verify and decode a token.
    ///
    /// The signature is checked over the exact signed bytes *before* any
    /// semantic inspection of the payload. Expiry is then a second,
    /// independent gate against the injected `now`, so an expired token with
    /// a valid signature reports [`AuthError::ExpiredToken`], not a
    /// signature failure.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        // Expiry is checked manually below so the failure kinds stay
        // distinguishable and the clock stays injectable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let ring = self.keys.load();
        for key in ring.candidates(header.kid.as_deref()) {
            match decode::<Claims>(token, key.decoding(), &validation) {
                Ok(data) => {
                    let claims = data.claims;
                    if claims.is_expired(now) {
                        return Err(AuthError::ExpiredToken);
                    }
                    return Ok(claims);
                }
                Err(e) => match e.kind() {
                    // Try the remaining keys of the rotation window.
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => continue,
                    _ => return Err(AuthError::MalformedToken),
                },
            }
        }

        Err(AuthError::InvalidSignature)
    }
}
