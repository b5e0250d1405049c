//! Signing key material and the rotatable key ring.
//!
//! Keys are immutable at use time. Rotation publishes a whole new ring via
//! an atomic swap, so in-flight validations keep the ring they loaded and
//! never observe a half-updated key.

use std::sync::Arc;

use arc_swap::ArcSwap;
use jsonwebtoken::{DecodingKey, EncodingKey};

/// A symmetric HS256 signing key with a stable identifier.
///
/// The `kid` travels in the token header so verification can pick the right
/// key during a rotation window.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(kid: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            kid: kid.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

// Manual Debug so key material never ends up in logs.
impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Immutable snapshot of the keys trusted for verification.
///
/// Issuance always uses `active`. Verification accepts `active` and, during
/// a rotation window, the single `previous` key.
#[derive(Debug, Clone)]
pub struct KeyRing {
    active: SigningKey,
    previous: Option<SigningKey>,
}

impl KeyRing {
    pub fn new(active: SigningKey) -> Self {
        Self {
            active,
            previous: None,
        }
    }

    pub fn with_previous(active: SigningKey, previous: SigningKey) -> Self {
        Self {
            active,
            previous: Some(previous),
        }
    }

    pub fn active(&self) -> &SigningKey {
        &self.active
    }

    /// Keys to try for verification, in trust order.
    ///
    /// A `kid` match is tried first; tokens without a `kid` (or with an
    /// unknown one) fall back to active-then-previous.
    pub(crate) fn candidates(&self, kid: Option<&str>) -> Vec<&SigningKey> {
        let mut keys: Vec<&SigningKey> = Vec::with_capacity(2);
        keys.push(&self.active);
        if let Some(previous) = &self.previous {
            keys.push(previous);
        }
        if let Some(kid) = kid {
            keys.sort_by_key(|k| k.kid() != kid);
        }
        keys
    }
}

/// Shared, atomically swappable reference to the current [`KeyRing`].
///
/// Reads are lock-free; rotation is the only mutation point.
#[derive(Debug, Clone)]
pub struct KeyRingHandle {
    inner: Arc<ArcSwap<KeyRing>>,
}

impl KeyRingHandle {
    pub fn new(ring: KeyRing) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ring)),
        }
    }

    pub(crate) fn load(&self) -> Arc<KeyRing> {
        self.inner.load_full()
    }

    /// Rotate to a new active key; the current active key stays trusted as
    /// `previous` until the next rotation (or [`Self::retire_previous`]).
    pub fn rotate(&self, new_active: SigningKey) {
        let current = self.inner.load_full();
        tracing::info!(
            new_kid = new_active.kid(),
            previous_kid = current.active.kid(),
            "rotating signing key"
        );
        self.inner.store(Arc::new(KeyRing::with_previous(
            new_active,
            current.active.clone(),
        )));
    }

    /// Drop the previous key, ending the rotation window.
    pub fn retire_previous(&self) {
        let current = self.inner.load_full();
        self.inner
            .store(Arc::new(KeyRing::new(current.active.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_prefer_kid_match() {
        let ring = KeyRing::with_previous(
            SigningKey::from_secret("k2", b"new"),
            SigningKey::from_secret("k1", b"old"),
        );

        let kids: Vec<&str> = ring.candidates(Some("k1")).iter().map(|k| k.kid()).collect();
        assert_eq!(kids, vec!["k1", "k2"]);

        let kids: Vec<&str> = ring.candidates(None).iter().map(|k| k.kid()).collect();
        assert_eq!(kids, vec!["k2", "k1"]);

        // Unknown kid falls back to trust order.
        let kids: Vec<&str> = ring.candidates(Some("k9")).iter().map(|k| k.kid()).collect();
        assert_eq!(kids, vec!["k2", "k1"]);
    }

    #[test]
    fn rotation_keeps_old_key_then_retires_it() {
        let handle = KeyRingHandle::new(KeyRing::new(SigningKey::from_secret("k1", b"one")));
        handle.rotate(SigningKey::from_secret("k2", b"two"));

        let ring = handle.load();
        assert_eq!(ring.active().kid(), "k2");
        assert_eq!(ring.candidates(None).len(), 2);

        handle.retire_previous();
        let ring = handle.load();
        assert_eq!(ring.active().kid(), "k2");
        assert_eq!(ring.candidates(None).len(), 1);
    }
}
