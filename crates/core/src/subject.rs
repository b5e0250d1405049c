use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Identity of an authenticated subject (human user, service account, etc).
///
/// Subjects are opaque strings at this layer; resolving one against a user
/// store is the credential store's concern, not the engine's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(Cow<'static, str>);

impl Subject {
    /// Create a subject, rejecting empty/blank identities.
    ///
    /// A claims payload without a subject is meaningless, so the invariant is
    /// enforced at construction rather than at every use site.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, AuthError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AuthError::issuer_precondition("subject must not be empty"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_subject() {
        assert!(Subject::new("").is_err());
        assert!(Subject::new("   ").is_err());
    }

    #[test]
    fn accepts_non_empty_subject() {
        let s = Subject::new("alice").unwrap();
        assert_eq!(s.as_str(), "alice");
    }
}
