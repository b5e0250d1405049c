//! Credential store seam.
//!
//! Verifying username/password is an external collaborator's job; the
//! engine only consumes its output (a verified subject plus the authorities
//! to embed). The in-memory implementation exists for dev wiring and tests.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use gatewarden_core::{Authority, Subject};

/// Output of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredentials {
    pub subject: Subject,
    pub authorities: BTreeSet<Authority>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Verifies an identity + secret pair and returns the authorities to embed.
pub trait CredentialStore: Send + Sync {
    fn verify(&self, username: &str, secret: &str) -> Result<VerifiedCredentials, CredentialError>;
}

/// Dev/test credential store with plaintext secrets.
///
/// Production deployments back this trait with a real user store (hashed
/// secrets, lockout policy); none of that belongs to the token engine.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, (String, BTreeSet<Authority>)>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user<I, A>(mut self, username: &str, secret: &str, authorities: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<std::borrow::Cow<'static, str>>,
    {
        self.users.insert(
            username.to_string(),
            (
                secret.to_string(),
                authorities.into_iter().map(Authority::new).collect(),
            ),
        );
        self
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn verify(&self, username: &str, secret: &str) -> Result<VerifiedCredentials, CredentialError> {
        let (expected, authorities) = self
            .users
            .get(username)
            .ok_or(CredentialError::InvalidCredentials)?;

        if expected != secret {
            return Err(CredentialError::InvalidCredentials);
        }

        let subject =
            Subject::new(username.to_string()).map_err(|_| CredentialError::InvalidCredentials)?;

        Ok(VerifiedCredentials {
            subject,
            authorities: authorities.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_known_user() {
        let store = InMemoryCredentialStore::new().with_user("alice", "s3cret", ["USER"]);

        let creds = store.verify("alice", "s3cret").unwrap();
        assert_eq!(creds.subject.as_str(), "alice");
        assert!(creds.authorities.contains(&Authority::new("USER")));
    }

    #[test]
    fn rejects_unknown_user_and_wrong_secret() {
        let store = InMemoryCredentialStore::new().with_user("alice", "s3cret", ["USER"]);

        assert_eq!(
            store.verify("bob", "s3cret"),
            Err(CredentialError::InvalidCredentials)
        );
        assert_eq!(
            store.verify("alice", "wrong"),
            Err(CredentialError::InvalidCredentials)
        );
    }
}
