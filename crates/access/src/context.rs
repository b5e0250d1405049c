use std::collections::BTreeSet;

use gatewarden_core::{AuthError, AuthResult, Authority, Subject};

/// Verified identity of the current request (subject + authorities).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    subject: Subject,
    authorities: BTreeSet<Authority>,
}

impl AuthenticatedIdentity {
    pub fn new(subject: Subject, authorities: BTreeSet<Authority>) -> Self {
        Self {
            subject,
            authorities,
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn authorities(&self) -> &BTreeSet<Authority> {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &Authority) -> bool {
        self.authorities.contains(authority)
    }
}

/// Per-request holder of the verified identity.
///
/// Starts unauthenticated, is populated at most once by the validator stage,
/// and is discarded with the request. Never shared across requests, never
/// persisted.
///
/// Double population (or demanding an identity that was never set) is a
/// pipeline ordering bug, signaled as [`AuthError::ContextMisuse`] — a
/// different failure than any client-caused rejection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    identity: Option<AuthenticatedIdentity>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the context. May be called at most once per request.
    pub fn authenticate(
        &mut self,
        subject: Subject,
        authorities: BTreeSet<Authority>,
    ) -> AuthResult<()> {
        if self.identity.is_some() {
            return Err(AuthError::context_misuse(
                "security context populated twice",
            ));
        }
        self.identity = Some(AuthenticatedIdentity::new(subject, authorities));
        Ok(())
    }

    /// The verified identity, or `None` as the explicit unauthenticated
    /// marker. Callers must not assume presence.
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.identity.as_ref()
    }

    /// The verified identity, treating absence as a pipeline ordering bug.
    ///
    /// Use from business handlers behind protected routes, where the
    /// pipeline guarantees population.
    pub fn require_identity(&self) -> AuthResult<&AuthenticatedIdentity> {
        self.identity.as_ref().ok_or_else(|| {
            AuthError::context_misuse("security context read before population")
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_inputs() -> (Subject, BTreeSet<Authority>) {
        (
            Subject::new("alice").unwrap(),
            [Authority::new("USER")].into_iter().collect(),
        )
    }

    #[test]
    fn populates_exactly_once() {
        let (subject, authorities) = identity_inputs();
        let mut context = SecurityContext::new();

        assert!(!context.is_authenticated());
        context
            .authenticate(subject.clone(), authorities.clone())
            .unwrap();
        assert!(context.is_authenticated());
        assert_eq!(context.identity().unwrap().subject().as_str(), "alice");

        let err = context.authenticate(subject, authorities).unwrap_err();
        assert!(matches!(err, AuthError::ContextMisuse(_)));
    }

    #[test]
    fn read_before_set_is_misuse_not_auth_failure() {
        let context = SecurityContext::new();

        assert!(context.identity().is_none());

        let err = context.require_identity().unwrap_err();
        assert!(matches!(err, AuthError::ContextMisuse(_)));
        assert!(err.is_defect());
        assert!(!err.is_authentication_failure());
    }
}
