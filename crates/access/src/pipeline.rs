//! Request pipeline: the ordered, short-circuiting per-request sequence
//! `ExtractToken → Validate → PopulateContext → Authorize`.
//!
//! The pipeline itself is stateless between requests — each execution builds
//! a fresh [`SecurityContext`] — so one instance is safe to reuse across
//! concurrent, unrelated requests. Handler invocation is the transport's
//! job; an [`PipelineOutcome::Authorized`] outcome hands it the populated
//! context.

use chrono::{DateTime, Utc};

use gatewarden_core::AuthError;
use gatewarden_token::TokenValidator;

use crate::authorize::{decide, Decision, DenyReason};
use crate::context::SecurityContext;
use crate::rules::RulePolicy;

/// Transport-agnostic view of the parts of a request the pipeline needs.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    /// Raw `Authorization` header value, the documented token location.
    pub authorization: Option<String>,
}

impl RequestHead {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            authorization: None,
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

/// Stable outward classification of a rejection.
///
/// Transports map these to their own signals (401/403/500) without exposing
/// the internal failure kind; `kind` stays available for logs/metrics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectionClass {
    /// The client should log in (again): no/invalid/expired credential.
    Unauthenticated,
    /// The verified identity lacks permission for this resource.
    Forbidden,
    /// Engine defect (miswired pipeline); never a client problem.
    Internal,
}

/// A terminal pipeline failure: internal kind + outward class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: AuthError,
    pub class: RejectionClass,
}

/// Result of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// All stages passed; the handler may run with this context.
    Authorized(SecurityContext),
    /// A stage failed terminally; later stages were never reached.
    Rejected(Rejection),
}

impl PipelineOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Sequences validation, context population and authorization for one
/// request.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    validator: TokenValidator,
    policy: RulePolicy,
}

impl RequestPipeline {
    pub fn new(validator: TokenValidator, policy: RulePolicy) -> Self {
        Self { validator, policy }
    }

    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }

    pub fn execute(&self, head: &RequestHead) -> PipelineOutcome {
        self.execute_at(head, Utc::now())
    }

    /// Execute with an explicit clock (deterministic in tests).
    pub fn execute_at(&self, head: &RequestHead, now: DateTime<Utc>) -> PipelineOutcome {
        let mut context = SecurityContext::new();

        // ExtractToken + Validate.
        match self
            .validator
            .validate_header(head.authorization.as_deref(), now)
        {
            Ok(claims) => {
                // PopulateContext, exactly once.
                if let Err(defect) = context.authenticate(claims.sub, claims.authorities) {
                    tracing::error!(kind = %defect, "pipeline defect while populating context");
                    return PipelineOutcome::Rejected(Rejection {
                        kind: defect,
                        class: RejectionClass::Internal,
                    });
                }
            }
            Err(failure) => {
                // A failed validation is terminal for protected resources.
                // A resource whose first matching rule is Public proceeds
                // unauthenticated instead.
                if !self.policy.is_public(&head.path, &head.method) {
                    tracing::debug!(
                        kind = %failure,
                        method = %head.method,
                        path = %head.path,
                        "request rejected: authentication"
                    );
                    return PipelineOutcome::Rejected(Rejection {
                        kind: failure,
                        class: RejectionClass::Unauthenticated,
                    });
                }
            }
        }

        // Authorize.
        match decide(&self.policy, &head.path, &head.method, &context) {
            Decision::Permit => PipelineOutcome::Authorized(context),
            Decision::Deny(reason) => {
                let rejection = rejection_for(reason);
                tracing::debug!(
                    kind = %rejection.kind,
                    method = %head.method,
                    path = %head.path,
                    subject = context.identity().map(|i| i.subject().as_str()).unwrap_or("-"),
                    "request rejected: authorization"
                );
                PipelineOutcome::Rejected(rejection)
            }
        }
    }
}

fn rejection_for(reason: DenyReason) -> Rejection {
    match reason {
        DenyReason::Unauthenticated => Rejection {
            kind: AuthError::MissingToken,
            class: RejectionClass::Unauthenticated,
        },
        DenyReason::NoMatchingRule => Rejection {
            kind: AuthError::InsufficientAuthority(
                "no matching rule (fail-closed)".to_string(),
            ),
            class: RejectionClass::Forbidden,
        },
        DenyReason::InsufficientAuthority { required } => Rejection {
            kind: AuthError::InsufficientAuthority(required.to_string()),
            class: RejectionClass::Forbidden,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AuthorizationRule, Requirement, ResourceMatcher};
    use chrono::Duration;
    use gatewarden_core::{Authority, Subject};
    use gatewarden_token::{KeyRing, KeyRingHandle, SigningKey, TokenCodec, TokenIssuer};
    use std::collections::BTreeSet;

    fn setup(rules: Vec<AuthorizationRule>) -> (RequestPipeline, TokenIssuer) {
        let codec = TokenCodec::new(KeyRingHandle::new(KeyRing::new(SigningKey::from_secret(
            "k1",
            b"pipeline-secret",
        ))));
        let issuer = TokenIssuer::new(codec.clone(), Duration::minutes(10)).unwrap();
        let pipeline = RequestPipeline::new(TokenValidator::new(codec), RulePolicy::new(rules));
        (pipeline, issuer)
    }

    fn bearer(issuer: &TokenIssuer, subject: &'static str, authorities: &[&'static str]) -> String {
        let authorities: BTreeSet<Authority> =
            authorities.iter().map(|a| Authority::new(*a)).collect();
        let token = issuer
            .issue(Subject::new(subject).unwrap(), authorities)
            .unwrap();
        format!("Bearer {token}")
    }

    fn admin_rules() -> Vec<AuthorizationRule> {
        vec![
            AuthorizationRule::new(ResourceMatcher::path("/health"), Requirement::Public),
            AuthorizationRule::new(
                ResourceMatcher::path("/admin/**"),
                Requirement::all_of(["ADMIN"]),
            ),
            AuthorizationRule::new(
                ResourceMatcher::path("/api/**"),
                Requirement::any_of(["USER", "ADMIN"]),
            ),
        ]
    }

    #[test]
    fn admin_resource_requires_admin_authority() {
        let (pipeline, issuer) = setup(admin_rules());

        let head = RequestHead::new("GET", "/admin/users")
            .with_authorization(bearer(&issuer, "alice", &["USER"]));
        let PipelineOutcome::Rejected(rejection) = pipeline.execute(&head) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.class, RejectionClass::Forbidden);
        assert!(matches!(
            rejection.kind,
            AuthError::InsufficientAuthority(_)
        ));

        let head = RequestHead::new("GET", "/admin/users")
            .with_authorization(bearer(&issuer, "root", &["ADMIN"]));
        assert!(pipeline.execute(&head).is_authorized());
    }

    #[test]
    fn missing_token_on_protected_resource() {
        let (pipeline, _) = setup(admin_rules());

        let head = RequestHead::new("GET", "/api/things");
        let PipelineOutcome::Rejected(rejection) = pipeline.execute(&head) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.kind, AuthError::MissingToken);
        assert_eq!(rejection.class, RejectionClass::Unauthenticated);
    }

    #[test]
    fn public_resource_passes_without_token() {
        let (pipeline, _) = setup(admin_rules());

        let head = RequestHead::new("GET", "/health");
        let PipelineOutcome::Authorized(context) = pipeline.execute(&head) else {
            panic!("expected authorization");
        };
        assert!(!context.is_authenticated());
    }

    #[test]
    fn public_resource_still_populates_context_from_valid_token() {
        let (pipeline, issuer) = setup(admin_rules());

        let head = RequestHead::new("GET", "/health")
            .with_authorization(bearer(&issuer, "alice", &["USER"]));
        let PipelineOutcome::Authorized(context) = pipeline.execute(&head) else {
            panic!("expected authorization");
        };
        assert_eq!(context.require_identity().unwrap().subject().as_str(), "alice");
    }

    #[test]
    fn garbage_token_on_public_resource_proceeds_unauthenticated() {
        let (pipeline, _) = setup(admin_rules());

        let head = RequestHead::new("GET", "/health").with_authorization("Bearer not-a-token");
        let PipelineOutcome::Authorized(context) = pipeline.execute(&head) else {
            panic!("expected authorization");
        };
        assert!(!context.is_authenticated());
    }

    #[test]
    fn unmatched_resource_is_fail_closed_even_with_valid_token() {
        let (pipeline, issuer) = setup(admin_rules());

        let head = RequestHead::new("GET", "/unlisted")
            .with_authorization(bearer(&issuer, "alice", &["USER", "ADMIN"]));
        let PipelineOutcome::Rejected(rejection) = pipeline.execute(&head) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.class, RejectionClass::Forbidden);
    }

    #[test]
    fn expired_token_rejects_before_authorization() {
        let (pipeline, issuer) = setup(admin_rules());

        let head = RequestHead::new("GET", "/api/things")
            .with_authorization(bearer(&issuer, "alice", &["USER"]));

        let now = Utc::now();
        assert!(pipeline.execute_at(&head, now).is_authorized());

        let later = now + Duration::minutes(11);
        let PipelineOutcome::Rejected(rejection) = pipeline.execute_at(&head, later) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.kind, AuthError::ExpiredToken);
        assert_eq!(rejection.class, RejectionClass::Unauthenticated);
    }

    #[test]
    fn pipeline_is_reusable_across_unrelated_requests() {
        let (pipeline, issuer) = setup(admin_rules());

        let alice = RequestHead::new("GET", "/api/things")
            .with_authorization(bearer(&issuer, "alice", &["USER"]));
        let root = RequestHead::new("GET", "/admin/users")
            .with_authorization(bearer(&issuer, "root", &["ADMIN"]));

        for _ in 0..3 {
            let PipelineOutcome::Authorized(a) = pipeline.execute(&alice) else {
                panic!("expected authorization");
            };
            let PipelineOutcome::Authorized(r) = pipeline.execute(&root) else {
                panic!("expected authorization");
            };
            // Fresh context per execution, never shared.
            assert_eq!(a.require_identity().unwrap().subject().as_str(), "alice");
            assert_eq!(r.require_identity().unwrap().subject().as_str(), "root");
        }
    }
}
