//! Authorization decision engine.
//!
//! Maps a request's target resource to the first matching rule and evaluates
//! its required-authority predicate against the security context. Pure
//! policy check: no IO, no panics.

use serde::Serialize;

use crate::context::SecurityContext;
use crate::rules::{Requirement, RulePolicy};

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_permit(&self) -> bool {
        matches!(self, Self::Permit)
    }
}

/// Why a request was denied. Kept distinguishable for logs/metrics even
/// though the outward signal collapses detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Protected resource, no verified identity in the context.
    Unauthenticated,
    /// No configured rule matched the resource (fail-closed default).
    NoMatchingRule,
    /// The identity's authority set does not satisfy the matched predicate.
    InsufficientAuthority { required: Requirement },
}

/// Evaluate the configured policy for one request.
///
/// Rules are checked in configured order and the first match wins; exact
/// string comparison on authorities, no hierarchy between them.
pub fn decide(
    policy: &RulePolicy,
    path: &str,
    method: &str,
    context: &SecurityContext,
) -> Decision {
    let Some(rule) = policy.matching_rule(path, method) else {
        return Decision::Deny(DenyReason::NoMatchingRule);
    };

    if rule.requirement.is_public() {
        return Decision::Permit;
    }

    let Some(identity) = context.identity() else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    let satisfied = match &rule.requirement {
        Requirement::Public => true,
        Requirement::AnyOf(required) => required.iter().any(|a| identity.has_authority(a)),
        Requirement::AllOf(required) => required.iter().all(|a| identity.has_authority(a)),
    };

    if satisfied {
        Decision::Permit
    } else {
        Decision::Deny(DenyReason::InsufficientAuthority {
            required: rule.requirement.clone(),
        })
    }
}

/// Loggable explanation of an authorization decision.
///
/// Answers "why was this request allowed/denied?" for internal logs; it is
/// never sent to the client.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionExplanation {
    pub path: String,
    pub method: String,
    pub granted: bool,
    pub reason: String,
    pub subject: Option<String>,
    pub held_authorities: Vec<String>,
}

/// Evaluate and explain in one pass.
pub fn explain_decision(
    policy: &RulePolicy,
    path: &str,
    method: &str,
    context: &SecurityContext,
) -> (Decision, DecisionExplanation) {
    let decision = decide(policy, path, method, context);

    let reason = match &decision {
        Decision::Permit => match policy.matching_rule(path, method) {
            Some(rule) if rule.requirement.is_public() => "public resource".to_string(),
            Some(rule) => format!("identity satisfies {}", rule.requirement),
            None => "permitted".to_string(),
        },
        Decision::Deny(DenyReason::Unauthenticated) => {
            "protected resource without verified identity".to_string()
        }
        Decision::Deny(DenyReason::NoMatchingRule) => {
            "no matching rule, denied by fail-closed default".to_string()
        }
        Decision::Deny(DenyReason::InsufficientAuthority { required }) => {
            format!("identity does not satisfy {required}")
        }
    };

    let explanation = DecisionExplanation {
        path: path.to_string(),
        method: method.to_string(),
        granted: decision.is_permit(),
        reason,
        subject: context.identity().map(|i| i.subject().to_string()),
        held_authorities: context
            .identity()
            .map(|i| i.authorities().iter().map(|a| a.to_string()).collect())
            .unwrap_or_default(),
    };

    (decision, explanation)
}
