//! `gatewarden-access` — request-scoped identity and access decisions.
//!
//! Holds the verified identity for one request, evaluates configured
//! authorization rules against it, and sequences the whole per-request
//! pipeline (extract → validate → populate → authorize).

pub mod authorize;
pub mod context;
pub mod pipeline;
pub mod rules;

pub use authorize::{decide, explain_decision, Decision, DecisionExplanation, DenyReason};
pub use context::{AuthenticatedIdentity, SecurityContext};
pub use pipeline::{PipelineOutcome, Rejection, RejectionClass, RequestHead, RequestPipeline};
pub use rules::{AuthorizationRule, Requirement, ResourceMatcher, RulePolicy};
