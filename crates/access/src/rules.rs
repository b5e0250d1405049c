//! Authorization rules: resource matchers mapped to authority predicates.
//!
//! Rules are configured once at startup and read-only afterwards. Matching
//! is ordered: the first rule whose matcher covers the request wins; no rule
//! merging happens. A request matching no rule is denied (fail-closed) —
//! a rule list that wants open unmatched resources must end with an explicit
//! catch-all `Public` rule.

use std::borrow::Cow;
use std::collections::BTreeSet;

use gatewarden_core::Authority;

/// Matches a request's target resource by path pattern and optional method.
///
/// Path patterns are segment globs: `*` matches exactly one segment, `**`
/// matches any number of trailing segments (including none). A rule without
/// a method applies to every method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMatcher {
    pattern: Cow<'static, str>,
    method: Option<Cow<'static, str>>,
}

impl ResourceMatcher {
    pub fn path(pattern: impl Into<Cow<'static, str>>) -> Self {
        Self {
            pattern: pattern.into(),
            method: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<Cow<'static, str>>) -> Self {
        let method = method.into();
        self.method = Some(Cow::Owned(method.to_ascii_uppercase()));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, path: &str, method: &str) -> bool {
        if let Some(expected) = &self.method {
            if !expected.eq_ignore_ascii_case(method) {
                return false;
            }
        }

        let pattern: Vec<&str> = segments(&self.pattern);
        let path: Vec<&str> = segments(path);
        match_segments(&pattern, &path)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((head, rest)) => match path.split_first() {
            Some((segment, path_rest)) => {
                (*head == "*" || head == segment) && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

/// Required-authority predicate for a matched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No authentication required.
    Public,
    /// The identity must hold at least one of the listed authorities.
    AnyOf(BTreeSet<Authority>),
    /// The identity must hold every listed authority.
    AllOf(BTreeSet<Authority>),
}

impl Requirement {
    pub fn any_of<I, A>(authorities: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Cow<'static, str>>,
    {
        Self::AnyOf(authorities.into_iter().map(Authority::new).collect())
    }

    pub fn all_of<I, A>(authorities: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Cow<'static, str>>,
    {
        Self::AllOf(authorities.into_iter().map(Authority::new).collect())
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn join(set: &BTreeSet<Authority>) -> String {
            set.iter()
                .map(Authority::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::Public => f.write_str("public"),
            Self::AnyOf(set) => write!(f, "any of [{}]", join(set)),
            Self::AllOf(set) => write!(f, "all of [{}]", join(set)),
        }
    }
}

/// One configured rule: resource matcher → required-authority predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRule {
    pub matcher: ResourceMatcher,
    pub requirement: Requirement,
}

impl AuthorizationRule {
    pub fn new(matcher: ResourceMatcher, requirement: Requirement) -> Self {
        Self {
            matcher,
            requirement,
        }
    }
}

/// Ordered, read-only list of authorization rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulePolicy {
    rules: Vec<AuthorizationRule>,
}

impl RulePolicy {
    pub fn new(rules: Vec<AuthorizationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AuthorizationRule] {
        &self.rules
    }

    /// First matching rule, in configured order. `None` means fail-closed
    /// deny.
    pub fn matching_rule(&self, path: &str, method: &str) -> Option<&AuthorizationRule> {
        self.rules.iter().find(|r| r.matcher.matches(path, method))
    }

    /// Whether the first matching rule (if any) is `Public`.
    pub fn is_public(&self, path: &str, method: &str) -> bool {
        self.matching_rule(path, method)
            .is_some_and(|r| r.requirement.is_public())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_star_matches_one_segment() {
        let matcher = ResourceMatcher::path("/users/*/profile");

        assert!(matcher.matches("/users/42/profile", "GET"));
        assert!(!matcher.matches("/users/profile", "GET"));
        assert!(!matcher.matches("/users/42/settings/profile", "GET"));
    }

    #[test]
    fn double_star_matches_any_remainder() {
        let matcher = ResourceMatcher::path("/admin/**");

        assert!(matcher.matches("/admin", "GET"));
        assert!(matcher.matches("/admin/users", "GET"));
        assert!(matcher.matches("/admin/users/42/roles", "POST"));
        assert!(!matcher.matches("/administration", "GET"));
        assert!(!matcher.matches("/api/admin/users", "GET"));
    }

    #[test]
    fn method_restriction() {
        let matcher = ResourceMatcher::path("/reports/**").with_method("get");

        assert!(matcher.matches("/reports/daily", "GET"));
        assert!(matcher.matches("/reports/daily", "get"));
        assert!(!matcher.matches("/reports/daily", "POST"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let policy = RulePolicy::new(vec![
            AuthorizationRule::new(
                ResourceMatcher::path("/admin/health"),
                Requirement::Public,
            ),
            AuthorizationRule::new(
                ResourceMatcher::path("/admin/**"),
                Requirement::all_of(["ADMIN"]),
            ),
        ]);

        let rule = policy.matching_rule("/admin/health", "GET").unwrap();
        assert!(rule.requirement.is_public());

        let rule = policy.matching_rule("/admin/users", "GET").unwrap();
        assert_eq!(rule.requirement, Requirement::all_of(["ADMIN"]));
    }

    #[test]
    fn no_rule_matches_means_none() {
        let policy = RulePolicy::new(vec![AuthorizationRule::new(
            ResourceMatcher::path("/api/**"),
            Requirement::any_of(["USER"]),
        )]);

        assert!(policy.matching_rule("/metrics", "GET").is_none());
        assert!(!policy.is_public("/metrics", "GET"));
    }
}
