//! Declarative access policy.
//!
//! An ordered list of (method, path pattern) → requirement rules. The first
//! rule matching a request decides; a request matching no rule is denied.

use axum::http::Method;
use cinerate_core::auth::Role;
use cinerate_core::models::auth::Principal;

/// What a matched rule demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    PermitAll,
    Authenticated,
    Role(Role),
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The caller must authenticate first.
    Unauthenticated,
    /// The caller is authenticated but lacks a required role.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment.
    Any,
    /// `**`: any number of trailing segments.
    Rest,
}

/// Slash-separated path pattern with `*` and trailing `**` wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Any => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if parts.next() != Some(lit.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// One policy entry. `method: None` matches every method.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub method: Option<Method>,
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn new(method: Option<Method>, pattern: &str, requirement: Requirement) -> Self {
        Self {
            method,
            pattern: PathPattern::parse(pattern),
            requirement,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

/// Ordered rule list; first match wins.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// The service's policy. Ends with a catch-all that requires authentication.
    pub fn reference() -> Self {
        let admin = Requirement::Role(Role::Admin);
        Self::new(vec![
            AccessRule::new(None, "/auth/**", Requirement::PermitAll),
            AccessRule::new(Some(Method::POST), "/register", Requirement::PermitAll),
            AccessRule::new(None, "/health", Requirement::PermitAll),
            AccessRule::new(Some(Method::GET), "/movies/top-rated", Requirement::PermitAll),
            AccessRule::new(None, "/movies/*/ratings", Requirement::Authenticated),
            AccessRule::new(Some(Method::POST), "/movies", admin),
            AccessRule::new(Some(Method::DELETE), "/movies/*", admin),
            AccessRule::new(Some(Method::GET), "/movies/*", Requirement::PermitAll),
            AccessRule::new(Some(Method::GET), "/movies", Requirement::PermitAll),
            AccessRule::new(Some(Method::DELETE), "/register/*", Requirement::Authenticated),
            AccessRule::new(None, "/**", Requirement::Authenticated),
        ])
    }

    pub fn authorize(&self, method: &Method, path: &str, principal: &Principal) -> Decision {
        let Some(rule) = self.rules.iter().find(|r| r.matches(method, path)) else {
            return Decision::Deny(deny_reason(principal));
        };
        let allowed = match rule.requirement {
            Requirement::PermitAll => true,
            Requirement::Authenticated => principal.is_authenticated(),
            Requirement::Role(role) => principal.identity().is_some_and(|id| id.has_role(role)),
        };
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(deny_reason(principal))
        }
    }
}

fn deny_reason(principal: &Principal) -> DenyReason {
    if principal.is_authenticated() {
        DenyReason::Forbidden
    } else {
        DenyReason::Unauthenticated
    }
}
