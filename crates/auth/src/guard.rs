//! The per-navigation access decision.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use thiserror::Error;

use classconnect_core::Identity;

use crate::policy::AccessPolicy;

/// What the guard needs to know about the current session.
#[derive(Debug, Clone, Copy)]
pub enum SessionView<'a> {
    /// Bootstrap has not resolved; no final decision may be made yet.
    Loading,
    Anonymous,
    Authenticated(&'a Identity),
}

/// Outcome of evaluating a policy against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render a neutral waiting state and re-evaluate once resolved.
    Defer,
    Allow,
    /// Turn the visitor away. The reason's `Display` text is safe to show:
    /// it never reveals which roles would have been admitted.
    Deny(DenialReason),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Nobody is logged in; send the visitor to the login entry point.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The destination mutates data and the identity is read-only.
    #[error("read-only role")]
    ReadOnly,

    #[error("role not permitted")]
    RoleNotPermitted,
}

/// Evaluate `policy` against the current session. First match wins:
///
/// 1. an unresolved session defers,
/// 2. an anonymous one is turned away,
/// 3. a read-only identity is vetoed on write-requiring destinations
///    whatever the role allowlist would have said,
/// 4. then the role allowlist applies (empty = any authenticated identity).
pub fn evaluate(session: SessionView<'_>, policy: &AccessPolicy) -> AccessDecision {
    let identity = match session {
        SessionView::Loading => return AccessDecision::Defer,
        SessionView::Anonymous => return AccessDecision::Deny(DenialReason::NotAuthenticated),
        SessionView::Authenticated(identity) => identity,
    };

    if policy.require_write && identity.is_readonly {
        return AccessDecision::Deny(DenialReason::ReadOnly);
    }

    if !policy.allows_role(identity.role) {
        return AccessDecision::Deny(DenialReason::RoleNotPermitted);
    }

    AccessDecision::Allow
}
