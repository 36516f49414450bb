//! One-shot startup reconciliation between the cached identity and the
//! server-verified one.
//!
//! The decision itself is a pure function ([`resolve`]); the IO driver lives
//! on [`crate::session::SessionContext::bootstrap`].

use classconnect_core::{AuthError, Identity};
use classconnect_store::CredentialRecord;

use crate::session::Session;

/// Outcome of the live re-validation call, as the resolution rule sees it.
#[derive(Debug)]
pub enum Validation {
    /// `auth/me` succeeded; the fresh identity is authoritative.
    Fresh(Identity),
    /// The server proved the token dead (401). The gateway has already
    /// cleared the store.
    Invalid,
    /// Network/server trouble; the credential may still be good.
    Unreachable(AuthError),
}

impl Validation {
    /// Classify the gateway's answer.
    pub fn from_result(result: Result<Identity, AuthError>) -> Self {
        match result {
            Ok(identity) => Self::Fresh(identity),
            Err(AuthError::CredentialInvalid) => Self::Invalid,
            Err(err) => Self::Unreachable(err),
        }
    }
}

/// Resolve a cached credential pair against the re-validation outcome:
///
/// - a fresh identity wins over the cached snapshot;
/// - a proven-invalid token signs the user out;
/// - an unreachable server keeps the user signed in on the stale snapshot —
///   a transient hiccup must not forcibly sign out someone who was
///   legitimately logged in, while a provably dead credential must.
///
/// A single pass is definitive for the process lifetime: no retries, no
/// timeout-driven re-attempts. Staleness is only corrected by a future full
/// restart or an explicit logout/login.
pub fn resolve(cached: CredentialRecord, validation: Validation) -> Session {
    match validation {
        Validation::Fresh(identity) => Session::Authenticated(identity),
        Validation::Invalid => Session::Anonymous,
        Validation::Unreachable(_) => Session::Authenticated(cached.identity),
    }
}
