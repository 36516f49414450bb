//! Failure taxonomy for the session boundary.

use thiserror::Error;

/// Result type used across the session core.
pub type AuthResult<T> = Result<T, AuthError>;

/// What went wrong at the session boundary.
///
/// The gateway returns these instead of panicking; the `Display` text is what
/// the UI shows, so it distinguishes "wrong credentials" from "server
/// unreachable" without leaking anything else.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The server proved the credential invalid (401, or a rejected login).
    /// Local credentials are always cleared when this surfaces.
    #[error("invalid credentials")]
    CredentialInvalid,

    /// Transport or server trouble. The credential may still be good, so
    /// local state is preserved and the user may simply retry.
    #[error("could not reach the server: {0}")]
    Connection(String),

    /// Bad input rejected before (or by) the server. No state mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Local credential persistence failed. Distinct from `Connection` so
    /// the UI never reports a disk problem as "server unreachable".
    #[error("credential storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True when the failure proves the stored credential is dead everywhere
    /// it might be reused.
    pub fn is_credential_invalid(&self) -> bool {
        matches!(self, Self::CredentialInvalid)
    }
}
