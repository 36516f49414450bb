//! `classconnect-core` — domain foundation for the session core.
//!
//! This crate contains **pure domain** primitives (no HTTP, no storage).

pub mod error;
pub mod identity;

pub use error::{AuthError, AuthResult};
pub use identity::{Identity, Role, UnknownRole};
