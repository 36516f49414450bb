//! `classconnect-auth` — pure authorization boundary for protected views.
//!
//! This crate is intentionally decoupled from HTTP and storage: the session
//! crates decide *who* the visitor is, this one only decides *whether* that
//! visitor may enter a destination.

pub mod guard;
pub mod policy;

pub use guard::{evaluate, AccessDecision, DenialReason, SessionView};
pub use policy::AccessPolicy;
