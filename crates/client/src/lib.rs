//! `classconnect-client` — session core for the ClassConnect admin console.
//!
//! Owns the stateful pieces every screen builds on: the HTTP gateway that
//! carries the bearer token, the one-shot startup bootstrapper, and the
//! process-wide session context the authorization guard reads.

pub mod bootstrap;
pub mod config;
pub mod gateway;
pub mod session;
pub mod wire;

pub use bootstrap::{resolve, Validation};
pub use config::ClientConfig;
pub use gateway::SessionGateway;
pub use session::{Session, SessionContext};
