//! `classconnect-store` — durable persistence for the credential pair.
//!
//! Holds exactly one thing: the bearer token and the last-known identity
//! snapshot, always written and cleared together.

pub mod credentials;

pub use credentials::{CredentialRecord, CredentialStore, StoreError};
