//! Process-wide session state.
//!
//! One context instance per process, created at startup and shared by every
//! screen. All mutation funnels through three operations — `bootstrap`,
//! `login`, `logout` — everything else reads.

use std::sync::Arc;

use tokio::sync::RwLock;

use classconnect_auth::{evaluate, AccessDecision, AccessPolicy, SessionView};
use classconnect_core::{AuthResult, Identity};

use crate::bootstrap::{resolve, Validation};
use crate::gateway::SessionGateway;

/// Runtime projection of "is anyone logged in, and who".
///
/// Starts `Unknown`, transitions exactly once to `Authenticated` or
/// `Anonymous` during bootstrap, then only moves between those two via
/// explicit login/logout.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    /// Bootstrap has not resolved yet.
    Unknown,
    Authenticated(Identity),
    Anonymous,
}

impl Session {
    /// Borrowed view for the authorization guard.
    pub fn view(&self) -> SessionView<'_> {
        match self {
            Session::Unknown => SessionView::Loading,
            Session::Anonymous => SessionView::Anonymous,
            Session::Authenticated(identity) => SessionView::Authenticated(identity),
        }
    }
}

/// Cheap-to-clone handle to the single session instance.
#[derive(Debug, Clone)]
pub struct SessionContext {
    gateway: SessionGateway,
    state: Arc<RwLock<Session>>,
}

impl SessionContext {
    pub fn new(gateway: SessionGateway) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(Session::Unknown)),
        }
    }

    pub fn gateway(&self) -> &SessionGateway {
        &self.gateway
    }

    /// One-shot startup reconciliation.
    ///
    /// Reads the credential store, re-validates against the server when a
    /// pair is cached, and resolves the session. Calling it again after
    /// resolution is a caller bug; it logs and leaves the session alone.
    pub async fn bootstrap(&self) -> Session {
        {
            let state = self.state.read().await;
            if !matches!(*state, Session::Unknown) {
                tracing::warn!("bootstrap called after the session already resolved");
                return state.clone();
            }
        }

        let resolved = match self.gateway.store().load().await {
            Ok(Some(record)) => {
                tracing::debug!(
                    username = %record.identity.username,
                    "found cached credentials; re-validating"
                );
                let validation =
                    Validation::from_result(self.gateway.fetch_current_identity().await);

                match &validation {
                    Validation::Fresh(identity) => {
                        // Token unchanged; refresh the snapshot the next
                        // start will read.
                        if let Err(err) = self.gateway.store().save(&record.token, identity).await
                        {
                            tracing::warn!(error = %err, "could not refresh cached identity");
                        }
                    }
                    Validation::Invalid => {
                        tracing::info!("cached token rejected; starting anonymous");
                    }
                    Validation::Unreachable(err) => {
                        tracing::warn!(error = %err, "re-validation unreachable; using cached identity");
                    }
                }

                resolve(record, validation)
            }
            Ok(None) => Session::Anonymous,
            Err(err) => {
                // Fail closed: unreadable storage is treated as never logged in.
                tracing::warn!(error = %err, "credential store unreadable at startup");
                Session::Anonymous
            }
        };

        let mut state = self.state.write().await;
        // A logout issued while re-validation was in flight wins.
        if matches!(*state, Session::Unknown) {
            *state = resolved;
        }
        state.clone()
    }

    /// Delegates to the gateway. On success the context reflects the new
    /// identity; on failure the current session is untouched and the error
    /// says whether the credentials or the connection were at fault.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Identity> {
        let identity = self.gateway.login(username, password).await?;

        let mut state = self.state.write().await;
        *state = Session::Authenticated(identity.clone());
        Ok(identity)
    }

    /// Nulls the in-memory identity immediately, then clears the stored
    /// pair. Never fails visibly.
    pub async fn logout(&self) {
        {
            let mut state = self.state.write().await;
            *state = Session::Anonymous;
        }
        self.gateway.logout().await;
    }

    /// Evaluate a destination's policy against the current session.
    pub async fn check_access(&self, policy: &AccessPolicy) -> AccessDecision {
        let state = self.state.read().await;
        evaluate(state.view(), policy)
    }

    /// Identity copy for rendering. Never the store's canonical value.
    pub async fn user(&self) -> Option<Identity> {
        match &*self.state.read().await {
            Session::Authenticated(identity) => Some(identity.clone()),
            _ => None,
        }
    }

    pub async fn session(&self) -> Session {
        self.state.read().await.clone()
    }

    /// True only while bootstrap has not resolved.
    pub async fn is_loading(&self) -> bool {
        matches!(*self.state.read().await, Session::Unknown)
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.state.read().await, Session::Authenticated(_))
    }

    // Capability predicates. All of them fail closed: before bootstrap
    // resolves (and when anonymous) every one answers false.

    pub async fn is_admin(&self) -> bool {
        self.flag(|u| u.is_admin).await
    }

    pub async fn is_professor(&self) -> bool {
        self.flag(|u| u.is_professor).await
    }

    pub async fn is_aluno(&self) -> bool {
        self.flag(|u| u.is_aluno).await
    }

    pub async fn is_gerente(&self) -> bool {
        self.flag(|u| u.is_gerente).await
    }

    pub async fn is_readonly(&self) -> bool {
        self.flag(|u| u.is_readonly).await
    }

    async fn flag(&self, project: impl Fn(&Identity) -> bool) -> bool {
        match &*self.state.read().await {
            Session::Authenticated(identity) => project(identity),
            _ => false,
        }
    }
}
