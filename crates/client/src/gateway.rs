//! The HTTP boundary of the session core.
//!
//! The gateway is the only component that talks to the remote API. It
//! attaches the stored bearer token to outbound calls, maps transport
//! failures to the auth error taxonomy, and — the one side effect it owns —
//! clears the credential store when the server proves the token dead (401).

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use classconnect_core::{AuthError, AuthResult, Identity};
use classconnect_store::{CredentialStore, StoreError};

use crate::config::ClientConfig;
use crate::wire::{
    ApiEnvelope, ChangePasswordRequest, GenerateRecoveryCodeRequest, LoginRequest, LoginResponse,
    RecoveryCode, ResetPasswordAdminRequest, UseRecoveryCodeRequest,
};

/// HTTP gateway owning the credential store.
#[derive(Debug, Clone)]
pub struct SessionGateway {
    http: reqwest::Client,
    config: ClientConfig,
    store: CredentialStore,
}

impl SessionGateway {
    pub fn new(config: ClientConfig, store: CredentialStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            store,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// `POST auth/login`, unauthenticated.
    ///
    /// On success the credential store already holds the new token and
    /// identity when this returns: callers may rely on the store being warm.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Identity> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::validation("username and password are required"));
        }

        let response = self
            .http
            .post(self.config.endpoint("auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => return Err(AuthError::CredentialInvalid),
            StatusCode::BAD_REQUEST => {
                let body: LoginResponse = response.json().await.map_err(connection_error)?;
                return Err(AuthError::validation(
                    body.failure_message().unwrap_or("invalid login request"),
                ));
            }
            status if !status.is_success() => {
                return Err(AuthError::connection(format!(
                    "login failed with HTTP {status}"
                )));
            }
            _ => {}
        }

        let body: LoginResponse = response.json().await.map_err(connection_error)?;
        if !body.success {
            tracing::warn!(message = body.failure_message(), "login rejected by server");
            return Err(AuthError::CredentialInvalid);
        }
        let (Some(token), Some(identity)) = (body.token, body.user) else {
            return Err(AuthError::connection("login response missing token or user"));
        };
        warn_if_inconsistent(&identity);

        self.store
            .save(&token, &identity)
            .await
            .map_err(storage_error)?;

        tracing::debug!(username = %identity.username, "login succeeded; credentials stored");
        Ok(identity)
    }

    /// `GET auth/me` carrying the stored token (or nothing, if the store is
    /// empty — the request is still attempted and expected to fail).
    pub async fn fetch_current_identity(&self) -> AuthResult<Identity> {
        let identity: Identity = self.get("auth/me").await?;
        warn_if_inconsistent(&identity);
        Ok(identity)
    }

    /// Local logout. Clears the stored pair unconditionally; no network
    /// round-trip is needed and failures are logged, never surfaced.
    pub async fn logout(&self) {
        if let Err(err) = self.store.clear().await {
            tracing::error!(error = %err, "failed to clear credential store on logout");
        } else {
            tracing::debug!("credentials cleared");
        }
    }

    /// `POST auth/reset-password/change` (authenticated).
    pub async fn change_password(&self, current: &str, new_password: &str) -> AuthResult<()> {
        if new_password.trim().is_empty() {
            return Err(AuthError::validation("new password must not be empty"));
        }

        self.send_expect_ok(
            Method::POST,
            "auth/reset-password/change",
            &ChangePasswordRequest {
                senha_atual: current,
                nova_senha: new_password,
            },
        )
        .await
    }

    /// `POST auth/reset-password/admin` (authenticated): an admin sets a
    /// user's password directly, no recovery code involved. The server
    /// enforces who may call this; a non-admin gets a plain rejection.
    pub async fn reset_password_admin(
        &self,
        username: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if username.trim().is_empty() || new_password.trim().is_empty() {
            return Err(AuthError::validation("username and new password are required"));
        }

        self.send_expect_ok(
            Method::POST,
            "auth/reset-password/admin",
            &ResetPasswordAdminRequest {
                username,
                nova_senha: new_password,
            },
        )
        .await
    }

    /// `POST auth/reset-password/generate-code` (authenticated, admin-driven).
    pub async fn generate_recovery_code(&self, username: &str) -> AuthResult<RecoveryCode> {
        self.send(
            Method::POST,
            "auth/reset-password/generate-code",
            &GenerateRecoveryCodeRequest { username },
        )
        .await
    }

    /// `POST auth/reset-password/use-code`, unauthenticated — the code is the
    /// credential. Codes are upper-cased before sending, matching how they
    /// are issued.
    pub async fn reset_password_with_code(
        &self,
        code: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if new_password.trim().is_empty() {
            return Err(AuthError::validation("new password must not be empty"));
        }

        let response = self
            .http
            .post(self.config.endpoint("auth/reset-password/use-code"))
            .json(&UseRecoveryCodeRequest {
                codigo: code.trim().to_uppercase(),
                nova_senha: new_password.to_string(),
            })
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            let body: ApiEnvelope<serde_json::Value> =
                response.json().await.map_err(connection_error)?;
            return Err(AuthError::validation(
                body.failure_message().unwrap_or("recovery code rejected"),
            ));
        }
        if !status.is_success() {
            return Err(AuthError::connection(format!(
                "password reset failed with HTTP {status}"
            )));
        }

        Ok(())
    }

    /// Generic authenticated GET: unwraps the `{ success, data }` envelope.
    ///
    /// Every out-of-core API call in the console goes through this (or
    /// [`Self::send`]) to get uniform bearer attachment and 401 handling.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        let envelope = self.envelope::<T, ()>(Method::GET, path, None).await?;
        envelope
            .data
            .ok_or_else(|| AuthError::connection(format!("{path} response missing data")))
    }

    /// Generic authenticated request with a JSON body.
    pub async fn send<T, B>(&self, method: Method, path: &str, body: &B) -> AuthResult<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let envelope = self.envelope::<T, B>(method, path, Some(body)).await?;
        envelope
            .data
            .ok_or_else(|| AuthError::connection(format!("{path} response missing data")))
    }

    /// Like [`Self::send`], for endpoints that acknowledge without data.
    pub async fn send_expect_ok<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> AuthResult<()> {
        self.envelope::<serde_json::Value, B>(method, path, Some(body))
            .await?;
        Ok(())
    }

    async fn envelope<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> AuthResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let mut request = self.http.request(method, self.config.endpoint(path));

        // The token is re-read from the store per call; a login or logout
        // elsewhere in the process is picked up immediately.
        match self.store.load().await.map_err(storage_error)? {
            Some(record) => request = request.bearer_auth(&record.token),
            None => tracing::debug!(%path, "no stored token; sending unauthenticated request"),
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(connection_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // A 401 proves the cached token is dead everywhere it might be
            // reused; drop it before surfacing the failure.
            self.store.clear().await.map_err(storage_error)?;
            tracing::warn!(%path, "token rejected by server; credentials cleared");
            return Err(AuthError::CredentialInvalid);
        }
        if status == StatusCode::BAD_REQUEST {
            let body: ApiEnvelope<serde_json::Value> =
                response.json().await.map_err(connection_error)?;
            return Err(AuthError::validation(
                body.failure_message().unwrap_or("request rejected"),
            ));
        }
        if !status.is_success() {
            return Err(AuthError::connection(format!(
                "{path} failed with HTTP {status}"
            )));
        }

        let envelope: ApiEnvelope<T> = response.json().await.map_err(connection_error)?;
        if !envelope.success {
            return Err(AuthError::connection(
                envelope
                    .failure_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{path} reported failure")),
            ));
        }

        Ok(envelope)
    }
}

fn warn_if_inconsistent(identity: &Identity) {
    if !identity.flags_consistent() {
        tracing::warn!(
            username = %identity.username,
            role = %identity.role,
            "identity flags disagree with role; trusting role"
        );
    }
}

fn connection_error(err: reqwest::Error) -> AuthError {
    AuthError::connection(err.to_string())
}

fn storage_error(err: StoreError) -> AuthError {
    AuthError::storage(err.to_string())
}
