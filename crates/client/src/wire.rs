//! Request/response shapes for the auth endpoints.

use serde::{Deserialize, Serialize};

use classconnect_core::Identity;

/// Body for `POST auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response for `POST auth/login`.
///
/// The server may answer 200 with `success: false`, so every field beyond
/// the flag is optional.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LoginResponse {
    /// The server's explanation for a rejected login, if it sent one.
    pub fn failure_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Generic `{ success, data }` envelope used by every authenticated endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// The server's explanation for a reported failure, if it sent one.
    pub fn failure_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Body for `POST auth/reset-password/change`.
#[derive(Debug, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub senha_atual: &'a str,
    pub nova_senha: &'a str,
}

/// Body for `POST auth/reset-password/generate-code`.
#[derive(Debug, Serialize)]
pub struct GenerateRecoveryCodeRequest<'a> {
    pub username: &'a str,
}

/// Data returned by `generate-code`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryCode {
    pub codigo: String,
    pub usuario: String,
    pub valido_ate: String,
}

/// Body for `POST auth/reset-password/use-code`.
#[derive(Debug, Serialize)]
pub struct UseRecoveryCodeRequest {
    pub codigo: String,
    pub nova_senha: String,
}

/// Body for `POST auth/reset-password/admin`.
#[derive(Debug, Serialize)]
pub struct ResetPasswordAdminRequest<'a> {
    pub username: &'a str,
    pub nova_senha: &'a str,
}
