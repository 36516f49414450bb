//! Client configuration.

use std::env;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

const API_URL_ENV: &str = "CLASSCONNECT_API_URL";

/// Connection settings for the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// A trailing `/` on `base_url` is trimmed so endpoint joins never
    /// produce double slashes.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Read `CLASSCONNECT_API_URL`, falling back to the local dev default.
    pub fn from_env() -> Self {
        match env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => {
                tracing::debug!("{API_URL_ENV} not set; using {DEFAULT_API_URL}");
                Self::new(DEFAULT_API_URL)
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
