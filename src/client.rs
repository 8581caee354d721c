//! HTTP client for a running ShadowBoard server.
//!
//! Configuration is via environment variables:
//! - `SHADOWBOARD_URL` - Base URL (default: `http://127.0.0.1:17020/api/v1`)

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::VaultStatus;

/// Default URL for a local server.
pub const DEFAULT_URL: &str = "http://127.0.0.1:17020/api/v1";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vault is locked")]
    Locked,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct VaultClient {
    base_url: String,
    client: Client,
}

impl VaultClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("SHADOWBOARD_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::LOCKED => Err(ClientError::Locked),
            StatusCode::CONFLICT => Err(ClientError::Conflict(body)),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
            _ => Err(ClientError::Server(format!("{}: {}", status, body))),
        }
    }

    pub async fn status(&self) -> Result<VaultStatus, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/vault")
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn lock(&self) -> Result<VaultStatus, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/vault/lock")
            .send()
            .await?;
        self.handle_response(response).await
    }
}
