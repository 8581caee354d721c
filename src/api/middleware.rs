//! Origin checks for the local API.
//!
//! The vault serves decrypted state over plain HTTP on the loopback
//! interface, so browsers must not be able to reach it from arbitrary web
//! pages. Requests without an `Origin` header (CLI, curl) and same-origin
//! requests pass; cross-origin requests pass only for configured origins.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Security configuration loaded from environment variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Cross-origin callers allowed to use the API
    /// (from SHADOWBOARD_CORS_ORIGINS, comma-separated)
    pub cors_origins: Vec<String>,
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("SHADOWBOARD_CORS_ORIGINS")
            .map(|s| parse_origins(&s))
            .unwrap_or_default();
        Self { cors_origins }
    }

    /// Same-origin and header-less callers only.
    pub fn local() -> Self {
        Self::default()
    }

    pub fn with_cors_origins(origins: Vec<String>) -> Self {
        Self {
            cors_origins: origins.iter().map(|o| normalize_origin(o)).collect(),
        }
    }

    /// Whether a request carrying `origin` may reach the API. `host` is the
    /// request's `Host` header; a page served by this server is same-origin.
    pub fn allows(&self, origin: &str, host: Option<&str>) -> bool {
        let origin = normalize_origin(origin);
        if let Some(host) = host {
            if origin == format!("http://{}", host) {
                return true;
            }
        }
        self.cors_origins.iter().any(|allowed| *allowed == origin)
    }

    /// CORS headers for the configured origins. An empty list answers no
    /// cross-origin request.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins = self
            .cors_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok());
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_origin)
        .filter(|o| !o.is_empty())
        .collect()
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Reject browser requests from origins that are neither this server nor
/// configured.
pub async fn origin_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let headers = request.headers();
    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(next.run(request).await);
    };

    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    match origin.to_str() {
        Ok(origin) if config.allows(origin, host) => Ok(next.run(request).await),
        Ok(origin) => {
            tracing::warn!("Rejected request from origin {}", origin);
            Err(StatusCode::FORBIDDEN)
        }
        Err(_) => {
            tracing::warn!("Rejected request with unreadable Origin header");
            Err(StatusCode::FORBIDDEN)
        }
    }
}
