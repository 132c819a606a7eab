//! reqwest-backed [`Transport`]
//!
//! Request paths are appended to the configured base URL, so a base of
//! `https://host/api` and a path of `/chats` targets `https://host/api/chats`.
//! Every HTTP status is handed back as an [`ApiResponse`]; only failures that
//! prevent a status from arriving become errors.

use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::{ParleyError, Result};
use crate::gateway::{ApiRequest, ApiResponse, Transport};

/// HTTP transport built on a shared `reqwest::Client`.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use parley::gateway::http::HttpTransport;
///
/// let transport = HttpTransport::new(
///     url::Url::parse("http://localhost:3000").unwrap(),
///     Duration::from_secs(30),
///     "parley-docs",
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Underlying reqwest HTTP client.
    http_client: reqwest::Client,
    /// Base URL every request path is appended to.
    base_url: url::Url,
}

impl HttpTransport {
    /// Construct a new [`HttpTransport`] targeting `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend root, e.g. `https://host/api`.
    /// * `timeout` - Per-request timeout.
    /// * `user_agent` - Value sent in the `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns [`ParleyError::Http`] if the TLS backend cannot be
    /// initialised.
    pub fn new(base_url: url::Url, timeout: Duration, user_agent: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(ParleyError::Http)?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Builds a transport from the `api` section of the configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| ParleyError::Config(format!("invalid api.base_url: {}", e)))?;
        Self::new(
            base_url,
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )
    }

    /// The URL a request for `path` is sent to.
    pub fn url_for(&self, path: &str) -> Result<url::Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        url::Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ParleyError::Transport(format!("invalid request URL: {}", e)).into())
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path)?;
        tracing::debug!("{} {}", request.method, url);

        let mut req = self.http_client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            ParleyError::Transport(format!(
                "{} {} failed: {}",
                request.method, request.path, e
            ))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ParleyError::Transport(format!("failed to read response body: {}", e))
        })?;

        tracing::debug!("{} {} -> {}", request.method, request.path, status);
        Ok(ApiResponse { status, body })
    }
}
