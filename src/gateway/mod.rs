//! Authenticated request gateway
//!
//! Every backend call goes through [`RequestGateway::send`]. The gateway
//! reads the bearer token from the [`CredentialStore`], attaches it, and
//! classifies the response:
//!
//! - `2xx` -- returned to the caller.
//! - `401` -- credentials are cleared, [`SessionEvent::Expired`] is published,
//!   and the call fails with [`ParleyError::Unauthorized`].
//! - anything else -- the call fails with [`ParleyError::Status`].
//!
//! Transport failures pass through unchanged. Nothing is retried here.
//!
//! # Module Layout
//!
//! - [`events`] -- session-expired broadcast bus
//! - [`http`]   -- reqwest implementation of [`Transport`]

pub mod events;
pub mod http;

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::credentials::CredentialStore;
use crate::error::{ParleyError, Result};

pub use events::{SessionEvent, SessionEvents};

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// A fully formed outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the backend base URL, e.g. `/chats`
    pub path: String,
    /// Optional JSON body
    pub body: Option<serde_json::Value>,
    /// Extra headers, applied in order
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a request without body or headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `DELETE path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// `POST path` with a JSON body
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets `name` to `value`, replacing any existing header of that name
    /// (case-insensitive).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// In-place form of [`with_header`](Self::with_header).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Value of the header `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParleyError::MalformedResponse`] if the body is not valid
    /// JSON of the requested shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ParleyError::MalformedResponse(e.to_string()).into())
    }
}

/// Performs the actual HTTP exchange.
///
/// Implementations return `Ok` for every response that carries a status,
/// including 4xx and 5xx. `Err` is reserved for failures where no status was
/// received, reported as [`ParleyError::Transport`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Execute `request` and return the response.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Single choke point for backend calls.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use parley::credentials::{CredentialStore, MemoryStore};
/// use parley::gateway::http::HttpTransport;
/// use parley::gateway::{ApiRequest, RequestGateway, SessionEvents};
///
/// # async fn example() -> parley::error::Result<()> {
/// let transport = HttpTransport::new(
///     url::Url::parse("http://localhost:3000")?,
///     std::time::Duration::from_secs(30),
///     "parley",
/// )?;
/// let gateway = RequestGateway::new(
///     Arc::new(transport),
///     CredentialStore::new(Arc::new(MemoryStore::new())),
///     SessionEvents::new(),
/// );
/// let response = gateway.send(ApiRequest::get("/chats")).await?;
/// println!("{}", response.body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    events: SessionEvents,
}

impl RequestGateway {
    /// Creates a gateway over the injected collaborators.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        events: SessionEvents,
    ) -> Self {
        Self {
            transport,
            credentials,
            events,
        }
    }

    /// Credential store this gateway reads the token from.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Session bus this gateway publishes to.
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Sends `request` with the bearer token attached when one is stored.
    ///
    /// # Errors
    ///
    /// - [`ParleyError::Unauthorized`] on 401, after credentials are cleared
    ///   and the session bus notified.
    /// - [`ParleyError::Status`] on any other non-2xx status.
    /// - Transport and credential-store errors unchanged.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        if let Some(token) = self.credentials.token()? {
            request.set_header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let method = request.method.clone();
        let path = request.path.clone();

        let response = self.transport.execute(request).await?;

        if response.status == 401 {
            tracing::warn!("{} {} returned 401, clearing credentials", method, path);
            self.expire_session();
            return Err(ParleyError::Unauthorized.into());
        }

        if !response.is_success() {
            return Err(ParleyError::Status {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        Ok(response)
    }

    fn expire_session(&self) {
        if let Err(e) = self.credentials.clear() {
            tracing::error!("Failed to clear credentials after 401: {:#}", e);
        }
        let receivers = self.events.publish(SessionEvent::Expired);
        tracing::debug!("Session expired event delivered to {} subscriber(s)", receivers);
    }
}
