//! Account registration and login
//!
//! [`AuthClient`] issues the `/auth/*` calls through the [`RequestGateway`]
//! and keeps the resulting bearer token in the gateway's credential store, so
//! every later request is authenticated.

use serde::{Deserialize, Serialize};

use crate::error::{ParleyError, Result};
use crate::gateway::{ApiRequest, RequestGateway};

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";

/// New account details sent to `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    /// Date of birth as entered, e.g. `1990-04-12`
    pub birthday: String,
    /// Education level; the backend names this field `escolaridade`
    #[serde(rename = "escolaridade")]
    pub education: String,
    pub password: String,
}

/// Credentials sent to `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account echoed back by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
}

/// Session established by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginSession {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default, alias = "name")]
    pub username: Option<String>,
}

/// Client for the account endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    gateway: RequestGateway,
}

impl AuthClient {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    /// Creates an account. Does not log in.
    ///
    /// # Errors
    ///
    /// [`ParleyError::Auth`] when the backend rejects the registration,
    /// otherwise gateway errors.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser> {
        let body = serde_json::to_value(request)?;
        let response = self
            .gateway
            .send(ApiRequest::post(REGISTER_PATH, body))
            .await
            .map_err(|e| rejected_as_auth(e, "registration rejected"))?;

        if response.body.trim().is_empty() {
            return Ok(RegisteredUser {
                username: request.username.clone(),
            });
        }
        let user: RegisteredUser = response.json()?;
        tracing::info!("Registered account {}", user.username);
        Ok(user)
    }

    /// Logs in and stores the issued token and display name.
    ///
    /// When the backend omits the display name, the email is stored instead.
    ///
    /// # Errors
    ///
    /// [`ParleyError::Auth`] on bad credentials, [`ParleyError::MalformedResponse`]
    /// when no token comes back, otherwise gateway or credential-store errors.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginSession> {
        let body = serde_json::to_value(request)?;
        let response = self
            .gateway
            .send(ApiRequest::post(LOGIN_PATH, body))
            .await
            .map_err(|e| {
                if ParleyError::is_unauthorized(&e) {
                    ParleyError::Auth("invalid email or password".into()).into()
                } else {
                    rejected_as_auth(e, "login rejected")
                }
            })?;

        let session: LoginSession = response.json()?;
        if session.token.is_empty() {
            return Err(ParleyError::MalformedResponse("login returned an empty token".into()).into());
        }

        let display_name = session.username.as_deref().unwrap_or(&request.email);
        self.gateway.credentials().save(&session.token, display_name)?;
        tracing::info!("Logged in as {}", display_name);
        Ok(session)
    }

    /// Forgets the stored token and display name.
    pub fn logout(&self) -> Result<()> {
        self.gateway.credentials().clear()?;
        tracing::debug!("Cleared stored credentials");
        Ok(())
    }

    /// Display name of the logged-in user, if any.
    pub fn current_user(&self) -> Result<Option<String>> {
        if self.gateway.credentials().token()?.is_none() {
            return Ok(None);
        }
        self.gateway.credentials().display_name()
    }
}

// 4xx answers to account calls are user errors, not transport problems.
fn rejected_as_auth(err: anyhow::Error, what: &str) -> anyhow::Error {
    match err.downcast_ref::<ParleyError>() {
        Some(ParleyError::Status { status, body }) if (400..500).contains(status) => {
            let detail = body.trim();
            if detail.is_empty() {
                ParleyError::Auth(format!("{} ({})", what, status)).into()
            } else {
                ParleyError::Auth(format!("{} ({}): {}", what, status, detail)).into()
            }
        }
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::credentials::{CredentialStore, MemoryStore};
    use crate::gateway::SessionEvents;
    use crate::test_utils::{assert_error_contains, Reply, ScriptedTransport};

    fn client(replies: Vec<Reply>) -> (AuthClient, Arc<ScriptedTransport>, CredentialStore) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let credentials = CredentialStore::new(Arc::new(MemoryStore::new()));
        let gateway =
            RequestGateway::new(transport.clone(), credentials.clone(), SessionEvents::new());
        (AuthClient::new(gateway), transport, credentials)
    }

    fn login_request() -> LoginRequest {
        LoginRequest {
            email: "ana@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn test_register_request_uses_backend_field_name() {
        let request = RegisterRequest {
            email: "ana@example.com".into(),
            username: "Ana".into(),
            birthday: "1990-04-12".into(),
            education: "superior".into(),
            password: "pw".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["escolaridade"], "superior");
        assert!(json.get("education").is_none());
    }

    #[tokio::test]
    async fn test_login_saves_token_and_name() {
        let (auth, transport, credentials) =
            client(vec![Reply::status(200, r#"{"token":"t-1","username":"Ana"}"#)]);

        let session = auth.login(&login_request()).await.unwrap();

        assert_eq!(session.token, "t-1");
        assert_eq!(credentials.token().unwrap().as_deref(), Some("t-1"));
        assert_eq!(credentials.display_name().unwrap().as_deref(), Some("Ana"));
        let sent = transport.requests();
        assert_eq!(sent[0].path, LOGIN_PATH);
        assert_eq!(sent[0].body.as_ref().unwrap()["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn test_login_accepts_aliases_and_falls_back_to_email() {
        let (auth, _, credentials) = client(vec![Reply::status(200, r#"{"access_token":"t-2"}"#)]);

        auth.login(&login_request()).await.unwrap();

        assert_eq!(credentials.token().unwrap().as_deref(), Some("t-2"));
        assert_eq!(
            credentials.display_name().unwrap().as_deref(),
            Some("ana@example.com")
        );
    }

    #[tokio::test]
    async fn test_login_401_is_auth_error() {
        let (auth, _, credentials) = client(vec![Reply::status(401, "")]);

        assert_error_contains(
            auth.login(&login_request()).await,
            "invalid email or password",
        );
        assert!(credentials.token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_empty_token_is_malformed() {
        let (auth, _, credentials) = client(vec![Reply::status(200, r#"{"token":""}"#)]);

        let err = auth.login(&login_request()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ParleyError>(),
            Some(ParleyError::MalformedResponse(_))
        ));
        assert!(credentials.token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_conflict_is_auth_error() {
        let (auth, _, _) = client(vec![Reply::status(409, "email already in use")]);
        let request = RegisterRequest {
            email: "ana@example.com".into(),
            username: "Ana".into(),
            birthday: "1990-04-12".into(),
            education: "superior".into(),
            password: "pw".into(),
        };

        assert_error_contains(
            auth.register(&request).await,
            "registration rejected (409): email already in use",
        );
    }

    #[tokio::test]
    async fn test_register_server_error_stays_status() {
        let (auth, _, _) = client(vec![Reply::status(500, "")]);
        let request = RegisterRequest {
            email: "a@b.c".into(),
            username: "A".into(),
            birthday: String::new(),
            education: String::new(),
            password: "pw".into(),
        };

        let err = auth.register(&request).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParleyError>(),
            Some(ParleyError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_register_returns_username() {
        let (auth, transport, credentials) =
            client(vec![Reply::status(201, r#"{"username":"Ana"}"#)]);
        let request = RegisterRequest {
            email: "ana@example.com".into(),
            username: "Ana".into(),
            birthday: "1990-04-12".into(),
            education: "superior".into(),
            password: "pw".into(),
        };

        let user = auth.register(&request).await.unwrap();

        assert_eq!(user.username, "Ana");
        assert_eq!(transport.requests()[0].path, REGISTER_PATH);
        assert!(credentials.token().unwrap().is_none(), "register does not log in");
    }

    #[test]
    fn test_logout_and_current_user() {
        let (auth, _, credentials) = client(vec![]);
        assert!(auth.current_user().unwrap().is_none());

        credentials.save("tok", "Ana").unwrap();
        assert_eq!(auth.current_user().unwrap().as_deref(), Some("Ana"));

        auth.logout().unwrap();
        assert!(auth.current_user().unwrap().is_none());
    }
}
