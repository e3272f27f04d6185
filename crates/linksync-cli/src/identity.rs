//! HTTP identity provider against the backend's `/login` and `/register`
//! endpoints (the browser-extension variant of the auth collaborator).
//!
//! The session lives in memory for the duration of one CLI invocation; the
//! durable pieces (tokens, mirrored auth state) are persisted by the core's
//! auth service, which is what later invocations and secondary surfaces read.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use linksync_core::auth::{IdentityProvider, SessionStatus, SessionTokens};
use linksync_core::CoreError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const LOGIN_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    success: bool,
    message: Option<String>,
    user_id: Option<String>,
    access_token: Option<String>,
    id_token: Option<String>,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: String,
    access_token: String,
    id_token: String,
}

pub struct HttpIdentityProvider {
    http: Client,
    base_url: String,
    session: Mutex<Option<Session>>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(LOGIN_TIMEOUT_MS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
            session: Mutex::new(None),
        }
    }

    async fn post_credentials(
        &self,
        endpoint: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, CoreError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .json(&CredentialsRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::ServerError(status.as_u16()));
        }
        response
            .json::<LoginResponse>()
            .await
            .map_err(|_| CoreError::InvalidResponse)
    }

    /// Create an account. Not part of the provider trait; only the CLI's
    /// register command uses it.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), CoreError> {
        let response = self.post_credentials("/register", username, password).await?;
        if response.success {
            Ok(())
        } else {
            Err(CoreError::SignInFailed(
                response
                    .message
                    .unwrap_or_else(|| "Registration failed".to_string()),
            ))
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, username: &str, password: &str) -> Result<SessionStatus, CoreError> {
        let response = self.post_credentials("/login", username, password).await?;

        if !response.success {
            return Ok(SessionStatus { is_signed_in: false });
        }

        let (Some(user_id), Some(access_token), Some(id_token)) =
            (response.user_id, response.access_token, response.id_token)
        else {
            return Err(CoreError::InvalidResponse);
        };

        *self.session.lock().expect("session lock") = Some(Session {
            user_id,
            access_token,
            id_token,
        });
        Ok(SessionStatus { is_signed_in: true })
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        self.session.lock().expect("session lock").take();
        Ok(())
    }

    async fn fetch_session(&self) -> Result<SessionStatus, CoreError> {
        let is_signed_in = self.session.lock().expect("session lock").is_some();
        Ok(SessionStatus { is_signed_in })
    }

    async fn current_user(&self) -> Result<String, CoreError> {
        self.session
            .lock()
            .expect("session lock")
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or(CoreError::CredentialsMissing)
    }

    async fn tokens(&self) -> Result<SessionTokens, CoreError> {
        self.session
            .lock()
            .expect("session lock")
            .as_ref()
            .map(|s| SessionTokens {
                access_token: s.access_token.clone(),
                id_token: s.id_token.clone(),
            })
            .ok_or(CoreError::CredentialsMissing)
    }
}
