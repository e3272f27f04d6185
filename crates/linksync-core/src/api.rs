//! Outbound path: package a user-provided text/URL payload and submit it to
//! the remote backend with a bearer token. No internal retry - the caller
//! decides whether to try again; this is a low-volume personal-sync tool,
//! not a guaranteed-delivery pipeline.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::AuthMirror;
use crate::constants::REQUEST_TIMEOUT_MS;
use crate::error::CoreError;
use crate::models::classify;
use crate::secure_storage::{SecureKey, SecureStorage};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest<'a> {
    user_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    message: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: Option<String>,
}

/// Thin HTTP client for the backend's message endpoint.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single authenticated POST of `{userId, type, message}`. Non-2xx maps
    /// to `ServerError`, transport failure to `NetworkError`/`Timeout`, an
    /// unparseable body to `InvalidResponse`.
    pub async fn send_message(
        &self,
        user_id: &str,
        content: &str,
        bearer_token: &str,
    ) -> Result<ApiResponse, CoreError> {
        let request = MessageRequest {
            user_id,
            kind: classify(content).as_str(),
            message: content,
        };

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("Authorization", format!("Bearer {}", bearer_token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::ServerError(status.as_u16()));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|_| CoreError::InvalidResponse)
    }
}

/// Secondary-context send gate. The auth mirror is re-read immediately before
/// every send (never cached across a suspension point), because this context
/// cannot ask the identity provider directly.
pub struct OutboundSender {
    mirror: AuthMirror,
    client: ApiClient,
}

impl OutboundSender {
    pub fn new(mirror: AuthMirror, client: ApiClient) -> Self {
        Self { mirror, client }
    }

    /// Send `content` on behalf of `user_id`.
    ///
    /// Fails with `CredentialsMissing` before any network I/O when no
    /// completed sign-in is mirrored or no token is stored, and with
    /// `AuthSessionStale` when the mirrored account differs from the one the
    /// caller cached.
    pub async fn send(&self, user_id: &str, content: &str) -> Result<ApiResponse, CoreError> {
        if !self.mirror.is_authenticated() {
            return Err(CoreError::CredentialsMissing);
        }

        match self.mirror.user_id() {
            Some(ref mirrored) if mirrored == user_id => {}
            Some(_) => return Err(CoreError::AuthSessionStale),
            None => return Err(CoreError::CredentialsMissing),
        }

        let token = SecureStorage::get(SecureKey::IdToken)
            .map_err(|_| CoreError::CredentialsMissing)?;

        self.client.send_message(user_id, content, &token).await
    }
}
