//! Authenticated-session state, mirrored across execution contexts.
//!
//! Sign-in and sign-out happen only in the primary context, against an
//! identity provider this crate treats as an opaque collaborator. Secondary
//! contexts (share extension, browser popup) may start before that provider
//! has finished initializing there, so they never ask it "is a session
//! active" - they trust the [`AuthMirror`] written into shared storage by the
//! primary context, re-reading it at point-of-use. Mirror reads may be stale;
//! they are never authenticated=true without a completed sign-in.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::constants::{SESSION_POLL_INTERVAL_MS, SESSION_SETTLE_TIMEOUT_MS};
use crate::error::CoreError;
use crate::secure_storage::{SecureKey, SecureStorage};
use crate::store::SharedStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub is_signed_in: bool,
}

#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub id_token: String,
}

/// The identity provider collaborator (Cognito-like). Only the boolean,
/// user-id and token results are consumed here.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns whether the provider considers the session signed in after
    /// the attempt; a completed call with `false` means bad credentials.
    async fn sign_in(&self, username: &str, password: &str) -> Result<SessionStatus, CoreError>;
    async fn sign_out(&self) -> Result<(), CoreError>;
    /// May fail while the provider is still initializing in this process.
    async fn fetch_session(&self) -> Result<SessionStatus, CoreError>;
    async fn current_user(&self) -> Result<String, CoreError>;
    async fn tokens(&self) -> Result<SessionTokens, CoreError>;
}

/// Cross-context broadcast of authentication status.
///
/// Written only by the primary-context [`AuthService`] after a sign-in/out
/// completes; read-only from every other context. Reads fall back to
/// "not authenticated" whenever the shared storage domain is unavailable.
#[derive(Clone)]
pub struct AuthMirror {
    storage: SharedStorage,
}

impl AuthMirror {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    // ===== Getters (any context) =====

    pub fn is_authenticated(&self) -> bool {
        self.storage.load().is_authenticated
    }

    pub fn user_id(&self) -> Option<String> {
        let id = self.storage.load().user_id;
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Epoch seconds of the last successful sign-in, 0 when never signed in.
    pub fn auth_timestamp(&self) -> u64 {
        self.storage.load().auth_timestamp
    }

    // ===== Setters (primary context only) =====

    pub fn set_authenticated(&self, value: bool) -> Result<(), CoreError> {
        self.storage.update(|state| state.is_authenticated = value)
    }

    pub fn set_user_id(&self, user_id: &str) -> Result<(), CoreError> {
        self.storage
            .update(|state| state.user_id = user_id.to_string())
    }

    pub fn set_auth_timestamp(&self, epoch_secs: u64) -> Result<(), CoreError> {
        self.storage
            .update(|state| state.auth_timestamp = epoch_secs)
    }

    /// One write covering the whole signed-in transition, flushed before
    /// returning.
    pub fn set_signed_in(&self, user_id: &str) -> Result<(), CoreError> {
        let now = epoch_secs();
        self.storage.update(|state| {
            state.is_authenticated = true;
            state.user_id = user_id.to_string();
            state.auth_timestamp = now;
        })
    }

    pub fn set_signed_out(&self) -> Result<(), CoreError> {
        self.storage.update(|state| {
            state.is_authenticated = false;
            state.user_id.clear();
        })
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Primary-context auth flow: drives the identity provider, persists tokens
/// for secondary contexts, and keeps the mirror in step. Explicitly
/// constructed and passed to whatever needs it; lifetime is managed by the
/// host application's startup/shutdown.
pub struct AuthService<P: IdentityProvider> {
    provider: P,
    mirror: AuthMirror,
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: P, storage: SharedStorage) -> Self {
        Self {
            provider,
            mirror: AuthMirror::new(storage),
        }
    }

    pub fn mirror(&self) -> &AuthMirror {
        &self.mirror
    }

    /// Sign in, replacing any session that is already active. On success the
    /// tokens land in secure storage and the mirror flips to authenticated;
    /// on failure the mirror is left untouched.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<String, CoreError> {
        if let Ok(session) = self.provider.fetch_session().await {
            if session.is_signed_in {
                tracing::info!("existing session found, signing out first");
                let _ = self.provider.sign_out().await;
            }
        }

        let outcome = self.provider.sign_in(username, password).await?;
        if !outcome.is_signed_in {
            return Err(CoreError::SignInFailed(
                "Login failed. Please check your credentials.".to_string(),
            ));
        }

        self.finish_sign_in().await
    }

    /// Sign out and tear the mirrored state down. The mirror may briefly show
    /// signed-out before the provider session is fully gone; it never shows
    /// the reverse.
    pub async fn sign_out(&self) -> Result<(), CoreError> {
        self.provider.sign_out().await?;

        if let Err(e) = SecureStorage::delete(SecureKey::AccessToken) {
            tracing::warn!("failed to clear access token: {}", e);
        }
        if let Err(e) = SecureStorage::delete(SecureKey::IdToken) {
            tracing::warn!("failed to clear id token: {}", e);
        }

        self.mirror.set_signed_out()?;
        tracing::info!("signed out, mirror cleared");
        Ok(())
    }

    /// Re-check the provider session and bring the mirror in step, e.g. on
    /// app startup after the provider finished configuring.
    pub async fn check_auth_status(&self) -> Result<bool, CoreError> {
        match self.provider.fetch_session().await {
            Ok(session) if session.is_signed_in => {
                self.finish_sign_in().await?;
                Ok(true)
            }
            _ => {
                self.mirror.set_signed_out()?;
                Ok(false)
            }
        }
    }

    /// Poll until the provider's session check settles, with a capped total
    /// wait. Replaces an unbounded "while loading, sleep" loop: if the
    /// awaited condition never becomes true this fails with `Timeout`.
    pub async fn wait_until_settled(&self, timeout: Duration) -> Result<SessionStatus, CoreError> {
        let started = Instant::now();
        loop {
            match self.provider.fetch_session().await {
                Ok(session) => return Ok(session),
                Err(_) if started.elapsed() < timeout => {
                    tokio::time::sleep(Duration::from_millis(SESSION_POLL_INTERVAL_MS)).await;
                }
                Err(_) => return Err(CoreError::Timeout),
            }
        }
    }

    /// Default settle wait used by host startup paths.
    pub async fn wait_until_settled_default(&self) -> Result<SessionStatus, CoreError> {
        self.wait_until_settled(Duration::from_millis(SESSION_SETTLE_TIMEOUT_MS))
            .await
    }

    /// Fetch user id and tokens for a session the provider reports as
    /// signed in, persist them, then flip the mirror. The mirror write is the
    /// last step so it can never report a sign-in that did not complete.
    async fn finish_sign_in(&self) -> Result<String, CoreError> {
        let user_id = self.provider.current_user().await?;
        let tokens = self.provider.tokens().await?;

        // Token persistence failure is logged, not fatal: the primary context
        // still holds a live session, only secondary contexts lose access.
        if let Err(e) = SecureStorage::set(SecureKey::AccessToken, &tokens.access_token) {
            tracing::warn!("failed to save access token: {}", e);
        }
        if let Err(e) = SecureStorage::set(SecureKey::IdToken, &tokens.id_token) {
            tracing::warn!("failed to save id token: {}", e);
        }

        self.mirror.set_signed_in(&user_id)?;
        tracing::info!("user authenticated: {}", user_id);
        Ok(user_id)
    }
}
