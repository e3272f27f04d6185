use crate::secure_storage::SecureStorageError;

/// Error taxonomy for the sync core.
///
/// Boundary failures (SDK, storage, network) are converted into one of these
/// at the call site and returned to the caller; nothing here retries
/// automatically. A malformed push payload is the one exception - it is
/// recovered locally with a placeholder item and never surfaces.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No credentials available. Please sign in to the main app first.")]
    CredentialsMissing,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response from server")]
    InvalidResponse,

    #[error("Cached account no longer matches the signed-in session")]
    AuthSessionStale,

    #[error("Shared storage unavailable")]
    StorageUnavailable,

    #[error("Malformed push payload")]
    PayloadMalformed,

    #[error("Operation timed out")]
    Timeout,

    #[error("Sign-in failed: {0}")]
    SignInFailed(String),

    #[error("{0}")]
    Host(String),
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CoreError::Timeout
        } else if err.is_decode() {
            CoreError::InvalidResponse
        } else {
            CoreError::NetworkError(err.to_string())
        }
    }
}

impl From<SecureStorageError> for CoreError {
    fn from(err: SecureStorageError) -> Self {
        match err {
            SecureStorageError::KeyNotFound(_) => CoreError::CredentialsMissing,
            SecureStorageError::Keyring(_) => CoreError::StorageUnavailable,
        }
    }
}
