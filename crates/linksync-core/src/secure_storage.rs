/// Secure storage for session tokens shared with secondary contexts
///
/// Uses OS-backed secure storage:
/// - macOS/iOS: Keychain (a shared access group lets the share extension read
///   tokens the main app wrote)
/// - Linux: keyutils / Secret Service
/// - Windows: Credential Manager
use keyring::Entry;
use std::fmt;

const SERVICE_NAME: &str = "com.linksync.client";

/// Unit tests run against a separate keyring service so they never read or
/// clobber a developer's real tokens.
fn service_name() -> &'static str {
    if cfg!(test) {
        "com.linksync.client.test"
    } else {
        SERVICE_NAME
    }
}

/// Serializes tests that touch the keyring; the entries are shared mutable
/// state outside the process.
#[cfg(test)]
pub(crate) fn keyring_test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureKey {
    AccessToken,
    IdToken,
}

impl SecureKey {
    fn key_name(&self) -> &'static str {
        match self {
            SecureKey::AccessToken => "access_token",
            SecureKey::IdToken => "id_token",
        }
    }
}

impl fmt::Display for SecureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SecureStorageError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(SecureKey),
}

pub struct SecureStorage;

impl SecureStorage {
    /// Store a token in secure storage
    pub fn set(key: SecureKey, value: &str) -> Result<(), SecureStorageError> {
        let entry = Entry::new(service_name(), key.key_name())?;
        entry.set_password(value)?;
        Ok(())
    }

    /// Retrieve a token from secure storage
    pub fn get(key: SecureKey) -> Result<String, SecureStorageError> {
        let entry = Entry::new(service_name(), key.key_name())?;
        match entry.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(SecureStorageError::KeyNotFound(key)),
            Err(e) => Err(SecureStorageError::Keyring(e)),
        }
    }

    /// Delete a token from secure storage
    pub fn delete(key: SecureKey) -> Result<(), SecureStorageError> {
        let entry = Entry::new(service_name(), key.key_name())?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted is success
            Err(e) => Err(SecureStorageError::Keyring(e)),
        }
    }

    /// Check if a token exists in secure storage
    pub fn exists(key: SecureKey) -> bool {
        Self::get(key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tests_use_isolated_service() {
        assert_ne!(service_name(), SERVICE_NAME);
    }

    #[test]
    fn test_token_roundtrip() {
        let _guard = keyring_test_guard();
        let test_key = SecureKey::AccessToken;
        let test_value = "eyJ0ZXN0IjoidG9rZW4ifQ";

        // Clean up any existing value
        let _ = SecureStorage::delete(test_key);

        assert!(!SecureStorage::exists(test_key));

        SecureStorage::set(test_key, test_value).expect("Failed to set value");
        assert!(SecureStorage::exists(test_key));

        let retrieved = SecureStorage::get(test_key).expect("Failed to get value");
        assert_eq!(retrieved, test_value);

        SecureStorage::delete(test_key).expect("Failed to delete value");
        assert!(!SecureStorage::exists(test_key));
    }

    #[test]
    fn test_get_missing_token() {
        let _guard = keyring_test_guard();
        let test_key = SecureKey::IdToken;

        let _ = SecureStorage::delete(test_key);

        match SecureStorage::get(test_key) {
            Err(SecureStorageError::KeyNotFound(key)) => {
                assert_eq!(key, test_key);
            }
            _ => panic!("Expected KeyNotFound error"),
        }
    }
}
