//! Credential Storage
//!
//! Secret storage for the encoded token record, backed by the OS keychain.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::error::StorageError;
use crate::types::KeyringConfig;

/// Credential store interface.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored record. [`StorageError::NotFound`] means first run.
    async fn load(&self) -> Result<String, StorageError>;

    /// Write the record, replacing any previous one.
    async fn save(&self, blob: &str) -> Result<(), StorageError>;
}

/// OS keychain store (macOS Keychain, Windows Credential Manager, Linux Secret
/// Service with a keyutils cache). Records persist across reboots.
#[derive(Clone, Debug)]
pub struct KeyringCredentialStore {
    config: KeyringConfig,
}

impl KeyringCredentialStore {
    /// Create store for the given service/key.
    pub fn new(config: KeyringConfig) -> Self {
        Self { config }
    }

    fn entry(config: &KeyringConfig) -> keyring::Result<keyring::Entry> {
        keyring::Entry::new(&config.service, &config.key)
    }

    fn not_found(&self) -> StorageError {
        StorageError::NotFound {
            service: self.config.service.clone(),
            key: self.config.key.clone(),
        }
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn load(&self) -> Result<String, StorageError> {
        let config = self.config.clone();
        let result = tokio::task::spawn_blocking(move || Self::entry(&config)?.get_password())
            .await
            .map_err(|e| StorageError::ReadFailed {
                message: e.to_string(),
            })?;

        match result {
            Ok(blob) => Ok(blob),
            Err(keyring::Error::NoEntry) => Err(self.not_found()),
            Err(e) => Err(StorageError::ReadFailed {
                message: e.to_string(),
            }),
        }
    }

    async fn save(&self, blob: &str) -> Result<(), StorageError> {
        let config = self.config.clone();
        let blob = blob.to_string();
        tokio::task::spawn_blocking(move || Self::entry(&config)?.set_password(&blob))
            .await
            .map_err(|e| StorageError::WriteFailed {
                message: e.to_string(),
            })?
            .map_err(|e| StorageError::WriteFailed {
                message: e.to_string(),
            })?;

        tracing::debug!(service = %self.config.service, "stored credentials in keychain");
        Ok(())
    }
}

/// In-memory credential store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    blob: Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    /// Create empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding a record.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    /// Current record, if any.
    pub fn current(&self) -> Option<String> {
        lock(&self.blob).clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<String, StorageError> {
        lock(&self.blob).clone().ok_or_else(|| StorageError::NotFound {
            service: "memory".to_string(),
            key: "tokens".to_string(),
        })
    }

    async fn save(&self, blob: &str) -> Result<(), StorageError> {
        *lock(&self.blob) = Some(blob.to_string());
        Ok(())
    }
}

/// Mock credential store for testing.
#[derive(Default)]
pub struct MockCredentialStore {
    inner: InMemoryCredentialStore,
    save_history: Mutex<Vec<String>>,
    load_count: Mutex<usize>,
    should_fail: Mutex<bool>,
}

impl MockCredentialStore {
    /// Create new mock credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the record.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            inner: InMemoryCredentialStore::with_blob(blob),
            ..Self::default()
        }
    }

    /// Set store to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *lock(&self.should_fail) = should_fail;
        self
    }

    /// Get save history.
    pub fn get_save_history(&self) -> Vec<String> {
        lock(&self.save_history).clone()
    }

    /// Number of load calls.
    pub fn get_load_count(&self) -> usize {
        *lock(&self.load_count)
    }

    /// Current record, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.current()
    }

    fn check_error(&self) -> Result<(), StorageError> {
        if *lock(&self.should_fail) {
            return Err(StorageError::ReadFailed {
                message: "Mock storage failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load(&self) -> Result<String, StorageError> {
        *lock(&self.load_count) += 1;
        self.check_error()?;
        self.inner.load().await
    }

    async fn save(&self, blob: &str) -> Result<(), StorageError> {
        self.check_error().map_err(|_| StorageError::WriteFailed {
            message: "Mock storage failure".to_string(),
        })?;

        lock(&self.save_history).push(blob.to_string());
        self.inner.save(blob).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
