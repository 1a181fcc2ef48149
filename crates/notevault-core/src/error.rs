//! Error types for NoteVault core operations.
//!
//! Errors are grouped by the layer that raises them. Each family is a
//! separate enum so callers can match on the precise failure, and
//! `VaultError` wraps all of them for the facade.

use thiserror::Error;
use uuid::Uuid;

use crate::crypto::PasswordRule;

/// Result type alias for NoteVault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Failures of key derivation and authenticated encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The password-based key derivation could not produce a key
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// The AEAD cipher refused to encrypt
    #[error("Encryption failed")]
    EncryptionFailed,

    /// Tag verification failed: wrong key, corrupted bytes or tampering
    #[error("Decryption failed (invalid key or corrupted data)")]
    DecryptionFailed,

    /// The vault was written with KDF parameters this build does not know
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(u32),
}

/// Failures of the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store has not been created or lacks its metadata
    #[error("Storage not initialized")]
    NotInitialized,

    /// Underlying SQLite or filesystem failure
    #[error("Storage I/O failure: {0}")]
    IoFailure(String),

    /// No record with the given id
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    /// A write-once slot is already populated
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A persisted row could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Failures of the authentication and session layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No live session key
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Wrong password, or no vault to log into (deliberately indistinguishable)
    #[error("Invalid credential")]
    InvalidCredential,

    /// Setup was requested on a vault that already has a credential
    #[error("Setup already completed")]
    SetupAlreadyCompleted,

    /// The session deadline passed before it could be extended
    #[error("Session expired")]
    SessionExpired,

    /// The password does not meet the setup policy
    #[error("Weak password: {}", describe_rules(.0))]
    WeakPassword(Vec<PasswordRule>),
}

fn describe_rules(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(|rule| rule.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Core error type for NoteVault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Key derivation or encryption error
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Storage backend error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Authentication or session error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Malformed input (e.g. an export payload that does not decode)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl VaultError {
    /// Whether this error means "log in first".
    pub fn is_not_authenticated(&self) -> bool {
        matches!(
            self,
            VaultError::Auth(AuthError::NotAuthenticated | AuthError::SessionExpired)
        )
    }

    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::Storage(StorageError::RecordNotFound(_)))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::IoFailure(format!("SQLite error: {}", err))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoFailure(err.to_string())
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        VaultError::Storage(err.into())
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Storage(err.into())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Validation(err.to_string())
    }
}
