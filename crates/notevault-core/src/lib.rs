//! # NoteVault Core
//!
//! Core library for NoteVault - a local, password-protected vault of
//! encrypted notes.
//!
//! This crate provides key derivation, field-level authenticated encryption,
//! session lifecycle and durable storage independent of any presentation
//! layer.
//!
//! ## Architecture
//!
//! - **crypto**: Key derivation, the opaque `SessionKey`, AES-256-GCM field cipher
//! - **credential**: One-time setup and per-login password verification
//! - **storage**: `RecordStore` trait and the SQLite implementation
//! - **session**: Session state machine with sliding expiry
//! - **notes**: Plaintext create/read/update/delete/list/search over encrypted records
//! - **vault**: Facade exposed to the presentation layer
//!
//! Plaintext only exists above `notes`; everything below it handles
//! ciphertext, nonces and key handles.

pub mod credential;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod notes;
pub mod session;
pub mod storage;
pub mod vault;

pub use credential::CredentialVault;
pub use crypto::{PasswordRule, SessionKey};
pub use error::{AuthError, CryptoError, Result, StorageError, VaultError};
pub use notes::{NotePatch, NoteService, PlaintextRecord};
pub use session::{
    spawn_expiry_ticker, Clock, ManualClock, SessionController, SessionEvent, SessionState,
    SystemClock,
};
pub use storage::{
    EncryptedRecord, MasterCredential, RecordStore, SqliteRecordStore, StorageMetadata,
    VaultExport,
};
pub use vault::{Vault, VaultConfig};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
