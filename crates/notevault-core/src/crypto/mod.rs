//! Cryptographic operations for NoteVault.
//!
//! This module provides key derivation and field encryption using
//! well-audited RustCrypto libraries:
//! - **PBKDF2-HMAC-SHA256**: password-based key derivation
//! - **SHA-256**: password verifier
//! - **AES-256-GCM**: authenticated encryption of individual fields
//!
//! ## Security Model
//!
//! - One random salt per vault, stored with the credential
//! - The derived key lives only inside an opaque `SessionKey`
//! - Every encryption draws a fresh random 96-bit nonce
//! - Key material is zeroized when the handle is dropped
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the vault file
//! - Offline tampering with stored ciphertext
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an authenticated session / process memory

pub mod cipher;
pub mod key;
pub mod password;

pub use cipher::{decrypt_field, encrypt_field, EncryptedField, NONCE_LENGTH};
pub use key::{
    compute_verifier, derive_key, generate_salt, verifier_matches, KdfParams, SessionKey,
    CURRENT_SCHEMA_VERSION, KEY_LENGTH, SALT_LENGTH, VERIFIER_LENGTH,
};
pub use password::{validate_password, PasswordRule, MIN_PASSWORD_LENGTH};
