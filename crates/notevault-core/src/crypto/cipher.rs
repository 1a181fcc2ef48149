//! AES-256-GCM encryption of individual note fields.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::key::SessionKey;
use crate::error::CryptoError;

/// Length of the AES-GCM nonce in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// Length of the authentication tag appended to every ciphertext.
pub const TAG_LENGTH: usize = 16;

/// One encrypted field: ciphertext (tag appended) plus the nonce used for it.
///
/// The nonce is kept as raw bytes so a damaged row still loads; its length
/// is checked when the field is decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    #[serde(with = "crate::storage::types::base64_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "crate::storage::types::base64_bytes")]
    pub nonce: Vec<u8>,
}

fn cipher_for(key: &SessionKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose()))
}

/// Encrypt a UTF-8 string under the session key with a fresh random nonce.
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if the RNG or the cipher fails.
pub fn encrypt_field(plaintext: &str, key: &SessionKey) -> Result<EncryptedField, CryptoError> {
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let ciphertext = cipher_for(key)
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(EncryptedField {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Decrypt and authenticate a field back into a string.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` on a wrong key, tampered bytes, a
/// nonce of the wrong length or plaintext that is not valid UTF-8. The
/// variants are not distinguished.
pub fn decrypt_field(field: &EncryptedField, key: &SessionKey) -> Result<String, CryptoError> {
    if field.nonce.len() != NONCE_LENGTH || field.ciphertext.len() < TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed);
    }

    let plaintext = cipher_for(key)
        .decrypt(Nonce::from_slice(&field.nonce), field.ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|err| {
        err.into_bytes().zeroize();
        CryptoError::DecryptionFailed
    })
}
