//! Key derivation and the opaque session key handle.
//!
//! The session key is derived from the master password with PBKDF2-HMAC-SHA256.
//! A separate SHA-256 verifier (password || salt) is stored so a login can be
//! checked without storing the password or the key.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Schema version written by this build. Gates the KDF parameters.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Length of the per-vault salt in bytes.
pub const SALT_LENGTH: usize = 16;

/// Length of the derived key in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// Length of the SHA-256 password verifier in bytes.
pub const VERIFIER_LENGTH: usize = 32;

/// PBKDF2 rounds for schema version 1.
const PBKDF2_ITERATIONS_V1: u32 = 100_000;

/// Key derivation parameters.
///
/// Parameters are never stored per record; they follow from the vault's
/// schema version so that a future change is an explicit migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// PBKDF2-HMAC-SHA256 iteration count
    pub iterations: u32,
}

impl KdfParams {
    /// Parameters for the given schema version.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::UnsupportedSchema` for versions this build
    /// does not know.
    pub fn for_schema(version: u32) -> Result<Self, CryptoError> {
        match version {
            1 => Ok(Self {
                iterations: PBKDF2_ITERATIONS_V1,
            }),
            other => Err(CryptoError::UnsupportedSchema(other)),
        }
    }

    /// Parameters for `CURRENT_SCHEMA_VERSION`.
    pub fn current() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS_V1,
        }
    }
}

/// Symmetric key for one authenticated session.
///
/// The raw bytes are only reachable inside this crate. The type is neither
/// `Clone` nor `Serialize`, its `Debug` output is redacted, and the bytes are
/// zeroized when the handle is dropped.
pub struct SessionKey {
    key: SecretBox<[u8; KEY_LENGTH]>,
}

impl SessionKey {
    /// Borrow the raw key bytes for an immediate cipher operation.
    pub(crate) fn expose(&self) -> &[u8; KEY_LENGTH] {
        self.key.expose_secret()
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self {
            key: SecretBox::new(Box::new(bytes)),
        }
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random salt from the OS RNG.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::KeyDerivationFailed(format!("Salt generation failed: {}", e)))?;
    Ok(salt)
}

/// Derive a session key from a password with PBKDF2-HMAC-SHA256.
///
/// Deliberately slow. Same password + salt + params always yields the same key.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivationFailed` for an empty password, a salt
/// shorter than `SALT_LENGTH` or a zero iteration count.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<SessionKey, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::KeyDerivationFailed(
            "Password cannot be empty".to_string(),
        ));
    }
    if salt.len() < SALT_LENGTH {
        return Err(CryptoError::KeyDerivationFailed(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivationFailed(
            "Iteration count must be positive".to_string(),
        ));
    }

    tracing::debug!(iterations = params.iterations, "deriving session key");
    let key = SecretBox::<[u8; KEY_LENGTH]>::init_with_mut(|buf| {
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, buf);
    });
    Ok(SessionKey { key })
}

/// SHA-256 over the password bytes followed by the salt.
pub fn compute_verifier(password: &str, salt: &[u8]) -> [u8; VERIFIER_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    hasher.finalize().into()
}

/// Compare a freshly computed verifier against the stored one.
pub fn verifier_matches(computed: &[u8; VERIFIER_LENGTH], stored: &[u8; VERIFIER_LENGTH]) -> bool {
    constant_time_eq(computed, stored)
}

fn constant_time_eq(a: &[u8; VERIFIER_LENGTH], b: &[u8; VERIFIER_LENGTH]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &[u8; 16] = b"0123456789abcdef";

    fn fast() -> KdfParams {
        KdfParams { iterations: 1_000 }
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let key1 = derive_key("test-password", SALT, fast()).unwrap();
        let key2 = derive_key("test-password", SALT, fast()).unwrap();
        assert_eq!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("test-password", b"salt-one-16bytes", fast()).unwrap();
        let key2 = derive_key("test-password", b"salt-two-16bytes", fast()).unwrap();
        assert_ne!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_different_password_different_key() {
        let key1 = derive_key("password-one", SALT, fast()).unwrap();
        let key2 = derive_key("password-two", SALT, fast()).unwrap();
        assert_ne!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_iterations_change_key() {
        let key1 = derive_key("test-password", SALT, KdfParams { iterations: 1_000 }).unwrap();
        let key2 = derive_key("test-password", SALT, KdfParams { iterations: 1_001 }).unwrap();
        assert_ne!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = derive_key("", SALT, fast());
        assert!(matches!(result, Err(CryptoError::KeyDerivationFailed(_))));
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = derive_key("test-password", b"short", fast());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Salt must be at least 16 bytes"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = derive_key("test-password", SALT, KdfParams { iterations: 0 });
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_versions() {
        assert_eq!(
            KdfParams::for_schema(CURRENT_SCHEMA_VERSION).unwrap(),
            KdfParams::current()
        );
        assert!(KdfParams::current().iterations >= 100_000);
        assert!(matches!(
            KdfParams::for_schema(2),
            Err(CryptoError::UnsupportedSchema(2))
        ));
    }

    #[test]
    fn test_matches_pbkdf2_hmac_sha256() {
        let key = derive_key("passwd", b"saltSALTsaltSALT", KdfParams { iterations: 2 }).unwrap();
        let mut expected = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(b"passwd", b"saltSALTsaltSALT", 2, &mut expected);
        assert_eq!(hex::encode(key.expose()), hex::encode(expected));
    }

    #[test]
    fn test_salt_is_random() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verifier_is_sha256_of_password_then_salt() {
        let verifier = compute_verifier("abc", b"");
        assert_eq!(
            hex::encode(verifier),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(compute_verifier("ab", b"c"), verifier);
    }

    #[test]
    fn test_verifier_matches() {
        let stored = compute_verifier("Str0ng!Pass", SALT);
        assert!(verifier_matches(&compute_verifier("Str0ng!Pass", SALT), &stored));
        assert!(!verifier_matches(&compute_verifier("WrongPass", SALT), &stored));
    }

    #[test]
    fn test_session_key_debug_redacts() {
        let key = SessionKey::from_bytes([0xAB; KEY_LENGTH]);
        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.to_lowercase().contains("ab, ab"));
        assert!(!debug_output.contains("171"));
    }
}
