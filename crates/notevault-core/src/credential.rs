//! One-time vault setup and per-login password verification.

use std::sync::Arc;

use chrono::Utc;

use crate::crypto::{
    compute_verifier, derive_key, generate_salt, validate_password, verifier_matches, KdfParams,
    SessionKey,
};
use crate::error::{AuthError, Result, StorageError};
use crate::storage::{MasterCredential, RecordStore};

/// Owns the setup and login protocol for the vault's master credential.
///
/// Produces session keys but never holds on to them.
pub struct CredentialVault {
    store: Arc<dyn RecordStore>,
}

impl CredentialVault {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Whether the credential slot is still empty.
    pub fn is_setup_required(&self) -> Result<bool> {
        Ok(self.store.get_credential()?.is_none())
    }

    /// Create the master credential and derive the first session key.
    ///
    /// # Errors
    ///
    /// - `AuthError::WeakPassword` if the password fails the policy
    /// - `AuthError::SetupAlreadyCompleted` if a credential already exists
    /// - `CryptoError` if salt generation or key derivation fails
    pub fn setup(&self, password: &str) -> Result<(MasterCredential, SessionKey)> {
        let failed = validate_password(password);
        if !failed.is_empty() {
            return Err(AuthError::WeakPassword(failed).into());
        }

        if self.store.get_credential()?.is_some() {
            return Err(AuthError::SetupAlreadyCompleted.into());
        }

        let params = self.kdf_params()?;
        let salt = generate_salt()?;
        let credential = MasterCredential {
            salt,
            verifier_hash: compute_verifier(password, &salt),
            created_at: Utc::now(),
        };
        let key = derive_key(password, &salt, params)?;

        self.store
            .put_credential_once(&credential)
            .map_err(|err| match err {
                StorageError::AlreadyExists(_) => AuthError::SetupAlreadyCompleted.into(),
                other => crate::VaultError::from(other),
            })?;

        tracing::info!("master credential created");
        Ok((credential, key))
    }

    /// Check a password against the stored credential and derive the key.
    ///
    /// A missing credential and a wrong password fail the same way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredential` on any mismatch.
    pub fn verify(&self, password: &str) -> Result<SessionKey> {
        let credential = match self.store.get_credential()? {
            Some(credential) => credential,
            None => {
                tracing::info!("login rejected");
                return Err(AuthError::InvalidCredential.into());
            }
        };

        let computed = compute_verifier(password, &credential.salt);
        if !verifier_matches(&computed, &credential.verifier_hash) {
            tracing::info!("login rejected");
            return Err(AuthError::InvalidCredential.into());
        }

        let params = self.kdf_params()?;
        Ok(derive_key(password, &credential.salt, params)?)
    }

    fn kdf_params(&self) -> Result<KdfParams> {
        let metadata = self.store.metadata()?;
        Ok(KdfParams::for_schema(metadata.schema_version)?)
    }
}
