//! The `Vault` facade used by presentation layers.
//!
//! Wires one `RecordStore`, one `SessionController`, the `CredentialVault`
//! and the `NoteService` together. Plaintext only crosses this boundary for
//! an authenticated caller.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::credential::CredentialVault;
use crate::crypto::KdfParams;
use crate::error::{Result, VaultError};
use crate::notes::{decrypt_record, NotePatch, NoteService, PlaintextRecord};
use crate::session::{
    Clock, SessionController, SessionState, SystemClock, DEFAULT_SESSION_TIMEOUT_MINUTES,
    MAX_SESSION_TIMEOUT_MINUTES,
};
use crate::storage::types::EXPORT_FORMAT;
use crate::storage::{RecordStore, SqliteRecordStore, StorageMetadata, VaultExport};

/// Runtime settings for a vault instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultConfig {
    /// Sliding session window
    pub session_timeout: Duration,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::minutes(DEFAULT_SESSION_TIMEOUT_MINUTES),
        }
    }
}

impl VaultConfig {
    /// A session window of `minutes`, clamped to
    /// `1..=MAX_SESSION_TIMEOUT_MINUTES`.
    pub fn with_timeout_minutes(minutes: i64) -> Self {
        Self {
            session_timeout: Duration::minutes(minutes.clamp(1, MAX_SESSION_TIMEOUT_MINUTES)),
        }
    }
}

/// A password-protected vault of encrypted notes.
pub struct Vault {
    store: Arc<dyn RecordStore>,
    credentials: CredentialVault,
    session: Arc<SessionController>,
    notes: NoteService,
}

impl Vault {
    /// Build a vault over any store, on the wall clock.
    pub fn new(store: Arc<dyn RecordStore>, config: VaultConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Build a vault with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        config: VaultConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = Arc::new(SessionController::new(clock, config.session_timeout));
        Self {
            credentials: CredentialVault::new(store.clone()),
            notes: NoteService::new(store.clone(), session.clone()),
            session,
            store,
        }
    }

    /// Open (or create) a vault file.
    pub fn open(path: &Path, config: VaultConfig) -> Result<Self> {
        let store = SqliteRecordStore::open(path)?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// Open a vault file that must already exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotInitialized` if there is no vault at `path`.
    pub fn open_existing(path: &Path, config: VaultConfig) -> Result<Self> {
        let store = SqliteRecordStore::open_existing(path)?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// A throwaway vault held in memory.
    pub fn in_memory(config: VaultConfig) -> Result<Self> {
        let store = SqliteRecordStore::open_in_memory()?;
        Ok(Self::new(Arc::new(store), config))
    }

    // --- Authentication ---

    pub fn is_setup_required(&self) -> Result<bool> {
        self.credentials.is_setup_required()
    }

    /// Create the master credential and start a session.
    pub fn setup(&self, password: &str) -> Result<()> {
        let (_, key) = self.credentials.setup(password)?;
        self.session.install(key);
        Ok(())
    }

    /// Verify the password and start a session.
    ///
    /// Any current session is ended first, so a failed login always leaves
    /// the vault locked.
    pub fn login(&self, password: &str) -> Result<()> {
        self.session.logout();
        let key = self.credentials.verify(password)?;
        self.session.install(key);
        Ok(())
    }

    /// End the session. Safe to call at any time.
    pub fn logout(&self) {
        self.session.logout();
    }

    /// Re-arm the session deadline.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the deadline already passed.
    pub fn extend_session(&self) -> Result<()> {
        Ok(self.session.extend()?)
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Shared handle to the session controller, for subscriptions and tickers.
    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    // --- Notes ---

    pub fn create_note(&self, title: &str, body: &str) -> Result<PlaintextRecord> {
        self.notes.create(title, body)
    }

    pub fn update_note(&self, id: &Uuid, patch: &NotePatch) -> Result<PlaintextRecord> {
        self.notes.update(id, patch)
    }

    pub fn delete_note(&self, id: &Uuid) -> Result<()> {
        self.notes.delete(id)
    }

    pub fn get_note(&self, id: &Uuid) -> Result<PlaintextRecord> {
        self.notes.get(id)
    }

    pub fn list_notes(&self) -> Result<Vec<PlaintextRecord>> {
        self.notes.list()
    }

    pub fn list_notes_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PlaintextRecord>> {
        self.notes.list_between(since, until)
    }

    pub fn search_notes(&self, query: &str) -> Result<Vec<PlaintextRecord>> {
        self.notes.search(query)
    }

    // --- Maintenance ---

    /// Advisory storage metadata. Needs no session; carries no plaintext.
    pub fn metadata(&self) -> Result<StorageMetadata> {
        Ok(self.store.metadata()?)
    }

    pub fn check_integrity(&self) -> Result<()> {
        Ok(self.store.check_integrity()?)
    }

    /// Snapshot every record, still encrypted.
    pub fn export_vault(&self) -> Result<VaultExport> {
        self.session.ensure_authenticated()?;
        let (records, metadata) = self.store.export_all()?;
        tracing::info!(records = records.len(), "vault exported");
        Ok(VaultExport::new(records, metadata))
    }

    /// Import an export bundle, all or nothing.
    ///
    /// Every record must decrypt under the current session key; otherwise
    /// nothing is written.
    ///
    /// # Returns
    ///
    /// The number of records imported.
    ///
    /// # Errors
    ///
    /// - `VaultError::Validation` for a foreign format or a record that does
    ///   not belong to this vault
    /// - `CryptoError::UnsupportedSchema` for an unknown schema version
    pub fn import_vault(&self, bundle: &VaultExport) -> Result<usize> {
        if bundle.format != EXPORT_FORMAT {
            return Err(VaultError::Validation(format!(
                "Unsupported export format '{}'",
                bundle.format
            )));
        }
        KdfParams::for_schema(bundle.metadata.schema_version)?;

        self.session.with_key(|key| {
            for record in &bundle.records {
                decrypt_record(record, key).map_err(|_| {
                    VaultError::Validation(format!(
                        "Record {} cannot be decrypted with this vault's key",
                        record.id
                    ))
                })?;
            }
            Ok(())
        })?;

        let imported = self
            .store
            .bulk_import(&bundle.records, Some(&bundle.metadata))?;
        if let Err(err) = self.session.extend() {
            tracing::debug!(error = %err, "session not extended after import");
        }
        Ok(imported)
    }

    /// Export to a JSON file, written atomically.
    pub fn export_to_file(&self, path: &Path) -> Result<usize> {
        let bundle = self.export_vault()?;
        let json = serde_json::to_vec_pretty(&bundle)?;
        crate::fs::write_atomic(path, &json)?;
        Ok(bundle.records.len())
    }

    /// Import from a JSON file produced by `export_to_file`.
    pub fn import_from_file(&self, path: &Path) -> Result<usize> {
        let bytes = std::fs::read(path)?;
        let bundle: VaultExport = serde_json::from_slice(&bytes)?;
        self.import_vault(&bundle)
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("session", &self.session.state())
            .finish_non_exhaustive()
    }
}
