//! Plaintext note operations over encrypted storage.
//!
//! `NoteService` is the only place where plaintext and ciphertext meet.
//! Every operation requires a live session; mutations slide the session
//! deadline forward.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::crypto::{decrypt_field, encrypt_field, SessionKey};
use crate::error::{CryptoError, Result, StorageError};
use crate::session::SessionController;
use crate::storage::{EncryptedRecord, RecordStore};

/// A decrypted note. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaintextRecord {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaintextRecord {
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.body.to_lowercase().contains(needle)
    }
}

/// Fields to change on update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NotePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// Decrypt both fields of a stored record.
pub(crate) fn decrypt_record(
    record: &EncryptedRecord,
    key: &SessionKey,
) -> std::result::Result<PlaintextRecord, CryptoError> {
    Ok(PlaintextRecord {
        id: record.id,
        title: decrypt_field(&record.title, key)?,
        body: decrypt_field(&record.body, key)?,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Create, read, update, delete, list and search notes.
pub struct NoteService {
    store: Arc<dyn RecordStore>,
    session: Arc<SessionController>,
}

impl NoteService {
    pub fn new(store: Arc<dyn RecordStore>, session: Arc<SessionController>) -> Self {
        Self { store, session }
    }

    /// Encrypt and store a new note.
    ///
    /// Both fields are encrypted, each with its own nonce, before anything
    /// is written.
    pub fn create(&self, title: &str, body: &str) -> Result<PlaintextRecord> {
        let now = self.session.now();
        let record = self.session.with_key(|key| {
            let record = EncryptedRecord {
                id: Uuid::new_v4(),
                title: encrypt_field(title, key)?,
                body: encrypt_field(body, key)?,
                created_at: now,
                updated_at: now,
            };
            self.store.put(&record)?;
            Ok(record)
        })?;
        self.touch();

        tracing::debug!(id = %record.id, "note created");
        Ok(PlaintextRecord {
            id: record.id,
            title: title.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch and decrypt one note.
    ///
    /// # Errors
    ///
    /// `StorageError::RecordNotFound` if absent, `CryptoError::DecryptionFailed`
    /// if the stored fields do not authenticate.
    pub fn get(&self, id: &Uuid) -> Result<PlaintextRecord> {
        self.session.with_key(|key| {
            let record = self.load(id)?;
            Ok(decrypt_record(&record, key)?)
        })
    }

    /// Apply a partial update.
    ///
    /// Only changed fields are re-encrypted, each with a fresh nonce, and
    /// only unchanged fields are decrypted. Replacing both fields therefore
    /// rewrites a record whose old ciphertext no longer authenticates.
    /// `created_at` is kept and `updated_at` is bumped even for an empty patch.
    pub fn update(&self, id: &Uuid, patch: &NotePatch) -> Result<PlaintextRecord> {
        let now = self.session.now();
        let updated = self.session.with_key(|key| {
            let existing = self.load(id)?;

            let (title, title_field) = match &patch.title {
                Some(title) => (title.clone(), encrypt_field(title, key)?),
                None => (decrypt_field(&existing.title, key)?, existing.title.clone()),
            };
            let (body, body_field) = match &patch.body {
                Some(body) => (body.clone(), encrypt_field(body, key)?),
                None => (decrypt_field(&existing.body, key)?, existing.body.clone()),
            };
            let record = EncryptedRecord {
                id: existing.id,
                title: title_field,
                body: body_field,
                created_at: existing.created_at,
                updated_at: now,
            };
            self.store.put(&record)?;

            Ok(PlaintextRecord {
                id: record.id,
                title,
                body,
                created_at: record.created_at,
                updated_at: now,
            })
        })?;
        self.touch();

        tracing::debug!(id = %id, "note updated");
        Ok(updated)
    }

    /// Remove a note.
    pub fn delete(&self, id: &Uuid) -> Result<()> {
        self.session
            .with_key(|_| Ok(self.store.delete(id)?))?;
        self.touch();
        tracing::debug!(id = %id, "note deleted");
        Ok(())
    }

    /// All notes, oldest first.
    ///
    /// A record that fails to decrypt is logged and left out; the rest are
    /// still returned.
    pub fn list(&self) -> Result<Vec<PlaintextRecord>> {
        self.session.with_key(|key| {
            let records = self.store.list_all_ordered_by_creation()?;
            let mut notes = Vec::with_capacity(records.len());
            for record in &records {
                match decrypt_record(record, key) {
                    Ok(note) => notes.push(note),
                    Err(err) => {
                        tracing::warn!(id = %record.id, error = %err, "skipping record that failed to decrypt");
                    }
                }
            }
            Ok(notes)
        })
    }

    /// Notes created within `[since, until]`.
    pub fn list_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PlaintextRecord>> {
        let notes = self.list()?;
        Ok(notes
            .into_iter()
            .filter(|note| note.created_at >= since && note.created_at <= until)
            .collect())
    }

    /// Case-insensitive substring match over title and body.
    ///
    /// A blank query returns every note.
    pub fn search(&self, query: &str) -> Result<Vec<PlaintextRecord>> {
        let notes = self.list()?;
        if query.trim().is_empty() {
            return Ok(notes);
        }
        let needle = query.to_lowercase();
        Ok(notes.into_iter().filter(|note| note.matches(&needle)).collect())
    }

    fn load(&self, id: &Uuid) -> Result<EncryptedRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| StorageError::RecordNotFound(*id).into())
    }

    fn touch(&self) {
        if let Err(err) = self.session.extend() {
            tracing::debug!(error = %err, "session not extended after write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{SessionKey, KEY_LENGTH};
    use crate::error::{AuthError, VaultError};
    use crate::session::ManualClock;
    use crate::storage::SqliteRecordStore;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        clock: Arc<ManualClock>,
        session: Arc<SessionController>,
        store: Arc<SqliteRecordStore>,
        notes: NoteService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
        ));
        let session = Arc::new(SessionController::new(clock.clone(), Duration::minutes(30)));
        session.install(SessionKey::from_bytes([5; KEY_LENGTH]));
        let store = Arc::new(SqliteRecordStore::open_in_memory().unwrap());
        let notes = NoteService::new(store.clone(), session.clone());
        Fixture {
            clock,
            session,
            store,
            notes,
        }
    }

    #[test]
    fn test_create_and_get() {
        let fx = fixture();
        let created = fx.notes.create("Groceries", "Milk, eggs").unwrap();

        let loaded = fx.notes.get(&created.id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[test]
    fn test_create_stores_only_ciphertext() {
        let fx = fixture();
        let created = fx.notes.create("Groceries", "Milk, eggs").unwrap();

        let stored = fx.store.get(&created.id).unwrap().unwrap();
        assert!(!String::from_utf8_lossy(&stored.title.ciphertext).contains("Groceries"));
        assert_ne!(stored.title.nonce, stored.body.nonce);
    }

    #[test]
    fn test_operations_require_session() {
        let fx = fixture();
        let created = fx.notes.create("a", "b").unwrap();
        fx.session.logout();

        let not_auth = |r: Result<()>| {
            matches!(r, Err(VaultError::Auth(AuthError::NotAuthenticated)))
        };
        assert!(not_auth(fx.notes.create("x", "y").map(|_| ())));
        assert!(not_auth(fx.notes.get(&created.id).map(|_| ())));
        assert!(not_auth(fx.notes.update(&created.id, &NotePatch::new()).map(|_| ())));
        assert!(not_auth(fx.notes.delete(&created.id)));
        assert!(not_auth(fx.notes.list().map(|_| ())));
        assert!(not_auth(fx.notes.search("a").map(|_| ())));
    }

    #[test]
    fn test_missing_record_is_not_found_only_when_authenticated() {
        let fx = fixture();
        let missing = Uuid::new_v4();
        assert!(fx.notes.get(&missing).unwrap_err().is_not_found());
        assert!(fx.notes.delete(&missing).unwrap_err().is_not_found());
        assert!(fx
            .notes
            .update(&missing, &NotePatch::new().title("t"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_update_reencrypts_only_changed_fields() {
        let fx = fixture();
        let created = fx.notes.create("Groceries", "Milk, eggs").unwrap();
        let before = fx.store.get(&created.id).unwrap().unwrap();
        fx.clock.advance(Duration::minutes(1));

        let updated = fx
            .notes
            .update(&created.id, &NotePatch::new().body("Milk, eggs, bread"))
            .unwrap();

        let after = fx.store.get(&created.id).unwrap().unwrap();
        assert_eq!(after.title, before.title);
        assert_ne!(after.body.nonce, before.body.nonce);
        assert_eq!(updated.title, "Groceries");
        assert_eq!(updated.body, "Milk, eggs, bread");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, created.created_at + Duration::minutes(1));
    }

    #[test]
    fn test_empty_patch_bumps_updated_at() {
        let fx = fixture();
        let created = fx.notes.create("t", "b").unwrap();
        fx.clock.advance(Duration::seconds(5));

        let updated = fx.notes.update(&created.id, &NotePatch::new()).unwrap();

        assert!(updated.updated_at > created.updated_at);
        assert_eq!(fx.notes.get(&created.id).unwrap().updated_at, updated.updated_at);
    }

    #[test]
    fn test_delete_removes_record() {
        let fx = fixture();
        let created = fx.notes.create("t", "b").unwrap();
        fx.notes.delete(&created.id).unwrap();
        assert!(fx.notes.list().unwrap().is_empty());
        assert_eq!(fx.store.metadata().unwrap().record_count, 0);
    }

    #[test]
    fn test_list_in_creation_order() {
        let fx = fixture();
        let first = fx.notes.create("first", "").unwrap();
        fx.clock.advance(Duration::seconds(1));
        let second = fx.notes.create("second", "").unwrap();

        let ids: Vec<_> = fx.notes.list().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_list_skips_corrupted_record() {
        let fx = fixture();
        fx.notes.create("one", "1").unwrap();
        let broken = fx.notes.create("two", "2").unwrap();
        fx.notes.create("three", "3").unwrap();

        let mut record = fx.store.get(&broken.id).unwrap().unwrap();
        record.body.ciphertext[0] ^= 0xff;
        fx.store.put(&record).unwrap();

        let titles: Vec<_> = fx.notes.list().unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["one", "three"]);
        assert!(matches!(
            fx.notes.get(&broken.id),
            Err(VaultError::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn test_full_overwrite_repairs_corrupted_record() {
        let fx = fixture();
        let broken = fx.notes.create("old title", "old body").unwrap();
        let mut record = fx.store.get(&broken.id).unwrap().unwrap();
        record.title.ciphertext[0] ^= 0xff;
        record.body.ciphertext[0] ^= 0xff;
        fx.store.put(&record).unwrap();

        let title_only = fx.notes.update(&broken.id, &NotePatch::new().title("new title"));
        assert!(matches!(
            title_only,
            Err(VaultError::Crypto(CryptoError::DecryptionFailed))
        ));

        let repaired = fx
            .notes
            .update(&broken.id, &NotePatch::new().title("new title").body("new body"))
            .unwrap();

        assert_eq!(repaired.title, "new title");
        assert_eq!(repaired.created_at, broken.created_at);
        let loaded = fx.notes.get(&broken.id).unwrap();
        assert_eq!(loaded.title, "new title");
        assert_eq!(loaded.body, "new body");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let fx = fixture();
        fx.notes.create("Groceries", "Milk, eggs").unwrap();
        fx.notes.create("Work", "Quarterly REPORT").unwrap();

        let hits = fx.notes.search("milk").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Groceries");

        assert_eq!(fx.notes.search("report").unwrap()[0].title, "Work");
        assert!(fx.notes.search("nothing").unwrap().is_empty());
        assert_eq!(fx.notes.search("   ").unwrap().len(), 2);
    }

    #[test]
    fn test_list_between_is_inclusive() {
        let fx = fixture();
        let start = fx.session.now();
        fx.notes.create("a", "").unwrap();
        fx.clock.advance(Duration::minutes(20));
        fx.notes.create("b", "").unwrap();
        fx.clock.advance(Duration::minutes(20));
        fx.notes.create("c", "").unwrap();

        let hits = fx
            .notes
            .list_between(start, start + Duration::minutes(20))
            .unwrap();
        let titles: Vec<_> = hits.into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_mutations_extend_session() {
        let fx = fixture();
        fx.clock.advance(Duration::minutes(25));
        fx.notes.create("t", "b").unwrap();
        fx.clock.advance(Duration::minutes(25));

        assert!(fx.session.is_authenticated());
        fx.notes.list().unwrap();
    }

    #[test]
    fn test_reads_do_not_extend_session() {
        let fx = fixture();
        fx.clock.advance(Duration::minutes(25));
        fx.notes.list().unwrap();
        fx.clock.advance(Duration::minutes(5));

        assert!(fx.notes.list().unwrap_err().is_not_authenticated());
    }
}
