//! SQLite storage backend.
//!
//! Records, the credential slot and metadata live in one SQLite database.
//! Fields arrive already encrypted; this layer never sees plaintext.

mod row;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::crypto::{CURRENT_SCHEMA_VERSION, NONCE_LENGTH};
use crate::error::StorageError;
use crate::storage::traits::{RecordStore, StorageResult};
use crate::storage::types::{EncryptedRecord, MasterCredential, StorageMetadata};

use row::{format_timestamp, parse_timestamp, CredentialRow, RecordRow, RECORD_COLUMNS};

const META_SCHEMA_VERSION: &str = "schema_version";
const META_RECORD_COUNT: &str = "record_count";
const META_LAST_SYNCED_AT: &str = "last_synced_at";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS credential (
        slot TEXT PRIMARY KEY CHECK (slot = 'main'),
        salt BLOB NOT NULL,
        verifier_hash BLOB NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS records (
        id TEXT PRIMARY KEY,
        title_cipher BLOB NOT NULL,
        title_nonce BLOB NOT NULL,
        body_cipher BLOB NOT NULL,
        body_nonce BLOB NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(created_at, id);
"#;

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open a store at `path`, creating the file and schema if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::IoFailure` if the directory or database cannot
    /// be created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        crate::fs::ensure_parent_dir(path)?;
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        tracing::debug!(path = %path.display(), "opened vault store");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open a store that must already exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotInitialized` if the file is missing or has
    /// no vault metadata.
    pub fn open_existing(path: &Path) -> StorageResult<Self> {
        if !path.exists() {
            return Err(StorageError::NotInitialized);
        }
        let conn = Connection::open(path)?;
        let has_meta: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'meta'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if has_meta.is_none() {
            return Err(StorageError::NotInitialized);
        }
        Self::initialize(&conn)?;
        tracing::debug!(path = %path.display(), "opened existing vault store");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Location of the database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(SCHEMA)?;
        let now = format_timestamp(&Utc::now());
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES (?1, ?2), (?3, '0'), (?4, ?5)",
            params![
                META_SCHEMA_VERSION,
                CURRENT_SCHEMA_VERSION.to_string(),
                META_RECORD_COUNT,
                META_LAST_SYNCED_AT,
                now
            ],
        )?;
        Ok(())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::IoFailure("SQLite connection poisoned".to_string()))
    }

    fn set_meta(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_meta(conn: &Connection, key: &str) -> StorageResult<String> {
        conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or_else(|| StorageError::Corrupt(format!("Metadata missing key '{}'", key)))
    }

    fn count_records(conn: &Connection) -> StorageResult<u64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Recompute `record_count` and stamp `last_synced_at`.
    ///
    /// Called inside the same transaction as every record mutation.
    fn refresh_metadata(conn: &Connection) -> StorageResult<u64> {
        let count = Self::count_records(conn)?;
        Self::set_meta(conn, META_RECORD_COUNT, &count.to_string())?;
        Self::set_meta(conn, META_LAST_SYNCED_AT, &format_timestamp(&Utc::now()))?;
        Ok(count)
    }

    fn read_metadata(conn: &Connection) -> StorageResult<StorageMetadata> {
        let schema_version = Self::get_meta(conn, META_SCHEMA_VERSION)?
            .parse::<u32>()
            .map_err(|e| StorageError::Corrupt(format!("Invalid schema_version: {}", e)))?;
        let record_count = Self::get_meta(conn, META_RECORD_COUNT)?
            .parse::<u64>()
            .map_err(|e| StorageError::Corrupt(format!("Invalid record_count: {}", e)))?;
        let last_synced_at = parse_timestamp(&Self::get_meta(conn, META_LAST_SYNCED_AT)?)?;

        Ok(StorageMetadata {
            schema_version,
            record_count,
            last_synced_at,
        })
    }

    fn upsert_record(conn: &Connection, record: &EncryptedRecord) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO records (id, title_cipher, title_nonce, body_cipher, body_nonce, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                title_cipher = excluded.title_cipher,
                title_nonce = excluded.title_nonce,
                body_cipher = excluded.body_cipher,
                body_nonce = excluded.body_nonce,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
            params![
                record.id.to_string(),
                record.title.ciphertext,
                record.title.nonce,
                record.body.ciphertext,
                record.body.nonce,
                format_timestamp(&record.created_at),
                format_timestamp(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    fn query_records(conn: &Connection) -> StorageResult<Vec<EncryptedRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM records ORDER BY created_at ASC, id ASC",
            RECORD_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let raw = match RecordRow::from_row(row) {
                Ok(raw) => raw,
                Err(err) => {
                    let raw_id = row.get::<_, String>(0).unwrap_or_default();
                    tracing::warn!(id = %raw_id, error = %err, "skipping unreadable record row");
                    continue;
                }
            };
            let raw_id = raw.id.clone();
            match EncryptedRecord::try_from(raw) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(id = %raw_id, error = %err, "skipping undecodable record row");
                }
            }
        }
        Ok(records)
    }
}

impl RecordStore for SqliteRecordStore {
    fn put(&self, record: &EncryptedRecord) -> StorageResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        Self::upsert_record(&tx, record)?;
        let count = Self::refresh_metadata(&tx)?;
        tx.commit()?;
        tracing::debug!(id = %record.id, record_count = count, "stored record");
        Ok(())
    }

    fn get(&self, id: &Uuid) -> StorageResult<Option<EncryptedRecord>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM records WHERE id = ?1", RECORD_COLUMNS),
                [id.to_string()],
                RecordRow::from_row,
            )
            .optional()?;
        row.map(EncryptedRecord::try_from).transpose()
    }

    fn delete(&self, id: &Uuid) -> StorageResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM records WHERE id = ?1", [id.to_string()])?;
        if removed == 0 {
            return Err(StorageError::RecordNotFound(*id));
        }
        let count = Self::refresh_metadata(&tx)?;
        tx.commit()?;
        tracing::debug!(id = %id, record_count = count, "deleted record");
        Ok(())
    }

    fn list_all_ordered_by_creation(&self) -> StorageResult<Vec<EncryptedRecord>> {
        let conn = self.lock_conn()?;
        Self::query_records(&conn)
    }

    fn put_credential_once(&self, credential: &MasterCredential) -> StorageResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row("SELECT slot FROM credential WHERE slot = 'main'", [], |row| {
                row.get(0)
            })
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::AlreadyExists("credential".to_string()));
        }

        tx.execute(
            "INSERT INTO credential (slot, salt, verifier_hash, created_at) VALUES ('main', ?1, ?2, ?3)",
            params![
                credential.salt.to_vec(),
                credential.verifier_hash.to_vec(),
                format_timestamp(&credential.created_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_credential(&self) -> StorageResult<Option<MasterCredential>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT salt, verifier_hash, created_at FROM credential WHERE slot = 'main'",
                [],
                |row| {
                    Ok(CredentialRow {
                        salt: row.get(0)?,
                        verifier_hash: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        row.map(MasterCredential::try_from).transpose()
    }

    fn metadata(&self) -> StorageResult<StorageMetadata> {
        let conn = self.lock_conn()?;
        let mut metadata = Self::read_metadata(&conn)?;

        let actual = Self::count_records(&conn)?;
        if metadata.record_count != actual {
            tracing::warn!(
                stored = metadata.record_count,
                actual,
                "record_count was stale, repairing"
            );
            Self::set_meta(&conn, META_RECORD_COUNT, &actual.to_string())?;
            metadata.record_count = actual;
        }

        Ok(metadata)
    }

    fn bulk_import(
        &self,
        records: &[EncryptedRecord],
        metadata: Option<&StorageMetadata>,
    ) -> StorageResult<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        if let Some(incoming) = metadata {
            let current = Self::read_metadata(&tx)?;
            if incoming.schema_version != current.schema_version {
                return Err(StorageError::Corrupt(format!(
                    "Import schema version {} does not match store schema version {}",
                    incoming.schema_version, current.schema_version
                )));
            }
        }

        for record in records {
            Self::upsert_record(&tx, record)?;
        }
        let count = Self::refresh_metadata(&tx)?;
        tx.commit()?;

        tracing::info!(imported = records.len(), record_count = count, "bulk import committed");
        Ok(records.len())
    }

    fn export_all(&self) -> StorageResult<(Vec<EncryptedRecord>, StorageMetadata)> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let records = Self::query_records(&tx)?;
        let mut metadata = Self::read_metadata(&tx)?;
        metadata.record_count = records.len() as u64;
        tx.commit()?;
        Ok((records, metadata))
    }

    fn check_integrity(&self) -> StorageResult<()> {
        let conn = self.lock_conn()?;

        let status: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if status != "ok" {
            return Err(StorageError::Corrupt(format!(
                "SQLite integrity check failed: {}",
                status
            )));
        }

        let metadata = Self::read_metadata(&conn)?;

        let bad_nonces: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE length(title_nonce) != ?1 OR length(body_nonce) != ?1",
            [NONCE_LENGTH as i64],
            |row| row.get(0),
        )?;
        if bad_nonces > 0 {
            return Err(StorageError::Corrupt(format!(
                "{} record(s) have a malformed nonce",
                bad_nonces
            )));
        }

        let actual = Self::count_records(&conn)?;
        if metadata.record_count != actual {
            return Err(StorageError::Corrupt(format!(
                "record_count is {} but {} records are stored",
                metadata.record_count, actual
            )));
        }

        let decodable = Self::query_records(&conn)?.len() as u64;
        if decodable != actual {
            return Err(StorageError::Corrupt(format!(
                "{} record row(s) cannot be decoded",
                actual - decodable
            )));
        }

        Ok(())
    }
}
