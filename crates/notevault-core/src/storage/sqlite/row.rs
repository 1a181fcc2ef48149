//! Row types for database queries.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::crypto::EncryptedField;
use crate::error::StorageError;
use crate::storage::types::{EncryptedRecord, MasterCredential};

/// Column list matching `RecordRow::from_row`.
pub const RECORD_COLUMNS: &str =
    "id, title_cipher, title_nonce, body_cipher, body_nonce, created_at, updated_at";

/// Raw row data from the records table, before parsing into domain types.
#[derive(Debug)]
pub struct RecordRow {
    pub id: String,
    pub title_cipher: Vec<u8>,
    pub title_nonce: Vec<u8>,
    pub body_cipher: Vec<u8>,
    pub body_nonce: Vec<u8>,
    pub created_at: String,
    pub updated_at: String,
}

impl RecordRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title_cipher: row.get(1)?,
            title_nonce: row.get(2)?,
            body_cipher: row.get(3)?,
            body_nonce: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl TryFrom<RecordRow> for EncryptedRecord {
    type Error = StorageError;

    fn try_from(row: RecordRow) -> Result<Self, StorageError> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StorageError::Corrupt(format!("Invalid record UUID: {}", e)))?;
        let created_at = parse_timestamp(&row.created_at)?;
        let updated_at = parse_timestamp(&row.updated_at)?;

        Ok(EncryptedRecord {
            id,
            title: EncryptedField {
                ciphertext: row.title_cipher,
                nonce: row.title_nonce,
            },
            body: EncryptedField {
                ciphertext: row.body_cipher,
                nonce: row.body_nonce,
            },
            created_at,
            updated_at,
        })
    }
}

/// Raw row data from the credential table.
#[derive(Debug)]
pub struct CredentialRow {
    pub salt: Vec<u8>,
    pub verifier_hash: Vec<u8>,
    pub created_at: String,
}

impl TryFrom<CredentialRow> for MasterCredential {
    type Error = StorageError;

    fn try_from(row: CredentialRow) -> Result<Self, StorageError> {
        let salt = row
            .salt
            .try_into()
            .map_err(|_| StorageError::Corrupt("Credential salt has wrong length".to_string()))?;
        let verifier_hash = row.verifier_hash.try_into().map_err(|_| {
            StorageError::Corrupt("Credential verifier has wrong length".to_string())
        })?;
        let created_at = parse_timestamp(&row.created_at)?;

        Ok(MasterCredential {
            salt,
            verifier_hash,
            created_at,
        })
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("Invalid timestamp: {}", e)))
}
