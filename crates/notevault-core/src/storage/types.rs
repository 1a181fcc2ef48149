//! Persisted and exchanged storage types.
//!
//! Everything here is ciphertext or bookkeeping. Plaintext lives in
//! `crate::notes` and is never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{EncryptedField, SALT_LENGTH, VERIFIER_LENGTH};

/// Format tag written into export bundles.
pub const EXPORT_FORMAT: &str = "notevault-export-v1";

/// The vault's single master credential.
///
/// Written once at setup and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterCredential {
    pub salt: [u8; SALT_LENGTH],
    pub verifier_hash: [u8; VERIFIER_LENGTH],
    pub created_at: DateTime<Utc>,
}

/// One stored note: both fields encrypted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub id: Uuid,
    pub title: EncryptedField,
    pub body: EncryptedField,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Advisory bookkeeping about the store. Rebuilt from contents when stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMetadata {
    /// Gates the key derivation parameters
    pub schema_version: u32,
    /// Number of stored records
    pub record_count: u64,
    /// Time of the last write that refreshed the metadata
    pub last_synced_at: DateTime<Utc>,
}

/// Encrypted export bundle. Records stay encrypted under the vault key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultExport {
    pub format: String,
    pub records: Vec<EncryptedRecord>,
    pub metadata: StorageMetadata,
    pub exported_at: DateTime<Utc>,
}

impl VaultExport {
    pub fn new(records: Vec<EncryptedRecord>, metadata: StorageMetadata) -> Self {
        Self {
            format: EXPORT_FORMAT.to_string(),
            records,
            metadata,
            exported_at: Utc::now(),
        }
    }
}

/// Serde adapter storing byte strings as standard base64.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
