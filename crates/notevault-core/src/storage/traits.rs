//! Record store trait definition.
//!
//! The `RecordStore` trait is the abstract storage service the rest of the
//! core is written against. It only ever sees ciphertext.

use uuid::Uuid;

use super::types::{EncryptedRecord, MasterCredential, StorageMetadata};
use crate::error::StorageError;

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Durable storage for encrypted records, the credential slot and metadata.
///
/// All implementations must ensure:
/// - Every record mutation refreshes `record_count` in the same transaction
/// - `bulk_import` is all-or-nothing
/// - Writes are serialized
pub trait RecordStore: Send + Sync {
    /// Insert or replace a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::IoFailure` if the write fails.
    fn put(&self, record: &EncryptedRecord) -> StorageResult<()>;

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if the stored row cannot be decoded.
    fn get(&self, id: &Uuid) -> StorageResult<Option<EncryptedRecord>>;

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RecordNotFound` if no record has this id.
    fn delete(&self, id: &Uuid) -> StorageResult<()>;

    /// Every record, oldest first. Ties on creation time are broken by id.
    ///
    /// Rows that cannot be decoded are skipped and logged.
    fn list_all_ordered_by_creation(&self) -> StorageResult<Vec<EncryptedRecord>>;

    /// Populate the credential slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a credential is already stored.
    fn put_credential_once(&self, credential: &MasterCredential) -> StorageResult<()>;

    /// The stored credential, if setup has happened.
    fn get_credential(&self) -> StorageResult<Option<MasterCredential>>;

    /// Current metadata. A stale `record_count` is repaired on read.
    fn metadata(&self) -> StorageResult<StorageMetadata>;

    /// Upsert a batch of records in one transaction.
    ///
    /// When `metadata` is given its schema version must match the store's.
    /// The stored `record_count` is always recomputed.
    ///
    /// # Returns
    ///
    /// The number of records written.
    fn bulk_import(
        &self,
        records: &[EncryptedRecord],
        metadata: Option<&StorageMetadata>,
    ) -> StorageResult<usize>;

    /// Consistent snapshot of all records and metadata.
    fn export_all(&self) -> StorageResult<(Vec<EncryptedRecord>, StorageMetadata)>;

    /// Verify the structural integrity of the store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` describing the first problem found.
    fn check_integrity(&self) -> StorageResult<()>;
}
