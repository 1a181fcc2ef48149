//! Storage abstraction and the SQLite backend.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteRecordStore;
pub use traits::{RecordStore, StorageResult};
pub use types::{EncryptedRecord, MasterCredential, StorageMetadata, VaultExport};
