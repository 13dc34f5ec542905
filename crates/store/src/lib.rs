pub mod backup;
pub mod error;
pub mod inventory;
pub mod kv;
pub mod ops;
pub mod portability;
pub mod reports;
pub mod rules;
pub mod store;

pub use backup::{SnapshotInfo, LAST_BACKUP_KEY, SNAPSHOT_KEY_PREFIX, SNAPSHOT_RETENTION};
pub use error::{DomainError, ImportError, StoreError, UpdateError};
pub use kv::{KeyValueStore, MemoryKv, RedbKv};
pub use store::{DocumentStore, DATA_KEY};
