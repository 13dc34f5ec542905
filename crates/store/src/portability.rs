//! Import/export boundary.
//!
//! Export produces stable, human-diffable pretty JSON. Import never trusts
//! the payload: whatever parses is pushed through the same migrator the
//! store uses at startup, so an installed import is always schema-healed.

use chrono::NaiveDate;
use serde_json::Value;

use vaadly_model::{migrate, Document};

use crate::error::{ImportError, StoreError};

/// Serialize the full document with stable pretty formatting.
pub fn export_snapshot(document: &Document) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec_pretty(document)?)
}

/// File name for a user-facing export, carrying the export date.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("building-management-backup-{today}.json")
}

/// Parse externally supplied bytes into a schema-conformant document.
///
/// Parse failures are the only rejection; anything structurally JSON is
/// healed rather than refused.
pub fn import_snapshot(bytes: &[u8]) -> Result<Document, ImportError> {
    let raw: Value = serde_json::from_slice(bytes).map_err(ImportError::Malformed)?;
    Ok(migrate(raw))
}
