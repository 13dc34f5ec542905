//! The document store: single owner of the in-memory document.
//!
//! Every mutation goes through [`DocumentStore::update_document`]: the
//! closure produces a whole new document from the old one, the result is
//! installed, then written through to storage. Readers holding a previous
//! clone never observe a torn state, and a failed write leaves the in-memory
//! document authoritative for the rest of the session.

use serde_json::Value;
use tracing::{debug, info, warn};

use vaadly_model::{migrate, new_id, Building, Document};

use crate::backup::{self, LAST_BACKUP_KEY, SNAPSHOT_RETENTION};
use crate::error::{DomainError, StoreError, UpdateError};
use crate::kv::KeyValueStore;

/// Storage key holding the full serialized document.
pub const DATA_KEY: &str = "building-management-data";

pub struct DocumentStore {
    pub(crate) document: Document,
    pub(crate) kv: Box<dyn KeyValueStore>,
    pub(crate) backup_retention: usize,
}

impl DocumentStore {
    /// Load the stored document through the migrator, or install defaults
    /// when storage is empty. Unparseable stored bytes heal to a default
    /// document the same way an empty store does.
    pub fn open(kv: Box<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let raw = match kv.get(DATA_KEY)? {
            Some(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|err| {
                warn!(%err, "stored document is unparseable, rebuilding from defaults");
                Value::Null
            }),
            None => Value::Null,
        };
        let document = migrate(raw);
        info!(
            buildings = document.buildings.len(),
            tenants = document
                .buildings
                .iter()
                .map(|b| b.tenants.len())
                .sum::<usize>(),
            employees = document.global_employees.len(),
            products = document.inventory_products.len(),
            "document loaded"
        );
        Ok(Self {
            document,
            kv,
            backup_retention: SNAPSHOT_RETENTION,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn current_building(&self) -> Option<&Building> {
        self.document.current_building()
    }

    /// Bound on retained daily snapshots (defaults to 7; host config may
    /// override).
    pub fn set_backup_retention(&mut self, retention: usize) {
        self.backup_retention = retention.max(1);
    }

    /// The only path by which the document changes. The new value is
    /// installed before persistence, so the in-memory effect stands even
    /// when the write-through fails; the error is surfaced to the caller.
    pub fn update_document<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Document) -> Document,
    {
        self.document = f(self.document.clone());
        self.persist()
    }

    /// Apply a transformation to the current building only; every other
    /// building is left untouched.
    pub fn update_building<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Building) -> Building,
    {
        self.update_document(|mut doc| {
            if let Some(idx) = doc
                .buildings
                .iter()
                .position(|b| b.id == doc.current_building_id)
            {
                let building = doc.buildings.remove(idx);
                doc.buildings.insert(idx, f(building));
            }
            doc
        })
    }

    /// Fallible variant of [`Self::update_document`]: a domain-rule failure
    /// aborts before anything is installed, leaving document and storage
    /// untouched.
    pub fn try_update_document<F>(&mut self, f: F) -> Result<(), UpdateError>
    where
        F: FnOnce(Document) -> Result<Document, DomainError>,
    {
        self.document = f(self.document.clone())?;
        self.persist().map_err(UpdateError::Store)
    }

    /// Fallible variant of [`Self::update_building`].
    pub fn try_update_building<F>(&mut self, f: F) -> Result<(), UpdateError>
    where
        F: FnOnce(Building) -> Result<Building, DomainError>,
    {
        self.try_update_document(|mut doc| {
            if let Some(idx) = doc
                .buildings
                .iter()
                .position(|b| b.id == doc.current_building_id)
            {
                let building = doc.buildings.remove(idx);
                doc.buildings.insert(idx, f(building)?);
            }
            Ok(doc)
        })
    }

    /// Silent no-op when `id` does not resolve.
    pub fn switch_current_building(&mut self, id: &str) -> Result<(), StoreError> {
        if self.document.building(id).is_none() {
            debug!(id, "switch to unknown building ignored");
            return Ok(());
        }
        self.update_document(|mut doc| {
            doc.current_building_id = id.to_string();
            doc
        })
    }

    /// Create a building with default settings, append it, and make it
    /// current. Returns the new building's id.
    pub fn add_building(&mut self, name: &str) -> Result<String, StoreError> {
        let building = Building::with_defaults(new_id(), name);
        let id = building.id.clone();
        let switch_to = id.clone();
        self.update_document(move |mut doc| {
            doc.buildings.push(building);
            doc.current_building_id = switch_to;
            doc
        })?;
        Ok(id)
    }

    /// Remove a building. Removing the last remaining building is a no-op;
    /// removing the current building repoints to the first remaining one.
    pub fn delete_building(&mut self, id: &str) -> Result<(), StoreError> {
        if self.document.buildings.len() <= 1 {
            debug!(id, "refusing to delete the last building");
            return Ok(());
        }
        if self.document.building(id).is_none() {
            return Ok(());
        }
        self.update_document(|mut doc| {
            doc.buildings.retain(|b| b.id != id);
            if doc.current_building_id == id {
                doc.current_building_id = doc.buildings[0].id.clone();
            }
            doc
        })
    }

    /// Clear-all: remove the document, the backup marker and every stored
    /// snapshot, then install a fresh default document.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.kv.remove(DATA_KEY)?;
        self.kv.remove(LAST_BACKUP_KEY)?;
        for key in backup::snapshot_keys(self.kv.as_ref())? {
            self.kv.remove(&key)?;
        }
        self.document = Document::with_defaults();
        self.persist()
    }

    pub(crate) fn persist(&mut self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.document)?;
        self.kv.set(DATA_KEY, &bytes)
    }
}
