use std::path::Path;

use super::LinkingError;
use crate::models::{normalize_id, DrugRecord};

/// Read-only reference collection of drug records.
///
/// Loaded once at startup and shared (typically behind an `Arc`) by every
/// scan. There is no mutation API.
#[derive(Debug, Clone, Default)]
pub struct DrugDatabase {
    records: Vec<DrugRecord>,
}

impl DrugDatabase {
    /// An empty database. Linking against it never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from in-memory records, applying the same normalization as `load`.
    pub fn from_records(records: Vec<DrugRecord>) -> Self {
        let total = records.len();
        let records: Vec<DrugRecord> = records
            .into_iter()
            .filter(|r| !r.brand_name.trim().is_empty())
            .map(|mut r| {
                if r.id.trim().is_empty() {
                    r.id = normalize_id(&r.brand_name);
                }
                r
            })
            .collect();

        let dropped = total - records.len();
        if dropped > 0 {
            tracing::warn!(dropped, "Skipped drug records without a brand name");
        }

        Self { records }
    }

    /// Load the JSON record list written by the offline miner.
    ///
    /// A missing file yields an empty database; a present but unreadable or
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, LinkingError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Drug database not found, continuing with empty database");
            return Ok(Self::empty());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| LinkingError::DatabaseRead {
            path: path.to_path_buf(),
            source,
        })?;

        let records: Vec<DrugRecord> =
            serde_json::from_str(&raw).map_err(|source| LinkingError::DatabaseParse {
                path: path.to_path_buf(),
                source,
            })?;

        let db = Self::from_records(records);
        tracing::info!(path = %path.display(), records = db.len(), "Drug database loaded");
        Ok(db)
    }

    /// Records in file order. Scan order matters for tie-breaking.
    pub fn records(&self) -> &[DrugRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&DrugRecord> {
        let key = normalize_id(id);
        self.records.iter().find(|r| r.id == key)
    }
}
