// settingsync/src/records/mod.rs
pub mod identifier;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::{AppError, RecordOrigin};
use identifier::IdStrategy;

/// One configuration entry: field names mapped to JSON values.
pub type Record = Map<String, Value>;

/// Server-assigned metadata that never takes part in comparison or upload.
pub const TRANSIENT_FIELDS: &[&str] = &["id", "last_modified", "schema"];

/// The `{"data": [...]}` envelope used both by dump files and the records API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordCollection {
    pub data: Vec<Record>,
}

impl RecordCollection {
    pub fn from_json_str(raw: &str) -> std::result::Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|e| AppError::MalformedEnvelope(e.to_string()))
    }

    /// Reads a local dump file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read record dump at {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse record dump at {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Removes the transient fields in place.
pub fn strip_transient(record: &mut Record) {
    for field in TRANSIENT_FIELDS {
        record.remove(*field);
    }
}

/// Returns a copy of `record` without its transient fields.
pub fn stripped(record: &Record) -> Record {
    let mut copy = record.clone();
    strip_transient(&mut copy);
    copy
}

/// Fails on the first identifier that appears twice in `records`.
pub fn ensure_unique_ids(
    records: &[Record],
    strategy: &IdStrategy,
    origin: RecordOrigin,
) -> std::result::Result<(), AppError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let id = strategy.identify(record, origin)?;
        if seen.contains(&id) {
            return Err(AppError::DuplicateIdentifier {
                origin,
                id: id.to_string(),
            });
        }
        seen.insert(id);
    }
    Ok(())
}
