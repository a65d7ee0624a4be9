// settingsync/src/records/identifier.rs
use serde_json::Value;
use std::fmt;

use super::Record;
use crate::errors::{AppError, RecordOrigin, Result};

/// Candidate top-level identifier fields, tried in order, for collections
/// without a dedicated strategy.
pub const DEFAULT_ID_FIELDS: &[&str] = &["telemetryId", "identifier", "recordType"];

/// Collections whose records carry their identifier somewhere other than the
/// default top-level fields.
const KNOWN_COLLECTIONS: &[(&str, IdStrategy)] = &[(
    "search-config",
    IdStrategy::Nested {
        parent: "webExtension",
        field: "id",
    },
)];

/// Identifier of a record.
///
/// Equality follows the JSON value, so the number `7` and the string `"7"`
/// are different identifiers. `Display` prints strings without quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    // Compact JSON text of the value; strings keep their quotes.
    key: String,
}

impl RecordId {
    pub fn new(value: &Value) -> Self {
        RecordId {
            key: value.to_string(),
        }
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::new(&Value::String(id.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::from_str::<Value>(&self.key) {
            Ok(Value::String(s)) => write!(f, "{}", s),
            _ => write!(f, "{}", self.key),
        }
    }
}

/// How the identifier of a record is extracted for a given collection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `record[parent][field]`
    Nested {
        parent: &'static str,
        field: &'static str,
    },
    /// The first of these top-level fields that is present.
    FirstOf(&'static [&'static str]),
}

impl Default for IdStrategy {
    fn default() -> Self {
        IdStrategy::FirstOf(DEFAULT_ID_FIELDS)
    }
}

impl IdStrategy {
    /// Picks the strategy registered for `collection`, falling back to
    /// [`DEFAULT_ID_FIELDS`].
    pub fn for_collection(collection: &str) -> Self {
        KNOWN_COLLECTIONS
            .iter()
            .find(|(name, _)| *name == collection)
            .map(|(_, strategy)| *strategy)
            .unwrap_or_default()
    }

    /// Returns the record's identifier, or `None` when the field the strategy
    /// looks for is absent. A present `null` is an identifier like any other.
    pub fn extract(&self, record: &Record) -> Option<RecordId> {
        let value = match self {
            IdStrategy::Nested { parent, field } => record.get(*parent)?.get(*field),
            IdStrategy::FirstOf(fields) => fields.iter().find_map(|field| record.get(*field)),
        }?;
        Some(RecordId::new(value))
    }

    pub fn identify(&self, record: &Record, origin: RecordOrigin) -> Result<RecordId> {
        self.extract(record)
            .ok_or_else(|| AppError::MissingIdentifier {
                origin,
                record: Value::Object(record.clone()).to_string(),
            })
    }
}
