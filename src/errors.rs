// settingsync/src/errors.rs
use thiserror::Error;

/// Which side of the sync a record collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    Local,
    Remote,
}

impl std::fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordOrigin::Local => write!(f, "local"),
            RecordOrigin::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed record collection: {0}")]
    MalformedEnvelope(String),

    #[error("No identifier could be extracted from {origin} record: {record}")]
    MissingIdentifier { origin: RecordOrigin, record: String },

    #[error("Remote record '{id}' has no server-assigned id")]
    MissingRemoteId { id: String },

    #[error("Duplicate identifier '{id}' in {origin} records")]
    DuplicateIdentifier { origin: RecordOrigin, id: String },

    #[error("Remote server answered {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
