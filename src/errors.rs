//! Typed error definitions for media_relocate.
//! `RelocateError` is what callers of the engine see; `StoreError` comes from
//! the metadata store and history log backends.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::history::HistoryId;

#[derive(Debug, Error)]
pub enum RelocateError {
    /// Missing or malformed caller input; nothing was constructed.
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("{} doesn't exist", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported item type (neither file nor folder): {}", .0.display())]
    UnsupportedType(PathBuf),

    /// The intent record could not be written; nothing was attempted.
    #[error("Can not add item to relocation history: {0}")]
    HistoryUnavailable(#[source] StoreError),

    #[error("Metadata store error: {0}")]
    Metadata(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Relocation failed and rollback failed too. The history entry is kept.
    #[error(
        "Relocation failed and rolling back failed; file and metadata integrity may be at risk. \
         Inspect history entry {history_id} before retrying: {details}"
    )]
    IntegrityAtRisk { history_id: HistoryId, details: String },
}

impl RelocateError {
    /// Stable numeric code for structured logs and exit status mapping.
    pub fn code(&self) -> u16 {
        match self {
            RelocateError::Input(_) => 10,
            RelocateError::NotFound(_) => 11,
            RelocateError::UnsupportedType(_) => 12,
            RelocateError::HistoryUnavailable(_) => 20,
            RelocateError::Metadata(_) => 30,
            RelocateError::Io(_) => 40,
            RelocateError::IntegrityAtRisk { .. } => 90,
        }
    }

    /// Only a failed rollback is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelocateError::IntegrityAtRisk { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O: {0}")]
    Io(#[from] io::Error),

    #[error("malformed store data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no transaction in progress")]
    NoTransaction,

    #[error("a transaction is already in progress")]
    TransactionActive,

    #[error("unknown history entry {0}")]
    UnknownEntry(HistoryId),
}
