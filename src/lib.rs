//! Core library for `media_relocate`.
//!
//! Moves and renames files and folders inside a managed media tree while a
//! metadata store (which file belongs to which record, and which documents
//! reference it) is kept in step with the filesystem.
//!
//! Layering, leaves first:
//!  - `tree`: normalized paths inside the managed root, plus their public URLs
//!  - `fs_ops`: the filesystem primitive (verified atomic rename, mkdir)
//!  - `metadata` / `history`: the metadata store and the durable history log
//!  - `item`: one relocation attempt (file or folder) with its own rollback
//!  - `relocator`: drives attempts end-to-end and decides between failure and fatal

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod history;
pub mod item;
pub mod metadata;
pub mod output;
pub mod platform;
pub mod reconcile;
pub mod relocator;
pub mod shutdown;
pub mod tree;

pub use config::{
    default_config_path, default_log_path, load_config_from_xml_path, path_has_symlink_ancestor,
    Config, LogLevel,
};
pub use errors::{RelocateError, StoreError};
pub use fs_ops::{FileSystem, LocalFs};
pub use history::{HistoryEntry, HistoryId, HistoryStore, JsonHistoryLog, Movement, MovementStatus};
pub use item::{Item, ItemFactory, ItemKind};
pub use metadata::{Document, JsonMetadataStore, MediaRecord, MetadataStore, ReferenceScope};
pub use relocator::{Attempt, BatchOutcome, FailedItem, Outcome, Plan, Relocator, RelocatorOptions};
pub use tree::{clean_path, ManagedPath, NameRules, Tree};
