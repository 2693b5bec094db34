//! Core domain logic for ContactNote.
//! This crate is the single source of truth for contact/note invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod source;

pub use config::CoreConfig;
pub use db::{DbError, StorageHandle};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::contact::{Contact, ContactId};
pub use model::note::{Note, NoteId};
pub use repo::contact_repo::{ContactRepository, SqliteContactRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use service::contact_service::{ContactService, DeleteOutcome};
pub use service::import_service::{
    ImportError, ImportPlan, ImportReport, ImportService, ImportSession, ImportStatus,
};
pub use service::note_service::{NoteService, NoteServiceError, SaveOutcome, SavedNote};
pub use session::{ContactEntry, ContactsSession, SessionError, Snapshot};
pub use source::contact_source::{ContactSource, SourceContact, SourceError, StaticContactSource};
pub use source::permission::{
    ContactPermission, PermissionGate, PermissionState, StaticPermissionGate,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
