//! Presentation-facing async session.
//!
//! # Responsibility
//! - Run each user action as one unit of work on tokio's blocking pool.
//! - Own the contact/note snapshots and refresh them after every action.
//! - Apply the once-per-session import gate.
//!
//! # Invariants
//! - Snapshots change only after a unit of work completed successfully.
//! - A failed action leaves the previous snapshot in place, except a failed
//!   start import, which still loads what storage already holds.
//! - Only the session owner mutates snapshots (`&mut self` methods).

mod snapshot;

pub use snapshot::{ContactEntry, Snapshot};

use crate::db::{DbError, StorageHandle};
use crate::model::contact::ContactId;
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::RepoError;
use crate::service::contact_service::{ContactService, DeleteOutcome};
use crate::service::import_service::{
    ImportError, ImportPlan, ImportReport, ImportService, ImportSession, ImportStatus,
};
use crate::service::note_service::{NoteService, NoteServiceError, SavedNote};
use crate::source::contact_source::ContactSource;
use crate::source::permission::{ContactPermission, PermissionGate};
use log::{debug, error};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Error from one session action.
#[derive(Debug)]
pub enum SessionError {
    Db(DbError),
    Repo(RepoError),
    Import(ImportError),
    Note(NoteServiceError),
    /// The blocking worker panicked or was cancelled by runtime shutdown.
    Worker(String),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::Note(err) => write!(f, "{err}"),
            Self::Worker(message) => write!(f, "session worker failed: {message}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Note(err) => Some(err),
            Self::Worker(_) => None,
        }
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ImportError> for SessionError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<NoteServiceError> for SessionError {
    fn from(value: NoteServiceError) -> Self {
        Self::Note(value)
    }
}

/// Contacts screen controller.
///
/// Storage and source are injected at construction; nothing here reaches for
/// global state.
pub struct ContactsSession<S>
where
    S: ContactSource + Send + Sync + 'static,
{
    storage: StorageHandle,
    source: Arc<S>,
    import: ImportSession,
    snapshot: Snapshot,
}

impl<S> ContactsSession<S>
where
    S: ContactSource + Send + Sync + 'static,
{
    pub fn new(storage: StorageHandle, source: Arc<S>) -> Self {
        Self {
            storage,
            source,
            import: ImportSession::new(),
            snapshot: Snapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Joined contact + note rows for list rendering.
    pub fn entries(&self) -> Vec<ContactEntry> {
        self.snapshot.entries()
    }

    pub fn is_imported(&self) -> bool {
        self.import.is_imported()
    }

    /// Loads snapshots and imports contacts when the gate allows it.
    ///
    /// Snapshots are loaded even when the import itself fails.
    pub async fn start(
        &mut self,
        gate: &(impl PermissionGate + ?Sized),
    ) -> Result<ImportStatus, SessionError> {
        match self.import.plan_start(gate) {
            ImportPlan::Run => match self.run_import().await {
                Ok(status) => Ok(status),
                Err(err) => {
                    // Rows stored by earlier sessions still load; a refresh
                    // failure is already logged by `run_unit`.
                    let _ = self.refresh().await;
                    Err(err)
                }
            },
            ImportPlan::Skip(status) => {
                self.refresh().await?;
                Ok(status)
            }
        }
    }

    /// Host permission callback; the only retry trigger for import.
    pub async fn on_permission_result(
        &mut self,
        permission: ContactPermission,
        granted: bool,
    ) -> Result<ImportStatus, SessionError> {
        match self.import.plan_permission_result(permission, granted) {
            ImportPlan::Run => self.run_import().await,
            ImportPlan::Skip(status) => Ok(status),
        }
    }

    /// Reloads both snapshots from storage.
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        let snapshot = self.run_unit("refresh", load_snapshot).await?;
        self.snapshot = snapshot;
        Ok(())
    }

    /// Saves the contact's note (create or update), then refreshes.
    pub async fn save_note(
        &mut self,
        contact_id: ContactId,
        description: impl Into<String>,
    ) -> Result<SavedNote, SessionError> {
        let description = description.into();
        let (saved, snapshot) = self
            .run_unit("save_note", move |conn| {
                let service = NoteService::new(SqliteNoteRepository::try_new(conn)?);
                let saved = service.save_note(contact_id, description)?;
                Ok((saved, load_snapshot(conn)?))
            })
            .await?;
        self.snapshot = snapshot;
        Ok(saved)
    }

    /// Removes only the contact's note, then refreshes.
    pub async fn delete_note(&mut self, contact_id: ContactId) -> Result<bool, SessionError> {
        let (removed, snapshot) = self
            .run_unit("delete_note", move |conn| {
                let service = NoteService::new(SqliteNoteRepository::try_new(conn)?);
                let removed = service.delete_note_for_contact(contact_id)?;
                Ok((removed, load_snapshot(conn)?))
            })
            .await?;
        self.snapshot = snapshot;
        Ok(removed)
    }

    /// Removes the contact and its note, then refreshes.
    pub async fn delete_contact(
        &mut self,
        contact_id: ContactId,
    ) -> Result<DeleteOutcome, SessionError> {
        let (outcome, snapshot) = self
            .run_unit("delete_contact", move |conn| {
                let outcome = ContactService::try_new(conn)?.delete_contact(contact_id)?;
                Ok((outcome, load_snapshot(conn)?))
            })
            .await?;
        self.snapshot = snapshot;
        Ok(outcome)
    }

    async fn run_import(&mut self) -> Result<ImportStatus, SessionError> {
        let source = Arc::clone(&self.source);
        let (report, snapshot): (ImportReport, Snapshot) = self
            .run_unit("import", move |conn| {
                let pipeline =
                    ImportService::new(source, SqliteContactRepository::try_new(conn)?);
                let report = pipeline.import_contacts()?;
                Ok((report, load_snapshot(conn)?))
            })
            .await?;
        self.import.mark_imported();
        self.snapshot = snapshot;
        Ok(ImportStatus::Imported(report))
    }

    async fn run_unit<T, F>(&self, action: &'static str, work: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SessionError> + Send + 'static,
    {
        let storage = self.storage.clone();
        let started_at = Instant::now();

        let result = match tokio::task::spawn_blocking(move || storage.with_conn(work)).await {
            Ok(result) => result,
            Err(err) => Err(SessionError::Worker(err.to_string())),
        };

        match &result {
            Ok(_) => debug!(
                "event=session_action module=session status=ok action={} duration_ms={}",
                action,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=session_action module=session status=error action={} duration_ms={} error={}",
                action,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn load_snapshot(conn: &Connection) -> Result<Snapshot, SessionError> {
    let contacts = SqliteContactRepository::try_new(conn)?.get_all_contacts()?;
    let notes = SqliteNoteRepository::try_new(conn)?.get_all_notes()?;
    Ok(Snapshot::new(contacts, notes))
}
