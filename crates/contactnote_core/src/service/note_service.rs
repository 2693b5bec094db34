//! Note association use-case service.
//!
//! # Responsibility
//! - Provide the note save protocol (create-or-update by owning contact).
//! - Expose note lookups used by the presentation layer.
//!
//! # Invariants
//! - `save_note` never inserts when the contact already has a note.
//! - The lookup and the write are two statements with no lock between them:
//!   two concurrent first saves for one contact on separate connections can
//!   both insert. This is a known limitation.

use crate::model::contact::ContactId;
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::{RepoError, RepoResult};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Update target vanished between lookup and write.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Which branch of the save protocol ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

impl SaveOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Persisted note plus the branch that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedNote {
    pub note: Note,
    pub outcome: SaveOutcome,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get_all_notes(&self) -> RepoResult<Vec<Note>> {
        self.repo.get_all_notes()
    }

    pub fn get_note_by_contact_id(&self, contact_id: ContactId) -> RepoResult<Option<Note>> {
        self.repo.get_note_by_contact_id(contact_id)
    }

    pub fn get_note_id_by_contact_id(&self, contact_id: ContactId) -> RepoResult<Option<NoteId>> {
        self.repo.get_note_id_by_contact_id(contact_id)
    }

    /// Saves `description` as the contact's note.
    ///
    /// Looks up the contact's current note id first: when found, that row is
    /// overwritten in place; otherwise a new note is inserted.
    pub fn save_note(
        &self,
        contact_id: ContactId,
        description: impl Into<String>,
    ) -> Result<SavedNote, NoteServiceError> {
        let started_at = Instant::now();
        let description = description.into();

        let result = self.save_note_inner(contact_id, description);
        match &result {
            Ok(saved) => info!(
                "event=note_save module=note status=ok outcome={} contact_id={} note_id={} duration_ms={}",
                saved.outcome.as_str(),
                contact_id,
                saved.note.id.unwrap_or_default(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=note_save module=note status=error contact_id={} duration_ms={} error={}",
                contact_id,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn save_note_inner(
        &self,
        contact_id: ContactId,
        description: String,
    ) -> Result<SavedNote, NoteServiceError> {
        match self.repo.get_note_id_by_contact_id(contact_id)? {
            Some(note_id) => {
                let note = Note::with_id(note_id, contact_id, description);
                self.repo.update_note(&note)?;
                Ok(SavedNote {
                    note,
                    outcome: SaveOutcome::Updated,
                })
            }
            None => {
                let mut note = Note::new(contact_id, description);
                let note_id = self.repo.insert_note(&note)?;
                note.id = Some(note_id);
                Ok(SavedNote {
                    note,
                    outcome: SaveOutcome::Created,
                })
            }
        }
    }

    /// Removes the note matching `note.id`.
    pub fn delete_note(&self, note: &Note) -> RepoResult<bool> {
        self.repo.delete_note(note)
    }

    /// Removes the contact's note, and any duplicate rows, when present.
    ///
    /// Returns `false` when the contact had no note.
    pub fn delete_note_for_contact(&self, contact_id: ContactId) -> RepoResult<bool> {
        let removed = self.repo.delete_notes_by_contact_id(contact_id)? > 0;
        info!(
            "event=note_delete module=note status=ok contact_id={} removed={}",
            contact_id, removed
        );
        Ok(removed)
    }
}
