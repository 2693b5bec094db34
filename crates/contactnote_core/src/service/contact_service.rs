//! Contact use-case service.
//!
//! # Responsibility
//! - List the local contact mirror.
//! - Delete a contact together with its note.
//!
//! # Invariants
//! - Note and contact deletes commit together or not at all.
//! - No note row survives its contact's delete, duplicates included.
//! - Deleting an absent contact is a no-op, not an error.

use crate::model::contact::{Contact, ContactId};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::RepoResult;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// What a contact delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub contact_removed: bool,
    pub note_removed: bool,
}

/// SQLite-bound contact service.
///
/// Works on a connection instead of repository traits because the cascade
/// delete spans both tables in one transaction.
pub struct ContactService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ContactService<'conn> {
    /// Constructs the service after checking both tables are ready.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        SqliteContactRepository::try_new(conn)?;
        SqliteNoteRepository::try_new(conn)?;
        Ok(Self { conn })
    }

    pub fn get_all_contacts(&self) -> RepoResult<Vec<Contact>> {
        SqliteContactRepository::try_new(self.conn)?.get_all_contacts()
    }

    pub fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        SqliteContactRepository::try_new(self.conn)?.get_contact(id)
    }

    /// Deletes every note owned by the contact, then the contact row.
    pub fn delete_contact(&self, id: ContactId) -> RepoResult<DeleteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = {
            let notes = SqliteNoteRepository::try_new(&tx)?;
            let note_removed = notes.delete_notes_by_contact_id(id)? > 0;
            let contacts = SqliteContactRepository::try_new(&tx)?;
            let contact_removed = contacts.delete_contact(id)?;
            DeleteOutcome {
                contact_removed,
                note_removed,
            }
        };
        tx.commit()?;

        info!(
            "event=contact_delete module=contact status=ok contact_id={} contact_removed={} note_removed={}",
            id, outcome.contact_removed, outcome.note_removed
        );
        Ok(outcome)
    }
}
