//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist user notes in the `notes` table.
//! - Provide lookup by owning contact, used by the save and delete paths.
//!
//! # Invariants
//! - Lookups by `contactId` assume at most one match; if duplicates exist the
//!   lowest note id is returned.
//! - Inserting a note that already carries an id replaces that row.
//! - `update_note` reports `NoteNotFound` when no row matched.

use super::{ensure_table_ready, RepoError, RepoResult};
use crate::model::contact::ContactId;
use crate::model::note::{Note, NoteId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT id, description, contactId FROM notes";

/// Repository interface for the note association store.
pub trait NoteRepository {
    /// Full snapshot of the note table in storage order.
    fn get_all_notes(&self) -> RepoResult<Vec<Note>>;
    fn get_note_by_contact_id(&self, contact_id: ContactId) -> RepoResult<Option<Note>>;
    /// Resolves only the identity, to choose between create and update.
    fn get_note_id_by_contact_id(&self, contact_id: ContactId) -> RepoResult<Option<NoteId>>;
    /// Persists a note and returns its storage identity.
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Inserts or replaces all given notes in one transaction.
    fn insert_all_notes(&self, notes: &[Note]) -> RepoResult<usize>;
    /// Overwrites the row matching `note.id`.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Removes the row matching `note.id`. Returns `false` when nothing matched.
    fn delete_note(&self, note: &Note) -> RepoResult<bool>;
    /// Removes every note owned by `contact_id`, duplicates included.
    ///
    /// Returns the number of rows removed.
    fn delete_notes_by_contact_id(&self, contact_id: ContactId) -> RepoResult<usize>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "notes", &["id", "description", "contactId"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn get_all_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_note_by_contact_id(&self, contact_id: ContactId) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE contactId = ?1
             ORDER BY id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([contact_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn get_note_id_by_contact_id(&self, contact_id: ContactId) -> RepoResult<Option<NoteId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id
                 FROM notes
                 WHERE contactId = ?1
                 ORDER BY id ASC
                 LIMIT 1;",
                [contact_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        insert_note_row(self.conn, note)
    }

    fn insert_all_notes(&self, notes: &[Note]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for note in notes {
            insert_note_row(&tx, note)?;
        }
        tx.commit()?;
        Ok(notes.len())
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        let id = note
            .id
            .ok_or(RepoError::InvalidInput("note id is required for update"))?;
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                description = ?2,
                contactId = ?3
             WHERE id = ?1;",
            params![id, note.description.as_str(), note.contact_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }

        Ok(())
    }

    fn delete_note(&self, note: &Note) -> RepoResult<bool> {
        let Some(id) = note.id else {
            return Ok(false);
        };
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_notes_by_contact_id(&self, contact_id: ContactId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE contactId = ?1;", [contact_id])?;
        Ok(changed)
    }
}

fn insert_note_row(conn: &Connection, note: &Note) -> RepoResult<NoteId> {
    match note.id {
        Some(id) => {
            conn.execute(
                "INSERT OR REPLACE INTO notes (id, description, contactId)
                 VALUES (?1, ?2, ?3);",
                params![id, note.description.as_str(), note.contact_id],
            )?;
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO notes (description, contactId) VALUES (?1, ?2);",
                params![note.description.as_str(), note.contact_id],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: NoteId = row.get("id")?;
    let description: Option<String> = row.get("description")?;
    let description = description.ok_or_else(|| {
        RepoError::InvalidData(format!("missing description for note {id} in notes.description"))
    })?;
    let contact_id: Option<ContactId> = row.get("contactId")?;
    let contact_id = contact_id.ok_or_else(|| {
        RepoError::InvalidData(format!("missing contact for note {id} in notes.contactId"))
    })?;

    Ok(Note {
        id: Some(id),
        description,
        contact_id,
    })
}
