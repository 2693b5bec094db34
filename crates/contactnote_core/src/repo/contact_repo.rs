//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Mirror device contacts into the local `contacts` table.
//! - Provide the bulk upsert used by the import pipeline.
//!
//! # Invariants
//! - `id` is the source identity; writes never generate contact ids.
//! - `upsert_contacts` is all-or-nothing: one immediate transaction.
//! - Deleting a contact never touches the device address book.

use super::{ensure_table_ready, RepoError, RepoResult};
use crate::model::contact::{Contact, ContactId};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CONTACT_SELECT_SQL: &str = "SELECT id, name, phone FROM contacts";
const CONTACT_UPSERT_SQL: &str =
    "INSERT OR REPLACE INTO contacts (id, name, phone) VALUES (?1, ?2, ?3);";

/// Repository interface for the local contact mirror.
pub trait ContactRepository {
    /// Returns every mirrored contact ordered by id.
    fn get_all_contacts(&self) -> RepoResult<Vec<Contact>>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// Inserts or replaces all given contacts keyed by id, atomically.
    ///
    /// Returns the number of rows written.
    fn upsert_contacts(&self, contacts: &[Contact]) -> RepoResult<usize>;
    /// Inserts or replaces one contact keyed by id.
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    fn update_contact(&self, contact: &Contact) -> RepoResult<()>;
    /// Removes the local mirror row. Returns `false` when nothing matched.
    fn delete_contact(&self, id: ContactId) -> RepoResult<bool>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "contacts", &["id", "name", "phone"])?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn get_all_contacts(&self) -> RepoResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }
        Ok(None)
    }

    fn upsert_contacts(&self, contacts: &[Contact]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(CONTACT_UPSERT_SQL)?;
            for contact in contacts {
                stmt.execute(params![
                    contact.id,
                    contact.name.as_deref(),
                    contact.phone.as_str()
                ])?;
            }
        }
        tx.commit()?;
        Ok(contacts.len())
    }

    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        self.conn.execute(
            CONTACT_UPSERT_SQL,
            params![contact.id, contact.name.as_deref(), contact.phone.as_str()],
        )?;
        Ok(contact.id)
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE contacts SET name = ?2, phone = ?3 WHERE id = ?1;",
            params![contact.id, contact.name.as_deref(), contact.phone.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::ContactNotFound(contact.id));
        }

        Ok(())
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let id: ContactId = row.get("id")?;
    let phone: Option<String> = row.get("phone")?;
    let phone = phone.ok_or_else(|| {
        RepoError::InvalidData(format!("missing phone for contact {id} in contacts.phone"))
    })?;

    Ok(Contact {
        id,
        name: row.get("name")?,
        phone,
    })
}

#[cfg(test)]
mod tests {
    use super::{ContactRepository, SqliteContactRepository};
    use crate::db::open_db_in_memory;
    use crate::model::contact::Contact;
    use crate::repo::RepoError;

    fn ann() -> Contact {
        Contact::new(1, Some("Ann".to_string()), "555-0100")
    }

    #[test]
    fn upsert_replaces_existing_rows_by_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteContactRepository::try_new(&conn).unwrap();

        repo.upsert_contacts(&[ann()]).unwrap();
        let renamed = Contact::new(1, Some("Annie".to_string()), "555-0109");
        repo.upsert_contacts(&[renamed.clone()]).unwrap();

        assert_eq!(repo.get_all_contacts().unwrap(), vec![renamed]);
    }

    #[test]
    fn update_missing_contact_returns_not_found() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteContactRepository::try_new(&conn).unwrap();

        let err = repo.update_contact(&ann()).unwrap_err();
        assert!(matches!(err, RepoError::ContactNotFound(1)));
    }

    #[test]
    fn null_phone_is_rejected_on_read() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO contacts (id, name, phone) VALUES (9, 'Ghost', NULL);",
            [],
        )
        .unwrap();
        let repo = SqliteContactRepository::try_new(&conn).unwrap();

        let err = repo.get_contact(9).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn delete_reports_whether_a_row_matched() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteContactRepository::try_new(&conn).unwrap();
        repo.insert_contact(&ann()).unwrap();

        assert!(repo.delete_contact(1).unwrap());
        assert!(!repo.delete_contact(1).unwrap());
        assert!(repo.get_contact(1).unwrap().is_none());
    }
}
