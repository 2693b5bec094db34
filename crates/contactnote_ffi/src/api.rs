//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose contacts/notes use-cases to Dart via FRB.
//! - Hold the process-wide import gate so import runs once per app session.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through `ok=false` envelopes, never by throwing.
//! - The host owns the address book; rows are passed in, never read here.

use contactnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_from_config, ping as ping_inner,
    ContactEntry, ContactPermission, ContactRepository, ContactService, CoreConfig, ImportError,
    ImportService, ImportSession, ImportStatus, NoteRepository, NoteService, SaveOutcome,
    SessionError, Snapshot, SourceContact, SqliteContactRepository, SqliteNoteRepository,
    StaticContactSource, StaticPermissionGate, StorageHandle,
};
use log::error;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

static FFI_CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static IMPORT_SESSION: Lazy<Mutex<ImportSession>> =
    Lazy::new(|| Mutex::new(ImportSession::new()));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Initializes logging from `CONTACTNOTE_LOG_LEVEL` / `CONTACTNOTE_LOG_DIR`.
///
/// # FFI contract
/// - No-op (empty string) when `CONTACTNOTE_LOG_DIR` is unset.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging_from_env() -> String {
    logging_init_message(resolve_config())
}

/// One address-book row read by the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiContactRow {
    pub id: i64,
    pub name: Option<String>,
    pub phone: String,
}

/// Outcome of an import request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsImportResponse {
    pub ok: bool,
    /// `imported|already_imported|permission_required|deferred|failed`.
    pub status: String,
    /// Permission the host must request next (`read_contacts|write_contacts`).
    pub permission: Option<String>,
    /// Rows written by this call; zero unless `status == "imported"`.
    pub imported: u32,
    pub message: String,
}

impl ContactsImportResponse {
    fn from_status(status: ImportStatus) -> Self {
        let (label, permission, imported, message) = match status {
            ImportStatus::Imported(report) => (
                "imported",
                None,
                u32::try_from(report.imported).unwrap_or(u32::MAX),
                format!("Imported {} contact(s).", report.imported),
            ),
            ImportStatus::AlreadyImported => (
                "already_imported",
                None,
                0,
                "Contacts already imported this session.".to_string(),
            ),
            ImportStatus::PermissionRequired(permission) => (
                "permission_required",
                Some(permission),
                0,
                format!("Permission `{}` required.", permission.as_str()),
            ),
            ImportStatus::Deferred(permission) => (
                "deferred",
                Some(permission),
                0,
                format!("Import deferred: `{}` denied.", permission.as_str()),
            ),
        };
        Self {
            ok: true,
            status: label.to_string(),
            permission: permission.map(|value| value.as_str().to_string()),
            imported,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: "failed".to_string(),
            permission: None,
            imported: 0,
            message: message.into(),
        }
    }
}

/// Contact row joined with its note for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListItem {
    pub contact_id: i64,
    pub name: String,
    pub phone: String,
    pub note_id: Option<i64>,
    pub note: Option<String>,
}

/// Contact list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsListResponse {
    pub ok: bool,
    pub items: Vec<ContactListItem>,
    pub message: String,
}

/// Note save/delete envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    pub ok: bool,
    /// Stored note id after save; `None` on delete or failure.
    pub note_id: Option<i64>,
    /// `true` when the call inserted a new row rather than overwriting.
    pub created: bool,
    /// `true` when a delete actually removed a row.
    pub removed: bool,
    pub message: String,
}

impl NoteActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            created: false,
            removed: false,
            message: message.into(),
        }
    }
}

/// Contact delete envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDeleteResponse {
    pub ok: bool,
    pub contact_removed: bool,
    pub note_removed: bool,
    pub message: String,
}

/// Imports host-provided rows when both contact permissions are granted.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Runs at most once successfully per process; later calls report
///   `already_imported`.
/// - A missing permission yields `ok=true`, `status=permission_required`.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_import(
    rows: Vec<FfiContactRow>,
    read_granted: bool,
    write_granted: bool,
) -> ContactsImportResponse {
    let gate = StaticPermissionGate::new(read_granted, write_granted);
    with_import_session(|session| {
        import_at(&resolve_db_path(), session, rows, |session, pipeline| {
            session.start(&gate, pipeline)
        })
    })
}

/// Host permission callback; imports on grant.
///
/// `permission` is `read_contacts` or `write_contacts`.
///
/// # FFI contract
/// - Denial yields `ok=true`, `status=deferred`; nothing is retried.
/// - Unknown permission ids yield `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_on_permission_result(
    permission: String,
    granted: bool,
    rows: Vec<FfiContactRow>,
) -> ContactsImportResponse {
    let Some(permission) = ContactPermission::parse(&permission) else {
        return ContactsImportResponse::failure(format!(
            "contacts_on_permission_result failed: unknown permission `{}`",
            permission.trim()
        ));
    };
    with_import_session(|session| {
        import_at(&resolve_db_path(), session, rows, |session, pipeline| {
            session.on_permission_result(permission, granted, pipeline)
        })
    })
}

/// Lists stored contacts joined with their note.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_list() -> ContactsListResponse {
    contacts_list_at(&resolve_db_path())
}

/// Saves the contact's note, updating the existing one in place.
///
/// # FFI contract
/// - Never creates a second note for the same contact.
/// - Returns the stored note id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn note_save(contact_id: i64, description: String) -> NoteActionResponse {
    note_save_at(&resolve_db_path(), contact_id, description)
}

/// Deletes the contact's note; succeeds with `removed=false` when absent.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(contact_id: i64) -> NoteActionResponse {
    note_delete_at(&resolve_db_path(), contact_id)
}

/// Deletes the contact and its note in one transaction.
///
/// Deleting an absent contact succeeds with both flags `false`.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete(contact_id: i64) -> ContactDeleteResponse {
    contact_delete_at(&resolve_db_path(), contact_id)
}

type Pipeline<'conn> = ImportService<StaticContactSource, SqliteContactRepository<'conn>>;

fn import_at(
    db_path: &Path,
    session: &mut ImportSession,
    rows: Vec<FfiContactRow>,
    run: impl FnOnce(&mut ImportSession, &Pipeline<'_>) -> Result<ImportStatus, ImportError>,
) -> ContactsImportResponse {
    let source = StaticContactSource::new(rows.into_iter().map(to_source_contact).collect());
    let result = with_storage(db_path, |conn| {
        let pipeline = ImportService::new(source, SqliteContactRepository::try_new(conn)?);
        Ok(run(session, &pipeline)?)
    });
    match result {
        Ok(status) => ContactsImportResponse::from_status(status),
        Err(err) => ContactsImportResponse::failure(format!("contacts_import failed: {err}")),
    }
}

fn contacts_list_at(db_path: &Path) -> ContactsListResponse {
    let result = with_storage(db_path, |conn| {
        let contacts = SqliteContactRepository::try_new(conn)?.get_all_contacts()?;
        let notes = SqliteNoteRepository::try_new(conn)?.get_all_notes()?;
        Ok(Snapshot::new(contacts, notes).entries())
    });
    match result {
        Ok(entries) => {
            let items = entries.into_iter().map(to_list_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No contacts.".to_string()
            } else {
                format!("Found {} contact(s).", items.len())
            };
            ContactsListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => ContactsListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("contacts_list failed: {err}"),
        },
    }
}

fn note_save_at(db_path: &Path, contact_id: i64, description: String) -> NoteActionResponse {
    let result = with_storage(db_path, |conn| {
        let service = NoteService::new(SqliteNoteRepository::try_new(conn)?);
        Ok(service.save_note(contact_id, description)?)
    });
    match result {
        Ok(saved) => {
            let created = saved.outcome == SaveOutcome::Created;
            NoteActionResponse {
                ok: true,
                note_id: saved.note.id,
                created,
                removed: false,
                message: if created {
                    "Note created.".to_string()
                } else {
                    "Note updated.".to_string()
                },
            }
        }
        Err(err) => NoteActionResponse::failure(format!("note_save failed: {err}")),
    }
}

fn note_delete_at(db_path: &Path, contact_id: i64) -> NoteActionResponse {
    let result = with_storage(db_path, |conn| {
        let service = NoteService::new(SqliteNoteRepository::try_new(conn)?);
        Ok(service.delete_note_for_contact(contact_id)?)
    });
    match result {
        Ok(removed) => NoteActionResponse {
            ok: true,
            note_id: None,
            created: false,
            removed,
            message: if removed {
                "Note deleted.".to_string()
            } else {
                "No note to delete.".to_string()
            },
        },
        Err(err) => NoteActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

fn contact_delete_at(db_path: &Path, contact_id: i64) -> ContactDeleteResponse {
    let result = with_storage(db_path, |conn| {
        Ok(ContactService::try_new(conn)?.delete_contact(contact_id)?)
    });
    match result {
        Ok(outcome) => ContactDeleteResponse {
            ok: true,
            contact_removed: outcome.contact_removed,
            note_removed: outcome.note_removed,
            message: if outcome.contact_removed {
                "Contact deleted.".to_string()
            } else {
                "Contact not found.".to_string()
            },
        },
        Err(err) => ContactDeleteResponse {
            ok: false,
            contact_removed: false,
            note_removed: false,
            message: format!("contact_delete failed: {err}"),
        },
    }
}

fn with_import_session(
    f: impl FnOnce(&mut ImportSession) -> ContactsImportResponse,
) -> ContactsImportResponse {
    match IMPORT_SESSION.lock() {
        Ok(mut session) => f(&mut session),
        Err(_) => {
            error!("event=contacts_import module=ffi status=error error_code=import_gate_poisoned");
            ContactsImportResponse::failure("contacts_import failed: import gate poisoned")
        }
    }
}

fn with_storage<T>(
    db_path: &Path,
    work: impl FnOnce(&contactnote_core::db::Connection) -> Result<T, SessionError>,
) -> Result<T, SessionError> {
    let storage = StorageHandle::open(db_path)?;
    storage.with_conn(work)
}

fn resolve_db_path() -> PathBuf {
    resolve_config().db_path.clone()
}

fn resolve_config() -> &'static CoreConfig {
    FFI_CONFIG.get_or_init(|| {
        let config = CoreConfig::from_env();
        // Conflicts with an explicit `init_logging` call surface through
        // `init_logging_from_env`; storage calls proceed regardless.
        let _ = init_logging_from_config(&config);
        config
    })
}

fn logging_init_message(config: &CoreConfig) -> String {
    match init_logging_from_config(config) {
        Ok(_) => String::new(),
        Err(err) => err,
    }
}

fn to_source_contact(row: FfiContactRow) -> SourceContact {
    SourceContact {
        id: row.id,
        display_name: row.name,
        phone_number: row.phone,
    }
}

fn to_list_item(entry: ContactEntry) -> ContactListItem {
    ContactListItem {
        contact_id: entry.contact.id,
        name: entry.contact.display_name().to_string(),
        phone: entry.contact.phone,
        note_id: entry.note.as_ref().and_then(|note| note.id),
        note: entry.note.map(|note| note.description),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        contact_delete_at, contacts_list_at, core_version, import_at, init_logging,
        logging_init_message, note_delete_at, note_save_at, ping, FfiContactRow,
    };
    use contactnote_core::{ContactPermission, CoreConfig, ImportSession, StaticPermissionGate};
    use std::path::PathBuf;

    fn rows() -> Vec<FfiContactRow> {
        vec![
            FfiContactRow {
                id: 1,
                name: Some("Ann".to_string()),
                phone: "555-0100".to_string(),
            },
            FfiContactRow {
                id: 2,
                name: None,
                phone: "555-0101".to_string(),
            },
        ]
    }

    fn temp_db() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffi.sqlite3");
        (dir, path)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn env_logging_without_dir_is_noop() {
        let config = CoreConfig::from_lookup(|_| None);
        assert_eq!(logging_init_message(&config), "");
    }

    #[test]
    fn env_logging_rejects_relative_dir() {
        let config = CoreConfig::from_lookup(|key| {
            (key == "CONTACTNOTE_LOG_DIR").then(|| "relative/logs".to_string())
        });
        assert!(logging_init_message(&config).contains("absolute"));
    }

    #[test]
    fn import_reports_missing_permission_then_imports_once() {
        let (_dir, db_path) = temp_db();
        let mut session = ImportSession::new();

        let denied_gate = StaticPermissionGate::new(false, false);
        let response = import_at(&db_path, &mut session, rows(), |session, pipeline| {
            session.start(&denied_gate, pipeline)
        });
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.status, "permission_required");
        assert_eq!(response.permission.as_deref(), Some("read_contacts"));

        let response = import_at(&db_path, &mut session, rows(), |session, pipeline| {
            session.on_permission_result(ContactPermission::Read, true, pipeline)
        });
        assert_eq!(response.status, "imported");
        assert_eq!(response.imported, 2);

        let gate = StaticPermissionGate::all_granted();
        let response = import_at(&db_path, &mut session, rows(), |session, pipeline| {
            session.start(&gate, pipeline)
        });
        assert_eq!(response.status, "already_imported");
        assert_eq!(response.imported, 0);
    }

    #[test]
    fn denial_is_deferred_not_failed() {
        let (_dir, db_path) = temp_db();
        let mut session = ImportSession::new();
        let response = import_at(&db_path, &mut session, rows(), |session, pipeline| {
            session.on_permission_result(ContactPermission::Write, false, pipeline)
        });
        assert!(response.ok);
        assert_eq!(response.status, "deferred");
        assert_eq!(response.permission.as_deref(), Some("write_contacts"));
        assert!(contacts_list_at(&db_path).items.is_empty());
    }

    #[test]
    fn note_save_updates_in_place_and_list_joins_notes() {
        let (_dir, db_path) = temp_db();
        let mut session = ImportSession::new();
        let gate = StaticPermissionGate::all_granted();
        import_at(&db_path, &mut session, rows(), |session, pipeline| {
            session.start(&gate, pipeline)
        });

        let created = note_save_at(&db_path, 1, "call back".to_string());
        assert!(created.ok, "{}", created.message);
        assert!(created.created);
        let updated = note_save_at(&db_path, 1, "called".to_string());
        assert!(!updated.created);
        assert_eq!(updated.note_id, created.note_id);

        let list = contacts_list_at(&db_path);
        assert!(list.ok, "{}", list.message);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].note.as_deref(), Some("called"));
        assert_eq!(list.items[1].name, "");
        assert_eq!(list.items[1].note, None);
    }

    #[test]
    fn deletes_are_idempotent() {
        let (_dir, db_path) = temp_db();
        let mut session = ImportSession::new();
        let gate = StaticPermissionGate::all_granted();
        import_at(&db_path, &mut session, rows(), |session, pipeline| {
            session.start(&gate, pipeline)
        });
        note_save_at(&db_path, 2, "gift".to_string());

        let removed = note_delete_at(&db_path, 2);
        assert!(removed.ok && removed.removed);
        let again = note_delete_at(&db_path, 2);
        assert!(again.ok && !again.removed);

        note_save_at(&db_path, 1, "x".to_string());
        let deleted = contact_delete_at(&db_path, 1);
        assert!(deleted.ok && deleted.contact_removed && deleted.note_removed);
        let repeat = contact_delete_at(&db_path, 1);
        assert!(repeat.ok && !repeat.contact_removed && !repeat.note_removed);
        assert_eq!(contacts_list_at(&db_path).items.len(), 1);
    }
}
