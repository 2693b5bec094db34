use contactnote_core::db::open_db_in_memory;
use contactnote_core::source::contact_source::SourceResult;
use contactnote_core::{
    Contact, ContactPermission, ContactRepository, ContactSource, ImportError, ImportService,
    ImportSession, ImportStatus, SourceContact, SourceError, SqliteContactRepository,
    StaticContactSource, StaticPermissionGate,
};

struct OfflineSource;

impl ContactSource for OfflineSource {
    fn read_contacts(&self) -> SourceResult<Vec<SourceContact>> {
        Err(SourceError::Unavailable("address book locked".to_string()))
    }
}

fn ann_and_bo() -> StaticContactSource {
    StaticContactSource::from_tuples([(1, Some("Ann"), "555-0100"), (2, Some("Bo"), "555-0101")])
}

#[test]
fn import_mirrors_source_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();
    let report = ImportService::new(ann_and_bo(), repo).import_contacts().unwrap();
    assert_eq!(report.imported, 2);

    let contacts = SqliteContactRepository::try_new(&conn)
        .unwrap()
        .get_all_contacts()
        .unwrap();
    assert_eq!(
        contacts,
        vec![
            Contact::new(1, Some("Ann".to_string()), "555-0100"),
            Contact::new(2, Some("Bo".to_string()), "555-0101"),
        ]
    );
}

#[test]
fn reimporting_unchanged_source_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let source = ann_and_bo();

    ImportService::new(&source, SqliteContactRepository::try_new(&conn).unwrap())
        .import_contacts()
        .unwrap();
    let first = SqliteContactRepository::try_new(&conn)
        .unwrap()
        .get_all_contacts()
        .unwrap();

    ImportService::new(&source, SqliteContactRepository::try_new(&conn).unwrap())
        .import_contacts()
        .unwrap();
    let second = SqliteContactRepository::try_new(&conn)
        .unwrap()
        .get_all_contacts()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn reimport_refreshes_changed_fields_and_keeps_local_only_rows() {
    let conn = open_db_in_memory().unwrap();
    ImportService::new(ann_and_bo(), SqliteContactRepository::try_new(&conn).unwrap())
        .import_contacts()
        .unwrap();

    let renamed = StaticContactSource::from_tuples([(1, Some("Ann Lee"), "555-0199")]);
    ImportService::new(renamed, SqliteContactRepository::try_new(&conn).unwrap())
        .import_contacts()
        .unwrap();

    let repo = SqliteContactRepository::try_new(&conn).unwrap();
    let ann = repo.get_contact(1).unwrap().unwrap();
    assert_eq!(ann.name.as_deref(), Some("Ann Lee"));
    assert_eq!(ann.phone, "555-0199");
    // Full refresh by upsert only; rows missing from the source stay.
    assert!(repo.get_contact(2).unwrap().is_some());
}

#[test]
fn source_failure_propagates_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let err = ImportService::new(OfflineSource, SqliteContactRepository::try_new(&conn).unwrap())
        .import_contacts()
        .unwrap_err();
    assert!(matches!(err, ImportError::SourceRead(SourceError::Unavailable(_))));

    let repo = SqliteContactRepository::try_new(&conn).unwrap();
    assert!(repo.get_all_contacts().unwrap().is_empty());
}

#[test]
fn session_requests_read_then_write_before_importing() {
    let conn = open_db_in_memory().unwrap();
    let pipeline =
        ImportService::new(ann_and_bo(), SqliteContactRepository::try_new(&conn).unwrap());
    let mut session = ImportSession::new();

    let status = session
        .start(&StaticPermissionGate::new(false, false), &pipeline)
        .unwrap();
    assert_eq!(status, ImportStatus::PermissionRequired(ContactPermission::Read));

    let status = session
        .start(&StaticPermissionGate::new(true, false), &pipeline)
        .unwrap();
    assert_eq!(status, ImportStatus::PermissionRequired(ContactPermission::Write));

    let status = session
        .on_permission_result(ContactPermission::Write, true, &pipeline)
        .unwrap();
    assert!(matches!(status, ImportStatus::Imported(report) if report.imported == 2));
    assert!(session.is_imported());

    let status = session
        .start(&StaticPermissionGate::all_granted(), &pipeline)
        .unwrap();
    assert_eq!(status, ImportStatus::AlreadyImported);
}

#[test]
fn storage_fault_mid_import_leaves_contacts_unchanged() {
    let conn = open_db_in_memory().unwrap();
    SqliteContactRepository::try_new(&conn)
        .unwrap()
        .insert_contact(&Contact::new(1, Some("Old".to_string()), "555-0000"))
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_contact_three BEFORE INSERT ON contacts
         WHEN NEW.id = 3
         BEGIN
             SELECT RAISE(ABORT, 'rejected');
         END;",
    )
    .unwrap();

    let source = StaticContactSource::from_tuples([
        (1, Some("New"), "555-0100"),
        (2, Some("Bo"), "555-0101"),
        (3, Some("Cy"), "555-0102"),
    ]);
    let err = ImportService::new(source, SqliteContactRepository::try_new(&conn).unwrap())
        .import_contacts()
        .unwrap_err();
    assert!(matches!(err, ImportError::Storage(_)));

    let contacts = SqliteContactRepository::try_new(&conn)
        .unwrap()
        .get_all_contacts()
        .unwrap();
    assert_eq!(
        contacts,
        vec![Contact::new(1, Some("Old".to_string()), "555-0000")]
    );
}
