use contactnote_core::db::open_db_in_memory;
use contactnote_core::{
    Contact, ContactRepository, Note, NoteRepository, NoteService, RepoError, SaveOutcome,
    SqliteContactRepository, SqliteNoteRepository,
};
use rusqlite::Connection;

fn seed_contacts(conn: &Connection) {
    SqliteContactRepository::try_new(conn)
        .unwrap()
        .upsert_contacts(&[
            Contact::new(1, Some("Ann".to_string()), "555-0100"),
            Contact::new(2, Some("Bo".to_string()), "555-0101"),
        ])
        .unwrap();
}

#[test]
fn saving_twice_keeps_one_note_per_contact() {
    let conn = open_db_in_memory().unwrap();
    seed_contacts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let first = service.save_note(1, "call back").unwrap();
    assert_eq!(first.outcome, SaveOutcome::Created);
    let second = service.save_note(1, "called, all good").unwrap();
    assert_eq!(second.outcome, SaveOutcome::Updated);
    assert_eq!(second.note.id, first.note.id);

    let notes = service.get_all_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].description, "called, all good");
    assert_eq!(notes[0].contact_id, 1);
}

#[test]
fn ann_and_bo_notes_stay_independent() {
    let conn = open_db_in_memory().unwrap();
    seed_contacts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    service.save_note(1, "birthday in May").unwrap();
    service.save_note(2, "owes lunch").unwrap();
    service.save_note(1, "birthday May 4").unwrap();

    let ann = service.get_note_by_contact_id(1).unwrap().unwrap();
    let bo = service.get_note_by_contact_id(2).unwrap().unwrap();
    assert_eq!(ann.description, "birthday May 4");
    assert_eq!(bo.description, "owes lunch");
    assert_ne!(ann.id, bo.id);
    assert_eq!(service.get_all_notes().unwrap().len(), 2);
}

#[test]
fn lookup_for_contact_without_note_is_absent() {
    let conn = open_db_in_memory().unwrap();
    seed_contacts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    assert_eq!(service.get_note_by_contact_id(2).unwrap(), None);
    assert_eq!(service.get_note_id_by_contact_id(2).unwrap(), None);
    assert!(!service.delete_note_for_contact(2).unwrap());
}

#[test]
fn duplicate_rows_resolve_to_lowest_id_and_save_updates_it() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    repo.insert_all_notes(&[
        Note::with_id(10, 1, "older"),
        Note::with_id(11, 1, "newer"),
    ])
    .unwrap();

    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    assert_eq!(service.get_note_id_by_contact_id(1).unwrap(), Some(10));

    let saved = service.save_note(1, "merged").unwrap();
    assert_eq!(saved.note.id, Some(10));
    let stored = repo.get_all_notes().unwrap();
    assert_eq!(stored[0].description, "merged");
    assert_eq!(stored[1].description, "newer");
}

#[test]
fn update_without_existing_row_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let err = repo.update_note(&Note::with_id(99, 1, "ghost")).unwrap_err();
    assert!(matches!(err, RepoError::NoteNotFound(99)));

    let err = repo.update_note(&Note::new(1, "unsaved")).unwrap_err();
    assert!(matches!(err, RepoError::InvalidInput(_)));
}

#[test]
fn note_serializes_contact_id_with_schema_name() {
    let note = Note::with_id(3, 1, "hi");
    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["contactId"], 1);
    assert_eq!(json["description"], "hi");

    let decoded: Note = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, note);
}

#[test]
fn imported_contacts_with_saved_and_resaved_note() {
    let conn = open_db_in_memory().unwrap();
    seed_contacts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    service.save_note(1, "call back").unwrap();
    assert_eq!(
        service.get_all_notes().unwrap(),
        vec![Note::with_id(1, 1, "call back")]
    );
    assert_eq!(service.get_note_by_contact_id(2).unwrap(), None);

    service.save_note(1, "urgent").unwrap();
    assert_eq!(
        service.get_all_notes().unwrap(),
        vec![Note::with_id(1, 1, "urgent")]
    );
}
