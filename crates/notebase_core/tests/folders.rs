use notebase_core::db::open_db_in_memory;
use notebase_core::{
    FolderService, FolderServiceError, NewNote, NoteService, SqliteFolderRepository,
    SqliteNoteRepository,
};

#[test]
fn create_folder_trims_and_stamps() {
    let conn = open_db_in_memory().unwrap();
    let service = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());

    let folder = service.create_folder("  Projects ").unwrap();
    assert_eq!(folder.name, "Projects");
    assert!(folder.created_at.ends_with('Z'));
    assert_eq!(service.get_folder("Projects").unwrap(), Some(folder));
}

#[test]
fn duplicate_folder_is_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let service = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());
    service.create_folder("home").unwrap();

    let err = service.create_folder("home").unwrap_err();
    assert!(matches!(err, FolderServiceError::ConstraintViolation(_)));
    assert_eq!(service.list_folders().unwrap().len(), 1);
}

#[test]
fn blank_folder_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());

    let err = service.create_folder(" ").unwrap_err();
    assert!(matches!(err, FolderServiceError::InvalidName));
}

#[test]
fn list_folders_counts_notes_by_name() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let notes = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
        notes
            .create_note(NewNote::new("One", "").with_folder("work"))
            .unwrap();
        notes
            .create_note(NewNote::new("Two", "").with_folder("work"))
            .unwrap();
        notes
            .create_note(NewNote::new("Loose", "").with_folder("unregistered"))
            .unwrap();
    }

    let service = FolderService::new(SqliteFolderRepository::try_new(&conn).unwrap());
    service.create_folder("work").unwrap();
    service.create_folder("archive").unwrap();

    let folders = service.list_folders().unwrap();
    let summary = folders
        .iter()
        .map(|entry| (entry.folder.name.as_str(), entry.note_count))
        .collect::<Vec<_>>();
    assert_eq!(summary, vec![("archive", 0), ("work", 2)]);
}
