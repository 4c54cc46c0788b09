use notebase_core::{
    NewNote, NoteKey, NoteQuery, NoteServiceError, NoteStore, SearchField,
};
use std::sync::Arc;
use std::thread;

#[test]
fn store_reopens_file_with_persisted_notes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    {
        let store = NoteStore::open(&path).unwrap();
        store
            .with_notes(|notes| {
                let note = notes.create_note(NewNote::new("Persisted", "body"))?;
                notes.add_tags(note.id, &["kept".to_string()])
            })
            .unwrap();
        store
            .with_folders(|folders| folders.create_folder("home"))
            .unwrap();
    }

    let store = NoteStore::open(&path).unwrap();
    let note = store
        .with_notes(|notes| notes.require_note(&NoteKey::Title("Persisted".to_string())))
        .unwrap();
    assert_eq!(note.tags, vec!["kept".to_string()]);
    let folders = store.with_folders(|folders| folders.list_folders()).unwrap();
    assert_eq!(folders.len(), 1);
}

#[test]
fn closure_errors_pass_through_unchanged() {
    let store = NoteStore::open_in_memory().unwrap();
    let err = store
        .with_notes(|notes| notes.delete_note(42))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(NoteKey::Id(42))));
}

#[test]
fn concurrent_writers_are_serialized() {
    let store = Arc::new(NoteStore::open_in_memory().unwrap());
    let handles = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for index in 0..5 {
                    store
                        .with_notes(|notes| {
                            notes.create_note(NewNote::new(
                                format!("w{worker}-n{index}"),
                                "parallel",
                            ))
                        })
                        .unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let found = store
        .with_notes(|notes| {
            notes.search_notes(&NoteQuery::text("parallel").in_fields([SearchField::Content]))
        })
        .unwrap();
    assert_eq!(found.len(), 20);
}
