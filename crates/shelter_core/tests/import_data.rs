use shelter_core::loader::{clear_collection, insert_table, summarize};
use shelter_core::{
    doc, import_table, read_table, Bson, CsvConfig, DocumentStore, LoadError, MemoryStore,
};
use std::fs;
use std::path::PathBuf;

fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn missing_cell_is_stored_as_empty_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "outcomes.csv",
        "animal_id,animal_type,name,age_upon_outcome_in_weeks\nA746874,Dog,,52.5\n",
    );

    let table = read_table(&path, &CsvConfig::default()).unwrap();
    let store = MemoryStore::new();
    let summary = import_table(&store, &table).unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.total, Some(1));

    let stored = store.find_one(&doc! { "animal_id": "A746874" }).unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&Bson::String(String::new())));
    assert_eq!(stored.get("age_upon_outcome_in_weeks"), Some(&Bson::Double(52.5)));
    for (_, value) in stored.iter() {
        assert_ne!(value, &Bson::String("NaN".to_string()));
        assert_ne!(value, &Bson::Null);
    }
}

#[test]
fn import_replaces_existing_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "outcomes.csv",
        "animal_type,name\nDog,Rex\nCat,Milo\nDog,Bo\n",
    );
    let store = MemoryStore::with_documents(vec![
        doc! { "animal_type": "Bird", "name": "Old" },
        doc! { "animal_type": "Bird", "name": "Older" },
    ])
    .unwrap();

    let table = read_table(&path, &CsvConfig::default()).unwrap();
    let summary = import_table(&store, &table).unwrap();

    assert_eq!(summary.cleared, 2);
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.total, Some(3));
    assert_eq!(store.count_documents(&doc! { "animal_type": "Bird" }).unwrap(), 0);

    let sample = summary.sample.unwrap();
    assert_eq!(sample.get_str("name").unwrap(), "Rex");
}

#[test]
fn header_only_file_clears_and_inserts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "empty.csv", "animal_type,name\n");
    let store = MemoryStore::with_documents(vec![doc! { "name": "Old" }]).unwrap();

    let table = read_table(&path, &CsvConfig::default()).unwrap();
    let summary = import_table(&store, &table).unwrap();

    assert_eq!(summary.cleared, 1);
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.total, Some(0));
    assert!(summary.sample.is_none());
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_table(dir.path().join("absent.csv"), &CsvConfig::default()).unwrap_err();

    match err {
        LoadError::Io { path, .. } => assert!(path.ends_with("absent.csv")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_insert_leaves_cleared_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "dupes.csv", "_id,name\n1,Rex\n1,Max\n");
    let store = MemoryStore::with_documents(vec![doc! { "name": "Old" }]).unwrap();

    let table = read_table(&path, &CsvConfig::default()).unwrap();
    assert_eq!(clear_collection(&store).unwrap(), 1);
    let err = insert_table(&store, &table).unwrap_err();
    assert!(matches!(err, LoadError::Db(_)));

    let (total, sample) = summarize(&store);
    assert_eq!(total, Some(1));
    assert_eq!(sample.unwrap().get_str("name").unwrap(), "Rex");
}
