use shelter_core::{
    doc, AnimalRepository, Bson, Document, DocumentValidationError, MemoryStore, RepoError,
};

fn seeded_repo() -> AnimalRepository<MemoryStore> {
    let repo = AnimalRepository::new(MemoryStore::new());
    repo.create(&doc! { "animal_type": "Dog", "name": "Rex" })
        .unwrap();
    repo.create(&doc! { "animal_type": "Cat", "name": "Milo" })
        .unwrap();
    repo
}

fn without_id(mut document: Document) -> Document {
    document.remove("_id");
    document
}

#[test]
fn create_then_read_all_includes_document_once() {
    let repo = AnimalRepository::new(MemoryStore::new());

    let id = repo
        .create(&doc! { "animal_id": "A746874", "name": "Rex" })
        .unwrap();
    assert!(matches!(id, Bson::ObjectId(_)));

    let all = repo.read(None, None).unwrap();
    let hits: Vec<_> = all
        .iter()
        .filter(|document| document.get("_id") == Some(&id))
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].get_str("name").unwrap(), "Rex");
}

#[test]
fn create_accepts_empty_document() {
    let repo = AnimalRepository::new(MemoryStore::new());

    let id = repo.create(&doc! {}).unwrap();
    assert!(matches!(id, Bson::ObjectId(_)));

    let stored = repo.read(None, None).unwrap();
    assert_eq!(stored, vec![doc! { "_id": id }]);
}

#[test]
fn read_with_filter_returns_only_matches() {
    let repo = seeded_repo();

    let dogs = repo.read(Some(&doc! { "animal_type": "Dog" }), None).unwrap();
    assert_eq!(dogs.len(), 1);
    assert_eq!(
        without_id(dogs[0].clone()),
        doc! { "animal_type": "Dog", "name": "Rex" }
    );
}

#[test]
fn read_without_match_is_empty_not_error() {
    let repo = seeded_repo();

    let birds = repo.read(Some(&doc! { "animal_type": "Bird" }), None).unwrap();
    assert!(birds.is_empty());
}

#[test]
fn read_applies_projection() {
    let repo = seeded_repo();

    let names = repo
        .read(None, Some(&doc! { "name": 1, "_id": 0 }))
        .unwrap();
    assert_eq!(names, vec![doc! { "name": "Rex" }, doc! { "name": "Milo" }]);
}

#[test]
fn update_sets_fields_on_every_match_and_keeps_others() {
    let repo = seeded_repo();
    repo.create(&doc! { "animal_type": "Dog", "name": "Bo", "breed": "Beagle" })
        .unwrap();

    let outcome = repo
        .update(&doc! { "animal_type": "Dog" }, &doc! { "outcome_type": "Adoption" })
        .unwrap();
    assert_eq!(outcome.matched, 2);
    assert_eq!(outcome.modified, 2);

    let bo = repo.find_one(Some(&doc! { "name": "Bo" })).unwrap().unwrap();
    assert_eq!(bo.get_str("breed").unwrap(), "Beagle");
    assert_eq!(bo.get_str("outcome_type").unwrap(), "Adoption");

    let milo = repo.find_one(Some(&doc! { "name": "Milo" })).unwrap().unwrap();
    assert!(milo.get("outcome_type").is_none());
}

#[test]
fn repeated_update_leaves_same_values() {
    let repo = seeded_repo();
    let filter = doc! { "animal_type": "Dog" };
    let patch = doc! { "name": "Max" };

    let first = repo.update(&filter, &patch).unwrap();
    let after_first = repo.read(None, None).unwrap();
    let second = repo.update(&filter, &patch).unwrap();
    let after_second = repo.read(None, None).unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(first.matched, second.matched);
    assert_eq!(first.modified, 1);
    assert_eq!(second.modified, 0);
}

#[test]
fn delete_removes_all_matches_and_is_idempotent() {
    let repo = seeded_repo();
    repo.create(&doc! { "animal_type": "Cat", "name": "Luna" })
        .unwrap();

    assert_eq!(repo.delete(&doc! { "animal_type": "Cat" }).unwrap(), 2);
    assert_eq!(repo.delete(&doc! { "animal_type": "Cat" }).unwrap(), 0);
    assert_eq!(repo.count(None).unwrap(), 1);
}

#[test]
fn validation_errors_are_distinct_from_storage_errors() {
    let repo = seeded_repo();

    let reserved = repo.create(&doc! { "$set": { "name": "Max" } }).unwrap_err();
    assert!(matches!(
        reserved,
        RepoError::Validation(DocumentValidationError::ReservedFieldName(name)) if name == "$set"
    ));

    let patch = repo
        .update(&doc! { "name": "Rex" }, &doc! {})
        .unwrap_err();
    assert!(matches!(
        patch,
        RepoError::Validation(DocumentValidationError::EmptyPatch)
    ));

    let projection = repo
        .read(None, Some(&doc! { "name": "include" }))
        .unwrap_err();
    assert!(projection.is_validation());

    let storage = repo
        .delete(&doc! { "name": { "$elemMatch": { "x": 1 } } })
        .unwrap_err();
    assert!(matches!(storage, RepoError::Db(_)));
    assert_eq!(repo.count(None).unwrap(), 2);
}

#[test]
fn duplicate_id_is_a_storage_error() {
    let repo = AnimalRepository::new(MemoryStore::new());
    repo.create(&doc! { "_id": "A1", "name": "Rex" }).unwrap();

    let err = repo.create(&doc! { "_id": "A1", "name": "Max" }).unwrap_err();
    assert!(!err.is_validation());
    assert_eq!(err.kind(), "db");
}

#[test]
fn end_to_end_dog_and_cat_scenario() {
    let repo = seeded_repo();

    let dogs = repo.read(Some(&doc! { "animal_type": "Dog" }), None).unwrap();
    assert_eq!(dogs.len(), 1);
    assert_eq!(dogs[0].get_str("name").unwrap(), "Rex");

    let outcome = repo
        .update(&doc! { "animal_type": "Dog" }, &doc! { "name": "Max" })
        .unwrap();
    assert_eq!(outcome.modified, 1);
    let dogs = repo.read(Some(&doc! { "animal_type": "Dog" }), None).unwrap();
    assert_eq!(dogs[0].get_str("name").unwrap(), "Max");

    assert_eq!(repo.delete(&doc! { "animal_type": "Cat" }).unwrap(), 1);

    let remaining = repo.read(Some(&doc! {}), None).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        without_id(remaining[0].clone()),
        doc! { "animal_type": "Dog", "name": "Max" }
    );
}

#[test]
fn repository_can_borrow_a_store() {
    let store = MemoryStore::new();
    {
        let repo = AnimalRepository::new(&store);
        repo.create(&doc! { "name": "Rex" }).unwrap();
    }
    assert_eq!(store.len(), 1);
}
