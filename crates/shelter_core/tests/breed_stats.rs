use shelter_core::{doc, AnimalRepository, AnimalShelter, MemoryStore, TOP_BREEDS};

fn store_with_breeds(breeds: &[(&str, usize)]) -> MemoryStore {
    let store = MemoryStore::new();
    {
        let repo = AnimalRepository::new(&store);
        for (breed, copies) in breeds {
            for _ in 0..*copies {
                repo.create(&doc! { "animal_type": "Dog", "breed": *breed })
                    .unwrap();
            }
        }
    }
    store
}

fn owned(counts: &[(&str, u64)]) -> Vec<(String, u64)> {
    counts
        .iter()
        .map(|(breed, count)| (breed.to_string(), *count))
        .collect()
}

#[test]
fn most_common_breeds_come_first() {
    let repo = AnimalRepository::new(store_with_breeds(&[
        ("Beagle", 2),
        ("Pit Bull Mix", 5),
        ("Chihuahua Shorthair Mix", 3),
    ]));

    assert_eq!(
        repo.breed_counts(TOP_BREEDS).unwrap(),
        owned(&[
            ("Pit Bull Mix", 5),
            ("Chihuahua Shorthair Mix", 3),
            ("Beagle", 2),
        ])
    );
}

#[test]
fn equal_counts_are_ordered_by_breed_name() {
    let repo = AnimalRepository::new(store_with_breeds(&[
        ("Poodle", 2),
        ("Boxer", 2),
        ("Labrador Retriever", 4),
        ("Akita", 2),
    ]));

    assert_eq!(
        repo.breed_counts(TOP_BREEDS).unwrap(),
        owned(&[
            ("Labrador Retriever", 4),
            ("Akita", 2),
            ("Boxer", 2),
            ("Poodle", 2),
        ])
    );
}

#[test]
fn limit_keeps_only_the_top_breeds() {
    let breeds: Vec<(String, usize)> = (0..25)
        .map(|index| (format!("Breed {index:02}"), 30 - index))
        .collect();
    let borrowed: Vec<(&str, usize)> = breeds
        .iter()
        .map(|(breed, copies)| (breed.as_str(), *copies))
        .collect();
    let repo = AnimalRepository::new(store_with_breeds(&borrowed));

    let top = repo.breed_counts(TOP_BREEDS).unwrap();
    assert_eq!(top.len(), 20);
    assert_eq!(top[0], ("Breed 00".to_string(), 30));
    assert_eq!(top[19], ("Breed 19".to_string(), 11));

    let top_two = repo.breed_counts(2).unwrap();
    assert_eq!(top_two, owned(&[("Breed 00", 30), ("Breed 01", 29)]));

    assert!(repo.breed_counts(0).unwrap().is_empty());
}

#[test]
fn documents_without_breed_are_counted_under_empty_name() {
    let store = store_with_breeds(&[("Beagle", 1)]);
    let repo = AnimalRepository::new(&store);
    repo.create(&doc! { "animal_type": "Cat" }).unwrap();
    repo.create(&doc! { "animal_type": "Bird" }).unwrap();

    assert_eq!(
        repo.breed_counts(TOP_BREEDS).unwrap(),
        owned(&[("", 2), ("Beagle", 1)])
    );
}

#[test]
fn facade_returns_counts_or_empty() {
    let shelter = AnimalShelter::new(store_with_breeds(&[("Beagle", 2), ("Boxer", 1)]));
    assert_eq!(
        shelter.breed_counts(TOP_BREEDS),
        owned(&[("Beagle", 2), ("Boxer", 1)])
    );

    let empty = AnimalShelter::new(MemoryStore::new());
    assert!(empty.breed_counts(TOP_BREEDS).is_empty());
}
