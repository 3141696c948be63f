use shelter_core::{doc, AnimalShelter, Credentials, MemoryStore, RescueType};

fn shelter() -> AnimalShelter<MemoryStore> {
    AnimalShelter::new(MemoryStore::new())
}

#[test]
fn invalid_arguments_return_failure_defaults() {
    let shelter = shelter();
    assert!(shelter.create(&doc! { "name": "Rex" }));

    assert!(!shelter.create(&doc! { "$where": "1" }));
    assert!(!shelter.create(&doc! { "": "blank" }));
    assert_eq!(shelter.update(&doc! { "name": "Rex" }, &doc! {}), 0);
    assert_eq!(shelter.update(&doc! { "name": "Rex" }, &doc! { "_id": 5 }), 0);
    assert!(shelter.read(None, Some(&doc! { "name": "yes" })).is_empty());
    assert_eq!(shelter.delete(&doc! { "name": { "$bogus": 1 } }), 0);

    assert_eq!(shelter.read(None, None).len(), 1);
}

#[test]
fn empty_document_is_created() {
    let shelter = shelter();

    assert!(shelter.create(&doc! {}));

    let stored = shelter.read(None, None);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].len(), 1);
    assert!(stored[0].contains_key("_id"));
}

#[test]
fn dog_and_cat_scenario_through_facade() {
    let shelter = shelter();
    assert!(shelter.create(&doc! { "animal_type": "Dog", "name": "Rex" }));
    assert!(shelter.create(&doc! { "animal_type": "Cat", "name": "Milo" }));

    let dogs = shelter.read(Some(&doc! { "animal_type": "Dog" }), None);
    assert_eq!(dogs.len(), 1);
    assert_eq!(dogs[0].get_str("name").unwrap(), "Rex");

    assert_eq!(
        shelter.update(&doc! { "animal_type": "Dog" }, &doc! { "name": "Max" }),
        1
    );
    let dogs = shelter.read(Some(&doc! { "animal_type": "Dog" }), None);
    assert_eq!(dogs[0].get_str("name").unwrap(), "Max");

    assert_eq!(shelter.delete(&doc! { "animal_type": "Cat" }), 1);
    assert_eq!(shelter.delete(&doc! { "animal_type": "Cat" }), 0);

    let remaining = shelter.read(None, None);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get_str("name").unwrap(), "Max");
}

#[test]
fn rescue_candidates_match_profile() {
    let shelter = shelter();
    let animals = [
        doc! {
            "animal_type": "Dog",
            "breed": "Labrador Retriever Mix",
            "sex_upon_outcome": "Intact Female",
            "age_upon_outcome_in_weeks": 52.0,
            "name": "Splash",
        },
        doc! {
            "animal_type": "Dog",
            "breed": "Labrador Retriever Mix",
            "sex_upon_outcome": "Spayed Female",
            "age_upon_outcome_in_weeks": 52.0,
            "name": "Fixed",
        },
        doc! {
            "animal_type": "Dog",
            "breed": "Newfoundland",
            "sex_upon_outcome": "Intact Female",
            "age_upon_outcome_in_weeks": 400.0,
            "name": "Senior",
        },
        doc! {
            "animal_type": "Dog",
            "breed": "German Shepherd",
            "sex_upon_outcome": "Intact Male",
            "age_upon_outcome_in_weeks": 100_i64,
            "name": "Ridge",
        },
        doc! {
            "animal_type": "Cat",
            "breed": "Newfoundland",
            "sex_upon_outcome": "Intact Female",
            "age_upon_outcome_in_weeks": 52.0,
            "name": "Confused",
        },
    ];
    for animal in &animals {
        assert!(shelter.create(animal));
    }

    let water = shelter.rescue_candidates(RescueType::Water);
    assert_eq!(water.len(), 1);
    assert_eq!(water[0].get_str("name").unwrap(), "Splash");

    let mountain = shelter.rescue_candidates(RescueType::Mountain);
    let disaster = shelter.rescue_candidates(RescueType::Disaster);
    assert_eq!(mountain.len(), 1);
    assert_eq!(disaster.len(), 1);
    assert_eq!(disaster[0].get_str("name").unwrap(), "Ridge");
}

#[test]
fn credentials_are_kept_but_optional() {
    let shelter = AnimalShelter::with_credentials(
        MemoryStore::new(),
        Some(Credentials::new("aacuser", "secret")),
    );
    assert_eq!(shelter.credentials().map(|c| c.user.as_str()), Some("aacuser"));
    assert!(AnimalShelter::new(MemoryStore::new()).credentials().is_none());
}

#[test]
fn repository_exposes_strict_errors() {
    let shelter = shelter();
    let err = shelter
        .repository()
        .create(&doc! { "$where": "1" })
        .unwrap_err();
    assert!(err.is_validation());
}
