use chrono::NaiveDate;
use myapp::core::error::MyappError;
use myapp::core::{db, migration};
use myapp::models::person::{
    BoomerStatus, Gender, Medal, NewPerson, Person, create_person, delete_person, get_person,
    list_persons, update_person,
};
use rstest::rstest;
use rusqlite::Connection;

fn migrated() -> Connection {
    let conn = db::db_connect_in_memory().unwrap();
    migration::migrate(&conn).unwrap();
    conn
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_person(first: &str, age: i64, birth_date: Option<NaiveDate>) -> NewPerson {
    NewPerson {
        first_name: first.to_string(),
        last_name: "Doe".to_string(),
        age,
        birth_date,
        gender: Gender::Female,
        medal: None,
    }
}

#[rstest]
#[case(date(1900, 1, 1), "Pre-boomer")]
#[case(date(1945, 7, 31), "Pre-boomer")]
#[case(date(1945, 8, 1), "Baby boomer")]
#[case(date(1955, 6, 15), "Baby boomer")]
#[case(date(1964, 12, 31), "Baby boomer")]
#[case(date(1965, 1, 1), "Post-boomer")]
#[case(date(1990, 3, 3), "Post-boomer")]
fn boomer_status_boundaries(#[case] birth: NaiveDate, #[case] expected: &str) {
    let conn = migrated();
    let person = create_person(&conn, &new_person("Jane", 40, Some(birth))).unwrap();
    let loaded = get_person(&conn, person.id).unwrap().unwrap();
    assert_eq!(loaded.baby_boomer_status().unwrap().as_str(), expected);
}

#[test]
fn boomer_status_without_birth_date_is_flagged() {
    let conn = migrated();
    let person = create_person(&conn, &new_person("Jane", 40, None)).unwrap();
    let loaded = get_person(&conn, person.id).unwrap().unwrap();
    assert_eq!(loaded.birth_date, None);
    assert!(matches!(
        loaded.baby_boomer_status(),
        Err(MyappError::MissingBirthDate)
    ));
}

#[test]
fn full_name_and_display_round_trip_through_storage() {
    let conn = migrated();
    let mut new = new_person("Jane", 30, Some(date(1990, 1, 1)));
    new.medal = Some(Medal::Silver);
    let person = create_person(&conn, &new).unwrap();

    let loaded = get_person(&conn, person.id).unwrap().unwrap();
    assert_eq!(loaded, person);
    assert_eq!(loaded.full_name(), "Jane Doe");
    assert_eq!(loaded.to_string(), "Jane Doe 30 F SILVER");
    assert_eq!(loaded.baby_boomer_status().unwrap(), BoomerStatus::PostBoomer);
}

#[test]
fn blank_medal_is_stored_as_empty_string() {
    let conn = migrated();
    let person = create_person(&conn, &new_person("Jane", 30, None)).unwrap();
    let stored: String = conn
        .query_row("SELECT medal FROM person WHERE id = ?1", [person.id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "");
}

#[test]
fn list_orders_by_age_descending() {
    let conn = migrated();
    for (name, age) in [("Young", 20), ("Old", 80), ("Middle", 45)] {
        create_person(&conn, &new_person(name, age, None)).unwrap();
    }
    let ages: Vec<i64> = list_persons(&conn).unwrap().iter().map(|p| p.age).collect();
    assert_eq!(ages, vec![80, 45, 20]);
}

#[test]
fn choice_sets_are_enforced_by_the_table() {
    let conn = migrated();
    let bad_gender = conn
        .execute(
            "INSERT INTO person(first_name, last_name, age, gender, medal) VALUES('A', 'B', 1, 'X', '')",
            [],
        )
        .map_err(MyappError::from)
        .unwrap_err();
    assert!(bad_gender.is_constraint(), "{bad_gender}");

    let bad_medal = conn
        .execute(
            "INSERT INTO person(first_name, last_name, age, gender, medal) VALUES('A', 'B', 1, 'M', 'TIN')",
            [],
        )
        .map_err(MyappError::from)
        .unwrap_err();
    assert!(bad_medal.is_constraint(), "{bad_medal}");
}

#[test]
fn validation_rejects_long_names_before_writing() {
    let conn = migrated();
    let err = create_person(&conn, &new_person(&"x".repeat(31), 30, None)).unwrap_err();
    assert!(matches!(
        err,
        MyappError::ValidationError {
            field: "first_name",
            ..
        }
    ));
    assert!(list_persons(&conn).unwrap().is_empty());
}

#[test]
fn update_and_delete() {
    let conn = migrated();
    let person = create_person(&conn, &new_person("Jane", 30, None)).unwrap();

    let updated = Person {
        age: 31,
        gender: Gender::Other,
        medal: Some(Medal::Bronze),
        ..person.clone()
    };
    update_person(&conn, &updated).unwrap();
    assert_eq!(get_person(&conn, person.id).unwrap().unwrap(), updated);

    assert!(delete_person(&conn, person.id).unwrap());
    assert!(!delete_person(&conn, person.id).unwrap());
    assert!(get_person(&conn, person.id).unwrap().is_none());

    let err = update_person(&conn, &updated).unwrap_err();
    assert!(matches!(err, MyappError::NotFound(_)));
}
