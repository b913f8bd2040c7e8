use myapp::core::error::MyappError;
use myapp::core::{db, migration};
use myapp::models::dog::{
    Dog, NewDog, create_dog, delete_dog, dogs_with, get_dog, list_dogs, update_dog,
};
use rusqlite::Connection;
use serde_json::json;

fn migrated() -> Connection {
    let conn = db::db_connect_in_memory().unwrap();
    migration::migrate(&conn).unwrap();
    conn
}

fn dog(name: &str, data: Option<serde_json::Value>) -> NewDog {
    NewDog {
        name: name.to_string(),
        data,
    }
}

#[test]
fn list_orders_by_name_ascending() {
    let conn = migrated();
    for name in ["Rufus", "Meg", "Fido"] {
        create_dog(&conn, &dog(name, None)).unwrap();
    }
    let names: Vec<String> = list_dogs(&conn).unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["Fido", "Meg", "Rufus"]);
}

#[test]
fn json_document_round_trips() {
    let conn = migrated();
    let data = json!({"breed": "collie", "owner": {"name": "Bob", "age": 42}, "tags": ["a", 1]});
    let created = create_dog(&conn, &dog("Meg", Some(data.clone()))).unwrap();
    let loaded = get_dog(&conn, created.id).unwrap().unwrap();
    assert_eq!(loaded.data, Some(data));
    assert_eq!(loaded.to_string(), "Meg");

    let bare = create_dog(&conn, &dog("Fido", None)).unwrap();
    assert_eq!(get_dog(&conn, bare.id).unwrap().unwrap().data, None);
}

#[test]
fn invalid_json_text_is_rejected_by_the_table() {
    let conn = migrated();
    let err = conn
        .execute("INSERT INTO dog(name, data) VALUES('Rex', '{not json')", [])
        .map_err(MyappError::from)
        .unwrap_err();
    assert!(err.is_constraint(), "{err}");
}

#[test]
fn lookup_by_document_key() {
    let conn = migrated();
    create_dog(&conn, &dog("Meg", Some(json!({"breed": "collie"})))).unwrap();
    create_dog(&conn, &dog("Rufus", Some(json!({"breed": "labrador"})))).unwrap();
    create_dog(&conn, &dog("Fido", None)).unwrap();

    let collies = dogs_with(&conn, "breed", &json!("collie")).unwrap();
    assert_eq!(collies.len(), 1);
    assert_eq!(collies[0].name, "Meg");
}

#[test]
fn update_and_delete() {
    let conn = migrated();
    let created = create_dog(&conn, &dog("Meg", None)).unwrap();
    let edited = Dog {
        data: Some(json!({"good": true})),
        ..created.clone()
    };
    update_dog(&conn, &edited).unwrap();
    assert_eq!(get_dog(&conn, created.id).unwrap().unwrap(), edited);

    assert!(delete_dog(&conn, created.id).unwrap());
    assert!(matches!(update_dog(&conn, &edited), Err(MyappError::NotFound(_))));
}

#[test]
fn lookup_distinguishes_json_types() {
    let conn = migrated();
    create_dog(&conn, &dog("Meg", Some(json!({"good": true})))).unwrap();
    create_dog(&conn, &dog("Rufus", Some(json!({"good": 1})))).unwrap();
    create_dog(&conn, &dog("Fido", Some(json!({"k": "{\"k\":1}"})))).unwrap();
    create_dog(&conn, &dog("Rex", Some(json!({"k": {"k": 1}})))).unwrap();

    let names = |key: &str, value: serde_json::Value| -> Vec<String> {
        dogs_with(&conn, key, &value)
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect()
    };
    assert_eq!(names("good", json!(true)), vec!["Meg"]);
    assert_eq!(names("good", json!(1)), vec!["Rufus"]);
    assert_eq!(names("k", json!({"k": 1})), vec!["Rex"]);
    assert_eq!(names("k", json!("{\"k\":1}")), vec!["Fido"]);
    assert!(names("missing", json!(1)).is_empty());
}

#[test]
fn lookup_handles_keys_needing_escapes() {
    let conn = migrated();
    create_dog(&conn, &dog("Meg", Some(json!({"a\\b": 1, "x.y": "dot"})))).unwrap();
    create_dog(&conn, &dog("Rufus", Some(json!({"ab": 1})))).unwrap();

    let backslash = dogs_with(&conn, "a\\b", &json!(1)).unwrap();
    assert_eq!(backslash.len(), 1);
    assert_eq!(backslash[0].name, "Meg");

    let dotted = dogs_with(&conn, "x.y", &json!("dot")).unwrap();
    assert_eq!(dotted.len(), 1);
    assert_eq!(dotted[0].name, "Meg");
}
