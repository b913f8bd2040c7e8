use myapp::core::error::MyappError;
use myapp::core::{db, migration};
use myapp::models::fruit::{
    NewFruit, create_fruit, delete_fruit, get_fruit, list_fruits, update_fruit_price,
};
use rusqlite::Connection;

fn migrated() -> Connection {
    let conn = db::db_connect_in_memory().unwrap();
    migration::migrate(&conn).unwrap();
    conn
}

fn fruit(name: &str, price: Option<i64>) -> NewFruit {
    NewFruit {
        name: name.to_string(),
        price,
    }
}

#[test]
fn null_price_is_rejected_by_the_database() {
    let conn = migrated();
    let err = create_fruit(&conn, &fruit("Apple", None)).unwrap_err();
    assert!(err.is_constraint(), "{err}");
    assert!(err.to_string().contains("NOT NULL"), "{err}");
    assert!(get_fruit(&conn, "Apple").unwrap().is_none());
}

#[test]
fn name_is_the_primary_key() {
    let conn = migrated();
    create_fruit(&conn, &fruit("Apple", Some(100))).unwrap();
    let err = create_fruit(&conn, &fruit("Apple", Some(200))).unwrap_err();
    assert!(err.is_constraint(), "{err}");

    let stored = get_fruit(&conn, "Apple").unwrap().unwrap();
    assert_eq!(stored.price, 100);
}

#[test]
fn list_orders_by_name() {
    let conn = migrated();
    for (name, price) in [("Pear", 3), ("Apple", 1), ("Mango", 2)] {
        create_fruit(&conn, &fruit(name, Some(price))).unwrap();
    }
    let names: Vec<String> = list_fruits(&conn)
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["Apple", "Mango", "Pear"]);
}

#[test]
fn price_updates_keep_not_null() {
    let conn = migrated();
    create_fruit(&conn, &fruit("Kiwi", Some(5))).unwrap();
    update_fruit_price(&conn, "Kiwi", Some(7)).unwrap();
    assert_eq!(get_fruit(&conn, "Kiwi").unwrap().unwrap().price, 7);

    let err = update_fruit_price(&conn, "Kiwi", None).unwrap_err();
    assert!(err.is_constraint(), "{err}");
    assert!(matches!(
        update_fruit_price(&conn, "Durian", Some(1)),
        Err(MyappError::NotFound(_))
    ));
}

#[test]
fn delete_by_name() {
    let conn = migrated();
    create_fruit(&conn, &fruit("Lime", Some(1))).unwrap();
    assert!(delete_fruit(&conn, "Lime").unwrap());
    assert!(!delete_fruit(&conn, "Lime").unwrap());
}
