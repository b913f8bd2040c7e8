use chrono::NaiveDate;
use myapp::core::error::MyappError;
use myapp::core::{db, migration};
use myapp::models::membership::{
    Membership, NewMembership, add_membership, create_famous_person, create_group,
    delete_famous_person, delete_group, delete_membership, get_famous_person, get_group,
    get_membership, get_membership_detail, group_members, list_famous_persons, list_memberships,
    person_groups, rename_famous_person, rename_group, update_membership,
};
use rusqlite::Connection;

fn migrated() -> Connection {
    let conn = db::db_connect_in_memory().unwrap();
    migration::migrate(&conn).unwrap();
    conn
}

fn join(conn: &Connection, person_id: i64, group_id: i64, reason: &str) -> i64 {
    add_membership(
        conn,
        &NewMembership {
            person_id,
            group_id,
            date_joined: NaiveDate::from_ymd_opt(1962, 8, 16).unwrap(),
            invite_reason: reason.to_string(),
        },
    )
    .unwrap()
    .id
}

#[test]
fn membership_string_form_uses_related_names() {
    let conn = migrated();
    let ringo = create_famous_person(&conn, "Ringo Starr").unwrap();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    let id = join(&conn, ringo.id, beatles.id, "Needed a new drummer.");

    let detail = get_membership_detail(&conn, id).unwrap().unwrap();
    assert_eq!(detail.to_string(), "Ringo Starr in The Beatles");
    assert_eq!(detail.membership.invite_reason, "Needed a new drummer.");
    assert_eq!(ringo.to_string(), "Ringo Starr");
    assert_eq!(beatles.to_string(), "The Beatles");
}

#[test]
fn deleting_a_group_cascades_to_memberships_only() {
    let conn = migrated();
    let ringo = create_famous_person(&conn, "Ringo Starr").unwrap();
    let paul = create_famous_person(&conn, "Paul McCartney").unwrap();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    let wings = create_group(&conn, "Wings").unwrap();
    join(&conn, ringo.id, beatles.id, "Drums");
    join(&conn, paul.id, beatles.id, "Bass");
    join(&conn, paul.id, wings.id, "Founder");

    assert!(delete_group(&conn, beatles.id).unwrap());

    let remaining = list_memberships(&conn).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].group_id, wings.id);
    assert_eq!(list_famous_persons(&conn).unwrap().len(), 2);
    assert!(get_famous_person(&conn, ringo.id).unwrap().is_some());
}

#[test]
fn deleting_a_person_cascades_to_memberships_only() {
    let conn = migrated();
    let ringo = create_famous_person(&conn, "Ringo Starr").unwrap();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    join(&conn, ringo.id, beatles.id, "Drums");

    assert!(delete_famous_person(&conn, ringo.id).unwrap());
    assert!(list_memberships(&conn).unwrap().is_empty());
    assert!(get_group(&conn, beatles.id).unwrap().is_some());
}

#[test]
fn members_and_groups_follow_the_join() {
    let conn = migrated();
    let ringo = create_famous_person(&conn, "Ringo Starr").unwrap();
    let paul = create_famous_person(&conn, "Paul McCartney").unwrap();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    let wings = create_group(&conn, "Wings").unwrap();
    join(&conn, paul.id, beatles.id, "Bass");
    join(&conn, ringo.id, beatles.id, "Drums");
    join(&conn, paul.id, wings.id, "Founder");

    let members: Vec<String> = group_members(&conn, beatles.id)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(members, vec!["Paul McCartney", "Ringo Starr"]);

    let groups: Vec<String> = person_groups(&conn, paul.id)
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(groups, vec!["The Beatles", "Wings"]);
}

#[test]
fn membership_requires_existing_rows() {
    let conn = migrated();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    let err = add_membership(
        &conn,
        &NewMembership {
            person_id: 999,
            group_id: beatles.id,
            date_joined: NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
            invite_reason: "Ghost".to_string(),
        },
    )
    .unwrap_err();
    assert!(err.is_constraint(), "{err}");
}

#[test]
fn rename_validates_length() {
    let conn = migrated();
    let group = create_group(&conn, "Quarrymen").unwrap();
    assert!(rename_group(&conn, group.id, &"g".repeat(129)).is_err());
    rename_group(&conn, group.id, "The Beatles").unwrap();
    assert_eq!(get_group(&conn, group.id).unwrap().unwrap().name, "The Beatles");
}

#[test]
fn rename_famous_person_round_trips() {
    let conn = migrated();
    let person = create_famous_person(&conn, "Richard Starkey").unwrap();
    rename_famous_person(&conn, person.id, "Ringo Starr").unwrap();
    assert_eq!(
        get_famous_person(&conn, person.id).unwrap().unwrap().name,
        "Ringo Starr"
    );

    assert!(matches!(
        rename_famous_person(&conn, person.id, ""),
        Err(MyappError::ValidationError { field: "name", .. })
    ));
    assert!(matches!(
        rename_famous_person(&conn, 999, "Nobody"),
        Err(MyappError::NotFound(_))
    ));
}

#[test]
fn update_membership_round_trips() {
    let conn = migrated();
    let ringo = create_famous_person(&conn, "Ringo Starr").unwrap();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    let id = join(&conn, ringo.id, beatles.id, "Drums");

    let edited = Membership {
        date_joined: NaiveDate::from_ymd_opt(1962, 8, 18).unwrap(),
        invite_reason: "Needed a new drummer.".to_string(),
        ..get_membership(&conn, id).unwrap().unwrap()
    };
    update_membership(&conn, &edited).unwrap();
    assert_eq!(get_membership(&conn, id).unwrap().unwrap(), edited);

    let too_long = Membership {
        invite_reason: "r".repeat(65),
        ..edited.clone()
    };
    assert!(matches!(
        update_membership(&conn, &too_long),
        Err(MyappError::ValidationError { field: "invite_reason", .. })
    ));
    assert_eq!(get_membership(&conn, id).unwrap().unwrap(), edited);

    let missing = Membership { id: 999, ..edited };
    assert!(matches!(
        update_membership(&conn, &missing),
        Err(MyappError::NotFound(_))
    ));
    assert!(get_membership(&conn, 999).unwrap().is_none());
}

#[test]
fn deleting_one_membership_keeps_both_sides() {
    let conn = migrated();
    let paul = create_famous_person(&conn, "Paul McCartney").unwrap();
    let beatles = create_group(&conn, "The Beatles").unwrap();
    let wings = create_group(&conn, "Wings").unwrap();
    let first = join(&conn, paul.id, beatles.id, "Bass");
    let second = join(&conn, paul.id, wings.id, "Founder");

    assert!(delete_membership(&conn, first).unwrap());
    assert!(!delete_membership(&conn, first).unwrap());

    let remaining: Vec<i64> = list_memberships(&conn).unwrap().iter().map(|m| m.id).collect();
    assert_eq!(remaining, vec![second]);
    assert!(get_famous_person(&conn, paul.id).unwrap().is_some());
    assert!(get_group(&conn, beatles.id).unwrap().is_some());
    assert!(group_members(&conn, beatles.id).unwrap().is_empty());
}
