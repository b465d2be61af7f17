use pretty_assertions::assert_eq;
use tests::prelude::*;

const CONFIG: &str = r#"
namespace: app
version: "1.0"
sources:
  main: { adapter: memory, connection: "mem://main" }
mappings:
  user:
    object: User
    source: main
    operations:
      fetch:
        statement: users
        parameters:
          - { object: ID, field: id }
        result:
          type: User
          properties:
            - { object: ID, field: id }
            - { object: Name, field: name }
            - { object: Email, field: email }
            - { object: Version, field: version }
      insert:
        statement: users
        properties:
          - { object: ID, field: id, generated: true }
          - { object: Name, field: name }
          - { object: Email, field: email }
          - { object: Version, field: version }
      update:
        statement: users
        properties:
          - { object: Name, field: name }
          - { object: Email, field: email }
        identifier:
          - { object: ID, field: id }
        condition:
          - { object: Version, field: version }
      delete:
        statement: users
        identifier:
          - { object: ID, field: id }
  bulk_user:
    object: User
    source: main
    operations:
      insert:
        statement: users
        bulk: true
        properties:
          - { object: ID, field: id, generated: true }
          - { object: Name, field: name }
"#;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
struct User {
    #[datamap(rename = "ID")]
    id: i64,

    #[datamap(rename = "Name")]
    name: String,

    #[datamap(rename = "Email")]
    email: Option<String>,

    #[datamap(rename = "Version")]
    version: i64,

    #[datamap(skip)]
    scratch: Vec<u8>,
}

fn user(name: &str) -> User {
    User {
        name: name.to_string(),
        version: 1,
        ..User::default()
    }
}

fn setup() -> (Harness, Mapper) {
    let harness = Harness::new();
    let mapper = harness.mapper(CONFIG, |builder| {
        builder.entity::<User>();
    });
    (harness, mapper)
}

#[tokio::test]
async fn insert_writes_back_generated_ids() {
    let (harness, mapper) = setup();

    let mut ada = user("Ada");
    let mut grace = user("Grace");
    assert_ok!(mapper.insert("app.user", [&mut ada, &mut grace]).await);

    assert_eq!(ada.id, 1);
    assert_eq!(grace.id, 2);

    // The generated field is not sent
    let inserts = harness.log().of(Verb::Insert);
    assert_eq!(inserts.len(), 2);
    assert_eq!(
        inserts[0].records,
        [record! { "name" => "Ada", "email" => Value::Null, "version" => 1 }]
    );
}

#[tokio::test]
async fn fetch_one_and_many() {
    let (harness, mapper) = setup();
    harness.store("main").seed(
        "users",
        [
            record! { "id" => 1, "name" => "Ada", "email" => "ada@example.com", "version" => 3 },
            record! { "id" => 2, "name" => "Grace", "email" => Value::Null, "version" => 1 },
        ],
    );

    let ada: User = assert_ok!(mapper.fetch_one("app.user", record! { "ID" => 1 }).await);
    assert_eq!(
        ada,
        User {
            id: 1,
            name: "Ada".into(),
            email: Some("ada@example.com".into()),
            version: 3,
            scratch: vec![],
        }
    );

    // Parameters reach the adapter under their record field names
    assert_eq!(harness.log().of(Verb::Fetch)[0].records, [record! { "id" => 1 }]);

    let all: Vec<User> = assert_ok!(mapper.fetch_many("app.user", Record::new()).await);
    let names: Vec<_> = all.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Ada", "Grace"]);
    assert_eq!(all[1].email, None);
}

#[tokio::test]
async fn missing_record_single_vs_many() {
    let (_harness, mapper) = setup();

    let err = assert_err!(mapper.fetch_one::<User>("app.user", record! { "ID" => 42 }).await);
    assert!(err.is_record_not_found());

    let users: Vec<User> = assert_ok!(mapper.fetch_many("app.user", record! { "ID" => 42 }).await);
    assert!(users.is_empty());
}

#[tokio::test]
async fn fetch_into_keeps_unmapped_state() {
    let (harness, mapper) = setup();
    harness
        .store("main")
        .seed("users", [record! { "id" => 1, "name" => "Ada" }]);

    let mut target = User {
        version: 9,
        scratch: vec![1, 2, 3],
        ..User::default()
    };
    assert_ok!(mapper.fetch_one_into("app.user", record! { "ID" => 1 }, &mut target).await);

    assert_eq!(target.name, "Ada");
    assert_eq!(target.version, 9);
    assert_eq!(target.scratch, [1, 2, 3]);
}

#[tokio::test]
async fn update_matches_identifier_and_condition() {
    let (harness, mapper) = setup();
    let store = harness.store("main");

    let mut ada = user("Ada");
    assert_ok!(mapper.insert("app.user", [&mut ada]).await);

    ada.name = "Ada Lovelace".into();
    assert_ok!(mapper.update("app.user", [&mut ada]).await);

    let row = store.rows("users").remove(0);
    assert_eq!(row.get("name"), Some(&Value::from("Ada Lovelace")));
    assert_eq!(row.get("version"), Some(&Value::I64(2)));

    // The caller still holds version 1, which no longer matches
    ada.name = "Stale".into();
    let err = assert_err!(mapper.update("app.user", [&mut ada]).await);
    assert!(err.is_record_not_found());
    assert_eq!(store.rows("users")[0].get("name"), Some(&Value::from("Ada Lovelace")));
}

#[tokio::test]
async fn update_of_unknown_record_is_not_found() {
    let (_harness, mapper) = setup();

    let mut ghost = User {
        id: 9,
        ..user("Ghost")
    };
    let err = assert_err!(mapper.update("app.user", [&mut ghost]).await);
    assert!(err.is_record_not_found());
}

#[tokio::test]
async fn delete_by_scalar_list_and_record() {
    let (harness, mapper) = setup();
    let store = harness.store("main");
    store.seed(
        "users",
        (1..=4).map(|id| record! { "id" => id, "name" => format!("user {id}") }),
    );

    assert_ok!(mapper.delete("app.user", 1).await);
    assert_ok!(mapper.delete("app.user", vec![2, 3]).await);
    assert_ok!(mapper.delete("app.user", record! { "id" => 4 }).await);
    assert!(store.is_empty("users"));

    let err = assert_err!(mapper.delete("app.user", 1).await);
    assert!(err.is_record_not_found());
}

#[tokio::test]
async fn bulk_sends_one_call() {
    let (harness, mapper) = setup();

    let mut users: Vec<User> = ["a", "b", "c"].into_iter().map(user).collect();
    assert_ok!(mapper.insert("app.bulk_user", &mut users).await);

    let inserts = harness.log().of(Verb::Insert);
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].records.len(), 3);

    let ids: Vec<_> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test]
async fn empty_batches_skip_the_adapter() {
    let (harness, mapper) = setup();

    let mut none: Vec<User> = vec![];
    assert_ok!(mapper.insert("app.user", &mut none).await);
    assert_ok!(mapper.update("app.user", &mut none).await);
    assert_ok!(mapper.delete("app.user", Vec::<i64>::new()).await);

    assert!(harness.log().is_empty());
}

#[tokio::test]
async fn concurrent_calls_share_one_connection() {
    let (harness, mapper) = setup();
    harness
        .store("main")
        .seed("users", [record! { "id" => 1, "name" => "Ada" }]);

    let mut tasks = vec![];
    for _ in 0..10 {
        let mapper = mapper.clone();
        tasks.push(tokio::spawn(async move {
            mapper.fetch_one::<User>("app.user", record! { "ID" => 1 }).await
        }));
    }

    for task in tasks {
        assert_eq!(assert_ok!(task.await.unwrap()).name, "Ada");
    }

    assert_eq!(harness.log().count("main", Verb::Connect), 1);
    assert_eq!(harness.log().count("main", Verb::Fetch), 10);
}

#[tokio::test]
async fn close_releases_adapters() {
    let (harness, mapper) = setup();
    harness
        .store("main")
        .seed("users", [record! { "id" => 1, "name" => "Ada" }]);

    assert_ok!(mapper.fetch_one::<User>("app.user", record! { "ID" => 1 }).await);
    assert_eq!(mapper.registry().list_active(), ["app.main"]);

    assert_ok!(mapper.close().await);
    assert!(mapper.registry().list_active().is_empty());
    assert_eq!(harness.log().count("main", Verb::Close), 1);

    // The next call connects a fresh instance
    assert_ok!(mapper.fetch_one::<User>("app.user", record! { "ID" => 1 }).await);
    assert_eq!(harness.log().count("main", Verb::Connect), 2);
}
