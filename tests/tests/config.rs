use tests::prelude::*;

#[derive(Debug, Default, Entity)]
struct User {
    #[datamap(rename = "ID")]
    id: i64,

    #[datamap(rename = "Name")]
    name: String,
}

#[derive(Debug, Default, Entity)]
struct Team {
    #[datamap(rename = "Name")]
    name: String,
}

const USER_WITH_NICKNAME: &str = r#"
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
        result:
          properties:
            - { object: ID, field: id }
            - { object: Nickname, field: nick }
            - { object: Avatar, field: avatar }
"#;

#[tokio::test]
async fn registered_entity_is_checked_at_build() {
    let harness = Harness::new();

    let err = assert_err!(harness.try_mapper(USER_WITH_NICKNAME, |builder| {
        builder.entity::<User>();
    }));

    assert!(err.is_configuration());
    let message = err.to_string();
    assert!(message.contains("`app.user`"), "{message}");
    assert!(message.contains("`Nickname`, `Avatar`"), "{message}");
}

#[tokio::test]
async fn unregistered_entity_fails_when_mapped() {
    let harness = Harness::new();
    let mapper = harness.mapper(USER_WITH_NICKNAME, |_| {});
    harness
        .store("main")
        .seed("users", [record! { "id" => 1, "nick" => "ada" }]);

    let err = assert_err!(mapper.fetch_one::<User>("app.user", Record::new()).await);
    assert!(err.is_field_not_found());
    assert!(err.to_string().contains("`Nickname`, `Avatar`"));
}

const MINIMAL: &str = r#"
namespace: app
version: "1.0"
sources:
  main: { adapter: memory, connection: "mem://main" }
  remote: { adapter: postgres, connection: "postgres://app:hunter2@db/app" }
mappings:
  user:
    object: User
    source: main
    operations:
      fetch:
        statement: users
        result:
          properties:
            - { object: ID, field: id }
            - { object: Name, field: name }
  remote_user:
    object: User
    source: remote
    operations:
      fetch:
        statement: users
  orphan:
    object: User
    operations:
      fetch:
        statement: users
"#;

fn minimal() -> Mapper {
    Harness::new().mapper(MINIMAL, |builder| {
        builder.entity::<User>().entity::<Team>();
    })
}

#[tokio::test]
async fn lookup_errors() {
    let mapper = minimal();

    let err = assert_err!(mapper.fetch_one::<User>("app.nobody", Record::new()).await);
    assert!(err.is_unknown_mapping());

    let err = assert_err!(mapper.fetch_one::<User>("other.user", Record::new()).await);
    assert!(err.is_unknown_mapping());

    let err = assert_err!(mapper.delete("app.user", 1).await);
    assert!(err.is_no_such_operation());

    let err = assert_err!(mapper.fetch_one::<Team>("app.user", Record::new()).await);
    assert!(err.is_configuration());
}

#[tokio::test]
async fn no_source_for_operation() {
    let mapper = minimal();

    let err = assert_err!(mapper.fetch_many::<User>("app.orphan", Record::new()).await);
    assert!(err.is_no_source_configured());
}

#[tokio::test]
async fn unknown_adapter_type_hides_connection() {
    let harness = Harness::new();
    let mapper = harness.mapper(MINIMAL, |builder| {
        builder.entity::<User>();
    });

    let err = assert_err!(mapper.fetch_many::<User>("app.remote_user", Record::new()).await);
    assert!(err.is_unknown_adapter_type());

    let message = err.to_string();
    assert!(message.contains("`postgres`"));
    assert!(message.contains("`app.remote`"));
    assert!(!message.contains("hunter2"));

    // Registering the tag later makes the source usable
    mapper.register_adapter("postgres", harness.factory());
    assert!(mapper.registry().is_registered("postgres"));

    let users = assert_ok!(mapper.fetch_many::<User>("app.remote_user", Record::new()).await);
    assert!(users.is_empty());
    assert_eq!(mapper.registry().list_active(), ["app.remote"]);
}

#[tokio::test]
async fn dangling_source_reference_fails_to_load() {
    let config = r#"
namespace: app
version: "1.0"
sources:
  main: { adapter: memory }
mappings:
  user:
    object: User
    source: main
    operations:
      fetch:
        statement: users
        sources: [cache, main]
"#;

    let err = assert_err!(Harness::new().try_mapper(config, |_| {}));
    assert!(err.is_unknown_source());
    assert!(err.to_string().contains("`cache`"));
}
