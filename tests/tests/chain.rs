use pretty_assertions::assert_eq;
use tests::prelude::*;

const CONFIG: &str = r#"
namespace: app
version: "1.0"
sources:
  main: { adapter: memory, connection: "mem://main" }
  cache: { adapter: memory, connection: "mem://cache" }
  backup: { adapter: memory, connection: "mem://backup" }
mappings:
  user:
    object: User
    source: main
    operations:
      fetch:
        statement: users
        sources:
          - { name: cache, on_miss: next, on_error: next }
          - main
          - cache
        parameters:
          - { object: ID, field: id }
        result:
          properties:
            - { object: ID, field: id }
            - { object: Name, field: name }
      insert:
        statement: users
        sources:
          - { name: main, on_error: next }
          - backup
        properties:
          - { object: ID, field: id, generated: true }
          - { object: Name, field: name }
        after:
          - { action: count, statement: users }
      update:
        statement: users
        properties:
          - { object: Name, field: name }
        identifier:
          - { object: ID, field: id }
        after:
          - { action: invalidate, source: cache, statement: users }
      delete:
        statement: users
        sources:
          - { name: cache, on_miss: next }
          - main
        identifier:
          - { object: ID, field: id }
  strict_user:
    object: User
    operations:
      fetch:
        statement: users
        sources: [cache, main]
        parameters:
          - { object: ID, field: id }
        result:
          properties:
            - { object: ID, field: id }
            - { object: Name, field: name }
      update:
        source: backup
        statement: users
        identifier:
          - { object: ID, field: id }
        properties:
          - { object: Name, field: name }
"#;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
struct User {
    #[datamap(rename = "ID")]
    id: i64,

    #[datamap(rename = "Name")]
    name: String,
}

fn setup() -> (Harness, Mapper) {
    let harness = Harness::new();
    let mapper = harness.mapper(CONFIG, |builder| {
        builder.entity::<User>();
    });

    harness
        .store("main")
        .seed("users", [record! { "id" => 1, "name" => "Ada (main)" }]);

    (harness, mapper)
}

async fn fetch(mapper: &Mapper, mapping: &str, id: i64) -> datamap::Result<User> {
    mapper.fetch_one(mapping, record! { "ID" => id }).await
}

#[tokio::test]
async fn cache_hit_stops_the_walk() {
    let (harness, mapper) = setup();
    harness
        .store("cache")
        .seed("users", [record! { "id" => 1, "name" => "Ada (cache)" }]);

    let user = assert_ok!(fetch(&mapper, "app.user", 1).await);
    assert_eq!(user.name, "Ada (cache)");
    assert_eq!(harness.log().sources(Verb::Fetch), ["cache"]);
}

#[tokio::test]
async fn cache_miss_falls_through_to_main() {
    let (harness, mapper) = setup();

    let user = assert_ok!(fetch(&mapper, "app.user", 1).await);
    assert_eq!(user.name, "Ada (main)");

    // `cache` is listed twice but only tried once
    assert_eq!(harness.log().sources(Verb::Fetch), ["cache", "main"]);
}

#[tokio::test]
async fn cache_failure_falls_through_to_main() {
    let (harness, mapper) = setup();
    harness.fail("cache", Verb::Fetch);

    let user = assert_ok!(fetch(&mapper, "app.user", 1).await);
    assert_eq!(user.name, "Ada (main)");

    let fetches = harness.log().of(Verb::Fetch);
    assert!(!fetches[0].ok);
    assert!(fetches[1].ok);
}

#[tokio::test]
async fn cache_connect_failure_falls_through_to_main() {
    let (harness, mapper) = setup();
    harness.fail("cache", Verb::Connect);

    let user = assert_ok!(fetch(&mapper, "app.user", 1).await);
    assert_eq!(user.name, "Ada (main)");
    assert_eq!(mapper.registry().list_active(), ["app.main"]);

    // The failed connect was not cached
    harness.heal("cache", Verb::Connect);
    assert_ok!(fetch(&mapper, "app.user", 1).await);
    assert_eq!(mapper.registry().list_active(), ["app.cache", "app.main"]);
}

#[tokio::test]
async fn miss_everywhere_is_not_found() {
    let (harness, mapper) = setup();

    let err = assert_err!(fetch(&mapper, "app.user", 7).await);
    assert!(err.is_record_not_found());
    assert_eq!(harness.log().sources(Verb::Fetch), ["cache", "main"]);
}

#[tokio::test]
async fn stop_policy_returns_first_outcome() {
    let (harness, mapper) = setup();

    let err = assert_err!(fetch(&mapper, "app.strict_user", 1).await);
    assert!(err.is_record_not_found());
    assert_eq!(harness.log().sources(Verb::Fetch), ["cache"]);

    harness.log().clear();
    harness.fail("cache", Verb::Fetch);

    let err = assert_err!(fetch(&mapper, "app.strict_user", 1).await);
    assert!(err.to_string().contains("injected Fetch failure on `cache`"));
    assert_eq!(harness.log().sources(Verb::Fetch), ["cache"]);
}

#[tokio::test]
async fn failed_write_moves_to_next_source() {
    let (harness, mapper) = setup();
    harness.fail("main", Verb::Insert);

    let mut grace = User {
        name: "Grace".into(),
        ..User::default()
    };
    assert_ok!(mapper.insert("app.user", [&mut grace]).await);

    assert_eq!(grace.id, 1);
    assert_eq!(harness.store("backup").len("users"), 1);
    assert_eq!(harness.store("main").len("users"), 1);
    assert_eq!(harness.log().sources(Verb::Insert), ["main", "backup"]);

    // Unpinned after-actions run where the write landed
    assert_eq!(harness.log().sources(Verb::Execute), ["backup"]);
}

#[tokio::test]
async fn write_error_without_next_surfaces() {
    let (harness, mapper) = setup();
    harness.fail("main", Verb::Insert);
    harness.fail("backup", Verb::Insert);

    let mut grace = User::default();
    let err = assert_err!(mapper.insert("app.user", [&mut grace]).await);
    assert!(err.to_string().contains("`backup`"));
    assert!(harness.log().of(Verb::Execute).is_empty());
}

#[tokio::test]
async fn delete_walks_on_not_found() {
    let (harness, mapper) = setup();

    assert_ok!(mapper.delete("app.user", 1).await);
    assert_eq!(harness.log().sources(Verb::Delete), ["cache", "main"]);
    assert!(harness.store("main").is_empty("users"));
}

#[tokio::test]
async fn pinned_after_action_invalidates_cache() {
    let (harness, mapper) = setup();
    harness
        .store("cache")
        .seed("users", [record! { "id" => 1, "name" => "Ada (cache)" }]);

    let mut ada = User {
        id: 1,
        name: "Ada Lovelace".into(),
    };
    assert_ok!(mapper.update("app.user", [&mut ada]).await);

    assert!(harness.store("cache").is_empty("users"));

    let executes = harness.log().of(Verb::Execute);
    assert_eq!(executes.len(), 1);
    assert_eq!(executes[0].source, "cache");
    assert_eq!(executes[0].target, "invalidate");
    assert_eq!(executes[0].records, [record! { "name" => "Ada Lovelace", "id" => 1 }]);

    // The next read misses the cache and sees the new value
    assert_eq!(assert_ok!(fetch(&mapper, "app.user", 1).await).name, "Ada Lovelace");
}

#[tokio::test]
async fn failing_after_action_is_reported() {
    let (harness, mapper) = setup();
    harness.fail("cache", Verb::Execute);

    let mut ada = User {
        id: 1,
        name: "Ada L.".into(),
    };
    let err = assert_err!(mapper.update("app.user", [&mut ada]).await);

    let message = err.to_string();
    assert!(message.contains("after-action `invalidate`"));
    assert!(message.contains("`app.cache`"));

    // The write itself went through
    assert_eq!(
        harness.store("main").rows("users")[0].get("name"),
        Some(&Value::from("Ada L."))
    );
}

#[tokio::test]
async fn override_uses_only_its_source() {
    let (harness, mapper) = setup();
    harness
        .store("backup")
        .seed("users", [record! { "id" => 5, "name" => "Ken" }]);

    let mut ken = User {
        id: 5,
        name: "Ken Thompson".into(),
    };
    assert_ok!(mapper.update("app.strict_user", [&mut ken]).await);
    assert_eq!(harness.log().sources(Verb::Update), ["backup"]);
}

#[tokio::test]
async fn partial_batch_still_invalidates_written_records() {
    let (harness, mapper) = setup();
    harness
        .store("cache")
        .seed("users", [record! { "id" => 1, "name" => "Ada (cache)" }]);

    let mut ada = User {
        id: 1,
        name: "Ada Lovelace".into(),
    };
    let mut ghost = User {
        id: 99,
        name: "Nobody".into(),
    };

    let err = assert_err!(mapper.update("app.user", [&mut ada, &mut ghost]).await);
    assert!(err.is_record_not_found());

    // Ada reached main, so her cached copy is gone; the ghost never ran an after-action
    assert_eq!(
        harness.store("main").rows("users")[0].get("name"),
        Some(&Value::from("Ada Lovelace"))
    );
    assert!(harness.store("cache").is_empty("users"));

    let executes = harness.log().of(Verb::Execute);
    assert_eq!(executes.len(), 1);
    assert_eq!(executes[0].records, [record! { "name" => "Ada Lovelace", "id" => 1 }]);

    assert_eq!(assert_ok!(fetch(&mapper, "app.user", 1).await).name, "Ada Lovelace");
}
