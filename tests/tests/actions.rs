use datamap::adapter::Rows;
use pretty_assertions::assert_eq;
use tests::prelude::*;

const CONFIG: &str = r#"
namespace: app
version: "1.0"
sources:
  main: { adapter: memory, connection: "mem://main" }
  cache: { adapter: memory, connection: "mem://cache" }
mappings:
  user:
    object: User
    source: main
    actions:
      list:
        statement: users
        sources:
          - { name: cache, on_miss: next }
          - main
        parameters:
          - { object: Team, field: team }
        result:
          multi: true
          properties:
            - { object: ID, field: id }
            - { object: Name, field: name }
      count:
        statement: users
      clear:
        source: cache
        statement: users
  team_report:
    object: User
    source: main
    actions:
      list:
        statement: teams
        result:
          type: Team
          multi: true
          properties:
            - { object: Name, field: name }
            - { object: Size, field: size }
"#;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
struct User {
    #[datamap(rename = "ID")]
    id: i64,

    #[datamap(rename = "Name")]
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
struct Team {
    #[datamap(rename = "Name")]
    name: String,

    #[datamap(rename = "Size")]
    size: u32,
}

fn setup() -> (Harness, Mapper) {
    let harness = Harness::new();
    let mapper = harness.mapper(CONFIG, |builder| {
        builder.entity::<User>().entity::<Team>();
    });

    harness.store("main").seed(
        "users",
        [
            record! { "id" => 1, "name" => "Ada", "team" => "core" },
            record! { "id" => 2, "name" => "Grace", "team" => "core" },
            record! { "id" => 3, "name" => "Linus", "team" => "kernel" },
        ],
    );
    harness.store("main").seed(
        "teams",
        [
            record! { "name" => "core", "size" => 2 },
            record! { "name" => "kernel", "size" => 1 },
        ],
    );

    (harness, mapper)
}

#[tokio::test]
async fn execute_maps_records() {
    let (harness, mapper) = setup();

    let users: Vec<User> = assert_ok!(mapper.execute("app.user.list", record! { "Team" => "core" }).await);
    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Ada", "Grace"]);

    // The empty cache answer moved on to main
    assert_eq!(harness.log().sources(Verb::Execute), ["cache", "main"]);
    assert_eq!(
        harness.log().of(Verb::Execute)[1].records,
        [record! { "team" => "core" }]
    );
}

#[tokio::test]
async fn execute_into_another_type() {
    let (_harness, mapper) = setup();

    let teams: Vec<Team> = assert_ok!(mapper.execute("app.team_report.list", Record::new()).await);
    assert_eq!(
        teams,
        [
            Team { name: "core".into(), size: 2 },
            Team { name: "kernel".into(), size: 1 },
        ]
    );

    let err = assert_err!(mapper.execute::<User>("app.team_report.list", Record::new()).await);
    assert!(err.is_configuration());
    assert!(err.to_string().contains("works on `Team`, not `User`"));
}

#[tokio::test]
async fn execute_one() {
    let (_harness, mapper) = setup();

    let user: User = assert_ok!(mapper.execute_one("app.user.list", record! { "Team" => "kernel" }).await);
    assert_eq!(user, User { id: 3, name: "Linus".into() });

    let err = assert_err!(
        mapper
            .execute_one::<User>("app.user.list", record! { "Team" => "web" })
            .await
    );
    assert!(err.is_record_not_found());
}

#[tokio::test]
async fn execute_raw_returns_counts() {
    let (harness, mapper) = setup();

    let response = assert_ok!(mapper.execute_raw("app.user.count", Record::new()).await);
    assert_eq!(response.rows, Rows::Count(3));

    harness
        .store("cache")
        .seed("users", [record! { "id" => 1 }, record! { "id" => 2 }]);
    let response = assert_ok!(mapper.execute_raw("app.user.clear", Record::new()).await);
    assert_eq!(response.rows, Rows::Count(2));
    assert!(harness.store("cache").is_empty("users"));
}

#[tokio::test]
async fn count_is_not_records() {
    let (_harness, mapper) = setup();

    let err = assert_err!(mapper.execute::<User>("app.user.count", Record::new()).await);
    assert!(err.is_invalid_result());
}

#[tokio::test]
async fn unknown_actions() {
    let (_harness, mapper) = setup();

    let err = assert_err!(mapper.execute_raw("app.user.purge", Record::new()).await);
    assert!(err.is_no_such_action());

    let err = assert_err!(mapper.execute_raw("app.nobody.list", Record::new()).await);
    assert!(err.is_unknown_mapping());

    let err = assert_err!(mapper.execute_raw("list", Record::new()).await);
    assert!(err.is_unknown_mapping());
}
