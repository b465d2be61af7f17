use datamap::{schema::Source, AdapterRegistry};
use std::{sync::Arc, time::Duration};
use tests::prelude::*;

fn registry(counters: &Counters) -> Arc<AdapterRegistry> {
    tests::init_tracing();

    let registry = AdapterRegistry::new();
    registry.register("stub", Stub::factory(counters));
    Arc::new(registry)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_connect_once() {
    let counters = Counters::default();
    let registry = registry(&counters);
    let source = Source::new("stub").option("delay_ms", 50);

    let mut tasks = vec![];
    for _ in 0..16 {
        let registry = registry.clone();
        let source = source.clone();
        tasks.push(tokio::spawn(async move { registry.get("app.slow", &source).await }));
    }

    let mut adapters = vec![];
    for task in tasks {
        adapters.push(assert_ok!(task.await.unwrap()));
    }

    assert_eq!(counters.built(), 1);
    assert_eq!(counters.connected(), 1);
    assert!(adapters.iter().all(|adapter| Arc::ptr_eq(adapter, &adapters[0])));
    assert_eq!(registry.list_active(), ["app.slow"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_connect_does_not_block_other_sources() {
    let counters = Counters::default();
    let registry = registry(&counters);

    let slow = {
        let registry = registry.clone();
        tokio::spawn(async move {
            let source = Source::new("stub").option("delay_ms", 1_000);
            registry.get("app.slow", &source).await.map(|_| ())
        })
    };

    // Let the slow connect start
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fast = tokio::time::timeout(
        Duration::from_millis(500),
        registry.get("app.fast", &Source::new("stub")),
    )
    .await;

    assert!(fast.is_ok(), "fast source waited on the slow one");
    assert_ok!(fast.unwrap());
    assert!(!slow.is_finished());

    assert_ok!(slow.await.unwrap());
    assert_eq!(registry.list_active(), ["app.fast", "app.slow"]);
}

#[tokio::test]
async fn failed_connect_is_retried_on_next_lookup() {
    let counters = Counters::default();
    let registry = registry(&counters);
    let source = Source::new("stub").option("fail_connect", true);

    let err = assert_err!(registry.get("app.main", &source).await);
    assert!(err.is_connect_failed());
    assert!(registry.list_active().is_empty());

    assert_err!(registry.get("app.main", &source).await);
    assert_eq!(counters.built(), 2);

    // Once the backend is reachable the same identifier connects
    assert_ok!(registry.get("app.main", &Source::new("stub")).await);
    assert_eq!(registry.list_active(), ["app.main"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_leave_nothing_cached() {
    let counters = Counters::default();
    let registry = registry(&counters);
    let source = Source::new("stub")
        .option("delay_ms", 20)
        .option("fail_connect", true);

    let mut tasks = vec![];
    for _ in 0..8 {
        let registry = registry.clone();
        let source = source.clone();
        tasks.push(tokio::spawn(async move { registry.get("app.down", &source).await.map(|_| ()) }));
    }

    for task in tasks {
        let err = assert_err!(task.await.unwrap());
        assert!(err.is_connect_failed());
    }

    assert!(registry.list_active().is_empty());
    assert_eq!(counters.connected(), 0);
}

#[tokio::test]
async fn close_all_then_reconnect() {
    let counters = Counters::default();
    let registry = registry(&counters);

    for id in ["app.a", "app.b", "app.c"] {
        assert_ok!(registry.get(id, &Source::new("stub")).await);
    }

    assert_ok!(registry.close_all().await);
    assert_eq!(counters.closed(), 3);
    assert!(registry.list_active().is_empty());

    assert_ok!(registry.get("app.a", &Source::new("stub")).await);
    assert_eq!(counters.built(), 4);
}

#[tokio::test]
async fn close_all_reports_every_failure() {
    let counters = Counters::default();
    let registry = registry(&counters);

    let failing = Source::new("stub").option("fail_close", true);
    assert_ok!(registry.get("app.a", &failing).await);
    assert_ok!(registry.get("app.b", &Source::new("stub")).await);
    assert_ok!(registry.get("app.c", &failing).await);

    let err = assert_err!(registry.close_all().await);
    assert!(err.is_close_failed());
    assert_eq!(err.close_failures().len(), 2);

    let message = err.to_string();
    assert!(message.contains("`app.a`"));
    assert!(message.contains("`app.c`"));

    // Every instance was closed and evicted regardless
    assert_eq!(counters.closed(), 3);
    assert!(registry.list_active().is_empty());
}

#[tokio::test]
async fn close_instance_of_unknown_source() {
    let counters = Counters::default();
    let registry = registry(&counters);

    let err = assert_err!(registry.close_instance("app.none").await);
    assert!(err.is_instance_not_found());
}
