//! Scheduler integration tests against a local mock HTTP server.

use picfetch_cache::{ByteStore, CacheConfig};
use picfetch_core::{Error, TaskState};
use picfetch_task::{FetchScheduler, SchedulerConfig};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn scheduler_with_pool(
    dir: &TempDir,
    pool_size: usize,
) -> (FetchScheduler, picfetch_task::CompletionReceiver) {
    let store = ByteStore::new(CacheConfig::new(dir.path())).await.unwrap();
    let config = SchedulerConfig {
        pool_size,
        ..SchedulerConfig::default()
    };
    FetchScheduler::new(store, config).unwrap()
}

/// The detached cache write races the next fetch; wait for it to land.
async fn wait_for_writes(scheduler: &FetchScheduler, at_least: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while scheduler.store_statistics().writes < at_least {
        assert!(Instant::now() < deadline, "cache write never landed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn second_same_hour_request_is_served_from_cache() {
    let server = MockServer::start().await;
    let body = vec![7u8; 2000];
    Mock::given(method("GET"))
        .and(path("/photos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 4).await;
    let url = format!("{}/photos/1", server.uri());

    scheduler.fetch(&url).unwrap();
    let first = completions.recv().await.unwrap();
    let first = first.outcome.unwrap();
    assert!(!first.from_cache);
    assert_eq!(&first.bytes[..], &body[..]);

    wait_for_writes(&scheduler, 1).await;

    scheduler.fetch(&url).unwrap();
    let second = completions.recv().await.unwrap();
    let second = second.outcome.unwrap();
    assert!(second.from_cache);
    assert_eq!(&second.bytes[..], &body[..]);
    // The mock's expect(1) verifies on drop that no second request was made.
}

#[tokio::test(flavor = "multi_thread")]
async fn every_request_completes_exactly_once_under_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"[]".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 4).await;

    // Eight requests over four URLs: duplicate keys race independently.
    let mut expected = HashSet::new();
    for i in 0..8 {
        let url = format!("{}/albums/{}", server.uri(), i % 4);
        let handle = scheduler.fetch(&url).unwrap();
        assert!(expected.insert(handle.id()), "task ids must be unique");
    }

    let mut delivered = HashSet::new();
    for _ in 0..8 {
        let completion = completions.recv().await.unwrap();
        assert!(
            delivered.insert(completion.id),
            "completion for {} delivered twice",
            completion.id
        );
        assert_eq!(completion.state(), TaskState::Completed);
    }
    assert_eq!(delivered, expected);

    // Nothing else may arrive.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(completions.try_recv().is_err());
}

// Single-threaded runtime: spawned tasks cannot run until the first await,
// so the cancel below is guaranteed to land before the queued task starts.
#[tokio::test]
async fn cancel_before_start_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    // One worker slot: the slow fetch occupies it while the second task is
    // still pending.
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 1).await;

    let slow = scheduler.fetch(&format!("{}/slow", server.uri())).unwrap();
    let queued = scheduler.fetch(&format!("{}/never", server.uri())).unwrap();
    scheduler.cancel(&queued);

    let mut states = std::collections::HashMap::new();
    for _ in 0..2 {
        let completion = completions.recv().await.unwrap();
        states.insert(completion.id, completion.state());
    }
    assert_eq!(states[&slow.id()], TaskState::Completed);
    assert_eq!(states[&queued.id()], TaskState::Cancelled);
    // expect(0) on /never verifies on drop that the cancelled task never
    // reached the network.
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_while_request_in_flight_discards_result_and_caches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"arrived too late".to_vec())
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 4).await;

    let handle = scheduler.fetch(&format!("{}/slow", server.uri())).unwrap();
    // Let the request reach the network before cancelling.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();

    let completion = completions.recv().await.unwrap();
    assert_eq!(completion.id, handle.id());
    assert_eq!(completion.state(), TaskState::Cancelled);

    // The response still resolves server-side; leave time for any cache
    // write that (wrongly) survived the cancellation to land.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(scheduler.store_statistics().writes, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_2xx_response_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 4).await;

    scheduler
        .fetch(&format!("{}/photos/404", server.uri()))
        .unwrap();
    let completion = completions.recv().await.unwrap();
    assert_eq!(completion.state(), TaskState::Failed);
    match completion.outcome.unwrap_err() {
        Error::Network { status, .. } => assert_eq!(status, Some(404)),
        other => panic!("expected a network error, got {other}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_url_is_rejected_before_scheduling() {
    let dir = TempDir::new().unwrap();
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 4).await;

    let err = scheduler.fetch("not a url at all").unwrap_err();
    assert!(matches!(err, Error::InvalidUrl { .. }));

    // The rejected request produces no completion.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(completions.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_fetch_writes_nothing_to_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (scheduler, mut completions) = scheduler_with_pool(&dir, 4).await;

    scheduler.fetch(&format!("{}/users", server.uri())).unwrap();
    let completion = completions.recv().await.unwrap();
    assert_eq!(completion.state(), TaskState::Failed);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(scheduler.store_statistics().writes, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
