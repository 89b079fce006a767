use mock_registry::{CapturingLogger, MockRegistry};
use std::{sync::Arc, time::Duration};
use stencil_core::{Client, Options, RefreshStrategy};
use stencil_fixtures::ONE;
use tokio::time::sleep;


const URL: &str = "http://registry.test/v1/schemas/one";
const INTERVAL: Duration = Duration::from_secs(60);

// Ticks happen at 60s, 120s, 180s... Tests observe the state half way between two ticks.
const HALF_INTERVAL: Duration = Duration::from_secs(30);

async fn setup_client(
    logger: Arc<CapturingLogger>,
) -> (Client<MockRegistry>, MockRegistry) {
    let registry = MockRegistry::new();
    registry.serve(URL, stencil_fixtures::descriptor_set_bytes());

    let options = Options::default()
        .with_auto_refresh(INTERVAL)
        .with_logger(logger);

    let client = Client::with_transport(URL, options, registry.clone())
        .await
        .expect("Failed to create client");

    (client, registry)
}

#[tokio::test(start_paused = true)]
async fn test_idle_store_never_downloads() {
    let (_client, registry) = setup_client(Arc::default()).await;
    assert_eq!(registry.hits(URL), 1);

    sleep(INTERVAL * 5 + HALF_INTERVAL).await;

    assert_eq!(registry.hits(URL), 1);
}

#[tokio::test(start_paused = true)]
async fn test_access_triggers_exactly_one_download() {
    let (client, registry) = setup_client(Arc::default()).await;

    sleep(INTERVAL + HALF_INTERVAL).await;
    assert_eq!(registry.hits(URL), 1);

    // Several reads between two ticks count as one
    client.get_descriptor(ONE).unwrap();
    client.parse(ONE, &[]).unwrap();
    client.get_descriptor(ONE).unwrap();

    sleep(INTERVAL).await;
    assert_eq!(registry.hits(URL), 2);

    // The flag was consumed by the tick
    sleep(INTERVAL).await;
    assert_eq!(registry.hits(URL), 2);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_misses_count_as_access() {
    let (client, registry) = setup_client(Arc::default()).await;

    assert!(client.get_descriptor("com.example.Ghost").is_err());
    assert!(client.stores()[0].was_accessed());

    sleep(INTERVAL + HALF_INTERVAL).await;
    assert_eq!(registry.hits(URL), 2);
    assert!(!client.stores()[0].was_accessed());
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_previous_registry() {
    let logger = Arc::new(CapturingLogger::default());
    let (client, registry) = setup_client(Arc::clone(&logger)).await;

    registry.fail(URL, 404);
    client.get_descriptor(ONE).unwrap();

    sleep(INTERVAL + HALF_INTERVAL).await;
    assert_eq!(registry.hits(URL), 2);

    // Still servable, nothing surfaced to readers
    let one = client.get_descriptor(ONE).expect("Cached registry was dropped");
    assert!(one.get_field_by_name("field_two").is_none());

    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains(URL));
    assert!(errors[0].contains("404"));

    // Once the registry recovers, the next accessed tick picks the new schema
    registry.serve(URL, stencil_fixtures::updated_descriptor_set_bytes());
    sleep(INTERVAL).await;
    let one = client.get_descriptor(ONE).unwrap();
    assert!(one.get_field_by_name("field_two").is_some());
    assert!(logger.infos().iter().any(|m| m.contains("refreshed")));
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_ticks_and_keeps_data() {
    let (client, registry) = setup_client(Arc::default()).await;
    let store = client.stores()[0].clone();

    client.get_descriptor(ONE).unwrap();
    client.close();
    assert!(store.is_closed());

    sleep(INTERVAL * 3).await;
    assert_eq!(registry.hits(URL), 1);

    // Closing twice is harmless
    client.close();
    drop(client);

    let registry_snapshot = store.registry().expect("Closed store lost its registry");
    assert!(registry_snapshot.get(ONE).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_version_based_scheduler_skips_unchanged_versions() {
    let registry = MockRegistry::new();
    let versions_url = format!("{URL}/versions");
    registry.serve(&versions_url, r#"{"versions": [1]}"#);
    registry.serve(&format!("{versions_url}/1"), stencil_fixtures::descriptor_set_bytes());

    let logger = Arc::new(CapturingLogger::default());
    let options = Options::default()
        .with_auto_refresh(INTERVAL)
        .with_refresh_strategy(RefreshStrategy::VersionBased)
        .with_logger(logger.clone());

    let client = Client::with_transport(URL, options, registry.clone())
        .await
        .unwrap();

    client.get_descriptor(ONE).unwrap();
    sleep(INTERVAL + HALF_INTERVAL).await;

    assert_eq!(registry.hits(&versions_url), 2);
    assert_eq!(registry.hits(&format!("{versions_url}/1")), 1);
    assert!(logger.errors().is_empty());
    assert!(logger.infos().iter().any(|m| m.contains("already up to date")));
    assert!(client.get_descriptor(ONE).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_read_during_inflight_download_counts_for_next_tick() {
    let (client, registry) = setup_client(Arc::default()).await;
    registry.delay(URL, Duration::from_secs(20));
    client.get_descriptor(ONE).unwrap();

    // The tick at 60s takes the flag down and downloads until 80s
    sleep(INTERVAL + Duration::from_secs(10)).await;
    assert_eq!(registry.hits(URL), 2);
    assert!(!client.stores()[0].was_accessed());

    // Reading while the download is in flight is served from the cache
    assert!(client.get_descriptor(ONE).is_ok());
    assert!(client.stores()[0].was_accessed());

    // ...and is honored by the tick at 120s
    sleep(INTERVAL).await;
    assert_eq!(registry.hits(URL), 3);

    // Nothing was read since, the tick at 180s stays idle
    sleep(INTERVAL).await;
    assert_eq!(registry.hits(URL), 3);
}

#[tokio::test(start_paused = true)]
async fn test_huge_intervals_do_not_overflow() {
    let registry = MockRegistry::new();
    registry.serve(URL, stencil_fixtures::descriptor_set_bytes());

    let options = Options::default().with_auto_refresh(Duration::MAX);
    let client = Client::with_transport(URL, options, registry.clone())
        .await
        .unwrap();

    client.get_descriptor(ONE).unwrap();
    sleep(INTERVAL * 60).await;

    assert_eq!(registry.hits(URL), 1);
    assert!(client.get_descriptor(ONE).is_ok());
}
