//! Generator over a snapshot-backed store built from configuration

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uac_config::{GeneratorSettings, ServiceConfig};
use uac_generator::UacGenerator;
use uac_store::MemoryStore;

const NEVER: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_codes_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let mut config = ServiceConfig::default();
    config.generator.kind = "uac16".to_string();
    config.store.snapshot_dir = Some(dir.path().join("codes"));

    let issued = {
        let generator = UacGenerator::from_config(&config).unwrap();
        generator
            .generate("opn2101a", &["10001", "10002"])
            .await
            .unwrap();
        let listing = generator.list_by_case_id("opn2101a").await.unwrap();
        let code = listing.get("10001").unwrap().full_uac.clone().unwrap();
        generator.disable(&code).await.unwrap();
        code
    };

    let reopened = UacGenerator::from_config(&config).unwrap();
    let by_case = reopened.list_by_case_id("opn2101a").await.unwrap();

    assert_eq!(by_case.len(), 2);
    assert_eq!(
        by_case.get("10001").unwrap().full_uac.as_deref(),
        Some(issued.as_str())
    );
    assert!(by_case.get("10001").unwrap().disabled);
    assert!(!by_case.get("10002").unwrap().disabled);
}

fn generator_over(store: &Arc<MemoryStore>, settings: GeneratorSettings) -> UacGenerator {
    UacGenerator::new(store.clone(), settings)
}

#[tokio::test]
async fn test_failed_snapshot_write_does_not_lose_claims() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::with_snapshot(dir.path(), NEVER).unwrap());
    let generator = generator_over(&store, GeneratorSettings::default());
    let blocker = dir.path().join("codes.json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    let first = generator.generate("opn2101a", &["10001"]).await.unwrap();
    assert_eq!(first.issued, 1);
    assert!(store.force_snapshot().is_err());

    let retry = generator.generate("opn2101a", &["10001"]).await.unwrap();
    assert_eq!(retry.issued, 0);
    assert_eq!(retry.skipped, 1);
    assert_eq!(generator.count("opn2101a").await.unwrap(), 1);

    std::fs::remove_dir(&blocker).unwrap();
    drop(generator);
    drop(store);

    let reopened = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
    let generator = UacGenerator::new(Arc::new(reopened), GeneratorSettings::default());
    let by_case = generator.list_by_case_id("opn2101a").await.unwrap();
    assert_eq!(by_case.len(), 1);
    assert!(by_case.get("10001").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batch_does_not_write_snapshot_per_code() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::with_snapshot(dir.path(), NEVER).unwrap());
    let generator = generator_over(&store, GeneratorSettings::default().with_max_concurrent(50));
    let case_ids: Vec<String> = (1..=200).map(|i| format!("2{i:04}")).collect();

    let summary = generator.generate("opn2101a", &case_ids).await.unwrap();

    assert_eq!(summary.issued, 200);
    assert_eq!(store.snapshot_writes(), 0);

    drop(generator);
    drop(store);
    let reopened = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
    assert_eq!(reopened.len(), 200);
}
