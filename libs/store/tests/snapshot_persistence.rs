//! Snapshot persistence across store reopen

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uac_store::memory::SNAPSHOT_FILE;
use uac_store::{CodeFilter, CodeKey, CodeRecord, CodeStore, MemoryStore, StoreError};

const NEVER: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_reopen_sees_earlier_writes() {
    let dir = TempDir::new().unwrap();

    {
        let store = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
        assert!(store.is_persistent());
        store
            .insert_if_absent(
                &CodeKey::new("uac", "123412341234"),
                CodeRecord::new("OPN2101A", "10001"),
            )
            .await
            .unwrap();
        store
            .insert_if_absent(&CodeKey::new("uac16", "bcdfghjklmnp"), CodeRecord::unknown())
            .await
            .unwrap();
        store
            .update(
                &CodeKey::new("uac", "123412341234"),
                CodeRecord::with_disabled("opn2101a", "10001", true),
            )
            .await
            .unwrap();
    }

    assert!(dir.path().join(SNAPSHOT_FILE).exists());

    let reopened = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
    assert_eq!(reopened.len(), 2);

    let record = reopened
        .get(&CodeKey::new("uac", "123412341234"))
        .await
        .unwrap();
    assert_eq!(record.instrument_name, "opn2101a");
    assert!(record.disabled);
    assert!(reopened
        .get(&CodeKey::new("uac16", "bcdfghjklmnp"))
        .await
        .unwrap()
        .is_unknown());
}

#[tokio::test]
async fn test_deletes_are_persisted() {
    let dir = TempDir::new().unwrap();

    {
        let store = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
        for code in ["1", "2", "3"] {
            store
                .insert_if_absent(&CodeKey::new("uac", code), CodeRecord::new("a", code))
                .await
                .unwrap();
        }
        store
            .delete_many(&[CodeKey::new("uac", "1"), CodeKey::new("uac", "3")])
            .await
            .unwrap();
    }

    let reopened = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
    let remaining = reopened.scan(&CodeFilter::kind("uac")).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].code(), "2");
}

#[tokio::test]
async fn test_corrupt_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(SNAPSHOT_FILE), "not json").unwrap();

    let err = MemoryStore::with_snapshot_dir(dir.path()).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[test]
fn test_missing_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");

    let store = MemoryStore::with_snapshot_dir(&nested).unwrap();
    assert!(store.is_empty());
    store.force_snapshot().unwrap();
    assert!(nested.join(SNAPSHOT_FILE).exists());
}

#[tokio::test]
async fn test_failed_snapshot_write_keeps_mutation() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::with_snapshot(dir.path(), NEVER).unwrap();
    // The temp file the writer renames from cannot be created
    let blocker = dir.path().join("codes.json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    let key = CodeKey::new("uac", "123412341234");
    store
        .insert_if_absent(&key, CodeRecord::new("opn2101a", "10001"))
        .await
        .unwrap();

    assert_eq!(store.get(&key).await.unwrap().case_id, "10001");
    assert!(matches!(store.force_snapshot(), Err(StoreError::Io(_))));
    assert_eq!(store.snapshot_writes(), 0);
    assert_eq!(
        store
            .insert_if_absent(&key, CodeRecord::new("opn2101a", "10002"))
            .await,
        Err(StoreError::already_exists("123412341234"))
    );

    std::fs::remove_dir(&blocker).unwrap();
    store.force_snapshot().unwrap();
    drop(store);

    let reopened = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
    assert_eq!(reopened.get(&key).await.unwrap().case_id, "10001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_share_one_write() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::with_snapshot(dir.path(), NEVER).unwrap());

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert_if_absent(
                        &CodeKey::new("uac", format!("{:012}", i)),
                        CodeRecord::new("opn2101a", &i.to_string()),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.snapshot_writes(), 0);
    assert!(!dir.path().join(SNAPSHOT_FILE).exists());

    store.force_snapshot().unwrap();
    assert_eq!(store.snapshot_writes(), 1);
    drop(store);

    let reopened = MemoryStore::with_snapshot_dir(dir.path()).unwrap();
    assert_eq!(reopened.len(), 200);
}

#[tokio::test]
async fn test_background_flush_writes_once() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::with_snapshot(dir.path(), Duration::from_millis(20)).unwrap();

    for i in 0..50 {
        store
            .insert_if_absent(
                &CodeKey::new("uac", format!("{:012}", i)),
                CodeRecord::new("opn2101a", &i.to_string()),
            )
            .await
            .unwrap();
    }

    let mut waited = Duration::ZERO;
    while store.snapshot_writes() == 0 && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }

    assert_eq!(store.snapshot_writes(), 1);
    let on_disk = MemoryStore::with_snapshot(dir.path(), NEVER).unwrap();
    assert_eq!(on_disk.len(), 50);
}

#[tokio::test]
async fn test_deleting_absent_keys_does_not_dirty() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::with_snapshot(dir.path(), NEVER).unwrap();

    store.delete_many(&[CodeKey::new("uac", "1")]).await.unwrap();
    drop(store);

    assert!(!dir.path().join(SNAPSHOT_FILE).exists());
}
