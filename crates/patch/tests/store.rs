#![cfg(test)]
#![allow(
    clippy::expect_used,
    reason = "Fixtures are known-good; a failure here is a broken test"
)]
#![allow(
    clippy::tests_outside_test_module,
    reason = "Integration tests live at the crate root"
)]
#![allow(clippy::panic, reason = "Unexpected events fail the test")]

use anyhow::{Error, anyhow};
use core::time::Duration;
use patch::{
    DEFAULT_SAVE_DELAY, MemoryStorage, OverridePatchStore, PatchMap, PatchStorage, StoreEvent,
    storage_key,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Handle;
use tokio::sync::broadcast::Receiver;
use tokio::time::sleep;

/// Memory storage that counts writes.
#[derive(Clone, Default)]
struct CountingStorage {
    inner: MemoryStorage,
    writes: Arc<AtomicUsize>,
}

impl CountingStorage {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PatchStorage for CountingStorage {
    async fn get(&self, key: &str) -> Result<Option<PatchMap>, Error> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, patch: PatchMap) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, patch).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.remove(key).await
    }
}

/// Memory storage whose writes take 50ms to land.
#[derive(Clone, Default)]
struct SlowStorage {
    inner: MemoryStorage,
}

impl PatchStorage for SlowStorage {
    async fn get(&self, key: &str) -> Result<Option<PatchMap>, Error> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, patch: PatchMap) -> Result<(), Error> {
        sleep(Duration::from_millis(50)).await;
        self.inner.set(key, patch).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.remove(key).await
    }
}

/// Storage whose writes always fail.
struct FullDisk;

impl PatchStorage for FullDisk {
    async fn get(&self, _key: &str) -> Result<Option<PatchMap>, Error> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _patch: PatchMap) -> Result<(), Error> {
        Err(anyhow!("disk full"))
    }

    async fn remove(&self, _key: &str) -> Result<(), Error> {
        Err(anyhow!("disk full"))
    }
}

const KEY: &str = "restyle:example.com";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store_with<S: PatchStorage>(storage: S) -> OverridePatchStore<S> {
    OverridePatchStore::new(
        Handle::current(),
        storage,
        KEY.to_owned(),
        DEFAULT_SAVE_DELAY,
    )
}

/// Next save outcome, skipping CSS updates.
async fn next_save_event(events: &mut Receiver<StoreEvent>) -> StoreEvent {
    loop {
        match events.recv().await {
            Ok(StoreEvent::CssChanged(_)) => {}
            Ok(other) => return other,
            Err(err) => panic!("event stream ended: {err}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn edit_burst_is_written_once_with_final_state() {
    init_logging();
    let storage = CountingStorage::default();
    let mut store = store_with(storage.clone());
    let mut events = store.subscribe();

    store.set_property("#a", "color", "red");
    store.set_property("#a", "color", "blue");
    store.set_property("#a", "margin", "0");

    sleep(Duration::from_millis(199)).await;
    assert_eq!(storage.writes(), 0);
    assert!(store.has_pending_save());

    assert_eq!(next_save_event(&mut events).await, StoreEvent::Persisted);
    assert_eq!(storage.writes(), 1);
    let saved = storage.inner.snapshot(KEY).expect("snapshot written");
    assert_eq!(saved, store.snapshot());
    assert_eq!(
        saved.to_css(),
        "#a {\n  color: blue !important;\n  margin: 0 !important;\n}"
    );
}

#[tokio::test(start_paused = true)]
async fn each_edit_restarts_the_quiet_period() {
    let storage = CountingStorage::default();
    let mut store = store_with(storage.clone());
    let mut events = store.subscribe();

    store.set_property("#a", "color", "red");
    sleep(Duration::from_millis(150)).await;
    store.set_property("#a", "color", "green");
    sleep(Duration::from_millis(150)).await;
    assert_eq!(storage.writes(), 0);

    assert_eq!(next_save_event(&mut events).await, StoreEvent::Persisted);
    assert_eq!(storage.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_mutation_broadcasts_css() {
    let mut store = store_with(MemoryStorage::new());
    let mut events = store.subscribe();

    store.set_property("#x", "color", "red");
    assert_eq!(
        events.recv().await.ok(),
        Some(StoreEvent::CssChanged(
            "#x {\n  color: red !important;\n}".to_owned()
        ))
    );
    store.remove_property("#x", "color");
    assert_eq!(
        events.recv().await.ok(),
        Some(StoreEvent::CssChanged(String::new()))
    );
    assert_eq!(store.css_text(), "");
    assert!(store.declarations("#x").is_none());
}

#[tokio::test(start_paused = true)]
async fn empty_selector_or_property_changes_nothing() {
    let storage = CountingStorage::default();
    let mut store = store_with(storage.clone());
    store.set_property("", "color", "red");
    store.set_property("#x", "", "red");
    store.remove_property("#missing", "color");
    assert!(!store.has_pending_save());
    sleep(Duration::from_secs(1)).await;
    assert_eq!(storage.writes(), 0);
    assert_eq!(store.export_text(), "");
}

#[tokio::test(start_paused = true)]
async fn reinserted_selector_renders_last() {
    let mut store = store_with(MemoryStorage::new());
    store.set_property("#a", "color", "red");
    store.set_property("#b", "color", "blue");
    store.remove_property("#a", "color");
    store.set_property("#a", "color", "red");
    assert_eq!(
        store.css_text(),
        "#b {\n  color: blue !important;\n}\n\n#a {\n  color: red !important;\n}"
    );
}

#[tokio::test(start_paused = true)]
async fn clearing_does_not_save_until_asked() {
    let storage = CountingStorage::default();
    let mut store = store_with(storage.clone());
    let mut events = store.subscribe();

    store.set_property("#a", "color", "red");
    assert_eq!(next_save_event(&mut events).await, StoreEvent::Persisted);

    store.clear_selector("#a");
    store.clear_all();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(storage.writes(), 1);
    assert!(storage.inner.snapshot(KEY).is_some_and(|saved| !saved.is_empty()));

    store.schedule_save();
    assert_eq!(next_save_event(&mut events).await, StoreEvent::Persisted);
    assert_eq!(storage.writes(), 2);
    assert!(storage.inner.snapshot(KEY).is_some_and(|saved| saved.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_edits_in_memory() {
    init_logging();
    let mut store = store_with(FullDisk);
    let mut events = store.subscribe();

    store.set_property("#a", "color", "red");
    match next_save_event(&mut events).await {
        StoreEvent::PersistFailed(message) => assert!(message.contains("disk full")),
        other => panic!("expected a failed save, got {other:?}"),
    }
    assert!(store.has_property("#a", "color"));
    assert_eq!(store.export_text(), "#a {\n  color: red !important;\n}");
}

#[tokio::test(start_paused = true)]
async fn hydrate_restores_saved_rules() -> Result<(), Error> {
    let storage = MemoryStorage::new();
    let mut saved = PatchMap::new();
    saved.set(".card", "padding", "8px");
    storage.insert(&storage_key("restyle", "example.com"), saved);

    let mut store = store_with(storage);
    let mut events = store.subscribe();
    assert!(store.hydrate().await?);
    assert_eq!(
        events.recv().await.ok(),
        Some(StoreEvent::CssChanged(
            ".card {\n  padding: 8px !important;\n}".to_owned()
        ))
    );
    assert!(!store.has_pending_save());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hydrate_without_snapshot_leaves_store_empty() -> Result<(), Error> {
    let mut store = store_with(MemoryStorage::new());
    assert!(!store.hydrate().await?);
    assert_eq!(store.css_text(), "");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn forget_site_drops_pending_save_and_snapshot() -> Result<(), Error> {
    let storage = CountingStorage::default();
    let mut seeded = PatchMap::new();
    seeded.set("#old", "color", "red");
    storage.inner.insert(KEY, seeded);

    let mut store = store_with(storage.clone());
    store.hydrate().await?;
    store.set_property("#a", "color", "red");
    store.forget_site().await?;

    sleep(Duration::from_secs(1)).await;
    assert_eq!(storage.writes(), 0);
    assert!(storage.inner.snapshot(KEY).is_none());
    assert_eq!(store.export_text(), "");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dispose_flushes_pending_save_and_withdraws_css() {
    let storage = CountingStorage::default();
    let mut store = store_with(storage.clone());
    let mut events = store.subscribe();

    store.set_property("#a", "color", "red");
    store.dispose().await;

    assert_eq!(storage.writes(), 1);
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            StoreEvent::CssChanged("#a {\n  color: red !important;\n}".to_owned()),
            StoreEvent::Persisted,
            StoreEvent::CssChanged(String::new()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn dispose_waits_for_a_save_already_writing() {
    let storage = SlowStorage::default();
    let mut store = store_with(storage.clone());
    let mut events = store.subscribe();

    store.set_property("#a", "color", "red");
    sleep(Duration::from_millis(210)).await;
    assert!(!store.has_pending_save());
    assert!(storage.inner.snapshot(KEY).is_none());

    store.dispose().await;
    assert!(storage.inner.snapshot(KEY).is_some_and(|saved| saved.has_declaration("#a", "color")));
    assert_eq!(next_save_event(&mut events).await, StoreEvent::Persisted);
}

#[tokio::test(start_paused = true)]
async fn forget_site_is_not_undone_by_a_save_already_writing() -> Result<(), Error> {
    let storage = SlowStorage::default();
    let mut store = store_with(storage.clone());

    store.set_property("#a", "color", "red");
    sleep(Duration::from_millis(210)).await;
    store.forget_site().await?;

    sleep(Duration::from_secs(1)).await;
    assert!(storage.inner.snapshot(KEY).is_none());
    Ok(())
}
