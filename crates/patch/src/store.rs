//! The persisted override store for one page host.

use crate::debounce::Debouncer;
use crate::map::{Declarations, PatchMap};
use crate::storage::PatchStorage;
use anyhow::Error;
use core::time::Duration;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// Quiet period between the last property edit and the save it triggers.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(200);

const EVENT_CAPACITY: usize = 64;

/// Notifications from an [`OverridePatchStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The injectable CSS text was regenerated. Carries the new text.
    CssChanged(String),
    /// A debounced save completed.
    Persisted,
    /// A debounced save failed. The in-memory patch is unaffected.
    PersistFailed(String),
}

/// Owns the override patch for one storage key.
///
/// Every mutation re-renders the CSS text synchronously and broadcasts it. Property edits also
/// schedule a save that is debounced by the configured delay; the snapshot is taken when the
/// save fires, so a burst of edits produces one write of the final state. Clearing a selector
/// or the whole patch does not save on its own; call [`OverridePatchStore::schedule_save`].
#[derive(Debug)]
pub struct OverridePatchStore<S: PatchStorage> {
    patch: Arc<Mutex<PatchMap>>,
    storage: Arc<S>,
    storage_key: String,
    saver: Debouncer,
    events: broadcast::Sender<StoreEvent>,
    css_text: String,
}

impl<S: PatchStorage> OverridePatchStore<S> {
    /// A store with an empty patch. Call [`OverridePatchStore::hydrate`] to load saved state.
    pub fn new(handle: Handle, storage: S, storage_key: String, save_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            patch: Arc::new(Mutex::new(PatchMap::new())),
            storage: Arc::new(storage),
            storage_key,
            saver: Debouncer::new(handle, save_delay),
            events,
            css_text: String::new(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Replace the in-memory patch with the stored snapshot, if there is one, and regenerate
    /// the CSS text. Returns whether a snapshot was found.
    ///
    /// # Errors
    /// Returns an error if the storage read fails. The in-memory patch is left as it was.
    pub async fn hydrate(&mut self) -> Result<bool, Error> {
        let Some(mut stored) = self.storage.get(&self.storage_key).await? else {
            debug!("no saved overrides under {}", self.storage_key);
            return Ok(false);
        };
        stored.prune_empty();
        info!(
            "loaded {} overridden selectors from {}",
            stored.len(),
            self.storage_key
        );
        *self.patch.lock() = stored;
        self.regenerate();
        Ok(true)
    }

    /// Set one declaration, regenerate, and schedule a save. Empty selector or property is a
    /// no-op. The value is stored verbatim.
    pub fn set_property(&mut self, selector: &str, property: &str, value: &str) {
        let changed = self.patch.lock().set(selector, property, value);
        if !changed {
            trace!("ignoring empty override for {selector:?}");
            return;
        }
        self.regenerate();
        self.schedule_save();
    }

    /// Remove one declaration, regenerate, and schedule a save. No-op if the selector has no
    /// entry. Removing the last property removes the selector.
    pub fn remove_property(&mut self, selector: &str, property: &str) {
        let changed = self.patch.lock().remove(selector, property);
        if !changed {
            return;
        }
        self.regenerate();
        self.schedule_save();
    }

    /// Drop a selector's whole block and regenerate. Does not save.
    pub fn clear_selector(&mut self, selector: &str) {
        let changed = self.patch.lock().remove_selector(selector);
        if changed {
            self.regenerate();
        }
    }

    /// Empty the patch and regenerate. Does not save.
    pub fn clear_all(&mut self) {
        self.patch.lock().clear();
        self.regenerate();
    }

    /// The current CSS text, rendered freshly. Never touches storage.
    pub fn export_text(&self) -> String {
        self.patch.lock().to_css()
    }

    /// The CSS text as of the last regeneration.
    pub fn css_text(&self) -> &str {
        &self.css_text
    }

    pub fn snapshot(&self) -> PatchMap {
        self.patch.lock().clone()
    }

    pub fn declarations(&self, selector: &str) -> Option<Declarations> {
        self.patch.lock().declarations(selector).cloned()
    }

    pub fn has_property(&self, selector: &str, property: &str) -> bool {
        self.patch.lock().has_declaration(selector, property)
    }

    /// True while a debounced save is waiting for its timer.
    pub fn has_pending_save(&self) -> bool {
        self.saver.is_pending()
    }

    /// Arm (or re-arm) the debounced save of the current patch.
    pub fn schedule_save(&mut self) {
        let patch = Arc::clone(&self.patch);
        let storage = Arc::clone(&self.storage);
        let storage_key = self.storage_key.clone();
        let events = self.events.clone();
        self.saver.schedule(move || {
            let snapshot = patch.lock().clone();
            persist(storage, storage_key, snapshot, events)
        });
    }

    /// Empty the patch, drop any pending save, and delete the stored snapshot. A save already in
    /// progress is awaited first so it cannot recreate the snapshot.
    ///
    /// # Errors
    /// Returns an error if the storage delete fails. The in-memory patch is already empty.
    pub async fn forget_site(&mut self) -> Result<(), Error> {
        self.saver.cancel();
        self.saver.join_started().await;
        self.clear_all();
        self.storage.remove(&self.storage_key).await?;
        info!("forgot overrides under {}", self.storage_key);
        Ok(())
    }

    /// End the session: wait for a save already in progress, write out one that is still
    /// waiting, then withdraw the CSS text (a final empty [`StoreEvent::CssChanged`]).
    pub async fn dispose(mut self) {
        let waiting = self.saver.cancel();
        if self.saver.join_started().await {
            debug!("waited for in-flight save of {}", self.storage_key);
        }
        if waiting {
            debug!("flushing pending save for {}", self.storage_key);
            let snapshot = self.snapshot();
            persist(
                Arc::clone(&self.storage),
                self.storage_key.clone(),
                snapshot,
                self.events.clone(),
            )
            .await;
        }
        self.css_text.clear();
        send_event(&self.events, StoreEvent::CssChanged(String::new()));
    }

    fn regenerate(&mut self) {
        self.css_text = self.patch.lock().to_css();
        send_event(&self.events, StoreEvent::CssChanged(self.css_text.clone()));
    }
}

async fn persist<S: PatchStorage>(
    storage: Arc<S>,
    storage_key: String,
    snapshot: PatchMap,
    events: broadcast::Sender<StoreEvent>,
) {
    let event = match storage.set(&storage_key, snapshot).await {
        Ok(()) => {
            debug!("saved overrides under {storage_key}");
            StoreEvent::Persisted
        }
        Err(err) => {
            warn!("failed to save overrides under {storage_key}: {err:#}");
            StoreEvent::PersistFailed(format!("{err:#}"))
        }
    };
    send_event(&events, event);
}

fn send_event(events: &broadcast::Sender<StoreEvent>, event: StoreEvent) {
    if events.send(event).is_err() {
        trace!("no store subscribers");
    }
}
