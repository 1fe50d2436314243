//! Style override patches.
//!
//! A patch is an ordered map of selector → property → value. [`OverridePatchStore`] owns the
//! persisted patch for one page host: every mutation re-renders the injectable CSS text and
//! (for property edits) re-arms a debounced save. [`InlinePatchLayer`] is a second,
//! session-only layer that is never persisted.

mod css_text;
mod debounce;
mod inline;
mod map;
mod storage;
mod store;

pub use css_text::{render_css, render_css_filtered};
pub use debounce::Debouncer;
pub use inline::InlinePatchLayer;
pub use map::{Declarations, PatchMap};
pub use storage::{MemoryStorage, PatchStorage, storage_key};
pub use store::{DEFAULT_SAVE_DELAY, OverridePatchStore, StoreEvent};
