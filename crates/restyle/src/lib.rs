//! Restyle: pick an element, override its styles for the current site, and keep the overrides
//! across sessions.
//!
//! This crate wires the picker and the patch store together: configuration, file-backed
//! storage, the inspector session that tracks the picked element, and the command-line front
//! end used by the `restyle` binary.

pub mod cli;
pub mod config;
pub mod session;
pub mod storage;

pub use config::RestyleConfig;
pub use session::{InspectorSession, Selection, TOOL_UI_IDS, TOOL_UI_ROOT_ID};
pub use storage::JsonFileStorage;
