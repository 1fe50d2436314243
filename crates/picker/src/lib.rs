//! Element picking helpers: selector synthesis, escaping and element labels.
//!
//! Everything here is generic over [`css_selectors::DocumentQuery`], so the same code runs
//! against a live page adapter or an in-memory document in tests.

mod describe;
mod escape;
mod synthesize;

pub use describe::{PATH_ELLIPSIS, describe_element, element_path, is_inside_tool_ui};
pub use escape::{escape_attr_value, escape_ident};
pub use synthesize::{
    MAX_ATTR_VALUE_LEN, MAX_CLASSES_PER_SEGMENT, MAX_PATH_SEGMENTS, STABLE_ATTRIBUTES, is_unique,
    synthesize,
};
