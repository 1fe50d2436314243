//! The selector → property → value override map.

use crate::css_text::render_css;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Property → value, in insertion order.
pub type Declarations = IndexMap<String, String>;

/// Selector → declarations, in insertion order.
///
/// Selectors are compared as plain strings, so `#a` and `html #a` are different entries even
/// when they match the same element. A selector never maps to an empty declaration block:
/// removing its last property removes the selector. Removing an entry and adding it back puts
/// it at the end.
///
/// Serializes as a JSON object of objects, which is the persisted snapshot format.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchMap {
    rules: IndexMap<String, Declarations>,
}

impl PatchMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `property: value` for `selector`. Returns false (and does nothing) if the selector
    /// or property is empty. The value is stored verbatim.
    pub fn set(&mut self, selector: &str, property: &str, value: &str) -> bool {
        if selector.is_empty() || property.is_empty() {
            return false;
        }
        self.rules
            .entry(selector.to_owned())
            .or_default()
            .insert(property.to_owned(), value.to_owned());
        true
    }

    /// Remove one property. Returns false if `selector` has no entry.
    pub fn remove(&mut self, selector: &str, property: &str) -> bool {
        let Some(declarations) = self.rules.get_mut(selector) else {
            return false;
        };
        declarations.shift_remove(property);
        if declarations.is_empty() {
            self.rules.shift_remove(selector);
        }
        true
    }

    /// Remove a selector's whole block. Returns false if it had none.
    pub fn remove_selector(&mut self, selector: &str) -> bool {
        self.rules.shift_remove(selector).is_some()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Drop selectors with no declarations. Only snapshots loaded from outside can contain them.
    pub fn prune_empty(&mut self) {
        self.rules
            .retain(|_, declarations| !declarations.is_empty());
    }

    pub fn declarations(&self, selector: &str) -> Option<&Declarations> {
        self.rules.get(selector)
    }

    pub fn has_declaration(&self, selector: &str, property: &str) -> bool {
        self.rules
            .get(selector)
            .is_some_and(|declarations| declarations.contains_key(property))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of selectors.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Declarations)> {
        self.rules
            .iter()
            .map(|(selector, declarations)| (selector.as_str(), declarations))
    }

    /// The injectable CSS text for this map.
    pub fn to_css(&self) -> String {
        render_css(self)
    }
}
