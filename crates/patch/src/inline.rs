//! Session-only overrides that are never persisted.

use crate::css_text::render_css_filtered;
use crate::map::{Declarations, PatchMap};
use css_selectors::DocumentQuery;
use picker::is_unique;

/// A patch layer for quick edits.
///
/// It has the same shape and mutation rules as the persisted store, but lives only as long as
/// the value does. When rendered against a document, rules whose selector does not match
/// exactly one element are left out, so an edit never leaks onto other elements after the
/// page changes underneath it.
#[derive(Clone, Debug, Default)]
pub struct InlinePatchLayer {
    patch: PatchMap,
}

impl InlinePatchLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if nothing changed (empty selector or property).
    pub fn set_property(&mut self, selector: &str, property: &str, value: &str) -> bool {
        self.patch.set(selector, property, value)
    }

    /// Returns false if the selector had no entry.
    pub fn remove_property(&mut self, selector: &str, property: &str) -> bool {
        self.patch.remove(selector, property)
    }

    /// Returns false if the selector had no entry.
    pub fn clear_selector(&mut self, selector: &str) -> bool {
        self.patch.remove_selector(selector)
    }

    pub fn clear(&mut self) {
        self.patch.clear();
    }

    pub fn declarations(&self, selector: &str) -> Option<&Declarations> {
        self.patch.declarations(selector)
    }

    /// True if `property` is set to a non-empty value for `selector`.
    pub fn has_property(&self, selector: &str, property: &str) -> bool {
        self.patch
            .declarations(selector)
            .and_then(|declarations| declarations.get(property))
            .is_some_and(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }

    /// CSS text for the rules whose selector currently matches exactly one element of `doc`.
    pub fn render<D: DocumentQuery>(&self, doc: &D) -> String {
        render_css_filtered(&self.patch, |selector| is_unique(doc, selector))
    }
}
