//! The inspector session: one picked element and the site's override store.

use anyhow::Error;
use css_selectors::DocumentQuery;
use log::{debug, info};
use patch::{OverridePatchStore, PatchStorage};
use picker::{describe_element, is_inside_tool_ui, synthesize};

/// Id of the root element of the tool's own UI.
pub const TOOL_UI_ROOT_ID: &str = "__restyle_root__";

/// Ids the tool gives its own elements: root, toolbar, hover card and its drag handle, hover
/// overlay and label. Elements carrying one, or inside one, cannot be picked.
pub const TOOL_UI_IDS: [&str; 6] = [
    TOOL_UI_ROOT_ID,
    "__restyle_toolbar__",
    "__restyle_hovercard__",
    "__restyle_hovercard_handle__",
    "__restyle_overlay__",
    "__restyle_label__",
];

/// What the panel shows about the picked element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub selector: String,
    pub tag: String,
    /// Empty if the element has no id
    pub id: String,
    /// The raw `class` attribute, empty if absent
    pub class_name: String,
}

/// Tracks the current selection by selector string, never by element, so edits keep applying
/// to whatever the selector matches when the CSS is injected.
#[derive(Debug)]
pub struct InspectorSession<S: PatchStorage> {
    store: OverridePatchStore<S>,
    selection: Option<Selection>,
}

impl<S: PatchStorage> InspectorSession<S> {
    pub fn new(store: OverridePatchStore<S>) -> Self {
        Self {
            store,
            selection: None,
        }
    }

    pub fn store(&self) -> &OverridePatchStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OverridePatchStore<S> {
        &mut self.store
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Pick `element`. Returns `None` (keeping the previous selection) for elements of the
    /// tool's own UI.
    pub fn select<D: DocumentQuery>(&mut self, doc: &D, element: D::Handle) -> Option<Selection> {
        if is_inside_tool_ui(doc, element, &TOOL_UI_IDS) {
            debug!("ignoring pick inside the tool UI");
            return None;
        }
        let selection = Selection {
            selector: synthesize(doc, element),
            tag: doc.tag_name(element).to_owned(),
            id: doc.element_id(element).unwrap_or_default().to_owned(),
            class_name: doc.attr(element, "class").unwrap_or_default().to_owned(),
        };
        info!(
            "selected {} as `{}`",
            describe_element(doc, element),
            selection.selector
        );
        self.selection = Some(selection.clone());
        Some(selection)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Override `property` on the selection. Both inputs are trimmed; returns false (and
    /// changes nothing) if either is empty or nothing is selected.
    pub fn apply(&mut self, property: &str, value: &str) -> bool {
        let (property, value) = (property.trim(), value.trim());
        if property.is_empty() || value.is_empty() {
            return false;
        }
        let Some(selection) = &self.selection else {
            return false;
        };
        self.store
            .set_property(&selection.selector, property, value);
        true
    }

    /// Drop the override of `property` on the selection. Returns false if there is nothing to
    /// remove from.
    pub fn remove(&mut self, property: &str) -> bool {
        let property = property.trim();
        if property.is_empty() {
            return false;
        }
        let Some(selection) = &self.selection else {
            return false;
        };
        let had = self.store.has_property(&selection.selector, property);
        self.store.remove_property(&selection.selector, property);
        had
    }

    /// The full CSS text of the site's overrides.
    pub fn export(&self) -> String {
        self.store.export_text()
    }

    /// Forget everything for this site: overrides, selection and the stored copy.
    ///
    /// # Errors
    /// Returns an error if the stored copy could not be deleted.
    pub async fn clear_site(&mut self) -> Result<(), Error> {
        self.selection = None;
        self.store.forget_site().await
    }

    pub fn into_store(self) -> OverridePatchStore<S> {
        self.store
    }
}
