//! Selector synthesis for a picked element.
//!
//! Candidates are tried in a fixed order and each one is checked against the live document
//! before it is accepted:
//!
//! 1. `#id` when the element has an id.
//! 2. A stable test/accessibility attribute, first qualified by tag, then bare.
//! 3. A `>`-joined ancestor path of at most [`MAX_PATH_SEGMENTS`] segments, built inner to
//!    outer and checked after every segment. An ancestor with an id ends the walk.
//!
//! Step 3 always produces something, so synthesis never fails; it may return a selector that
//! is not unique when the document gives it nothing better to work with.

use crate::escape::{escape_attr_value, escape_ident};
use css_selectors::DocumentQuery;
use log::{debug, trace};

/// Attributes that tend to survive redesigns, in priority order.
pub const STABLE_ATTRIBUTES: [&str; 6] = [
    "data-testid",
    "data-test",
    "data-cy",
    "data-qa",
    "aria-label",
    "name",
];

/// Longest attribute value (in characters) considered stable enough to select on.
pub const MAX_ATTR_VALUE_LEN: usize = 64;

/// Maximum number of segments in an ancestor path.
pub const MAX_PATH_SEGMENTS: usize = 6;

/// Maximum number of class tokens per path segment.
pub const MAX_CLASSES_PER_SEGMENT: usize = 2;

/// True if `selector` matches exactly one element. Invalid syntax counts as not unique.
pub fn is_unique<D: DocumentQuery>(doc: &D, selector: &str) -> bool {
    match doc.query_count(selector) {
        Ok(count) => count == 1,
        Err(err) => {
            trace!("rejecting candidate `{selector}`: {err}");
            false
        }
    }
}

/// Build a selector that (when possible) matches only `element`.
///
/// Always returns a non-empty string. Only structural properties of `element` are read, so
/// detached elements still get a selector, though it will not be unique in the document.
pub fn synthesize<D: DocumentQuery>(doc: &D, element: D::Handle) -> String {
    if let Some(selector) = id_selector(doc, element) {
        debug!("picked id selector `{selector}`");
        return selector;
    }
    if let Some(selector) = attribute_selector(doc, element) {
        debug!("picked attribute selector `{selector}`");
        return selector;
    }
    let selector = ancestor_path(doc, element);
    debug!("picked path selector `{selector}`");
    selector
}

fn id_selector<D: DocumentQuery>(doc: &D, element: D::Handle) -> Option<String> {
    let id = doc.element_id(element)?;
    let selector = format!("#{}", escape_ident(id));
    is_unique(doc, &selector).then_some(selector)
}

/// `[attr="value"]` for the first stable attribute with a usable value.
fn stable_attribute<D: DocumentQuery>(doc: &D, element: D::Handle) -> Option<String> {
    STABLE_ATTRIBUTES.iter().find_map(|name| {
        let value = doc.attr(element, name)?;
        (!value.is_empty() && value.chars().count() <= MAX_ATTR_VALUE_LEN)
            .then(|| format!("[{name}=\"{}\"]", escape_attr_value(value)))
    })
}

fn attribute_selector<D: DocumentQuery>(doc: &D, element: D::Handle) -> Option<String> {
    let fragment = stable_attribute(doc, element)?;
    let qualified = format!("{}{fragment}", doc.tag_name(element));
    if is_unique(doc, &qualified) {
        return Some(qualified);
    }
    is_unique(doc, &fragment).then_some(fragment)
}

/// `tag.class1.class2` plus `:nth-of-type(n)` when same-tag siblings exist.
fn path_segment<D: DocumentQuery>(doc: &D, node: D::Handle) -> String {
    let mut segment = doc.tag_name(node).to_owned();
    for class in doc
        .class_list(node)
        .into_iter()
        .take(MAX_CLASSES_PER_SEGMENT)
    {
        segment.push('.');
        segment.push_str(&escape_ident(class));
    }
    if doc.parent(node).is_some()
        && let Some(position) = position_among_same_tag(doc, node)
    {
        segment.push_str(&format!(":nth-of-type({position})"));
    }
    segment
}

/// 1-based position among same-tag siblings, or `None` if the tag is not repeated.
fn position_among_same_tag<D: DocumentQuery>(doc: &D, node: D::Handle) -> Option<usize> {
    let tag = doc.tag_name(node);
    let count_same = |start: Option<D::Handle>, forward: bool| {
        let mut count = 0usize;
        let mut current = start;
        while let Some(sibling) = current {
            if doc.tag_name(sibling) == tag {
                count += 1;
            }
            current = if forward {
                doc.next_sibling_element(sibling)
            } else {
                doc.previous_sibling_element(sibling)
            };
        }
        count
    };
    let before = count_same(doc.previous_sibling_element(node), false);
    let after = count_same(doc.next_sibling_element(node), true);
    (before + after > 0).then_some(before + 1)
}

fn ancestor_path<D: DocumentQuery>(doc: &D, element: D::Handle) -> String {
    let document_element = doc.document_element();
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(element);

    while let Some(node) = current
        && Some(node) != document_element
        && parts.len() < MAX_PATH_SEGMENTS
    {
        if let Some(id) = doc.element_id(node) {
            // Ids are taken as authoritative: stop climbing whether or not this is unique.
            parts.insert(0, format!("{}#{}", doc.tag_name(node), escape_ident(id)));
            let selector = parts.join(" > ");
            if !is_unique(doc, &selector) {
                debug!("id-anchored path `{selector}` is not unique; keeping it");
            }
            return selector;
        }

        parts.insert(0, path_segment(doc, node));
        let selector = parts.join(" > ");
        if is_unique(doc, &selector) {
            return selector;
        }
        current = doc.parent(node);
    }

    if parts.is_empty() {
        let tag = doc.tag_name(element);
        return if tag.is_empty() { "*".to_owned() } else { tag.to_owned() };
    }
    parts.join(" > ")
}
