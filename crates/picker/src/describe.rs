//! Human-readable element labels for hover cards and breadcrumbs.

use css_selectors::ElementAdapter;

/// Classes shown in a label; labels are for people, so a few more than selectors use.
const LABEL_CLASSES: usize = 3;

/// Marker that replaces the outer part of a truncated breadcrumb.
pub const PATH_ELLIPSIS: &str = "...";

/// `tag#id.class1.class2.class3`, unescaped.
pub fn describe_element<A: ElementAdapter>(doc: &A, element: A::Handle) -> String {
    let mut label = doc.tag_name(element).to_owned();
    if let Some(id) = doc.element_id(element) {
        label.push('#');
        label.push_str(id);
    }
    let classes = doc.class_list(element);
    if !classes.is_empty() {
        label.push('.');
        label.push_str(
            &classes
                .into_iter()
                .take(LABEL_CLASSES)
                .collect::<Vec<_>>()
                .join("."),
        );
    }
    label
}

/// Breadcrumb labels from outermost to `element`, skipping `html` and `body`.
///
/// Paths deeper than `max_depth` keep their innermost `max_depth` entries behind a leading
/// [`PATH_ELLIPSIS`]. An element with no labelled ancestry yields its own label.
pub fn element_path<A: ElementAdapter>(
    doc: &A,
    element: A::Handle,
    max_depth: usize,
) -> Vec<String> {
    let mut labels = Vec::new();
    let mut current = Some(element);
    while let Some(node) = current
        && doc.tag_name(node) != "html"
    {
        if doc.tag_name(node) != "body" {
            labels.push(describe_element(doc, node));
        }
        current = doc.parent(node);
    }
    labels.reverse();
    if labels.is_empty() {
        return vec![describe_element(doc, element)];
    }
    if labels.len() > max_depth {
        let mut truncated = Vec::with_capacity(max_depth + 1);
        truncated.push(PATH_ELLIPSIS.to_owned());
        truncated.extend(labels.split_off(labels.len() - max_depth));
        return truncated;
    }
    labels
}

/// True if `element` or one of its ancestors carries one of the tool's own ids.
pub fn is_inside_tool_ui<A: ElementAdapter>(
    doc: &A,
    element: A::Handle,
    reserved_ids: &[&str],
) -> bool {
    let mut current = Some(element);
    while let Some(node) = current {
        if doc
            .element_id(node)
            .is_some_and(|id| reserved_ids.contains(&id))
        {
            return true;
        }
        current = doc.parent(node);
    }
    false
}
