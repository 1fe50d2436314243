//! Selectors Level 3 — parsing and element matching.
//! Spec: <https://www.w3.org/TR/selectors-3/>
//!
//! This module implements the subset needed to query a document with the selectors the
//! picker produces (and a little more):
//! - Type, universal, class, id, attribute presence and attribute equals selectors
//! - Structural pseudo-classes: `:nth-of-type()`, `:first-of-type`, `:last-of-type`,
//!   `:first-child`, `:last-child`
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - CSS escapes inside identifiers and strings
//!
//! Unsupported or malformed input is rejected with a [`SelectorParseError`] instead of being
//! guessed at, the same way `querySelectorAll` throws on a bad selector.

mod matcher;
mod parser;

// Re-export public API
pub use matcher::{matches_complex, matches_compound, matches_selector_list};
pub use parser::{SelectorParseError, parse_complex_selector, parse_selector_list};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
///
/// Spec references:
/// - Section 3: Selectors overview and element matching
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any. The document node itself is not an element.
    /// Spec: Section 11 — Combinators (for tree relationships)
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element (skip non-elements if your DOM has mixed nodes).
    /// Spec: Section 11 — Sibling combinators
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Next sibling element (skip non-elements if your DOM has mixed nodes).
    /// Spec: Section 6.6.5 — Structural pseudo-classes
    fn next_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase (per HTML parsing conventions).
    /// Spec: Section 5 — Type selectors
    fn tag_name(&self, element: Self::Handle) -> &str;

    /// Returns the attribute value if present.
    /// Spec: Section 8 — Attribute selectors
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;

    /// Returns Some(id) if the element has a non-empty id attribute, else None.
    /// Spec: Section 7 — ID selectors
    fn element_id(&self, element: Self::Handle) -> Option<&str> {
        self.attr(element, "id").filter(|id| !id.is_empty())
    }

    /// Class tokens in document order.
    /// Spec: Section 6 — Class selectors
    fn class_list(&self, element: Self::Handle) -> Vec<&str> {
        self.attr(element, "class")
            .map(|classes| classes.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// True if the element has the given class token.
    /// Spec: Section 6 — Class selectors
    fn has_class(&self, element: Self::Handle, class: &str) -> bool {
        self.attr(element, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|token| token == class))
    }
}

/// Whole-document access on top of [`ElementAdapter`]: the root element and live queries.
pub trait DocumentQuery: ElementAdapter {
    /// The document's root element (`<html>` for HTML documents).
    fn document_element(&self) -> Option<Self::Handle>;

    /// All connected elements matching `selector`, in tree order.
    ///
    /// # Errors
    /// Returns an error if `selector` is not valid selector syntax.
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Handle>, SelectorParseError>;

    /// Number of connected elements matching `selector`.
    ///
    /// # Errors
    /// Returns an error if `selector` is not valid selector syntax.
    fn query_count(&self, selector: &str) -> Result<usize, SelectorParseError> {
        self.query_all(selector).map(|matched| matched.len())
    }
}

/// An `An+B` expression as used by `:nth-of-type()`.
/// Spec: Section 6.6.5.2 — `:nth-child()` pseudo-class notation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NthExpr {
    pub step: i32,
    pub offset: i32,
}

impl NthExpr {
    /// True if the 1-based `index` is selected by this expression.
    ///
    /// Evaluated in `i64` so offsets at the `i32` limits cannot overflow.
    pub fn matches(self, index: i32) -> bool {
        let diff = i64::from(index) - i64::from(self.offset);
        if self.step == 0 {
            return diff == 0;
        }
        let step = i64::from(self.step);
        diff % step == 0 && diff / step >= 0
    }
}

/// Structural pseudo-classes (subset).
/// Spec: Section 6.6.5
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    NthOfType(NthExpr),
    FirstOfType,
    LastOfType,
    FirstChild,
    LastChild,
}

/// Simple selectors (subset).
/// Spec: Section 5, 6, 7, 8
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// Spec: Section 5 — Type selectors (stored lowercase)
    Type(String),
    /// Spec: Section 6 — Class selectors
    Class(String),
    /// Spec: Section 7 — ID selectors
    IdSelector(String),
    /// Spec: Section 8 — Attribute selectors [attr]
    AttrExists { name: String },
    /// Spec: Section 8 — Attribute selectors [attr=value]
    AttrEquals { name: String, value: String },
    /// Spec: Section 6.6 — Pseudo-classes
    Pseudo(PseudoClass),
    /// Universal selector '*'.
    /// Spec: Section 5 — Universal selector
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
/// Spec: Section 5 — Simple selector sequences
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

/// Combinators between compounds.
/// Spec: Section 11 — Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector is one or more compounds separated by combinators.
/// `rest` holds each following compound with the combinator to its left.
/// Spec: Section 3, 11
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

/// A selector list separated by commas.
/// Spec: Section 4 — Groups of selectors
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
