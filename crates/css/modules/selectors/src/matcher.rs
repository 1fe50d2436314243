//! CSS selector matching engine.
//! Spec: <https://www.w3.org/TR/selectors-3/>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, ElementAdapter, PseudoClass, SelectorList,
    SimpleSelector,
};

/// Match a selector list against an element.
/// Spec: Section 3, 4
pub fn matches_selector_list<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    list: &SelectorList,
) -> bool {
    list.selectors
        .iter()
        .any(|selector_item| matches_complex(adapter, element, selector_item))
}

/// Match a complex selector against an element.
/// Spec: Section 3, 11 — Right-to-left matching strategy
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
) -> bool {
    matches_from(adapter, sel, sel.rest.len(), element)
}

/// Compound at `position`, where 0 is `sel.first` and `n` is `sel.rest[n - 1]`.
fn compound_at(sel: &ComplexSelector, position: usize) -> Option<&CompoundSelector> {
    match position.checked_sub(1) {
        None => Some(&sel.first),
        Some(rest_index) => sel.rest.get(rest_index).map(|pair| &pair.1),
    }
}

/// Match the compound at `position` against `element`, then relate everything to its left.
/// Descendant and general sibling combinators backtrack over every candidate.
/// Spec: Section 11 — Combinators
fn matches_from<A: ElementAdapter>(
    adapter: &A,
    sel: &ComplexSelector,
    position: usize,
    element: A::Handle,
) -> bool {
    let Some(compound) = compound_at(sel, position) else {
        return false;
    };
    if !matches_compound(adapter, element, compound) {
        return false;
    }
    let Some(left_position) = position.checked_sub(1) else {
        return true;
    };
    let Some(&(combinator, _)) = sel.rest.get(left_position) else {
        return false;
    };
    match combinator {
        Combinator::Child => adapter
            .parent(element)
            .is_some_and(|parent_el| matches_from(adapter, sel, left_position, parent_el)),
        Combinator::Descendant => {
            let mut current_parent = adapter.parent(element);
            while let Some(ancestor_element) = current_parent {
                if matches_from(adapter, sel, left_position, ancestor_element) {
                    return true;
                }
                current_parent = adapter.parent(ancestor_element);
            }
            false
        }
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(|prev_el| matches_from(adapter, sel, left_position, prev_el)),
        Combinator::GeneralSibling => {
            let mut current_sibling = adapter.previous_sibling_element(element);
            while let Some(sibling_element) = current_sibling {
                if matches_from(adapter, sel, left_position, sibling_element) {
                    return true;
                }
                current_sibling = adapter.previous_sibling_element(sibling_element);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
/// Spec: Section 5–8
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(adapter, element, simple))
}

fn matches_simple<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    simple: &SimpleSelector,
) -> bool {
    match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(type_name) => adapter.tag_name(element) == type_name.as_str(),
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .element_id(element)
            .is_some_and(|value| value == id_value.as_str()),
        SimpleSelector::AttrExists { name } => adapter.attr(element, name).is_some(),
        SimpleSelector::AttrEquals { name, value } => adapter
            .attr(element, name)
            .is_some_and(|attr_value| attr_value == value.as_str()),
        SimpleSelector::Pseudo(pseudo) => matches_pseudo(adapter, element, *pseudo),
    }
}

/// Spec: Section 6.6.5 — Structural pseudo-classes
fn matches_pseudo<A: ElementAdapter>(adapter: &A, element: A::Handle, pseudo: PseudoClass) -> bool {
    match pseudo {
        PseudoClass::NthOfType(expr) => expr.matches(position_of_type(adapter, element)),
        PseudoClass::FirstOfType => position_of_type(adapter, element) == 1,
        PseudoClass::LastOfType => {
            let tag = adapter.tag_name(element);
            let mut current_sibling = adapter.next_sibling_element(element);
            while let Some(sibling_element) = current_sibling {
                if adapter.tag_name(sibling_element) == tag {
                    return false;
                }
                current_sibling = adapter.next_sibling_element(sibling_element);
            }
            true
        }
        PseudoClass::FirstChild => adapter.previous_sibling_element(element).is_none(),
        PseudoClass::LastChild => adapter.next_sibling_element(element).is_none(),
    }
}

/// 1-based position of `element` among its siblings with the same tag name.
/// Spec: Section 6.6.5.6 — `:nth-of-type()`
fn position_of_type<A: ElementAdapter>(adapter: &A, element: A::Handle) -> i32 {
    let tag = adapter.tag_name(element);
    let mut position = 1i32;
    let mut current_sibling = adapter.previous_sibling_element(element);
    while let Some(sibling_element) = current_sibling {
        if adapter.tag_name(sibling_element) == tag {
            position = position.saturating_add(1);
        }
        current_sibling = adapter.previous_sibling_element(sibling_element);
    }
    position
}
