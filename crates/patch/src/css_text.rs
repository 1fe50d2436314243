//! Rendering a patch map as `!important` CSS rules.

use crate::map::PatchMap;

/// Render every rule in insertion order.
///
/// Each rule is `selector {`, one `  property: value !important;` line per declaration, and
/// `}`. Rules are separated by a blank line.
pub fn render_css(map: &PatchMap) -> String {
    render_css_filtered(map, |_| true)
}

/// Like [`render_css`], but only for selectors accepted by `keep`.
pub fn render_css_filtered<F>(map: &PatchMap, mut keep: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut rules = Vec::with_capacity(map.len());
    for (selector, declarations) in map.iter() {
        if declarations.is_empty() || !keep(selector) {
            continue;
        }
        let mut block = format!("{selector} {{\n");
        for (property, value) in declarations {
            block.push_str("  ");
            block.push_str(property);
            block.push_str(": ");
            block.push_str(value);
            block.push_str(" !important;\n");
        }
        block.push('}');
        rules.push(block);
    }
    rules.join("\n\n")
}
