//! Escaping for values spliced into selector text.

/// Characters that must be backslash-escaped inside an id or class token.
const SPECIAL_CHARS: &str = " !\"#$%&'()*+,./:;<=>?@[\\]^`{|}~";

/// Backslash-escape CSS metacharacters (and space) in an identifier or class token.
///
/// Other characters pass through untouched, so a token that starts with a digit still yields
/// an invalid selector; the uniqueness test rejects those and synthesis falls back.
pub fn escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for character in value.chars() {
        if SPECIAL_CHARS.contains(character) {
            out.push('\\');
        }
        out.push(character);
    }
    out
}

/// Escape embedded double quotes for use inside `[attr="..."]`.
pub fn escape_attr_value(value: &str) -> String {
    value.replace('"', "\\\"")
}
