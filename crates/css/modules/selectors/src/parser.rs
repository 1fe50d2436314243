//! CSS selector parsing.
//! Spec: <https://www.w3.org/TR/selectors-3/>
//! Escapes and identifiers: <https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, NthExpr, PseudoClass, SelectorList,
    SimpleSelector,
};
use thiserror::Error;

/// Reasons a selector string is rejected. Offsets count characters, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    #[error("empty selector")]
    Empty,
    #[error("expected a selector at offset {0}")]
    ExpectedSelector(usize),
    #[error("expected an identifier at offset {0}")]
    ExpectedIdentifier(usize),
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unterminated attribute selector starting at offset {0}")]
    UnterminatedAttribute(usize),
    #[error("unsupported attribute operator at offset {0}")]
    UnsupportedAttributeOperator(usize),
    #[error("unknown pseudo-class `{0}`")]
    UnknownPseudoClass(String),
    #[error("pseudo-elements are not supported")]
    PseudoElement,
    #[error("invalid An+B expression `{0}`")]
    InvalidNth(String),
}

type ParseResult<T> = Result<T, SelectorParseError>;

/// Largest code point allowed in an escape.
/// Spec: CSS Syntax 3 — "maximum allowed code point"
const MAX_CODE_POINT: u32 = 0x0010_FFFF;

/// Cursor over a selector string.
struct SelectorTokenizer {
    /// Input decoded into characters so offsets are stable for non-ASCII text.
    input: Vec<char>,
    /// Current cursor index into `input`.
    index: usize,
}

impl SelectorTokenizer {
    #[inline]
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            index: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.input.get(self.index).copied()
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.input.get(self.index.saturating_add(ahead)).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Skip whitespace, returning whether any was seen.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.index;
        while self.peek().is_some_and(is_css_whitespace) {
            self.bump();
        }
        self.index != start
    }

    /// Error for whatever sits under the cursor.
    fn unexpected(&self) -> SelectorParseError {
        self.peek().map_or(
            SelectorParseError::ExpectedSelector(self.index),
            |found| SelectorParseError::UnexpectedChar {
                found,
                offset: self.index,
            },
        )
    }

    /// True if the cursor sits on a backslash that starts a valid escape.
    /// Spec: CSS Syntax 3 — "check if two code points are a valid escape"
    fn at_escape(&self, ahead: usize) -> bool {
        self.peek_at(ahead) == Some('\\') && self.peek_at(ahead.saturating_add(1)) != Some('\n')
    }

    /// True if an identifier starts at the cursor.
    /// Spec: CSS Syntax 3 — "check if three code points would start an ident sequence"
    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some('-') => {
                self.peek_at(1).is_some_and(|next| next == '-' || is_name_start(next))
                    || self.at_escape(1)
            }
            Some('\\') => self.at_escape(0),
            Some(current) => is_name_start(current),
            None => false,
        }
    }

    /// Consume an escape; the cursor sits just after the backslash.
    fn consume_escape(&mut self) -> char {
        let Some(first) = self.peek() else {
            return char::REPLACEMENT_CHARACTER;
        };
        if !first.is_ascii_hexdigit() {
            self.bump();
            return first;
        }
        let mut code_point: u32 = 0;
        let mut digits = 0;
        while digits < 6
            && let Some(digit) = self.peek().and_then(|hex| hex.to_digit(16))
        {
            code_point = code_point.saturating_mul(16).saturating_add(digit);
            digits += 1;
            self.bump();
        }
        if self.peek().is_some_and(is_css_whitespace) {
            self.bump();
        }
        if code_point == 0 || code_point > MAX_CODE_POINT {
            return char::REPLACEMENT_CHARACTER;
        }
        char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Consume an identifier, resolving escapes. Case is preserved.
    fn consume_ident(&mut self) -> ParseResult<String> {
        if !self.at_ident_start() {
            return Err(SelectorParseError::ExpectedIdentifier(self.index));
        }
        let mut out = String::new();
        while let Some(current) = self.peek() {
            if is_name_char(current) {
                out.push(current);
                self.bump();
            } else if self.at_escape(0) {
                self.bump();
                out.push(self.consume_escape());
            } else {
                break;
            }
        }
        Ok(out)
    }

    /// Consume a quoted string; the cursor sits on the opening quote.
    fn consume_string(&mut self) -> ParseResult<String> {
        let start = self.index;
        let Some(quote) = self.peek() else {
            return Err(SelectorParseError::UnterminatedString(start));
        };
        self.bump();
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(SelectorParseError::UnterminatedString(start)),
                Some(current) if current == quote => {
                    self.bump();
                    return Ok(out);
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        // Escaped newline is a line continuation.
                        Some('\n') => self.bump(),
                        None => {}
                        Some(_) => out.push(self.consume_escape()),
                    }
                }
                Some(current) => {
                    out.push(current);
                    self.bump();
                }
            }
        }
    }

    /// Parse an attribute selector, supporting `[name]` and `[name=value]` (quoted or bare).
    /// Spec: Section 8 — Attribute selectors
    fn consume_attr(&mut self) -> ParseResult<SimpleSelector> {
        let start = self.index;
        // skip '['
        self.bump();
        self.skip_whitespace();
        let name = self.consume_ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let selector = match self.peek() {
            Some(']') => SimpleSelector::AttrExists { name },
            Some('=') => {
                self.bump();
                self.skip_whitespace();
                let value = match self.peek() {
                    Some('"' | '\'') => self.consume_string()?,
                    None => return Err(SelectorParseError::UnterminatedAttribute(start)),
                    Some(_) => self.consume_ident()?,
                };
                self.skip_whitespace();
                SimpleSelector::AttrEquals { name, value }
            }
            Some('~' | '|' | '^' | '$' | '*') => {
                return Err(SelectorParseError::UnsupportedAttributeOperator(self.index));
            }
            None => return Err(SelectorParseError::UnterminatedAttribute(start)),
            Some(_) => return Err(self.unexpected()),
        };
        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(selector)
            }
            None => Err(SelectorParseError::UnterminatedAttribute(start)),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Parse a pseudo-class following ':'.
    /// Spec: Section 6.6 — Pseudo-classes
    fn consume_pseudo(&mut self) -> ParseResult<SimpleSelector> {
        // skip ':'
        self.bump();
        if self.peek() == Some(':') {
            return Err(SelectorParseError::PseudoElement);
        }
        let name = self.consume_ident()?.to_ascii_lowercase();
        if self.peek() == Some('(') {
            self.bump();
            let start = self.index;
            while self.peek().is_some_and(|current| current != ')') {
                self.bump();
            }
            if self.peek().is_none() {
                return Err(SelectorParseError::ExpectedSelector(self.index));
            }
            let argument: String = self
                .input
                .get(start..self.index)
                .unwrap_or_default()
                .iter()
                .collect();
            self.bump();
            return match name.as_str() {
                "nth-of-type" => Ok(SimpleSelector::Pseudo(PseudoClass::NthOfType(
                    parse_nth(&argument)?,
                ))),
                _ => Err(SelectorParseError::UnknownPseudoClass(name)),
            };
        }
        let pseudo = match name.as_str() {
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            _ => return Err(SelectorParseError::UnknownPseudoClass(name)),
        };
        Ok(SimpleSelector::Pseudo(pseudo))
    }

    /// Parse a compound selector. Returns an empty compound if nothing selector-like is at the
    /// cursor; callers decide whether that is an error.
    /// Spec: Section 5 — Simple selector sequences
    fn consume_compound(&mut self) -> ParseResult<CompoundSelector> {
        let mut compound = CompoundSelector::default();
        if self.peek() == Some('*') {
            self.bump();
            compound.simples.push(SimpleSelector::Universal);
        } else if self.at_ident_start() {
            let tag = self.consume_ident()?;
            compound
                .simples
                .push(SimpleSelector::Type(tag.to_ascii_lowercase()));
        }
        loop {
            let simple = match self.peek() {
                Some('#') => {
                    self.bump();
                    SimpleSelector::IdSelector(self.consume_ident()?)
                }
                Some('.') => {
                    self.bump();
                    SimpleSelector::Class(self.consume_ident()?)
                }
                Some('[') => self.consume_attr()?,
                Some(':') => self.consume_pseudo()?,
                _ => break,
            };
            compound.simples.push(simple);
        }
        Ok(compound)
    }

    /// Parse one complex selector, stopping before a ',' or the end of input.
    /// Spec: Section 11 — Combinators
    fn consume_complex(&mut self) -> ParseResult<ComplexSelector> {
        self.skip_whitespace();
        let first = self.consume_compound()?;
        if first.simples.is_empty() {
            return Err(self.unexpected());
        }
        let mut rest = Vec::new();
        loop {
            let saw_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::AdjacentSibling,
                Some('~') => Combinator::GeneralSibling,
                Some(_) if saw_whitespace => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            let compound = self.consume_compound()?;
            if compound.simples.is_empty() {
                return Err(self.unexpected());
            }
            rest.push((combinator, compound));
        }
        Ok(ComplexSelector { first, rest })
    }
}

/// Parse the argument of `:nth-of-type()`.
/// Spec: Section 6.6.5.2 — `an+b` notation
fn parse_nth(argument: &str) -> ParseResult<NthExpr> {
    let compact: String = argument
        .chars()
        .filter(|current| !is_css_whitespace(*current))
        .collect::<String>()
        .to_ascii_lowercase();
    let invalid = || SelectorParseError::InvalidNth(argument.trim().to_owned());
    match compact.as_str() {
        "odd" => return Ok(NthExpr { step: 2, offset: 1 }),
        "even" => return Ok(NthExpr { step: 2, offset: 0 }),
        "" => return Err(invalid()),
        _ => {}
    }
    let Some((step_text, offset_text)) = compact.split_once('n') else {
        let offset = compact.parse::<i32>().map_err(|_| invalid())?;
        return Ok(NthExpr { step: 0, offset });
    };
    let step = match step_text {
        "" | "+" => 1,
        "-" => -1,
        text => text.parse::<i32>().map_err(|_| invalid())?,
    };
    let offset = if offset_text.is_empty() {
        0
    } else if offset_text.starts_with(['+', '-']) {
        offset_text.parse::<i32>().map_err(|_| invalid())?
    } else {
        return Err(invalid());
    };
    Ok(NthExpr { step, offset })
}

/// Parse a selector list from CSS text.
/// Spec: Section 3, 4, 5–8, 11
///
/// # Errors
/// Returns an error for empty input, syntax the engine does not support, or malformed selectors.
pub fn parse_selector_list(input: &str) -> ParseResult<SelectorList> {
    let mut tokens = SelectorTokenizer::new(input);
    tokens.skip_whitespace();
    if tokens.peek().is_none() {
        return Err(SelectorParseError::Empty);
    }
    let mut list = SelectorList::default();
    loop {
        list.selectors.push(tokens.consume_complex()?);
        match tokens.peek() {
            None => return Ok(list),
            Some(',') => tokens.bump(),
            Some(_) => return Err(tokens.unexpected()),
        }
    }
}

/// Parse one complex selector (no commas).
/// Spec: Section 11 — Combinators; Section 5–8 — simple selectors
///
/// # Errors
/// Returns an error for empty input, a selector list, or malformed selectors.
pub fn parse_complex_selector(input: &str) -> ParseResult<ComplexSelector> {
    let mut tokens = SelectorTokenizer::new(input);
    tokens.skip_whitespace();
    if tokens.peek().is_none() {
        return Err(SelectorParseError::Empty);
    }
    let complex = tokens.consume_complex()?;
    match tokens.peek() {
        None => Ok(complex),
        Some(_) => Err(tokens.unexpected()),
    }
}

/// Whitespace per CSS Syntax (TAB, LF, FF, CR, SPACE).
///
/// Spec: <https://www.w3.org/TR/css-syntax-3/#whitespace>
const fn is_css_whitespace(character: char) -> bool {
    matches!(
        character,
        '\u{0009}' | '\u{000A}' | '\u{000C}' | '\u{000D}' | '\u{0020}'
    )
}

/// Spec: CSS Syntax 3 — "ident-start code point"
const fn is_name_start(character: char) -> bool {
    character.is_ascii_alphabetic() || character == '_' || !character.is_ascii()
}

/// Spec: CSS Syntax 3 — "ident code point"
const fn is_name_char(character: char) -> bool {
    is_name_start(character) || character.is_ascii_digit() || character == '-'
}

#[cfg(test)]
#[allow(
    clippy::assertions_on_result_states,
    reason = "Rejection tests only care that parsing fails"
)]
mod tests {
    use super::*;

    fn simples(input: &str) -> Vec<SimpleSelector> {
        parse_complex_selector(input)
            .map(|complex| complex.first.simples)
            .unwrap_or_default()
    }

    #[test]
    fn escaped_id_resolves_punctuation() {
        assert_eq!(
            simples(r"#a\ b\:c"),
            vec![SimpleSelector::IdSelector("a b:c".to_owned())]
        );
    }

    #[test]
    fn hex_escape_consumes_trailing_space() {
        assert_eq!(
            simples(r"#\31 23"),
            vec![SimpleSelector::IdSelector("123".to_owned())]
        );
    }

    #[test]
    fn id_starting_with_digit_is_rejected() {
        assert_eq!(
            parse_complex_selector("#1abc"),
            Err(SelectorParseError::ExpectedIdentifier(1))
        );
    }

    #[test]
    fn type_is_lowercased_but_class_keeps_case() {
        assert_eq!(
            simples("DIV.Hero"),
            vec![
                SimpleSelector::Type("div".to_owned()),
                SimpleSelector::Class("Hero".to_owned()),
            ]
        );
    }

    #[test]
    fn quoted_attribute_value_unescapes_quotes() {
        assert_eq!(
            simples(r#"button[aria-label="Say \"hi\""]"#),
            vec![
                SimpleSelector::Type("button".to_owned()),
                SimpleSelector::AttrEquals {
                    name: "aria-label".to_owned(),
                    value: "Say \"hi\"".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn child_path_with_nth_of_type() -> ParseResult<()> {
        let complex = parse_complex_selector("main > ul.list > li:nth-of-type(3)")?;
        assert_eq!(complex.rest.len(), 2);
        assert!(
            complex
                .rest
                .iter()
                .all(|(combinator, _)| *combinator == Combinator::Child)
        );
        assert_eq!(
            complex.rest[1].1.simples[1],
            SimpleSelector::Pseudo(PseudoClass::NthOfType(NthExpr { step: 0, offset: 3 }))
        );
        Ok(())
    }

    #[test]
    fn nth_expressions() {
        assert_eq!(parse_nth("odd"), Ok(NthExpr { step: 2, offset: 1 }));
        assert_eq!(parse_nth(" 2n + 1 "), Ok(NthExpr { step: 2, offset: 1 }));
        assert_eq!(parse_nth("-n+3"), Ok(NthExpr { step: -1, offset: 3 }));
        assert_eq!(
            parse_nth("n-2147483648"),
            Ok(NthExpr { step: 1, offset: i32::MIN })
        );
        assert!(parse_nth("2n+").is_err());
        assert!(parse_nth("").is_err());
    }

    #[test]
    fn malformed_selectors_are_errors() {
        for input in ["", "   ", "div >", "> div", "div,", "[data-x", "a[b~=c]", "p:hover", "p::before", "#", "div)"] {
            assert!(
                parse_selector_list(input).is_err(),
                "expected `{input}` to be rejected"
            );
        }
    }

    #[test]
    fn selector_list_splits_on_commas() {
        let list = parse_selector_list("h1, .title ,[name=q]");
        assert_eq!(list.map(|parsed| parsed.selectors.len()), Ok(3));
    }
}
