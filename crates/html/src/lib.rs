#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

//! In-memory HTML documents that answer selector queries.
//!
//! [`Document`] implements [`css_selectors::DocumentQuery`], so anything written against the
//! capability traits (the picker, the inline patch layer) can run without a browser.

pub mod dom;
pub mod parser;

pub use dom::{DOMNode, Document, NodeKind};
pub use indextree::NodeId;
pub use parser::parse_html;
