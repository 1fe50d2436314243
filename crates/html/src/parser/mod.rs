//! HTML5 parsing using html5ever.
//!
//! The document is parsed into an `RcDom` first and then copied into the arena, dropping
//! doctypes, processing instructions and whitespace-only text.

use crate::dom::Document;
use anyhow::{Error, anyhow};
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use indextree::NodeId;
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse an HTML string into a [`Document`].
///
/// # Errors
/// Returns an error if the input cannot be read or the converted tree is inconsistent.
pub fn parse_html(html: &str) -> Result<Document, Error> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    };
    let rc_dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())?;

    let mut document = Document::new();
    let root = document.root();
    convert_node(&mut document, &rc_dom.document, root)?;
    debug!(
        "parsed document with {} elements",
        document.elements().count()
    );
    Ok(document)
}

/// Copy an html5ever node (and its children) under `parent`.
fn convert_node(document: &mut Document, rc_node: &Handle, parent: NodeId) -> Result<(), Error> {
    match &rc_node.data {
        NodeData::Document => {
            for child in rc_node.children.borrow().iter() {
                convert_node(document, child, parent)?;
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let node = document.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                document.set_attribute(node, &attr.name.local, &attr.value)?;
            }
            document.append_child(parent, node)?;
            for child in rc_node.children.borrow().iter() {
                convert_node(document, child, node)?;
            }
        }
        NodeData::Text { contents } => {
            let text = contents.borrow();
            if !text.trim().is_empty() {
                let node = document.create_text(&text);
                document.append_child(parent, node)?;
            }
        }
        NodeData::Comment { contents } => {
            let node = document.create_comment(contents);
            document.append_child(parent, node)?;
        }
        NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
    Ok(())
}

impl Document {
    /// Parse an HTML string into a document.
    ///
    /// # Errors
    /// See [`parse_html`].
    pub fn parse(html: &str) -> Result<Self, Error> {
        parse_html(html).map_err(|err| anyhow!("failed to parse HTML: {err}"))
    }
}
