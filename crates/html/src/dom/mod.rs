//! Arena-backed document tree.
//!
//! Nodes live in an `indextree` arena owned by [`Document`]. Detached subtrees stay in the
//! arena (their handles keep working for structural reads) but are no longer reachable from
//! the document root, so queries never return them.

use anyhow::{Error, anyhow};
use css_selectors::{
    DocumentQuery, ElementAdapter, SelectorParseError, matches_selector_list, parse_selector_list,
};
use indextree::{Arena, Node, NodeId};
use log::trace;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    #[default]
    Document,
    Element { tag: String },
    Text { text: String },
    Comment { text: String },
}

#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
}

#[derive(Debug)]
pub struct Document {
    dom: Arena<DOMNode>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document containing only the document node.
    pub fn new() -> Self {
        let mut dom = Arena::new();
        Self {
            root: dom.new_node(DOMNode::default()),
            dom,
        }
    }

    /// The document node. Not an element; `parent()` of the root element is `None`.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, node: NodeId) -> Option<&DOMNode> {
        self.dom.get(node).map(Node::get)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.node(node)
            .is_some_and(|data| matches!(data.kind, NodeKind::Element { .. }))
    }

    /// Create a detached element. Tag names are stored ASCII-lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.dom.new_node(DOMNode {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: SmallVec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.dom.new_node(DOMNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.dom.new_node(DOMNode {
            kind: NodeKind::Comment {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    /// Returns an error if the append would create a cycle or either node was removed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        parent
            .checked_append(child, &mut self.dom)
            .map_err(|err| anyhow!("cannot append node: {err}"))
    }

    /// Set (or replace) an attribute. Attribute names are stored ASCII-lowercase.
    ///
    /// # Errors
    /// Returns an error if `node` is not an element of this document.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), Error> {
        let data = self
            .dom
            .get_mut(node)
            .map(Node::get_mut)
            .filter(|data| matches!(data.kind, NodeKind::Element { .. }))
            .ok_or_else(|| anyhow!("node is not an element"))?;
        let name = name.to_ascii_lowercase();
        if let Some(existing) = data.attrs.iter_mut().find(|(key, _)| *key == name) {
            value.clone_into(&mut existing.1);
        } else {
            data.attrs.push((name, value.to_owned()));
        }
        Ok(())
    }

    /// Remove `node` (and its subtree) from its parent.
    pub fn detach(&mut self, node: NodeId) {
        trace!("detaching node {node:?}");
        node.detach(&mut self.dom);
    }

    /// True if `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.dom.get(node).is_some()
            && node
                .ancestors(&self.dom)
                .any(|ancestor| ancestor == self.root)
    }

    /// Element children of `node`, in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        node.children(&self.dom)
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Connected elements in tree order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root
            .descendants(&self.dom)
            .filter(|node| self.is_element(*node))
    }

    /// The `<body>` element, if the root element has one.
    pub fn body(&self) -> Option<NodeId> {
        let html = DocumentQuery::document_element(self)?;
        self.children(html)
            .into_iter()
            .find(|child| self.tag_name(*child) == "body")
    }

    /// First connected element whose id equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .find(|element| self.element_id(*element) == Some(id))
    }

    /// All connected elements matching `selector`, in tree order.
    ///
    /// # Errors
    /// Returns an error if `selector` is not valid selector syntax.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorParseError> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .elements()
            .filter(|element| matches_selector_list(self, *element, &list))
            .collect())
    }

    /// First connected element matching `selector`.
    ///
    /// # Errors
    /// Returns an error if `selector` is not valid selector syntax.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorParseError> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .elements()
            .find(|element| matches_selector_list(self, *element, &list)))
    }

    fn sibling_element(&self, node: NodeId, forward: bool) -> Option<NodeId> {
        let step = |current: NodeId| {
            let entry = self.dom.get(current)?;
            if forward {
                entry.next_sibling()
            } else {
                entry.previous_sibling()
            }
        };
        let mut current = step(node);
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = step(sibling);
        }
        None
    }
}

impl ElementAdapter for Document {
    type Handle = NodeId;

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        self.dom
            .get(element)?
            .parent()
            .filter(|parent| self.is_element(*parent))
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.sibling_element(element, false)
    }

    fn next_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.sibling_element(element, true)
    }

    fn tag_name(&self, element: NodeId) -> &str {
        match self.node(element).map(|data| &data.kind) {
            Some(NodeKind::Element { tag }) => tag,
            _ => "",
        }
    }

    fn attr(&self, element: NodeId, name: &str) -> Option<&str> {
        self.node(element)?
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl DocumentQuery for Document {
    fn document_element(&self) -> Option<NodeId> {
        self.children(self.root).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorParseError> {
        self.query_selector_all(selector)
    }
}
