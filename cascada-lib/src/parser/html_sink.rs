//! Parsing HTML text into the arena [`Document`](crate::dom::dom_tree::Document).
//!
//! html5ever drives the tokenizer and tree construction; `CascadaTreeSink`
//! records the resulting nodes in the arena and hands back `NodeId`s as handles.

use crate::dom::dom_tree::{self, Doctype, ElementNode, Node, NodeData, NodeId};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use log::{debug, warn};
use std::borrow::Cow;
use std::cell::RefCell;

/// Parses a full HTML document.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = CascadaTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(StrTendril::from(html_content))
}

/// A `TreeSink` that builds the arena used by the cascade.
///
/// html5ever calls the sink through `&self`, so the arena lives in a `RefCell`.
pub struct CascadaTreeSink {
    document: RefCell<dom_tree::Document>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for CascadaTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadaTreeSink {
    pub fn new() -> Self {
        Self {
            document: RefCell::new(dom_tree::new_document()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn new_node(&self, data: NodeData) -> NodeId {
        self.document.borrow_mut().push_node(Node::new(data))
    }

    /// Turns `child` into a node id, merging text into a preceding text node
    /// when possible. Returns `None` when the text was merged.
    fn resolve_child(&self, previous: Option<NodeId>, child: NodeOrText<NodeId>) -> Option<NodeId> {
        match child {
            NodeOrText::AppendNode(node) => Some(node),
            NodeOrText::AppendText(text) => {
                let mut document = self.document.borrow_mut();
                if let Some(prev) = previous {
                    if let Some(Node {
                        data: NodeData::Text(existing),
                        ..
                    }) = document.node_mut(prev)
                    {
                        existing.push_str(&text);
                        return None;
                    }
                }
                Some(document.push_node(Node::new(NodeData::Text(text.to_string()))))
            }
        }
    }
}

/// Owned element name handed to html5ever.
#[derive(Debug)]
pub struct CascadaElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for CascadaElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for CascadaTreeSink {
    type Handle = NodeId;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = CascadaElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        debug!("parsed document in {:?} mode", self.quirks_mode.into_inner());
        self.document.into_inner()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        warn!("HTML parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        NodeId::DOCUMENT
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        let document = self.document.borrow();
        match document.element(*target) {
            Some(elem) => CascadaElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            None => CascadaElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut element = ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        self.new_node(NodeData::Element(element))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.new_node(NodeData::Comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        self.new_node(NodeData::Comment(format!("{} {}", target, data)))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let last_child = self
            .document
            .borrow()
            .node(*parent)
            .and_then(|n| n.children.last().copied());
        if let Some(child) = self.resolve_child(last_child, child) {
            self.document.borrow_mut().append_child(*parent, child);
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self
            .document
            .borrow()
            .node(*element)
            .and_then(|n| n.parent)
            .is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        self.document.borrow_mut().doctype = Some(Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = self.document.borrow().node(*sibling).and_then(|n| n.parent) else {
            return;
        };
        let previous = {
            let document = self.document.borrow();
            document.node(parent).and_then(|n| {
                let index = n.children.iter().position(|c| c == sibling)?;
                index.checked_sub(1).map(|i| n.children[i])
            })
        };
        let Some(child) = self.resolve_child(previous, child) else {
            return;
        };

        let mut document = self.document.borrow_mut();
        document.detach(child);
        if let Some(node) = document.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = document.node_mut(parent) {
            let index = node
                .children
                .iter()
                .position(|c| c == sibling)
                .unwrap_or(node.children.len());
            node.children.insert(index, child);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut document = self.document.borrow_mut();
        if let Some(elem) = document.element_mut(*target) {
            for attr in attrs {
                elem.attributes
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.document.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut document = self.document.borrow_mut();
        let children = document
            .node(*node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            document.append_child(*new_parent, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_skips_comments() {
        let document = create_dom_tree("<p>Hello <!-- c --> world</p>");
        let p = document.query_selector("p");
        assert!(p.is_some());
        let text = p.map(|id| document.text_content(id)).unwrap_or_default();
        assert_eq!(text, "Hello  world");
    }

    #[test]
    fn test_implied_structure() {
        let document = create_dom_tree("<div id='a'></div>");
        let root = document.document_element();
        assert_eq!(
            root.and_then(|id| document.element(id)).map(|e| e.tag.as_str()),
            Some("html")
        );
        assert!(document.query_selector("body > #a").is_some());
    }
}
