use crate::style::selector_match;
use crate::style::style_declaration::StyleDeclaration;
use html5ever::{LocalName, Namespace, QualName};
use std::collections::HashMap;
use std::fmt::Write;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Void (self-closing) elements, printed without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "meta", "img", "br", "hr", "input", "link", "area", "base", "col", "embed", "param", "source",
    "track", "wbr",
];

pub mod dom_tree {
    use super::*;

    /// Index of a node inside its [`Document`] arena.
    ///
    /// Style declarations refer to their parent through this id, so an
    /// element never owns (or is owned by) another element's style.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct NodeId(pub usize);

    impl NodeId {
        /// The document root is always the first node of the arena.
        pub const DOCUMENT: NodeId = NodeId(0);
    }

    #[derive(Debug, Clone)]
    pub enum NodeData {
        DocumentRoot,
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone)]
    pub struct Node {
        pub data: NodeData,
        pub parent: Option<NodeId>,
        pub children: Vec<NodeId>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: HashMap<String, String>,
        /// The element's style slot, filled by the cascade.
        pub style: Option<StyleDeclaration>,
    }

    #[derive(Debug, Clone)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    /// Arena-backed document tree.
    #[derive(Debug, Clone)]
    pub struct Document {
        nodes: Vec<Node>,
        pub doctype: Option<Doctype>,
    }

    impl Node {
        pub fn new(data: NodeData) -> Self {
            Node {
                data,
                parent: None,
                children: Vec::new(),
            }
        }

        pub fn as_element(&self) -> Option<&ElementNode> {
            match &self.data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: HashMap::new(),
                style: None,
            }
        }

        pub fn id(&self) -> Option<&str> {
            self.attributes.get("id").map(String::as_str)
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.attributes
                .get("class")
                .map(|classes| classes.split_whitespace().any(|c| c == class_name))
                .unwrap_or(false)
        }
    }

    impl Default for Document {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Document {
        pub fn new() -> Self {
            Document {
                nodes: vec![Node::new(NodeData::DocumentRoot)],
                doctype: None,
            }
        }

        pub fn node(&self, id: NodeId) -> Option<&Node> {
            self.nodes.get(id.0)
        }

        pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
            self.node(id).and_then(Node::as_element)
        }

        pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementNode> {
            match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
                Some(NodeData::Element(elem)) => Some(elem),
                _ => None,
            }
        }

        /// The `:root` element: first element child of the document.
        pub fn document_element(&self) -> Option<NodeId> {
            self.child_elements(NodeId::DOCUMENT).into_iter().next()
        }

        /// Parent, if the parent is an element (the document root is not).
        pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
            let parent = self.node(id)?.parent?;
            self.element(parent).map(|_| parent)
        }

        pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
            self.node(id)
                .map(|node| {
                    node.children
                        .iter()
                        .copied()
                        .filter(|child| self.element(*child).is_some())
                        .collect()
                })
                .unwrap_or_default()
        }

        /// Element siblings before `id`, nearest first.
        pub fn previous_element_siblings(&self, id: NodeId) -> Vec<NodeId> {
            let Some(parent) = self.node(id).and_then(|n| n.parent) else {
                return Vec::new();
            };
            let siblings = self.child_elements(parent);
            let position = siblings.iter().position(|s| *s == id).unwrap_or(0);
            siblings[..position].iter().rev().copied().collect()
        }

        pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
            let parent = self.node(id)?.parent?;
            let siblings = self.child_elements(parent);
            let position = siblings.iter().position(|s| *s == id)?;
            siblings.get(position + 1).copied()
        }

        /// Every element under `id` (excluded) in document order.
        pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
            let mut out = Vec::new();
            let mut stack: Vec<NodeId> = self.child_elements(id).into_iter().rev().collect();
            while let Some(current) = stack.pop() {
                out.push(current);
                stack.extend(self.child_elements(current).into_iter().rev());
            }
            out
        }

        /// Creates a detached element; attach it with [`Document::append_child`].
        pub fn create_element(&mut self, tag: &str) -> NodeId {
            let local = tag.to_ascii_lowercase();
            let qual_name = QualName::new(
                None,
                Namespace::from(HTML_NAMESPACE),
                LocalName::from(local.as_str()),
            );
            self.push_node(Node::new(NodeData::Element(ElementNode::new(
                local, qual_name,
            ))))
        }

        pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }

        pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
            self.nodes.get_mut(id.0)
        }

        pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
            if let Some(elem) = self.element_mut(id) {
                elem.attributes.insert(name.to_string(), value.to_string());
            }
        }

        /// Moves `child` to the end of `parent`'s children.
        pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
            self.detach(child);
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(parent);
            }
            if let Some(node) = self.node_mut(parent) {
                node.children.push(child);
            }
        }

        pub fn detach(&mut self, id: NodeId) {
            let Some(old_parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
                return;
            };
            if let Some(parent) = self.node_mut(old_parent) {
                parent.children.retain(|c| *c != id);
            }
        }

        /// All elements matching `selector`, in document order.
        pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
            let list = selector_match::parse_selector_list(selector);
            if list.is_empty() {
                return Vec::new();
            }
            self.descendant_elements(NodeId::DOCUMENT)
                .into_iter()
                .filter(|id| list.iter().any(|s| selector_match::matches(self, *id, s)))
                .collect()
        }

        pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
            self.query_selector_all(selector).into_iter().next()
        }

        pub fn style(&self, id: NodeId) -> Option<&StyleDeclaration> {
            self.element(id).and_then(|e| e.style.as_ref())
        }

        pub fn take_style(&mut self, id: NodeId) -> Option<StyleDeclaration> {
            self.element_mut(id).and_then(|e| e.style.take())
        }

        pub fn set_style(&mut self, id: NodeId, style: StyleDeclaration) {
            if let Some(elem) = self.element_mut(id) {
                elem.style = Some(style);
            }
        }

        /// Concatenated text of all descendant text nodes.
        pub fn text_content(&self, id: NodeId) -> String {
            let mut out = String::new();
            let mut stack = vec![id];
            while let Some(current) = stack.pop() {
                let Some(node) = self.node(current) else {
                    continue;
                };
                if let NodeData::Text(text) = &node.data {
                    out.push_str(text);
                }
                stack.extend(node.children.iter().rev().copied());
            }
            out
        }

        /// Text of every `<style>` element, in document order.
        pub fn inline_style_text(&self) -> String {
            self.descendant_elements(NodeId::DOCUMENT)
                .into_iter()
                .filter(|id| {
                    self.element(*id)
                        .map(|e| e.tag.eq_ignore_ascii_case("style"))
                        .unwrap_or(false)
                })
                .map(|id| self.text_content(id))
                .collect::<Vec<_>>()
                .join("\n")
        }

        /// Renders the element tree, annotating each styled element with the
        /// computed values of the properties it was given.
        pub fn styled_tree_string(&self) -> String {
            let mut out = String::new();
            if let Some(doctype) = &self.doctype {
                let _ = writeln!(out, "<!DOCTYPE {}>", doctype.name);
            }
            for child in self.child_elements(NodeId::DOCUMENT) {
                self.write_styled(child, 0, &mut out);
            }
            out
        }

        fn write_styled(&self, id: NodeId, indent: usize, out: &mut String) {
            let Some(elem) = self.element(id) else {
                return;
            };
            let indentation = " ".repeat(indent);
            let mut attributes: Vec<_> = elem.attributes.iter().collect();
            attributes.sort();

            let _ = write!(out, "{}<{}", indentation, elem.tag);
            for (k, v) in attributes {
                let _ = write!(out, " {}=\"{}\"", k, v);
            }
            let _ = writeln!(out, ">");

            if let Some(style) = &elem.style {
                for (property, _) in style.raw_declarations().iter() {
                    let value = style.get_property_value(property).unwrap_or_default();
                    let _ = writeln!(out, "{}  | {}: {}", indentation, property, value);
                }
            }

            if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                return;
            }
            for child in self.child_elements(id) {
                self.write_styled(child, indent + 2, out);
            }
        }
    }

    pub fn new_document() -> Document {
        Document::new()
    }
}

#[cfg(test)]
mod tests {
    use super::dom_tree::*;

    fn small_tree() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = new_document();
        let html = doc.create_element("html");
        doc.append_child(NodeId::DOCUMENT, html);
        let main = doc.create_element("main");
        doc.set_attribute(main, "id", "test");
        doc.append_child(html, main);
        let p = doc.create_element("P");
        doc.set_attribute(p, "class", "note big");
        doc.append_child(main, p);
        (doc, html, main, p)
    }

    #[test]
    fn test_structure_navigation() {
        let (doc, html, main, p) = small_tree();
        assert_eq!(doc.document_element(), Some(html));
        assert_eq!(doc.parent_element(p), Some(main));
        assert_eq!(doc.parent_element(html), None);
        assert_eq!(doc.child_elements(main), vec![p]);
        assert_eq!(doc.descendant_elements(NodeId::DOCUMENT), vec![html, main, p]);
        assert_eq!(doc.element(p).map(|e| e.tag.as_str()), Some("p"));
        assert!(doc.element(p).map(|e| e.has_class("big")).unwrap_or(false));
    }

    #[test]
    fn test_append_child_moves_node() {
        let (mut doc, html, main, p) = small_tree();
        doc.append_child(html, p);
        assert!(doc.child_elements(main).is_empty());
        assert_eq!(doc.child_elements(html), vec![main, p]);
        assert_eq!(doc.previous_element_siblings(p), vec![main]);
        assert_eq!(doc.next_element_sibling(main), Some(p));
    }

    #[test]
    fn test_query_selector_all_in_document_order() {
        let (doc, _html, main, p) = small_tree();
        assert_eq!(doc.query_selector_all("#test, .note"), vec![main, p]);
        assert_eq!(doc.query_selector("main > p"), Some(p));
        assert!(doc.query_selector_all("").is_empty());
    }
}
