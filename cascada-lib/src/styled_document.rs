use crate::config::CascadeOptions;
use crate::dom::dom_tree::{Document, NodeId};
use crate::error::CascadeError;
use crate::parser::create_dom_tree;
use crate::style::cascade;
use crate::style::style_declaration::StyleDeclaration;

/// A parsed HTML document together with the options its cascade runs with.
#[derive(Debug, Clone)]
pub struct StyledDocument {
    document: Document,
    options: CascadeOptions,
}

impl StyledDocument {
    pub fn new(html_content: &str) -> Self {
        Self::with_options(html_content, CascadeOptions::default())
    }

    pub fn with_options(html_content: &str, options: CascadeOptions) -> Self {
        StyledDocument {
            document: create_dom_tree(html_content),
            options,
        }
    }

    pub fn options(&self) -> &CascadeOptions {
        &self.options
    }

    /// Applies the text of the document's own `<style>` elements.
    pub fn apply_inline_styles(&mut self) -> Result<(), CascadeError> {
        let css = self.document.inline_style_text();
        self.apply_css(&css)
    }

    pub fn apply_css(&mut self, css_text: &str) -> Result<(), CascadeError> {
        cascade::apply_css(&mut self.document, css_text, &self.options)
    }

    pub fn evaluate_properties(&mut self) {
        cascade::evaluate_properties(&mut self.document);
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.document.query_selector(selector)
    }

    /// Style of the first element matching `selector`.
    pub fn style_of(&self, selector: &str) -> Option<&StyleDeclaration> {
        self.query_selector(selector)
            .and_then(|id| self.document.style(id))
    }

    /// Shorthand for `style_of(selector)?.get_property_value(property)`.
    pub fn property_value(&self, selector: &str, property: &str) -> Option<&str> {
        self.style_of(selector)?.get_property_value(property)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn print_styled_tree(&self) {
        print!("{}", self.document.styled_tree_string());
    }
}

/// One-shot pipeline: parse `html_content`, apply its `<style>` elements,
/// then `css_content`, and resolve custom properties.
pub fn style_html(
    html_content: &str,
    css_content: &str,
    options: CascadeOptions,
) -> Result<StyledDocument, CascadeError> {
    let mut styled = StyledDocument::with_options(html_content, options);
    styled.apply_inline_styles()?;
    styled.apply_css(css_content)?;
    styled.evaluate_properties();
    Ok(styled)
}
