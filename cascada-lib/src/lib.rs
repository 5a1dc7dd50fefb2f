//! A miniature CSS cascade engine.
//!
//! CSS text (with native nesting and at-rule scopes) is flattened into
//! declaration blocks, merged by a stable [`RuleKey`](style::rule_key::RuleKey),
//! ordered by specificity and applied to an arena DOM built with html5ever.
//! Every styled element ends up with a [`StyleDeclaration`] holding its
//! computed values.

pub mod config;
pub mod dom;
pub mod error;
pub mod parser;
pub mod style;
pub mod styled_document;

pub use config::{CascadeOptions, Viewport};
pub use dom::dom_tree::{Document, NodeId};
pub use error::CascadeError;
pub use style::cascade::{apply_css, apply_stylesheet, evaluate_properties, StyleHost};
pub use style::style_declaration::StyleDeclaration;
pub use style::stylesheet::{parse_stylesheet, DeclarationBlock, Stylesheet};
pub use styled_document::StyledDocument;
