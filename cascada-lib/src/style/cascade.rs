use crate::config::{CascadeOptions, Viewport};
use crate::dom::dom_tree::{Document, NodeId};
use crate::error::CascadeError;
use crate::style::media::conditions_apply;
use crate::style::properties::is_custom_property;
use crate::style::style_declaration::StyleDeclaration;
use crate::style::stylesheet::{parse_stylesheet, Stylesheet};
use log::debug;
use std::collections::HashMap;

/// Custom-property bindings visible at one point of the tree walk.
pub type CustomProperties = HashMap<String, String>;

/// The tree the cascade runs against.
///
/// The cascade only matches selectors, walks parent/child links and swaps
/// style slots; tree construction belongs to the implementor.
pub trait StyleHost {
    /// Elements matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<NodeId>;
    fn parent_element(&self, id: NodeId) -> Option<NodeId>;
    fn child_elements(&self, id: NodeId) -> Vec<NodeId>;
    /// Where tree walks start: every top-level element, in document order.
    fn root_elements(&self) -> Vec<NodeId>;
    fn style(&self, id: NodeId) -> Option<&StyleDeclaration>;
    fn take_style(&mut self, id: NodeId) -> Option<StyleDeclaration>;
    fn set_style(&mut self, id: NodeId, style: StyleDeclaration);
}

impl StyleHost for Document {
    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        Document::query_selector_all(self, selector)
    }

    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        Document::parent_element(self, id)
    }

    fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        Document::child_elements(self, id)
    }

    fn root_elements(&self) -> Vec<NodeId> {
        Document::child_elements(self, NodeId::DOCUMENT)
    }

    fn style(&self, id: NodeId) -> Option<&StyleDeclaration> {
        Document::style(self, id)
    }

    fn take_style(&mut self, id: NodeId) -> Option<StyleDeclaration> {
        Document::take_style(self, id)
    }

    fn set_style(&mut self, id: NodeId, style: StyleDeclaration) {
        Document::set_style(self, id, style)
    }
}

/// Parses `css_text` and applies it to `host`.
///
/// Nothing is applied when the text fails to parse.
pub fn apply_css<H: StyleHost + ?Sized>(
    host: &mut H,
    css_text: &str,
    options: &CascadeOptions,
) -> Result<(), CascadeError> {
    let sheet = parse_stylesheet(css_text)?;
    apply_stylesheet(host, &sheet, options);
    Ok(())
}

/// Merges every block into the raw declarations of the elements it
/// matches, then recomputes all styles top-down.
///
/// Blocks are visited in ascending specificity, so a later block layers its
/// properties over earlier ones without dropping unrelated properties.
pub fn apply_stylesheet<H: StyleHost + ?Sized>(host: &mut H, sheet: &Stylesheet, options: &CascadeOptions) {
    for block in sheet.blocks() {
        if options.evaluate_media && !conditions_apply(&block.conditions, &options.viewport) {
            debug!("skipping `{}`: media scope does not apply", block.selector);
            continue;
        }
        let matched = host.query_selector_all(&block.selector);
        debug!("`{}` {} matched {} element(s)", block.selector, block.specificity, matched.len());

        for id in matched {
            let mut style = host.take_style(id).unwrap_or_default();
            style.merge_raw(&block.declarations);
            host.set_style(id, style);
        }
    }
    recompute_styles(host, options.viewport);
}

/// Recomputes every styled element in pre-order, so each parent is final
/// before its children read it.
pub fn recompute_styles<H: StyleHost + ?Sized>(host: &mut H, viewport: Viewport) {
    let mut stack: Vec<NodeId> = host.root_elements().into_iter().rev().collect();
    while let Some(id) = stack.pop() {
        if let Some(mut style) = host.take_style(id) {
            let parent = host.parent_element(id);
            style.set_parent(parent);
            style.compute(parent.and_then(|p| host.style(p)), viewport);
            host.set_style(id, style);
        }
        stack.extend(host.child_elements(id).into_iter().rev());
    }
}

/// Resolves `var()` references across the whole tree.
pub fn evaluate_properties<H: StyleHost + ?Sized>(host: &mut H) {
    for root in host.root_elements() {
        evaluate_properties_from(host, root, &CustomProperties::new());
    }
}

/// Pre-order walk from `root` starting with `inherited` bindings.
///
/// Every element extends its own copy of its parent's bindings, so sibling
/// subtrees never see each other's custom properties.
pub fn evaluate_properties_from<H: StyleHost + ?Sized>(
    host: &mut H,
    root: NodeId,
    inherited: &CustomProperties,
) {
    let mut stack = vec![(root, inherited.clone())];
    while let Some((id, mut bindings)) = stack.pop() {
        if let Some(mut style) = host.take_style(id) {
            bind_custom_properties(&style, &mut bindings);
            substitute_var_references(&mut style, &mut bindings);
            host.set_style(id, style);
        }
        for child in host.child_elements(id).into_iter().rev() {
            stack.push((child, bindings.clone()));
        }
    }
}

fn bind_custom_properties(style: &StyleDeclaration, bindings: &mut CustomProperties) {
    for (name, _) in style.raw_declarations().iter() {
        if !is_custom_property(name) {
            continue;
        }
        if let Some(value) = style.get_property_value(name) {
            bindings.insert(name.to_string(), value.to_string());
        }
    }
}

/// Overwrites the computed value of every property whose raw value holds a
/// `var()` with the binding of each name found. The last successful lookup
/// wins. Custom properties rebind to their substituted value.
fn substitute_var_references(style: &mut StyleDeclaration, bindings: &mut CustomProperties) {
    let raw: Vec<(String, String)> = style
        .raw_declarations()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    for (name, value) in raw {
        let mut substituted = None;
        for reference in var_references(&value) {
            if let Some(bound) = bindings.get(reference) {
                style.override_computed(&name, bound);
                substituted = Some(bound.clone());
            }
        }
        if let Some(bound) = substituted {
            if is_custom_property(&name) {
                bindings.insert(name, bound);
            }
        }
    }
}

/// Names referenced by `var(...)` in `value`, left to right. A fallback
/// after the first top-level comma is not part of the name.
pub fn var_references(value: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        let args = &rest[start + 4..];
        let mut depth = 0usize;
        let mut end = args.len();
        let mut name_end = None;
        for (i, ch) in args.char_indices() {
            match ch {
                '(' => depth += 1,
                ',' if depth == 0 && name_end.is_none() => name_end = Some(i),
                ')' if depth == 0 => {
                    end = i;
                    break;
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        let name = args[..name_end.unwrap_or(end).min(end)].trim();
        if !name.is_empty() {
            names.push(name);
        }
        rest = &args[end.min(args.len())..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::create_dom_tree;

    fn value(document: &Document, selector: &str, property: &str) -> Option<String> {
        let id = document.query_selector(selector)?;
        Document::style(document, id)?
            .get_property_value(property)
            .map(str::to_string)
    }

    #[test]
    fn test_var_references() {
        assert_eq!(var_references("var(--a)"), vec!["--a"]);
        assert_eq!(var_references("1px solid var( --b , red)"), vec!["--b"]);
        assert_eq!(var_references("var(--x, var(--y)) var(--z)"), vec!["--x", "--z"]);
        assert!(var_references("red").is_empty());
    }

    #[test]
    fn test_custom_property_from_root() {
        let mut document = create_dom_tree("<div id=\"test\"><p id=\"test2\"></p></div>");
        let css = ":root{--color:yellow;} #test2{color:var(--color);}";
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();
        evaluate_properties(&mut document);
        assert_eq!(value(&document, "#test2", "color").as_deref(), Some("yellow"));
    }

    #[test]
    fn test_percentage_of_parent() {
        let mut document = create_dom_tree("<div id=\"test\"><p id=\"test2\"></p></div>");
        apply_css(
            &mut document,
            "#test{width:100px;} #test #test2{width:50%;}",
            &CascadeOptions::default(),
        )
        .unwrap();
        assert_eq!(value(&document, "#test2", "width").as_deref(), Some("50px"));
    }

    #[test]
    fn test_accumulates_across_rules() {
        let mut document = create_dom_tree("<p id=\"a\" class=\"x\"></p>");
        apply_css(
            &mut document,
            "#a { color: red; } p { width: 1px; color: blue; } .x { margin-top: 1em }",
            &CascadeOptions::default(),
        )
        .unwrap();
        assert_eq!(value(&document, "#a", "color").as_deref(), Some("red"));
        assert_eq!(value(&document, "#a", "width").as_deref(), Some("1px"));
        assert_eq!(value(&document, "#a", "margin-top").as_deref(), Some("16px"));
    }

    #[test]
    fn test_later_call_layers_on_earlier() {
        let mut document = create_dom_tree("<p id=\"a\"></p>");
        let options = CascadeOptions::default();
        apply_css(&mut document, "#a { color: red; width: 2px }", &options).unwrap();
        apply_css(&mut document, "p { color: blue }", &options).unwrap();
        assert_eq!(value(&document, "#a", "color").as_deref(), Some("blue"));
        assert_eq!(value(&document, "#a", "width").as_deref(), Some("2px"));
    }

    #[test]
    fn test_siblings_do_not_share_bindings() {
        let mut document = create_dom_tree(
            "<div id=\"one\"><span id=\"s1\"></span></div><div id=\"two\"><span id=\"s2\"></span></div>",
        );
        let css = "#one { --c: red } #two { --d: blue } span { color: var(--c); background-color: var(--d) }";
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();
        evaluate_properties(&mut document);

        assert_eq!(value(&document, "#s1", "color").as_deref(), Some("red"));
        assert_eq!(value(&document, "#s1", "background-color").as_deref(), Some("var(--d)"));
        assert_eq!(value(&document, "#s2", "color").as_deref(), Some("var(--c)"));
        assert_eq!(value(&document, "#s2", "background-color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_last_successful_var_wins() {
        let mut document = create_dom_tree("<p id=\"a\"></p>");
        let css = ":root { --w: 1px; --s: solid } #a { border: var(--w) var(--missing) var(--s) }";
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();
        evaluate_properties(&mut document);
        assert_eq!(value(&document, "#a", "border").as_deref(), Some("solid"));
    }

    #[test]
    fn test_custom_properties_chain() {
        let mut document = create_dom_tree("<p id=\"a\"></p>");
        let css = ":root { --base: green; --accent: var(--base) } #a { color: var(--accent) }";
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();
        evaluate_properties(&mut document);
        assert_eq!(value(&document, "#a", "color").as_deref(), Some("green"));
    }

    #[test]
    fn test_media_gating_is_opt_in() {
        let css = "#a { width: 1px } @media (min-width: 500px) { #a { width: 2px } }";

        let mut document = create_dom_tree("<p id=\"a\"></p>");
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();
        assert_eq!(value(&document, "#a", "width").as_deref(), Some("2px"));

        let mut document = create_dom_tree("<p id=\"a\"></p>");
        let options = CascadeOptions::default().with_media_evaluation(true);
        apply_css(&mut document, css, &options).unwrap();
        assert_eq!(value(&document, "#a", "width").as_deref(), Some("1px"));
    }

    #[test]
    fn test_media_list_with_compound_query() {
        let css = "#a { width: 1px } @media print and (min-width: 1000px), screen { #a { width: 2px } }";
        let mut document = create_dom_tree("<p id=\"a\"></p>");
        let options = CascadeOptions::default()
            .with_viewport(Viewport::new(150.0, 100.0))
            .with_media_evaluation(true);
        apply_css(&mut document, css, &options).unwrap();
        assert_eq!(value(&document, "#a", "width").as_deref(), Some("2px"));
    }

    #[test]
    fn test_every_top_level_element_is_styled() {
        let mut document = Document::new();
        for id in ["a", "b"] {
            let div = document.create_element("div");
            document.set_attribute(div, "id", id);
            document.append_child(NodeId::DOCUMENT, div);
        }
        let css = "#b { width: 2em; color: var(--x) } #b { --x: red }";
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();
        evaluate_properties(&mut document);

        assert_eq!(document.root_elements().len(), 2);
        assert_eq!(value(&document, "#b", "width").as_deref(), Some("32px"));
        assert_eq!(value(&document, "#b", "color").as_deref(), Some("red"));
    }

    #[test]
    fn test_evaluate_from_subtree_with_seeded_bindings() {
        let mut document = create_dom_tree(
            "<div id=\"outer\"><section id=\"mid\"><p id=\"leaf\"></p></section></div>",
        );
        let css = "#mid { --local: 2px; color: var(--brand) } #leaf { width: var(--local); background-color: var(--brand) }";
        apply_css(&mut document, css, &CascadeOptions::default()).unwrap();

        let seeded: CustomProperties = [("--brand".to_string(), "navy".to_string())].into_iter().collect();
        let before = seeded.clone();
        let mid = document.query_selector("#mid").unwrap();
        evaluate_properties_from(&mut document, mid, &seeded);

        assert_eq!(value(&document, "#mid", "color").as_deref(), Some("navy"));
        assert_eq!(value(&document, "#leaf", "background-color").as_deref(), Some("navy"));
        assert_eq!(value(&document, "#leaf", "width").as_deref(), Some("2px"));
        assert_eq!(seeded, before);
    }

    #[test]
    fn test_parse_error_applies_nothing() {
        let mut document = create_dom_tree("<p id=\"a\"></p>");
        let result = apply_css(&mut document, "#a { color: red; ", &CascadeOptions::default());
        assert!(result.is_err());
        assert_eq!(value(&document, "#a", "color"), None);
    }
}
