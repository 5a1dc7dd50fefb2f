//! Per-element computed style.

use crate::config::Viewport;
use crate::dom::dom_tree::NodeId;
use crate::style::declarations::{parse_declarations, DeclarationMap};
use crate::style::properties::{initial_value, Initial, PROPERTY_REGISTRY};
use crate::style::units::{resolve_units, UnitContext};

const INHERIT: &str = "inherit";
const CURRENT_COLOR: &str = "currentcolor";
const IMPORTANT: &str = "!important";

/// Authored (`raw`) and resolved (`computed`) declarations of one element.
///
/// The parent is held as a [`NodeId`] into the owning document, never as a
/// reference to the parent's declaration. Callers that change `raw` must run
/// [`StyleDeclaration::compute`] again; nothing is recomputed implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDeclaration {
    raw: DeclarationMap,
    computed: DeclarationMap,
    parent: Option<NodeId>,
}

impl Default for StyleDeclaration {
    fn default() -> Self {
        StyleDeclaration::new(DeclarationMap::new())
    }
}

impl StyleDeclaration {
    /// Builds a root-level declaration (no parent, default viewport) and
    /// computes it.
    pub fn new(raw: DeclarationMap) -> Self {
        let mut style = StyleDeclaration {
            raw,
            computed: DeclarationMap::new(),
            parent: None,
        };
        style.compute(None, Viewport::default());
        style
    }

    /// Parses `prop: value; ...` text into a new declaration.
    pub fn parse(text: &str) -> Self {
        StyleDeclaration::new(parse_declarations(text))
    }

    /// Recomputes every value from `raw`.
    ///
    /// First defaults and `inherit` are resolved against `parent`, then each
    /// value goes through the unit pass.
    pub fn compute(&mut self, parent: Option<&StyleDeclaration>, viewport: Viewport) {
        // Priority does not inherit.
        let parent_value = |name: &str| parent.and_then(|p| p.get_property_value(name));
        let inherited = |name: &str| parent_value(name).map(|value| split_important(value).0.to_string());
        let fallback = |name: &str| match initial_value(name) {
            Some(Initial::Value(value)) => Some(value.to_string()),
            _ => None,
        };

        // `color` first: `currentcolor` initials and authored `currentcolor`
        // both read it, without its priority.
        let (color, color_important) = match self.raw.get("color").map(split_important) {
            Some((value, important)) if is_keyword(value, INHERIT) || is_keyword(value, CURRENT_COLOR) => {
                let color = inherited("color").or_else(|| fallback("color")).unwrap_or_default();
                (color, important)
            }
            Some((value, important)) => (value.to_string(), important),
            None => (fallback("color").unwrap_or_default(), false),
        };

        let mut computed = DeclarationMap::new();
        for (name, value) in self.raw.iter() {
            let (bare, important) = split_important(value);
            let resolved = if name == "color" {
                with_priority(color.clone(), color_important)
            } else if is_keyword(bare, INHERIT) {
                let keyword_value = inherited(name).or_else(|| match initial_value(name) {
                    Some(Initial::Value(initial)) => Some(initial.to_string()),
                    Some(Initial::CurrentColor) => Some(color.clone()),
                    None => None,
                });
                keyword_value.map_or_else(|| value.to_string(), |v| with_priority(v, important))
            } else if is_keyword(bare, CURRENT_COLOR) {
                with_priority(color.clone(), important)
            } else {
                value.to_string()
            };
            computed.insert(name, resolved);
        }

        for (name, initial) in PROPERTY_REGISTRY {
            if computed.contains(name) {
                continue;
            }
            let value = match initial {
                Initial::Value(value) => value.to_string(),
                Initial::CurrentColor => color.clone(),
            };
            computed.insert(*name, value);
        }

        let resolved: DeclarationMap = computed
            .iter()
            .map(|(name, value)| {
                let ctx = UnitContext {
                    property: name,
                    viewport,
                    parent_value: parent_value(name),
                };
                (name.to_string(), resolve_units(value, &ctx))
            })
            .collect();
        self.computed = resolved;
    }

    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        self.computed.get(name)
    }

    /// `"important"` when the stored value carries `!important`, else `""`.
    pub fn get_property_priority(&self, name: &str) -> &'static str {
        match self.raw.get(name).or_else(|| self.computed.get(name)) {
            Some(value) if value.contains(IMPORTANT) => "important",
            _ => "",
        }
    }

    /// Stores `value` (with `!important` appended for the `important`
    /// priority) in both maps. Always succeeds.
    pub fn set_property(&mut self, name: &str, value: &str, priority: &str) -> bool {
        let value = if priority.eq_ignore_ascii_case("important") && !value.contains(IMPORTANT) {
            format!("{} {}", value, IMPORTANT)
        } else {
            value.to_string()
        };
        self.raw.insert(name, value.clone());
        self.computed.insert(name, value);
        true
    }

    /// Returns whether `name` was present before removal.
    pub fn remove_property(&mut self, name: &str) -> bool {
        let in_raw = self.raw.remove(name).is_some();
        let in_computed = self.computed.remove(name).is_some();
        in_raw || in_computed
    }

    pub fn raw_value(&self, name: &str) -> Option<&str> {
        self.raw.get(name)
    }

    pub fn raw_declarations(&self) -> &DeclarationMap {
        &self.raw
    }

    /// Layers `declarations` on top of the authored ones.
    pub fn merge_raw(&mut self, declarations: &DeclarationMap) {
        self.raw.merge(declarations);
    }

    /// Authored declarations serialized as `prop: value;` pairs.
    pub fn css_text(&self) -> String {
        self.raw.to_string()
    }

    /// Number of computed properties.
    pub fn len(&self) -> usize {
        self.computed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.computed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.computed.iter()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn override_computed(&mut self, name: &str, value: &str) {
        self.computed.insert(name, value);
    }
}

fn is_keyword(value: &str, keyword: &str) -> bool {
    value.trim().eq_ignore_ascii_case(keyword)
}

/// Splits a trailing `!important` off `value`.
fn split_important(value: &str) -> (&str, bool) {
    let trimmed = value.trim_end();
    let split_at = trimmed.len().saturating_sub(IMPORTANT.len());
    match trimmed.get(split_at..) {
        Some(tail) if tail.eq_ignore_ascii_case(IMPORTANT) => (trimmed[..split_at].trim_end(), true),
        _ => (trimmed, false),
    }
}

fn with_priority(value: String, important: bool) -> String {
    if important {
        format!("{} {}", value, IMPORTANT)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed_with(parent: &StyleDeclaration, text: &str) -> StyleDeclaration {
        let mut style = StyleDeclaration::parse(text);
        style.compute(Some(parent), Viewport::default());
        style
    }

    #[test]
    fn test_inherit_takes_parent_value() {
        let parent = StyleDeclaration::parse("color: green");
        let child = computed_with(&parent, "color: inherit");
        assert_eq!(child.get_property_value("color"), Some("green"));

        let child = computed_with(&parent, "--accent: inherit; display: inherit");
        assert_eq!(child.get_property_value("display"), Some("inline"));
        assert_eq!(child.get_property_value("--accent"), Some("inherit"));
    }

    #[test]
    fn test_inherit_at_root_uses_initial_value() {
        let style = StyleDeclaration::parse("color: inherit; position: inherit");
        assert_eq!(style.get_property_value("color"), Some("canvastext"));
        assert_eq!(style.get_property_value("position"), Some("static"));
    }

    #[test]
    fn test_defaults_are_installed() {
        let style = StyleDeclaration::parse("color: red");
        assert_eq!(style.get_property_value("font-size"), Some("16px"));
        assert_eq!(style.get_property_value("margin-top"), Some("0"));
        assert_eq!(style.get_property_value("border-width"), Some("medium"));
        assert_eq!(style.get_property_value("border-color"), Some("red"));
        assert_eq!(style.get_property_value("unknown-prop"), None);
    }

    #[test]
    fn test_current_color() {
        let parent = StyleDeclaration::parse("color: navy");
        let child = computed_with(&parent, "color: blue; background-color: CurrentColor");
        assert_eq!(child.get_property_value("background-color"), Some("blue"));

        let child = computed_with(&parent, "color: currentcolor");
        assert_eq!(child.get_property_value("color"), Some("navy"));
    }

    #[test]
    fn test_keywords_keep_their_priority() {
        let parent = StyleDeclaration::parse("color: green; display: block !important");
        let child = computed_with(
            &parent,
            "color: inherit !important; background-color: currentcolor !IMPORTANT; display: inherit; position: inherit !important",
        );
        assert_eq!(child.get_property_value("color"), Some("green !important"));
        assert_eq!(child.get_property_value("background-color"), Some("green !important"));
        assert_eq!(child.get_property_value("display"), Some("block"));
        assert_eq!(child.get_property_value("position"), Some("static !important"));
        assert_eq!(child.get_property_value("border-color"), Some("green"));
        assert_eq!(child.get_property_priority("color"), "important");
        assert_eq!(child.get_property_priority("display"), "");
    }

    #[test]
    fn test_units_resolve_against_parent_and_viewport() {
        let parent = StyleDeclaration::parse("width: 100px; margin: 1em");
        let mut child = StyleDeclaration::parse("width: 50%; height: 20vh; margin: 2rem 50%");
        child.compute(Some(&parent), Viewport::new(300.0, 200.0));
        assert_eq!(child.get_property_value("width"), Some("50px"));
        assert_eq!(child.get_property_value("height"), Some("40px"));
        assert_eq!(child.get_property_value("margin"), Some("32px 8px"));
    }

    #[test]
    fn test_priority() {
        let style = StyleDeclaration::parse("color: red !important; width: 1px");
        assert_eq!(style.get_property_priority("color"), "important");
        assert_eq!(style.get_property_priority("width"), "");
        assert_eq!(style.get_property_priority("missing"), "");
    }

    #[test]
    fn test_set_and_remove_property() {
        let mut style = StyleDeclaration::parse("color: red");
        assert!(style.set_property("width", "10px", "important"));
        assert_eq!(style.get_property_value("width"), Some("10px !important"));
        assert_eq!(style.get_property_priority("width"), "important");

        assert!(style.remove_property("width"));
        assert!(!style.remove_property("width"));
        assert_eq!(style.get_property_value("width"), None);
        assert_eq!(style.css_text(), "color: red;");
    }

    #[test]
    fn test_set_property_does_not_recompute() {
        let mut style = StyleDeclaration::parse("color: red");
        style.set_property("width", "2em", "");
        assert_eq!(style.get_property_value("width"), Some("2em"));
        style.compute(None, Viewport::default());
        assert_eq!(style.get_property_value("width"), Some("32px"));
    }
}
