//! `@media` scope evaluation against a fixed viewport.
//!
//! Conditions are read as written, one per nesting level. Each is a comma
//! list of queries, and each query is a media type and `(feature: value)`
//! tests joined by `and`, optionally led by `only` or `not`. A block applies
//! when every nesting level holds. Other at-rule types are not evaluated and
//! never gate a block.

use crate::config::Viewport;
use crate::style::declarations::split_top_level;
use crate::style::rule_key::{split_compound_condition, ScopeStack};
use crate::style::units::ROOT_FONT_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    All,
    Screen,
    Print,
}

impl MediaType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(MediaType::All),
            "screen" => Some(MediaType::Screen),
            "print" => Some(MediaType::Print),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaModifier {
    Not,
    Only,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Height is greater than or equal to width
    Portrait,
    Landscape,
}

/// Size and orientation tests; lengths are already in px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaFeature {
    Width(f64),
    MinWidth(f64),
    MaxWidth(f64),
    Height(f64),
    MinHeight(f64),
    MaxHeight(f64),
    Orientation(Orientation),
}

impl MediaFeature {
    /// Parses the inside of `( ... )`. `None` means the feature is unknown.
    pub fn parse(text: &str) -> Option<Self> {
        let (name, value) = text.split_once(':')?;
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if name == "orientation" {
            return match value.to_ascii_lowercase().as_str() {
                "portrait" => Some(MediaFeature::Orientation(Orientation::Portrait)),
                "landscape" => Some(MediaFeature::Orientation(Orientation::Landscape)),
                _ => None,
            };
        }
        let length = parse_length(value)?;
        match name.as_str() {
            "width" => Some(MediaFeature::Width(length)),
            "min-width" => Some(MediaFeature::MinWidth(length)),
            "max-width" => Some(MediaFeature::MaxWidth(length)),
            "height" => Some(MediaFeature::Height(length)),
            "min-height" => Some(MediaFeature::MinHeight(length)),
            "max-height" => Some(MediaFeature::MaxHeight(length)),
            _ => None,
        }
    }

    pub fn evaluate(&self, viewport: &Viewport) -> bool {
        match *self {
            MediaFeature::Width(w) => viewport.width == w,
            MediaFeature::MinWidth(w) => viewport.width >= w,
            MediaFeature::MaxWidth(w) => viewport.width <= w,
            MediaFeature::Height(h) => viewport.height == h,
            MediaFeature::MinHeight(h) => viewport.height >= h,
            MediaFeature::MaxHeight(h) => viewport.height <= h,
            MediaFeature::Orientation(Orientation::Portrait) => viewport.height >= viewport.width,
            MediaFeature::Orientation(Orientation::Landscape) => viewport.width > viewport.height,
        }
    }
}

/// Returns whether a block opened under `conditions` applies to `viewport`.
/// Every nested `@media` level must hold.
pub fn conditions_apply(conditions: &ScopeStack, viewport: &Viewport) -> bool {
    conditions.get("@media").map_or(true, |levels| {
        levels
            .iter()
            .all(|condition| condition_matches(condition, viewport))
    })
}

/// Evaluates one media query list; it matches when any query matches.
pub fn condition_matches(condition: &str, viewport: &Viewport) -> bool {
    split_top_level(condition, ',')
        .into_iter()
        .any(|query| query_matches(query.trim(), viewport))
}

/// A query is an `and` conjunction; a leading `not` negates all of it.
fn query_matches(query: &str, viewport: &Viewport) -> bool {
    let (modifier, rest) = match query.split_once(char::is_whitespace) {
        Some((first, rest)) if first.eq_ignore_ascii_case("not") => (Some(MediaModifier::Not), rest.trim()),
        Some((first, rest)) if first.eq_ignore_ascii_case("only") => (Some(MediaModifier::Only), rest.trim()),
        _ => (None, query),
    };

    let parts = split_compound_condition(rest);
    let matched = !parts.is_empty() && parts.iter().all(|part| part_matches(part, viewport));

    match modifier {
        Some(MediaModifier::Not) => !matched,
        _ => matched,
    }
}

fn part_matches(part: &str, viewport: &Viewport) -> bool {
    if let Some(inner) = part.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return MediaFeature::parse(inner).map_or(true, |feature| feature.evaluate(viewport));
    }
    // Only screen-like output is modelled.
    matches!(MediaType::parse(part), Some(MediaType::All | MediaType::Screen))
}

fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(number) = value.strip_suffix("rem").or_else(|| value.strip_suffix("em")) {
        return number.trim().parse::<f64>().ok().map(|n| n * ROOT_FONT_SIZE);
    }
    if let Some(number) = value.strip_suffix("px") {
        return number.trim().parse().ok();
    }
    match value.parse::<f64>() {
        Ok(n) if n == 0.0 => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(conditions: &[&str]) -> ScopeStack {
        let mut stack = ScopeStack::new();
        stack.insert(
            "@media".to_string(),
            conditions.iter().map(|c| c.to_string()).collect(),
        );
        stack
    }

    #[test]
    fn test_media_types() {
        let viewport = Viewport::default();
        assert!(condition_matches("screen", &viewport));
        assert!(condition_matches("only all", &viewport));
        assert!(!condition_matches("print", &viewport));
        assert!(condition_matches("not print", &viewport));
        assert!(condition_matches("print,screen", &viewport));
        assert!(!condition_matches("tv", &viewport));
    }

    #[test]
    fn test_size_features() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(condition_matches("(min-width:768px)", &viewport));
        assert!(!condition_matches("(max-width:40em)", &viewport));
        assert!(condition_matches("(max-height:600px)", &viewport));
        assert!(condition_matches("(orientation:landscape)", &viewport));
        assert!(condition_matches("(prefers-color-scheme:dark)", &viewport));
    }

    #[test]
    fn test_each_query_is_its_own_conjunction() {
        let viewport = Viewport::new(150.0, 100.0);
        assert!(condition_matches("print and (min-width:1000px),screen", &viewport));
        assert!(!condition_matches("screen and (min-width:1000px),print", &viewport));
        assert!(condition_matches("screen and (min-width:100px) and (orientation:landscape)", &viewport));
        assert!(conditions_apply(&media(&["print and (min-width:1000px),screen"]), &viewport));
    }

    #[test]
    fn test_not_negates_the_whole_query() {
        let viewport = Viewport::new(150.0, 100.0);
        assert!(!condition_matches("not screen and (min-width:100px)", &viewport));
        assert!(condition_matches("not screen and (min-width:1000px)", &viewport));
        assert!(condition_matches("not print and (min-width:100px)", &viewport));
    }

    #[test]
    fn test_conditions_apply_requires_every_level() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(conditions_apply(&ScopeStack::new(), &viewport));
        assert!(conditions_apply(&media(&["screen and (min-width:100px)"]), &viewport));
        assert!(!conditions_apply(&media(&["screen", "(min-width:1000px)"]), &viewport));

        let mut supports = ScopeStack::new();
        supports.insert("@supports".to_string(), vec!["(display:nope)".to_string()]);
        assert!(conditions_apply(&supports, &viewport));
    }
}
