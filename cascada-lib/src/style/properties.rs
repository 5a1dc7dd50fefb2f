//! Initial values for every property the engine recognizes.

/// How a property's initial value is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initial {
    Value(&'static str),
    /// The element's own resolved `color`.
    CurrentColor,
}

/// Every recognized property with its initial value.
pub const PROPERTY_REGISTRY: &[(&str, Initial)] = &[
    ("color", Initial::Value("canvastext")),
    ("background-color", Initial::Value("transparent")),
    ("background-image", Initial::Value("none")),
    ("background-repeat", Initial::Value("repeat")),
    ("border-color", Initial::CurrentColor),
    ("border-style", Initial::Value("none")),
    ("border-width", Initial::Value("medium")),
    ("border-radius", Initial::Value("0")),
    ("outline-color", Initial::CurrentColor),
    ("outline-style", Initial::Value("none")),
    ("outline-width", Initial::Value("medium")),
    ("text-decoration-color", Initial::CurrentColor),
    ("text-decoration-line", Initial::Value("none")),
    ("column-rule-color", Initial::CurrentColor),
    ("caret-color", Initial::CurrentColor),
    ("display", Initial::Value("inline")),
    ("position", Initial::Value("static")),
    ("top", Initial::Value("auto")),
    ("right", Initial::Value("auto")),
    ("bottom", Initial::Value("auto")),
    ("left", Initial::Value("auto")),
    ("float", Initial::Value("none")),
    ("clear", Initial::Value("none")),
    ("z-index", Initial::Value("auto")),
    ("width", Initial::Value("auto")),
    ("height", Initial::Value("auto")),
    ("min-width", Initial::Value("auto")),
    ("min-height", Initial::Value("auto")),
    ("max-width", Initial::Value("none")),
    ("max-height", Initial::Value("none")),
    ("box-sizing", Initial::Value("content-box")),
    ("margin-top", Initial::Value("0")),
    ("margin-right", Initial::Value("0")),
    ("margin-bottom", Initial::Value("0")),
    ("margin-left", Initial::Value("0")),
    ("padding-top", Initial::Value("0")),
    ("padding-right", Initial::Value("0")),
    ("padding-bottom", Initial::Value("0")),
    ("padding-left", Initial::Value("0")),
    ("overflow", Initial::Value("visible")),
    ("visibility", Initial::Value("visible")),
    ("opacity", Initial::Value("1")),
    ("font-family", Initial::Value("serif")),
    ("font-size", Initial::Value("medium")),
    ("font-style", Initial::Value("normal")),
    ("font-weight", Initial::Value("normal")),
    ("line-height", Initial::Value("normal")),
    ("letter-spacing", Initial::Value("normal")),
    ("word-spacing", Initial::Value("normal")),
    ("text-align", Initial::Value("start")),
    ("text-transform", Initial::Value("none")),
    ("white-space", Initial::Value("normal")),
    ("vertical-align", Initial::Value("baseline")),
    ("direction", Initial::Value("ltr")),
    ("list-style-type", Initial::Value("disc")),
    ("cursor", Initial::Value("auto")),
];

pub fn initial_value(property: &str) -> Option<Initial> {
    PROPERTY_REGISTRY
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, initial)| *initial)
}

/// Custom properties (`--name`) are never in the registry.
pub fn is_custom_property(property: &str) -> bool {
    property.starts_with("--")
}
