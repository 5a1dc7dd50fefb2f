pub mod cascade;
pub mod declarations;
pub mod flatten;
pub mod media;
pub mod properties;
pub mod rule_key;
pub mod selector_match;
pub mod specificity;
pub mod style_declaration;
pub mod stylesheet;
pub mod units;
