//! Declaration text → ordered property/value map.

use log::debug;
use std::fmt;

/// Insertion-ordered property map.
///
/// Re-inserting an existing property replaces its value in place, so the
/// first occurrence fixes the position and the last occurrence fixes the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationMap {
    entries: Vec<(String, String)>,
}

impl DeclarationMap {
    pub fn new() -> Self {
        DeclarationMap::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// Inserts or overwrites `property`, returning the previous value.
    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let property = property.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((property, value));
                None
            }
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self.entries.iter().position(|(name, _)| name == property)?;
        Some(self.entries.remove(index).1)
    }

    /// Layers `other` on top of `self`, later values winning.
    pub fn merge(&mut self, other: &DeclarationMap) {
        for (property, value) in other.iter() {
            self.insert(property, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeclarationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = DeclarationMap::new();
        for (property, value) in iter {
            map.insert(property, value);
        }
        map
    }
}

impl fmt::Display for DeclarationMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (property, value) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}: {};", property, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Parses `prop: value; prop: value` text.
///
/// Fragments are split on `;` outside quotes and parentheses, then on the
/// first `:`. Both halves are trimmed. Fragments without a `:` (or with an
/// empty property name) are dropped.
pub fn parse_declarations(text: &str) -> DeclarationMap {
    let mut map = DeclarationMap::new();
    for fragment in split_top_level(text, ';') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        match fragment.split_once(':') {
            Some((property, value)) if !property.trim().is_empty() => {
                map.insert(property.trim(), value.trim());
            }
            _ => debug!("dropping malformed declaration `{}`", fragment),
        }
    }
    map
}

/// Splits on `separator` where it is not inside quotes, parentheses or
/// brackets.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
