//! Selector specificity as an (id, class, type) triple.
//!
//! This is a character-level approximation, not a selector grammar: it scores
//! a single selector (already split on top-level commas) by looking at the
//! sigils in front of each name. There is no inline-style weight and
//! `:where()` is not zeroed.

use std::fmt;

/// Specificity triple, ordered lexicographically (id, then class, then type).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub id: u32,
    pub class: u32,
    pub type_: u32,
}

impl Specificity {
    pub const ZERO: Specificity = Specificity::new(0, 0, 0);

    pub const fn new(id: u32, class: u32, type_: u32) -> Self {
        Specificity { id, class, type_ }
    }

    /// Scores one selector.
    ///
    /// - `#name` counts as an id.
    /// - `.name`, `[attr]` and single-colon pseudo-classes count as classes.
    /// - Type names at the start or after a combinator/space, and `::` pseudo
    ///   elements, count as types.
    pub fn of(selector: &str) -> Self {
        let chars: Vec<char> = selector.trim().chars().collect();
        let mut spec = Specificity::ZERO;
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '#' => spec.id += 1,
                '.' => spec.class += 1,
                '[' => {
                    spec.class += 1;
                    // Attribute contents never score.
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                }
                ':' => {
                    if chars.get(i + 1) == Some(&':') {
                        spec.type_ += 1;
                        i += 1;
                    } else if chars.get(i + 1).is_some_and(|c| c.is_ascii_alphabetic()) {
                        spec.class += 1;
                    }
                }
                c if c.is_ascii_alphabetic() && starts_type_name(&chars, i) => spec.type_ += 1,
                _ => {}
            }
            i += 1;
        }

        spec
    }
}

/// A letter begins a type name when it opens the selector or follows a
/// combinator or whitespace.
fn starts_type_name(chars: &[char], i: usize) -> bool {
    match i.checked_sub(1).map(|p| chars[p]) {
        None => true,
        Some(prev) => prev.is_whitespace() || matches!(prev, '+' | '>' | '~' | '|'),
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.id, self.class, self.type_)
    }
}
