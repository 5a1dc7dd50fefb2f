//! Nested CSS → flat (selector, at-rule scope, declaration text) blocks.
//!
//! One left-to-right pass with an explicit stack of open blocks; there is no
//! recursion, so nesting depth is bounded only by memory.
//!
//! - A nested prelude without `&` is a descendant of every enclosing selector.
//! - A prelude with `&` substitutes the enclosing selector (or `:root` at top
//!   level) for the marker.
//! - An at-rule prelude (`@type params`) pushes its minified params onto the
//!   scope stack for `@type` and passes the enclosing selector through
//!   unchanged to its children.
//!
//! Declaration text found directly inside a block is merged into that
//! block's slot in the [`BlockMap`], so repeated (selector, scope) pairs
//! accumulate in source order.

use crate::error::CascadeError;
use crate::style::declarations::split_top_level;
use crate::style::rule_key::{minify_condition, normalize_selector, BlockMap, FlatBlock, ScopeStack};
use log::debug;

/// Stand-in for `&` when there is no enclosing selector.
pub const ROOT_SELECTOR: &str = ":root";

/// One open `{ ... }` on the scan stack.
#[derive(Debug)]
struct Frame {
    /// Resolved selectors children nest under; empty when the block sits
    /// outside any style rule (a top-level at-rule).
    selectors: Vec<String>,
    /// At-rule type this block pushed onto the scope stack.
    scope: Option<String>,
    /// Block-map slots receiving this block's declaration text, resolved on
    /// first use.
    slots: Option<Vec<usize>>,
}

/// Scan-local state, reset for every call to [`flatten`].
#[derive(Debug, Default)]
struct Flattener {
    frames: Vec<Frame>,
    scopes: ScopeStack,
    blocks: BlockMap,
}

/// Flattens `text` into merged blocks, in first-seen order.
///
/// Unbalanced braces and unterminated comments abort the whole scan.
pub fn flatten(text: &str) -> Result<Vec<FlatBlock>, CascadeError> {
    let source = strip_comments(text)?;
    let mut state = Flattener::default();
    let mut segment_start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in source.char_indices() {
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
            ';' => {
                state.declaration_text(&source[segment_start..=i]);
                segment_start = i + 1;
            }
            '{' => {
                state.open(&source[segment_start..i]);
                segment_start = i + 1;
            }
            '}' => {
                if state.frames.is_empty() {
                    return Err(CascadeError::UnexpectedClosingBrace { offset: i });
                }
                state.declaration_text(&source[segment_start..i]);
                state.close();
                segment_start = i + 1;
            }
            _ => {}
        }
    }

    if !state.frames.is_empty() {
        return Err(CascadeError::UnclosedBlock {
            offset: source.len(),
            depth: state.frames.len(),
        });
    }
    let trailing = source[segment_start..].trim();
    if !trailing.is_empty() {
        debug!("discarding trailing text `{}`", trailing);
    }

    Ok(state.blocks.into_blocks())
}

impl Flattener {
    fn open(&mut self, prelude: &str) {
        let fragment = prelude.trim();
        let enclosing = self
            .frames
            .last()
            .map(|frame| frame.selectors.clone())
            .unwrap_or_default();

        let (selectors, scope) = if let Some(at_rule) = fragment.strip_prefix('@') {
            let split_at = at_rule
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(at_rule.len());
            let kind = format!("@{}", at_rule[..split_at].to_ascii_lowercase());
            let params = minify_condition(&at_rule[split_at..]);
            self.scopes.entry(kind.clone()).or_default().push(params);
            (enclosing, Some(kind))
        } else {
            (resolve_selectors(fragment, &enclosing), None)
        };

        self.frames.push(Frame {
            selectors,
            scope,
            slots: None,
        });
    }

    fn close(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if let Some(kind) = frame.scope {
            if let Some(stack) = self.scopes.get_mut(&kind) {
                stack.pop();
                if stack.is_empty() {
                    self.scopes.remove(&kind);
                }
            }
        }
    }

    /// Routes text found at the current depth into the innermost block.
    fn declaration_text(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let Some(frame) = self.frames.last_mut() else {
            debug!("discarding top-level statement `{}`", text.trim());
            return;
        };

        if frame.slots.is_none() {
            let targets = if frame.selectors.is_empty() {
                vec![ROOT_SELECTOR.to_string()]
            } else {
                frame.selectors.clone()
            };
            let slots = targets
                .iter()
                .map(|selector| self.blocks.register(selector, &self.scopes))
                .collect();
            frame.slots = Some(slots);
        }
        for slot in frame.slots.iter().flatten() {
            self.blocks.append(*slot, text);
        }
    }
}

/// Resolves a style-rule prelude against the enclosing selector list.
fn resolve_selectors(fragment: &str, enclosing: &[String]) -> Vec<String> {
    let parents: Vec<&str> = enclosing.iter().map(String::as_str).collect();

    let mut resolved = Vec::new();
    for part in split_top_level(fragment, ',') {
        let part = normalize_selector(part);
        // An empty prelude behaves like a bare `&`.
        let part = if part.is_empty() { "&".to_string() } else { part };

        if part.contains('&') {
            if parents.is_empty() {
                resolved.push(part.replace('&', ROOT_SELECTOR));
            } else {
                resolved.extend(parents.iter().map(|parent| part.replace('&', parent)));
            }
        } else if parents.is_empty() {
            resolved.push(part);
        } else {
            resolved.extend(parents.iter().map(|parent| format!("{} {}", parent, part)));
        }
    }
    resolved
}

/// Blanks out `/* ... */` comments, leaving quoted text alone.
fn strip_comments(text: &str) -> Result<String, CascadeError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((i, ch)) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                out.push(ch);
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                // Blank the comment out byte for byte so offsets still point
                // into the caller's text.
                chars.next();
                out.push_str("  ");
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        out.push_str("  ");
                        closed = true;
                        break;
                    }
                    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
                }
                if !closed {
                    return Err(CascadeError::UnterminatedComment { offset: i });
                }
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::rule_key::AtRuleScopes;

    fn pairs(blocks: &[FlatBlock]) -> Vec<(&str, &str)> {
        blocks
            .iter()
            .map(|b| (b.selector.as_str(), b.declarations.as_str()))
            .collect()
    }

    #[test]
    fn test_descendant_nesting() {
        let blocks = flatten("#test {#test1 {background-color: red;}}").unwrap();
        assert_eq!(pairs(&blocks), vec![("#test #test1", "background-color: red;")]);
    }

    #[test]
    fn test_nesting_marker() {
        let blocks = flatten("#test {&#test1 {color: red;}}").unwrap();
        assert_eq!(pairs(&blocks), vec![("#test#test1", "color: red;")]);

        let blocks = flatten("#test {#test1 & {color: red;}}").unwrap();
        assert_eq!(pairs(&blocks), vec![("#test1 #test", "color: red;")]);
    }

    #[test]
    fn test_top_level_marker_uses_root() {
        let blocks = flatten("& { --gap: 4px; }").unwrap();
        assert_eq!(pairs(&blocks), vec![(":root", "--gap: 4px;")]);
    }

    #[test]
    fn test_siblings_do_not_share_declarations() {
        let css = "
            .card {
                color: red;
                .title { font-weight: bold; }
                .body { margin: 0 }
                padding: 1px;
            }
        ";
        let blocks = flatten(css).unwrap();
        assert_eq!(
            pairs(&blocks),
            vec![
                (".card", "color: red;padding: 1px;"),
                (".card .title", "font-weight: bold;"),
                (".card .body", "margin: 0;"),
            ]
        );
    }

    #[test]
    fn test_repeated_blocks_accumulate() {
        let blocks = flatten("#a { color: red; } #b { x: 1; } #a { color: blue; width: 1px; }").unwrap();
        assert_eq!(
            pairs(&blocks),
            vec![
                ("#a", "color: red;color: blue;width: 1px;"),
                ("#b", "x: 1;"),
            ]
        );
    }

    #[test]
    fn test_selector_lists_expand() {
        let blocks = flatten("a, b { c, &:hover { color: red; } }").unwrap();
        let selectors: Vec<&str> = blocks.iter().map(|b| b.selector.as_str()).collect();
        assert_eq!(selectors, vec!["a c", "b c", "a:hover", "b:hover"]);
    }

    #[test]
    fn test_at_rule_scopes_wrap_children() {
        let css = "
            #a {
                @media screen and (min-width: 100px) {
                    color: red;
                    .b { color: blue; }
                }
            }
            @media (min-width:100px) { @media screen { #a { width: 1px; } } }
        ";
        let blocks = flatten(css).unwrap();
        assert_eq!(
            pairs(&blocks),
            vec![("#a", "color: red;width: 1px;"), ("#a .b", "color: blue;")]
        );

        let expected: AtRuleScopes = [(
            "@media".to_string(),
            ["(min-width:100px)".to_string(), "screen".to_string()]
                .into_iter()
                .collect(),
        )]
        .into_iter()
        .collect();
        assert_eq!(blocks[0].scopes, expected);
        assert_eq!(blocks[1].scopes, expected);
    }

    #[test]
    fn test_scoped_and_unscoped_blocks_stay_apart() {
        let blocks = flatten("#a { color: red; } @supports (display:grid) { #a { color: blue; } }").unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].scopes.is_empty());
        assert!(blocks[1].scopes.contains_key("@supports"));
        assert_ne!(blocks[0].key, blocks[1].key);
    }

    #[test]
    fn test_comments_strings_and_statements() {
        let css = "@import url(a.css); /* #x { color: red; } */ #a { content: \"{;}\"; }";
        let blocks = flatten(css).unwrap();
        assert_eq!(pairs(&blocks), vec![("#a", "content: \"{;}\";")]);
    }

    #[test]
    fn test_unbalanced_input_is_rejected() {
        assert_eq!(
            flatten("#a { color: red;"),
            Err(CascadeError::UnclosedBlock { offset: 16, depth: 1 })
        );
        assert_eq!(
            flatten("#a { } }"),
            Err(CascadeError::UnexpectedClosingBrace { offset: 7 })
        );
        assert_eq!(
            flatten("#a { } /* open"),
            Err(CascadeError::UnterminatedComment { offset: 7 })
        );
    }
}
