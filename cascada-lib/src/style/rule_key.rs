//! Block identity: a stable digest over (selector, at-rule scopes), and the
//! working map that merges repeated occurrences of the same block.

use log::trace;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Normalized at-rule scopes: at-rule type (e.g. `@media`) → sorted set of
/// minified conditions.
pub type AtRuleScopes = BTreeMap<String, BTreeSet<String>>;

/// The active scope stack during a scan: at-rule type → conditions in the
/// order they were opened.
pub type ScopeStack = BTreeMap<String, Vec<String>>;

/// 128-bit identity of a declaration block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey([u8; 16]);

impl RuleKey {
    /// Digests a normalized selector and normalized scopes.
    pub fn compute(selector: &str, scopes: &AtRuleScopes) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_selector(selector).as_bytes());
        hasher.update(b"\x1f");
        hasher.update(serialize_scopes(scopes).as_bytes());
        let digest = hasher.finalize();

        let mut key = [0u8; 16];
        key.copy_from_slice(&digest[..16]);
        RuleKey(key)
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleKey({})", self)
    }
}

/// Collapses whitespace runs to one space and trims.
pub fn normalize_selector(selector: &str) -> String {
    selector.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Minifies at-rule parameter text: whitespace collapsed, and dropped next
/// to `(`, `)`, `:` and `,`.
pub fn minify_condition(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let after_tight = out.ends_with(|c: char| matches!(c, '(' | ':' | ','));
            let before_tight = matches!(ch, ')' | ':' | ',');
            if !out.is_empty() && !after_tight && !before_tight {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

/// Splits one condition on the `and` keyword joining compound conditions.
pub fn split_compound_condition(condition: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in condition.split_whitespace() {
        if word.eq_ignore_ascii_case("and") {
            parts.push(current.join(" "));
            current.clear();
        } else {
            current.push(word);
        }
    }
    parts.push(current.join(" "));
    parts
        .into_iter()
        .map(|part| minify_condition(&part))
        .filter(|part| !part.is_empty())
        .collect()
}

/// Flattens every type's condition stack into a sorted set, independent of
/// how the source grouped or ordered the conditions.
pub fn normalize_scopes(stack: &ScopeStack) -> AtRuleScopes {
    stack
        .iter()
        .map(|(kind, conditions)| {
            let set = conditions
                .iter()
                .flat_map(|condition| split_compound_condition(condition))
                .collect();
            (kind.clone(), set)
        })
        .collect()
}

fn serialize_scopes(scopes: &AtRuleScopes) -> String {
    let mut out = String::new();
    for (kind, conditions) in scopes {
        out.push_str(kind);
        out.push('{');
        out.push_str(&conditions.iter().cloned().collect::<Vec<_>>().join("\x1e"));
        out.push('}');
    }
    out
}

/// A merged, not yet parsed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBlock {
    pub key: RuleKey,
    pub selector: String,
    pub scopes: AtRuleScopes,
    /// Minified conditions as first written, one entry per nesting level.
    pub conditions: ScopeStack,
    /// Declaration text of every occurrence, in source order.
    pub declarations: String,
}

/// Working map of blocks keyed by [`RuleKey`], kept in first-seen order.
#[derive(Debug, Default)]
pub struct BlockMap {
    blocks: Vec<FlatBlock>,
    index: HashMap<RuleKey, usize>,
}

impl BlockMap {
    pub fn new() -> Self {
        BlockMap::default()
    }

    /// Returns the slot for (selector, scopes), creating it on first sight.
    pub fn register(&mut self, selector: &str, stack: &ScopeStack) -> usize {
        let scopes = normalize_scopes(stack);
        let selector = normalize_selector(selector);
        let key = RuleKey::compute(&selector, &scopes);
        trace!("rule key {} for `{}` {:?}", key, selector, scopes);

        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        self.blocks.push(FlatBlock {
            key,
            selector,
            scopes,
            conditions: stack.clone(),
            declarations: String::new(),
        });
        let slot = self.blocks.len() - 1;
        self.index.insert(key, slot);
        slot
    }

    /// Appends declaration text after whatever the slot already holds.
    pub fn append(&mut self, slot: usize, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(block) = self.blocks.get_mut(slot) {
            trace!("merging `{}` into `{}`", text, block.selector);
            block.declarations.push_str(text);
            if !text.ends_with(';') {
                block.declarations.push(';');
            }
        }
    }

    /// Blocks that received declaration text, in first-seen order.
    pub fn into_blocks(self) -> Vec<FlatBlock> {
        self.blocks
            .into_iter()
            .filter(|block| !block.declarations.is_empty())
            .collect()
    }
}
