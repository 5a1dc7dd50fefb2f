// Owned, specificity-ordered rules ready to be applied to a document.
use crate::error::CascadeError;
use crate::style::declarations::{parse_declarations, DeclarationMap};
use crate::style::flatten::flatten;
use crate::style::rule_key::{AtRuleScopes, RuleKey, ScopeStack};
use crate::style::specificity::Specificity;
use std::fmt;

/// One selector with its merged declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationBlock {
    pub key: RuleKey,
    /// e.g. "#test #test1", ".red", ":root"
    pub selector: String,
    pub specificity: Specificity,
    pub scopes: AtRuleScopes,
    /// Conditions as written; `@media` gating evaluates these.
    pub conditions: ScopeStack,
    pub declarations: DeclarationMap,
}

/// Declaration blocks in ascending specificity, source order among equals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    blocks: Vec<DeclarationBlock>,
}

/// Parses CSS text into a sorted stylesheet.
pub fn parse_stylesheet(css_text: &str) -> Result<Stylesheet, CascadeError> {
    let blocks = flatten(css_text)?
        .into_iter()
        .map(|flat| DeclarationBlock {
            key: flat.key,
            specificity: Specificity::of(&flat.selector),
            declarations: parse_declarations(&flat.declarations),
            selector: flat.selector,
            scopes: flat.scopes,
            conditions: flat.conditions,
        })
        .collect();
    Ok(Stylesheet::from_blocks(blocks))
}

impl Stylesheet {
    /// Wraps `blocks` (in source order) and sorts them.
    pub fn from_blocks(blocks: Vec<DeclarationBlock>) -> Self {
        let mut sheet = Stylesheet { blocks };
        sheet.sort();
        sheet
    }

    /// Stable sort by ascending specificity. Blocks with equal specificity
    /// keep their relative order, so later source still wins when applied.
    pub fn sort(&mut self) {
        self.blocks.sort_by_key(|block| block.specificity);
    }

    pub fn blocks(&self) -> &[DeclarationBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for DeclarationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.selector, self.specificity)?;
        for (kind, conditions) in &self.scopes {
            let conditions: Vec<&str> = conditions.iter().map(String::as_str).collect();
            write!(f, " {} {}", kind, conditions.join(" and "))?;
        }
        writeln!(f)?;
        for (property, value) in self.declarations.iter() {
            writeln!(f, "  {}: {}", property, value)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
