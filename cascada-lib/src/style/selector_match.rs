use crate::dom::dom_tree::{Document, ElementNode, NodeId};
use crate::style::declarations::split_top_level;
use log::warn;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
    /// [attr|="value"]: the value itself or the value followed by `-`
    DashMatch,
}

/// One attribute condition; `operator == None` only checks existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>,
    pub value: Option<String>,
}

/// Structural pseudo-classes the matcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    Root,
    FirstChild,
    LastChild,
    OnlyChild,
}

/// Everything between two combinators, e.g. `p.note#a[lang]:first-child`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<PseudoClass>,
    /// Set by pseudo-elements and unknown pseudo-classes.
    pub never_matches: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (whitespace).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// A key compound plus the compounds to its left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Nearest first: `ancestors[0]` is linked to `key` by its combinator.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Parses a comma-separated selector list, skipping invalid entries.
pub fn parse_selector_list(selector: &str) -> Vec<ComplexSelector> {
    split_top_level(selector, ',')
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| {
            let parsed = parse_complex_selector(part);
            if parsed.is_none() {
                warn!("unsupported selector `{}`", part.trim());
            }
            parsed
        })
        .collect()
}

/// Parses e.g. `div.red > p#header + span.foo`. Combinators do not need
/// surrounding whitespace.
pub fn parse_complex_selector(selector: &str) -> Option<ComplexSelector> {
    let mut compounds: Vec<(Combinator, CompoundSelector)> = split_compounds(selector)?
        .into_iter()
        .map(|(combinator, text)| (combinator, parse_compound_selector(&text)))
        .collect();

    // Each compound carries the combinator before it; walking right to left
    // pairs that combinator with the compound one step further left.
    let (mut link, key) = compounds.pop()?;
    let mut ancestors = Vec::with_capacity(compounds.len());
    while let Some((before, compound)) = compounds.pop() {
        ancestors.push((link, compound));
        link = before;
    }
    Some(ComplexSelector { key, ancestors })
}

/// Splits a complex selector into compounds, each paired with the
/// combinator that precedes it (the first gets `Descendant`).
fn split_compounds(selector: &str) -> Option<Vec<(Combinator, String)>> {
    let mut compounds: Vec<(Combinator, String)> = Vec::new();
    let mut current = String::new();
    let mut next: Option<Combinator> = None;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' if depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if depth > 0 => current.push(c),
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    compounds.push((next.take().unwrap_or(Combinator::Descendant), std::mem::take(&mut current)));
                    next = Some(Combinator::Descendant);
                }
            }
            '>' | '+' | '~' => {
                if !current.is_empty() {
                    compounds.push((next.take().unwrap_or(Combinator::Descendant), std::mem::take(&mut current)));
                }
                if compounds.is_empty() {
                    return None;
                }
                let combinator = match ch {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                };
                match next {
                    None | Some(Combinator::Descendant) => next = Some(combinator),
                    Some(_) => return None,
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        compounds.push((next.take().unwrap_or(Combinator::Descendant), current));
    } else if matches!(next, Some(c) if c != Combinator::Descendant) {
        return None;
    }
    if compounds.is_empty() {
        None
    } else {
        Some(compounds)
    }
}

/// Parse a compound selector string, e.g. `div.red#header[disabled][data-type~="main"]`.
pub fn parse_compound_selector(selector: &str) -> CompoundSelector {
    let mut compound = CompoundSelector::default();
    let mut chars = selector.chars().peekable();
    let is_delimiter = |ch: char| matches!(ch, '#' | '.' | '[' | ':');

    let read_name = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>| {
        let mut name = String::new();
        while let Some(&ch) = chars.peek() {
            if is_delimiter(ch) || ch == '(' {
                break;
            }
            name.push(ch);
            chars.next();
        }
        name
    };

    // A leading name (or `*`) is the tag.
    if chars.peek().is_some_and(|ch| !is_delimiter(*ch)) {
        let tag = read_name(&mut chars);
        if tag != "*" && !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let id = read_name(&mut chars);
                if !id.is_empty() {
                    compound.ids.push(id);
                }
            }
            '.' => {
                let class = read_name(&mut chars);
                if !class.is_empty() {
                    compound.classes.push(class);
                }
            }
            '[' => {
                let mut body = String::new();
                let mut quote: Option<char> = None;
                for ch in chars.by_ref() {
                    match quote {
                        Some(q) if ch == q => quote = None,
                        None if ch == '"' || ch == '\'' => quote = Some(ch),
                        None if ch == ']' => break,
                        _ => {}
                    }
                    body.push(ch);
                }
                if let Some(attribute) = parse_attribute(&body) {
                    compound.attributes.push(attribute);
                }
            }
            ':' => {
                let pseudo_element = chars.peek() == Some(&':');
                if pseudo_element {
                    chars.next();
                }
                let name = read_name(&mut chars).to_ascii_lowercase();
                if chars.peek() == Some(&'(') {
                    skip_parenthesized(&mut chars);
                }
                let pseudo = match name.as_str() {
                    _ if pseudo_element => None,
                    "root" => Some(PseudoClass::Root),
                    "first-child" => Some(PseudoClass::FirstChild),
                    "last-child" => Some(PseudoClass::LastChild),
                    "only-child" => Some(PseudoClass::OnlyChild),
                    other => {
                        warn!("pseudo-class `:{}` never matches", other);
                        None
                    }
                };
                match pseudo {
                    Some(pseudo) => compound.pseudo_classes.push(pseudo),
                    None => compound.never_matches = true,
                }
            }
            _ => {}
        }
    }
    compound
}

/// Parses the inside of `[...]`.
fn parse_attribute(body: &str) -> Option<AttributeSelector> {
    let body = body.trim();
    let operator_at = body.find(|c: char| matches!(c, '=' | '~' | '^' | '$' | '*' | '|'));
    let Some(at) = operator_at else {
        return (!body.is_empty()).then(|| AttributeSelector {
            name: body.to_ascii_lowercase(),
            operator: None,
            value: None,
        });
    };

    let name = body[..at].trim().to_ascii_lowercase();
    let rest = &body[at..];
    let (operator, value) = if let Some(value) = rest.strip_prefix('=') {
        (AttributeOperator::Exact, value)
    } else {
        let operator = match rest.get(..2)? {
            "~=" => AttributeOperator::Includes,
            "^=" => AttributeOperator::Prefix,
            "$=" => AttributeOperator::Suffix,
            "*=" => AttributeOperator::Substring,
            "|=" => AttributeOperator::DashMatch,
            _ => return None,
        };
        (operator, &rest[2..])
    };
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    if name.is_empty() {
        return None;
    }
    Some(AttributeSelector {
        name,
        operator: Some(operator),
        value: Some(value.to_string()),
    })
}

fn skip_parenthesized(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let mut depth = 0usize;
    for ch in chars.by_ref() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
            _ => {}
        }
    }
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Returns true if the element `id` matches `selector`, trying every
/// possible ancestor or sibling for the non-key compounds.
pub fn matches(document: &Document, id: NodeId, selector: &ComplexSelector) -> bool {
    matches_compound(document, id, &selector.key) && matches_chain(document, id, &selector.ancestors)
}

fn matches_chain(
    document: &Document,
    id: NodeId,
    chain: &[(Combinator, CompoundSelector)],
) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };
    let try_candidate =
        |candidate: NodeId| matches_compound(document, candidate, compound) && matches_chain(document, candidate, rest);

    match combinator {
        Combinator::Child => document.parent_element(id).is_some_and(try_candidate),
        Combinator::Descendant => {
            let mut current = document.parent_element(id);
            while let Some(ancestor) = current {
                if try_candidate(ancestor) {
                    return true;
                }
                current = document.parent_element(ancestor);
            }
            false
        }
        Combinator::AdjacentSibling => document
            .previous_element_siblings(id)
            .first()
            .copied()
            .is_some_and(try_candidate),
        Combinator::GeneralSibling => document
            .previous_element_siblings(id)
            .into_iter()
            .any(try_candidate),
    }
}

/// Checks tag, ids, classes, attributes and pseudo-classes of one element.
pub fn matches_compound(document: &Document, id: NodeId, compound: &CompoundSelector) -> bool {
    if compound.never_matches {
        return false;
    }
    let Some(elem) = document.element(id) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound.ids.iter().all(|wanted| elem.id() == Some(wanted.as_str())) {
        return false;
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    if !compound.attributes.iter().all(|attr| matches_attribute(elem, attr)) {
        return false;
    }
    compound
        .pseudo_classes
        .iter()
        .all(|pseudo| matches_pseudo_class(document, id, *pseudo))
}

fn matches_attribute(elem: &ElementNode, selector: &AttributeSelector) -> bool {
    let Some(actual) = elem.attributes.get(&selector.name) else {
        return false;
    };
    let (Some(operator), Some(expected)) = (&selector.operator, &selector.value) else {
        return true;
    };
    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected.as_str()),
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
    }
}

fn matches_pseudo_class(document: &Document, id: NodeId, pseudo: PseudoClass) -> bool {
    let is_first = || document.previous_element_siblings(id).is_empty();
    let is_last = || document.next_element_sibling(id).is_none();
    match pseudo {
        PseudoClass::Root => document.document_element() == Some(id),
        PseudoClass::FirstChild => is_first(),
        PseudoClass::LastChild => is_last(),
        PseudoClass::OnlyChild => is_first() && is_last(),
    }
}
