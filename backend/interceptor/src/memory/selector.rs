//! The CSS subset understood by [`super::MemoryDom`].
//!
//! Supported: selector lists (`a, b`), descendant and child combinators,
//! type, universal, `#id`, `.class`, `[attr]` and `[attr=value]` with
//! optional quotes.

use thiserror::Error;

use super::{ElementData, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported selector: {0}")]
pub struct SelectorError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Step {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

impl Step {
    fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(&el.tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|cond| match (&cond.value, el.attrs.get(&cond.name)) {
            (None, present) => present.is_some(),
            (Some(want), Some(have)) => want == have,
            (Some(_), None) => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    step: Step,
    // Relation to the part on the left.
    combinator: Option<Combinator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    groups: Vec<Vec<Part>>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let groups = split_outside_brackets(selector, |c| c == ',')?
            .iter()
            .map(|group| parse_chain(group, selector))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { groups })
    }

    pub(crate) fn matches(&self, node: NodeId, tree: &[ElementData]) -> bool {
        self.groups.iter().any(|chain| matches_chain(chain, node, tree))
    }
}

fn matches_chain(chain: &[Part], node: NodeId, tree: &[ElementData]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.step.matches(&tree[node.0]) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    let parent = tree[node.0].parent;
    match last.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => parent.is_some_and(|p| matches_chain(rest, p, tree)),
        Combinator::Descendant => {
            let mut cursor = parent;
            while let Some(ancestor) = cursor {
                if matches_chain(rest, ancestor, tree) {
                    return true;
                }
                cursor = tree[ancestor.0].parent;
            }
            false
        }
    }
}

fn parse_chain(group: &str, full: &str) -> Result<Vec<Part>, SelectorError> {
    let unsupported = || SelectorError(full.to_string());
    let mut parts: Vec<Part> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(group).ok_or_else(unsupported)? {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(unsupported());
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let step = parse_step(&token).ok_or_else(unsupported)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(unsupported());
    }
    Ok(parts)
}

fn split_outside_brackets(
    selector: &str,
    is_separator: impl Fn(char) -> bool,
) -> Result<Vec<String>, SelectorError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in selector.chars() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SelectorError(selector.to_string()))?;
            }
            c if depth == 0 && is_separator(c) => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(SelectorError(selector.to_string()));
                }
                groups.push(trimmed.to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    let trimmed = current.trim();
    if depth != 0 || trimmed.is_empty() {
        return Err(SelectorError(selector.to_string()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize(group: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in group.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            '>' if depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if depth != 0 {
        return None;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Some(tokens)
}

fn parse_step(token: &str) -> Option<Step> {
    let chars: Vec<char> = token.chars().collect();
    let mut step = Step::default();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                step.universal = true;
                i += 1;
            }
            '#' => {
                let (ident, next) = ident(&chars, i + 1)?;
                step.id = Some(ident);
                i = next;
            }
            '.' => {
                let (ident, next) = ident(&chars, i + 1)?;
                step.classes.push(ident);
                i = next;
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                step.attrs.push(parse_attr(&inner)?);
                i = close + 1;
            }
            _ => {
                if i != 0 {
                    return None;
                }
                let (ident, next) = ident(&chars, i)?;
                step.tag = Some(ident);
                i = next;
            }
        }
    }
    Some(step)
}

fn ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    let end = chars[start..]
        .iter()
        .position(|c| !(c.is_alphanumeric() || *c == '-' || *c == '_'))
        .map(|p| p + start)
        .unwrap_or(chars.len());
    (end > start).then(|| (chars[start..end].iter().collect(), end))
}

fn parse_attr(inner: &str) -> Option<AttrCondition> {
    let (name, value) = match inner.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (inner.trim(), None),
    };
    if name.is_empty() {
        return None;
    }
    Some(AttrCondition {
        name: name.to_string(),
        value,
    })
}
