//! The CSS subset understood by the in-memory document.
//!
//! Supported: selector groups (`a, b`), descendant and child (`>`)
//! combinators, and compounds built from `tag`, `*`, `#id`, `.class` and
//! attribute tests `[k]`, `[k=v]`, `[k^=v]`, `[k$=v]`, `[k*=v]`.

use thiserror::Error;

use super::document::{Document, ElementKey};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported selector '{selector}': {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    compound: Compound,
    /// Relation to the part on the left; `None` for the leftmost part.
    combinator: Option<Combinator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Vec<Part>>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let fail = |reason: &str| SelectorError {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let mut groups = Vec::new();
        for group in split_top_level(input, ',') {
            let group = group.trim();
            if group.is_empty() {
                return Err(fail("empty selector group"));
            }
            groups.push(parse_group(group).map_err(|reason| fail(&reason))?);
        }
        if groups.is_empty() {
            return Err(fail("empty selector"));
        }
        Ok(Self { groups })
    }

    pub fn matches(&self, doc: &Document, key: ElementKey) -> bool {
        self.groups
            .iter()
            .any(|parts| matches_from(doc, key, parts, parts.len() - 1))
    }
}

fn matches_from(doc: &Document, key: ElementKey, parts: &[Part], index: usize) -> bool {
    let part = &parts[index];
    if !compound_matches(doc, key, &part.compound) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match part.combinator {
        Some(Combinator::Child) => doc
            .parent(key)
            .map(|parent| matches_from(doc, parent, parts, index - 1))
            .unwrap_or(false),
        _ => {
            let mut current = doc.parent(key);
            while let Some(ancestor) = current {
                if matches_from(doc, ancestor, parts, index - 1) {
                    return true;
                }
                current = doc.parent(ancestor);
            }
            false
        }
    }
}

fn compound_matches(doc: &Document, key: ElementKey, compound: &Compound) -> bool {
    let Some(node) = doc.node(key) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if tag != "*" && *tag != node.tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound
        .classes
        .iter()
        .all(|class| node.classes.iter().any(|c| c == class))
    {
        return false;
    }
    compound.attrs.iter().all(|test| {
        let Some(actual) = node.attribute(&test.name) else {
            return false;
        };
        match test.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == test.value,
            AttrOp::Prefix => actual.starts_with(&test.value),
            AttrOp::Suffix => actual.ends_with(&test.value),
            AttrOp::Contains => actual.contains(&test.value),
        }
    })
}

/// Split on `sep` outside brackets and quotes.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match (ch, quote) {
            ('\\', _) => {
                escaped = true;
                current.push(ch);
            }
            (q, Some(open)) if q == open => {
                quote = None;
                current.push(ch);
            }
            (_, Some(_)) => current.push(ch),
            ('\'' | '"', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            ('[', None) => {
                depth += 1;
                current.push(ch);
            }
            (']', None) => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            (c, None) if c == sep && depth == 0 => out.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    out.push(current);
    out
}

fn parse_group(group: &str) -> Result<Vec<Part>, String> {
    let chars: Vec<char> = group.chars().collect();
    let mut parts = Vec::new();
    let mut pos = 0;
    let mut pending: Option<Combinator> = None;

    while pos < chars.len() {
        let start = pos;
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos < chars.len() && chars[pos] == '>' {
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }
        if pos > start && !parts.is_empty() && pending.is_none() {
            pending = Some(Combinator::Descendant);
        }
        if pos >= chars.len() {
            break;
        }

        let (compound, next) = parse_compound(&chars, pos)?;
        if next == pos {
            return Err(format!("unexpected '{}'", chars[pos]));
        }
        pos = next;
        let combinator = if parts.is_empty() {
            if pending.is_some() {
                return Err("selector starts with a combinator".to_string());
            }
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part {
            compound,
            combinator,
        });
    }

    if pending == Some(Combinator::Child) {
        return Err("dangling child combinator".to_string());
    }
    if parts.is_empty() {
        return Err("no compound selector".to_string());
    }
    Ok(parts)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], mut pos: usize) -> (String, usize) {
    let start = pos;
    while pos < chars.len() && is_ident_char(chars[pos]) {
        pos += 1;
    }
    (chars[start..pos].iter().collect(), pos)
}

fn parse_compound(chars: &[char], mut pos: usize) -> Result<(Compound, usize), String> {
    let mut compound = Compound::default();

    if pos < chars.len() && chars[pos] == '*' {
        compound.tag = Some("*".to_string());
        pos += 1;
    } else if pos < chars.len() && is_ident_char(chars[pos]) {
        let (tag, next) = read_ident(chars, pos);
        compound.tag = Some(tag.to_ascii_lowercase());
        pos = next;
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                let (id, next) = read_ident(chars, pos + 1);
                if id.is_empty() {
                    return Err("empty id".to_string());
                }
                compound.id = Some(id);
                pos = next;
            }
            '.' => {
                let (class, next) = read_ident(chars, pos + 1);
                if class.is_empty() {
                    return Err("empty class".to_string());
                }
                compound.classes.push(class);
                pos = next;
            }
            '[' => {
                let (test, next) = parse_attr(chars, pos + 1)?;
                compound.attrs.push(test);
                pos = next;
            }
            c if c.is_whitespace() || c == '>' => break,
            other => return Err(format!("unsupported token '{other}'")),
        }
    }
    Ok((compound, pos))
}

fn parse_attr(chars: &[char], mut pos: usize) -> Result<(AttrTest, usize), String> {
    let skip_ws = |mut p: usize| {
        while p < chars.len() && chars[p].is_whitespace() {
            p += 1;
        }
        p
    };

    pos = skip_ws(pos);
    let (name, next) = read_ident(chars, pos);
    if name.is_empty() {
        return Err("empty attribute name".to_string());
    }
    pos = skip_ws(next);

    let op = match chars.get(pos) {
        Some(']') => {
            return Ok((
                AttrTest {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                },
                pos + 1,
            ))
        }
        Some('=') => {
            pos += 1;
            AttrOp::Equals
        }
        Some(c @ ('^' | '$' | '*')) if chars.get(pos + 1) == Some(&'=') => {
            pos += 2;
            match c {
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                _ => AttrOp::Contains,
            }
        }
        _ => return Err(format!("bad attribute test on '{name}'")),
    };

    pos = skip_ws(pos);
    let mut value = String::new();
    match chars.get(pos) {
        Some(&q @ ('\'' | '"')) => {
            pos += 1;
            let mut closed = false;
            while pos < chars.len() {
                let c = chars[pos];
                pos += 1;
                if c == '\\' {
                    if let Some(next) = chars.get(pos) {
                        value.push(*next);
                        pos += 1;
                    }
                } else if c == q {
                    closed = true;
                    break;
                } else {
                    value.push(c);
                }
            }
            if !closed {
                return Err("unterminated attribute value".to_string());
            }
        }
        _ => {
            let (raw, next) = read_ident(chars, pos);
            value = raw;
            pos = next;
        }
    }

    pos = skip_ws(pos);
    if chars.get(pos) != Some(&']') {
        return Err("missing ']'".to_string());
    }
    Ok((AttrTest { name, op, value }, pos + 1))
}
