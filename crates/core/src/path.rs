// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema path representation and the path-expression grammar.
//!
//! A canonical path is `Device.A.B.{i}.C.{j}.Leaf` with `{i}` substituted by
//! decimal instance numbers once concrete. An expression adds wildcards
//! (`*`), boolean filters (`[...]`), ordered-result filters (`[+...]`) and
//! reference-following (`#`) on top of the canonical grammar; resolving one
//! against live instance state is the Path Resolver's job (`uspa-engine::resolver`).

use std::fmt;

/// Upper bound on the number of dotted segments in a path.
pub const MAX_PATH_SEGMENTS: usize = 32;
/// Upper bound on an individual instance number's decimal order of magnitude.
pub const MAX_DM_INSTANCE_ORDER: u32 = 10;
/// Upper bound on the total length of a path string.
pub const MAX_DM_PATH: usize = 1024;

/// One segment of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal schema name, e.g. `Device`, `MTP`.
    Name(String),
    /// A concrete instance number, e.g. the `1` in `MTP.1.`.
    Instance(u32),
    /// `*` — any instance of the owning table.
    Wildcard,
    /// `[expr]` — a boolean filter over sibling parameters.
    Filter { expr: FilterExpr, ordered: bool },
    /// `Name#` — follow a reference parameter named `Name` to its target object.
    Reference(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(n) => write!(f, "{n}"),
            Segment::Instance(i) => write!(f, "{i}"),
            Segment::Wildcard => write!(f, "*"),
            Segment::Filter { expr, ordered } => {
                write!(f, "[{}{}]", if *ordered { "+" } else { "" }, expr)
            }
            Segment::Reference(n) => write!(f, "{n}#"),
        }
    }
}

/// A parsed path expression: an ordered list of segments, joined by `.`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathExpr {
    pub segments: Vec<Segment>,
    /// Whether the original string ended in a trailing `.` (object path form).
    pub trailing_dot: bool,
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join("."))?;
        if self.trailing_dot {
            write!(f, ".")?;
        }
        Ok(())
    }
}

impl PathExpr {
    /// Does this expression contain any wildcard, filter, or reference
    /// segment that requires resolution against live instance state?
    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Wildcard | Segment::Filter { .. } | Segment::Reference(_)))
    }

    /// Render the segments with concrete instance numbers substituted,
    /// ignoring filters/wildcards — used once resolved to a concrete path.
    pub fn to_canonical(&self) -> String {
        self.to_string()
    }
}

/// A boolean filter expression appearing inside `[...]`.
///
/// Grammar: `expr := clause (('&&') clause)*`; clause := `name op literal`.
/// Only `&&` combination is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    pub clauses: Vec<FilterClause>,
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(" && "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub name: String,
    pub op: FilterOp,
    pub literal: String,
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.op, self.literal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

crate::simple_display! {
    FilterOp {
        Eq => "==",
        Ne => "!=",
        Gt => ">",
        Lt => "<",
        Ge => ">=",
        Le => "<=",
    }
}

/// Error produced while parsing a path expression string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    #[error("empty path")]
    Empty,
    #[error("path exceeds {MAX_DM_PATH} bytes")]
    TooLong,
    #[error("path has more than {MAX_PATH_SEGMENTS} segments")]
    TooManySegments,
    #[error("unterminated filter expression")]
    UnterminatedFilter,
    #[error("malformed filter clause: {0}")]
    BadFilterClause(String),
    #[error("empty segment")]
    EmptySegment,
}

/// Parse a path expression string into a [`PathExpr`].
///
/// This is a small hand-rolled recursive-descent parser; the grammar is too
/// small to justify a parser-combinator dependency.
pub fn parse(input: &str) -> Result<PathExpr, PathParseError> {
    if input.is_empty() {
        return Err(PathParseError::Empty);
    }
    if input.len() > MAX_DM_PATH {
        return Err(PathParseError::TooLong);
    }

    let trailing_dot = input.ends_with('.');
    let body = if trailing_dot { &input[..input.len() - 1] } else { input };

    let mut segments = Vec::new();
    let mut chars = body.chars().peekable();
    let mut current = String::new();

    fn flush(current: &mut String, segments: &mut Vec<Segment>) -> Result<(), PathParseError> {
        if current.is_empty() {
            return Ok(());
        }
        segments.push(parse_plain_segment(current)?);
        current.clear();
        Ok(())
    }

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                flush(&mut current, &mut segments)?;
            }
            '[' => {
                chars.next();
                if !current.is_empty() {
                    return Err(PathParseError::BadFilterClause(
                        "filter must start a segment".into(),
                    ));
                }
                let mut depth = 1;
                let mut raw = String::new();
                for c in chars.by_ref() {
                    match c {
                        '[' => {
                            depth += 1;
                            raw.push(c);
                        }
                        ']' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            raw.push(c);
                        }
                        _ => raw.push(c),
                    }
                }
                if depth != 0 {
                    return Err(PathParseError::UnterminatedFilter);
                }
                let (ordered, raw) =
                    if let Some(rest) = raw.strip_prefix('+') { (true, rest) } else { (false, raw.as_str()) };
                let expr = parse_filter_expr(raw)?;
                segments.push(Segment::Filter { expr, ordered });
            }
            '#' => {
                chars.next();
                if current.is_empty() {
                    return Err(PathParseError::EmptySegment);
                }
                segments.push(Segment::Reference(std::mem::take(&mut current)));
            }
            _ => {
                current.push(c);
                chars.next();
            }
        }
    }
    flush(&mut current, &mut segments)?;

    if segments.is_empty() {
        return Err(PathParseError::Empty);
    }
    if segments.len() > MAX_PATH_SEGMENTS {
        return Err(PathParseError::TooManySegments);
    }

    Ok(PathExpr { segments, trailing_dot })
}

fn parse_plain_segment(s: &str) -> Result<Segment, PathParseError> {
    if s.is_empty() {
        return Err(PathParseError::EmptySegment);
    }
    if s == "*" {
        return Ok(Segment::Wildcard);
    }
    if let Ok(n) = s.parse::<u32>() {
        return Ok(Segment::Instance(n));
    }
    Ok(Segment::Name(s.to_string()))
}

fn parse_filter_expr(raw: &str) -> Result<FilterExpr, PathParseError> {
    let mut clauses = Vec::new();
    for clause_str in raw.split("&&") {
        let clause_str = clause_str.trim();
        if clause_str.is_empty() {
            return Err(PathParseError::BadFilterClause(raw.to_string()));
        }
        clauses.push(parse_filter_clause(clause_str)?);
    }
    Ok(FilterExpr { clauses })
}

const FILTER_OPS: &[(&str, FilterOp)] =
    &[("==", FilterOp::Eq), ("!=", FilterOp::Ne), (">=", FilterOp::Ge), ("<=", FilterOp::Le), (">", FilterOp::Gt), ("<", FilterOp::Lt)];

fn parse_filter_clause(s: &str) -> Result<FilterClause, PathParseError> {
    for (token, op) in FILTER_OPS {
        if let Some(idx) = s.find(token) {
            let name = s[..idx].trim().to_string();
            let literal = s[idx + token.len()..].trim().to_string();
            if name.is_empty() {
                return Err(PathParseError::BadFilterClause(s.to_string()));
            }
            return Ok(FilterClause { name, op: *op, literal });
        }
    }
    Err(PathParseError::BadFilterClause(s.to_string()))
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
