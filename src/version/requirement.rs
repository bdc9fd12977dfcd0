//! Version range requirements
//!
//! A requirement is a comma-separated list of constraints that must all hold,
//! e.g. `> 1.2.3, < 1.3` or `>= 13.a`. Shorthand operators (`~>`, `~=`, `~`,
//! `^`, wildcards) are expanded into plain comparisons when parsed.

use std::fmt;

use super::{Version, VersionScheme};
use crate::error::PolicyError;

/// Comparison operator of a single constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }
}

/// A single `operator version` comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub op: Operator,
    pub version: Version,
}

impl Constraint {
    fn new(op: Operator, version: Version) -> Self {
        Self { op, version }
    }

    /// Returns true if the version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            Operator::Eq => version == &self.version,
            Operator::NotEq => version != &self.version,
            Operator::Gt => version > &self.version,
            Operator::Gte => version >= &self.version,
            Operator::Lt => version < &self.version,
            Operator::Lte => version <= &self.version,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.symbol(), self.version)
    }
}

/// A parsed range string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    raw: String,
    constraints: Vec<Constraint>,
}

impl Requirement {
    /// Parse a range string using the scheme's bound parser
    pub fn parse(scheme: VersionScheme, raw: &str) -> Result<Self, PolicyError> {
        let mut constraints = Vec::new();

        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(PolicyError::invalid_requirement(raw, "empty constraint"));
            }
            constraints.extend(parse_constraint(scheme, raw, part)?);
        }

        Ok(Self {
            raw: raw.trim().to_string(),
            constraints,
        })
    }

    /// Returns true if every constraint holds for the version
    pub fn satisfied_by(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }

    /// The expanded constraints
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The range string as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if this is the `>= 0` "every version" range
    pub fn matches_all_versions(&self) -> bool {
        matches!(
            self.constraints.as_slice(),
            [Constraint { op: Operator::Gte, version }] if version.segments().is_empty() && version.local().is_empty()
        )
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn parse_constraint(
    scheme: VersionScheme,
    raw: &str,
    part: &str,
) -> Result<Vec<Constraint>, PolicyError> {
    const OPERATORS: [&str; 11] = [">=", "<=", "!=", "==", "~>", "~=", ">", "<", "=", "~", "^"];

    let (op, rest) = OPERATORS
        .iter()
        .find_map(|op| part.strip_prefix(op).map(|rest| (*op, rest.trim())))
        .unwrap_or(("", part));

    if rest.is_empty() {
        return Err(PolicyError::invalid_requirement(raw, "missing version"));
    }

    if let Some(prefix) = wildcard_prefix(rest) {
        return match op {
            "" | "=" | "==" => wildcard_range(scheme, raw, prefix),
            _ => Err(PolicyError::invalid_requirement(
                raw,
                format!("wildcard not allowed with '{}'", op),
            )),
        };
    }

    let version = parse_bound(scheme, raw, rest)?;
    let constraints = match op {
        "" | "=" | "==" => vec![Constraint::new(Operator::Eq, version)],
        "!=" => vec![Constraint::new(Operator::NotEq, version)],
        ">" => vec![Constraint::new(Operator::Gt, version)],
        ">=" => vec![Constraint::new(Operator::Gte, version)],
        "<" => vec![Constraint::new(Operator::Lt, version)],
        "<=" => vec![Constraint::new(Operator::Lte, version)],
        "~>" | "~=" => {
            let upper = pessimistic_upper(version.release()).ok_or_else(|| overflow(raw))?;
            bounded(scheme, raw, version, &upper)?
        }
        "~" => {
            let upper = tilde_upper(version.release()).ok_or_else(|| overflow(raw))?;
            bounded(scheme, raw, version, &upper)?
        }
        _ => {
            let upper = caret_upper(version.release()).ok_or_else(|| overflow(raw))?;
            bounded(scheme, raw, version, &upper)?
        }
    };

    Ok(constraints)
}

fn overflow(raw: &str) -> PolicyError {
    PolicyError::invalid_requirement(raw, "version component too large")
}

fn parse_bound(scheme: VersionScheme, raw: &str, text: &str) -> Result<Version, PolicyError> {
    scheme.parse_bound(text).map_err(|_| {
        PolicyError::invalid_requirement(raw, format!("unparseable version '{}'", text))
    })
}

fn bounded(
    scheme: VersionScheme,
    raw: &str,
    lower: Version,
    upper: &[u64],
) -> Result<Vec<Constraint>, PolicyError> {
    if upper.is_empty() {
        return Err(PolicyError::invalid_requirement(
            raw,
            "range operator needs a numeric version",
        ));
    }
    let upper = parse_bound(scheme, raw, &join(upper))?;
    Ok(vec![
        Constraint::new(Operator::Gte, lower),
        Constraint::new(Operator::Lt, upper),
    ])
}

/// `1.2.*`, `1.2.x` and `*` return the fixed prefix (`1.2`, `1.2`, ``)
fn wildcard_prefix(text: &str) -> Option<&str> {
    if matches!(text, "*" | "x" | "X") {
        return Some("");
    }
    [".*", ".x", ".X"]
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
}

fn wildcard_range(
    scheme: VersionScheme,
    raw: &str,
    prefix: &str,
) -> Result<Vec<Constraint>, PolicyError> {
    if prefix.is_empty() {
        return Ok(vec![Constraint::new(
            Operator::Gte,
            parse_bound(scheme, raw, "0")?,
        )]);
    }

    let parts = prefix
        .split('.')
        .map(|p| p.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| PolicyError::invalid_requirement(raw, "wildcard prefix must be numeric"))?;

    let mut upper = parts.clone();
    if let Some(last) = upper.last_mut() {
        *last = last.checked_add(1).ok_or_else(|| overflow(raw))?;
    }
    let lower = parse_bound(scheme, raw, &join(&parts))?;
    bounded(scheme, raw, lower, &upper)
}

/// `~> 1.2.3` allows changes in the last given component only
fn pessimistic_upper(release: &[u64]) -> Option<Vec<u64>> {
    let mut upper = release.to_vec();
    if upper.len() > 1 {
        upper.pop();
    }
    if let Some(last) = upper.last_mut() {
        *last = last.checked_add(1)?;
    }
    Some(upper)
}

/// `~1.2.3` and `~1.2` allow patch changes, `~1` allows minor changes
fn tilde_upper(release: &[u64]) -> Option<Vec<u64>> {
    let upper = match release {
        [] => Vec::new(),
        [major] => vec![major.checked_add(1)?],
        [major, minor, ..] => vec![*major, minor.checked_add(1)?],
    };
    Some(upper)
}

/// `^` allows changes that do not modify the left-most non-zero component
fn caret_upper(release: &[u64]) -> Option<Vec<u64>> {
    let upper = match release {
        [] => Vec::new(),
        [major, ..] if *major > 0 => vec![major.checked_add(1)?],
        [_] => vec![1],
        [_, minor] => vec![0, minor.checked_add(1)?],
        [_, minor, ..] if *minor > 0 => vec![0, minor.checked_add(1)?],
        [_, _, patch, ..] => vec![0, 0, patch.checked_add(1)?],
    };
    Some(upper)
}

fn join(parts: &[u64]) -> String {
    parts
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
