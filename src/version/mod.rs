//! Version parsing and ordering across package ecosystems
//!
//! This module provides:
//! - `Version`: an immutable, totally ordered version value
//! - `VersionScheme`: the per-ecosystem parsing rules that produce it
//! - `Requirement`: comma-separated range constraints such as `> 1.2.3, < 1.3`
//!
//! Ordering follows RubyGems conventions, which every scheme maps onto:
//! numeric segments compare numerically, alphabetic segments lexically, an
//! alphabetic segment sorts below any number (so `1.0.a < 1.0`), and missing
//! trailing segments count as zero (`1.2 == 1.2.0`). Two PEP 440 versions
//! compare with `pep440_rs` instead, so post releases of pre-releases and
//! epochs order the way pip orders them.

mod requirement;
mod scheme;

pub use requirement::{Constraint, Operator, Requirement};
pub use scheme::VersionScheme;

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::PolicyError;

/// One component of a version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Numeric component (`12`)
    Number(u64),
    /// Alphabetic component (`beta`)
    Text(String),
}

impl Segment {
    fn zero() -> Self {
        Segment::Number(0)
    }

    fn is_zero(&self) -> bool {
        matches!(self, Segment::Number(0))
    }

    fn compare(&self, other: &Segment) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Number(n) => write!(f, "{}", n),
            Segment::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A parsed version
///
/// Created through a [`VersionScheme`]; the original text is kept for display
/// so that `scheme.parse(&v.to_string())` always yields an equal value.
#[derive(Debug, Clone)]
pub struct Version {
    /// The version as supplied (trimmed)
    raw: String,
    /// Normalized text without prefixes, local or build suffixes
    base: String,
    /// Leading numeric components as written (`1.2.0` keeps three)
    release: Vec<u64>,
    /// Comparison key with insignificant trailing zeros removed
    canonical: Vec<Segment>,
    /// Local version label (`+ubuntu.1`), empty when absent
    local: Vec<Segment>,
    /// Set by the PEP 440 scheme
    pep440: Option<pep440_rs::Version>,
}

impl Version {
    pub(crate) fn from_parts(
        raw: impl Into<String>,
        base: impl Into<String>,
        segments: Vec<Segment>,
        local: Vec<Segment>,
    ) -> Self {
        let release = segments
            .iter()
            .map_while(|s| match s {
                Segment::Number(n) => Some(*n),
                Segment::Text(_) => None,
            })
            .collect();

        Self {
            raw: raw.into(),
            base: base.into(),
            release,
            canonical: canonicalize(segments),
            local,
            pep440: None,
        }
    }

    /// Attach the `pep440_rs` value used to order against other PEP 440 versions
    pub(crate) fn with_pep440(mut self, parsed: pep440_rs::Version, release: Vec<u64>) -> Self {
        self.pep440 = Some(parsed);
        self.release = release;
        self
    }

    /// The version text as supplied
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Normalized version text without `v` prefix, local label or build metadata
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Leading numeric components as written
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Number of leading numeric components (`1.2` has precision 2)
    pub fn precision(&self) -> usize {
        self.release.len()
    }

    /// First numeric component
    pub fn major(&self) -> u64 {
        self.release.first().copied().unwrap_or(0)
    }

    /// Segments used for comparison
    pub fn segments(&self) -> &[Segment] {
        &self.canonical
    }

    /// Local version label segments (empty when there is none)
    pub fn local(&self) -> &[Segment] {
        &self.local
    }

    /// Returns true if the version carries an alphabetic (pre-release) segment
    pub fn is_prerelease(&self) -> bool {
        self.canonical.iter().any(|s| matches!(s, Segment::Text(_)))
    }

    /// Major, minor and patch with missing components filled with zero
    pub fn semver_parts(&self) -> (u64, u64, u64) {
        let part = |i: usize| self.release.get(i).copied().unwrap_or(0);
        (part(0), part(1), part(2))
    }
}

/// Drop trailing zeros from the release part and from the pre-release part
fn canonicalize(segments: Vec<Segment>) -> Vec<Segment> {
    let split = segments
        .iter()
        .position(|s| matches!(s, Segment::Text(_)))
        .unwrap_or(segments.len());
    let (numeric, rest) = segments.split_at(split);

    let mut canonical = trim_trailing_zeros(numeric);
    canonical.extend(trim_trailing_zeros(rest));
    canonical
}

fn trim_trailing_zeros(segments: &[Segment]) -> Vec<Segment> {
    let end = segments
        .iter()
        .rposition(|s| !s.is_zero())
        .map_or(0, |i| i + 1);
    segments[..end].to_vec()
}

fn compare_padded(a: &[Segment], b: &[Segment]) -> Ordering {
    let zero = Segment::zero();
    let len = a.len().max(b.len());

    for i in 0..len {
        let lhs = a.get(i).unwrap_or(&zero);
        let rhs = b.get(i).unwrap_or(&zero);
        match lhs.compare(rhs) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

/// Local labels only matter between equal base versions. No label sorts first;
/// otherwise segments compare position-wise and a shorter label whose segments
/// are a prefix of a longer one sorts first.
fn compare_local(a: &[Segment], b: &[Segment]) -> Ordering {
    for (lhs, rhs) in a.iter().zip(b.iter()) {
        match lhs.compare(rhs) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (&self.pep440, &other.pep440) {
            return a.cmp(b);
        }
        compare_padded(&self.canonical, &other.canonical)
            .then_with(|| compare_local(&self.local, &other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Equal PEP 440 versions share their trimmed segments and local label, so
/// hashing those stays consistent with both orderings.
impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Parses with the [`VersionScheme::Generic`] rules
impl FromStr for Version {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionScheme::Generic.parse(s)
    }
}
