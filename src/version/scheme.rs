//! Per-ecosystem version schemes
//!
//! Each ecosystem selects exactly one scheme. All schemes produce the same
//! [`Version`] representation, so ordering is shared; they differ in which
//! strings are accepted and how they are normalized first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::LazyLock;

use super::{Segment, Version};
use crate::error::PolicyError;

/// RubyGems-style version grammar
static GENERIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9a-zA-Z]+)*(-[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*)?$")
        .expect("valid generic version regex")
});

/// PEP 440 text as normalized by `pep440_rs`
static PEP440_NORMALIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        (?:[0-9]+!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:(?P<pre_l>a|b|rc)(?P<pre_n>[0-9]+))?
        (?:\.post(?P<post>[0-9]+))?
        (?:\.dev(?P<dev>[0-9]+))?
        (?:\+(?P<local>[a-zA-Z0-9]+(?:[-_.][a-zA-Z0-9]+)*))?
        $",
    )
    .expect("valid PEP 440 regex")
});

/// Sorts below every alphabetic pre-release label, so `1.0.dev1 < 1.0a1`
const DEV_MARKER: &str = "_dev";

/// How version strings are parsed for an ecosystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionScheme {
    /// RubyGems-style: `1.2.3`, `1.2.3.4`, `1.0.0-beta.1`, `2024.01.15`
    #[default]
    Generic,
    /// Strict semantic versioning with optional `v` prefix and ignored build metadata
    Semver,
    /// PEP 440 with pre/post/dev releases and `+local` labels
    Pep440,
    /// Tag-style versions that may carry a leading `v` (`v1.2.3`)
    Tag,
}

impl VersionScheme {
    /// Parse a version string
    pub fn parse(&self, raw: &str) -> Result<Version, PolicyError> {
        let trimmed = raw.trim();
        let parsed = match self {
            VersionScheme::Generic => parse_generic(trimmed, trimmed),
            VersionScheme::Semver => parse_semver(trimmed),
            VersionScheme::Pep440 => parse_pep440(trimmed, trimmed),
            VersionScheme::Tag => parse_generic(trimmed, strip_v(trimmed)),
        };
        parsed.ok_or_else(|| PolicyError::invalid_version(raw))
    }

    /// Parse a bound inside a range string
    ///
    /// Ranges compiled from update types use generic notation (`>= 13.a`),
    /// which strict semver rejects, so that scheme falls back to it. Under
    /// PEP 440 a trailing `.a` means the first dev release of that line.
    pub fn parse_bound(&self, raw: &str) -> Result<Version, PolicyError> {
        match self {
            VersionScheme::Semver => self
                .parse(raw)
                .or_else(|_| VersionScheme::Tag.parse(raw))
                .map_err(|_| PolicyError::invalid_version(raw)),
            VersionScheme::Pep440 => {
                let trimmed = raw.trim();
                let parsed = match trimmed.strip_suffix(".a") {
                    Some(release) => parse_pep440(trimmed, &format!("{}.dev0", release)),
                    None => parse_pep440(trimmed, trimmed),
                };
                match parsed {
                    Some(version) => Ok(version),
                    None => VersionScheme::Generic.parse(raw),
                }
            }
            _ => self.parse(raw),
        }
    }

    /// Returns true if the string is a valid version for this scheme
    pub fn is_valid(&self, raw: &str) -> bool {
        self.parse(raw).is_ok()
    }

    /// Compare two version strings
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering, PolicyError> {
        Ok(self.parse(a)?.cmp(&self.parse(b)?))
    }

    /// Parse and sort version strings ascending, skipping invalid ones
    pub fn sort<'a>(&self, raws: impl IntoIterator<Item = &'a str>) -> Vec<Version> {
        let mut versions: Vec<Version> = raws
            .into_iter()
            .filter_map(|raw| self.parse(raw).ok())
            .collect();
        versions.sort();
        versions
    }
}

fn strip_v(s: &str) -> &str {
    s.strip_prefix(['v', 'V']).unwrap_or(s)
}

fn parse_generic(raw: &str, body: &str) -> Option<Version> {
    if !GENERIC_PATTERN.is_match(body) {
        return None;
    }
    let segments = scan_segments(&body.replace('-', ".pre."))?;
    Some(Version::from_parts(raw, body, segments, Vec::new()))
}

/// Split into runs of digits and runs of letters; anything else separates
fn scan_segments(s: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(d);
                chars.next();
            }
            segments.push(Segment::Number(digits.parse().ok()?));
        } else if c.is_ascii_alphabetic() {
            let mut letters = String::new();
            while let Some(&l) = chars.peek().filter(|l| l.is_ascii_alphabetic()) {
                letters.push(l);
                chars.next();
            }
            segments.push(Segment::Text(letters));
        } else {
            chars.next();
        }
    }

    Some(segments)
}

fn parse_semver(raw: &str) -> Option<Version> {
    let body = raw.strip_prefix('=').map(str::trim_start).unwrap_or(raw);
    let body = strip_v(body);
    let (base, build) = match body.split_once('+') {
        Some((base, build)) => (base, Some(build)),
        None => (body, None),
    };

    let mut padded = pad_core(base);
    if let Some(build) = build {
        padded.push('+');
        padded.push_str(build);
    }
    semver::Version::parse(&padded).ok()?;

    let segments = scan_segments(&base.replace('-', ".pre."))?;
    Some(Version::from_parts(raw, base, segments, Vec::new()))
}

/// Pad `1` or `1.2` (with optional pre-release) to three core components
fn pad_core(version: &str) -> String {
    let (core, pre) = match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    };
    let mut padded = match core.split('.').count() {
        1 => format!("{}.0.0", core),
        2 => format!("{}.0", core),
        _ => core.to_string(),
    };
    if let Some(pre) = pre {
        padded.push('-');
        padded.push_str(pre);
    }
    padded
}

/// Parse `text` with `pep440_rs` and lay its normalized form out as segments
///
/// Segments are release, pre-release, post and dev in that order, which keeps
/// comparisons against non-PEP 440 bounds close to pip's ordering.
fn parse_pep440(raw: &str, text: &str) -> Option<Version> {
    let parsed = pep440_rs::Version::from_str(text).ok()?;
    let normalized = parsed.to_string();
    let caps = PEP440_NORMALIZED.captures(&normalized)?;
    let number = |name: &str| caps.name(name)?.as_str().parse::<u64>().ok();

    let release = caps["release"]
        .split('.')
        .map(|n| n.parse().ok())
        .collect::<Option<Vec<u64>>>()?;
    let mut segments: Vec<Segment> = release.iter().copied().map(Segment::Number).collect();

    if let Some(label) = caps.name("pre_l") {
        segments.push(Segment::Text(label.as_str().to_string()));
        segments.push(Segment::Number(number("pre_n")?));
    }

    if caps.name("post").is_some() {
        if caps.name("pre_l").is_none() {
            // After the release, before the next patch
            let end = release.iter().rposition(|n| *n != 0).map_or(1, |i| i + 1);
            segments.truncate(end);
            segments.resize(end.max(3), Segment::Number(0));
        }
        segments.push(Segment::Number(number("post")?));
    }

    if caps.name("dev").is_some() {
        segments.push(Segment::Text(DEV_MARKER.to_string()));
        segments.push(Segment::Number(number("dev")?));
    }

    let local = caps
        .name("local")
        .map(|local| {
            local
                .as_str()
                .split(['.', '-', '_'])
                .map(|part| {
                    if part.bytes().all(|b| b.is_ascii_digit()) {
                        part.parse().ok().map(Segment::Number)
                    } else {
                        Some(Segment::Text(part.to_ascii_lowercase()))
                    }
                })
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or(Some(Vec::new()))?;

    let base = normalized.split_once('+').map_or(normalized.as_str(), |(public, _)| public);

    Some(Version::from_parts(raw, base, segments, local).with_pep440(parsed, release))
}
