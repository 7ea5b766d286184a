//! Version orderings.
//!
//! Two orderings are used:
//! - [`ReleaseVersion`]: numeric components only, compared part by part; a
//!   shorter version with an equal prefix sorts first (`1.1 < 1.1.1`). Any
//!   non-numeric component makes the string unusable for release ranges.
//! - [`MavenVersion`]: Maven's qualifier-aware ordering, used for bracket
//!   ranges and `latest.integration`. Known qualifiers order as
//!   `alpha < beta < milestone < rc < snapshot < (release) < sp`, unknown
//!   qualifiers sort after them lexically, and trailing zeros are ignored.

use std::cmp::Ordering;
use std::fmt;

use pomwright_util::errors::PomwrightError;

/// A purely numeric dotted version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReleaseVersion(Vec<u64>);

impl ReleaseVersion {
    pub fn new(parts: Vec<u64>) -> Self {
        Self(parts)
    }

    /// `None` unless every `.`-separated component is a non-empty number.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        s.split('.')
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    p.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<u64>>>()
            .map(Self)
    }

    pub fn parts(&self) -> &[u64] {
        &self.0
    }

    /// Pad with zeros up to `len` components.
    pub fn zero_filled(mut self, len: usize) -> Self {
        while self.0.len() < len {
            self.0.push(0);
        }
        self
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// A Maven version with qualifier-aware ordering.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    original: String,
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier(Qualifier),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Qualifier {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.trim().to_string(),
            items: tokenize(version.trim()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }

    /// Neither a snapshot nor carrying a pre-release qualifier.
    pub fn is_release(&self) -> bool {
        !self.items.iter().any(|i| {
            matches!(i, Item::Qualifier(q) if *q < Qualifier::Release)
        })
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        (0..len)
            .map(|i| compare_items(self.items.get(i), other.items.get(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Split on `.`, `-` and digit/letter transitions (`1.0rc1` -> `1 0 rc 1`).
fn tokenize(version: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut token = String::new();
    let mut digits = false;
    for ch in version.chars() {
        if ch == '.' || ch == '-' || ch == '_' {
            if !token.is_empty() {
                items.push(classify(&token));
                token.clear();
            }
            continue;
        }
        if !token.is_empty() && ch.is_ascii_digit() != digits {
            items.push(classify(&token));
            token.clear();
        }
        digits = ch.is_ascii_digit();
        token.push(ch);
    }
    if !token.is_empty() {
        items.push(classify(&token));
    }
    items
}

fn classify(token: &str) -> Item {
    if let Ok(n) = token.parse::<u64>() {
        return Item::Number(n);
    }
    let q = match token.to_ascii_lowercase().as_str() {
        "alpha" | "a" => Qualifier::Alpha,
        "beta" | "b" => Qualifier::Beta,
        "milestone" | "m" => Qualifier::Milestone,
        "rc" | "cr" => Qualifier::Rc,
        "snapshot" => Qualifier::Snapshot,
        "ga" | "final" | "release" => Qualifier::Release,
        "sp" => Qualifier::Sp,
        other => return Item::Text(other.to_string()),
    };
    Item::Qualifier(q)
}

/// A missing item behaves like `0` or the release qualifier.
fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(a), None) => compare_to_missing(a),
        (None, Some(b)) => compare_to_missing(b).reverse(),
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_to_missing(item: &Item) -> Ordering {
    match item {
        Item::Number(n) => n.cmp(&0),
        Item::Qualifier(q) => q.cmp(&Qualifier::Release),
        Item::Text(_) => Ordering::Greater,
    }
}

fn compare_present(a: &Item, b: &Item) -> Ordering {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => x.cmp(y),
        (Item::Qualifier(x), Item::Qualifier(y)) => x.cmp(y),
        (Item::Text(x), Item::Text(y)) => x.cmp(y),
        (Item::Number(_), _) => Ordering::Greater,
        (_, Item::Number(_)) => Ordering::Less,
        (Item::Qualifier(_), Item::Text(_)) => Ordering::Less,
        (Item::Text(_), Item::Qualifier(_)) => Ordering::Greater,
    }
}

/// One end of a bracket range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

/// A single Maven interval: `[1.0,2.0)`, `(,2.0]`, `[1.5]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    pub fn contains(&self, version: &MavenVersion) -> bool {
        let above = self.lower.as_ref().map_or(true, |b| match version.cmp(&b.version) {
            Ordering::Greater => true,
            Ordering::Equal => b.inclusive,
            Ordering::Less => false,
        });
        let below = self.upper.as_ref().map_or(true, |b| match version.cmp(&b.version) {
            Ordering::Less => true,
            Ordering::Equal => b.inclusive,
            Ordering::Greater => false,
        });
        above && below
    }

    fn parse_one(spec: &str, whole: &str) -> Result<Self, PomwrightError> {
        let invalid = |reason: &str| PomwrightError::InvalidConstraint {
            spec: whole.to_string(),
            reason: reason.to_string(),
        };
        let open_inclusive = match spec.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid("a range must start with `[` or `(`")),
        };
        let close_inclusive = match spec.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid("a range must end with `]` or `)`")),
        };
        if spec.len() < 2 {
            return Err(invalid("empty range"));
        }
        let inner = spec[1..spec.len() - 1].trim();
        let bound = |v: &str, inclusive: bool| {
            (!v.is_empty()).then(|| Bound {
                version: MavenVersion::parse(v),
                inclusive,
            })
        };
        match inner.split_once(',') {
            Some((lo, hi)) => {
                if hi.contains(',') {
                    return Err(invalid("too many commas in range"));
                }
                Ok(Self {
                    lower: bound(lo.trim(), open_inclusive),
                    upper: bound(hi.trim(), close_inclusive),
                })
            }
            None => {
                if !(open_inclusive && close_inclusive) || inner.is_empty() {
                    return Err(invalid("a single-version range must be written `[v]`"));
                }
                Ok(Self {
                    lower: bound(inner, true),
                    upper: bound(inner, true),
                })
            }
        }
    }
}

/// A union of Maven intervals: `(,1.0],[1.2,)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRangeSet {
    pub ranges: Vec<VersionRange>,
}

impl VersionRangeSet {
    pub fn parse(spec: &str) -> Result<Self, PomwrightError> {
        let s = spec.trim();
        let mut ranges = Vec::new();
        let mut start = None;
        for (i, ch) in s.char_indices() {
            match ch {
                '[' | '(' if start.is_none() => start = Some(i),
                ']' | ')' => {
                    if let Some(begin) = start.take() {
                        ranges.push(VersionRange::parse_one(&s[begin..=i], s)?);
                    }
                }
                ',' | ' ' if start.is_none() => {}
                _ if start.is_none() => {
                    return Err(PomwrightError::InvalidConstraint {
                        spec: s.to_string(),
                        reason: format!("unexpected `{ch}` between ranges"),
                    })
                }
                _ => {}
            }
        }
        if start.is_some() || ranges.is_empty() {
            return Err(PomwrightError::InvalidConstraint {
                spec: s.to_string(),
                reason: "unterminated range".to_string(),
            });
        }
        Ok(Self { ranges })
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        self.ranges.iter().any(|r| r.contains(version))
    }
}
