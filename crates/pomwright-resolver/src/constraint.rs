//! Version constraints: parsing, satisfaction and best-candidate selection.
//!
//! Supported syntax, tried in this order:
//!
//! | form                         | meaning                                   |
//! |------------------------------|-------------------------------------------|
//! | `latest.release`, `RELEASE`  | greatest release                          |
//! | `latest.patch`               | greatest release sharing `major.minor` with the current version |
//! | `latest.integration`, `LATEST` | greatest version of any kind (Maven order) |
//! | `${name}`                    | property reference, must be bound first   |
//! | `1.2 - 2`                    | inclusive, zero-filled `[1.2.0, 2.0.0]`   |
//! | `~1.2.3`                     | `[1.2.3, 1.3)`                            |
//! | `^0.2.3`                     | `[0.2.3, 0.3)`                            |
//! | `^0.0.3`                     | exactly `0.0.3`                           |
//! | `[1.0,2.0)`                  | Maven bracket range(s)                    |
//! | `1.2.x`, `1.*`, `*`          | `[1.2, 1.3)`                              |
//! | anything else                | exact version                             |
//!
//! Release ranges compare with [`ReleaseVersion`] ordering; lower bounds
//! keep the precision that was written, upper bounds are exclusive at the
//! next value of the last significant component.

use std::fmt;

use pomwright_util::errors::PomwrightError;

use crate::version::{MavenVersion, ReleaseVersion, VersionRangeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaVersion {
    LatestRelease,
    LatestPatch,
    LatestIntegration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeKind {
    /// Inclusive on both ends.
    Hyphen {
        lower: ReleaseVersion,
        upper: ReleaseVersion,
    },
    /// Leading fixed components; empty means "any release".
    XRange { fixed: Vec<u64> },
    Tilde { base: Vec<u64> },
    /// `base` holds the non-wildcard components that were written.
    Caret { base: Vec<u64> },
    Bracket(VersionRangeSet),
}

/// A half-open or closed interval over [`ReleaseVersion`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInterval {
    pub lower: Option<ReleaseVersion>,
    pub upper: Option<ReleaseVersion>,
    pub upper_inclusive: bool,
}

impl ReleaseInterval {
    pub fn contains(&self, v: &ReleaseVersion) -> bool {
        let above = self.lower.as_ref().map_or(true, |lo| v >= lo);
        let below = self.upper.as_ref().map_or(true, |hi| {
            if self.upper_inclusive {
                v <= hi
            } else {
                v < hi
            }
        });
        above && below
    }
}

impl RangeKind {
    /// The release interval for non-bracket kinds.
    pub fn interval(&self) -> Option<ReleaseInterval> {
        let half_open = |lower: &[u64], upper: Vec<u64>| ReleaseInterval {
            lower: Some(ReleaseVersion::new(lower.to_vec())),
            upper: Some(ReleaseVersion::new(upper)),
            upper_inclusive: false,
        };
        match self {
            RangeKind::Hyphen { lower, upper } => Some(ReleaseInterval {
                lower: Some(lower.clone()),
                upper: Some(upper.clone()),
                upper_inclusive: true,
            }),
            RangeKind::XRange { fixed } if fixed.is_empty() => Some(ReleaseInterval {
                lower: None,
                upper: None,
                upper_inclusive: false,
            }),
            RangeKind::XRange { fixed } => Some(half_open(fixed, bump(fixed, fixed.len() - 1))),
            RangeKind::Tilde { base } => {
                let idx = if base.len() == 1 { 0 } else { 1 };
                Some(half_open(base, bump(base, idx)))
            }
            RangeKind::Caret { base } => {
                let idx = base
                    .iter()
                    .position(|&p| p != 0)
                    .unwrap_or(base.len() - 1);
                // `^0.0.3` pins the exact version.
                if base.len() >= 3 && idx == base.len() - 1 {
                    return Some(ReleaseInterval {
                        lower: Some(ReleaseVersion::new(base.clone())),
                        upper: Some(ReleaseVersion::new(base.clone())),
                        upper_inclusive: true,
                    });
                }
                Some(half_open(base, bump(base, idx)))
            }
            RangeKind::Bracket(_) => None,
        }
    }
}

/// `parts[..=idx]` with the component at `idx` incremented.
fn bump(parts: &[u64], idx: usize) -> Vec<u64> {
    let mut next = parts[..=idx].to_vec();
    next[idx] = next[idx].saturating_add(1);
    next
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    Exact(String),
    PropertyRef(String),
    Range(RangeKind),
    Meta(MetaVersion),
}

/// A parsed version request plus its optional suffix filter and, for
/// `latest.patch`, the currently declared version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    spec: String,
    kind: ConstraintKind,
    suffix: Option<String>,
    current: Option<String>,
}

impl VersionConstraint {
    pub fn parse(spec: &str) -> Result<Self, PomwrightError> {
        let s = spec.trim();
        let invalid = |reason: &str| PomwrightError::InvalidConstraint {
            spec: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty version"));
        }

        let kind = match s {
            "latest.release" | "RELEASE" => ConstraintKind::Meta(MetaVersion::LatestRelease),
            "latest.patch" => ConstraintKind::Meta(MetaVersion::LatestPatch),
            "latest.integration" | "LATEST" => {
                ConstraintKind::Meta(MetaVersion::LatestIntegration)
            }
            _ => {
                if let Some(name) = pomwright_core::properties::single_reference(s) {
                    ConstraintKind::PropertyRef(name.to_string())
                } else if let Some((lo, hi)) = s.split_once(" - ") {
                    let lower = numeric(lo.trim()).ok_or_else(|| invalid("lower bound must be numeric"))?;
                    let upper = numeric(hi.trim()).ok_or_else(|| invalid("upper bound must be numeric"))?;
                    ConstraintKind::Range(RangeKind::Hyphen {
                        lower: ReleaseVersion::new(lower).zero_filled(3),
                        upper: ReleaseVersion::new(upper).zero_filled(3),
                    })
                } else if let Some(rest) = s.strip_prefix('~') {
                    let base = numeric(rest.trim())
                        .ok_or_else(|| invalid("tilde ranges take a numeric version"))?;
                    ConstraintKind::Range(RangeKind::Tilde { base })
                } else if let Some(rest) = s.strip_prefix('^') {
                    let base = wildcard_prefix(rest.trim()).map_err(|r| invalid(&r))?;
                    if base.is_empty() {
                        return Err(invalid("caret ranges need at least one fixed component"));
                    }
                    ConstraintKind::Range(RangeKind::Caret { base })
                } else if s.starts_with('[') || s.starts_with('(') {
                    ConstraintKind::Range(RangeKind::Bracket(VersionRangeSet::parse(s)?))
                } else if s.split('.').any(is_wildcard) {
                    let fixed = wildcard_prefix(s).map_err(|r| invalid(&r))?;
                    ConstraintKind::Range(RangeKind::XRange { fixed })
                } else {
                    ConstraintKind::Exact(s.to_string())
                }
            }
        };

        Ok(Self {
            spec: s.to_string(),
            kind,
            suffix: None,
            current: None,
        })
    }

    /// Only candidates ending in `suffix` are eligible; it is stripped before comparison.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// The currently declared version, needed by `latest.patch`.
    pub fn with_current(mut self, current: impl Into<String>) -> Self {
        self.current = Some(current.into());
        self
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Exact versions need no candidate list.
    pub fn needs_candidates(&self) -> bool {
        !matches!(self.kind, ConstraintKind::Exact(_))
    }

    /// Replace a property reference with the constraint its value denotes.
    /// Other kinds and unknown names are returned unchanged.
    pub fn bind<'v>(&self, lookup: impl Fn(&str) -> Option<&'v str>) -> Result<Self, PomwrightError> {
        match &self.kind {
            ConstraintKind::PropertyRef(name) => match lookup(name) {
                Some(value) => {
                    let mut bound = Self::parse(value)?;
                    bound.suffix = self.suffix.clone();
                    bound.current = self.current.clone();
                    Ok(bound)
                }
                None => Ok(self.clone()),
            },
            _ => Ok(self.clone()),
        }
    }

    fn release_of(&self, candidate: &str) -> Option<ReleaseVersion> {
        let stripped = match &self.suffix {
            Some(suffix) => candidate.strip_suffix(suffix.as_str())?,
            None => candidate,
        };
        ReleaseVersion::parse(stripped)
    }

    fn has_suffix(&self, candidate: &str) -> bool {
        self.suffix
            .as_deref()
            .map_or(true, |suffix| candidate.ends_with(suffix))
    }

    pub fn is_satisfied_by(&self, candidate: &str) -> bool {
        match &self.kind {
            ConstraintKind::Exact(v) => v == candidate,
            ConstraintKind::PropertyRef(_) => false,
            ConstraintKind::Range(RangeKind::Bracket(set)) => {
                self.has_suffix(candidate) && set.contains(&MavenVersion::parse(candidate))
            }
            ConstraintKind::Range(range) => match (range.interval(), self.release_of(candidate)) {
                (Some(interval), Some(v)) => interval.contains(&v),
                _ => false,
            },
            ConstraintKind::Meta(MetaVersion::LatestRelease) => self.release_of(candidate).is_some(),
            ConstraintKind::Meta(MetaVersion::LatestPatch) => {
                let Some(current) = self.current.as_deref().and_then(|c| self.release_of(c).or_else(|| ReleaseVersion::parse(c))) else {
                    return false;
                };
                match self.release_of(candidate) {
                    Some(v) if current.parts().len() >= 2 && v.parts().len() >= 2 => {
                        v.parts()[..2] == current.parts()[..2]
                    }
                    _ => false,
                }
            }
            ConstraintKind::Meta(MetaVersion::LatestIntegration) => self.has_suffix(candidate),
        }
    }

    /// The greatest satisfying candidate.
    pub fn select_best<'c, I>(&self, candidates: I) -> Option<&'c str>
    where
        I: IntoIterator<Item = &'c str>,
    {
        let eligible = candidates.into_iter().filter(|c| self.is_satisfied_by(c));
        if self.uses_maven_order() {
            eligible.max_by(|a, b| MavenVersion::parse(a).cmp(&MavenVersion::parse(b)))
        } else {
            eligible.max_by(|a, b| self.release_of(a).cmp(&self.release_of(b)))
        }
    }

    fn uses_maven_order(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Range(RangeKind::Bracket(_))
                | ConstraintKind::Meta(MetaVersion::LatestIntegration)
                | ConstraintKind::Exact(_)
        )
    }

    /// Resolve to a concrete version for `coordinate`.
    ///
    /// Exact versions resolve to themselves; every other kind must match a
    /// member of `candidates`.
    pub fn resolve(&self, coordinate: &str, candidates: &[String]) -> Result<String, PomwrightError> {
        if let ConstraintKind::Exact(v) = &self.kind {
            return Ok(v.clone());
        }
        self.select_best(candidates.iter().map(String::as_str))
            .map(str::to_string)
            .ok_or_else(|| PomwrightError::UnsatisfiableConstraint {
                coordinate: coordinate.to_string(),
                constraint: self.to_string(),
                candidates: candidates.len(),
            })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)?;
        if let Some(ref suffix) = self.suffix {
            write!(f, " (suffix {suffix})")?;
        }
        Ok(())
    }
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

fn numeric(s: &str) -> Option<Vec<u64>> {
    ReleaseVersion::parse(s).map(|v| v.parts().to_vec())
}

/// Leading numeric components of a dotted version whose tail may be wildcards.
fn wildcard_prefix(s: &str) -> Result<Vec<u64>, String> {
    let mut fixed = Vec::new();
    let mut in_wildcards = false;
    for part in s.split('.') {
        if is_wildcard(part) {
            in_wildcards = true;
        } else if in_wildcards {
            return Err(format!("`{part}` follows a wildcard; wildcards must be trailing"));
        } else {
            let n = ReleaseVersion::parse(part)
                .and_then(|v| v.parts().first().copied())
                .ok_or_else(|| format!("`{part}` is not numeric"))?;
            fixed.push(n);
        }
    }
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(spec: &str) -> VersionConstraint {
        VersionConstraint::parse(spec).unwrap()
    }

    #[test]
    fn parse_kinds() {
        assert!(matches!(c("1.2.3").kind(), ConstraintKind::Exact(_)));
        assert!(matches!(c("${v}").kind(), ConstraintKind::PropertyRef(n) if n == "v"));
        assert!(matches!(c("latest.patch").kind(), ConstraintKind::Meta(MetaVersion::LatestPatch)));
        assert!(matches!(c("1.x").kind(), ConstraintKind::Range(RangeKind::XRange { fixed }) if fixed == &vec![1]));
        assert!(matches!(c("*").kind(), ConstraintKind::Range(RangeKind::XRange { fixed }) if fixed.is_empty()));
        assert!(matches!(c("[1,2)").kind(), ConstraintKind::Range(RangeKind::Bracket(_))));
    }

    #[test]
    fn rejects_malformed() {
        assert!(VersionConstraint::parse("1.x.3").is_err());
        assert!(VersionConstraint::parse("a.x").is_err());
        assert!(VersionConstraint::parse("~1.x").is_err());
        assert!(VersionConstraint::parse("^x").is_err());
        assert!(VersionConstraint::parse("1 - b").is_err());
        assert!(VersionConstraint::parse("  ").is_err());
    }

    #[test]
    fn hyphen_zero_fills() {
        let r = c("1.2 - 2");
        assert!(r.is_satisfied_by("1.2.0"));
        assert!(r.is_satisfied_by("2.0.0"));
        assert!(!r.is_satisfied_by("2.0.1"));
        assert!(!r.is_satisfied_by("1.1.9"));
    }

    #[test]
    fn xrange_bounds() {
        let r = c("1.2.X");
        assert!(r.is_satisfied_by("1.2.0"));
        assert!(r.is_satisfied_by("1.2.99"));
        assert!(!r.is_satisfied_by("1.3.0"));
        assert!(!r.is_satisfied_by("1.2.0-SNAPSHOT"));
        assert!(c("*").is_satisfied_by("0.0.1"));
    }

    #[test]
    fn tilde_bounds() {
        assert!(c("~1.2.3").is_satisfied_by("1.2.9"));
        assert!(!c("~1.2.3").is_satisfied_by("1.3.0"));
        assert!(!c("~1.2.3").is_satisfied_by("1.2.2"));
        assert!(c("~1").is_satisfied_by("1.9.0"));
        assert!(!c("~1").is_satisfied_by("2.0.0"));
    }

    #[test]
    fn caret_bounds() {
        assert!(c("^1.2.3").is_satisfied_by("1.9.0"));
        assert!(!c("^1.2.3").is_satisfied_by("2.0.0"));
        assert!(c("^0.2.3").is_satisfied_by("0.2.9"));
        assert!(!c("^0.2.3").is_satisfied_by("0.3.0"));
        assert!(c("^0.0.3").is_satisfied_by("0.0.3"));
        assert!(!c("^0.0.3").is_satisfied_by("0.0.4"));
        assert!(!c("^0.0.3").is_satisfied_by("0.0.3.1"));
        assert!(c("^0.0.x").is_satisfied_by("0.0.9"));
        assert!(!c("^0.0.x").is_satisfied_by("0.1.0"));
        assert!(c("^1.x").is_satisfied_by("1.5.0"));
    }

    #[test]
    fn suffix_filter() {
        let r = c("32.x").with_suffix("-jre");
        let candidates = ["31.1-jre", "32.0.0-android", "32.1.3-jre", "32.1.2-jre"];
        assert_eq!(r.select_best(candidates), Some("32.1.3-jre"));
        assert!(!c("32.x").is_satisfied_by("32.1.3-jre"));
    }

    #[test]
    fn latest_patch_needs_current() {
        let candidates = ["2.16.0", "2.17.0", "2.17.2", "2.18.0"];
        assert_eq!(c("latest.patch").select_best(candidates), None);
        let r = c("latest.patch").with_current("2.17.0");
        assert_eq!(r.select_best(candidates), Some("2.17.2"));
    }

    #[test]
    fn latest_integration_includes_prereleases() {
        let candidates = ["1.0", "1.1-rc1", "1.1-SNAPSHOT", "1.0.1"];
        assert_eq!(c("latest.integration").select_best(candidates), Some("1.1-rc1"));
        assert_eq!(c("latest.release").select_best(candidates), Some("1.0.1"));
    }

    #[test]
    fn unbound_property_never_satisfied() {
        let r = c("${guava.version}");
        assert!(!r.is_satisfied_by("1.0"));
        let bound = r.bind(|n| (n == "guava.version").then_some("32.x")).unwrap();
        assert!(bound.is_satisfied_by("32.1.0"));
    }

    #[test]
    fn resolve_reports_unsatisfiable() {
        let err = c("^3.0")
            .resolve("g:a", &["1.0".to_string(), "2.0".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            PomwrightError::UnsatisfiableConstraint { candidates: 2, .. }
        ));
        assert_eq!(c("9.9").resolve("g:a", &[]).unwrap(), "9.9");
    }
}
