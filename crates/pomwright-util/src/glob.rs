//! Glob patterns over Maven coordinates (`com.fasterxml.jackson*`, `org.slf4j:*`).

use std::fmt;

use globset::{Glob, GlobMatcher};

use crate::errors::PomwrightError;

/// A compiled glob matched against a single coordinate component.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    matcher: GlobMatcher,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, PomwrightError> {
        let glob = Glob::new(pattern).map_err(|e| PomwrightError::Config {
            message: format!("Invalid glob pattern `{pattern}`: {e}"),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A `group:artifact` pattern; a missing artifact part matches every artifact.
#[derive(Debug, Clone)]
pub struct CoordinatePattern {
    pub group: GlobPattern,
    pub artifact: GlobPattern,
}

impl CoordinatePattern {
    pub fn parse(pattern: &str) -> Result<Self, PomwrightError> {
        let (group, artifact) = match pattern.split_once(':') {
            Some((g, a)) => (g.trim(), a.trim()),
            None => (pattern.trim(), "*"),
        };
        if group.is_empty() || artifact.is_empty() {
            return Err(PomwrightError::Config {
                message: format!("Invalid coordinate pattern `{pattern}`, expected group:artifact"),
            });
        }
        Ok(Self {
            group: GlobPattern::new(group)?,
            artifact: GlobPattern::new(artifact)?,
        })
    }

    pub fn new(group: &str, artifact: &str) -> Result<Self, PomwrightError> {
        Ok(Self {
            group: GlobPattern::new(group)?,
            artifact: GlobPattern::new(artifact)?,
        })
    }

    pub fn is_match(&self, group_id: &str, artifact_id: &str) -> bool {
        self.group.is_match(group_id) && self.artifact.is_match(artifact_id)
    }
}

impl fmt::Display for CoordinatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_prefix_glob() {
        let p = GlobPattern::new("com.fasterxml.jackson*").unwrap();
        assert!(p.is_match("com.fasterxml.jackson.core"));
        assert!(p.is_match("com.fasterxml.jackson.module"));
        assert!(!p.is_match("com.google.guava"));
    }

    #[test]
    fn coordinate_pattern_defaults_artifact() {
        let p = CoordinatePattern::parse("org.slf4j").unwrap();
        assert!(p.is_match("org.slf4j", "slf4j-api"));
        assert!(!p.is_match("org.apache", "slf4j-api"));
    }

    #[test]
    fn coordinate_pattern_rejects_empty_group() {
        assert!(CoordinatePattern::parse(":lib").is_err());
    }
}
