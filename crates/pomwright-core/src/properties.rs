//! `${name}` interpolation against layered property tables.
//!
//! Lookup order for a name: the document's own properties, then each ancestor
//! nearest-first, then the implicit `project.*` properties derived from the
//! document's coordinates. Names that resolve nowhere are left as literal
//! `${name}` text and reported; values that keep producing resolvable
//! references past the pass limit are a self-reference error.

use std::collections::{BTreeMap, BTreeSet};

use pomwright_util::errors::PomwrightError;

use crate::document::Document;

/// Pass limit used when none is configured.
pub const DEFAULT_MAX_PASSES: usize = 10;

/// The names referenced as `${name}` in `input`, in order of appearance.
pub fn references(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    names
}

/// If `input` is exactly one `${name}` expression, the name.
pub fn single_reference(input: &str) -> Option<&str> {
    let inner = input.trim().strip_prefix("${")?.strip_suffix('}')?;
    (!inner.contains("${") && !inner.contains('}')).then_some(inner)
}

/// Replace every `${name}` for which `lookup` has a value, once.
///
/// Returns the substituted text and the names that had no value.
pub fn substitute<'v, L>(input: &str, lookup: L) -> (String, Vec<String>)
where
    L: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(input.len());
    let mut missing = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &after[..end];
        match lookup(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str(&rest[start..start + 2 + end + 1]);
                missing.push(name.to_string());
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    (out, missing)
}

/// `project.*` (and `pom.*`, bare) properties derived from a document's own
/// coordinates.
pub fn implicit_properties(doc: &Document) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    let mut put = |suffix: &str, value: Option<&str>| {
        if let Some(v) = value {
            for prefix in ["project.", "pom.", ""] {
                props.insert(format!("{prefix}{suffix}"), v.to_string());
            }
        }
    };
    put("groupId", doc.effective_group_id());
    put("artifactId", Some(doc.artifact_id.as_str()));
    put("version", doc.effective_version());
    put("packaging", Some(doc.packaging()));
    if let Some(ref parent) = doc.parent {
        props.insert("project.parent.groupId".to_string(), parent.group_id.clone());
        props.insert("project.parent.artifactId".to_string(), parent.artifact_id.clone());
        props.insert("project.parent.version".to_string(), parent.version.clone());
    }
    props
}

/// Fully substituted property values for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedProperties {
    pub values: BTreeMap<String, String>,
    /// Names referenced somewhere but defined nowhere.
    pub unresolved: BTreeSet<String>,
}

impl ResolvedProperties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Substitute `${name}` references in an arbitrary string.
    ///
    /// Values are already fully substituted, so one pass is enough. Unknown
    /// names stay literal and are returned alongside.
    pub fn interpolate(&self, input: &str) -> (String, Vec<String>) {
        substitute(input, |name| self.get(name))
    }

    /// Like [`ResolvedProperties::interpolate`] but discards the unresolved names.
    pub fn expand(&self, input: &str) -> String {
        self.interpolate(input).0
    }
}

/// Substitutes property values until they stabilize.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver {
    max_passes: usize,
}

impl Default for PropertyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PASSES)
    }
}

impl PropertyResolver {
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Resolve `doc`'s properties given its ancestors' tables, nearest first.
    pub fn resolve(
        &self,
        doc: &Document,
        ancestors: &[&BTreeMap<String, String>],
    ) -> Result<ResolvedProperties, PomwrightError> {
        let implicit = implicit_properties(doc);
        let mut layers: Vec<&BTreeMap<String, String>> = Vec::with_capacity(ancestors.len() + 2);
        layers.push(&doc.properties);
        layers.extend_from_slice(ancestors);
        layers.push(&implicit);
        self.resolve_layers(doc.id.as_str(), &layers)
    }

    /// Resolve a stack of property tables where earlier layers shadow later ones.
    pub fn resolve_layers(
        &self,
        document: &str,
        layers: &[&BTreeMap<String, String>],
    ) -> Result<ResolvedProperties, PomwrightError> {
        let mut current: BTreeMap<String, String> = BTreeMap::new();
        for layer in layers.iter().rev() {
            for (k, v) in layer.iter() {
                current.insert(k.clone(), v.clone());
            }
        }

        let mut passes = 0;
        while let Some(pending) = first_resolvable(&current) {
            if passes == self.max_passes {
                return Err(PomwrightError::SelfReferentialProperty {
                    document: document.to_string(),
                    name: pending,
                    passes: self.max_passes,
                });
            }
            passes += 1;
            let next: BTreeMap<String, String> = current
                .iter()
                .map(|(k, v)| {
                    let (value, _) = substitute(v, |name| current.get(name).map(String::as_str));
                    (k.clone(), value)
                })
                .collect();
            current = next;
        }

        let unresolved = current
            .values()
            .flat_map(|v| references(v))
            .filter(|name| !current.contains_key(name))
            .collect();
        tracing::debug!("Resolved {} properties for {document} in {passes} passes", current.len());
        Ok(ResolvedProperties {
            values: current,
            unresolved,
        })
    }
}

/// The first property whose value still references a defined property.
fn first_resolvable(values: &BTreeMap<String, String>) -> Option<String> {
    values
        .iter()
        .find(|(_, v)| references(v).iter().any(|name| values.contains_key(name)))
        .map(|(k, _)| k.clone())
}
