use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;

use pomwright_core::document::{Document, DocumentId};
use pomwright_core::properties;
use pomwright_resolver::constraint::{ConstraintKind, VersionConstraint};
use pomwright_resolver::version::MavenVersion;
use pomwright_util::errors::PomwrightError;
use pomwright_util::glob::CoordinatePattern;

use super::validate_constraint;
use crate::recipe::{require, PreparedRecipe, Recipe, RecipeContext, Transform};

/// Raise the version of matching dependencies and managed dependencies.
///
/// Literal versions are edited in place. A version written as `${name}` is
/// upgraded by editing the property where it is defined, which may be an
/// ancestor in the working set; properties defined outside the working set
/// are left alone. Versions are only ever raised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpgradeDependencyVersion {
    pub group_id: String,
    pub artifact_id: String,
    pub new_version: String,
    #[serde(default)]
    pub version_pattern: Option<String>,
}

impl UpgradeDependencyVersion {
    pub fn new(group_id: &str, artifact_id: &str, new_version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            new_version: new_version.to_string(),
            version_pattern: None,
        }
    }

    pub fn with_version_pattern(mut self, suffix: &str) -> Self {
        self.version_pattern = Some(suffix.to_string());
        self
    }

    fn constraint(&self, current: &str) -> Result<VersionConstraint, PomwrightError> {
        let mut constraint = VersionConstraint::parse(&self.new_version)?.with_current(current);
        if let Some(ref suffix) = self.version_pattern {
            constraint = constraint.with_suffix(suffix.as_str());
        }
        Ok(constraint)
    }
}

impl Recipe for UpgradeDependencyVersion {
    fn name(&self) -> &'static str {
        "upgrade-dependency-version"
    }

    fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();
        require(&mut defects, "group-id", &self.group_id);
        require(&mut defects, "artifact-id", &self.artifact_id);
        require(&mut defects, "new-version", &self.new_version);
        validate_constraint(&mut defects, "new-version", &self.new_version);
        if let Ok(c) = VersionConstraint::parse(&self.new_version) {
            if matches!(c.kind(), ConstraintKind::PropertyRef(_)) {
                defects.push("`new-version` must be a version or constraint, not a property".to_string());
            }
        }
        if let Err(e) = CoordinatePattern::new(&self.group_id, &self.artifact_id) {
            defects.push(e.to_string());
        }
        defects
    }

    fn prepare(&self, ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        let pattern = CoordinatePattern::new(&self.group_id, &self.artifact_id)?;
        let mut plans: HashMap<DocumentId, Plan> = HashMap::new();
        let mut errors: Vec<(DocumentId, String)> = Vec::new();
        let mut published: HashMap<(String, String), Vec<String>> = HashMap::new();

        for doc in ctx.working_set.iter() {
            let declared: Vec<(String, String, String)> = doc
                .dependencies
                .iter()
                .map(|d| (&d.group_id, &d.artifact_id, &d.version))
                .chain(
                    doc.dependency_management
                        .iter()
                        .map(|m| (&m.group_id, &m.artifact_id, &m.version)),
                )
                .filter(|(g, a, _)| pattern.is_match(g, a))
                .filter_map(|(g, a, v)| Some((g.clone(), a.clone(), v.clone()?)))
                .collect();
            if declared.is_empty() {
                continue;
            }
            let model = match ctx.model(doc) {
                Ok(model) => model,
                Err(e) => {
                    errors.push((doc.id.clone(), e.to_string()));
                    continue;
                }
            };

            for (group_id, artifact_id, raw) in declared {
                let current = model.properties.expand(&raw);
                if !properties::references(&current).is_empty() {
                    tracing::debug!("{}: {group_id}:{artifact_id} version `{raw}` does not resolve", doc.id);
                    continue;
                }
                let key = (group_id.clone(), artifact_id.clone());
                if !published.contains_key(&key) {
                    match ctx.versions(&group_id, &artifact_id) {
                        Ok(versions) => {
                            published.insert(key.clone(), versions);
                        }
                        Err(e) => {
                            errors.push((doc.id.clone(), format!("{group_id}:{artifact_id}: {e}")));
                            continue;
                        }
                    }
                }
                let versions = &published[&key];
                let target = match self
                    .constraint(&current)
                    .and_then(|c| c.resolve(&format!("{group_id}:{artifact_id}"), versions))
                {
                    Ok(target) => target,
                    Err(e) => {
                        errors.push((doc.id.clone(), e.to_string()));
                        continue;
                    }
                };
                if MavenVersion::parse(&target) <= MavenVersion::parse(&current) {
                    continue;
                }

                match properties::single_reference(&raw) {
                    Some(name) => {
                        let owner = if doc.properties.contains_key(name) {
                            Some(doc.id.clone())
                        } else {
                            model
                                .in_set_ancestors()
                                .find(|a| a.properties.contains_key(name))
                                .map(|a| a.id.clone())
                        };
                        match owner {
                            Some(owner) => plans.entry(owner).or_default().raise_property(name, target),
                            None => tracing::debug!(
                                "{}: property `{name}` is defined outside the working set",
                                doc.id
                            ),
                        }
                    }
                    None if raw.contains("${") => {
                        tracing::debug!("{}: composite version `{raw}` left alone", doc.id);
                    }
                    None => plans.entry(doc.id.clone()).or_default().literals.push(Bump {
                        group_id,
                        artifact_id,
                        from: raw,
                        to: target,
                    }),
                }
            }
        }

        Ok(Box::new(PreparedUpgrade { plans, errors }))
    }
}

#[derive(Debug, Default)]
struct Plan {
    literals: Vec<Bump>,
    properties: BTreeMap<String, String>,
}

impl Plan {
    /// Several declarations may share a property; the highest target wins.
    fn raise_property(&mut self, name: &str, target: String) {
        match self.properties.get_mut(name) {
            Some(existing) if MavenVersion::parse(existing) >= MavenVersion::parse(&target) => {}
            Some(existing) => *existing = target,
            None => {
                self.properties.insert(name.to_string(), target);
            }
        }
    }

    fn bump_for(&self, group_id: &str, artifact_id: &str, version: Option<&str>) -> Option<&str> {
        self.literals
            .iter()
            .find(|b| b.group_id == group_id && b.artifact_id == artifact_id && Some(b.from.as_str()) == version)
            .map(|b| b.to.as_str())
    }
}

#[derive(Debug)]
struct Bump {
    group_id: String,
    artifact_id: String,
    from: String,
    to: String,
}

struct PreparedUpgrade {
    plans: HashMap<DocumentId, Plan>,
    /// Declarations whose target could not be determined.
    errors: Vec<(DocumentId, String)>,
}

impl PreparedRecipe for PreparedUpgrade {
    fn failures(&self) -> Vec<(DocumentId, String)> {
        self.errors.clone()
    }

    fn transform(&self, doc: &Arc<Document>, _ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        let Some(plan) = self.plans.get(&doc.id) else {
            return Ok(Transform::Unchanged);
        };

        let mut next = doc
            .map_dependencies(|d| {
                let mut d = d.clone();
                if let Some(to) = plan.bump_for(&d.group_id, &d.artifact_id, d.version.as_deref()) {
                    d.version = Some(to.to_string());
                }
                Some(d)
            })
            .map_managed_dependencies(|m| {
                let mut m = m.clone();
                if let Some(to) = plan.bump_for(&m.group_id, &m.artifact_id, m.version.as_deref()) {
                    m.version = Some(to.to_string());
                }
                Some(m)
            });
        for (name, value) in &plan.properties {
            next.properties.insert(name.clone(), value.clone());
        }
        Ok(Transform::Replace(next))
    }
}
