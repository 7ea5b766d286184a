use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use pomwright_core::dependency::{Dependency, Scope};
use pomwright_core::document::{Document, DocumentId};
use pomwright_resolver::merge;
use pomwright_util::glob::{CoordinatePattern, GlobPattern};

use super::{resolve_version, uses, validate_constraint, validate_pattern};
use crate::recipe::{require, PreparedRecipe, Recipe, RecipeContext, Transform};

/// Add a dependency to every document, or only to documents that already use
/// a matching dependency.
///
/// The declaration is planned against inherited management, so a version the
/// parent already manages is not repeated. With `family-pattern`, a missing
/// version is aligned with an existing sibling of the same group family.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub version_pattern: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default, rename = "dependency-type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub only_if_using: Option<String>,
    #[serde(default)]
    pub family_pattern: Option<String>,
}

impl AddDependency {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            version_pattern: None,
            scope: None,
            type_: None,
            classifier: None,
            optional: false,
            only_if_using: None,
            family_pattern: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn only_if_using(mut self, pattern: &str) -> Self {
        self.only_if_using = Some(pattern.to_string());
        self
    }

    pub fn family_pattern(mut self, pattern: &str) -> Self {
        self.family_pattern = Some(pattern.to_string());
        self
    }
}

impl Recipe for AddDependency {
    fn name(&self) -> &'static str {
        "add-dependency"
    }

    fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();
        require(&mut defects, "group-id", &self.group_id);
        require(&mut defects, "artifact-id", &self.artifact_id);
        require(&mut defects, "version", &self.version);
        validate_constraint(&mut defects, "version", &self.version);
        validate_pattern(&mut defects, "only-if-using", self.only_if_using.as_deref());
        if let Some(Err(e)) = self.family_pattern.as_deref().map(GlobPattern::new) {
            defects.push(format!("`family-pattern`: {e}"));
        }
        if self.scope == Some(Scope::Import) {
            defects.push("`scope = import` is only valid in dependency management".to_string());
        }
        defects
    }

    fn prepare(&self, ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        let pattern = self
            .only_if_using
            .as_deref()
            .map(CoordinatePattern::parse)
            .transpose()?;
        let family = self.family_pattern.as_deref().map(GlobPattern::new).transpose()?;

        let targets: HashSet<DocumentId> = ctx
            .working_set
            .iter()
            .filter(|doc| pattern.as_ref().map_or(true, |p| uses(doc, p)))
            .map(|doc| doc.id.clone())
            .collect();
        let version = if targets.is_empty() {
            self.version.clone()
        } else {
            resolve_version(
                ctx,
                &self.group_id,
                &self.artifact_id,
                &self.version,
                self.version_pattern.as_deref(),
            )?
        };

        let dependency = Dependency {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: Some(version),
            scope: self.scope,
            type_: self.type_.clone(),
            classifier: self.classifier.clone(),
            optional: self.optional,
            exclusions: Vec::new(),
            extra_xml: Vec::new(),
        };
        Ok(Box::new(PreparedAdd {
            targets,
            dependency,
            family,
        }))
    }
}

struct PreparedAdd {
    targets: HashSet<DocumentId>,
    dependency: Dependency,
    family: Option<GlobPattern>,
}

impl PreparedRecipe for PreparedAdd {
    fn transform(&self, doc: &Arc<Document>, ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        if !self.targets.contains(&doc.id) {
            return Ok(Transform::Unchanged);
        }
        let model = ctx.model(doc)?;
        Ok(Transform::from_edit(merge::add_dependency(
            doc,
            &model,
            self.dependency.clone(),
            self.family.as_ref(),
        )))
    }
}
