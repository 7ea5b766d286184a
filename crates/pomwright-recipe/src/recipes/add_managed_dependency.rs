use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use pomwright_core::dependency::{ManagedDependency, Scope};
use pomwright_core::document::{Document, DocumentId};
use pomwright_resolver::merge;
use pomwright_util::glob::CoordinatePattern;

use super::{resolve_version, roots_using, validate_constraint, validate_pattern};
use crate::recipe::{require, PreparedRecipe, Recipe, RecipeContext, Transform};

/// Add an entry to `<dependencyManagement>` of every in-set root, optionally
/// only of roots whose module tree uses a matching dependency.
///
/// `version` accepts any constraint; it is resolved once per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddManagedDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub version_pattern: Option<String>,
    #[serde(default, rename = "dependency-type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub only_if_using: Option<String>,
}

impl AddManagedDependency {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            version_pattern: None,
            type_: None,
            scope: None,
            classifier: None,
            only_if_using: None,
        }
    }

    /// A BOM import: `type = pom`, `scope = import`.
    pub fn import(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            type_: Some("pom".to_string()),
            scope: Some(Scope::Import),
            ..Self::new(group_id, artifact_id, version)
        }
    }

    pub fn only_if_using(mut self, pattern: &str) -> Self {
        self.only_if_using = Some(pattern.to_string());
        self
    }
}

impl Recipe for AddManagedDependency {
    fn name(&self) -> &'static str {
        "add-managed-dependency"
    }

    fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();
        require(&mut defects, "group-id", &self.group_id);
        require(&mut defects, "artifact-id", &self.artifact_id);
        require(&mut defects, "version", &self.version);
        validate_constraint(&mut defects, "version", &self.version);
        validate_pattern(&mut defects, "only-if-using", self.only_if_using.as_deref());
        if self.scope == Some(Scope::Import) && self.type_.as_deref() != Some("pom") {
            defects.push("`scope = import` requires `dependency-type = pom`".to_string());
        }
        defects
    }

    fn prepare(&self, ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        let pattern = self
            .only_if_using
            .as_deref()
            .map(CoordinatePattern::parse)
            .transpose()?;
        let targets = roots_using(ctx, pattern.as_ref());
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

        let managed = ManagedDependency {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: Some(version),
            scope: self.scope,
            type_: self.type_.clone(),
            classifier: self.classifier.clone(),
            exclusions: Vec::new(),
            extra_xml: Vec::new(),
        };
        Ok(Box::new(PreparedManaged { targets, managed }))
    }
}

struct PreparedManaged {
    targets: HashSet<DocumentId>,
    managed: ManagedDependency,
}

impl PreparedRecipe for PreparedManaged {
    fn transform(&self, doc: &Arc<Document>, _ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        if !self.targets.contains(&doc.id) {
            return Ok(Transform::Unchanged);
        }
        Ok(Transform::from_edit(merge::ensure_managed_dependency(
            doc,
            self.managed.clone(),
        )))
    }
}
