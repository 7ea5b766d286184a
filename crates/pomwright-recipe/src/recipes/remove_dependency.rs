use std::sync::Arc;

use serde::Deserialize;

use pomwright_core::dependency::Scope;
use pomwright_core::document::Document;
use pomwright_util::glob::CoordinatePattern;

use crate::recipe::{require, PreparedRecipe, Recipe, RecipeContext, Transform};

/// Remove matching `<dependencies>` entries. Management is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoveDependency {
    pub group_id: String,
    pub artifact_id: String,
    /// Only remove declarations with this effective scope.
    #[serde(default)]
    pub scope: Option<Scope>,
}

impl RemoveDependency {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            scope: None,
        }
    }
}

impl Recipe for RemoveDependency {
    fn name(&self) -> &'static str {
        "remove-dependency"
    }

    fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();
        require(&mut defects, "group-id", &self.group_id);
        require(&mut defects, "artifact-id", &self.artifact_id);
        if let Err(e) = CoordinatePattern::new(&self.group_id, &self.artifact_id) {
            defects.push(e.to_string());
        }
        defects
    }

    fn prepare(&self, _ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        Ok(Box::new(PreparedRemove {
            pattern: CoordinatePattern::new(&self.group_id, &self.artifact_id)?,
            scope: self.scope,
        }))
    }
}

struct PreparedRemove {
    pattern: CoordinatePattern,
    scope: Option<Scope>,
}

impl PreparedRecipe for PreparedRemove {
    fn transform(&self, doc: &Arc<Document>, _ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        let matches = |d: &pomwright_core::dependency::Dependency| {
            self.pattern.is_match(&d.group_id, &d.artifact_id)
                && self.scope.map_or(true, |s| d.effective_scope() == s)
        };
        if !doc.dependencies.iter().any(matches) {
            return Ok(Transform::Unchanged);
        }
        Ok(Transform::Replace(
            doc.map_dependencies(|d| (!matches(d)).then(|| d.clone())),
        ))
    }
}
