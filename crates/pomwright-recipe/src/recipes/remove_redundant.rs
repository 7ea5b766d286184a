use std::sync::Arc;

use serde::Deserialize;

use pomwright_core::document::Document;
use pomwright_resolver::merge;
use pomwright_util::glob::CoordinatePattern;

use super::validate_pattern;
use crate::recipe::{PreparedRecipe, Recipe, RecipeContext, Transform};

/// Drop explicit versions and scopes that repeat what inherited management
/// already supplies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoveRedundantDependencyVersions {
    /// Restrict to dependencies matching `group:artifact`.
    #[serde(default)]
    pub only_matching: Option<String>,
}

impl Recipe for RemoveRedundantDependencyVersions {
    fn name(&self) -> &'static str {
        "remove-redundant-dependency-versions"
    }

    fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();
        validate_pattern(&mut defects, "only-matching", self.only_matching.as_deref());
        defects
    }

    fn prepare(&self, _ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        let pattern = self
            .only_matching
            .as_deref()
            .map(CoordinatePattern::parse)
            .transpose()?;
        Ok(Box::new(PreparedStrip { pattern }))
    }
}

struct PreparedStrip {
    pattern: Option<CoordinatePattern>,
}

impl PreparedRecipe for PreparedStrip {
    fn transform(&self, doc: &Arc<Document>, ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        if doc.dependencies.is_empty() {
            return Ok(Transform::Unchanged);
        }
        let model = ctx.model(doc)?;
        let overrides: Vec<_> = merge::redundant_overrides(doc, &model)
            .into_iter()
            .filter(|r| {
                self.pattern
                    .as_ref()
                    .map_or(true, |p| p.is_match(&r.key.group_id, &r.key.artifact_id))
            })
            .collect();
        Ok(Transform::from_edit(merge::strip_overrides(doc, &overrides)))
    }
}
