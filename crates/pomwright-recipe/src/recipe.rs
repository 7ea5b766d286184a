use std::sync::Arc;

use pomwright_core::document::{Document, DocumentId};
use pomwright_resolver::context::ResolutionContext;
use pomwright_resolver::graph::ModuleGraph;
use pomwright_resolver::inheritance::ResolvedModel;
use pomwright_resolver::working_set::WorkingSet;
use pomwright_util::errors::PomwrightError;

/// What a prepared recipe does to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    Unchanged,
    Replace(Document),
    Delete,
}

impl Transform {
    /// `Replace` for `Some`, `Unchanged` for `None`.
    pub fn from_edit(edit: Option<Document>) -> Self {
        edit.map_or(Transform::Unchanged, Transform::Replace)
    }
}

/// Read-only view handed to recipes: the current working set, its module
/// graph and the run-scoped resolution context.
pub struct RecipeContext<'a> {
    pub working_set: &'a WorkingSet,
    pub graph: &'a ModuleGraph,
    pub resolution: &'a ResolutionContext,
}

impl<'a> RecipeContext<'a> {
    pub fn new(
        working_set: &'a WorkingSet,
        graph: &'a ModuleGraph,
        resolution: &'a ResolutionContext,
    ) -> Self {
        Self {
            working_set,
            graph,
            resolution,
        }
    }

    pub fn model(&self, doc: &Arc<Document>) -> miette::Result<Arc<ResolvedModel>> {
        self.resolution.model(doc, self.working_set)
    }

    pub fn versions(&self, group_id: &str, artifact_id: &str) -> miette::Result<Vec<String>> {
        self.resolution.versions(group_id, artifact_id)
    }
}

/// A configured rewrite rule.
pub trait Recipe: Send + Sync {
    /// Stable kebab-case name used in reports and recipe files.
    fn name(&self) -> &'static str;

    /// Field-level defects; an empty list means the recipe may run.
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }

    /// Serial pass over the cycle-start working set that gathers whatever
    /// cross-document facts the transform needs.
    fn prepare(&self, ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>>;
}

/// A recipe bound to the facts gathered for one cycle.
pub trait PreparedRecipe: Send + Sync {
    /// Per-document edits that could not be planned. They are reported as
    /// failures of the recipe while its other edits still apply.
    fn failures(&self) -> Vec<(DocumentId, String)> {
        Vec::new()
    }

    fn transform(&self, doc: &Arc<Document>, ctx: &RecipeContext<'_>) -> miette::Result<Transform>;
}

/// The validation error of `recipe`, if it has defects.
pub fn check(recipe: &dyn Recipe) -> Result<(), PomwrightError> {
    let defects = recipe.validate();
    if defects.is_empty() {
        Ok(())
    } else {
        Err(PomwrightError::Validation {
            recipe: recipe.name().to_string(),
            defects,
        })
    }
}

/// Push a defect when a required text field is blank.
pub(crate) fn require(defects: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        defects.push(format!("`{field}` is required"));
    }
}
