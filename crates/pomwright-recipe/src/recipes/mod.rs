//! Built-in recipes. Each one is an immutable, deserializable configuration
//! with `validate()`; the document edits go through `pomwright_resolver::merge`.

mod add_dependency;
mod add_managed_dependency;
mod change_property;
mod remove_dependency;
mod remove_redundant;
mod upgrade_version;

pub use add_dependency::AddDependency;
pub use add_managed_dependency::AddManagedDependency;
pub use change_property::ChangePropertyValue;
pub use remove_dependency::RemoveDependency;
pub use remove_redundant::RemoveRedundantDependencyVersions;
pub use upgrade_version::UpgradeDependencyVersion;

use std::collections::HashSet;

use pomwright_core::document::{Document, DocumentId};
use pomwright_core::visit;
use pomwright_resolver::constraint::{ConstraintKind, VersionConstraint};
use pomwright_util::glob::CoordinatePattern;

use crate::recipe::RecipeContext;

/// Turn a requested version into the one to write. Exact versions and
/// `${property}` expressions are written as given; everything else is
/// resolved against the published versions.
fn resolve_version(
    ctx: &RecipeContext<'_>,
    group_id: &str,
    artifact_id: &str,
    version: &str,
    suffix: Option<&str>,
) -> miette::Result<String> {
    let mut constraint = VersionConstraint::parse(version)?;
    if let Some(suffix) = suffix {
        constraint = constraint.with_suffix(suffix);
    }
    if matches!(
        constraint.kind(),
        ConstraintKind::Exact(_) | ConstraintKind::PropertyRef(_)
    ) {
        return Ok(version.trim().to_string());
    }
    let candidates = ctx.versions(group_id, artifact_id)?;
    let resolved = constraint.resolve(&format!("{group_id}:{artifact_id}"), &candidates)?;
    tracing::debug!("{group_id}:{artifact_id} `{constraint}` resolved to {resolved}");
    Ok(resolved)
}

fn uses(doc: &Document, pattern: &CoordinatePattern) -> bool {
    visit::uses_dependency(doc, |g, a| pattern.is_match(g, a))
}

/// In-set roots, keeping only those whose subtree uses `pattern` when given.
fn roots_using(ctx: &RecipeContext<'_>, pattern: Option<&CoordinatePattern>) -> HashSet<DocumentId> {
    ctx.graph
        .roots()
        .into_iter()
        .filter(|root| match pattern {
            None => true,
            Some(p) => ctx
                .graph
                .subtree(root)
                .into_iter()
                .filter_map(|id| ctx.working_set.get(id))
                .any(|doc| uses(doc, p)),
        })
        .cloned()
        .collect()
}

fn validate_pattern(defects: &mut Vec<String>, field: &str, pattern: Option<&str>) {
    if let Some(Err(e)) = pattern.map(CoordinatePattern::parse) {
        defects.push(format!("`{field}`: {e}"));
    }
}

fn validate_constraint(defects: &mut Vec<String>, field: &str, version: &str) {
    if version.trim().is_empty() {
        return;
    }
    if let Err(e) = VersionConstraint::parse(version) {
        defects.push(format!("`{field}`: {e}"));
    }
}
