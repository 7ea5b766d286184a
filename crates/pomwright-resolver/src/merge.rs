//! Declaration-level merge against inherited dependency management.
//!
//! Given a document's [`ResolvedModel`], decide which parts of a dependency
//! declaration management already supplies, align new family members with
//! their siblings, and find explicit overrides that merely repeat management.

use pomwright_core::dependency::{Dependency, DependencyKey, ManagedDependency, Scope, DEFAULT_TYPE};
use pomwright_core::document::Document;
use pomwright_util::glob::GlobPattern;

use crate::constraint::{ConstraintKind, VersionConstraint};
use crate::inheritance::{ManagedEntry, ResolvedModel};

/// Whether `entry` provides a version acceptable for `desired`.
///
/// The raw or substituted texts are equal, or `desired` is a range or meta
/// version that the managed version satisfies.
pub fn version_subsumed(desired: &str, entry: &ManagedEntry, model: &ResolvedModel) -> bool {
    let Some(managed) = entry.version.as_deref() else {
        return false;
    };
    let expanded = model.properties.expand(desired);
    if entry.dependency.version.as_deref() == Some(desired) || expanded == managed {
        return true;
    }
    match VersionConstraint::parse(&expanded) {
        Ok(constraint) if !matches!(constraint.kind(), ConstraintKind::Exact(_)) => {
            constraint.is_satisfied_by(managed)
        }
        _ => false,
    }
}

/// The declaration to write for `desired` in the document described by `model`.
///
/// When a managed entry with the same key supplies an acceptable version, the
/// version is dropped, along with a scope equal to the managed one and a `jar`
/// type. Scopes only conflict when both sides specify one; a conflicting scope
/// returns `desired` as is.
pub fn plan_dependency(desired: Dependency, model: &ResolvedModel) -> Dependency {
    let Some(entry) = model.managed_for(&desired.key()) else {
        return desired;
    };
    if let (Some(wanted), Some(managed)) = (desired.scope, entry.dependency.scope) {
        if wanted != managed {
            tracing::debug!("{desired}: scope {wanted} differs from managed {managed}, keeping it explicit");
            return desired;
        }
    }
    let covered = match desired.version.as_deref() {
        Some(v) => version_subsumed(v, entry, model),
        None => true,
    };
    if !covered {
        return desired;
    }

    let mut planned = desired;
    planned.version = None;
    if planned.scope.is_some() && planned.scope == entry.dependency.scope {
        planned.scope = None;
    }
    if planned.type_.as_deref() == Some(DEFAULT_TYPE) {
        planned.type_ = None;
    }
    planned
}

/// The raw version expression of an existing declaration whose groupId
/// matches `family`, preferring plain dependencies over managed ones.
pub fn family_version(doc: &Document, family: &GlobPattern) -> Option<String> {
    doc.dependencies
        .iter()
        .filter(|d| family.is_match(&d.group_id))
        .find_map(|d| d.version.clone())
        .or_else(|| {
            doc.dependency_management
                .iter()
                .filter(|m| family.is_match(&m.group_id) && !m.is_import())
                .find_map(|m| m.version.clone())
        })
}

/// Add `desired` to `doc` unless a declaration with the same key exists.
///
/// Management is applied first; when nothing manages the key and a `family`
/// sibling is declared, the sibling's version expression is reused verbatim.
/// Returns `None` when nothing changes.
pub fn add_dependency(
    doc: &Document,
    model: &ResolvedModel,
    desired: Dependency,
    family: Option<&GlobPattern>,
) -> Option<Document> {
    let key = desired.key();
    if doc.dependencies.iter().any(|d| d.key() == key) {
        return None;
    }
    let mut planned = plan_dependency(desired, model);
    if model.managed_for(&key).is_none() {
        if let Some(version) = family.and_then(|f| family_version(doc, f)) {
            tracing::debug!("{}: aligning {key} with family version {version}", doc.id);
            planned.version = Some(version);
        }
    }
    ensure_dependency(doc, planned)
}

/// `doc` with `dependency` appended, or `None` if its key is already declared.
pub fn ensure_dependency(doc: &Document, dependency: Dependency) -> Option<Document> {
    let key = dependency.key();
    if doc.dependencies.iter().any(|d| d.key() == key) {
        return None;
    }
    Some(doc.with_dependency(dependency))
}

/// `doc` with `managed` appended to its own management, or `None` if an entry
/// with the same key is already there.
pub fn ensure_managed_dependency(doc: &Document, managed: ManagedDependency) -> Option<Document> {
    if doc.find_managed(&managed.key()).is_some() {
        return None;
    }
    Some(doc.with_managed_dependency(managed))
}

/// Parts of one declaration that repeat what management supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundantOverride {
    pub key: DependencyKey,
    pub version: bool,
    pub scope: bool,
}

/// Declared dependencies whose explicit version or scope equals the managed one.
///
/// When both sides specify differing scopes, neither the scope nor the version
/// next to it is redundant. A scope over unscoped management is kept while
/// the version may still go. Managed entries themselves are never reported.
pub fn redundant_overrides(doc: &Document, model: &ResolvedModel) -> Vec<RedundantOverride> {
    doc.dependencies
        .iter()
        .filter(|d| d.scope != Some(Scope::Import))
        .filter_map(|d| {
            let key = d.key();
            let entry = model.managed_for(&key)?;
            if let (Some(declared), Some(managed)) = (d.scope, entry.dependency.scope) {
                if declared != managed {
                    return None;
                }
            }
            let version = match (d.version.as_deref(), entry.version.as_deref()) {
                (Some(declared), Some(managed)) => {
                    entry.dependency.version.as_deref() == Some(declared)
                        || model.properties.expand(declared) == managed
                }
                _ => false,
            };
            let scope = d.scope.is_some() && d.scope == entry.dependency.scope;
            (version || scope).then_some(RedundantOverride { key, version, scope })
        })
        .collect()
}

/// `doc` with every redundant version and scope removed, or `None` if there
/// is nothing to remove.
pub fn strip_redundant(doc: &Document, model: &ResolvedModel) -> Option<Document> {
    strip_overrides(doc, &redundant_overrides(doc, model))
}

/// `doc` with the given overrides removed, or `None` if `overrides` is empty.
pub fn strip_overrides(doc: &Document, overrides: &[RedundantOverride]) -> Option<Document> {
    if overrides.is_empty() {
        return None;
    }
    Some(doc.map_dependencies(|d| {
        let mut next = d.clone();
        if let Some(r) = overrides.iter().find(|r| r.key == d.key()) {
            if r.version {
                next.version = None;
            }
            if r.scope {
                next.scope = None;
            }
        }
        Some(next)
    }))
}
