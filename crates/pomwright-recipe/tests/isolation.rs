use std::sync::Arc;

use pomwright_core::dependency::Dependency;
use pomwright_core::document::{Document, DocumentId, ParentRef};
use pomwright_maven::source::StaticSource;
use pomwright_recipe::recipe::{PreparedRecipe, Recipe, RecipeContext, Transform};
use pomwright_recipe::recipes::{AddDependency, ChangePropertyValue, UpgradeDependencyVersion};
use pomwright_recipe::scheduler::{self, RunState, Scheduler};
use pomwright_resolver::context::ResolutionContext;
use pomwright_resolver::working_set::WorkingSet;

fn project(id: &str) -> Document {
    let mut d = Document::new(id, id);
    d.group_id = Some("com.example".into());
    d.version = Some("1.0".into());
    d
}

/// Errors on `b`, panics on `c`, marks everything else.
struct Flaky;

impl Recipe for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn prepare(&self, _ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        Ok(Box::new(Flaky))
    }
}

impl PreparedRecipe for Flaky {
    fn transform(&self, doc: &Arc<Document>, _ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        match doc.id.as_str() {
            "b" => Err(miette::miette!("cannot edit b")),
            "c" => panic!("unexpected shape in c"),
            _ => Ok(Transform::Replace(doc.with_property("touched", "true"))),
        }
    }
}

fn check_isolation(scheduler: Scheduler) {
    let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(Flaky)];
    let set = WorkingSet::new(["a", "b", "c", "d"].map(project));
    let resolution = ResolutionContext::new(Arc::new(StaticSource::new()));
    let run = scheduler.run(&recipes, set, &resolution);

    assert_eq!(run.state, RunState::Converged);
    assert_eq!(run.converged_after, Some(1));
    let changed: Vec<&str> = run.changed().map(|r| r.id().as_str()).collect();
    assert_eq!(changed, vec!["a", "d"]);

    let first: Vec<_> = run.failures.iter().filter(|f| f.cycle == 1).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].document, Some(DocumentId::new("b")));
    assert_eq!(first[0].message, "cannot edit b");
    assert_eq!(first[1].document, Some(DocumentId::new("c")));
    assert_eq!(first[1].message, "panicked: unexpected shape in c");
    assert!(run.has_failures());
}

#[test]
fn failures_stay_with_their_document() {
    check_isolation(Scheduler::new(3).with_parallel(false));
}

#[test]
fn failures_stay_with_their_document_on_the_pool() {
    check_isolation(Scheduler::new(3).with_parallel(true).with_jobs(3));
}

/// Deletes documents whose artifactId starts with `legacy`.
struct DropLegacy;

impl Recipe for DropLegacy {
    fn name(&self) -> &'static str {
        "drop-legacy"
    }

    fn prepare(&self, _ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        Ok(Box::new(DropLegacy))
    }
}

impl PreparedRecipe for DropLegacy {
    fn transform(&self, doc: &Arc<Document>, _ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        Ok(if doc.artifact_id.starts_with("legacy") {
            Transform::Delete
        } else {
            Transform::Unchanged
        })
    }
}

#[test]
fn deleted_documents_leave_the_working_set() {
    let recipes: Vec<Box<dyn Recipe>> = vec![
        Box::new(DropLegacy),
        Box::new(ChangePropertyValue::new("level", "2")),
    ];
    let docs = vec![
        project("app").with_property("level", "1"),
        project("legacy-api").with_property("level", "1"),
    ];
    let run = scheduler::run(&recipes, docs, 3);

    assert_eq!(run.converged_after, Some(1));
    assert_eq!(run.documents.ids(), vec![DocumentId::new("app")]);
    let deleted: Vec<&str> = run.deleted().map(|r| r.id().as_str()).collect();
    assert_eq!(deleted, vec!["legacy-api"]);
    assert_eq!(run.changed().count(), 1);
    assert!(!run.has_failures());
}

#[test]
fn invalid_recipes_are_skipped_before_running() {
    let recipes: Vec<Box<dyn Recipe>> = vec![
        Box::new(AddDependency::new("", "lib", "[1.0,")),
        Box::new(ChangePropertyValue::new("level", "2")),
    ];
    let run = scheduler::run(&recipes, vec![project("app").with_property("level", "1")], 3);

    assert_eq!(run.invalid.len(), 1);
    assert_eq!(run.invalid[0].recipe, "add-dependency");
    assert_eq!(run.invalid[0].defects.len(), 2);
    assert_eq!(run.changed().count(), 1);
    assert!(run.failures.is_empty());
    assert!(run.has_failures());
}

#[test]
fn unsatisfiable_version_fails_preparation_only() {
    let recipes: Vec<Box<dyn Recipe>> = vec![
        Box::new(AddDependency::new("org.example", "lib", "9.x")),
        Box::new(ChangePropertyValue::new("level", "2")),
    ];
    let run = scheduler::run(&recipes, vec![project("app").with_property("level", "1")], 3);

    assert!(run.is_converged());
    assert_eq!(run.changed().count(), 1);
    assert!(run.failures.iter().all(|f| f.document.is_none()));
    assert!(run.failures[0].message.contains("org.example:lib"));
}

#[test]
fn unsatisfiable_upgrade_keeps_sibling_upgrades() {
    let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(UpgradeDependencyVersion::new("org.slf4j", "*", "2.0.x"))];
    let app = project("app")
        .with_dependency(Dependency::new("org.slf4j", "slf4j-api").with_version("2.0.9"))
        .with_dependency(Dependency::new("org.slf4j", "slf4j-ext").with_version("1.7.36"));
    let source = StaticSource::new()
        .with_versions("org.slf4j", "slf4j-api", &["2.0.9", "2.0.12"])
        .with_versions("org.slf4j", "slf4j-ext", &["1.7.36"]);
    let resolution = ResolutionContext::new(Arc::new(source));
    let run = Scheduler::new(3).run(&recipes, WorkingSet::new(vec![app]), &resolution);

    assert!(run.is_converged());
    let after = run.documents.get(&DocumentId::new("app")).unwrap();
    assert_eq!(after.dependencies[0].version.as_deref(), Some("2.0.12"));
    assert_eq!(after.dependencies[1].version.as_deref(), Some("1.7.36"));
    assert_eq!(run.changed().count(), 1);

    let first: Vec<_> = run.failures.iter().filter(|f| f.cycle == 1).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].document, Some(DocumentId::new("app")));
    assert!(first[0].message.contains("org.slf4j:slf4j-ext"), "{}", first[0].message);
}

#[test]
fn parent_cycles_are_reported_per_document() {
    let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(ChangePropertyValue::new("level", "2"))];
    let mut a = project("a").with_property("level", "1");
    a.parent = Some(ParentRef::new("com.example", "b", "1.0"));
    let mut b = project("b");
    b.parent = Some(ParentRef::new("com.example", "a", "1.0"));
    let run = scheduler::run(&recipes, vec![a, b], 3);

    assert!(run.is_converged());
    assert_eq!(run.changed().count(), 1);
    let unresolved: Vec<_> = run
        .failures
        .iter()
        .filter(|f| f.recipe == scheduler::RESOLUTION)
        .collect();
    assert_eq!(unresolved.len(), 2);
    assert_eq!(unresolved[0].document, Some(DocumentId::new("a")));
    assert!(unresolved[0].message.contains("Parent cycle"), "{}", unresolved[0].message);
    assert!(run.has_failures());
}
