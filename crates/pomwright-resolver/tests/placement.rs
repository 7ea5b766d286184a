use std::path::PathBuf;
use std::sync::Arc;

use pomwright_core::dependency::Dependency;
use pomwright_core::document::{Document, DocumentId, ParentRef};
use pomwright_maven::source::StaticSource;
use pomwright_resolver::context::ResolutionContext;
use pomwright_resolver::graph::ModuleGraph;
use pomwright_resolver::merge;
use pomwright_resolver::working_set::WorkingSet;
use pomwright_util::glob::GlobPattern;

fn module(path: &str, artifact: &str, parent: Option<&str>) -> Document {
    let mut d = Document::new(path, artifact);
    d.source_path = Some(PathBuf::from(path));
    match parent {
        Some(p) => d.parent = Some(ParentRef::new("com.example", p, "1.0")),
        None => {
            d.group_id = Some("com.example".into());
            d.version = Some("1.0".into());
        }
    }
    d
}

#[test]
fn edit_lands_on_loaded_root_only() {
    // root -> service-api -> service, with only root and service-api loaded
    let set = WorkingSet::new([
        module("pom.xml", "root", None),
        module("service-api/pom.xml", "service-api", Some("root")),
    ]);
    let graph = ModuleGraph::build(&set);

    let targets: Vec<&str> = set
        .iter()
        .filter(|d| graph.is_root(&d.id))
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(targets, vec!["pom.xml"]);
    assert_eq!(
        graph.root_for(&DocumentId::new("service-api/pom.xml")).as_str(),
        "pom.xml"
    );
}

#[test]
fn unrelated_modules_are_separate_roots() {
    let mut a = module("a/pom.xml", "a", None);
    a.parent = Some(ParentRef::new("org.springframework.boot", "spring-boot-starter-parent", "3.2.0"));
    let b = module("b/pom.xml", "b", None);
    let set = WorkingSet::new([a, b]);
    let graph = ModuleGraph::build(&set);
    let roots: Vec<&str> = graph.roots().iter().map(|id| id.as_str()).collect();
    assert_eq!(roots, vec!["a/pom.xml", "b/pom.xml"]);
}

#[test]
fn family_member_takes_sibling_version_expression() {
    let doc = module("pom.xml", "app", None).with_dependency(
        Dependency::new("com.fasterxml.jackson.core", "jackson-databind").with_version("${jackson.version}"),
    );
    let set = WorkingSet::new([doc]);
    let ctx = ResolutionContext::new(Arc::new(StaticSource::new()));
    let doc = set.get(&DocumentId::new("pom.xml")).cloned().unwrap();
    let model = ctx.model(&doc, &set).unwrap();
    let family = GlobPattern::new("com.fasterxml.jackson*").unwrap();

    let added = merge::add_dependency(
        &doc,
        &model,
        Dependency::new("com.fasterxml.jackson.module", "jackson-module-afterburner").with_version("2.15.0"),
        Some(&family),
    )
    .unwrap();
    let afterburner = added
        .find_dependency("com.fasterxml.jackson.module", "jackson-module-afterburner")
        .unwrap();
    assert_eq!(afterburner.version.as_deref(), Some("${jackson.version}"));

    assert!(merge::add_dependency(
        &added,
        &model,
        Dependency::new("com.fasterxml.jackson.module", "jackson-module-afterburner"),
        Some(&family),
    )
    .is_none());
}

#[test]
fn managed_dependency_is_added_without_version() {
    let root = module("pom.xml", "root", None).with_managed_dependency(
        pomwright_core::dependency::ManagedDependency::new("org.slf4j", "slf4j-api").with_version("2.0.9"),
    );
    let child = module("svc/pom.xml", "svc", Some("root"));
    let set = WorkingSet::new([root, child]);
    let ctx = ResolutionContext::new(Arc::new(StaticSource::new()));
    let svc = set.get(&DocumentId::new("svc/pom.xml")).cloned().unwrap();
    let model = ctx.model(&svc, &set).unwrap();

    let added = merge::add_dependency(
        &svc,
        &model,
        Dependency::new("org.slf4j", "slf4j-api").with_version("2.0.9"),
        None,
    )
    .unwrap();
    assert_eq!(added.dependencies, vec![Dependency::new("org.slf4j", "slf4j-api")]);
}
