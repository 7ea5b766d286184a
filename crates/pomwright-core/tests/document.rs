use pomwright_core::dependency::{
    Dependency, DependencyKey, Exclusion, ManagedDependency, Scope,
};
use pomwright_core::document::{Coordinates, Document, ParentRef};
use pomwright_core::finding::Finding;
use pomwright_util::errors::PomwrightError;

#[test]
fn coordinates_parse_valid() {
    let coord = Coordinates::parse("com.example:my-lib:1.0.0").unwrap();
    assert_eq!(coord.group_id, "com.example");
    assert_eq!(coord.to_string(), "com.example:my-lib:1.0.0");
}

#[test]
fn coordinates_parse_rejects_other_shapes() {
    assert!(Coordinates::parse("group:artifact").is_none());
    assert!(Coordinates::parse("g::v").is_none());
    assert!(Coordinates::parse("").is_none());
}

#[test]
fn coordinates_inherit_from_parent() {
    let mut doc = Document::new("child/pom.xml", "child");
    doc.parent = Some(ParentRef::new("com.acme", "parent", "2.0"));
    let coords = doc.coordinates().unwrap();
    assert_eq!(coords, Coordinates::new("com.acme", "child", "2.0"));
}

#[test]
fn missing_group_is_malformed() {
    let doc = Document::new("pom.xml", "orphan");
    let err = doc.coordinates().unwrap_err();
    assert!(matches!(err, PomwrightError::MalformedCoordinates { .. }));
}

#[test]
fn dependency_key_applies_type_default() {
    let plain = Dependency::new("g", "a").key();
    let jar = Dependency::new("g", "a").with_type("jar").key();
    let pom = Dependency::new("g", "a").with_type("pom").key();
    assert_eq!(plain, jar);
    assert_ne!(plain, pom);
    assert_eq!(plain, DependencyKey::new("g", "a", Some(""), None));
}

#[test]
fn scope_defaults_and_parsing() {
    assert_eq!(Dependency::new("g", "a").effective_scope(), Scope::Compile);
    assert_eq!("test".parse::<Scope>().unwrap(), Scope::Test);
    assert!("bogus".parse::<Scope>().is_err());
}

#[test]
fn exclusion_wildcards() {
    let mut dep = Dependency::new("g", "a");
    dep.exclusions.push(Exclusion::new("commons-logging", "*"));
    assert!(dep.excludes("commons-logging", "commons-logging"));
    assert!(!dep.excludes("org.slf4j", "slf4j-api"));
}

#[test]
fn managed_import_detection() {
    let bom = ManagedDependency::new("org.junit", "junit-bom")
        .with_version("5.10.0")
        .with_type("pom")
        .with_scope(Scope::Import);
    assert!(bom.is_import());
    assert!(!ManagedDependency::new("g", "a").is_import());
}

#[test]
fn edits_return_new_documents() {
    let doc = Document::new("pom.xml", "app");
    let edited = doc
        .with_property("x", "1")
        .with_dependency(Dependency::new("g", "a").with_version("1"));
    assert!(doc.properties.is_empty());
    assert!(doc.dependencies.is_empty());
    assert_eq!(edited.properties.get("x").map(String::as_str), Some("1"));
    assert!(edited.find_dependency("g", "a").is_some());

    let stripped = edited.map_dependencies(|d| {
        let mut d = d.clone();
        d.version = None;
        Some(d)
    });
    assert_eq!(stripped.dependencies[0].version, None);
    assert_eq!(edited.map_dependencies(|_| None).dependencies.len(), 0);
}

#[test]
fn finding_display() {
    let f = Finding::UnresolvedProperty {
        document: pomwright_core::document::DocumentId::new("pom.xml"),
        name: "x".to_string(),
    };
    assert_eq!(f.to_string(), "pom.xml: unresolved property ${x}");
    assert_eq!(f.document().as_str(), "pom.xml");
}
