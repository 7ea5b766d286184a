use std::collections::BTreeMap;

use pomwright_core::document::{Document, ParentRef};
use pomwright_core::properties::{implicit_properties, PropertyResolver};
use pomwright_util::errors::PomwrightError;

fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn chained_references_resolve_transitively() {
    let mut doc = Document::new("pom.xml", "app");
    doc.properties = props(&[
        ("jackson.major", "2"),
        ("jackson.version", "${jackson.major}.15.0"),
        ("jackson.databind", "${jackson.version}"),
    ]);
    let resolved = PropertyResolver::default().resolve(&doc, &[]).unwrap();
    assert_eq!(resolved.get("jackson.databind"), Some("2.15.0"));
    assert!(resolved.unresolved.is_empty());
}

#[test]
fn ancestor_values_are_shadowed_by_child() {
    let mut doc = Document::new("child/pom.xml", "child");
    doc.properties = props(&[("java.version", "21")]);
    let parent = props(&[("java.version", "17"), ("encoding", "UTF-8")]);
    let grandparent = props(&[("encoding", "latin1"), ("license", "MIT")]);
    let resolved = PropertyResolver::default()
        .resolve(&doc, &[&parent, &grandparent])
        .unwrap();
    assert_eq!(resolved.get("java.version"), Some("21"));
    assert_eq!(resolved.get("encoding"), Some("UTF-8"));
    assert_eq!(resolved.get("license"), Some("MIT"));
}

#[test]
fn child_value_feeds_parent_expression() {
    let mut doc = Document::new("child/pom.xml", "child");
    doc.properties = props(&[("slf4j.major", "2.0")]);
    let parent = props(&[("slf4j.version", "${slf4j.major}.9"), ("slf4j.major", "1.7")]);
    let resolved = PropertyResolver::default().resolve(&doc, &[&parent]).unwrap();
    assert_eq!(resolved.get("slf4j.version"), Some("2.0.9"));
}

#[test]
fn unknown_names_stay_literal_and_are_reported() {
    let mut doc = Document::new("pom.xml", "app");
    doc.properties = props(&[("lib.version", "${missing.version}")]);
    let resolved = PropertyResolver::default().resolve(&doc, &[]).unwrap();
    assert_eq!(resolved.get("lib.version"), Some("${missing.version}"));
    assert!(resolved.unresolved.contains("missing.version"));

    let (text, missing) = resolved.interpolate("${lib.version}-${other}");
    assert_eq!(text, "${missing.version}-${other}");
    assert_eq!(missing, vec!["missing.version", "other"]);
}

#[test]
fn implicit_project_properties() {
    let mut doc = Document::new("pom.xml", "app");
    doc.parent = Some(ParentRef::new("com.acme", "acme-parent", "3.1.0"));
    let implicit = implicit_properties(&doc);
    assert_eq!(implicit.get("project.groupId").map(String::as_str), Some("com.acme"));
    assert_eq!(implicit.get("project.version").map(String::as_str), Some("3.1.0"));
    assert_eq!(implicit.get("pom.artifactId").map(String::as_str), Some("app"));
    assert_eq!(
        implicit.get("project.parent.artifactId").map(String::as_str),
        Some("acme-parent")
    );

    let resolved = PropertyResolver::default().resolve(&doc, &[]).unwrap();
    assert_eq!(resolved.expand("${project.artifactId}-${project.version}"), "app-3.1.0");
}

#[test]
fn explicit_property_shadows_implicit() {
    let mut doc = Document::new("pom.xml", "app");
    doc.version = Some("1.0".to_string());
    doc.properties = props(&[("version", "override")]);
    let resolved = PropertyResolver::default().resolve(&doc, &[]).unwrap();
    assert_eq!(resolved.get("version"), Some("override"));
    assert_eq!(resolved.get("project.version"), Some("1.0"));
}

#[test]
fn mutual_recursion_hits_pass_limit() {
    let mut doc = Document::new("pom.xml", "app");
    doc.properties = props(&[("a", "${b}"), ("b", "${a}")]);
    let err = PropertyResolver::new(3).resolve(&doc, &[]).unwrap_err();
    match err {
        PomwrightError::SelfReferentialProperty {
            document, passes, ..
        } => {
            assert_eq!(document, "pom.xml");
            assert_eq!(passes, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deep_chain_within_limit() {
    let mut doc = Document::new("pom.xml", "app");
    let mut pairs = vec![("p0".to_string(), "end".to_string())];
    for i in 1..9 {
        pairs.push((format!("p{i}"), format!("${{p{}}}", i - 1)));
    }
    doc.properties = pairs.into_iter().collect();
    let resolved = PropertyResolver::default().resolve(&doc, &[]).unwrap();
    assert_eq!(resolved.get("p8"), Some("end"));
}
