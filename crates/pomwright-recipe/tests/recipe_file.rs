use std::fs;

use pomwright_core::document::Document;
use pomwright_recipe::scheduler;
use pomwright_recipe::spec::load_recipes;

const RECIPES: &str = r#"
[[recipe]]
type = "add-dependency"
group-id = "org.junit.jupiter"
artifact-id = "junit-jupiter"
version = "5.10.2"
scope = "test"

[[recipe]]
type = "change-property-value"
key = "maven.compiler.release"
new-value = "21"
add-if-missing = true

[[recipe]]
type = "remove-dependency"
group-id = "junit"
artifact-id = "junit"
"#;

#[test]
fn recipes_load_from_file_in_declared_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recipes.toml");
    fs::write(&path, RECIPES).unwrap();

    let recipes = load_recipes(&path).unwrap();
    let names: Vec<&str> = recipes.iter().map(|r| r.name()).collect();
    assert_eq!(
        names,
        vec!["add-dependency", "change-property-value", "remove-dependency"]
    );

    let mut app = Document::new("pom.xml", "app");
    app.group_id = Some("com.example".into());
    app.version = Some("1.0".into());
    let app = app.with_dependency(
        pomwright_core::dependency::Dependency::new("junit", "junit").with_version("4.13.2"),
    );

    let run = scheduler::run(&recipes, vec![app], 3);
    assert_eq!(run.converged_after, Some(1));
    let after = run.results[0].after.as_ref().unwrap();
    assert_eq!(after.properties["maven.compiler.release"], "21");
    assert_eq!(after.dependencies.len(), 1);
    assert_eq!(after.dependencies[0].artifact_id, "junit-jupiter");
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_recipes(&dir.path().join("absent.toml")).err().unwrap();
    assert!(err.to_string().contains("Configuration error"));
}
