use std::collections::BTreeMap;

use pomwright_core::profile::{ActivationContext, Profile, PropertyActivation};

fn profiles() -> Vec<Profile> {
    let mut default = Profile::new("default");
    default.activation.active_by_default = true;

    let mut prod = Profile::new("prod");
    prod.activation.property = Some(PropertyActivation {
        name: "env".to_string(),
        value: Some("prod".to_string()),
    });

    let mut not_ci = Profile::new("local");
    not_ci.activation.property = Some(PropertyActivation {
        name: "!ci".to_string(),
        value: None,
    });

    vec![default, prod, not_ci, Profile::new("manual")]
}

fn ids(active: Vec<&Profile>) -> Vec<&str> {
    active.into_iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn explicit_list_wins() {
    let ctx = ActivationContext::new(vec!["manual".to_string()], BTreeMap::new());
    let all = profiles();
    assert_eq!(ids(ctx.active(&all)), vec!["manual"]);
}

#[test]
fn property_activation_suppresses_default() {
    let user = BTreeMap::from([
        ("env".to_string(), "prod".to_string()),
        ("ci".to_string(), "true".to_string()),
    ]);
    let ctx = ActivationContext::new(Vec::new(), user);
    let all = profiles();
    assert_eq!(ids(ctx.active(&all)), vec!["prod"]);
}

#[test]
fn negated_property_matches_when_absent() {
    let ctx = ActivationContext::default();
    let all = profiles();
    assert_eq!(ids(ctx.active(&all)), vec!["local"]);
}

#[test]
fn active_by_default_when_nothing_else_applies() {
    let user = BTreeMap::from([("ci".to_string(), "true".to_string())]);
    let ctx = ActivationContext::new(Vec::new(), user);
    let all = profiles();
    assert_eq!(ids(ctx.active(&all)), vec!["default"]);
}

#[test]
fn negated_value() {
    let mut p = Profile::new("non-prod");
    p.activation.property = Some(PropertyActivation {
        name: "env".to_string(),
        value: Some("!prod".to_string()),
    });
    let all = vec![p];
    let dev = ActivationContext::new(
        Vec::new(),
        BTreeMap::from([("env".to_string(), "dev".to_string())]),
    );
    let prod = ActivationContext::new(
        Vec::new(),
        BTreeMap::from([("env".to_string(), "prod".to_string())]),
    );
    assert_eq!(ids(dev.active(&all)), vec!["non-prod"]);
    assert!(prod.active(&all).is_empty());
}
