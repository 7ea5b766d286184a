use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dependency::{Dependency, ManagedDependency};
use crate::document::Repository;

/// A `<profile>`: an activation predicate plus an overlay that is merged into
/// the declaring document when active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub dependency_management: Vec<ManagedDependency>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    /// Unmodeled profile sections (`<build>`, `<modules>`, ...) as XML text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_xml: Vec<String>,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            activation: Activation::default(),
            properties: BTreeMap::new(),
            dependencies: Vec::new(),
            dependency_management: Vec::new(),
            repositories: Vec::new(),
            extra_xml: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    #[serde(default)]
    pub active_by_default: bool,
    #[serde(default)]
    pub property: Option<PropertyActivation>,
    /// Activation conditions that are not evaluated (`<jdk>`, `<os>`,
    /// `<file>`), kept as XML text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_xml: Vec<String>,
}

/// `<activation><property>`: `name` (present), `name` + `value` (equal),
/// or `!name` (absent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyActivation {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl PropertyActivation {
    fn matches(&self, properties: &BTreeMap<String, String>) -> bool {
        if let Some(negated) = self.name.strip_prefix('!') {
            return !properties.contains_key(negated);
        }
        match (&self.value, properties.get(&self.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => match expected.strip_prefix('!') {
                Some(not) => actual != not,
                None => actual == expected,
            },
        }
    }
}

/// Everything that decides which profiles are active for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationContext {
    /// Profiles requested explicitly. A non-empty list activates exactly these.
    pub active_profiles: Vec<String>,
    /// User properties checked by `<activation><property>`.
    pub user_properties: BTreeMap<String, String>,
}

impl ActivationContext {
    pub fn new(active_profiles: Vec<String>, user_properties: BTreeMap<String, String>) -> Self {
        Self {
            active_profiles,
            user_properties,
        }
    }

    /// The profiles of one document that are active in this context.
    ///
    /// An explicit list wins outright. Otherwise property-activated profiles
    /// apply, and `activeByDefault` profiles apply only when none of the
    /// document's profiles was activated by property.
    pub fn active<'a>(&self, profiles: &'a [Profile]) -> Vec<&'a Profile> {
        if !self.active_profiles.is_empty() {
            return profiles
                .iter()
                .filter(|p| self.active_profiles.iter().any(|id| id == &p.id))
                .collect();
        }
        let by_property: Vec<&Profile> = profiles
            .iter()
            .filter(|p| {
                p.activation
                    .property
                    .as_ref()
                    .is_some_and(|prop| prop.matches(&self.user_properties))
            })
            .collect();
        if !by_property.is_empty() {
            return by_property;
        }
        profiles
            .iter()
            .filter(|p| p.activation.active_by_default)
            .collect()
    }
}
