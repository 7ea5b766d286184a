//! Read-only traversal over the elements of a [`Document`].
//!
//! Every element kind is one variant of the closed [`Node`] enum and callers
//! dispatch with a single `match`; adding a kind is a compile error at every
//! exhaustive match. Results of the per-node callback are merged with the
//! [`Combine`] implementation of the callback's return type.

use crate::dependency::{Dependency, ManagedDependency, Plugin};
use crate::document::{Document, Repository};
use crate::profile::Profile;

/// One element of a document.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Property { name: &'a str, value: &'a str },
    Dependency(&'a Dependency),
    ManagedDependency(&'a ManagedDependency),
    Plugin(&'a Plugin),
    ManagedPlugin(&'a Plugin),
    Repository(&'a Repository),
    Module(&'a str),
    Profile(&'a Profile),
}

/// Where a node sits, passed by value to the callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodePath<'a> {
    /// Id of the enclosing `<profile>`, if any.
    pub profile: Option<&'a str>,
}

impl<'a> NodePath<'a> {
    pub fn root() -> Self {
        Self { profile: None }
    }

    pub fn in_profile(self, id: &'a str) -> Self {
        Self { profile: Some(id) }
    }

    pub fn is_in_profile(&self) -> bool {
        self.profile.is_some()
    }
}

/// Associative merge with an identity, chosen by the traversal result type.
pub trait Combine {
    fn empty() -> Self;
    fn combine(self, other: Self) -> Self;
}

/// `bool` combines with logical OR ("does any node ...").
impl Combine for bool {
    fn empty() -> Self {
        false
    }

    fn combine(self, other: Self) -> Self {
        self || other
    }
}

impl Combine for usize {
    fn empty() -> Self {
        0
    }

    fn combine(self, other: Self) -> Self {
        self + other
    }
}

impl<T> Combine for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Combine for () {
    fn empty() -> Self {}

    fn combine(self, _other: Self) -> Self {}
}

/// Visit every node of `doc` in document order, profiles last, and fold the
/// callback results.
pub fn fold<'a, T, F>(doc: &'a Document, mut f: F) -> T
where
    T: Combine,
    F: FnMut(Node<'a>, NodePath<'a>) -> T,
{
    let root = NodePath::root();
    let mut acc = T::empty();

    for (name, value) in &doc.properties {
        acc = acc.combine(f(Node::Property { name, value }, root));
    }
    for d in &doc.dependencies {
        acc = acc.combine(f(Node::Dependency(d), root));
    }
    for m in &doc.dependency_management {
        acc = acc.combine(f(Node::ManagedDependency(m), root));
    }
    for p in &doc.plugins {
        acc = acc.combine(f(Node::Plugin(p), root));
    }
    for p in &doc.plugin_management {
        acc = acc.combine(f(Node::ManagedPlugin(p), root));
    }
    for r in &doc.repositories {
        acc = acc.combine(f(Node::Repository(r), root));
    }
    for m in &doc.modules {
        acc = acc.combine(f(Node::Module(m), root));
    }
    for profile in &doc.profiles {
        acc = acc.combine(f(Node::Profile(profile), root));
        let path = root.in_profile(&profile.id);
        for (name, value) in &profile.properties {
            acc = acc.combine(f(Node::Property { name, value }, path));
        }
        for d in &profile.dependencies {
            acc = acc.combine(f(Node::Dependency(d), path));
        }
        for m in &profile.dependency_management {
            acc = acc.combine(f(Node::ManagedDependency(m), path));
        }
        for r in &profile.repositories {
            acc = acc.combine(f(Node::Repository(r), path));
        }
    }
    acc
}

/// Names referenced as `${name}` in a value-bearing node, outside profiles
/// or inside one of the `active` profiles.
pub fn property_references(doc: &Document, active: &[&Profile]) -> Vec<String> {
    fold(doc, |node, path| match node {
        _ if path
            .profile
            .is_some_and(|id| !active.iter().any(|p| p.id == id)) =>
        {
            Vec::new()
        }
        Node::Property { value, .. } => crate::properties::references(value),
        Node::Dependency(d) => d
            .version
            .as_deref()
            .map(crate::properties::references)
            .unwrap_or_default(),
        Node::ManagedDependency(m) => m
            .version
            .as_deref()
            .map(crate::properties::references)
            .unwrap_or_default(),
        Node::Plugin(p) | Node::ManagedPlugin(p) => p
            .version
            .as_deref()
            .map(crate::properties::references)
            .unwrap_or_default(),
        Node::Repository(r) => crate::properties::references(&r.url),
        Node::Module(_) | Node::Profile(_) => Vec::new(),
    })
}

/// Whether any dependency or managed dependency, including inside profiles,
/// satisfies `pred(groupId, artifactId)`.
pub fn uses_dependency<P>(doc: &Document, pred: P) -> bool
where
    P: Fn(&str, &str) -> bool,
{
    fold(doc, |node, _| match node {
        Node::Dependency(d) => pred(&d.group_id, &d.artifact_id),
        Node::ManagedDependency(m) => pred(&m.group_id, &m.artifact_id),
        Node::Property { .. }
        | Node::Plugin(_)
        | Node::ManagedPlugin(_)
        | Node::Repository(_)
        | Node::Module(_)
        | Node::Profile(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;

    fn sample() -> Document {
        let mut doc = Document::new("pom.xml", "app");
        doc.properties
            .insert("guava.version".to_string(), "32.0.0-jre".to_string());
        doc.dependencies.push(
            Dependency::new("com.google.guava", "guava").with_version("${guava.version}"),
        );
        let mut profile = Profile::new("ci");
        profile
            .dependencies
            .push(Dependency::new("org.slf4j", "slf4j-api").with_version("${slf4j.version}"));
        doc.profiles.push(profile);
        doc
    }

    #[test]
    fn count_nodes() {
        let doc = sample();
        let count: usize = fold(&doc, |_, _| 1);
        // property, dependency, profile, profile dependency
        assert_eq!(count, 4);
    }

    #[test]
    fn profile_nodes_carry_their_path() {
        let doc = sample();
        let in_profile: Vec<&str> = fold(&doc, |node, path| match (node, path.profile) {
            (Node::Dependency(d), Some(_)) => vec![d.artifact_id.as_str()],
            _ => Vec::new(),
        });
        assert_eq!(in_profile, vec!["slf4j-api"]);
    }

    #[test]
    fn collects_property_references() {
        let doc = sample();
        let refs = property_references(&doc, &doc.profiles.iter().collect::<Vec<_>>());
        assert_eq!(refs, vec!["guava.version", "slf4j.version"]);
        let refs = property_references(&doc, &[]);
        assert_eq!(refs, vec!["guava.version"]);
    }

    #[test]
    fn uses_dependency_sees_profiles() {
        let doc = sample();
        assert!(uses_dependency(&doc, |g, _| g == "org.slf4j"));
        assert!(!uses_dependency(&doc, |g, _| g == "junit"));
    }
}
