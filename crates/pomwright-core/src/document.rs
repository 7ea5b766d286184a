//! The immutable build descriptor ("document") and its coordinates.
//!
//! Documents are produced by a reader (see `pomwright-maven::pom`) and never
//! mutated afterwards: every edit helper here takes `&self` and returns a new
//! [`Document`], so a working set can share them behind `Arc` across threads.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use pomwright_util::errors::PomwrightError;

use crate::dependency::{Dependency, DependencyKey, ManagedDependency, Plugin};
use crate::profile::Profile;

/// Opaque, stable identity of a document inside one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully specified `groupId:artifactId:version` coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:artifact:version"` into coordinates.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() == 3 && parts.iter().all(|p| !p.is_empty()) {
            Some(Self::new(parts[0], parts[1], parts[2]))
        } else {
            None
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Reference to a parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            relative_path: None,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

/// A remote repository declared under `<repositories>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            name: None,
        }
    }
}

/// One build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Location relative to the project root, used to resolve `<modules>`
    /// and `<relativePath>` hints.
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub group_id: Option<String>,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub dependency_management: Vec<ManagedDependency>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub plugin_management: Vec<Plugin>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    /// Unmodeled `<project>` children (`<name>`, `<scm>`, `<licenses>`, ...)
    /// as XML text, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_xml: Vec<String>,
    /// Unmodeled `<build>` children (`<finalName>`, `<resources>`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_extra_xml: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(id),
            source_path: None,
            group_id: None,
            artifact_id: artifact_id.into(),
            version: None,
            packaging: None,
            parent: None,
            properties: BTreeMap::new(),
            dependencies: Vec::new(),
            dependency_management: Vec::new(),
            plugins: Vec::new(),
            plugin_management: Vec::new(),
            repositories: Vec::new(),
            modules: Vec::new(),
            profiles: Vec::new(),
            extra_xml: Vec::new(),
            build_extra_xml: Vec::new(),
        }
    }

    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }

    /// Coordinates with parent fallbacks applied.
    ///
    /// Missing or empty parts are a structural error for this document.
    pub fn coordinates(&self) -> Result<Coordinates, PomwrightError> {
        let malformed = |message: &str| PomwrightError::MalformedCoordinates {
            document: self.id.to_string(),
            message: message.to_string(),
        };
        if self.artifact_id.trim().is_empty() {
            return Err(malformed("artifactId is missing"));
        }
        let group = self
            .effective_group_id()
            .filter(|g| !g.trim().is_empty())
            .ok_or_else(|| malformed("groupId is missing and there is no parent to inherit it from"))?;
        let version = self
            .effective_version()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| malformed("version is missing and there is no parent to inherit it from"))?;
        Ok(Coordinates::new(group, &self.artifact_id, version))
    }

    pub fn find_dependency(&self, group_id: &str, artifact_id: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.is(group_id, artifact_id))
    }

    pub fn find_managed(&self, key: &DependencyKey) -> Option<&ManagedDependency> {
        self.dependency_management.iter().find(|m| &m.key() == key)
    }

    /// A copy of this document with `name` set to `value`.
    pub fn with_property(&self, name: &str, value: &str) -> Document {
        let mut next = self.clone();
        next.properties.insert(name.to_string(), value.to_string());
        next
    }

    /// A copy of this document with `dependency` appended.
    pub fn with_dependency(&self, dependency: Dependency) -> Document {
        let mut next = self.clone();
        next.dependencies.push(dependency);
        next
    }

    /// A copy of this document with `managed` appended to dependency management.
    pub fn with_managed_dependency(&self, managed: ManagedDependency) -> Document {
        let mut next = self.clone();
        next.dependency_management.push(managed);
        next
    }

    /// A copy of this document with every dependency passed through `f`;
    /// `None` drops the dependency.
    pub fn map_dependencies<F>(&self, mut f: F) -> Document
    where
        F: FnMut(&Dependency) -> Option<Dependency>,
    {
        let mut next = self.clone();
        next.dependencies = self.dependencies.iter().filter_map(&mut f).collect();
        next
    }

    /// A copy of this document with every managed dependency passed through `f`.
    pub fn map_managed_dependencies<F>(&self, mut f: F) -> Document
    where
        F: FnMut(&ManagedDependency) -> Option<ManagedDependency>,
    {
        let mut next = self.clone();
        next.dependency_management = self
            .dependency_management
            .iter()
            .filter_map(&mut f)
            .collect();
        next
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.effective_group_id().unwrap_or("?"),
            self.artifact_id,
            self.effective_version().unwrap_or("?")
        )
    }
}
