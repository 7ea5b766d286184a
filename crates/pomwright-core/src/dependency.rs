use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pomwright_util::errors::PomwrightError;

/// Packaging type assumed when a dependency omits `<type>`.
pub const DEFAULT_TYPE: &str = "jar";

/// Group assumed when a plugin omits `<groupId>`.
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// Maven dependency scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Test,
    Runtime,
    Provided,
    System,
    Import,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Test => "test",
            Scope::Runtime => "runtime",
            Scope::Provided => "provided",
            Scope::System => "system",
            Scope::Import => "import",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = PomwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "compile" => Ok(Scope::Compile),
            "test" => Ok(Scope::Test),
            "runtime" => Ok(Scope::Runtime),
            "provided" => Ok(Scope::Provided),
            "system" => Ok(Scope::System),
            "import" => Ok(Scope::Import),
            other => Err(PomwrightError::Generic {
                message: format!("Unknown dependency scope `{other}`"),
            }),
        }
    }
}

/// A transitive dependency to exclude. `*` is accepted for either part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        (self.group_id == "*" || self.group_id == group_id)
            && (self.artifact_id == "*" || self.artifact_id == artifact_id)
    }
}

/// Identity of a dependency inside a management table:
/// `(groupId, artifactId, classifier, type)` with the type default applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: Option<String>,
    pub type_: String,
}

impl DependencyKey {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: Option<&str>,
        type_: Option<&str>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: classifier.filter(|c| !c.is_empty()).map(str::to_string),
            type_: type_.unwrap_or(DEFAULT_TYPE).to_string(),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.type_)?;
        if let Some(ref c) = self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}

/// A dependency declared under `<dependencies>`.
///
/// Omitted fields stay `None` so that "not written" and "written with the
/// default value" remain distinguishable; see [`Dependency::effective_scope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    /// Unmodeled child elements, kept as XML text so they survive a rewrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_xml: Vec<String>,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            scope: None,
            type_: None,
            classifier: None,
            optional: false,
            exclusions: Vec::new(),
            extra_xml: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn effective_scope(&self) -> Scope {
        self.scope.unwrap_or_default()
    }

    pub fn effective_type(&self) -> &str {
        self.type_.as_deref().unwrap_or(DEFAULT_TYPE)
    }

    pub fn key(&self) -> DependencyKey {
        DependencyKey::new(
            &self.group_id,
            &self.artifact_id,
            self.classifier.as_deref(),
            self.type_.as_deref(),
        )
    }

    pub fn is(&self, group_id: &str, artifact_id: &str) -> bool {
        self.group_id == group_id && self.artifact_id == artifact_id
    }

    pub fn excludes(&self, group_id: &str, artifact_id: &str) -> bool {
        self.exclusions.iter().any(|e| e.matches(group_id, artifact_id))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(ref v) = self.version {
            write!(f, ":{v}")?;
        }
        Ok(())
    }
}

/// An entry under `<dependencyManagement><dependencies>`.
///
/// Same shape as [`Dependency`], but it only supplies defaults to plain
/// declarations that omit version, scope or type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    /// Unmodeled child elements, kept as XML text so they survive a rewrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_xml: Vec<String>,
}

impl ManagedDependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            scope: None,
            type_: None,
            classifier: None,
            exclusions: Vec::new(),
            extra_xml: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn key(&self) -> DependencyKey {
        DependencyKey::new(
            &self.group_id,
            &self.artifact_id,
            self.classifier.as_deref(),
            self.type_.as_deref(),
        )
    }

    /// BOM import: `type = pom` and `scope = import`.
    pub fn is_import(&self) -> bool {
        self.scope == Some(Scope::Import) && self.type_.as_deref() == Some("pom")
    }
}

impl fmt::Display for ManagedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(ref v) = self.version {
            write!(f, ":{v}")?;
        }
        Ok(())
    }
}

/// A `<plugin>` under `<build><plugins>` or `<build><pluginManagement>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Everything besides the coordinates (`<configuration>`, `<executions>`,
    /// ...) as XML text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_xml: Vec<String>,
}

impl Plugin {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            extra_xml: Vec::new(),
        }
    }

    /// `group:artifact` identity used by the plugin management table.
    pub fn key(&self) -> (String, String) {
        (self.group_id.clone(), self.artifact_id.clone())
    }
}
