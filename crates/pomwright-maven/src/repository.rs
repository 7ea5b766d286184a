//! Maven repository abstraction: URL layout and credentials.

use reqwest::blocking::RequestBuilder;

use pomwright_core::document::Repository;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Id Maven gives the implicit central repository.
pub const MAVEN_CENTRAL_ID: &str = "central";

/// A remote Maven repository with optional credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenRepository {
    pub id: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MavenRepository {
    pub fn new(id: impl Into<String>, url: &str) -> Self {
        Self {
            id: id.into(),
            url: url.trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    /// Build from a `<repository>` declared in a POM or settings profile.
    pub fn from_repository(repo: &Repository) -> Self {
        Self::new(&repo.id, &repo.url)
    }

    /// Construct the default Maven Central repository.
    pub fn maven_central() -> Self {
        Self::new(MAVEN_CENTRAL_ID, MAVEN_CENTRAL_URL)
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Standard Maven layout path for a given coordinate.
    ///
    /// `org.apache.logging.log4j:log4j-bom:2.17.2` becomes
    /// `org/apache/logging/log4j/log4j-bom/2.17.2`
    pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    /// URL to the POM file for a given coordinate.
    pub fn pom_url(&self, group: &str, artifact: &str, version: &str) -> String {
        format!(
            "{}/{}/{artifact}-{version}.pom",
            self.url,
            Self::coordinate_path(group, artifact, version)
        )
    }

    /// URL to the `maven-metadata.xml` at the artifact level (version listing).
    pub fn metadata_url(&self, group: &str, artifact: &str) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.url,
            group.replace('.', "/"),
            artifact
        )
    }

    /// Whether this repository has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// Attach `<server>` credentials to a request. A password without a
    /// username is sent as a bearer token.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), pass) => request.basic_auth(user, pass),
            (None, Some(token)) => request.bearer_auth(token),
            (None, None) => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_path_replaces_dots() {
        let path = MavenRepository::coordinate_path("org.apache.logging.log4j", "log4j-bom", "2.17.2");
        assert_eq!(path, "org/apache/logging/log4j/log4j-bom/2.17.2");
    }

    #[test]
    fn pom_url_format() {
        let repo = MavenRepository::maven_central();
        let url = repo.pom_url("org.apache.logging.log4j", "log4j-bom", "2.17.2");
        assert_eq!(
            url,
            "https://repo.maven.apache.org/maven2/org/apache/logging/log4j/log4j-bom/2.17.2/log4j-bom-2.17.2.pom"
        );
    }

    #[test]
    fn metadata_url_format() {
        let repo = MavenRepository::new("nexus", "https://nexus.example.com/repository/maven/");
        assert_eq!(
            repo.metadata_url("com.google.guava", "guava"),
            "https://nexus.example.com/repository/maven/com/google/guava/guava/maven-metadata.xml"
        );
    }

    #[test]
    fn from_pom_repository() {
        let repo = MavenRepository::from_repository(&Repository::new(
            "spring",
            "https://repo.spring.io/release/",
        ));
        assert_eq!(repo.url, "https://repo.spring.io/release");
        assert!(!repo.has_auth());
        let repo = repo.with_credentials(Some("u".into()), Some("p".into()));
        assert!(repo.has_auth());
    }
}
