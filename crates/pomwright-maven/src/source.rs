//! Collaborators that supply documents and version listings from outside
//! the working set.
//!
//! The resolver only sees the [`ArtifactSource`] traits. [`RemoteSource`]
//! talks to Maven repositories, [`StaticSource`] serves a fixed in-memory
//! catalog, and [`CachedSource`] memoizes any source in a [`SessionCache`].

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::blocking::Client;

use pomwright_core::document::{Coordinates, Document};

use crate::cache::{LocalRepository, SessionCache};
use crate::download;
use crate::metadata::{self, MavenMetadata};
use crate::pom;
use crate::repository::MavenRepository;

/// Fetches documents that are not part of the working set (external parents, BOMs).
pub trait DocumentSource: Send + Sync {
    /// `Ok(None)` means the coordinate does not exist in any repository.
    fn fetch_document(&self, coords: &Coordinates) -> miette::Result<Option<Arc<Document>>>;
}

/// Lists the published versions of an artifact.
pub trait VersionSource: Send + Sync {
    fn fetch_versions(&self, group_id: &str, artifact_id: &str) -> miette::Result<Vec<String>>;
}

/// Both collaborators at once.
pub trait ArtifactSource: DocumentSource + VersionSource {}

impl<T: DocumentSource + VersionSource> ArtifactSource for T {}

/// A fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: HashMap<Coordinates, Arc<Document>>,
    versions: HashMap<(String, String), Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its own coordinates. Documents without
    /// complete coordinates are skipped with a warning.
    pub fn with_document(mut self, doc: Document) -> Self {
        match doc.coordinates() {
            Ok(coords) => {
                self.documents.insert(coords, Arc::new(doc));
            }
            Err(e) => tracing::warn!("Not registering {}: {e}", doc.id),
        }
        self
    }

    pub fn with_versions(mut self, group_id: &str, artifact_id: &str, versions: &[&str]) -> Self {
        self.versions.insert(
            (group_id.to_string(), artifact_id.to_string()),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

impl DocumentSource for StaticSource {
    fn fetch_document(&self, coords: &Coordinates) -> miette::Result<Option<Arc<Document>>> {
        Ok(self.documents.get(coords).cloned())
    }
}

impl VersionSource for StaticSource {
    fn fetch_versions(&self, group_id: &str, artifact_id: &str) -> miette::Result<Vec<String>> {
        Ok(self
            .versions
            .get(&(group_id.to_string(), artifact_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Memoizes another source for the duration of a run.
///
/// Errors are not cached, so a transient failure is retried on next use.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache: Arc<SessionCache>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, cache: Arc<SessionCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }
}

impl<S: DocumentSource> DocumentSource for CachedSource<S> {
    fn fetch_document(&self, coords: &Coordinates) -> miette::Result<Option<Arc<Document>>> {
        if let Some(hit) = self.cache.document(coords) {
            return Ok(hit);
        }
        let fetched = self.inner.fetch_document(coords)?;
        Ok(self.cache.put_document(coords.clone(), fetched))
    }
}

impl<S: VersionSource> VersionSource for CachedSource<S> {
    fn fetch_versions(&self, group_id: &str, artifact_id: &str) -> miette::Result<Vec<String>> {
        if let Some(hit) = self.cache.versions(group_id, artifact_id) {
            return Ok(hit.as_ref().clone());
        }
        let fetched = self.inner.fetch_versions(group_id, artifact_id)?;
        Ok(self
            .cache
            .put_versions(group_id, artifact_id, fetched)
            .as_ref()
            .clone())
    }
}

/// Fetches from the local repository first, then each remote repository in order.
pub struct RemoteSource {
    client: Client,
    repositories: Vec<MavenRepository>,
    local: Option<LocalRepository>,
}

impl RemoteSource {
    pub fn new(client: Client, repositories: Vec<MavenRepository>) -> Self {
        Self {
            client,
            repositories,
            local: None,
        }
    }

    pub fn with_local(mut self, local: LocalRepository) -> Self {
        self.local = Some(local);
        self
    }

    pub fn repositories(&self) -> &[MavenRepository] {
        &self.repositories
    }
}

impl DocumentSource for RemoteSource {
    fn fetch_document(&self, coords: &Coordinates) -> miette::Result<Option<Arc<Document>>> {
        if let Some(doc) = self.local.as_ref().and_then(|l| l.get_pom(coords)) {
            tracing::debug!("Using local POM for {coords}");
            return Ok(Some(Arc::new(doc)));
        }

        let mut last_err = None;
        for repo in &self.repositories {
            let url = repo.pom_url(&coords.group_id, &coords.artifact_id, &coords.version);
            match download::download_text(&self.client, repo, &url) {
                Ok(Some(xml)) => {
                    tracing::debug!("Fetched {coords} from {}", repo.id);
                    let doc = pom::parse_pom(&xml, &coords.to_string())?;
                    return Ok(Some(Arc::new(doc)));
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("{}: {e}", repo.id);
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

impl VersionSource for RemoteSource {
    fn fetch_versions(&self, group_id: &str, artifact_id: &str) -> miette::Result<Vec<String>> {
        let mut merged = MavenMetadata::default();
        let mut last_err = None;
        let mut found = false;
        for repo in &self.repositories {
            let url = repo.metadata_url(group_id, artifact_id);
            match download::download_text(&self.client, repo, &url) {
                Ok(Some(xml)) => {
                    merged.merge(metadata::parse_metadata(&xml)?);
                    found = true;
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("{}: {e}", repo.id);
                    last_err = Some(e);
                }
            }
        }
        if let Some(local) = &self.local {
            for v in local.versions(group_id, artifact_id) {
                if !merged.versions.contains(&v) {
                    merged.versions.push(v);
                }
            }
        }
        match last_err {
            Some(e) if !found && merged.versions.is_empty() => Err(e),
            _ => Ok(merged.versions),
        }
    }
}
