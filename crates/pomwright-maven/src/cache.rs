//! Run-scoped artifact cache and the read-only local repository.
//!
//! [`SessionCache`] memoizes fetched documents and version listings for one
//! run. It is the only shared mutable state in the engine: reads take a
//! shared lock, and a put never replaces an existing entry, so concurrent
//! fetches of the same coordinate all observe the first stored value.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use pomwright_core::document::{Coordinates, Document};

use crate::pom;
use crate::repository::MavenRepository;

type VersionKey = (String, String);

/// In-memory, run-scoped cache of fetched documents and version listings.
///
/// Negative results are cached too: `Some(None)` from
/// [`SessionCache::document`] means "known to be unavailable".
#[derive(Debug, Default)]
pub struct SessionCache {
    documents: RwLock<HashMap<Coordinates, Option<Arc<Document>>>>,
    versions: RwLock<HashMap<VersionKey, Arc<Vec<String>>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, coords: &Coordinates) -> Option<Option<Arc<Document>>> {
        let hit = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(coords)
            .cloned();
        if hit.is_some() {
            tracing::debug!("Session cache hit for {coords}");
        }
        hit
    }

    /// Store a fetch result unless one is already present; returns the stored value.
    pub fn put_document(
        &self,
        coords: Coordinates,
        doc: Option<Arc<Document>>,
    ) -> Option<Arc<Document>> {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(coords)
            .or_insert(doc)
            .clone()
    }

    pub fn versions(&self, group_id: &str, artifact_id: &str) -> Option<Arc<Vec<String>>> {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(group_id.to_string(), artifact_id.to_string()))
            .cloned()
    }

    /// Store a version listing unless one is already present; returns the stored value.
    pub fn put_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        versions: Vec<String>,
    ) -> Arc<Vec<String>> {
        self.versions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((group_id.to_string(), artifact_id.to_string()))
            .or_insert_with(|| Arc::new(versions))
            .clone()
    }

    /// Number of cached documents, including negative entries.
    pub fn document_count(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Read-only view of a local Maven repository (`~/.m2/repository`).
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the POM for a coordinate inside the repository layout.
    pub fn pom_path(&self, coords: &Coordinates) -> PathBuf {
        self.root
            .join(MavenRepository::coordinate_path(
                &coords.group_id,
                &coords.artifact_id,
                &coords.version,
            ))
            .join(format!("{}-{}.pom", coords.artifact_id, coords.version))
    }

    /// Parse the locally installed POM, if any. Unreadable files are skipped.
    pub fn get_pom(&self, coords: &Coordinates) -> Option<Document> {
        let path = self.pom_path(coords);
        if !path.is_file() {
            return None;
        }
        let content = fs::read_to_string(&path).ok()?;
        match pom::parse_pom(&content, &coords.to_string()) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Ignoring unreadable local POM {}: {e}", path.display());
                None
            }
        }
    }

    /// Versions installed locally, from the version directory names.
    pub fn versions(&self, group_id: &str, artifact_id: &str) -> Vec<String> {
        let dir = self.root.join(group_id.replace('.', "/")).join(artifact_id);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut versions: Vec<String> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        versions.sort();
        versions
    }
}
