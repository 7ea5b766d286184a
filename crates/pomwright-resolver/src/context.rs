//! Run-scoped resolution context.
//!
//! Holds the artifact collaborator, the property and profile settings, and a
//! cache of [`ResolvedModel`]s keyed by document identity. A cached model is
//! reused only while the document and every in-set ancestor or imported BOM
//! it was computed from are still the same `Arc` in the working set;
//! replacing any of them invalidates it implicitly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use pomwright_core::config::EngineConfig;
use pomwright_core::document::{Document, DocumentId};
use pomwright_core::profile::ActivationContext;
use pomwright_core::properties::PropertyResolver;
use pomwright_maven::source::ArtifactSource;

use crate::inheritance::{InheritanceResolver, ResolvedModel};
use crate::working_set::WorkingSet;

struct CachedModel {
    /// The document and its in-set sources as they were when resolved.
    inputs: Vec<Arc<Document>>,
    model: Arc<ResolvedModel>,
}

impl CachedModel {
    fn is_current(&self, set: &WorkingSet) -> bool {
        self.inputs
            .iter()
            .all(|input| set.get(&input.id).is_some_and(|now| Arc::ptr_eq(now, input)))
    }
}

pub struct ResolutionContext {
    source: Arc<dyn ArtifactSource>,
    properties: PropertyResolver,
    activation: ActivationContext,
    models: RwLock<HashMap<DocumentId, CachedModel>>,
}

impl ResolutionContext {
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            source,
            properties: PropertyResolver::default(),
            activation: ActivationContext::default(),
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &EngineConfig, source: Arc<dyn ArtifactSource>) -> Self {
        Self::new(source)
            .with_property_resolver(PropertyResolver::new(config.properties.max_passes))
            .with_activation(config.activation_context(&[]))
    }

    pub fn with_property_resolver(mut self, properties: PropertyResolver) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_activation(mut self, activation: ActivationContext) -> Self {
        self.activation = activation;
        self
    }

    pub fn source(&self) -> &dyn ArtifactSource {
        self.source.as_ref()
    }

    pub fn activation(&self) -> &ActivationContext {
        &self.activation
    }

    /// Published versions of `group_id:artifact_id`.
    pub fn versions(&self, group_id: &str, artifact_id: &str) -> miette::Result<Vec<String>> {
        self.source.fetch_versions(group_id, artifact_id)
    }

    /// The resolved model of `doc` within `set`, computed on first use.
    pub fn model(&self, doc: &Arc<Document>, set: &WorkingSet) -> miette::Result<Arc<ResolvedModel>> {
        {
            let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = models.get(&doc.id) {
                if Arc::ptr_eq(&cached.inputs[0], doc) && cached.is_current(set) {
                    tracing::debug!("Reusing resolved model for {}", doc.id);
                    return Ok(Arc::clone(&cached.model));
                }
            }
        }

        let resolver =
            InheritanceResolver::new(set, self.source.as_ref(), self.properties, &self.activation);
        let model = Arc::new(resolver.resolve(doc)?);
        let inputs = std::iter::once(Arc::clone(doc))
            .chain(model.sources.iter().cloned())
            .collect();
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                doc.id.clone(),
                CachedModel {
                    inputs,
                    model: Arc::clone(&model),
                },
            );
        Ok(model)
    }

    /// The model of the working-set document `id`.
    pub fn model_of(&self, id: &DocumentId, set: &WorkingSet) -> Option<miette::Result<Arc<ResolvedModel>>> {
        set.get(id).map(|doc| self.model(doc, set))
    }

    /// Drop the cached model of a deleted document.
    pub fn retire(&self, id: &DocumentId) {
        if self
            .models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
        {
            tracing::debug!("Retired resolved model for {id}");
        }
    }

    pub fn cached_models(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomwright_core::dependency::{DependencyKey, ManagedDependency, Scope};
    use pomwright_core::document::ParentRef;
    use pomwright_maven::source::StaticSource;

    fn set() -> WorkingSet {
        let mut parent = Document::new("parent", "parent");
        parent.group_id = Some("g".into());
        parent.version = Some("1".into());
        let mut child = Document::new("child", "child");
        child.parent = Some(ParentRef::new("g", "parent", "1"));
        WorkingSet::new([parent, child])
    }

    #[test]
    fn cached_until_an_ancestor_changes() {
        let ctx = ResolutionContext::new(Arc::new(StaticSource::new()));
        let mut set = set();
        let child_id = DocumentId::new("child");
        let first = ctx.model_of(&child_id, &set).unwrap().unwrap();
        let again = ctx.model_of(&child_id, &set).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let parent = set.get(&DocumentId::new("parent")).unwrap();
        let edited = parent.with_managed_dependency(ManagedDependency::new("x", "y").with_version("2"));
        set.replace(Arc::new(edited));
        let fresh = ctx.model_of(&child_id, &set).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert_eq!(fresh.managed.len(), 1);
    }

    #[test]
    fn cached_until_an_imported_bom_changes() {
        let mut bom = Document::new("bom", "bom");
        bom.group_id = Some("g".into());
        bom.version = Some("1".into());
        bom.packaging = Some("pom".into());
        let bom = bom.with_managed_dependency(ManagedDependency::new("x", "y").with_version("1.0"));
        let mut app = Document::new("app", "app");
        app.group_id = Some("g".into());
        app.version = Some("1".into());
        let app = app.with_managed_dependency(
            ManagedDependency::new("g", "bom")
                .with_version("1")
                .with_type("pom")
                .with_scope(Scope::Import),
        );
        let mut set = WorkingSet::new([bom, app]);
        let ctx = ResolutionContext::new(Arc::new(StaticSource::new()));
        let app_id = DocumentId::new("app");
        let key = DependencyKey::new("x", "y", None, None);
        let first = ctx.model_of(&app_id, &set).unwrap().unwrap();
        assert_eq!(first.managed_version(&key), Some("1.0"));

        let bom = set.get(&DocumentId::new("bom")).unwrap();
        let edited = bom.map_managed_dependencies(|m| Some(m.clone().with_version("2.0")));
        set.replace(Arc::new(edited));
        let fresh = ctx.model_of(&app_id, &set).unwrap().unwrap();
        assert_eq!(fresh.managed_version(&key), Some("2.0"));
    }

    #[test]
    fn retire_drops_the_entry() {
        let ctx = ResolutionContext::new(Arc::new(StaticSource::new()));
        let set = set();
        let id = DocumentId::new("parent");
        ctx.model_of(&id, &set).unwrap().unwrap();
        assert_eq!(ctx.cached_models(), 1);
        ctx.retire(&id);
        assert_eq!(ctx.cached_models(), 0);
    }
}
