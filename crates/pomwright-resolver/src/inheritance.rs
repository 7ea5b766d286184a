//! Parent-chain inheritance.
//!
//! [`InheritanceResolver::resolve`] walks a document's parents (taken from the
//! working set when present, fetched through the [`ArtifactSource`] otherwise)
//! and merges them nearest-first into a [`ResolvedModel`]:
//!
//! - properties: child shadows parent, then `${...}` substitution
//! - managed dependencies and plugins: keyed tables, nearest document wins,
//!   first declaration wins inside one document
//! - repositories: child entries first, parent entries appended, deduplicated by id
//!
//! Active profiles are folded into their declaring document before the chain
//! merge. Import-scoped BOMs are expanded after all explicit entries, so an
//! explicit entry anywhere in the chain beats an imported one.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use pomwright_core::dependency::{DependencyKey, ManagedDependency, Plugin};
use pomwright_core::document::{Coordinates, Document, DocumentId, Repository};
use pomwright_core::finding::Finding;
use pomwright_core::profile::ActivationContext;
use pomwright_core::properties::{self, PropertyResolver, ResolvedProperties};
use pomwright_core::visit;
use pomwright_maven::source::ArtifactSource;
use pomwright_util::errors::PomwrightError;

use crate::working_set::WorkingSet;

/// One ancestor in a materialized parent chain.
#[derive(Debug, Clone)]
pub enum ChainEntry {
    InWorkingSet(Arc<Document>),
    External(Arc<Document>),
    /// Neither in the working set nor fetchable. Always the last entry.
    Unavailable {
        coordinates: Coordinates,
        reason: String,
    },
}

impl ChainEntry {
    pub fn document(&self) -> Option<&Arc<Document>> {
        match self {
            ChainEntry::InWorkingSet(doc) | ChainEntry::External(doc) => Some(doc),
            ChainEntry::Unavailable { .. } => None,
        }
    }

    pub fn is_in_working_set(&self) -> bool {
        matches!(self, ChainEntry::InWorkingSet(_))
    }
}

/// A managed dependency as it applies to the resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedEntry {
    /// The entry as declared.
    pub dependency: ManagedDependency,
    /// `dependency.version` with properties substituted.
    pub version: Option<String>,
    pub declared_in: DocumentId,
    /// 0 for the resolved document itself, 1 for its parent, ...
    pub depth: usize,
    /// The BOM this entry came from, for imported entries.
    pub imported_from: Option<Coordinates>,
}

#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub document: DocumentId,
    pub properties: ResolvedProperties,
    pub managed: BTreeMap<DependencyKey, ManagedEntry>,
    pub managed_plugins: BTreeMap<(String, String), Plugin>,
    pub repositories: Vec<Repository>,
    /// BOMs whose management was merged in, in import order.
    pub imports: Vec<Coordinates>,
    /// Ancestors nearest first.
    pub chain: Vec<ChainEntry>,
    /// Working-set documents besides the resolved one that this model was
    /// computed from: in-set ancestors and imported in-set BOMs, transitively.
    pub sources: Vec<Arc<Document>>,
    pub findings: Vec<Finding>,
}

impl ResolvedModel {
    pub fn managed_for(&self, key: &DependencyKey) -> Option<&ManagedEntry> {
        self.managed.get(key)
    }

    pub fn managed_version(&self, key: &DependencyKey) -> Option<&str> {
        self.managed_for(key).and_then(|e| e.version.as_deref())
    }

    /// Ancestors that are part of the working set, nearest first.
    pub fn in_set_ancestors(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.chain
            .iter()
            .filter(|e| e.is_in_working_set())
            .filter_map(ChainEntry::document)
    }

    /// False when some ancestor could not be obtained.
    pub fn parent_available(&self) -> bool {
        !matches!(self.chain.last(), Some(ChainEntry::Unavailable { .. }))
    }
}

/// A document with its active profiles folded in.
struct Layer<'d> {
    id: &'d DocumentId,
    properties: BTreeMap<String, String>,
    managed: Vec<ManagedDependency>,
    plugin_management: &'d [Plugin],
    repositories: Vec<Repository>,
}

impl<'d> Layer<'d> {
    fn of(doc: &'d Document, activation: &ActivationContext) -> Self {
        let mut layer = Layer {
            id: &doc.id,
            properties: doc.properties.clone(),
            managed: doc.dependency_management.clone(),
            plugin_management: &doc.plugin_management,
            repositories: doc.repositories.clone(),
        };
        for profile in activation.active(&doc.profiles) {
            tracing::debug!("Profile `{}` is active for {}", profile.id, doc.id);
            layer
                .properties
                .extend(profile.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            for m in &profile.dependency_management {
                let key = m.key();
                match layer.managed.iter_mut().find(|e| e.key() == key) {
                    Some(slot) => *slot = m.clone(),
                    None => layer.managed.push(m.clone()),
                }
            }
            for r in &profile.repositories {
                match layer.repositories.iter_mut().find(|e| e.id == r.id) {
                    Some(slot) => *slot = r.clone(),
                    None => layer.repositories.push(r.clone()),
                }
            }
        }
        layer
    }
}

/// Computes [`ResolvedModel`]s against one working set.
pub struct InheritanceResolver<'a> {
    working_set: &'a WorkingSet,
    source: &'a dyn ArtifactSource,
    properties: PropertyResolver,
    activation: &'a ActivationContext,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(
        working_set: &'a WorkingSet,
        source: &'a dyn ArtifactSource,
        properties: PropertyResolver,
        activation: &'a ActivationContext,
    ) -> Self {
        Self {
            working_set,
            source,
            properties,
            activation,
        }
    }

    /// Materialize the parent chain of `doc`, nearest first.
    ///
    /// A parent that cannot be obtained ends the chain with
    /// [`ChainEntry::Unavailable`]. A parent reference that loops back is a
    /// [`PomwrightError::ParentCycle`].
    pub fn parent_chain(&self, doc: &Document) -> miette::Result<Vec<ChainEntry>> {
        let mut seen = vec![doc.coordinates()?];
        let mut chain = Vec::new();
        let mut next = doc.parent.clone();

        while let Some(parent) = next.take() {
            let coords = parent.coordinates();
            if seen.contains(&coords) {
                let mut cycle: Vec<String> = seen.iter().map(ToString::to_string).collect();
                cycle.push(coords.to_string());
                return Err(PomwrightError::ParentCycle {
                    document: doc.id.to_string(),
                    cycle,
                }
                .into());
            }
            seen.push(coords.clone());

            let entry = match self.working_set.find_by_coordinates(&coords) {
                Some(in_set) => ChainEntry::InWorkingSet(Arc::clone(in_set)),
                None => match self.source.fetch_document(&coords) {
                    Ok(Some(external)) => ChainEntry::External(external),
                    Ok(None) => ChainEntry::Unavailable {
                        coordinates: coords,
                        reason: "not found in any repository".to_string(),
                    },
                    Err(e) => ChainEntry::Unavailable {
                        coordinates: coords,
                        reason: e.to_string(),
                    },
                },
            };
            next = entry.document().and_then(|d| d.parent.clone());
            chain.push(entry);
        }
        Ok(chain)
    }

    pub fn resolve(&self, doc: &Arc<Document>) -> miette::Result<ResolvedModel> {
        let mut importing = vec![doc.coordinates()?];
        self.resolve_importing(doc, &mut importing)
    }

    fn resolve_importing(
        &self,
        doc: &Arc<Document>,
        importing: &mut Vec<Coordinates>,
    ) -> miette::Result<ResolvedModel> {
        let chain = self.parent_chain(doc)?;
        let mut findings = Vec::new();
        for entry in &chain {
            if let ChainEntry::Unavailable {
                coordinates,
                reason,
            } = entry
            {
                tracing::warn!("{}: parent {coordinates} unavailable ({reason})", doc.id);
                findings.push(Finding::ParentUnavailable {
                    document: doc.id.clone(),
                    parent: coordinates.to_string(),
                    reason: reason.clone(),
                });
            }
        }

        let layers: Vec<Layer<'_>> = std::iter::once(&**doc)
            .chain(chain.iter().filter_map(|e| e.document().map(|d| &**d)))
            .map(|d| Layer::of(d, self.activation))
            .collect();

        let implicit = properties::implicit_properties(doc);
        let mut tables: Vec<&BTreeMap<String, String>> =
            layers.iter().map(|l| &l.properties).collect();
        tables.push(&implicit);
        let resolved = self.properties.resolve_layers(doc.id.as_str(), &tables)?;

        let unresolved: BTreeSet<String> = resolved
            .unresolved
            .iter()
            .cloned()
            .chain(
                visit::property_references(doc, &self.activation.active(&doc.profiles))
                    .into_iter()
                    .filter(|name| resolved.get(name).is_none()),
            )
            .collect();
        for name in unresolved {
            tracing::warn!("{}: unresolved property ${{{name}}}", doc.id);
            findings.push(Finding::UnresolvedProperty {
                document: doc.id.clone(),
                name,
            });
        }

        let mut managed = BTreeMap::new();
        let mut pending_imports = Vec::new();
        for (depth, layer) in layers.iter().enumerate() {
            for m in &layer.managed {
                if m.is_import() {
                    pending_imports.push((depth, m));
                    continue;
                }
                managed
                    .entry(interpolated_key(m, &resolved))
                    .or_insert_with(|| ManagedEntry {
                        dependency: m.clone(),
                        version: m.version.as_deref().map(|v| resolved.expand(v)),
                        declared_in: layer.id.clone(),
                        depth,
                        imported_from: None,
                    });
            }
        }

        let mut sources: Vec<Arc<Document>> = chain
            .iter()
            .filter(|e| e.is_in_working_set())
            .filter_map(ChainEntry::document)
            .cloned()
            .collect();
        let mut imports = Vec::new();
        for (depth, import) in pending_imports {
            let coords = Coordinates::new(
                resolved.expand(&import.group_id),
                resolved.expand(&import.artifact_id),
                import
                    .version
                    .as_deref()
                    .map(|v| resolved.expand(v))
                    .unwrap_or_default(),
            );
            match self.import_bom(&coords, importing) {
                Ok((bom, in_set)) => {
                    sources.extend(in_set);
                    sources.extend(bom.sources.iter().cloned());
                    tracing::debug!("{}: importing {} entries from {coords}", doc.id, bom.managed.len());
                    for (key, entry) in bom.managed {
                        managed.entry(key).or_insert(ManagedEntry {
                            depth,
                            imported_from: Some(coords.clone()),
                            ..entry
                        });
                    }
                    imports.push(coords);
                }
                Err(reason) => {
                    tracing::warn!("{}: imported BOM {coords} unavailable ({reason})", doc.id);
                    findings.push(Finding::ImportUnavailable {
                        document: doc.id.clone(),
                        bom: coords.to_string(),
                        reason,
                    });
                }
            }
        }

        let mut managed_plugins = BTreeMap::new();
        for layer in &layers {
            for p in layer.plugin_management {
                managed_plugins.entry(p.key()).or_insert_with(|| Plugin {
                    version: p.version.as_deref().map(|v| resolved.expand(v)),
                    ..p.clone()
                });
            }
        }

        let mut seen = HashSet::new();
        let mut repositories = Vec::new();
        for layer in &layers {
            for r in &layer.repositories {
                if seen.insert(r.id.clone()) {
                    repositories.push(Repository {
                        url: resolved.expand(&r.url),
                        ..r.clone()
                    });
                }
            }
        }

        Ok(ResolvedModel {
            document: doc.id.clone(),
            properties: resolved,
            managed,
            managed_plugins,
            repositories,
            imports,
            chain,
            sources,
            findings,
        })
    }

    /// Resolve a BOM for import, along with the BOM document when it is part
    /// of the working set. Failures are reasons, not errors.
    fn import_bom(
        &self,
        coords: &Coordinates,
        importing: &mut Vec<Coordinates>,
    ) -> Result<(ResolvedModel, Option<Arc<Document>>), String> {
        if coords.version.is_empty() || !properties::references(&coords.version).is_empty() {
            return Err("version is not resolved".to_string());
        }
        if importing.contains(coords) {
            let mut cycle: Vec<String> = importing.iter().map(ToString::to_string).collect();
            cycle.push(coords.to_string());
            return Err(format!("import cycle {}", cycle.join(" -> ")));
        }
        let in_set = self.working_set.find_by_coordinates(coords).map(Arc::clone);
        let bom = match in_set {
            Some(ref bom) => Arc::clone(bom),
            None => match self.source.fetch_document(coords) {
                Ok(Some(fetched)) => fetched,
                Ok(None) => return Err("not found in any repository".to_string()),
                Err(e) => return Err(e.to_string()),
            },
        };
        importing.push(coords.clone());
        let model = self.resolve_importing(&bom, importing);
        importing.pop();
        model.map(|m| (m, in_set)).map_err(|e| e.to_string())
    }
}

fn interpolated_key(m: &ManagedDependency, properties: &ResolvedProperties) -> DependencyKey {
    let classifier = m.classifier.as_deref().map(|c| properties.expand(c));
    let type_ = m.type_.as_deref().map(|t| properties.expand(t));
    DependencyKey::new(
        properties.expand(&m.group_id),
        properties.expand(&m.artifact_id),
        classifier.as_deref(),
        type_.as_deref(),
    )
}
