//! Module graph of a working set: parent and aggregation edges between
//! documents that are both loaded.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use pomwright_core::document::DocumentId;

use crate::working_set::WorkingSet;

/// Edge label in the module graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleEdge {
    /// child -> parent
    Parent,
    /// aggregator -> module
    Aggregates,
}

/// Parent/child and aggregator/module relationships restricted to the
/// working set, backed by petgraph.
pub struct ModuleGraph {
    graph: DiGraph<DocumentId, ModuleEdge>,
    index: HashMap<DocumentId, NodeIndex>,
}

impl ModuleGraph {
    pub fn build(set: &WorkingSet) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for doc in set.iter() {
            let idx = graph.add_node(doc.id.clone());
            index.insert(doc.id.clone(), idx);
        }

        for doc in set.iter() {
            let from = index[&doc.id];
            if let Some(parent) = doc
                .parent
                .as_ref()
                .and_then(|p| set.find_by_coordinates(&p.coordinates()))
            {
                graph.add_edge(from, index[&parent.id], ModuleEdge::Parent);
            }

            let Some(dir) = doc.source_path.as_deref().and_then(Path::parent) else {
                continue;
            };
            for module in &doc.modules {
                let path = module_pom(dir, module);
                match set.find_by_path(&path) {
                    Some(target) => {
                        graph.add_edge(from, index[&target.id], ModuleEdge::Aggregates);
                    }
                    None => tracing::debug!("{}: module `{module}` is not loaded", doc.id),
                }
            }
        }
        Self { graph, index }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn neighbors(&self, id: &DocumentId, kind: ModuleEdge, dir: Direction) -> Vec<&DocumentId> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<(NodeIndex, &DocumentId)> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| *e.weight() == kind)
            .map(|e| {
                let other = if dir == Direction::Outgoing {
                    e.target()
                } else {
                    e.source()
                };
                (other, &self.graph[other])
            })
            .collect();
        // petgraph yields edges newest first; keep load order.
        out.sort_by_key(|(idx, _)| *idx);
        out.into_iter().map(|(_, id)| id).collect()
    }

    /// The in-set parent of `id`.
    pub fn parent_of(&self, id: &DocumentId) -> Option<&DocumentId> {
        self.neighbors(id, ModuleEdge::Parent, Direction::Outgoing)
            .into_iter()
            .next()
    }

    /// Documents whose in-set parent is `id`.
    pub fn children(&self, id: &DocumentId) -> Vec<&DocumentId> {
        self.neighbors(id, ModuleEdge::Parent, Direction::Incoming)
    }

    /// Documents listed under `<modules>` of `id`.
    pub fn modules(&self, id: &DocumentId) -> Vec<&DocumentId> {
        self.neighbors(id, ModuleEdge::Aggregates, Direction::Outgoing)
    }

    /// The furthest ancestor of `id` still in the working set (`id` itself
    /// when its parent is external or absent).
    pub fn root_for<'g>(&'g self, id: &'g DocumentId) -> &'g DocumentId {
        let mut current = id;
        let mut seen = HashSet::from([id]);
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            current = parent;
        }
        current
    }

    pub fn is_root(&self, id: &DocumentId) -> bool {
        self.root_for(id) == id
    }

    /// Documents without an in-set parent, in load order.
    pub fn roots(&self) -> Vec<&DocumentId> {
        self.graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .filter(|id| self.parent_of(id).is_none())
            .collect()
    }

    /// `id` and everything below it through child and module edges.
    pub fn subtree(&self, id: &DocumentId) -> Vec<&DocumentId> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some(idx) = queue.pop_front() {
            out.push(&self.graph[idx]);
            let below = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .filter(|e| *e.weight() == ModuleEdge::Parent)
                .map(|e| e.source())
                .chain(
                    self.graph
                        .edges_directed(idx, Direction::Outgoing)
                        .filter(|e| *e.weight() == ModuleEdge::Aggregates)
                        .map(|e| e.target()),
                );
            for next in below {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        out
    }

    /// Groups of documents whose in-set parent references form a loop.
    pub fn cycles(&self) -> Vec<Vec<DocumentId>> {
        let parents = self.graph.filter_map(
            |_, id| Some(id.clone()),
            |_, edge| (*edge == ModuleEdge::Parent).then_some(()),
        );
        tarjan_scc(&parents)
            .into_iter()
            .filter(|scc| scc.len() > 1 || parents.contains_edge(scc[0], scc[0]))
            .map(|scc| scc.into_iter().map(|idx| parents[idx].clone()).collect())
            .collect()
    }
}

/// The POM a `<module>` entry points at: a directory containing `pom.xml`,
/// or an explicit `.xml` file.
fn module_pom(dir: &Path, module: &str) -> PathBuf {
    let target = dir.join(module.trim());
    let file = if target.extension().is_some_and(|e| e == "xml") {
        target
    } else {
        target.join("pom.xml")
    };
    normalize(&file)
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
