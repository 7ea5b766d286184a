use std::fmt;

use serde::Serialize;

use crate::document::DocumentId;

/// A non-fatal problem met while resolving a document.
///
/// Findings degrade the resolved view but never fail a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Finding {
    /// `${name}` was referenced but is defined nowhere in the chain.
    UnresolvedProperty { document: DocumentId, name: String },
    /// The parent is neither in the working set nor fetchable.
    ParentUnavailable {
        document: DocumentId,
        parent: String,
        reason: String,
    },
    /// An import-scoped BOM could not be fetched or resolved.
    ImportUnavailable {
        document: DocumentId,
        bom: String,
        reason: String,
    },
}

impl Finding {
    pub fn document(&self) -> &DocumentId {
        match self {
            Finding::UnresolvedProperty { document, .. }
            | Finding::ParentUnavailable { document, .. }
            | Finding::ImportUnavailable { document, .. } => document,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::UnresolvedProperty { document, name } => {
                write!(f, "{document}: unresolved property ${{{name}}}")
            }
            Finding::ParentUnavailable {
                document,
                parent,
                reason,
            } => write!(f, "{document}: parent {parent} unavailable ({reason})"),
            Finding::ImportUnavailable {
                document,
                bom,
                reason,
            } => write!(f, "{document}: imported BOM {bom} unavailable ({reason})"),
        }
    }
}
