use std::path::Path;
use std::sync::Arc;

use pomwright_core::document::{Coordinates, Document, DocumentId};

/// The documents loaded together in one invocation, in load order.
///
/// Documents are shared immutably; replacing one swaps the `Arc`, which is
/// what cached models are validated against.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    documents: Vec<Arc<Document>>,
}

impl WorkingSet {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: documents.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_shared(documents: Vec<Arc<Document>>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.iter()
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|d| d.id.clone()).collect()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Arc<Document>> {
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// The document whose own coordinates (parent fallbacks applied) are `coords`.
    pub fn find_by_coordinates(&self, coords: &Coordinates) -> Option<&Arc<Document>> {
        self.documents
            .iter()
            .find(|d| d.coordinates().is_ok_and(|c| &c == coords))
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&Arc<Document>> {
        self.documents
            .iter()
            .find(|d| d.source_path.as_deref() == Some(path))
    }

    /// Swap in a new version of a document. Returns the previous one.
    pub fn replace(&mut self, document: Arc<Document>) -> Option<Arc<Document>> {
        let slot = self.documents.iter_mut().find(|d| d.id == document.id)?;
        Some(std::mem::replace(slot, document))
    }

    pub fn remove(&mut self, id: &DocumentId) -> Option<Arc<Document>> {
        let idx = self.documents.iter().position(|d| &d.id == id)?;
        Some(self.documents.remove(idx))
    }

    pub fn into_documents(self) -> Vec<Arc<Document>> {
        self.documents
    }
}

impl FromIterator<Document> for WorkingSet {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, artifact: &str) -> Document {
        let mut d = Document::new(id, artifact);
        d.group_id = Some("com.example".into());
        d.version = Some("1.0".into());
        d
    }

    #[test]
    fn replace_keeps_position() {
        let mut set: WorkingSet = [doc("a", "a"), doc("b", "b")].into_iter().collect();
        let old = set.get(&DocumentId::new("a")).cloned().unwrap();
        let prev = set.replace(Arc::new(doc("a", "a2"))).unwrap();
        assert!(Arc::ptr_eq(&old, &prev));
        assert_eq!(set.ids(), vec![DocumentId::new("a"), DocumentId::new("b")]);
        assert!(set.replace(Arc::new(doc("zzz", "z"))).is_none());
    }

    #[test]
    fn lookup_by_coordinates() {
        let set = WorkingSet::new([doc("a", "a"), doc("b", "b")]);
        let found = set
            .find_by_coordinates(&Coordinates::new("com.example", "b", "1.0"))
            .unwrap();
        assert_eq!(found.id.as_str(), "b");
        assert!(set
            .find_by_coordinates(&Coordinates::new("com.example", "b", "2.0"))
            .is_none());
    }

    #[test]
    fn remove_retires_document() {
        let mut set = WorkingSet::new([doc("a", "a"), doc("b", "b")]);
        assert!(set.remove(&DocumentId::new("a")).is_some());
        assert!(!set.contains(&DocumentId::new("a")));
        assert_eq!(set.len(), 1);
    }
}
