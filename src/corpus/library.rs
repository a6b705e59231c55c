//! The canonical document registry and its work queues.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::model::{DocId, FolderId};
use crate::storage::index_key;

/// Registry of every document in the corpus, plus the queues the loader
/// and the indexing pipeline drain.
///
/// Paths are indexed case-insensitively. All mutation happens under the
/// corpus serial boundary, so members never tear; reads taken between
/// operations observe a consistent snapshot.
#[derive(Debug, Default)]
pub struct DocumentLibrary {
    /// Lowercased absolute path -> (folder, document).
    by_path: std::collections::HashMap<String, (FolderId, DocId)>,
    /// Every registered document, in registration order.
    all_documents: IndexSet<DocId>,
    /// Paths queued for loading.
    docs_not_loaded: IndexSet<String>,
    /// Pending-load gate: paths some task is already loading.
    docs_currently_loading: HashSet<String>,
    /// Paths that failed to load; not retried within a load cycle.
    docs_not_found: HashSet<String>,
    /// Documents whose `needs_indexing` flag is set.
    docs_not_indexed: IndexSet<DocId>,
}

impl DocumentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================
    // Canonical path registry
    // ============================================================

    pub fn add_document_path(&mut self, absolute_path: &str, folder: FolderId, doc: DocId) {
        self.by_path.insert(index_key(absolute_path), (folder, doc));
        self.all_documents.insert(doc);
        self.docs_not_indexed.insert(doc);
    }

    pub fn remove_document_path(&mut self, absolute_path: &str, doc: DocId) {
        self.by_path.remove(&index_key(absolute_path));
        self.all_documents.shift_remove(&doc);
        self.docs_not_indexed.shift_remove(&doc);
    }

    pub fn lookup(&self, absolute_path: &str) -> Option<(FolderId, DocId)> {
        self.by_path.get(&index_key(absolute_path)).copied()
    }

    pub fn contains_path(&self, absolute_path: &str) -> bool {
        self.by_path.contains_key(&index_key(absolute_path))
    }

    pub fn list_all_documents(&self) -> Vec<DocId> {
        self.all_documents.iter().copied().collect()
    }

    // ============================================================
    // Loading queue
    // ============================================================

    /// Queue a path for loading unless it is already present or has
    /// already failed this cycle.
    pub fn add_to_docs_not_loaded(&mut self, absolute_path: &str) {
        let key = index_key(absolute_path);
        if !self.by_path.contains_key(&key) && !self.docs_not_found.contains(&key) {
            self.docs_not_loaded.insert(key);
        }
    }

    pub fn list_docs_not_loaded(&self) -> Vec<String> {
        self.docs_not_loaded.iter().cloned().collect()
    }

    /// Claim a queued path for loading. Returns false when the path was
    /// loaded meanwhile or another task already claimed it, guaranteeing
    /// at most one adapter call per path and cycle.
    pub fn need_to_load_document(&mut self, absolute_path: &str) -> bool {
        let key = index_key(absolute_path);
        if self.by_path.contains_key(&key)
            || self.docs_not_found.contains(&key)
            || self.docs_currently_loading.contains(&key)
        {
            return false;
        }
        self.docs_currently_loading.insert(key)
    }

    /// Settle a claimed load: record the outcome and release the gate.
    /// Returns true when the document actually loaded.
    pub fn mark_document_as_loaded_or_failed(
        &mut self,
        absolute_path: &str,
        loaded: Option<DocId>,
        docs_now_loaded: &mut Vec<DocId>,
    ) -> bool {
        let key = index_key(absolute_path);
        self.docs_not_loaded.shift_remove(&key);
        self.docs_currently_loading.remove(&key);
        match loaded {
            Some(doc) => {
                docs_now_loaded.push(doc);
                true
            }
            None => {
                self.docs_not_found.insert(key);
                false
            }
        }
    }

    /// Forget previous load failures so a new load cycle may retry them.
    pub fn reset_load_failures(&mut self) {
        self.docs_not_found.clear();
    }

    // ============================================================
    // Indexing queue
    // ============================================================

    pub fn mark_for_indexing(&mut self, doc: DocId) {
        self.docs_not_indexed.insert(doc);
    }

    pub fn mark_as_indexed(&mut self, doc: DocId) {
        self.docs_not_indexed.shift_remove(&doc);
    }

    pub fn list_docs_not_indexed(&self) -> Vec<DocId> {
        self.docs_not_indexed.iter().copied().collect()
    }

    pub fn has_docs_not_indexed(&self) -> bool {
        !self.docs_not_indexed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_index_is_case_insensitive() {
        let mut library = DocumentLibrary::new();
        library.add_document_path("local:/Order.cdm.json", FolderId::new(0), DocId::new(0));
        assert!(library.contains_path("local:/order.CDM.json"));
        assert_eq!(
            library.lookup("LOCAL:/ORDER.CDM.JSON"),
            Some((FolderId::new(0), DocId::new(0)))
        );
    }

    #[test]
    fn test_need_to_load_claims_once() {
        let mut library = DocumentLibrary::new();
        library.add_to_docs_not_loaded("local:/a.cdm.json");

        assert!(library.need_to_load_document("local:/a.cdm.json"));
        // a second claim before settling is refused
        assert!(!library.need_to_load_document("local:/a.cdm.json"));
    }

    #[test]
    fn test_failed_paths_are_not_requeued() {
        let mut library = DocumentLibrary::new();
        library.add_to_docs_not_loaded("local:/missing.cdm.json");
        assert!(library.need_to_load_document("local:/missing.cdm.json"));

        let mut now_loaded = Vec::new();
        assert!(!library.mark_document_as_loaded_or_failed(
            "local:/missing.cdm.json",
            None,
            &mut now_loaded
        ));
        assert!(now_loaded.is_empty());

        // the failed path stays out of the queue for this cycle
        library.add_to_docs_not_loaded("local:/missing.cdm.json");
        assert!(library.list_docs_not_loaded().is_empty());

        library.reset_load_failures();
        library.add_to_docs_not_loaded("local:/missing.cdm.json");
        assert_eq!(library.list_docs_not_loaded().len(), 1);
    }

    #[test]
    fn test_indexing_queue() {
        let mut library = DocumentLibrary::new();
        library.add_document_path("local:/a.cdm.json", FolderId::new(0), DocId::new(3));
        assert_eq!(library.list_docs_not_indexed(), vec![DocId::new(3)]);

        library.mark_as_indexed(DocId::new(3));
        assert!(!library.has_docs_not_indexed());

        library.mark_for_indexing(DocId::new(3));
        assert_eq!(library.list_docs_not_indexed(), vec![DocId::new(3)]);
    }

    #[test]
    fn test_loaded_document_not_requeued_for_load() {
        let mut library = DocumentLibrary::new();
        library.add_document_path("local:/a.cdm.json", FolderId::new(0), DocId::new(0));
        library.add_to_docs_not_loaded("local:/a.cdm.json");
        assert!(library.list_docs_not_loaded().is_empty());
        assert!(!library.need_to_load_document("local:/a.cdm.json"));
    }
}
