//! Documents, imports and per-document import priorities.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::folder::FolderId;
use super::object::ObjectId;

/// Identifier of a document in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An import statement: a corpus path, optionally introduced under a
/// moniker, wired to its document once loaded.
#[derive(Debug, Clone)]
pub struct Import {
    pub corpus_path: String,
    pub moniker: Option<String>,
    pub doc: Option<DocId>,
}

impl Import {
    pub fn new(corpus_path: impl Into<String>, moniker: Option<String>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
            moniker,
            doc: None,
        }
    }
}

/// The visibility ranking a document's imports induce.
///
/// `import_priority` orders every document reachable through non-monikered
/// imports, the document itself at 0; `moniker_priority_map` exposes the
/// first document imported under each moniker.
#[derive(Debug, Clone, Default)]
pub struct ImportPriorities {
    pub import_priority: IndexMap<DocId, u32>,
    pub moniker_priority_map: HashMap<String, DocId>,
}

/// One schema document: imports, top-level definitions and the state the
/// indexing pipeline keeps per document.
#[derive(Debug)]
pub struct Document {
    pub name: String,
    pub namespace: String,
    /// Folder path including the trailing slash, e.g. `/core/`.
    pub folder_path: String,
    pub folder: Option<FolderId>,
    pub imports: Vec<Import>,
    pub definitions: Vec<ObjectId>,
    /// Declared path inside the document -> definition. Rebuilt by the
    /// declaration pass.
    pub internal_declarations: IndexMap<String, ObjectId>,
    pub needs_indexing: bool,
    pub currently_indexing: bool,
    pub imports_indexed: bool,
    /// Cleared when integrity checking fails.
    pub is_valid: bool,
    /// Lazily computed, dropped whenever the document is re-indexed.
    pub import_priorities: Option<ImportPriorities>,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        folder_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            folder_path: folder_path.into(),
            folder: None,
            imports: Vec::new(),
            definitions: Vec::new(),
            internal_declarations: IndexMap::new(),
            needs_indexing: true,
            currently_indexing: false,
            imports_indexed: false,
            is_valid: true,
            import_priorities: None,
        }
    }

    /// Absolute corpus path of this document.
    pub fn at_corpus_path(&self) -> String {
        format!("{}:{}{}", self.namespace, self.folder_path, self.name)
    }

    /// Drop everything derived by indexing; the next pipeline run starts
    /// from the raw document.
    pub fn clear_caches(&mut self) {
        self.import_priorities = None;
        self.internal_declarations.clear();
    }

    /// Look up an object by its declared path inside this document.
    pub fn fetch_object_from_document_path(&self, object_path: &str) -> Option<ObjectId> {
        self.internal_declarations.get(object_path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_corpus_path() {
        let doc = Document::new("order.cdm.json", "local", "/core/");
        assert_eq!(doc.at_corpus_path(), "local:/core/order.cdm.json");
    }

    #[test]
    fn test_clear_caches_drops_derived_state() {
        let mut doc = Document::new("a.cdm.json", "local", "/");
        doc.import_priorities = Some(ImportPriorities::default());
        doc.internal_declarations
            .insert("Order".to_string(), ObjectId::new(0));

        doc.clear_caches();
        assert!(doc.import_priorities.is_none());
        assert!(doc.internal_declarations.is_empty());
    }
}
