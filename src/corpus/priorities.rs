//! Per-document import priorities: the visibility ranking used by the
//! resolver and the cache-key engine.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::model::{DocId, ImportPriorities};

use super::Corpus;

impl Corpus {
    /// Make sure a document's import priorities are computed. They are
    /// memoised on the document and dropped by `clear_caches` whenever
    /// the document is re-indexed.
    pub(crate) fn ensure_import_priorities(&mut self, doc: DocId) {
        let needs_compute = self
            .document(doc)
            .is_some_and(|document| document.import_priorities.is_none());
        if !needs_compute {
            return;
        }
        let priorities = self.compute_import_priorities(doc);
        if let Some(document) = self.document_mut(doc) {
            document.import_priorities = Some(priorities);
        }
    }

    /// Build the priority list and moniker map for a document.
    ///
    /// The document itself ranks 0. Monikered imports only contribute
    /// their moniker (first writer wins); non-monikered imports are
    /// expanded depth-first in declaration order, each newly seen
    /// document taking the next integer. Cycles are broken by the
    /// visited set: first seen wins.
    fn compute_import_priorities(&self, doc: DocId) -> ImportPriorities {
        let mut import_priority: IndexMap<DocId, u32> = IndexMap::new();
        let mut moniker_priority_map: HashMap<String, DocId> = HashMap::new();
        import_priority.insert(doc, 0);

        let Some(document) = self.document(doc) else {
            return ImportPriorities {
                import_priority,
                moniker_priority_map,
            };
        };

        // monikered imports are reachable only through their moniker
        for import in &document.imports {
            if let (Some(moniker), Some(import_doc)) = (&import.moniker, import.doc) {
                moniker_priority_map
                    .entry(moniker.clone())
                    .or_insert(import_doc);
            }
        }

        let mut visited: HashSet<DocId> = HashSet::from([doc]);
        let mut sequence = 1;
        for import in &document.imports {
            if import.moniker.is_none()
                && let Some(import_doc) = import.doc
            {
                sequence =
                    self.prioritize_imports(import_doc, &mut import_priority, &mut visited, sequence);
            }
        }

        tracing::trace!(
            doc = self.document(doc).map(|d| d.at_corpus_path()),
            priorities = import_priority.len(),
            monikers = moniker_priority_map.len(),
            "import priorities computed"
        );

        ImportPriorities {
            import_priority,
            moniker_priority_map,
        }
    }

    fn prioritize_imports(
        &self,
        doc: DocId,
        import_priority: &mut IndexMap<DocId, u32>,
        visited: &mut HashSet<DocId>,
        mut sequence: u32,
    ) -> u32 {
        if !visited.insert(doc) {
            return sequence;
        }
        import_priority.insert(doc, sequence);
        sequence += 1;

        if let Some(document) = self.document(doc) {
            for import in &document.imports {
                // a moniker on a sub-import stays local to the sub-document
                if import.moniker.is_some() {
                    continue;
                }
                if let Some(import_doc) = import.doc {
                    sequence = self.prioritize_imports(import_doc, import_priority, visited, sequence);
                }
            }
        }
        sequence
    }
}
