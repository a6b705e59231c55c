//! Loading: resolving corpus paths into folders, documents and objects.
//!
//! Adapter reads fan out one task per missing document and the batch is
//! awaited as a whole; materialization and registration happen serially
//! under the corpus. Rounds repeat until the not-loaded queue drains.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::task::JoinHandle;

use crate::core::StatusLevel;
use crate::error::{CdmError, CdmResult};
use crate::model::{DocId, FolderId, ObjectId};
use crate::persistence::{CDM_EXTENSION, materialize_document};
use crate::resolve::ResolveOptions;
use crate::storage::{PathAnchor, StorageAdapter};

use super::Corpus;

/// What a corpus path resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusObject {
    Folder(FolderId),
    Document(DocId),
    Object(ObjectId),
}

impl CorpusObject {
    pub fn as_object(self) -> Option<ObjectId> {
        match self {
            CorpusObject::Object(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_document(self) -> Option<DocId> {
        match self {
            CorpusObject::Document(id) => Some(id),
            _ => None,
        }
    }
}

struct PendingLoad {
    absolute: String,
    folder: FolderId,
    namespace: String,
    folder_path: String,
    doc_name: String,
    handle: JoinHandle<CdmResult<Vec<u8>>>,
}

impl Corpus {
    /// Fetch an object by corpus path, loading and indexing the owning
    /// document (and its imports) as needed.
    ///
    /// Failures are reported through the event callback and yield `None`.
    pub async fn fetch_object(
        &mut self,
        object_path: &str,
        anchor: Option<ObjectId>,
        shallow_validation: bool,
    ) -> Option<CorpusObject> {
        let anchor_info = anchor.and_then(|anchor_object| {
            let doc = self.object(anchor_object)?.in_document?;
            let document = self.document(doc)?;
            Some((document.namespace.clone(), document.folder_path.clone()))
        });
        let absolute = match self.storage().create_absolute_corpus_path(
            object_path,
            anchor_info.as_ref().map(|(namespace, folder_path)| PathAnchor {
                namespace,
                folder_path,
            }),
        ) {
            Ok(absolute) => absolute,
            Err(error) => {
                self.report_error(&error, Some(object_path));
                return None;
            }
        };

        // the document path ends at the extension; anything after it is a
        // path within the document
        let mut document_path = absolute.clone();
        let mut document_name_end = None;
        if let Some(index) = absolute.rfind(CDM_EXTENSION) {
            let end = index + CDM_EXTENSION.len();
            document_name_end = Some(end);
            document_path = absolute[..end].to_string();
        }

        tracing::debug!(path = %object_path, "request object");

        match self.load_folder_or_document(&document_path, false).await? {
            CorpusObject::Folder(folder) => {
                (document_path == absolute).then_some(CorpusObject::Folder(folder))
            }
            CorpusObject::Document(doc) => {
                // get imports and index the document before looking inside
                if !self.index_if_needed(doc, shallow_validation).await {
                    return None;
                }
                if document_path == absolute {
                    return Some(CorpusObject::Document(doc));
                }
                let end = document_name_end?;
                let remaining = absolute.get(end + 1..)?;
                let found = self
                    .document(doc)?
                    .fetch_object_from_document_path(remaining);
                if found.is_none() {
                    self.report(
                        StatusLevel::Error,
                        &format!(
                            "could not find symbol '{remaining}' in document '{document_path}'"
                        ),
                        Some(&absolute),
                    );
                }
                found.map(CorpusObject::Object)
            }
            CorpusObject::Object(_) => None,
        }
    }

    /// Walk the folder tree as far as it exists and resolve the path into
    /// a folder or a document, reading and materializing the document
    /// when it is not registered yet.
    pub(crate) async fn load_folder_or_document(
        &mut self,
        object_path: &str,
        force_reload: bool,
    ) -> Option<CorpusObject> {
        if object_path.trim().is_empty() {
            return None;
        }
        let (namespace, path) = match self.storage().resolve_namespace(object_path) {
            Ok((namespace, path)) => (namespace.to_string(), path.to_string()),
            Err(error) => {
                self.report_error(&error, Some(object_path));
                return None;
            }
        };
        if !path.starts_with('/') {
            return None;
        }
        let root = match self.fetch_root_folder(&namespace) {
            Ok(root) => root,
            Err(error) => {
                self.report_error(&error, Some(object_path));
                return None;
            }
        };

        // maybe the search is for a folder: go as far as possible without
        // creating anything
        let deepest = self.folders.fetch_child_folder_from_path(root, &path);
        let deepest_path = self.folders.get(deepest)?.folder_path.clone();
        if deepest_path == path {
            return Some(CorpusObject::Folder(deepest));
        }

        // a document: its folder materializes on demand
        let (folder_part, doc_name) = crate::storage::split_folder_and_name(&path);
        let absolute = format!("{namespace}:{path}");
        if doc_name.is_empty() {
            self.report_error(&CdmError::NotFound(absolute.clone()), None);
            return None;
        }
        let Some(folder) = self.folders.ensure_path(root, folder_part) else {
            self.report_error(&CdmError::NotFound(absolute.clone()), None);
            return None;
        };
        let folder_path = folder_part.to_string();

        if let Some((existing_folder, existing_doc)) = self.library.lookup(&absolute) {
            if !force_reload {
                return Some(CorpusObject::Document(existing_doc));
            }
            self.remove_document_objects(existing_folder, existing_doc);
        }

        if !self.library.need_to_load_document(&absolute) {
            return None;
        }
        let adapter = match self.storage().fetch_adapter(&namespace) {
            Ok(adapter) => adapter,
            Err(error) => {
                self.report_error(&error, Some(&absolute));
                let mut ignored = Vec::new();
                self.library
                    .mark_document_as_loaded_or_failed(&absolute, None, &mut ignored);
                return None;
            }
        };

        let doc_name = doc_name.to_string();
        let loaded = match adapter.read(&path).await {
            Ok(bytes) => {
                match materialize_document(&mut self.objects, &doc_name, &namespace, &folder_path, &bytes)
                {
                    Ok(doc) => Some(self.add_document(folder, doc)),
                    Err(error) => {
                        self.report_error(&error, Some(&absolute));
                        None
                    }
                }
            }
            Err(error) => {
                self.report_error(&error, Some(&absolute));
                None
            }
        };

        let mut ignored = Vec::new();
        self.library
            .mark_document_as_loaded_or_failed(&absolute, loaded, &mut ignored);
        loaded.map(CorpusObject::Document)
    }

    /// Re-read a document from its adapter, replacing the registered
    /// copy under a fresh id. Importers pick the new copy up the next
    /// time they index.
    pub async fn reload_document(&mut self, corpus_path: &str) -> Option<DocId> {
        let absolute = match self.storage().create_absolute_corpus_path(corpus_path, None) {
            Ok(absolute) => absolute,
            Err(error) => {
                self.report_error(&error, Some(corpus_path));
                return None;
            }
        };
        // paths that failed earlier are fair game again
        self.library.reset_load_failures();
        match self.load_folder_or_document(&absolute, true).await {
            Some(CorpusObject::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    /// Make sure a document and its transitive imports are loaded and the
    /// dirty set is indexed. Returns false when the document failed.
    pub(crate) async fn index_if_needed(&mut self, doc: DocId, shallow_validation: bool) -> bool {
        let needs_indexing = self
            .document(doc)
            .is_some_and(|document| document.needs_indexing);
        if needs_indexing {
            self.resolve_imports(doc).await;
            let res_opt = ResolveOptions {
                wrt_doc: Some(doc),
                shallow_validation,
                ..ResolveOptions::default()
            };
            self.index_documents(&res_opt);
        }
        self.document(doc).is_some_and(|document| document.is_valid)
    }

    /// Queue a document's missing imports, drain the load queue and wire
    /// the import links.
    pub(crate) async fn resolve_imports(&mut self, doc: DocId) {
        self.find_missing_imports(doc);
        self.load_imports().await;
        self.set_import_documents(doc);
    }

    /// Queue the imports of a document whose targets are not loaded yet.
    pub(crate) fn find_missing_imports(&mut self, doc: DocId) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let namespace = document.namespace.clone();
        let folder_path = document.folder_path.clone();
        let imports: Vec<(String, Option<DocId>)> = document
            .imports
            .iter()
            .map(|import| (import.corpus_path.clone(), import.doc))
            .collect();

        for (corpus_path, linked) in imports {
            if linked.is_some_and(|linked_doc| self.document(linked_doc).is_some()) {
                continue;
            }
            let anchor = PathAnchor {
                namespace: &namespace,
                folder_path: &folder_path,
            };
            match self
                .storage()
                .create_absolute_corpus_path(&corpus_path, Some(anchor))
            {
                Ok(absolute) => self.library.add_to_docs_not_loaded(&absolute),
                Err(error) => self.report_error(&error, Some(&corpus_path)),
            }
        }
    }

    /// Drain the not-loaded queue: one read task per claimed path, await
    /// the batch, register the results, discover new imports and repeat
    /// until fixpoint.
    async fn load_imports(&mut self) {
        loop {
            if self.cancellation_token().is_cancelled() {
                tracing::debug!("import loading cancelled");
                return;
            }

            let claimed: Vec<String> = self
                .library
                .list_docs_not_loaded()
                .into_iter()
                .filter(|path| self.library.need_to_load_document(path))
                .collect();
            if claimed.is_empty() {
                return;
            }

            let mut docs_now_loaded: Vec<DocId> = Vec::new();
            let mut pending: Vec<PendingLoad> = Vec::new();
            for absolute in claimed {
                match self.prepare_document_load(&absolute) {
                    Ok((folder, namespace, folder_path, doc_name, adapter, adapter_path)) => {
                        let handle =
                            tokio::spawn(async move { adapter.read(&adapter_path).await });
                        pending.push(PendingLoad {
                            absolute,
                            folder,
                            namespace,
                            folder_path,
                            doc_name,
                            handle,
                        });
                    }
                    Err(error) => {
                        self.report_error(&error, Some(&absolute));
                        self.library
                            .mark_document_as_loaded_or_failed(&absolute, None, &mut docs_now_loaded);
                    }
                }
            }

            // wait for the whole batch, then register serially
            for load in pending {
                let bytes = match load.handle.await {
                    Ok(Ok(bytes)) => Some(bytes),
                    Ok(Err(error)) => {
                        self.report_error(&error, Some(&load.absolute));
                        None
                    }
                    Err(join_error) => {
                        self.report(
                            StatusLevel::Error,
                            &format!("load task failed: {join_error}"),
                            Some(&load.absolute),
                        );
                        None
                    }
                };
                let loaded = bytes.and_then(|bytes| {
                    match materialize_document(
                        &mut self.objects,
                        &load.doc_name,
                        &load.namespace,
                        &load.folder_path,
                        &bytes,
                    ) {
                        Ok(doc) => Some(self.add_document(load.folder, doc)),
                        Err(error) => {
                            self.report_error(&error, Some(&load.absolute));
                            None
                        }
                    }
                });
                if self.library.mark_document_as_loaded_or_failed(
                    &load.absolute,
                    loaded,
                    &mut docs_now_loaded,
                ) {
                    self.report(
                        StatusLevel::Progress,
                        &format!("resolved import for '{}'", load.absolute),
                        Some(&load.absolute),
                    );
                } else {
                    self.report(
                        StatusLevel::Warning,
                        &format!("unable to resolve import for '{}'", load.absolute),
                        Some(&load.absolute),
                    );
                }
            }

            // now that new docs are in, find imports from them that need
            // loading and go around again
            for &newly_loaded in &docs_now_loaded {
                self.find_missing_imports(newly_loaded);
            }
        }
    }

    fn prepare_document_load(
        &mut self,
        absolute: &str,
    ) -> CdmResult<(
        FolderId,
        String,
        String,
        String,
        Arc<dyn StorageAdapter>,
        String,
    )> {
        let (namespace, path) = {
            let (namespace, path) = self.storage().resolve_namespace(absolute)?;
            (namespace.to_string(), path.to_string())
        };
        if !path.starts_with('/') {
            return Err(CdmError::NotFound(absolute.to_string()));
        }
        let root = self.fetch_root_folder(&namespace)?;
        let adapter = self.storage().fetch_adapter(&namespace)?;

        let (folder_part, doc_name) = crate::storage::split_folder_and_name(&path);
        if doc_name.is_empty() {
            return Err(CdmError::NotFound(absolute.to_string()));
        }
        let folder = self
            .folders
            .ensure_path(root, folder_part)
            .ok_or_else(|| CdmError::NotFound(absolute.to_string()))?;
        Ok((
            folder,
            namespace,
            folder_part.to_string(),
            doc_name.to_string(),
            adapter,
            path.clone(),
        ))
    }

    /// Fetch a registered document by absolute path, marking it for
    /// indexing when it has not been through the pipeline yet.
    pub fn fetch_document_and_mark_for_indexing(&mut self, absolute_path: &str) -> Option<DocId> {
        let (_, doc) = self.library.lookup(absolute_path)?;
        let needs_marking = self
            .document(doc)
            .is_some_and(|document| !document.imports_indexed && !document.needs_indexing);
        if needs_marking {
            self.mark_document_for_indexing(doc);
        }
        Some(doc)
    }

    /// Wire import -> document links for everything reachable from a
    /// document, marking freshly linked imports for indexing.
    pub(crate) fn set_import_documents(&mut self, doc: DocId) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let namespace = document.namespace.clone();
        let folder_path = document.folder_path.clone();
        let import_count = document.imports.len();

        for index in 0..import_count {
            let (corpus_path, current) = {
                let Some(document) = self.document(doc) else {
                    return;
                };
                let import = &document.imports[index];
                (import.corpus_path.clone(), import.doc)
            };
            if current.is_some_and(|linked| self.document(linked).is_some()) {
                continue;
            }

            let anchor = PathAnchor {
                namespace: &namespace,
                folder_path: &folder_path,
            };
            let Ok(absolute) = self
                .storage()
                .create_absolute_corpus_path(&corpus_path, Some(anchor))
            else {
                continue;
            };
            // an imported document becomes visible only once indexed
            let Some(import_doc) = self.fetch_document_and_mark_for_indexing(&absolute) else {
                continue;
            };

            if let Some(document) = self.document_mut(doc) {
                document.imports[index].doc = Some(import_doc);
            }

            // repeat the process for the import's own imports
            self.set_import_documents(import_doc);
        }
    }

    // ============================================================
    // Modification times
    // ============================================================

    /// Last modified time of the object at a corpus path, loading it
    /// first.
    pub async fn compute_last_modified_time(
        &mut self,
        corpus_path: &str,
        anchor: Option<ObjectId>,
    ) -> Option<SystemTime> {
        let fetched = self.fetch_object(corpus_path, anchor, false).await?;
        self.compute_last_modified_time_from_object(fetched).await
    }

    /// Last modified time of the container an already-fetched object was
    /// read from.
    pub async fn compute_last_modified_time_from_object(
        &mut self,
        object: CorpusObject,
    ) -> Option<SystemTime> {
        let (namespace, adapter_path) = self.container_adapter_path(object)?;
        let adapter = match self.storage().fetch_adapter(&namespace) {
            Ok(adapter) => adapter,
            Err(error) => {
                self.report_error(&error, None);
                return None;
            }
        };
        adapter
            .compute_last_modified_time(&adapter_path)
            .await
            .ok()
            .flatten()
    }

    /// Last modified time behind a corpus path without loading the file.
    pub async fn compute_last_modified_time_from_partition_path(
        &mut self,
        corpus_path: &str,
    ) -> Option<SystemTime> {
        let (namespace, path) = match self.storage().resolve_namespace(corpus_path) {
            Ok((namespace, path)) => (namespace.to_string(), path.to_string()),
            Err(error) => {
                self.report_error(&error, Some(corpus_path));
                return None;
            }
        };
        let adapter = match self.storage().fetch_adapter(&namespace) {
            Ok(adapter) => adapter,
            Err(error) => {
                self.report_error(&error, Some(corpus_path));
                return None;
            }
        };
        adapter.compute_last_modified_time(&path).await.ok().flatten()
    }

    fn container_adapter_path(&self, object: CorpusObject) -> Option<(String, String)> {
        match object {
            CorpusObject::Document(doc) => {
                let document = self.document(doc)?;
                Some((
                    document.namespace.clone(),
                    format!("{}{}", document.folder_path, document.name),
                ))
            }
            CorpusObject::Folder(folder) => {
                let folder = self.folders.get(folder)?;
                Some((folder.namespace.clone(), folder.folder_path.clone()))
            }
            CorpusObject::Object(id) => {
                let doc = self.object(id)?.in_document?;
                self.container_adapter_path(CorpusObject::Document(doc))
            }
        }
    }
}
