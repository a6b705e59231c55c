//! The corpus: one instance of the whole document graph and every
//! registration derived from it.
//!
//! All indexing and resolution against a corpus is serialized through
//! `&mut self`; only adapter I/O inside the loader fans out concurrently.

pub mod cache;
pub mod indexing;
pub mod library;
pub mod loader;
pub mod priorities;
pub mod relationships;
pub mod resolved;
pub mod resolver;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::core::{EventCallback, EventEmitter, StatusLevel};
use crate::error::{CdmError, CdmResult};
use crate::model::{
    ArgumentDef, AttributeContextDef, AttributeContextType, AttributeGroupDef, ConstantEntityDef,
    DocId, Document, E2ERelationship, EntityAttributeDef, EntityDeclarationDef, EntityDef,
    ExtensibleDef, FolderArena, FolderId, ManifestDeclarationDef, ManifestDef, ObjectArena,
    ObjectData, ObjectId, ObjectKind, ObjectType, ParameterDef, ReferenceDef, TraitDef,
    TypeAttributeDef,
};
use crate::resolve::{DirectiveSet, SymbolSet};
use crate::storage::{StorageAdapter, StorageRegistry};

pub use library::DocumentLibrary;
pub use loader::CorpusObject;
pub use resolved::{ResolvedTrait, ResolvedTraitSet};
pub use resolver::DocsResult;

/// One corpus instance.
///
/// Owns the object and folder arenas, the document set, the symbol table
/// and every cache keyed off them. Dropping the corpus drops everything.
pub struct Corpus {
    storage: StorageRegistry,
    pub(crate) objects: ObjectArena,
    pub(crate) folders: FolderArena,
    root_folders: HashMap<String, FolderId>,
    pub(crate) docs: Vec<Option<Document>>,
    pub(crate) library: DocumentLibrary,
    /// Symbol name -> documents that declare it.
    pub(crate) symbol_definitions: IndexMap<String, Vec<DocId>>,
    /// `"{id}-{kind}"` -> symbols whose definitions shape that resolution.
    pub(crate) definition_reference_symbols: HashMap<String, SymbolSet>,
    /// Cache-tag -> resolved trait set.
    pub(crate) resolved_trait_cache: HashMap<String, Arc<resolved::ResolvedTraitSet>>,
    /// Unresolved entity corpus path -> its outgoing relationships.
    pub(crate) outgoing_relationships: IndexMap<String, Vec<E2ERelationship>>,
    /// Target entity corpus path -> relationships pointing at it.
    pub(crate) incoming_relationships: IndexMap<String, Vec<E2ERelationship>>,
    /// Resolved entity path -> unresolved entity path.
    pub(crate) res_ent_map: HashMap<String, String>,
    default_resolution_directives: DirectiveSet,
    pub(crate) events: EventEmitter,
    cancellation: CancellationToken,
}

impl Corpus {
    pub fn new() -> Self {
        // entity attributes become foreign-key references by default when
        // they point at a single instance
        let default_resolution_directives =
            DirectiveSet::from_directives(["normalized", "referenceOnly"]);
        Self {
            storage: StorageRegistry::new(),
            objects: ObjectArena::new(),
            folders: FolderArena::new(),
            root_folders: HashMap::new(),
            docs: Vec::new(),
            library: DocumentLibrary::new(),
            symbol_definitions: IndexMap::new(),
            definition_reference_symbols: HashMap::new(),
            resolved_trait_cache: HashMap::new(),
            outgoing_relationships: IndexMap::new(),
            incoming_relationships: IndexMap::new(),
            res_ent_map: HashMap::new(),
            default_resolution_directives,
            events: EventEmitter::new(),
            cancellation: CancellationToken::new(),
        }
    }

    // ============================================================
    // Storage and namespaces
    // ============================================================

    pub fn storage(&self) -> &StorageRegistry {
        &self.storage
    }

    /// Mount an adapter under a namespace and materialize its root folder.
    pub fn mount(&mut self, namespace: impl Into<String>, adapter: Arc<dyn StorageAdapter>) {
        let namespace = namespace.into();
        self.storage.mount(namespace.clone(), adapter);
        self.root_folders
            .entry(namespace.clone())
            .or_insert_with(|| self.folders.alloc_root(namespace));
    }

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.storage.set_default_namespace(namespace);
    }

    /// Root folder of a namespace; fails when the namespace is unknown.
    pub fn fetch_root_folder(&self, namespace: &str) -> CdmResult<FolderId> {
        self.root_folders
            .get(namespace)
            .copied()
            .ok_or_else(|| CdmError::UnknownNamespace(namespace.to_string()))
    }

    // ============================================================
    // Events and cancellation
    // ============================================================

    /// Register the status callback and the minimum level it receives.
    pub fn set_event_callback(&mut self, callback: EventCallback, report_at_level: StatusLevel) {
        self.events.set_callback(callback, report_at_level);
    }

    pub(crate) fn report(&self, level: StatusLevel, message: &str, corpus_path: Option<&str>) {
        self.events.emit(level, message, corpus_path);
    }

    pub(crate) fn report_error(&self, error: &CdmError, corpus_path: Option<&str>) {
        let path = corpus_path.or_else(|| error.corpus_path());
        self.events.emit(StatusLevel::Error, &error.to_string(), path);
    }

    /// Token observed at loader batch boundaries; cancel to stop new work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    // ============================================================
    // Resolution defaults
    // ============================================================

    pub fn default_resolution_directives(&self) -> &DirectiveSet {
        &self.default_resolution_directives
    }

    pub fn set_default_resolution_directives(&mut self, directives: DirectiveSet) {
        self.default_resolution_directives = directives;
    }

    // ============================================================
    // Object access and construction
    // ============================================================

    pub fn object(&self, id: ObjectId) -> Option<&ObjectData> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        self.objects.get_mut(id)
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id.index()).and_then(Option::as_ref)
    }

    pub fn document_mut(&mut self, id: DocId) -> Option<&mut Document> {
        self.docs.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Construct a blank instance of a tagged type. Returns `None` for
    /// types that are not corpus objects (documents, folders, imports).
    pub fn make_object(
        &mut self,
        of_type: ObjectType,
        name: Option<&str>,
        simple_name_ref: bool,
    ) -> Option<ObjectId> {
        let kind = match of_type {
            ObjectType::Entity => ObjectKind::Entity(EntityDef::default()),
            ObjectType::Trait => ObjectKind::Trait(TraitDef::default()),
            ObjectType::Purpose | ObjectType::DataType => {
                ObjectKind::Extensible(ExtensibleDef::default())
            }
            ObjectType::Parameter => ObjectKind::Parameter(ParameterDef::default()),
            ObjectType::TypeAttribute => ObjectKind::TypeAttribute(TypeAttributeDef::default()),
            ObjectType::EntityAttribute => {
                ObjectKind::EntityAttribute(EntityAttributeDef::default())
            }
            ObjectType::AttributeGroup => ObjectKind::AttributeGroup(AttributeGroupDef::default()),
            ObjectType::ConstantEntity => ObjectKind::ConstantEntity(ConstantEntityDef::default()),
            ObjectType::AttributeContext => ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::PassThrough,
                definition: None,
                exhibits_traits: Vec::new(),
                contents: Vec::new(),
            }),
            ObjectType::LocalEntityDeclaration | ObjectType::ReferencedEntityDeclaration => {
                ObjectKind::EntityDeclaration(EntityDeclarationDef {
                    entity_path: String::new(),
                })
            }
            ObjectType::Manifest => ObjectKind::Manifest(ManifestDef::default()),
            ObjectType::ManifestDeclaration => {
                ObjectKind::ManifestDeclaration(ManifestDeclarationDef {
                    definition: String::new(),
                })
            }
            ObjectType::Argument => ObjectKind::Argument(ArgumentDef::default()),
            _ if of_type.is_reference() => ObjectKind::Reference(ReferenceDef {
                named_reference: name.map(str::to_string),
                simple_named: simple_name_ref,
                ..ReferenceDef::default()
            }),
            _ => return None,
        };
        Some(
            self.objects
                .alloc(of_type, name.map(str::to_string), kind),
        )
    }

    /// Construct a named reference of the reference type matching `of_type`.
    pub fn make_ref(
        &mut self,
        of_type: ObjectType,
        name: &str,
        simple_name_ref: bool,
    ) -> Option<ObjectId> {
        let ref_type = of_type.reference_type();
        if ref_type == ObjectType::Error {
            return None;
        }
        self.make_object(ref_type, Some(name), simple_name_ref)
    }

    /// Absolute corpus path of an object: its document's path plus the
    /// object's declared path.
    pub fn at_corpus_path(&self, id: ObjectId) -> Option<String> {
        let object = self.object(id)?;
        let doc = self.document(object.in_document?)?;
        match &object.declared_path {
            Some(declared) => Some(format!("{}/{}", doc.at_corpus_path(), declared)),
            None => Some(doc.at_corpus_path()),
        }
    }

    // ============================================================
    // Document attachment and removal
    // ============================================================

    /// Register a materialized document: store it, attach it to its
    /// folder, index its path and queue it for indexing.
    pub fn add_document(&mut self, folder: FolderId, doc: Document) -> DocId {
        let id = DocId::new(self.docs.len());
        let path = doc.at_corpus_path();
        let name = doc.name.clone();
        self.docs.push(Some(doc));
        if let Some(document) = self.document_mut(id) {
            document.folder = Some(folder);
        }
        self.folders.attach_document(folder, &name, id);
        self.library.add_document_path(&path, folder, id);
        self.stamp_document_objects(id);
        tracing::debug!(path = %path, "document added to corpus");
        id
    }

    /// Point every object reachable from the document's definitions back
    /// at the document. Objects already owned by another document are
    /// left alone.
    pub(crate) fn stamp_document_objects(&mut self, doc: DocId) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let steps = self.objects.walk(&document.definitions.clone());
        for step in steps {
            if step.event == crate::model::WalkEvent::Pre
                && let Some(object) = self.objects.get_mut(step.object)
                && object.in_document.is_none()
            {
                object.in_document = Some(doc);
            }
        }
    }

    /// Remove a document: unregister every symbol it declares, drop its
    /// dependency sets, detach it from its folder and the library.
    pub fn remove_document_objects(&mut self, folder: FolderId, doc: DocId) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let path = document.at_corpus_path();
        let name = document.name.clone();
        let definitions = document.definitions.clone();

        // every symbol declared in this document points at it; remove both
        // the registrations and the dependency sets of its objects
        let steps = self.objects.walk(&definitions);
        for step in &steps {
            if step.event != crate::model::WalkEvent::Pre {
                continue;
            }
            if step.path.contains("(unspecified)") {
                continue;
            }
            let Some(object) = self.objects.get(step.object) else {
                continue;
            };
            if object.object_type.is_declaration() {
                self.unregister_symbol(&step.path, doc);
                self.unregister_definition_reference_symbols(step.object, "rtsb");
            }
        }

        self.folders.detach_document(folder, &name);
        self.library.remove_document_path(&path, doc);
        self.docs[doc.index()] = None;
        tracing::debug!(path = %path, "document removed from corpus");
    }

    // ============================================================
    // Symbol table
    // ============================================================

    pub(crate) fn register_symbol(&mut self, symbol: &str, in_doc: DocId) {
        self.symbol_definitions
            .entry(symbol.to_string())
            .or_default()
            .push(in_doc);
    }

    pub(crate) fn unregister_symbol(&mut self, symbol: &str, in_doc: DocId) {
        let mut now_empty = false;
        if let Some(docs) = self.symbol_definitions.get_mut(symbol) {
            if let Some(position) = docs.iter().position(|&doc| doc == in_doc) {
                docs.remove(position);
            }
            now_empty = docs.is_empty();
        }
        if now_empty {
            self.symbol_definitions.shift_remove(symbol);
        }
    }

    /// Documents that declare a symbol, in declaration order.
    pub fn symbol_documents(&self, symbol: &str) -> Option<&[DocId]> {
        self.symbol_definitions.get(symbol).map(Vec::as_slice)
    }

    // ============================================================
    // Relationships
    // ============================================================

    /// Relationships where the given entity is the referencing side.
    pub fn fetch_outgoing_relationships(&self, entity_path: &str) -> Vec<E2ERelationship> {
        self.outgoing_relationships
            .get(entity_path)
            .cloned()
            .unwrap_or_default()
    }

    /// Relationships where the given entity is the referenced side.
    pub fn fetch_incoming_relationships(&self, entity_path: &str) -> Vec<E2ERelationship> {
        self.incoming_relationships
            .get(entity_path)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("documents", &self.library.list_all_documents().len())
            .field("objects", &self.objects.len())
            .field("symbols", &self.symbol_definitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
