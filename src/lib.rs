//! # cdm-corpus
//!
//! Symbol resolution, indexing and relationship discovery for Common
//! Data Model corpora: a corpus is a set of loosely coupled schema
//! documents that import each other and reference declarations by
//! symbolic name. This crate loads the document graph on demand, indexes
//! it into a deterministic symbol table, resolves references against each
//! document's import priorities, fingerprints resolved forms for caching
//! and mines foreign-key relationships from resolved entities.

pub mod core;
pub mod corpus;
pub mod error;
pub mod model;
pub mod persistence;
pub mod resolve;
pub mod storage;

pub use crate::core::{EventCallback, StatusEvent, StatusLevel};
pub use corpus::{Corpus, CorpusObject};
pub use error::{CdmError, CdmResult};
pub use model::{DocId, Document, E2ERelationship, FolderId, Import, ObjectId, ObjectType};
pub use resolve::{DirectiveSet, ResolveOptions, ValidationStage};
pub use storage::{LocalAdapter, MemoryAdapter, StorageAdapter};

/// A symbolic name as registered in the corpus symbol table.
pub type SymbolName = String;
/// An absolute `namespace:/...` corpus path.
pub type CorpusPath = String;
