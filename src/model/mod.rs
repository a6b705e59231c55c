//! The corpus data model: objects, documents, folders and relationships.

pub mod arena;
pub mod document;
pub mod folder;
pub mod object;
pub mod object_type;
pub mod relationship;

pub use arena::{ObjectArena, WalkEvent, WalkStep};
pub use document::{DocId, Document, Import, ImportPriorities};
pub use folder::{Folder, FolderArena, FolderId};
pub use object::{
    ArgValue, ArgumentDef, AttributeContextDef, AttributeContextType, AttributeGroupDef,
    ConstantEntityDef, EntityAttributeDef, EntityDeclarationDef, EntityDef, ExtensibleDef,
    ManifestDeclarationDef, ManifestDef, ObjectData, ObjectId, ObjectKind, ParameterDef,
    ReferenceDef, TraitDef, TypeAttributeDef,
};
pub use object_type::ObjectType;
pub use relationship::E2ERelationship;
