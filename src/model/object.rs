//! The polymorphic object model.
//!
//! Every definition, reference and argument in a corpus is one
//! [`ObjectData`] record held in the corpus object arena. Concrete shapes
//! live in the [`ObjectKind`] tagged sum; shared behavior (naming,
//! validation, child enumeration) is implemented over the tag rather than
//! through a type hierarchy.

use super::document::DocId;
use super::object_type::ObjectType;

/// Identifier of an object in the corpus arena.
///
/// Unique for the lifetime of one corpus instance; ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal or object argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Object(ObjectId),
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(text) => Some(text),
            ArgValue::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            ArgValue::Object(id) => Some(*id),
            ArgValue::Text(_) => None,
        }
    }
}

/// Role of a node inside a resolved attribute-context tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeContextType {
    Entity,
    EntityReferenceExtends,
    AttributeDefinition,
    AttributeGroup,
    GeneratedSet,
    GeneratedRound,
    AddedAttributeIdentity,
    PassThrough,
}

/// One object in the corpus.
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub id: ObjectId,
    pub object_type: ObjectType,
    pub name: Option<String>,
    /// Document the object lives in; `None` until attached.
    pub in_document: Option<DocId>,
    /// Slash-joined path inside the owning document, set during the
    /// declaration pass.
    pub declared_path: Option<String>,
    pub kind: ObjectKind,
}

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Entity(EntityDef),
    Trait(TraitDef),
    /// Purpose and data-type definitions share the extends/exhibits shape.
    Extensible(ExtensibleDef),
    Parameter(ParameterDef),
    TypeAttribute(TypeAttributeDef),
    EntityAttribute(EntityAttributeDef),
    AttributeGroup(AttributeGroupDef),
    ConstantEntity(ConstantEntityDef),
    AttributeContext(AttributeContextDef),
    /// Local and referenced entity declarations inside a manifest.
    EntityDeclaration(EntityDeclarationDef),
    Manifest(ManifestDef),
    ManifestDeclaration(ManifestDeclarationDef),
    Reference(ReferenceDef),
    Argument(ArgumentDef),
}

#[derive(Debug, Clone, Default)]
pub struct EntityDef {
    pub extends_entity: Option<ObjectId>,
    pub exhibits_traits: Vec<ObjectId>,
    pub attributes: Vec<ObjectId>,
    /// Present only on resolved entities.
    pub attribute_context: Option<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct TraitDef {
    pub extends_trait: Option<ObjectId>,
    pub parameters: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtensibleDef {
    pub extends: Option<ObjectId>,
    pub exhibits_traits: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterDef {
    pub data_type: Option<ObjectId>,
    pub default_value: Option<ArgValue>,
    pub required: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TypeAttributeDef {
    pub data_type: Option<ObjectId>,
    pub purpose: Option<ObjectId>,
    pub applied_traits: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct EntityAttributeDef {
    pub entity: Option<ObjectId>,
    pub purpose: Option<ObjectId>,
    pub applied_traits: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct AttributeGroupDef {
    pub exhibits_traits: Vec<ObjectId>,
    pub members: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantEntityDef {
    pub entity_shape: Option<ObjectId>,
    pub constant_values: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct AttributeContextDef {
    pub context_type: AttributeContextType,
    /// Reference back to the object this node was derived from.
    pub definition: Option<ObjectId>,
    pub exhibits_traits: Vec<ObjectId>,
    pub contents: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct EntityDeclarationDef {
    pub entity_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestDef {
    pub entities: Vec<ObjectId>,
    pub sub_manifests: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct ManifestDeclarationDef {
    /// Corpus path of the sub-manifest document.
    pub definition: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceDef {
    pub named_reference: Option<String>,
    pub explicit_reference: Option<ObjectId>,
    pub simple_named: bool,
    /// Arguments, for trait references.
    pub arguments: Vec<ObjectId>,
    /// Traits applied to the reference itself.
    pub applied_traits: Vec<ObjectId>,
    /// Latched once the argument-binding pass has run.
    pub resolved_arguments: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArgumentDef {
    pub value: Option<ArgValue>,
    pub resolved_parameter: Option<ObjectId>,
}

impl ObjectData {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Basic integrity: the fields a well-formed object of this type must
    /// carry. Runs before declaration during indexing.
    pub fn validate(&self) -> bool {
        match &self.kind {
            ObjectKind::Entity(_)
            | ObjectKind::Trait(_)
            | ObjectKind::Extensible(_)
            | ObjectKind::Parameter(_)
            | ObjectKind::TypeAttribute(_)
            | ObjectKind::AttributeGroup(_)
            | ObjectKind::ConstantEntity(_)
            | ObjectKind::AttributeContext(_)
            | ObjectKind::Manifest(_) => self.name.is_some(),
            ObjectKind::EntityAttribute(attribute) => {
                self.name.is_some() && attribute.entity.is_some()
            }
            ObjectKind::EntityDeclaration(decl) => {
                self.name.is_some() && !decl.entity_path.is_empty()
            }
            ObjectKind::ManifestDeclaration(decl) => {
                self.name.is_some() && !decl.definition.is_empty()
            }
            ObjectKind::Reference(reference) => {
                reference.named_reference.is_some() || reference.explicit_reference.is_some()
            }
            ObjectKind::Argument(argument) => argument.value.is_some(),
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceDef> {
        match &self.kind {
            ObjectKind::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_reference_mut(&mut self) -> Option<&mut ReferenceDef> {
        match &mut self.kind {
            ObjectKind::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityDef> {
        match &self.kind {
            ObjectKind::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_attribute_context(&self) -> Option<&AttributeContextDef> {
        match &self.kind {
            ObjectKind::AttributeContext(context) => Some(context),
            _ => None,
        }
    }

    pub fn as_manifest(&self) -> Option<&ManifestDef> {
        match &self.kind {
            ObjectKind::Manifest(manifest) => Some(manifest),
            _ => None,
        }
    }

    /// Traits exhibited or applied directly by this object.
    pub fn applied_trait_refs(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Entity(entity) => &entity.exhibits_traits,
            ObjectKind::Extensible(extensible) => &extensible.exhibits_traits,
            ObjectKind::TypeAttribute(attribute) => &attribute.applied_traits,
            ObjectKind::EntityAttribute(attribute) => &attribute.applied_traits,
            ObjectKind::AttributeGroup(group) => &group.exhibits_traits,
            ObjectKind::AttributeContext(context) => &context.exhibits_traits,
            ObjectKind::Reference(reference) => &reference.applied_traits,
            _ => &[],
        }
    }
}
