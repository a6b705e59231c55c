//! The `cdm.json` document format.
//!
//! Documents are declared as JSON: an import list plus a definition list,
//! with the definition kind discriminated by its name key (`entityName`,
//! `traitName`, ...). References are spelled as symbolic names; trait
//! references may carry arguments.

use serde::Deserialize;

use crate::error::{CdmError, CdmResult};
use crate::model::{
    ArgValue, ArgumentDef, AttributeGroupDef, ConstantEntityDef, Document, EntityAttributeDef,
    EntityDeclarationDef, EntityDef, ExtensibleDef, Import, ManifestDeclarationDef, ManifestDef,
    ObjectArena, ObjectId, ObjectKind, ObjectType, ParameterDef, ReferenceDef, TraitDef,
    TypeAttributeDef,
};

/// File extension that marks a corpus document.
pub const CDM_EXTENSION: &str = ".cdm.json";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentData {
    #[serde(default)]
    imports: Vec<ImportData>,
    #[serde(default)]
    definitions: Vec<DefinitionData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportData {
    #[serde(rename = "corpusPath")]
    corpus_path: String,
    #[serde(default)]
    moniker: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefinitionData {
    Entity(EntityData),
    Trait(TraitData),
    DataType(DataTypeData),
    Purpose(PurposeData),
    AttributeGroup(AttributeGroupData),
    ConstantEntity(ConstantEntityData),
    Manifest(ManifestData),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityData {
    #[serde(rename = "entityName")]
    entity_name: String,
    #[serde(rename = "extendsEntity", default)]
    extends_entity: Option<String>,
    #[serde(rename = "exhibitsTraits", default)]
    exhibits_traits: Vec<TraitRefData>,
    #[serde(rename = "hasAttributes", default)]
    has_attributes: Vec<AttributeData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraitData {
    #[serde(rename = "traitName")]
    trait_name: String,
    #[serde(rename = "extendsTrait", default)]
    extends_trait: Option<String>,
    #[serde(rename = "hasParameters", default)]
    has_parameters: Vec<ParameterData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DataTypeData {
    #[serde(rename = "dataTypeName")]
    data_type_name: String,
    #[serde(rename = "extendsDataType", default)]
    extends_data_type: Option<String>,
    #[serde(rename = "exhibitsTraits", default)]
    exhibits_traits: Vec<TraitRefData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PurposeData {
    #[serde(rename = "purposeName")]
    purpose_name: String,
    #[serde(rename = "extendsPurpose", default)]
    extends_purpose: Option<String>,
    #[serde(rename = "exhibitsTraits", default)]
    exhibits_traits: Vec<TraitRefData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeGroupData {
    #[serde(rename = "attributeGroupName")]
    attribute_group_name: String,
    #[serde(rename = "exhibitsTraits", default)]
    exhibits_traits: Vec<TraitRefData>,
    #[serde(default)]
    members: Vec<AttributeData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstantEntityData {
    #[serde(rename = "constantEntityName")]
    constant_entity_name: String,
    #[serde(rename = "entityShape", default)]
    entity_shape: Option<String>,
    #[serde(rename = "constantValues", default)]
    constant_values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestData {
    #[serde(rename = "manifestName")]
    manifest_name: String,
    #[serde(default)]
    entities: Vec<EntityDeclarationData>,
    #[serde(rename = "subManifests", default)]
    sub_manifests: Vec<SubManifestData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDeclarationData {
    #[serde(rename = "entityName")]
    entity_name: String,
    #[serde(rename = "entityPath")]
    entity_path: String,
    /// Declarations pointing outside the corpus are "referenced" rather
    /// than local.
    #[serde(default)]
    referenced: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubManifestData {
    #[serde(rename = "manifestName")]
    manifest_name: String,
    definition: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttributeData {
    Entity(EntityAttributeData),
    GroupRef(AttributeGroupRefData),
    Type(TypeAttributeData),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityAttributeData {
    name: String,
    entity: String,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(rename = "appliedTraits", default)]
    applied_traits: Vec<TraitRefData>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeGroupRefData {
    #[serde(rename = "attributeGroupReference")]
    attribute_group_reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeAttributeData {
    name: String,
    #[serde(rename = "dataType", default)]
    data_type: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(rename = "appliedTraits", default)]
    applied_traits: Vec<TraitRefData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraitRefData {
    Named(String),
    WithArguments {
        #[serde(rename = "traitReference")]
        trait_reference: String,
        #[serde(default)]
        arguments: Vec<ArgumentData>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArgumentData {
    // tried first: a bare scalar would also match `serde_json::Value`
    Named {
        name: Option<String>,
        value: serde_json::Value,
    },
    Scalar(serde_json::Value),
}

/// Materialize document bytes into a [`Document`] plus its objects.
///
/// The returned document is not yet registered anywhere; the caller
/// attaches it to a folder and the document library.
pub fn materialize_document(
    arena: &mut ObjectArena,
    name: &str,
    namespace: &str,
    folder_path: &str,
    bytes: &[u8],
) -> CdmResult<Document> {
    let document_path = format!("{namespace}:{folder_path}{name}");
    let data: DocumentData = serde_json::from_slice(bytes)
        .map_err(|err| CdmError::parse(&document_path, err.to_string()))?;

    let mut doc = Document::new(name, namespace, folder_path);
    doc.imports = data
        .imports
        .into_iter()
        .map(|import| Import::new(import.corpus_path, import.moniker))
        .collect();
    doc.definitions = data
        .definitions
        .iter()
        .map(|definition| convert_definition(arena, definition))
        .collect();
    Ok(doc)
}

fn convert_definition(arena: &mut ObjectArena, data: &DefinitionData) -> ObjectId {
    match data {
        DefinitionData::Entity(entity) => {
            let extends_entity = entity
                .extends_entity
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::EntityRef, name));
            let exhibits_traits = convert_trait_refs(arena, &entity.exhibits_traits);
            let attributes = entity
                .has_attributes
                .iter()
                .map(|attribute| convert_attribute(arena, attribute))
                .collect();
            arena.alloc(
                ObjectType::Entity,
                Some(entity.entity_name.clone()),
                ObjectKind::Entity(EntityDef {
                    extends_entity,
                    exhibits_traits,
                    attributes,
                    attribute_context: None,
                }),
            )
        }
        DefinitionData::Trait(trait_data) => {
            let extends_trait = trait_data
                .extends_trait
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::TraitRef, name));
            let parameters = trait_data
                .has_parameters
                .iter()
                .map(|parameter| convert_parameter(arena, parameter))
                .collect();
            arena.alloc(
                ObjectType::Trait,
                Some(trait_data.trait_name.clone()),
                ObjectKind::Trait(TraitDef {
                    extends_trait,
                    parameters,
                }),
            )
        }
        DefinitionData::DataType(data_type) => {
            let extends = data_type
                .extends_data_type
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::DataTypeRef, name));
            let exhibits_traits = convert_trait_refs(arena, &data_type.exhibits_traits);
            arena.alloc(
                ObjectType::DataType,
                Some(data_type.data_type_name.clone()),
                ObjectKind::Extensible(ExtensibleDef {
                    extends,
                    exhibits_traits,
                }),
            )
        }
        DefinitionData::Purpose(purpose) => {
            let extends = purpose
                .extends_purpose
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::PurposeRef, name));
            let exhibits_traits = convert_trait_refs(arena, &purpose.exhibits_traits);
            arena.alloc(
                ObjectType::Purpose,
                Some(purpose.purpose_name.clone()),
                ObjectKind::Extensible(ExtensibleDef {
                    extends,
                    exhibits_traits,
                }),
            )
        }
        DefinitionData::AttributeGroup(group) => {
            let exhibits_traits = convert_trait_refs(arena, &group.exhibits_traits);
            let members = group
                .members
                .iter()
                .map(|member| convert_attribute(arena, member))
                .collect();
            arena.alloc(
                ObjectType::AttributeGroup,
                Some(group.attribute_group_name.clone()),
                ObjectKind::AttributeGroup(AttributeGroupDef {
                    exhibits_traits,
                    members,
                }),
            )
        }
        DefinitionData::ConstantEntity(constant) => {
            let entity_shape = constant
                .entity_shape
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::EntityRef, name));
            arena.alloc(
                ObjectType::ConstantEntity,
                Some(constant.constant_entity_name.clone()),
                ObjectKind::ConstantEntity(ConstantEntityDef {
                    entity_shape,
                    constant_values: constant.constant_values.clone(),
                }),
            )
        }
        DefinitionData::Manifest(manifest) => {
            let entities = manifest
                .entities
                .iter()
                .map(|declaration| {
                    let object_type = if declaration.referenced {
                        ObjectType::ReferencedEntityDeclaration
                    } else {
                        ObjectType::LocalEntityDeclaration
                    };
                    arena.alloc(
                        object_type,
                        Some(declaration.entity_name.clone()),
                        ObjectKind::EntityDeclaration(EntityDeclarationDef {
                            entity_path: declaration.entity_path.clone(),
                        }),
                    )
                })
                .collect();
            let sub_manifests = manifest
                .sub_manifests
                .iter()
                .map(|sub| {
                    arena.alloc(
                        ObjectType::ManifestDeclaration,
                        Some(sub.manifest_name.clone()),
                        ObjectKind::ManifestDeclaration(ManifestDeclarationDef {
                            definition: sub.definition.clone(),
                        }),
                    )
                })
                .collect();
            arena.alloc(
                ObjectType::Manifest,
                Some(manifest.manifest_name.clone()),
                ObjectKind::Manifest(ManifestDef {
                    entities,
                    sub_manifests,
                }),
            )
        }
    }
}

fn convert_attribute(arena: &mut ObjectArena, data: &AttributeData) -> ObjectId {
    match data {
        AttributeData::Entity(attribute) => {
            let entity = named_reference(arena, ObjectType::EntityRef, &attribute.entity);
            let purpose = attribute
                .purpose
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::PurposeRef, name));
            let applied_traits = convert_trait_refs(arena, &attribute.applied_traits);
            arena.alloc(
                ObjectType::EntityAttribute,
                Some(attribute.name.clone()),
                ObjectKind::EntityAttribute(EntityAttributeDef {
                    entity: Some(entity),
                    purpose,
                    applied_traits,
                }),
            )
        }
        AttributeData::GroupRef(group_ref) => named_reference(
            arena,
            ObjectType::AttributeGroupRef,
            &group_ref.attribute_group_reference,
        ),
        AttributeData::Type(attribute) => {
            let data_type = attribute
                .data_type
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::DataTypeRef, name));
            let purpose = attribute
                .purpose
                .as_deref()
                .map(|name| named_reference(arena, ObjectType::PurposeRef, name));
            let applied_traits = convert_trait_refs(arena, &attribute.applied_traits);
            arena.alloc(
                ObjectType::TypeAttribute,
                Some(attribute.name.clone()),
                ObjectKind::TypeAttribute(TypeAttributeDef {
                    data_type,
                    purpose,
                    applied_traits,
                }),
            )
        }
    }
}

fn convert_parameter(arena: &mut ObjectArena, data: &ParameterData) -> ObjectId {
    let data_type = data
        .data_type
        .as_deref()
        .map(|name| named_reference(arena, ObjectType::DataTypeRef, name));
    let default_value = data.default_value.as_ref().map(value_to_arg);
    arena.alloc(
        ObjectType::Parameter,
        Some(data.name.clone()),
        ObjectKind::Parameter(ParameterDef {
            data_type,
            default_value: default_value.map(ArgValue::Text),
            required: data.required,
        }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterData {
    name: String,
    #[serde(rename = "dataType", default)]
    data_type: Option<String>,
    #[serde(rename = "defaultValue", default)]
    default_value: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
}

fn convert_trait_refs(arena: &mut ObjectArena, data: &[TraitRefData]) -> Vec<ObjectId> {
    data.iter()
        .map(|trait_ref| convert_trait_ref(arena, trait_ref))
        .collect()
}

fn convert_trait_ref(arena: &mut ObjectArena, data: &TraitRefData) -> ObjectId {
    match data {
        TraitRefData::Named(name) => named_reference(arena, ObjectType::TraitRef, name),
        TraitRefData::WithArguments {
            trait_reference,
            arguments,
        } => {
            let arguments = arguments
                .iter()
                .map(|argument| {
                    let (name, value) = match argument {
                        ArgumentData::Scalar(value) => (None, value),
                        ArgumentData::Named { name, value } => (name.clone(), value),
                    };
                    arena.alloc(
                        ObjectType::Argument,
                        name,
                        ObjectKind::Argument(ArgumentDef {
                            value: Some(ArgValue::Text(value_to_arg(value))),
                            resolved_parameter: None,
                        }),
                    )
                })
                .collect();
            arena.alloc(
                ObjectType::TraitRef,
                Some(trait_reference.clone()),
                ObjectKind::Reference(ReferenceDef {
                    named_reference: Some(trait_reference.clone()),
                    arguments,
                    ..ReferenceDef::default()
                }),
            )
        }
    }
}

fn named_reference(arena: &mut ObjectArena, ref_type: ObjectType, name: &str) -> ObjectId {
    arena.alloc(
        ref_type,
        Some(name.to_string()),
        ObjectKind::Reference(ReferenceDef {
            named_reference: Some(name.to_string()),
            simple_named: true,
            ..ReferenceDef::default()
        }),
    )
}

fn value_to_arg(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
