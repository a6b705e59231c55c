//! Resolved forms: effective trait sets, resolved attribute names and the
//! resolved-entity shadow used by relationship extraction.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::StatusLevel;
use crate::error::{CdmError, CdmResult};
use crate::model::{
    ArgValue, ArgumentDef, AttributeContextDef, AttributeContextType, Document, EntityDef, Import,
    ObjectId, ObjectKind, ObjectType, ReferenceDef, TypeAttributeDef,
};
use crate::resolve::ResolveOptions;

use super::Corpus;

/// Marker inside a named reference that promises an attribute which only
/// exists after attribute resolution; such references are not resolved
/// during indexing.
const RESOLVED_ATTRIBUTE_PROMISE: &str = "(resolvedAttributes)";

/// The name of the trait identifying an entity's primary key.
pub(crate) const IDENTIFIED_BY: &str = "is.identifiedBy";

/// Prefix put on entity shadows resolved on behalf of the entity itself.
pub(crate) const WRT_SELF_PREFIX: &str = "wrtSelf_";

/// One trait in effect on an object, with its parameters and the values
/// they ended up bound to.
#[derive(Debug, Clone)]
pub struct ResolvedTrait {
    pub trait_def: ObjectId,
    pub trait_name: String,
    pub parameters: Vec<ObjectId>,
    pub values: Vec<Option<ArgValue>>,
}

/// The effective set of traits on an object, base-first.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTraitSet {
    pub set: Vec<ResolvedTrait>,
}

impl ResolvedTraitSet {
    pub fn find(&self, trait_name: &str) -> Option<&ResolvedTrait> {
        self.set.iter().find(|rt| rt.trait_name == trait_name)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    fn upsert(&mut self, resolved: ResolvedTrait) {
        match self
            .set
            .iter_mut()
            .find(|existing| existing.trait_def == resolved.trait_def)
        {
            Some(existing) => *existing = resolved,
            None => self.set.push(resolved),
        }
    }
}

pub(crate) fn is_attribute_promise(named_reference: &str) -> bool {
    named_reference.contains(RESOLVED_ATTRIBUTE_PROMISE)
}

impl Corpus {
    // ============================================================
    // Trait resolution
    // ============================================================

    /// The effective trait set of an object: its extends chain walked
    /// base-first, then the traits it exhibits or applies, each bound to
    /// parameter values. Cached corpus-wide under the object's cache tag.
    pub(crate) fn fetch_resolved_traits(
        &mut self,
        id: ObjectId,
        res_opt: &mut ResolveOptions,
    ) -> Arc<ResolvedTraitSet> {
        let kind = "rtsb";
        if let Some(tag) = self.create_definition_cache_tag(res_opt, id, kind, "", false)
            && let Some(cached) = self.resolved_trait_cache.get(&tag)
        {
            tracing::trace!(tag = %tag, "resolved traits cache hit");
            return Arc::clone(cached);
        }

        let mut collect_opt = res_opt.copy();
        let mut set = ResolvedTraitSet::default();
        let mut visited = HashSet::new();
        self.accumulate_resolved_traits(id, &mut collect_opt, &mut set, &mut visited);

        // register what this resolution depended on, then cache under the
        // tag those dependencies produce
        let definition = self.fetch_object_definition(id, &mut collect_opt).unwrap_or(id);
        self.register_definition_reference_symbols(
            definition,
            kind,
            collect_opt.symbol_ref_set.clone(),
        );
        res_opt.symbol_ref_set.merge(&collect_opt.symbol_ref_set);

        let set = Arc::new(set);
        if let Some(tag) = self.create_definition_cache_tag(res_opt, id, kind, "", false) {
            self.resolved_trait_cache.insert(tag, Arc::clone(&set));
        }
        set
    }

    fn accumulate_resolved_traits(
        &mut self,
        id: ObjectId,
        res_opt: &mut ResolveOptions,
        set: &mut ResolvedTraitSet,
        visited: &mut HashSet<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Some(object) = self.object(id) else {
            return;
        };

        match object.object_type {
            ObjectType::Trait => {
                // a trait stands for itself, base traits first
                let extends = match &object.kind {
                    ObjectKind::Trait(def) => def.extends_trait,
                    _ => None,
                };
                if let Some(extends_ref) = extends
                    && let Some(base) = self.fetch_object_definition(extends_ref, res_opt)
                {
                    self.accumulate_resolved_traits(base, res_opt, set, visited);
                }
                if let Some(resolved) = self.build_resolved_trait(id, &[], res_opt) {
                    set.upsert(resolved);
                }
            }
            ObjectType::TraitRef => {
                let (trait_def, arguments) = {
                    let Some(reference) = self.object(id).and_then(|o| o.as_reference()) else {
                        return;
                    };
                    let arguments = reference.arguments.clone();
                    (self.fetch_object_definition(id, res_opt), arguments)
                };
                if let Some(trait_def) = trait_def
                    && let Some(resolved) = self.build_resolved_trait(trait_def, &arguments, res_opt)
                {
                    set.upsert(resolved);
                }
            }
            _ if object.object_type.is_reference() => {
                let applied = object.applied_trait_refs().to_vec();
                if let Some(definition) = self.fetch_object_definition(id, res_opt)
                    && definition != id
                {
                    self.accumulate_resolved_traits(definition, res_opt, set, visited);
                }
                for trait_ref in applied {
                    self.accumulate_resolved_traits(trait_ref, res_opt, set, visited);
                }
            }
            _ => {
                // a definition: extends chain first, then its own traits
                let extends = match &object.kind {
                    ObjectKind::Entity(def) => def.extends_entity,
                    ObjectKind::Extensible(def) => def.extends,
                    _ => None,
                };
                let applied = object.applied_trait_refs().to_vec();
                if let Some(extends_ref) = extends {
                    self.accumulate_resolved_traits(extends_ref, res_opt, set, visited);
                }
                for trait_ref in applied {
                    self.accumulate_resolved_traits(trait_ref, res_opt, set, visited);
                }
            }
        }
    }

    /// Instantiate a trait: parameters from the whole extends chain,
    /// values from defaults overridden by the given arguments.
    fn build_resolved_trait(
        &mut self,
        trait_def: ObjectId,
        arguments: &[ObjectId],
        res_opt: &mut ResolveOptions,
    ) -> Option<ResolvedTrait> {
        let trait_name = self.object(trait_def)?.name()?.to_string();
        let parameters = self.fetch_all_parameters(trait_def, res_opt);
        let mut values: Vec<Option<ArgValue>> = parameters
            .iter()
            .map(|&parameter| {
                self.object(parameter).and_then(|object| match &object.kind {
                    ObjectKind::Parameter(def) => def.default_value.clone(),
                    _ => None,
                })
            })
            .collect();

        for (ordinal, &argument_id) in arguments.iter().enumerate() {
            let Some(argument) = self.object(argument_id) else {
                continue;
            };
            let argument_name = argument.name().map(str::to_string);
            let argument_value = match &argument.kind {
                ObjectKind::Argument(def) => def.value.clone(),
                _ => None,
            };
            let position = match &argument_name {
                Some(name) => parameters.iter().position(|&parameter| {
                    self.object(parameter)
                        .and_then(|p| p.name())
                        .is_some_and(|n| n == name)
                }),
                None => Some(ordinal),
            };
            if let Some(position) = position
                && position < values.len()
            {
                values[position] = argument_value;
            }
        }

        Some(ResolvedTrait {
            trait_def,
            trait_name,
            parameters,
            values,
        })
    }

    /// Parameters of a trait including those inherited through extends,
    /// base-first.
    pub(crate) fn fetch_all_parameters(
        &mut self,
        trait_def: ObjectId,
        res_opt: &mut ResolveOptions,
    ) -> Vec<ObjectId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(trait_def);
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            chain.push(id);
            let extends = match self.object(id).map(|object| &object.kind) {
                Some(ObjectKind::Trait(def)) => def.extends_trait,
                _ => None,
            };
            current = extends.and_then(|extends_ref| self.fetch_object_definition(extends_ref, res_opt));
        }

        let mut parameters = Vec::new();
        for id in chain.into_iter().rev() {
            if let Some(ObjectKind::Trait(def)) = self.object(id).map(|object| &object.kind) {
                parameters.extend(def.parameters.iter().copied());
            }
        }
        parameters
    }

    /// Whether a definition derives (transitively) from a named base.
    pub(crate) fn is_derived_from(
        &mut self,
        definition: ObjectId,
        base_name: &str,
        res_opt: &mut ResolveOptions,
    ) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(definition);
        while let Some(id) = current {
            if !visited.insert(id) {
                return false;
            }
            let Some(object) = self.object(id) else {
                return false;
            };
            if object.name() == Some(base_name) {
                return true;
            }
            let extends = match &object.kind {
                ObjectKind::Entity(def) => def.extends_entity,
                ObjectKind::Trait(def) => def.extends_trait,
                ObjectKind::Extensible(def) => def.extends,
                _ => None,
            };
            current = extends.and_then(|extends_ref| self.fetch_object_definition(extends_ref, res_opt));
        }
        false
    }

    // ============================================================
    // Attribute resolution (names only)
    // ============================================================

    /// The names of an entity's or attribute group's resolved attributes
    /// under the options' directives, base attributes first.
    pub(crate) fn fetch_resolved_attribute_names(
        &mut self,
        id: ObjectId,
        res_opt: &mut ResolveOptions,
    ) -> Vec<String> {
        let mut names = Vec::new();
        let mut visited = HashSet::new();
        self.accumulate_attribute_names(id, res_opt, &mut names, &mut visited);
        names
    }

    fn accumulate_attribute_names(
        &mut self,
        id: ObjectId,
        res_opt: &mut ResolveOptions,
        names: &mut Vec<String>,
        visited: &mut HashSet<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let (extends, attributes) = {
            let Some(object) = self.object(id) else {
                return;
            };
            match &object.kind {
                ObjectKind::Entity(def) => (def.extends_entity, def.attributes.clone()),
                ObjectKind::AttributeGroup(def) => (None, def.members.clone()),
                _ => return,
            }
        };

        if let Some(extends_ref) = extends
            && let Some(base) = self.fetch_object_definition(extends_ref, res_opt)
        {
            self.accumulate_attribute_names(base, res_opt, names, visited);
        }

        for attribute in attributes {
            let Some(object) = self.object(attribute) else {
                continue;
            };
            match object.object_type {
                ObjectType::TypeAttribute | ObjectType::EntityAttribute => {
                    if let Some(name) = object.name() {
                        names.push(name.to_string());
                    }
                }
                ObjectType::AttributeGroupRef => {
                    if let Some(group) = self.fetch_object_definition(attribute, res_opt) {
                        self.accumulate_attribute_names(group, res_opt, names, visited);
                    }
                }
                _ => {}
            }
        }
    }

    /// Entities referenced by an entity's attributes, as
    /// `(attribute name, target entity)` pairs.
    pub(crate) fn fetch_resolved_entity_references(
        &mut self,
        id: ObjectId,
        res_opt: &mut ResolveOptions,
    ) -> Vec<(String, ObjectId)> {
        let attributes = match self.object(id).map(|object| &object.kind) {
            Some(ObjectKind::Entity(def)) => def.attributes.clone(),
            _ => return Vec::new(),
        };

        let mut references = Vec::new();
        for attribute in attributes {
            let (name, entity_ref) = {
                let Some(object) = self.object(attribute) else {
                    continue;
                };
                match &object.kind {
                    ObjectKind::EntityAttribute(def) => {
                        (object.name().map(str::to_string), def.entity)
                    }
                    _ => continue,
                }
            };
            if let (Some(name), Some(entity_ref)) = (name, entity_ref)
                && let Some(target) = self.fetch_object_definition(entity_ref, res_opt)
            {
                references.push((name, target));
            }
        }
        references
    }

    // ============================================================
    // Resolved entity shadow
    // ============================================================

    /// Materialize a resolved copy of an entity into a shadow document
    /// beside the source, returning the resolved entity.
    ///
    /// The resolved entity carries an attribute-context tree: per
    /// entity-typed attribute (under `normalized` + `referenceOnly`) an
    /// attribute-definition node holding the target entity reference
    /// (with the identifying trait) and the synthetic
    /// `_generatedAttributeSet` subtree whose `AddedAttributeIdentity`
    /// node names the generated foreign-key attribute.
    pub(crate) fn create_resolved_entity(
        &mut self,
        entity: ObjectId,
        new_name: &str,
        res_opt: &ResolveOptions,
    ) -> CdmResult<ObjectId> {
        let (source_doc, entity_name, attributes, exhibits) = {
            let object = self
                .object(entity)
                .ok_or_else(|| CdmError::NotFound(format!("object #{}", entity.0)))?;
            let entity_name = object
                .name()
                .ok_or_else(|| CdmError::NotFound("unnamed entity".to_string()))?
                .to_string();
            let source_doc = object
                .in_document
                .ok_or_else(|| CdmError::NotFound(entity_name.clone()))?;
            let def = object
                .as_entity()
                .ok_or_else(|| CdmError::NotFound(entity_name.clone()))?;
            (
                source_doc,
                entity_name,
                def.attributes.clone(),
                def.exhibits_traits.clone(),
            )
        };
        let source_entity_path = self
            .at_corpus_path(entity)
            .ok_or_else(|| CdmError::NotFound(entity_name.clone()))?;
        let (source_doc_path, namespace, folder_path, folder) = {
            let document = self
                .document(source_doc)
                .ok_or_else(|| CdmError::NotFound(source_entity_path.clone()))?;
            (
                document.at_corpus_path(),
                document.namespace.clone(),
                document.folder_path.clone(),
                document
                    .folder
                    .ok_or_else(|| CdmError::NotFound(source_entity_path.clone()))?,
            )
        };

        // the shadow document imports the source so every named reference
        // in the resolved copy stays resolvable
        let mut shadow = Document::new(
            format!("{new_name}.cdm.json"),
            namespace,
            folder_path,
        );
        shadow.imports.push(Import::new(source_doc_path, None));

        // root context: points back at the unresolved entity by name,
        // resolvable through the shadow's import of the source document
        let back_reference = self.objects.alloc(
            ObjectType::EntityRef,
            Some(entity_name.clone()),
            ObjectKind::Reference(ReferenceDef {
                named_reference: Some(entity_name.clone()),
                simple_named: true,
                ..ReferenceDef::default()
            }),
        );
        let mut root_contents = Vec::new();
        let mut resolved_attributes = Vec::new();
        let mut has_identity = false;

        let relational = res_opt.directives.has("referenceOnly") && res_opt.directives.has("normalized");
        for attribute in attributes {
            let (attribute_name, attribute_kind) = {
                let Some(object) = self.object(attribute) else {
                    continue;
                };
                (
                    object.name().unwrap_or_default().to_string(),
                    object.object_type,
                )
            };
            match attribute_kind {
                ObjectType::EntityAttribute if relational => {
                    let built = self.build_foreign_key_context(
                        entity,
                        attribute,
                        &attribute_name,
                        new_name,
                    );
                    if let Some((context, resolved_attribute)) = built {
                        root_contents.push(context);
                        resolved_attributes.push(resolved_attribute);
                        has_identity = true;
                    }
                }
                ObjectType::TypeAttribute | ObjectType::EntityAttribute => {
                    let context = self.objects.alloc(
                        ObjectType::AttributeContext,
                        Some(attribute_name.clone()),
                        ObjectKind::AttributeContext(AttributeContextDef {
                            context_type: AttributeContextType::AttributeDefinition,
                            definition: None,
                            exhibits_traits: Vec::new(),
                            contents: Vec::new(),
                        }),
                    );
                    root_contents.push(context);
                    resolved_attributes.push(self.objects.alloc(
                        ObjectType::TypeAttribute,
                        Some(attribute_name),
                        ObjectKind::TypeAttribute(TypeAttributeDef::default()),
                    ));
                }
                _ => {}
            }
        }

        let root_context = self.objects.alloc(
            ObjectType::AttributeContext,
            Some(entity_name.clone()),
            ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::Entity,
                definition: Some(back_reference),
                exhibits_traits: Vec::new(),
                contents: root_contents,
            }),
        );

        let resolved_entity = self.objects.alloc(
            ObjectType::Entity,
            Some(new_name.to_string()),
            ObjectKind::Entity(EntityDef {
                extends_entity: None,
                exhibits_traits: Vec::new(),
                attributes: resolved_attributes,
                attribute_context: Some(root_context),
            }),
        );
        shadow.definitions.push(resolved_entity);

        let shadow_doc = self.add_document(folder, shadow);
        self.set_import_documents(shadow_doc);
        self.index_documents(&res_opt.copy());

        if let Some(resolved_path) = self.at_corpus_path(resolved_entity) {
            self.res_ent_map
                .insert(resolved_path, source_entity_path.clone());
        }

        if !has_identity && !self.entity_exhibits_identity(&exhibits) {
            self.report(
                StatusLevel::Warning,
                &format!("there is a primary key missing for the entry '{entity_name}'"),
                Some(&source_entity_path),
            );
        }

        Ok(resolved_entity)
    }

    fn entity_exhibits_identity(&self, exhibits: &[ObjectId]) -> bool {
        exhibits.iter().any(|&trait_ref| {
            self.object(trait_ref)
                .and_then(|object| object.name())
                .is_some_and(|name| name == IDENTIFIED_BY)
        })
    }

    /// Context subtree for one foreign-key attribute: the target entity
    /// child (with the identifying trait) plus the generated attribute
    /// set naming the foreign key.
    fn build_foreign_key_context(
        &mut self,
        entity: ObjectId,
        attribute: ObjectId,
        attribute_name: &str,
        resolved_name: &str,
    ) -> Option<(ObjectId, ObjectId)> {
        let (entity_ref, applied_traits) = {
            let object = self.object(attribute)?;
            match &object.kind {
                ObjectKind::EntityAttribute(def) => (def.entity?, def.applied_traits.clone()),
                _ => return None,
            }
        };

        let in_document = self.object(entity)?.in_document?;
        let mut res_opt = ResolveOptions::with_document(
            in_document,
            self.default_resolution_directives().clone(),
        );
        let target = self.fetch_object_definition(entity_ref, &mut res_opt)?;
        let target_name = self.object(target)?.name()?.to_string();

        // the identifying trait comes from the attribute, falling back to
        // the target entity's own traits
        let identity_refs: Vec<ObjectId> = {
            let from_attribute: Vec<ObjectId> = applied_traits
                .iter()
                .copied()
                .filter(|&trait_ref| {
                    self.object(trait_ref)
                        .and_then(|object| object.name())
                        .is_some_and(|name| name == IDENTIFIED_BY)
                })
                .collect();
            if !from_attribute.is_empty() {
                from_attribute
            } else {
                let target_exhibits = self
                    .object(target)
                    .map(|object| object.applied_trait_refs().to_vec())
                    .unwrap_or_default();
                target_exhibits
                    .into_iter()
                    .filter(|&trait_ref| {
                        self.object(trait_ref)
                            .and_then(|object| object.name())
                            .is_some_and(|name| name == IDENTIFIED_BY)
                    })
                    .collect()
            }
        };

        let copied_traits: Vec<ObjectId> = identity_refs
            .iter()
            .map(|&trait_ref| self.copy_trait_ref(trait_ref))
            .collect();

        // the child context holding the entity reference
        let target_reference = self.objects.alloc(
            ObjectType::EntityRef,
            Some(target_name.clone()),
            ObjectKind::Reference(ReferenceDef {
                named_reference: Some(target_name.clone()),
                simple_named: true,
                ..ReferenceDef::default()
            }),
        );
        let entity_child = self.objects.alloc(
            ObjectType::AttributeContext,
            Some(target_name.clone()),
            ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::Entity,
                definition: Some(target_reference),
                exhibits_traits: copied_traits,
                contents: Vec::new(),
            }),
        );

        // _generatedAttributeSet / round / AddedAttributeIdentity holding
        // the foreign-key attribute reference
        let foreign_key_reference = self.objects.alloc(
            ObjectType::AttributeRef,
            Some(format!("{target_name}_{attribute_name}")),
            ObjectKind::Reference(ReferenceDef {
                named_reference: Some(format!(
                    "{resolved_name}/{RESOLVED_ATTRIBUTE_PROMISE}/{target_name}_{attribute_name}"
                )),
                simple_named: true,
                ..ReferenceDef::default()
            }),
        );
        let added_identity = self.objects.alloc(
            ObjectType::AttributeContext,
            Some("_foreignKey".to_string()),
            ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::AddedAttributeIdentity,
                definition: None,
                exhibits_traits: Vec::new(),
                contents: vec![foreign_key_reference],
            }),
        );
        let round = self.objects.alloc(
            ObjectType::AttributeContext,
            Some("_generatedAttributeRound0".to_string()),
            ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::GeneratedRound,
                definition: None,
                exhibits_traits: Vec::new(),
                contents: vec![added_identity],
            }),
        );
        let generated_set = self.objects.alloc(
            ObjectType::AttributeContext,
            Some("_generatedAttributeSet".to_string()),
            ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::GeneratedSet,
                definition: None,
                exhibits_traits: Vec::new(),
                contents: vec![round],
            }),
        );

        let attribute_context = self.objects.alloc(
            ObjectType::AttributeContext,
            Some(attribute_name.to_string()),
            ObjectKind::AttributeContext(AttributeContextDef {
                context_type: AttributeContextType::AttributeDefinition,
                definition: None,
                exhibits_traits: Vec::new(),
                contents: vec![entity_child, generated_set],
            }),
        );

        // the resolved foreign-key attribute itself
        let resolved_attribute = self.objects.alloc(
            ObjectType::TypeAttribute,
            Some(attribute_name.to_string()),
            ObjectKind::TypeAttribute(TypeAttributeDef::default()),
        );

        Some((attribute_context, resolved_attribute))
    }

    /// Deep-copy a trait reference with fresh argument objects.
    fn copy_trait_ref(&mut self, trait_ref: ObjectId) -> ObjectId {
        let (name, named_reference, arguments) = {
            let Some(object) = self.object(trait_ref) else {
                return trait_ref;
            };
            let Some(reference) = object.as_reference() else {
                return trait_ref;
            };
            (
                object.name().map(str::to_string),
                reference.named_reference.clone(),
                reference.arguments.clone(),
            )
        };

        let mut copied_arguments: Vec<ObjectId> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let (argument_name, value) = {
                let Some(object) = self.object(argument) else {
                    continue;
                };
                let value = match &object.kind {
                    ObjectKind::Argument(def) => def.value.clone(),
                    _ => None,
                };
                (object.name().map(str::to_string), value)
            };
            // value objects owned by another document are copied by name
            // so the cloned tree never reaches across documents
            let value = match value {
                Some(ArgValue::Object(id)) => {
                    let named = self
                        .object(id)
                        .and_then(|object| object.as_reference())
                        .and_then(|reference| reference.named_reference.clone());
                    named.map(|named| {
                        ArgValue::Object(self.objects.alloc(
                            ObjectType::AttributeRef,
                            Some(named.clone()),
                            ObjectKind::Reference(ReferenceDef {
                                named_reference: Some(named),
                                simple_named: true,
                                ..ReferenceDef::default()
                            }),
                        ))
                    })
                }
                other => other,
            };
            copied_arguments.push(self.objects.alloc(
                ObjectType::Argument,
                argument_name,
                ObjectKind::Argument(ArgumentDef {
                    value,
                    resolved_parameter: None,
                }),
            ));
        }

        self.objects.alloc(
            ObjectType::TraitRef,
            name,
            ObjectKind::Reference(ReferenceDef {
                named_reference,
                arguments: copied_arguments,
                ..ReferenceDef::default()
            }),
        )
    }

    /// Unresolved corpus path for a resolved entity path, consulting the
    /// resolved-entity map and stripping the shadow prefix.
    pub(crate) fn unresolved_entity_path(&self, resolved_path: &str) -> String {
        if let Some(mapped) = self.res_ent_map.get(resolved_path) {
            return mapped.clone();
        }
        resolved_path.replace(WRT_SELF_PREFIX, "")
    }

    /// Drop a shadow document created for a resolved entity.
    pub(crate) fn remove_resolved_entity_shadow(&mut self, resolved_entity: ObjectId) {
        let Some(doc) = self.object(resolved_entity).and_then(|object| object.in_document) else {
            return;
        };
        let Some(folder) = self.document(doc).and_then(|document| document.folder) else {
            return;
        };
        if let Some(resolved_path) = self.at_corpus_path(resolved_entity) {
            self.res_ent_map.remove(&resolved_path);
        }
        self.remove_document_objects(folder, doc);
    }
}
