//! Entity-relationship extraction from resolved attribute-context trees.

use crate::core::StatusLevel;
use crate::model::{
    AttributeContextType, DocId, E2ERelationship, ObjectId, ObjectKind, ObjectType,
};
use crate::resolve::{DirectiveSet, ResolveOptions};

use super::Corpus;
use super::loader::CorpusObject;
use super::resolved::{IDENTIFIED_BY, WRT_SELF_PREFIX};

impl Corpus {
    /// The manifest definition carried by a document, if any.
    pub fn manifest_object(&self, doc: DocId) -> Option<ObjectId> {
        self.document(doc)?
            .definitions
            .iter()
            .copied()
            .find(|&definition| {
                self.object(definition)
                    .is_some_and(|object| object.object_type == ObjectType::Manifest)
            })
    }

    /// Calculate entity-to-entity relationships for every entity declared
    /// in a manifest and its sub-manifests, populating the outgoing and
    /// incoming maps.
    ///
    /// Safe to re-run: an entity's previous relationships are replaced,
    /// and mirrors are kept consistent.
    pub async fn calculate_entity_graph(&mut self, manifest: ObjectId) {
        let (entities, sub_manifests) = match self.object(manifest).map(|object| &object.kind) {
            Some(ObjectKind::Manifest(def)) => (def.entities.clone(), def.sub_manifests.clone()),
            _ => return,
        };

        for declaration in entities {
            let entity_path = match self.object(declaration).map(|object| &object.kind) {
                Some(ObjectKind::EntityDeclaration(def)) => def.entity_path.clone(),
                _ => continue,
            };
            let Some(entity) = self
                .fetch_object(&entity_path, Some(declaration), false)
                .await
                .and_then(CorpusObject::as_object)
            else {
                continue;
            };

            // make options wrt this entity's document and "relational" always
            let Some(entity_doc) = self.object(entity).and_then(|object| object.in_document)
            else {
                continue;
            };
            let res_opt = ResolveOptions::with_document(
                entity_doc,
                DirectiveSet::from_directives(["normalized", "referenceOnly"]),
            );

            let is_resolved_entity = self
                .object(entity)
                .and_then(|object| object.as_entity())
                .is_some_and(|def| def.attribute_context.is_some());

            // only create a resolved shadow when the entity passed in was
            // not already resolved
            let res_entity = if is_resolved_entity {
                entity
            } else {
                let entity_name = self
                    .object(entity)
                    .and_then(|object| object.name())
                    .unwrap_or_default()
                    .to_string();
                match self.create_resolved_entity(
                    entity,
                    &format!("{WRT_SELF_PREFIX}{entity_name}"),
                    &res_opt,
                ) {
                    Ok(resolved) => resolved,
                    Err(error) => {
                        self.report_error(&error, Some(&entity_path));
                        continue;
                    }
                }
            };

            let attribute_context = self
                .object(res_entity)
                .and_then(|object| object.as_entity())
                .and_then(|def| def.attribute_context);
            let outgoing = self.find_outgoing_relationships(
                &res_opt,
                res_entity,
                attribute_context,
                is_resolved_entity,
                None,
            );

            // the shadow lives only for this walk
            if !is_resolved_entity {
                self.remove_resolved_entity_shadow(res_entity);
            }

            let Some(entity_key) = self.at_corpus_path(entity) else {
                continue;
            };

            // rerunning replaces: retract the mirrors of the previous run
            if let Some(previous) = self.outgoing_relationships.get(&entity_key).cloned() {
                for relationship in previous {
                    if let Some(incoming) =
                        self.incoming_relationships.get_mut(&relationship.to_entity)
                    {
                        incoming.retain(|existing| existing != &relationship);
                    }
                }
            }
            self.outgoing_relationships
                .insert(entity_key.clone(), outgoing.clone());

            // flip the outgoing list to feed the incoming map
            for relationship in outgoing {
                let target_exists = self
                    .fetch_object(&relationship.to_entity, Some(manifest), false)
                    .await
                    .and_then(CorpusObject::as_object)
                    .is_some();
                if !target_exists {
                    self.report(
                        StatusLevel::Warning,
                        &format!(
                            "relationship target '{}' could not be fetched",
                            relationship.to_entity
                        ),
                        Some(&relationship.to_entity),
                    );
                    continue;
                }
                let incoming = self
                    .incoming_relationships
                    .entry(relationship.to_entity.clone())
                    .or_default();
                if !incoming.contains(&relationship) {
                    incoming.push(relationship);
                }
            }
        }

        for sub_declaration in sub_manifests {
            let definition = match self.object(sub_declaration).map(|object| &object.kind) {
                Some(ObjectKind::ManifestDeclaration(def)) => def.definition.clone(),
                _ => continue,
            };
            let sub_manifest = match self
                .fetch_object(&definition, Some(sub_declaration), false)
                .await
            {
                Some(CorpusObject::Document(doc)) => self.manifest_object(doc),
                Some(CorpusObject::Object(id)) => Some(id),
                _ => None,
            };
            if let Some(sub_manifest) = sub_manifest {
                Box::pin(self.calculate_entity_graph(sub_manifest)).await;
            }
        }
    }

    /// Walk a resolved attribute-context tree looking for entity
    /// references; each one, paired with the nearest generated attribute
    /// set, yields a relationship.
    fn find_outgoing_relationships(
        &mut self,
        res_opt: &ResolveOptions,
        res_entity: ObjectId,
        attribute_context: Option<ObjectId>,
        is_resolved_entity: bool,
        generated_att_set: Option<ObjectId>,
    ) -> Vec<E2ERelationship> {
        let mut out_rels = Vec::new();
        let Some(context_id) = attribute_context else {
            return out_rels;
        };
        let contents = match self
            .object(context_id)
            .and_then(|object| object.as_attribute_context())
        {
            Some(context) => context.contents.clone(),
            None => return out_rels,
        };

        // the nearest _generatedAttributeSet above or beside an entity
        // reference holds its foreign key
        let new_gen_set = contents
            .iter()
            .copied()
            .find(|&child| {
                self.object(child).is_some_and(|object| {
                    object.object_type == ObjectType::AttributeContext
                        && object.name() == Some("_generatedAttributeSet")
                })
            })
            .or(generated_att_set);

        for child_id in contents {
            let is_context = self
                .object(child_id)
                .is_some_and(|object| object.object_type == ObjectType::AttributeContext);
            if !is_context {
                continue;
            }

            let (child_name, definition, exhibits) = {
                let Some(object) = self.object(child_id) else {
                    continue;
                };
                let name = object.name().unwrap_or_default().to_string();
                let Some(context) = object.as_attribute_context() else {
                    continue;
                };
                (name, context.definition, context.exhibits_traits.clone())
            };

            let definition_is_entity_ref = definition.is_some_and(|def_ref| {
                self.object(def_ref)
                    .is_some_and(|object| object.object_type == ObjectType::EntityRef)
            });
            if definition_is_entity_ref
                && let Some(def_ref) = definition
            {
                // entity references should carry the identifying trait
                let to_att = self.identified_by_attributes(&exhibits);
                let to_entity = {
                    let mut options = res_opt.clone();
                    self.fetch_object_definition(def_ref, &mut options)
                };

                if to_att.len() == 1
                    && let Some(to_entity) = to_entity
                    && let Some(foreign_key) = self.find_added_attribute_identity(new_gen_set)
                    && !foreign_key.is_empty()
                {
                    let last_segment = foreign_key.rsplit('/').next().unwrap_or(&foreign_key);
                    let prefix = format!("{child_name}_");
                    let from_att = last_segment
                        .strip_prefix(prefix.as_str())
                        .unwrap_or(last_segment)
                        .to_string();

                    let relationship = if is_resolved_entity {
                        let from_entity = self.at_corpus_path(res_entity).unwrap_or_default();
                        let to_path = self.at_corpus_path(to_entity).unwrap_or_default();
                        E2ERelationship {
                            from_entity,
                            from_entity_attribute: from_att,
                            to_entity: self.unresolved_entity_path(&to_path),
                            to_entity_attribute: to_att[0].clone(),
                        }
                    } else {
                        // find the unresolved entity through the root
                        // context's back reference
                        let unresolved = self
                            .object(res_entity)
                            .and_then(|object| object.as_entity())
                            .and_then(|def| def.attribute_context)
                            .and_then(|root| {
                                self.object(root)
                                    .and_then(|object| object.as_attribute_context())
                                    .and_then(|context| context.definition)
                            })
                            .and_then(|back_reference| {
                                let mut options = res_opt.clone();
                                self.fetch_object_definition(back_reference, &mut options)
                            });
                        let from_entity = match unresolved {
                            Some(unresolved_entity) => self
                                .at_corpus_path(unresolved_entity)
                                .unwrap_or_default(),
                            None => self
                                .at_corpus_path(res_entity)
                                .unwrap_or_default()
                                .replace(WRT_SELF_PREFIX, ""),
                        };
                        E2ERelationship {
                            from_entity,
                            from_entity_attribute: from_att,
                            to_entity: self.at_corpus_path(to_entity).unwrap_or_default(),
                            to_entity_attribute: to_att[0].clone(),
                        }
                    };
                    out_rels.push(relationship);
                }
            }

            // repeat the process on the child node
            out_rels.extend(self.find_outgoing_relationships(
                res_opt,
                res_entity,
                Some(child_id),
                is_resolved_entity,
                new_gen_set,
            ));
        }

        out_rels
    }

    /// Attribute names carried by `is.identifiedBy` traits: the final
    /// path segment of each trait's first argument.
    fn identified_by_attributes(&self, exhibits: &[ObjectId]) -> Vec<String> {
        let mut attributes = Vec::new();
        for &trait_ref in exhibits {
            let Some(object) = self.object(trait_ref) else {
                continue;
            };
            if object.name() != Some(IDENTIFIED_BY) {
                continue;
            }
            let Some(reference) = object.as_reference() else {
                continue;
            };
            let Some(&first_argument) = reference.arguments.first() else {
                continue;
            };
            let named = self
                .object(first_argument)
                .and_then(|argument| match &argument.kind {
                    ObjectKind::Argument(def) => def.value.clone(),
                    _ => None,
                })
                .and_then(|value| match value {
                    crate::model::ArgValue::Text(text) => Some(text),
                    crate::model::ArgValue::Object(id) => self
                        .object(id)
                        .and_then(|object| object.as_reference())
                        .and_then(|reference| reference.named_reference.clone()),
                });
            if let Some(named) = named {
                let segment = named.rsplit('/').next().unwrap_or(&named);
                attributes.push(segment.to_string());
            }
        }
        attributes
    }

    /// Search a generated attribute set for the foreign key: the named
    /// reference inside the first `AddedAttributeIdentity` node, skipping
    /// nested entity contexts.
    fn find_added_attribute_identity(&self, context: Option<ObjectId>) -> Option<String> {
        let context_def = self
            .object(context?)
            .and_then(|object| object.as_attribute_context())?;
        for &sub in &context_def.contents {
            let Some(sub_context) = self
                .object(sub)
                .and_then(|object| object.as_attribute_context())
            else {
                continue;
            };
            if sub_context.context_type == AttributeContextType::Entity {
                continue;
            }
            if let Some(foreign_key) = self.find_added_attribute_identity(Some(sub)) {
                return Some(foreign_key);
            }
            if sub_context.context_type == AttributeContextType::AddedAttributeIdentity
                && let Some(&first) = sub_context.contents.first()
            {
                // the foreign key is the first entry of the identity node
                return self
                    .object(first)
                    .and_then(|object| object.as_reference())
                    .and_then(|reference| reference.named_reference.clone());
            }
        }
        None
    }
}
