//! The multi-pass indexing pipeline and the staged resolution driver.
//!
//! Every pass runs over the whole set of dirty documents before the next
//! pass starts, so each stage observes the full output of the previous
//! one. The pipeline itself is synchronous; callers have already loaded
//! every document it touches.

use std::collections::HashSet;

use crate::core::StatusLevel;
use crate::error::CdmError;
use crate::model::{ArgValue, DocId, ObjectId, ObjectKind, ObjectType, WalkEvent};
use crate::resolve::{ResolveOptions, ValidationStage};

use super::Corpus;
use super::resolved::is_attribute_promise;

/// One staged resolution pass over a document.
type ResolveAction = fn(&mut Corpus, DocId, &mut ResolveOptions, &mut i32);

#[derive(Debug, Clone, Copy, Default)]
struct TraitScope {
    current_trait: Option<ObjectId>,
    current_parameter: usize,
}

impl Corpus {
    /// Flag a document dirty so the next pipeline run re-indexes it.
    pub fn mark_document_for_indexing(&mut self, doc: DocId) {
        if let Some(document) = self.document_mut(doc) {
            document.needs_indexing = true;
            document.imports_indexed = false;
        }
        self.library.mark_for_indexing(doc);
    }

    /// Run the pipeline over every dirty document. Returns true when all
    /// of them indexed cleanly.
    pub(crate) fn index_documents(&mut self, res_opt: &ResolveOptions) -> bool {
        let mut dirty = Vec::new();
        for doc_id in self.library.list_docs_not_indexed() {
            let claimed = match self.document_mut(doc_id) {
                Some(document) if document.needs_indexing => {
                    document.currently_indexing = true;
                    true
                }
                _ => false,
            };
            if claimed {
                dirty.push(doc_id);
            } else {
                self.library.mark_as_indexed(doc_id);
            }
        }
        if dirty.is_empty() {
            return true;
        }

        // prepare: drop derived state, re-wire imports, rank them
        for &doc_id in &dirty {
            tracing::debug!(
                path = self.document(doc_id).map(|d| d.at_corpus_path()),
                "index start"
            );
            let stale: Vec<usize> = self
                .document(doc_id)
                .map(|document| {
                    document
                        .imports
                        .iter()
                        .enumerate()
                        .filter(|(_, import)| {
                            import.doc.is_some_and(|linked| self.document(linked).is_none())
                        })
                        .map(|(index, _)| index)
                        .collect()
                })
                .unwrap_or_default();
            if let Some(document) = self.document_mut(doc_id) {
                document.clear_caches();
                document.is_valid = true;
                for index in stale {
                    document.imports[index].doc = None;
                }
            }
            self.set_import_documents(doc_id);
            self.ensure_import_priorities(doc_id);
        }

        // check basic integrity
        let mut failed: HashSet<DocId> = HashSet::new();
        for &doc_id in &dirty {
            if !self.check_object_integrity(doc_id) {
                if let Some(document) = self.document_mut(doc_id) {
                    document.is_valid = false;
                }
                failed.insert(doc_id);
            }
        }

        // declare definitions in the objects of each doc
        for &doc_id in &dirty {
            if !failed.contains(&doc_id) {
                self.declare_object_definitions(doc_id);
            }
        }

        // make sure everything named by reference can be found
        for &doc_id in &dirty {
            if !failed.contains(&doc_id) {
                let mut local = res_opt.copy();
                local.wrt_doc = Some(doc_id);
                self.resolve_object_definitions(doc_id, &mut local);
            }
        }

        // resolve trait arguments that are typed objects
        for &doc_id in &dirty {
            if !failed.contains(&doc_id) {
                let mut local = res_opt.copy();
                local.wrt_doc = Some(doc_id);
                self.resolve_trait_arguments(&mut local, doc_id);
            }
        }

        // finish up
        for &doc_id in &dirty {
            tracing::debug!(
                path = self.document(doc_id).map(|d| d.at_corpus_path()),
                "index finish"
            );
            self.finish_document_resolve(doc_id);
        }

        dirty
            .iter()
            .all(|&doc_id| self.document(doc_id).is_some_and(|document| document.is_valid))
    }

    /// Visit every object and ask it to validate itself.
    fn check_object_integrity(&mut self, doc: DocId) -> bool {
        let Some(document) = self.document(doc) else {
            return false;
        };
        let folder_path = document.folder_path.clone();
        let definitions = document.definitions.clone();

        let mut error_count = 0;
        for step in self.objects.walk(&definitions) {
            if step.event != WalkEvent::Pre {
                continue;
            }
            let valid = self
                .objects
                .get(step.object)
                .is_some_and(|object| object.validate());
            if !valid {
                error_count += 1;
                self.report(
                    StatusLevel::Error,
                    &format!("integrity check failed for '{}{}'", folder_path, step.path),
                    Some(&format!("{folder_path}{}", step.path)),
                );
            } else {
                tracing::trace!(path = %step.path, "checked");
            }
        }
        error_count == 0
    }

    /// Register the declared path of every declaration-carrying object.
    fn declare_object_definitions(&mut self, doc: DocId) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let corpus_path_root = format!("{}{}", document.folder_path, document.name);
        let definitions = document.definitions.clone();

        let mut ok = true;
        for step in self.objects.walk(&definitions) {
            if step.event != WalkEvent::Pre {
                continue;
            }
            if step.path.contains("(unspecified)") {
                continue;
            }
            let is_declaration = self
                .objects
                .get(step.object)
                .is_some_and(|object| object.object_type.is_declaration());
            if !is_declaration {
                continue;
            }

            let corpus_path = format!("{corpus_path_root}/{}", step.path);
            let duplicate = self
                .document(doc)
                .is_some_and(|document| document.internal_declarations.contains_key(&step.path));
            if duplicate {
                self.report_error(&CdmError::DuplicateDeclaration(step.path.clone()), Some(&corpus_path));
                ok = false;
                continue;
            }

            if let Some(document) = self.document_mut(doc) {
                document
                    .internal_declarations
                    .insert(step.path.clone(), step.object);
            }
            if let Some(object) = self.objects.get_mut(step.object) {
                object.declared_path = Some(step.path.clone());
            }
            self.register_symbol(&step.path, doc);
            tracing::trace!(path = %corpus_path, "declared");
        }

        if !ok && let Some(document) = self.document_mut(doc) {
            document.is_valid = false;
        }
    }

    /// Resolve every named reference in a document, witnessed by the
    /// document itself.
    fn resolve_object_definitions(&mut self, doc: DocId, res_opt: &mut ResolveOptions) {
        res_opt.indexing_doc = Some(doc);
        let Some(document) = self.document(doc) else {
            return;
        };
        let folder_path = document.folder_path.clone();
        let definitions = document.definitions.clone();

        for step in self.objects.walk(&definitions) {
            match step.event {
                WalkEvent::Pre => {
                    let named = match self.objects.get(step.object) {
                        Some(object) if object.object_type.is_reference() => {
                            object.as_reference().and_then(|reference| {
                                // explicit references carry their own
                                // definition
                                if reference.explicit_reference.is_some() {
                                    None
                                } else {
                                    reference.named_reference.clone()
                                }
                            })
                        }
                        _ => continue,
                    };
                    let Some(named) = named else {
                        continue;
                    };
                    // attribute promises only exist after attribute
                    // resolution; leave them for later
                    if is_attribute_promise(&named) {
                        continue;
                    }
                    let expected_type = self
                        .objects
                        .get(step.object)
                        .map(|object| object.object_type)
                        .unwrap_or(ObjectType::Error);
                    let resolved = self.resolve_symbol_reference(
                        res_opt,
                        Some(doc),
                        &named,
                        expected_type,
                        true,
                    );
                    if resolved.is_none() {
                        let error = CdmError::UnresolvedSymbol(named.clone());
                        let message = format!(
                            "{error}, folderPath: '{folder_path}', path: '{}'",
                            step.path
                        );
                        let level = if res_opt.shallow_validation {
                            StatusLevel::Warning
                        } else {
                            StatusLevel::Error
                        };
                        self.report(level, &message, Some(&format!("{folder_path}{}", step.path)));
                    } else {
                        tracing::trace!(path = %step.path, reference = %named, "resolved");
                    }
                }
                WalkEvent::Post => {
                    let is_parameter = self
                        .objects
                        .get(step.object)
                        .is_some_and(|object| object.object_type == ObjectType::Parameter);
                    if is_parameter {
                        // a parameter with an object data type must carry
                        // a default of the right kind
                        self.const_type_check(res_opt, doc, step.object, None);
                    }
                }
            }
        }

        res_opt.indexing_doc = None;
    }

    /// Check (and coerce) a value against a parameter's data type.
    ///
    /// Returns the replacement value when the check promoted a string to
    /// a reference, the original otherwise.
    pub(crate) fn const_type_check(
        &mut self,
        res_opt: &mut ResolveOptions,
        doc: DocId,
        parameter: ObjectId,
        value: Option<ArgValue>,
    ) -> Option<ArgValue> {
        let (parameter_name, data_type_ref, default_value) = {
            let object = self.object(parameter)?;
            let name = object.name().unwrap_or_default().to_string();
            match &object.kind {
                ObjectKind::Parameter(def) => (name, def.data_type?, def.default_value.clone()),
                _ => return value,
            }
        };

        let Some(data_type) = self.fetch_object_definition(data_type_ref, res_opt) else {
            self.report(
                StatusLevel::Error,
                &format!("parameter '{parameter_name}' has an unexpected data type"),
                None,
            );
            return None;
        };

        // compare with the passed-in value or the parameter default
        let mut replacement = value.clone();
        let p_value = match value {
            Some(value) => Some(value),
            None => {
                replacement = default_value.clone();
                default_value
            }
        };
        let Some(p_value) = p_value else {
            return replacement;
        };

        if !self.is_derived_from(data_type, "cdmObject", res_opt) {
            return replacement;
        }

        let expectation: Option<(&str, Vec<ObjectType>)> =
            if self.is_derived_from(data_type, "entity", res_opt) {
                Some((
                    "entity",
                    vec![
                        ObjectType::ConstantEntity,
                        ObjectType::EntityRef,
                        ObjectType::Entity,
                    ],
                ))
            } else if self.is_derived_from(data_type, "attribute", res_opt) {
                Some((
                    "attribute",
                    vec![
                        ObjectType::AttributeRef,
                        ObjectType::TypeAttribute,
                        ObjectType::EntityAttribute,
                    ],
                ))
            } else if self.is_derived_from(data_type, "dataType", res_opt) {
                Some(("dataType", vec![ObjectType::DataTypeRef, ObjectType::DataType]))
            } else if self.is_derived_from(data_type, "purpose", res_opt) {
                Some(("purpose", vec![ObjectType::PurposeRef, ObjectType::Purpose]))
            } else if self.is_derived_from(data_type, "trait", res_opt) {
                Some(("trait", vec![ObjectType::TraitRef, ObjectType::Trait]))
            } else if self.is_derived_from(data_type, "attributeGroup", res_opt) {
                Some((
                    "attributeGroup",
                    vec![ObjectType::AttributeGroupRef, ObjectType::AttributeGroup],
                ))
            } else {
                None
            };

        let Some((expected, expected_types)) = expectation else {
            self.report(
                StatusLevel::Error,
                &format!("parameter '{parameter_name}' has an unexpected data type"),
                None,
            );
            return replacement;
        };

        let mut found_type = ObjectType::Error;
        let mut found_desc = parameter_name.clone();
        match &p_value {
            ArgValue::Object(id) => {
                if let Some(object) = self.object(*id) {
                    found_type = object.object_type;
                }
            }
            ArgValue::Text(text) => {
                if text.eq_ignore_ascii_case("this.attribute") && expected == "attribute" {
                    // sorted out later when resolving traits
                    found_type = ObjectType::AttributeRef;
                } else {
                    found_desc = text.clone();
                    if is_attribute_promise(text) {
                        // an object there will resolve after attributes do
                        replacement = self.make_attribute_promise(text, doc);
                        found_type = ObjectType::AttributeRef;
                    } else if let Some(found) = self.resolve_symbol_reference(
                        res_opt,
                        Some(doc),
                        text,
                        ObjectType::Error,
                        true,
                    ) {
                        if expected == "attribute" {
                            replacement = self.make_attribute_promise(text, doc);
                            found_type = ObjectType::AttributeRef;
                        } else {
                            found_type = self
                                .object(found)
                                .map(|object| object.object_type)
                                .unwrap_or(ObjectType::Error);
                            replacement = Some(ArgValue::Object(found));
                        }
                    }
                }
            }
        }

        if !expected_types.contains(&found_type) {
            let error = CdmError::ParameterTypeMismatch {
                parameter: parameter_name,
                expected: expected.to_string(),
                value: found_desc,
            };
            let level = if res_opt.shallow_validation {
                StatusLevel::Warning
            } else {
                StatusLevel::Error
            };
            self.report(level, &error.to_string(), None);
        } else {
            tracing::trace!(value = %found_desc, "resolved parameter value");
        }

        replacement
    }

    fn make_attribute_promise(&mut self, text: &str, doc: DocId) -> Option<ArgValue> {
        let reference = self.make_object(ObjectType::AttributeRef, Some(text), true)?;
        if let Some(object) = self.object_mut(reference) {
            object.in_document = Some(doc);
        }
        Some(ArgValue::Object(reference))
    }

    /// Bind every trait-reference argument to its parameter, type
    /// checking the values; latches `resolved_arguments`.
    fn resolve_trait_arguments(&mut self, res_opt: &mut ResolveOptions, doc: DocId) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let definitions = document.definitions.clone();

        let mut scopes: Vec<TraitScope> = Vec::new();
        for step in self.objects.walk(&definitions) {
            let object_type = match self.objects.get(step.object) {
                Some(object) => object.object_type,
                None => continue,
            };
            match (step.event, object_type) {
                (WalkEvent::Pre, ObjectType::TraitRef) => {
                    let current_trait = self.fetch_object_definition(step.object, res_opt);
                    scopes.push(TraitScope {
                        current_trait,
                        current_parameter: 0,
                    });
                }
                (WalkEvent::Pre, ObjectType::Argument) => {
                    let Some(scope_index) = scopes.len().checked_sub(1) else {
                        continue;
                    };
                    let Some(trait_def) = scopes[scope_index].current_trait else {
                        continue;
                    };
                    let parameters = self.fetch_all_parameters(trait_def, res_opt);
                    let ordinal = scopes[scope_index].current_parameter;
                    let argument_name = self
                        .objects
                        .get(step.object)
                        .and_then(|object| object.name())
                        .map(str::to_string);

                    let parameter_found = match &argument_name {
                        Some(name) => parameters.iter().copied().find(|&parameter| {
                            self.object(parameter)
                                .and_then(|object| object.name())
                                .is_some_and(|parameter_name| parameter_name == name)
                        }),
                        None => parameters.get(ordinal).copied(),
                    };

                    match parameter_found {
                        Some(parameter) => {
                            let argument_value = match self
                                .objects
                                .get(step.object)
                                .map(|object| &object.kind)
                            {
                                Some(ObjectKind::Argument(def)) => def.value.clone(),
                                _ => None,
                            };
                            let new_value =
                                self.const_type_check(res_opt, doc, parameter, argument_value);
                            if let Some(object) = self.objects.get_mut(step.object)
                                && let ObjectKind::Argument(def) = &mut object.kind
                            {
                                def.resolved_parameter = Some(parameter);
                                if new_value.is_some() {
                                    def.value = new_value;
                                }
                            }
                        }
                        None => {
                            let trait_name = self
                                .object(trait_def)
                                .and_then(|object| object.name())
                                .unwrap_or_default()
                                .to_string();
                            self.report(
                                StatusLevel::Error,
                                &format!("failed to resolve a parameter on trait '{trait_name}'"),
                                Some(&step.path),
                            );
                        }
                    }
                    scopes[scope_index].current_parameter += 1;
                }
                (WalkEvent::Post, ObjectType::TraitRef) => {
                    if let Some(object) = self.objects.get_mut(step.object)
                        && let Some(reference) = object.as_reference_mut()
                    {
                        reference.resolved_arguments = true;
                    }
                    scopes.pop();
                }
                _ => {}
            }
        }
    }

    /// Flip a document's flags to their indexed state and dequeue it.
    fn finish_document_resolve(&mut self, doc: DocId) {
        if let Some(document) = self.document_mut(doc) {
            document.currently_indexing = false;
            document.imports_indexed = true;
            document.needs_indexing = false;
        }
        self.library.mark_as_indexed(doc);
    }

    // ============================================================
    // Staged resolution driver
    // ============================================================

    /// Resolve references in stages and validate, returning the stage
    /// that should run next.
    pub async fn resolve_references_and_validate(
        &mut self,
        stage: ValidationStage,
        stage_through: ValidationStage,
        res_opt: Option<&ResolveOptions>,
    ) -> ValidationStage {
        // use the provided directives or the corpus default
        let directives = res_opt
            .map(|options| options.directives.clone())
            .unwrap_or_else(|| self.default_resolution_directives().clone());

        for doc in self.library.list_all_documents() {
            self.index_if_needed(doc, false).await;
        }

        let mut options = ResolveOptions {
            directives,
            ..ResolveOptions::default()
        };

        let finish_resolve = stage_through == stage;
        match stage {
            ValidationStage::Start | ValidationStage::TraitAppliers => self.resolve_references_step(
                "defining traits",
                None,
                &mut options,
                true,
                finish_resolve || stage_through == ValidationStage::MinimumForResolving,
                ValidationStage::Traits,
            ),
            ValidationStage::Traits => {
                self.resolve_references_step(
                    "resolving traits",
                    Some(Self::resolve_traits_pass),
                    &mut options,
                    false,
                    finish_resolve,
                    ValidationStage::Traits,
                );
                self.resolve_references_step(
                    "checking required arguments",
                    Some(Self::required_arguments_pass),
                    &mut options,
                    true,
                    finish_resolve,
                    ValidationStage::Attributes,
                )
            }
            ValidationStage::Attributes => self.resolve_references_step(
                "resolving attributes",
                Some(Self::resolve_attributes_pass),
                &mut options,
                true,
                finish_resolve,
                ValidationStage::EntityReferences,
            ),
            ValidationStage::EntityReferences => self.resolve_references_step(
                "resolving foreign key references",
                Some(Self::resolve_foreign_keys_pass),
                &mut options,
                true,
                true,
                ValidationStage::Finished,
            ),
            // the bad step
            _ => ValidationStage::Error,
        }
    }

    fn resolve_references_step(
        &mut self,
        message: &str,
        action: Option<ResolveAction>,
        res_opt: &mut ResolveOptions,
        stage_finished: bool,
        finish_resolve: bool,
        next_stage: ValidationStage,
    ) -> ValidationStage {
        self.report(StatusLevel::Progress, message, None);

        let mut entity_nesting = 0;
        if let Some(action) = action {
            for doc in self.library.list_all_documents() {
                res_opt.wrt_doc = Some(doc);
                action(self, doc, res_opt, &mut entity_nesting);
            }
        }

        if stage_finished && finish_resolve {
            self.finish_resolve();
            return ValidationStage::Finished;
        }
        next_stage
    }

    fn finish_resolve(&mut self) {
        tracing::debug!("finishing resolve");
        for doc in self.library.list_all_documents() {
            self.finish_document_resolve(doc);
        }
    }

    /// Resolve the trait sets of every definition, entering entities and
    /// groups only at the outer nesting level.
    fn resolve_traits_pass(
        &mut self,
        doc: DocId,
        res_opt: &mut ResolveOptions,
        entity_nesting: &mut i32,
    ) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let definitions = document.definitions.clone();

        for step in self.objects.walk(&definitions) {
            let object_type = match self.objects.get(step.object) {
                Some(object) => object.object_type,
                None => continue,
            };
            match step.event {
                WalkEvent::Pre => match object_type {
                    ObjectType::Trait
                    | ObjectType::Purpose
                    | ObjectType::DataType
                    | ObjectType::Entity
                    | ObjectType::AttributeGroup => {
                        if matches!(object_type, ObjectType::Entity | ObjectType::AttributeGroup) {
                            *entity_nesting += 1;
                            // nested entities and groups resolve with
                            // their host
                            if *entity_nesting > 1 {
                                continue;
                            }
                        }
                        self.fetch_resolved_traits(step.object, res_opt);
                    }
                    ObjectType::EntityAttribute | ObjectType::TypeAttribute => {
                        self.fetch_resolved_traits(step.object, res_opt);
                    }
                    _ => {}
                },
                WalkEvent::Post => {
                    if matches!(object_type, ObjectType::Entity | ObjectType::AttributeGroup) {
                        *entity_nesting -= 1;
                    }
                }
            }
        }
    }

    /// Verify that every required trait parameter received a value.
    fn required_arguments_pass(
        &mut self,
        doc: DocId,
        res_opt: &mut ResolveOptions,
        _entity_nesting: &mut i32,
    ) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let definitions = document.definitions.clone();

        for step in self.objects.walk(&definitions) {
            if step.event != WalkEvent::Post {
                continue;
            }
            let (object_type, children) = match self.objects.get(step.object) {
                Some(object) => (
                    object.object_type,
                    match &object.kind {
                        ObjectKind::Entity(def) => def.attributes.clone(),
                        ObjectKind::AttributeGroup(def) => def.members.clone(),
                        _ => Vec::new(),
                    },
                ),
                None => continue,
            };
            if !matches!(object_type, ObjectType::Entity | ObjectType::AttributeGroup) {
                continue;
            }
            self.check_required_arguments(step.object, res_opt);
            for child in children {
                self.check_required_arguments(child, res_opt);
            }
        }
    }

    fn check_required_arguments(&mut self, id: ObjectId, res_opt: &mut ResolveOptions) {
        let resolved_traits = self.fetch_resolved_traits(id, res_opt);
        let object_name = self
            .object(id)
            .and_then(|object| object.name())
            .unwrap_or_default()
            .to_string();

        for resolved_trait in &resolved_traits.set {
            let mut found = 0;
            let mut resolved = 0;
            for (index, &parameter) in resolved_trait.parameters.iter().enumerate() {
                let required = matches!(
                    self.object(parameter).map(|object| &object.kind),
                    Some(ObjectKind::Parameter(def)) if def.required
                );
                if !required {
                    continue;
                }
                found += 1;
                if resolved_trait.values.get(index).is_some_and(Option::is_some) {
                    resolved += 1;
                } else {
                    let parameter_name = self
                        .object(parameter)
                        .and_then(|object| object.name())
                        .unwrap_or_default()
                        .to_string();
                    let error = CdmError::MissingRequiredArgument {
                        parameter: parameter_name,
                        trait_name: resolved_trait.trait_name.clone(),
                    };
                    self.report(
                        StatusLevel::Error,
                        &format!("{error} on '{object_name}'"),
                        None,
                    );
                }
            }
            if found > 0 && found == resolved {
                tracing::trace!(
                    trait_name = %resolved_trait.trait_name,
                    object = %object_name,
                    required = found,
                    "required parameters resolved"
                );
            }
        }
    }

    /// Resolve attribute shapes for outer-level entities and groups.
    fn resolve_attributes_pass(
        &mut self,
        doc: DocId,
        res_opt: &mut ResolveOptions,
        entity_nesting: &mut i32,
    ) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let definitions = document.definitions.clone();

        for step in self.objects.walk(&definitions) {
            let object_type = match self.objects.get(step.object) {
                Some(object) => object.object_type,
                None => continue,
            };
            if !matches!(object_type, ObjectType::Entity | ObjectType::AttributeGroup) {
                continue;
            }
            match step.event {
                WalkEvent::Pre => {
                    *entity_nesting += 1;
                    if *entity_nesting == 1 {
                        self.fetch_resolved_attribute_names(step.object, res_opt);
                    }
                }
                WalkEvent::Post => *entity_nesting -= 1,
            }
        }
    }

    /// Resolve entity references (the foreign-key side) for outer-level
    /// entities.
    fn resolve_foreign_keys_pass(
        &mut self,
        doc: DocId,
        res_opt: &mut ResolveOptions,
        entity_nesting: &mut i32,
    ) {
        let Some(document) = self.document(doc) else {
            return;
        };
        let definitions = document.definitions.clone();

        for step in self.objects.walk(&definitions) {
            let object_type = match self.objects.get(step.object) {
                Some(object) => object.object_type,
                None => continue,
            };
            if !matches!(object_type, ObjectType::Entity | ObjectType::AttributeGroup) {
                continue;
            }
            match step.event {
                WalkEvent::Pre => {
                    *entity_nesting += 1;
                    if object_type == ObjectType::Entity && *entity_nesting == 1 {
                        let references = self.fetch_resolved_entity_references(step.object, res_opt);
                        tracing::trace!(
                            path = %step.path,
                            references = references.len(),
                            "entity references resolved"
                        );
                    }
                }
                WalkEvent::Post => *entity_nesting -= 1,
            }
        }
    }
}
