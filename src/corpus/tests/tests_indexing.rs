#![allow(clippy::unwrap_used)]
use super::{capture_events, corpus, declared, doc_from_json, doc_with_entities};
use crate::model::{ArgValue, ObjectKind, ObjectType};
use crate::resolve::{ResolveOptions, ValidationStage};

const FOUNDATION: &str = r#"{
    "definitions": [
        {"dataTypeName": "cdmObject"},
        {"dataTypeName": "attribute", "extendsDataType": "cdmObject"},
        {"dataTypeName": "integer"}
    ]
}"#;

const IDENTIFIED_BY: &str = r#"{
    "imports": [{"corpusPath": "foundation.cdm.json"}],
    "definitions": [
        {
            "traitName": "is.identifiedBy",
            "hasParameters": [
                {"name": "attribute", "dataType": "attribute", "required": true}
            ]
        }
    ]
}"#;

#[test]
fn test_pipeline_flips_document_flags() {
    let mut corpus = corpus();
    let doc = doc_with_entities(&mut corpus, "a.cdm.json", &["A"]);
    assert!(corpus.document(doc).unwrap().needs_indexing);

    assert!(corpus.index_documents(&ResolveOptions::default()));

    let document = corpus.document(doc).unwrap();
    assert!(!document.needs_indexing);
    assert!(!document.currently_indexing);
    assert!(document.imports_indexed);
    assert!(document.is_valid);
    assert!(!corpus.library.has_docs_not_indexed());
}

#[test]
fn test_declarations_land_in_symbol_table() {
    let mut corpus = corpus();
    let doc = doc_from_json(
        &mut corpus,
        "order.cdm.json",
        r#"{
            "definitions": [
                {
                    "entityName": "Order",
                    "hasAttributes": [{"name": "OrderId", "dataType": "integer"}]
                }
            ]
        }"#,
    );
    corpus.index_documents(&ResolveOptions::default());

    assert_eq!(corpus.symbol_documents("Order"), Some(&[doc][..]));
    assert_eq!(
        corpus.symbol_documents("Order/hasAttributes/OrderId"),
        Some(&[doc][..])
    );

    // declared paths are recorded on the objects
    let attribute = declared(&corpus, doc, "Order/hasAttributes/OrderId").unwrap();
    assert_eq!(
        corpus.object(attribute).unwrap().declared_path.as_deref(),
        Some("Order/hasAttributes/OrderId")
    );
}

#[test]
fn test_duplicate_declaration_fails_document() {
    let mut corpus = corpus();
    let events = capture_events(&mut corpus);
    let doc = doc_with_entities(&mut corpus, "dup.cdm.json", &["Foo", "Foo"]);

    assert!(!corpus.index_documents(&ResolveOptions::default()));
    assert!(!corpus.document(doc).unwrap().is_valid);

    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|event| event.message.contains("duplicate declaration for 'Foo'"))
    );
}

#[test]
fn test_unresolved_reference_reported() {
    let mut corpus = corpus();
    let events = capture_events(&mut corpus);
    doc_from_json(
        &mut corpus,
        "order.cdm.json",
        r#"{
            "definitions": [
                {"entityName": "Order", "extendsEntity": "MissingBase"}
            ]
        }"#,
    );
    corpus.index_documents(&ResolveOptions::default());

    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|event| event.message.contains("unable to resolve the reference 'MissingBase'"))
    );
}

#[test]
fn test_trait_arguments_bind_to_parameters() {
    let mut corpus = corpus();
    doc_from_json(&mut corpus, "foundation.cdm.json", FOUNDATION);
    doc_from_json(&mut corpus, "identified.cdm.json", IDENTIFIED_BY);
    let order = doc_from_json(
        &mut corpus,
        "order.cdm.json",
        r#"{
            "imports": [{"corpusPath": "identified.cdm.json"}],
            "definitions": [
                {
                    "entityName": "Order",
                    "exhibitsTraits": [
                        {
                            "traitReference": "is.identifiedBy",
                            "arguments": ["Order/(resolvedAttributes)/OrderId"]
                        }
                    ]
                }
            ]
        }"#,
    );
    assert!(corpus.index_documents(&ResolveOptions::default()));

    let entity = declared(&corpus, order, "Order").unwrap();
    let trait_ref = {
        let entity_def = corpus.object(entity).unwrap().as_entity().unwrap();
        entity_def.exhibits_traits[0]
    };
    let reference = corpus.object(trait_ref).unwrap().as_reference().unwrap();
    assert!(reference.resolved_arguments);

    let argument = reference.arguments[0];
    let ObjectKind::Argument(argument_def) = &corpus.object(argument).unwrap().kind else {
        panic!("expected an argument");
    };
    // bound to the trait's parameter, value promoted to a reference
    assert!(argument_def.resolved_parameter.is_some());
    assert!(matches!(argument_def.value, Some(ArgValue::Object(_))));

    let parameter = argument_def.resolved_parameter.unwrap();
    assert_eq!(
        corpus.object(parameter).unwrap().name(),
        Some("attribute")
    );
}

#[test]
fn test_parameter_type_mismatch_reported() {
    let mut corpus = corpus();
    let events = capture_events(&mut corpus);
    doc_from_json(&mut corpus, "foundation.cdm.json", FOUNDATION);
    doc_from_json(&mut corpus, "identified.cdm.json", IDENTIFIED_BY);
    doc_from_json(
        &mut corpus,
        "order.cdm.json",
        r#"{
            "imports": [{"corpusPath": "identified.cdm.json"}],
            "definitions": [
                {
                    "entityName": "Order",
                    "exhibitsTraits": [
                        {
                            "traitReference": "is.identifiedBy",
                            "arguments": ["NoSuchAttributeAnywhere"]
                        }
                    ]
                }
            ]
        }"#,
    );
    corpus.index_documents(&ResolveOptions::default());

    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|event| event.message.contains("does not resolve to a known 'attribute'"))
    );
}

#[tokio::test]
async fn test_missing_required_argument_reported() {
    let mut corpus = corpus();
    let events = capture_events(&mut corpus);
    doc_from_json(&mut corpus, "foundation.cdm.json", FOUNDATION);
    doc_from_json(&mut corpus, "identified.cdm.json", IDENTIFIED_BY);
    doc_from_json(
        &mut corpus,
        "order.cdm.json",
        r#"{
            "imports": [{"corpusPath": "identified.cdm.json"}],
            "definitions": [
                {
                    "entityName": "Order",
                    "exhibitsTraits": ["is.identifiedBy"]
                }
            ]
        }"#,
    );

    let next = corpus
        .resolve_references_and_validate(ValidationStage::Traits, ValidationStage::Traits, None)
        .await;
    assert_eq!(next, ValidationStage::Finished);

    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|event| event
                .message
                .contains("no argument supplied for required parameter 'attribute'"))
    );
}

#[tokio::test]
async fn test_validation_stage_progression() {
    let mut corpus = corpus();
    doc_with_entities(&mut corpus, "a.cdm.json", &["A"]);

    let next = corpus
        .resolve_references_and_validate(
            ValidationStage::Start,
            ValidationStage::EntityReferences,
            None,
        )
        .await;
    assert_eq!(next, ValidationStage::Traits);

    let next = corpus
        .resolve_references_and_validate(next, ValidationStage::EntityReferences, None)
        .await;
    assert_eq!(next, ValidationStage::Attributes);

    let next = corpus
        .resolve_references_and_validate(next, ValidationStage::EntityReferences, None)
        .await;
    assert_eq!(next, ValidationStage::EntityReferences);

    let next = corpus
        .resolve_references_and_validate(next, ValidationStage::EntityReferences, None)
        .await;
    assert_eq!(next, ValidationStage::Finished);
}

#[test]
fn test_invalid_object_fails_integrity() {
    let mut corpus = corpus();
    let events = capture_events(&mut corpus);

    // an entity attribute without a target entity is not valid
    let mut doc = crate::model::Document::new("broken.cdm.json", "local", "/");
    let attribute = corpus
        .make_object(ObjectType::EntityAttribute, Some("Dangling"), false)
        .unwrap();
    let entity = corpus
        .make_object(ObjectType::Entity, Some("Broken"), false)
        .unwrap();
    if let Some(object) = corpus.object_mut(entity)
        && let ObjectKind::Entity(def) = &mut object.kind
    {
        def.attributes.push(attribute);
    }
    doc.definitions.push(entity);
    let root = corpus.fetch_root_folder("local").unwrap();
    let doc = corpus.add_document(root, doc);

    assert!(!corpus.index_documents(&ResolveOptions::default()));
    assert!(!corpus.document(doc).unwrap().is_valid);
    assert!(
        events
            .lock()
            .unwrap()
            .iter()
            .any(|event| event.message.contains("integrity check failed"))
    );
}
