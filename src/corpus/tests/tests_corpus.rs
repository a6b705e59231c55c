#![allow(clippy::unwrap_used)]
use super::{corpus, declared, doc_with_entities};
use crate::model::ObjectType;
use crate::resolve::{DirectiveSet, ResolveOptions};

#[test]
fn test_make_object_covers_tagged_types() {
    let mut corpus = corpus();

    let entity = corpus.make_object(ObjectType::Entity, Some("E"), false);
    assert!(entity.is_some());
    let argument = corpus.make_object(ObjectType::Argument, None, false);
    assert!(argument.is_some());
    let reference = corpus.make_object(ObjectType::EntityRef, Some("E"), true);
    assert!(reference.is_some());

    // documents, folders and imports are not corpus objects
    assert!(corpus.make_object(ObjectType::Document, None, false).is_none());
    assert!(corpus.make_object(ObjectType::Folder, None, false).is_none());
    assert!(corpus.make_object(ObjectType::Import, None, false).is_none());
}

#[test]
fn test_make_ref_maps_to_reference_types() {
    let mut corpus = corpus();

    let entity_ref = corpus.make_ref(ObjectType::Entity, "Customer", true).unwrap();
    assert_eq!(
        corpus.object(entity_ref).unwrap().object_type,
        ObjectType::EntityRef
    );

    let trait_ref = corpus.make_ref(ObjectType::Trait, "is.identifiedBy", true).unwrap();
    assert_eq!(
        corpus.object(trait_ref).unwrap().object_type,
        ObjectType::TraitRef
    );

    // nothing references an import
    assert!(corpus.make_ref(ObjectType::Import, "x", false).is_none());
}

#[test]
fn test_at_corpus_path_includes_declared_path() {
    let mut corpus = corpus();
    let doc = doc_with_entities(&mut corpus, "order.cdm.json", &["Order"]);
    corpus.index_documents(&ResolveOptions::default());

    let entity = declared(&corpus, doc, "Order").unwrap();
    assert_eq!(
        corpus.at_corpus_path(entity).as_deref(),
        Some("local:/order.cdm.json/Order")
    );
}

#[test]
fn test_remove_document_prunes_symbol_table() {
    let mut corpus = corpus();
    let doc = doc_with_entities(&mut corpus, "order.cdm.json", &["Order"]);
    corpus.index_documents(&ResolveOptions::default());
    assert_eq!(corpus.symbol_documents("Order"), Some(&[doc][..]));

    let folder = corpus.document(doc).unwrap().folder.unwrap();
    corpus.remove_document_objects(folder, doc);

    assert!(corpus.symbol_documents("Order").is_none());
    assert!(corpus.document(doc).is_none());
    assert!(
        corpus
            .resolve_symbol("Order", doc, ObjectType::Error)
            .is_none()
    );
}

#[test]
fn test_default_resolution_directives() {
    let mut corpus = corpus();

    // foreign keys by default
    assert!(corpus.default_resolution_directives().has("normalized"));
    assert!(corpus.default_resolution_directives().has("referenceOnly"));

    corpus.set_default_resolution_directives(DirectiveSet::from_directives(["structured"]));
    assert!(corpus.default_resolution_directives().has("structured"));
    assert!(!corpus.default_resolution_directives().has("normalized"));
}

#[test]
fn test_fetch_root_folder_requires_mount() {
    let corpus = corpus();
    assert!(corpus.fetch_root_folder("local").is_ok());
    assert!(corpus.fetch_root_folder("erp").is_err());
}
