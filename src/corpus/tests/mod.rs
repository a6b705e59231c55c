use std::sync::{Arc, Mutex};

use crate::core::{StatusEvent, StatusLevel};
use crate::corpus::Corpus;
use crate::model::{DocId, Document, Import, ObjectId, ObjectType};
use crate::persistence::materialize_document;
use crate::storage::MemoryAdapter;

mod tests_corpus;
mod tests_indexing;
mod tests_priorities;

/// A corpus with a `local` namespace backed by memory.
pub(super) fn corpus() -> Corpus {
    let mut corpus = Corpus::new();
    corpus.mount("local", Arc::new(MemoryAdapter::new()));
    corpus
}

/// Build and register a root-level document declaring the given entities.
pub(super) fn doc_with_entities(corpus: &mut Corpus, name: &str, entities: &[&str]) -> DocId {
    let mut doc = Document::new(name, "local", "/");
    for entity in entities {
        let id = corpus
            .make_object(ObjectType::Entity, Some(entity), false)
            .expect("entity object");
        doc.definitions.push(id);
    }
    let root = corpus.fetch_root_folder("local").expect("root folder");
    corpus.add_document(root, doc)
}

/// Wire `from` to import `to`, optionally under a moniker.
pub(super) fn link_import(corpus: &mut Corpus, from: DocId, to: DocId, moniker: Option<&str>) {
    let target_path = corpus
        .document(to)
        .expect("import target")
        .at_corpus_path();
    let mut import = Import::new(target_path, moniker.map(str::to_string));
    import.doc = Some(to);
    corpus
        .document_mut(from)
        .expect("importing document")
        .imports
        .push(import);
}

/// Declared entity object for a symbol in a specific document.
pub(super) fn declared(corpus: &Corpus, doc: DocId, symbol: &str) -> Option<ObjectId> {
    corpus.document(doc)?.fetch_object_from_document_path(symbol)
}

/// Materialize a root-level document from its JSON form and register it.
pub(super) fn doc_from_json(corpus: &mut Corpus, name: &str, json: &str) -> DocId {
    let doc = materialize_document(&mut corpus.objects, name, "local", "/", json.as_bytes())
        .expect("document json");
    let root = corpus.fetch_root_folder("local").expect("root folder");
    corpus.add_document(root, doc)
}

/// Collect warning and error events into a shared buffer.
pub(super) fn capture_events(corpus: &mut Corpus) -> Arc<Mutex<Vec<StatusEvent>>> {
    let store: Arc<Mutex<Vec<StatusEvent>>> = Arc::default();
    let sink = Arc::clone(&store);
    corpus.set_event_callback(
        Arc::new(move |event| sink.lock().expect("event sink").push(event.clone())),
        StatusLevel::Warning,
    );
    store
}
