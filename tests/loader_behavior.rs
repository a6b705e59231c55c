//! Loader behavior: concurrent import loading, the at-most-once gate,
//! tolerance of missing imports and adapter-backed metadata queries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use async_trait::async_trait;
use cdm_corpus::{
    CdmResult, Corpus, CorpusObject, MemoryAdapter, StatusEvent, StatusLevel, StorageAdapter,
};

/// Wraps a memory adapter and counts reads per path.
struct CountingAdapter {
    inner: MemoryAdapter,
    reads: Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl CountingAdapter {
    fn new() -> Self {
        Self {
            inner: MemoryAdapter::new(),
            reads: Mutex::default(),
            total: AtomicUsize::new(0),
        }
    }

    fn write_file(&self, path: &str, bytes: &str) {
        self.inner.write_file(path, bytes.as_bytes().to_vec());
    }

    fn reads_of(&self, path: &str) -> usize {
        self.reads
            .lock()
            .expect("read log")
            .iter()
            .filter(|read| read.as_str() == path)
            .count()
    }
}

#[async_trait]
impl StorageAdapter for CountingAdapter {
    async fn read(&self, adapter_path: &str) -> CdmResult<Vec<u8>> {
        self.reads
            .lock()
            .expect("read log")
            .push(adapter_path.to_string());
        self.total.fetch_add(1, Ordering::SeqCst);
        self.inner.read(adapter_path).await
    }

    async fn compute_last_modified_time(
        &self,
        adapter_path: &str,
    ) -> CdmResult<Option<SystemTime>> {
        self.inner.compute_last_modified_time(adapter_path).await
    }

    async fn list_children(&self, folder_path: &str) -> CdmResult<Vec<String>> {
        self.inner.list_children(folder_path).await
    }
}

fn capture_events(corpus: &mut Corpus) -> Arc<Mutex<Vec<StatusEvent>>> {
    let store: Arc<Mutex<Vec<StatusEvent>>> = Arc::default();
    let sink = Arc::clone(&store);
    corpus.set_event_callback(
        Arc::new(move |event| sink.lock().expect("event sink").push(event.clone())),
        StatusLevel::Warning,
    );
    store
}

#[tokio::test]
async fn shared_import_is_loaded_once() {
    let adapter = Arc::new(CountingAdapter::new());
    adapter.write_file(
        "/main.cdm.json",
        r#"{
            "imports": [
                {"corpusPath": "first.cdm.json"},
                {"corpusPath": "second.cdm.json"}
            ],
            "definitions": [{"entityName": "Main"}]
        }"#,
    );
    adapter.write_file(
        "/first.cdm.json",
        r#"{
            "imports": [{"corpusPath": "shared.cdm.json"}],
            "definitions": [{"entityName": "First"}]
        }"#,
    );
    adapter.write_file(
        "/second.cdm.json",
        r#"{
            "imports": [{"corpusPath": "shared.cdm.json"}],
            "definitions": [{"entityName": "Second"}]
        }"#,
    );
    adapter.write_file("/shared.cdm.json", r#"{"definitions": [{"entityName": "Shared"}]}"#);

    let mut corpus = Corpus::new();
    corpus.mount("local", Arc::clone(&adapter) as Arc<dyn StorageAdapter>);

    let main = corpus
        .fetch_object("local:/main.cdm.json", None, false)
        .await
        .and_then(CorpusObject::as_document)
        .expect("main document");

    // both imports share one target and it is read exactly once
    assert_eq!(adapter.reads_of("/shared.cdm.json"), 1);
    assert_eq!(adapter.total.load(Ordering::SeqCst), 4);

    // every import link is wired
    let document = corpus.document(main).expect("registered main");
    assert!(document.imports.iter().all(|import| import.doc.is_some()));
}

#[tokio::test]
async fn already_present_import_is_not_reloaded() {
    let adapter = Arc::new(CountingAdapter::new());
    adapter.write_file(
        "/main.cdm.json",
        r#"{
            "imports": [{"corpusPath": "target.cdm.json"}],
            "definitions": [{"entityName": "Main"}]
        }"#,
    );
    adapter.write_file(
        "/second.cdm.json",
        r#"{
            "imports": [{"corpusPath": "target.cdm.json"}],
            "definitions": [{"entityName": "Second"}]
        }"#,
    );
    adapter.write_file("/target.cdm.json", r#"{"definitions": [{"entityName": "Target"}]}"#);

    let mut corpus = Corpus::new();
    corpus.mount("local", Arc::clone(&adapter) as Arc<dyn StorageAdapter>);

    corpus
        .fetch_object("local:/main.cdm.json", None, false)
        .await
        .expect("main document");
    assert_eq!(adapter.reads_of("/target.cdm.json"), 1);

    let second = corpus
        .fetch_object("local:/second.cdm.json", None, false)
        .await
        .and_then(CorpusObject::as_document)
        .expect("second document");

    // the shared import resolves against the already registered copy
    assert_eq!(adapter.reads_of("/target.cdm.json"), 1);
    let document = corpus.document(second).expect("registered second");
    assert!(document.imports[0].doc.is_some());
}

#[tokio::test]
async fn missing_import_is_tolerated() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.write_file(
        "/main.cdm.json",
        r#"{
            "imports": [{"corpusPath": "missing.cdm.json"}],
            "definitions": [{"entityName": "Main"}]
        }"#
        .as_bytes()
        .to_vec(),
    );

    let mut corpus = Corpus::new();
    corpus.mount("local", adapter);
    let events = capture_events(&mut corpus);

    let main = corpus
        .fetch_object("local:/main.cdm.json", None, false)
        .await
        .and_then(CorpusObject::as_document)
        .expect("main document");

    // the document loads and indexes; the dangling import stays unwired
    let document = corpus.document(main).expect("registered main");
    assert_eq!(document.imports.len(), 1);
    assert!(document.imports[0].doc.is_none());
    assert!(!document.needs_indexing);

    let events = events.lock().expect("event sink");
    assert!(
        events
            .iter()
            .any(|event| event.message.contains("unable to resolve import"))
    );
}

#[tokio::test]
async fn nested_folder_documents_load() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.write_file(
        "/core/sales/order.cdm.json",
        r#"{"definitions": [{"entityName": "Order"}]}"#.as_bytes().to_vec(),
    );

    let mut corpus = Corpus::new();
    corpus.mount("local", adapter);

    let order = corpus
        .fetch_object("local:/core/sales/order.cdm.json/Order", None, false)
        .await
        .and_then(CorpusObject::as_object)
        .expect("order entity");
    assert_eq!(
        corpus.at_corpus_path(order).as_deref(),
        Some("local:/core/sales/order.cdm.json/Order")
    );

    // the folder tree materialized on the way
    let folder = corpus
        .fetch_object("local:/core/sales/", None, false)
        .await
        .expect("sales folder");
    assert!(matches!(folder, CorpusObject::Folder(_)));
}

#[tokio::test]
async fn root_folder_fetch() {
    let adapter = Arc::new(MemoryAdapter::new());
    let mut corpus = Corpus::new();
    corpus.mount("local", adapter);

    let fetched = corpus.fetch_object("local:/", None, false).await;
    assert!(matches!(fetched, Some(CorpusObject::Folder(_))));
}

#[tokio::test]
async fn shallow_validation_downgrades_reference_errors() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.write_file(
        "/loose.cdm.json",
        r#"{"definitions": [{"entityName": "Loose", "extendsEntity": "MissingBase"}]}"#
            .as_bytes()
            .to_vec(),
    );

    let mut corpus = Corpus::new();
    corpus.mount("local", adapter);
    let events = capture_events(&mut corpus);

    let fetched = corpus
        .fetch_object("local:/loose.cdm.json", None, true)
        .await;
    assert!(fetched.is_some());

    let events = events.lock().expect("event sink");
    let reference_events: Vec<&StatusEvent> = events
        .iter()
        .filter(|event| event.message.contains("unable to resolve the reference"))
        .collect();
    assert!(!reference_events.is_empty());
    assert!(
        reference_events
            .iter()
            .all(|event| event.level == StatusLevel::Warning)
    );
}

#[tokio::test]
async fn last_modified_times_come_from_the_adapter() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.write_file(
        "/stamped.cdm.json",
        r#"{"definitions": [{"entityName": "Stamped"}]}"#.as_bytes().to_vec(),
    );

    let mut corpus = Corpus::new();
    corpus.mount("local", adapter);

    let through_object = corpus
        .compute_last_modified_time("local:/stamped.cdm.json", None)
        .await;
    assert!(through_object.is_some());

    let through_partition_path = corpus
        .compute_last_modified_time_from_partition_path("local:/stamped.cdm.json")
        .await;
    assert!(through_partition_path.is_some());

    assert!(
        corpus
            .compute_last_modified_time_from_partition_path("local:/absent.bin")
            .await
            .is_none()
    );
}
