#![allow(clippy::unwrap_used)]
use super::{corpus, doc_with_entities, link_import};

#[test]
fn test_document_ranks_itself_first() {
    let mut corpus = corpus();
    let doc = doc_with_entities(&mut corpus, "a.cdm.json", &["A"]);

    corpus.ensure_import_priorities(doc);
    let priorities = corpus
        .document(doc)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();
    assert_eq!(priorities.import_priority.get(&doc), Some(&0));
    assert_eq!(priorities.import_priority.len(), 1);
}

#[test]
fn test_depth_first_declaration_order() {
    let mut corpus = corpus();
    let deep = doc_with_entities(&mut corpus, "deep.cdm.json", &["Deep"]);
    let first = doc_with_entities(&mut corpus, "first.cdm.json", &["First"]);
    let second = doc_with_entities(&mut corpus, "second.cdm.json", &["Second"]);
    let top = doc_with_entities(&mut corpus, "top.cdm.json", &["Top"]);
    link_import(&mut corpus, first, deep, None);
    link_import(&mut corpus, top, first, None);
    link_import(&mut corpus, top, second, None);

    corpus.ensure_import_priorities(top);
    let priorities = corpus
        .document(top)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();

    // first and its sub-imports come before second
    assert_eq!(priorities.import_priority.get(&top), Some(&0));
    assert_eq!(priorities.import_priority.get(&first), Some(&1));
    assert_eq!(priorities.import_priority.get(&deep), Some(&2));
    assert_eq!(priorities.import_priority.get(&second), Some(&3));
}

#[test]
fn test_monikered_import_stays_out_of_priority_list() {
    let mut corpus = corpus();
    let remote = doc_with_entities(&mut corpus, "remote.cdm.json", &["Remote"]);
    let host = doc_with_entities(&mut corpus, "host.cdm.json", &["Host"]);
    link_import(&mut corpus, host, remote, Some("remote"));

    corpus.ensure_import_priorities(host);
    let priorities = corpus
        .document(host)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();

    assert!(!priorities.import_priority.contains_key(&remote));
    assert_eq!(priorities.moniker_priority_map.get("remote"), Some(&remote));
}

#[test]
fn test_first_moniker_wins() {
    let mut corpus = corpus();
    let first = doc_with_entities(&mut corpus, "first.cdm.json", &["First"]);
    let second = doc_with_entities(&mut corpus, "second.cdm.json", &["Second"]);
    let host = doc_with_entities(&mut corpus, "host.cdm.json", &["Host"]);
    link_import(&mut corpus, host, first, Some("m"));
    link_import(&mut corpus, host, second, Some("m"));

    corpus.ensure_import_priorities(host);
    let priorities = corpus
        .document(host)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();
    assert_eq!(priorities.moniker_priority_map.get("m"), Some(&first));
}

#[test]
fn test_monikered_sub_import_collapses() {
    let mut corpus = corpus();
    let aliased = doc_with_entities(&mut corpus, "aliased.cdm.json", &["Aliased"]);
    let middle = doc_with_entities(&mut corpus, "middle.cdm.json", &["Middle"]);
    let top = doc_with_entities(&mut corpus, "top.cdm.json", &["Top"]);
    link_import(&mut corpus, middle, aliased, Some("alias"));
    link_import(&mut corpus, top, middle, None);

    corpus.ensure_import_priorities(top);
    let priorities = corpus
        .document(top)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();

    // the moniker stays local to the sub-document
    assert!(priorities.moniker_priority_map.is_empty());
    assert!(!priorities.import_priority.contains_key(&aliased));
    assert_eq!(priorities.import_priority.get(&middle), Some(&1));
}

#[test]
fn test_import_cycle_first_seen_wins() {
    let mut corpus = corpus();
    let a = doc_with_entities(&mut corpus, "a.cdm.json", &["A"]);
    let b = doc_with_entities(&mut corpus, "b.cdm.json", &["B"]);
    link_import(&mut corpus, a, b, None);
    link_import(&mut corpus, b, a, None);

    corpus.ensure_import_priorities(a);
    let priorities = corpus
        .document(a)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();
    assert_eq!(priorities.import_priority.get(&a), Some(&0));
    assert_eq!(priorities.import_priority.get(&b), Some(&1));
    assert_eq!(priorities.import_priority.len(), 2);
}

#[test]
fn test_priorities_recomputed_after_clear() {
    let mut corpus = corpus();
    let a = doc_with_entities(&mut corpus, "a.cdm.json", &["A"]);
    let b = doc_with_entities(&mut corpus, "b.cdm.json", &["B"]);

    corpus.ensure_import_priorities(a);
    assert_eq!(
        corpus
            .document(a)
            .unwrap()
            .import_priorities
            .as_ref()
            .unwrap()
            .import_priority
            .len(),
        1
    );

    // a new import shows up after invalidation
    link_import(&mut corpus, a, b, None);
    corpus.document_mut(a).unwrap().clear_caches();
    corpus.ensure_import_priorities(a);
    let priorities = corpus
        .document(a)
        .unwrap()
        .import_priorities
        .as_ref()
        .unwrap();
    assert_eq!(priorities.import_priority.get(&b), Some(&1));
}
