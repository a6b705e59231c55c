//! Symbol resolution against a witness document's import graph.

use indexmap::IndexMap;

use crate::core::StatusLevel;
use crate::error::CdmError;
use crate::model::{DocId, ObjectId, ObjectType};
use crate::resolve::ResolveOptions;

use super::Corpus;

/// Outcome of a symbol-to-documents lookup: the (possibly moniker
/// stripped) symbol, the documents defining it and, when a moniker chain
/// already pinned one, the best document.
#[derive(Debug, Clone, Default)]
pub struct DocsResult {
    pub new_symbol: String,
    pub doc_list: Option<Vec<DocId>>,
    pub doc_best: Option<DocId>,
}

impl Corpus {
    /// From candidate documents, pick the one ranking lowest in the
    /// witness's priority list.
    pub(crate) fn fetch_priority_document(
        docs: &[DocId],
        import_priority: &IndexMap<DocId, u32>,
    ) -> Option<DocId> {
        let mut doc_best = None;
        let mut index_best = u32::MAX;
        for &candidate in docs {
            if let Some(&index) = import_priority.get(&candidate)
                && index < index_best
            {
                index_best = index;
                doc_best = Some(candidate);
                // hard to be better than the best
                if index_best == 0 {
                    break;
                }
            }
        }
        doc_best
    }

    fn moniker_lookup(&self, doc: DocId, prefix: &str) -> Option<DocId> {
        self.document(doc)?
            .import_priorities
            .as_ref()?
            .moniker_priority_map
            .get(prefix)
            .copied()
    }

    /// Find the documents that could define a symbol, drilling through
    /// moniker prefixes (`a/b/Symbol`).
    ///
    /// When the symbol is unknown under its full spelling, the prefix up
    /// to the first `/` is tried as a moniker: first against the
    /// from-document's moniker map, then against the witness's. A chain
    /// that dead-ends while anchored at the witness restarts once with
    /// the moniker document as the new witness ("move wrt down one
    /// level").
    pub(crate) fn docs_for_symbol(
        &mut self,
        res_opt: &mut ResolveOptions,
        wrt_doc: DocId,
        from_doc: Option<DocId>,
        symbol: &str,
    ) -> Option<DocsResult> {
        let mut result = DocsResult {
            new_symbol: symbol.to_string(),
            ..DocsResult::default()
        };

        // first decision, is the symbol defined anywhere?
        result.doc_list = self
            .symbol_definitions
            .get(symbol)
            .filter(|docs| !docs.is_empty())
            .cloned();
        if result.doc_list.is_some() {
            return Some(result);
        }

        // the symbol may be disambiguated with a moniker of one of the
        // imports; the document making the reference maps each moniker to
        // its one best import
        let pre_end = symbol.find('/');
        match pre_end {
            Some(0) => {
                self.report(
                    StatusLevel::Error,
                    &format!("no support for absolute references yet; fix '{symbol}'"),
                    None,
                );
                return None;
            }
            Some(pre_end) => {
                let prefix = &symbol[..pre_end];
                let rest = &symbol[pre_end + 1..];
                result.new_symbol = rest.to_string();
                result.doc_list = self
                    .symbol_definitions
                    .get(rest)
                    .filter(|docs| !docs.is_empty())
                    .cloned();

                let mut temp_moniker = None;
                let mut using_wrt_doc = false;
                if let Some(from) = from_doc {
                    self.ensure_import_priorities(from);
                    temp_moniker = self.moniker_lookup(from, prefix);
                }
                if temp_moniker.is_none() {
                    // if that did not work, see if the wrt doc can find it
                    self.ensure_import_priorities(wrt_doc);
                    if let Some(moniker_doc) = self.moniker_lookup(wrt_doc, prefix) {
                        temp_moniker = Some(moniker_doc);
                        using_wrt_doc = true;
                    }
                }

                match temp_moniker {
                    Some(moniker_doc) => {
                        // if more monikers, keep looking
                        let rest_symbol = result.new_symbol.clone();
                        if rest_symbol.contains('/')
                            && (using_wrt_doc
                                || !self.symbol_definitions.contains_key(&rest_symbol))
                        {
                            let current = self.docs_for_symbol(
                                res_opt,
                                wrt_doc,
                                Some(moniker_doc),
                                &rest_symbol,
                            )?;
                            if current.doc_list.is_none() && from_doc == Some(wrt_doc) {
                                // back at the top without the docs: move
                                // the wrt doc down one level
                                return self.docs_for_symbol(
                                    res_opt,
                                    moniker_doc,
                                    Some(moniker_doc),
                                    &rest_symbol,
                                );
                            }
                            return Some(current);
                        }
                        res_opt.from_moniker = Some(prefix.to_string());
                        result.doc_best = Some(moniker_doc);
                    }
                    None => {
                        // moniker not recognized in either doc, fail with grace
                        self.report(
                            StatusLevel::Warning,
                            &CdmError::MonikerNotFound(prefix.to_string()).to_string(),
                            None,
                        );
                        result.new_symbol = symbol.to_string();
                        result.doc_list = None;
                    }
                }
            }
            None => {}
        }
        Some(result)
    }

    /// Find the highest-priority definition of a symbolic name from the
    /// point of view of the witness document in `res_opt`.
    ///
    /// Adds the symbol to the options' dependency set, applies priority
    /// tie-breaking, optionally retries through the best document for
    /// transitively visible symbols, and gates the result on the
    /// expected object type.
    pub(crate) fn resolve_symbol_reference(
        &mut self,
        res_opt: &mut ResolveOptions,
        from_doc: Option<DocId>,
        symbol: &str,
        expected_type: ObjectType,
        retry: bool,
    ) -> Option<ObjectId> {
        let wrt_doc = res_opt.wrt_doc?;

        let symbol_docs_result = self.docs_for_symbol(res_opt, wrt_doc, from_doc, symbol)?;
        let mut doc_best = symbol_docs_result.doc_best;
        let symbol_def = symbol_docs_result.new_symbol;

        if let Some(docs) = &symbol_docs_result.doc_list {
            // collect the symbol for caching
            res_opt.symbol_ref_set.add(symbol_def.clone());

            // the wrt doc has a sorted list of imported docs, itself at
            // item 0; take the lowest numbered doc that defines the symbol
            self.ensure_import_priorities(wrt_doc);
            let import_priority = self
                .document(wrt_doc)?
                .import_priorities
                .as_ref()
                .map(|priorities| &priorities.import_priority)?;
            if import_priority.is_empty() {
                return None;
            }
            if doc_best.is_none() {
                doc_best = Self::fetch_priority_document(docs, import_priority);
            }
        }

        // perhaps we have never heard of this symbol in the imports for
        // this document
        let doc_best = doc_best?;

        let mut found = self
            .document(doc_best)?
            .fetch_object_from_document_path(&symbol_def);
        if found.is_none() && retry {
            // maybe just locatable from here, not defined here
            found = self.resolve_symbol_reference(
                res_opt,
                Some(doc_best),
                &symbol_def,
                expected_type,
                false,
            );
        }

        if let Some(found_id) = found
            && expected_type != ObjectType::Error
            && let Some(expected) = expected_type.expected_definition()
        {
            let found_type = self.object(found_id)?.object_type;
            if found_type != expected {
                let error = CdmError::ExpectedTypeMismatch {
                    symbol: symbol_def,
                    expected,
                    found: found_type,
                };
                let level = if res_opt.shallow_validation {
                    StatusLevel::Warning
                } else {
                    StatusLevel::Error
                };
                self.report(level, &error.to_string(), None);
                return None;
            }
        }

        found
    }

    /// Resolve a symbolic name as seen from a witness document.
    ///
    /// Thin wrapper over the internal resolver for callers that hold a
    /// symbol rather than a reference object. Pass
    /// [`ObjectType::Error`] to skip the expected-type gate.
    pub fn resolve_symbol(
        &mut self,
        symbol: &str,
        wrt_doc: DocId,
        expected_type: ObjectType,
    ) -> Option<ObjectId> {
        let mut res_opt = crate::resolve::ResolveOptions::with_document(
            wrt_doc,
            self.default_resolution_directives().clone(),
        );
        self.resolve_symbol_reference(&mut res_opt, None, symbol, expected_type, true)
    }

    /// Resolve an object to its definition: definitions resolve to
    /// themselves, references follow their explicit or named target.
    pub(crate) fn fetch_object_definition(
        &mut self,
        id: ObjectId,
        res_opt: &mut ResolveOptions,
    ) -> Option<ObjectId> {
        let object = self.object(id)?;
        if !object.object_type.is_reference() {
            return Some(id);
        }
        let reference = object.as_reference()?;
        if let Some(explicit) = reference.explicit_reference {
            return Some(explicit);
        }
        let named = reference.named_reference.clone()?;
        let expected_type = object.object_type;
        let from_doc = object.in_document;
        self.resolve_symbol_reference(res_opt, from_doc, &named, expected_type, true)
    }

    /// Spell a symbol so it is reachable from `doc_from`, qualifying it
    /// with monikers where the plain spelling would not resolve there.
    ///
    /// Returns `None` when no import path from `doc_from` reaches the
    /// best defining document.
    pub fn path_to_symbol(
        &self,
        symbol: &str,
        doc_from: DocId,
        docs_result: &DocsResult,
    ) -> Option<String> {
        // if no destination is given, there is no path to look for
        let doc_best = docs_result.doc_best?;

        // if there, return
        if doc_from == doc_best {
            return Some(docs_result.new_symbol.clone());
        }

        // if the to doc is imported directly here
        let priorities = self.document(doc_from)?.import_priorities.as_ref()?;
        if let Some(&priority) = priorities.import_priority.get(&doc_best) {
            // the imported version is the highest priority, we are good
            let doc_list = docs_result.doc_list.as_deref().unwrap_or_default();
            if doc_list.len() <= 1 {
                return Some(symbol.to_string());
            }

            // more than one symbol, see if highest priority
            let mut max_priority = 0;
            for &doc_impl in doc_list {
                let candidate_max = self
                    .document(doc_impl)
                    .and_then(|doc| doc.import_priorities.as_ref())
                    .and_then(|p| p.import_priority.values().max().copied())
                    .unwrap_or(0);
                max_priority = max_priority.max(candidate_max);
            }
            if max_priority == priority {
                return Some(symbol.to_string());
            }
        }

        // cannot get there directly, check the monikers
        for (moniker, &moniker_doc) in &priorities.moniker_priority_map {
            if let Some(through) = self.path_to_symbol(symbol, moniker_doc, docs_result) {
                return Some(format!("{moniker}/{through}"));
            }
        }

        None
    }
}
