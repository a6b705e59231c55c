//! Fingerprints for resolved forms.
//!
//! A cache tag pins the context a resolution happened in: which ambient
//! documents could define the symbols the object depends on, the kind of
//! resolution, the object itself and the directives. Stale entries become
//! unreachable because re-registered documents take fresh ids, changing
//! the tags computed against the new witness.

use std::collections::BTreeSet;

use crate::model::ObjectId;
use crate::resolve::{ResolveOptions, SymbolSet};

use super::Corpus;

impl Corpus {
    /// Key for the per-(object, kind) registries.
    pub(crate) fn create_cache_key_from_object(definition: ObjectId, kind: &str) -> String {
        format!("{}-{kind}", definition.0)
    }

    /// Record (or merge) the dependency symbol set of an object.
    pub(crate) fn register_definition_reference_symbols(
        &mut self,
        definition: ObjectId,
        kind: &str,
        symbol_ref_set: SymbolSet,
    ) {
        let key = Self::create_cache_key_from_object(definition, kind);
        match self.definition_reference_symbols.get_mut(&key) {
            Some(existing) => existing.merge(&symbol_ref_set),
            None => {
                self.definition_reference_symbols.insert(key, symbol_ref_set);
            }
        }
    }

    pub(crate) fn unregister_definition_reference_symbols(
        &mut self,
        definition: ObjectId,
        kind: &str,
    ) {
        let key = Self::create_cache_key_from_object(definition, kind);
        self.definition_reference_symbols.remove(&key);
    }

    /// Construct a tag that is unique for a given object in a given
    /// context, or `None` when the object is not cacheable under this
    /// witness.
    ///
    /// The tag combines, in order: the sorted ids of the ambient
    /// documents that win the priority race for each dependency symbol,
    /// the resolution kind, the object id (or name), the directives tag
    /// and any extra tags. The first time an object is seen its
    /// dependency set is seeded with its own name - every symbol depends
    /// on at least itself.
    pub(crate) fn create_definition_cache_tag(
        &mut self,
        res_opt: &mut ResolveOptions,
        definition: ObjectId,
        kind: &str,
        extra_tags: &str,
        use_name_not_id: bool,
    ) -> Option<String> {
        let this_name = self.object(definition)?.name().map(str::to_string);
        let this_id = if use_name_not_id {
            this_name.clone()?
        } else {
            definition.0.to_string()
        };

        let mut tag_suffix = format!("-{kind}-{this_id}");
        tag_suffix.push_str(&format!("-({})", res_opt.directives.tag()));
        if !extra_tags.is_empty() {
            tag_suffix.push_str(&format!("-{extra_tags}"));
        }

        // is there a registered set of the symbols involved in defining
        // this thing? (for the object definition, not the reference)
        let object_definition = self.fetch_object_definition(definition, res_opt);
        let mut symbols_ref = object_definition.and_then(|object_definition| {
            let key = Self::create_cache_key_from_object(object_definition, kind);
            self.definition_reference_symbols.get(&key).cloned()
        });

        if symbols_ref.is_none()
            && let Some(name) = &this_name
        {
            let mut seed = SymbolSet::new();
            seed.add(name.clone());
            self.register_definition_reference_symbols(definition, kind, seed.clone());
            symbols_ref = Some(seed);
        }

        let symbols_ref = symbols_ref.filter(|symbols| !symbols.is_empty())?;

        // each symbol may have definitions in many documents; the import
        // priority of the witness decides which one matters
        let wrt_doc = res_opt.wrt_doc?;
        let in_document = self.object(definition)?.in_document;
        self.ensure_import_priorities(wrt_doc);

        let mut found_doc_ids: BTreeSet<u32> = BTreeSet::new();
        if self
            .document(wrt_doc)
            .is_some_and(|doc| doc.import_priorities.is_some())
        {
            let symbols: Vec<String> = symbols_ref.iter().map(str::to_string).collect();
            for symbol in symbols {
                let Some(docs_result) =
                    self.docs_for_symbol(res_opt, wrt_doc, in_document, &symbol)
                else {
                    continue;
                };
                // only the best doc matters, and only when there is a race
                if let Some(doc_list) = &docs_result.doc_list
                    && doc_list.len() > 1
                    && let Some(priorities) = self
                        .document(wrt_doc)
                        .and_then(|doc| doc.import_priorities.as_ref())
                    && let Some(doc_best) =
                        Self::fetch_priority_document(doc_list, &priorities.import_priority)
                {
                    found_doc_ids.insert(doc_best.0);
                }
            }
        }

        let tag_pre = found_doc_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-");
        Some(format!("{tag_pre}{tag_suffix}"))
    }
}
