//! Per-resolution options and dependency symbol collection.

use indexmap::IndexSet;

use crate::model::DocId;

use super::DirectiveSet;

/// The set of symbol names whose definitions could change a resolution.
///
/// Collected while resolving an object and registered against it so the
/// cache-key engine can tell which ambient documents shape the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet {
    symbols: IndexSet<String>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: impl Into<String>) {
        self.symbols.insert(symbol.into());
    }

    /// Merge another set into this one, keeping first-seen order.
    pub fn merge(&mut self, other: &SymbolSet) {
        for symbol in &other.symbols {
            self.symbols.insert(symbol.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Options threaded through a resolution call.
///
/// `wrt_doc` is the witness document fixing which imports are visible;
/// the remaining fields collect state as resolution proceeds.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Witness document for symbol visibility.
    pub wrt_doc: Option<DocId>,
    pub directives: DirectiveSet,
    /// Downgrade reference and type errors to warnings.
    pub shallow_validation: bool,
    /// Symbols touched while resolving, harvested for cache keys.
    pub symbol_ref_set: SymbolSet,
    /// Moniker the most recent lookup travelled through, if any.
    pub from_moniker: Option<String>,
    /// Document currently being indexed, when resolution runs inside the
    /// indexing pipeline.
    pub indexing_doc: Option<DocId>,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options witnessed by a document, with the given directives.
    pub fn with_document(wrt_doc: DocId, directives: DirectiveSet) -> Self {
        Self {
            wrt_doc: Some(wrt_doc),
            directives,
            ..Self::default()
        }
    }

    /// Fresh options sharing the witness and directives but collecting
    /// into a new symbol set.
    pub fn copy(&self) -> Self {
        Self {
            wrt_doc: self.wrt_doc,
            directives: self.directives.clone(),
            shallow_validation: self.shallow_validation,
            symbol_ref_set: SymbolSet::new(),
            from_moniker: None,
            indexing_doc: self.indexing_doc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_set_merge_deduplicates() {
        let mut a: SymbolSet = ["Order", "Customer"].into_iter().collect();
        let b: SymbolSet = ["Customer", "Product"].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(
            a.iter().collect::<Vec<_>>(),
            vec!["Order", "Customer", "Product"]
        );
    }

    #[test]
    fn test_copy_resets_collected_state() {
        let mut options = ResolveOptions::new();
        options.symbol_ref_set.add("Order");
        options.from_moniker = Some("remote".to_string());

        let copied = options.copy();
        assert!(copied.symbol_ref_set.is_empty());
        assert!(copied.from_moniker.is_none());
    }
}
