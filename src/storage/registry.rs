//! Namespace registry and corpus-path composition.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CdmError, CdmResult};

use super::adapter::StorageAdapter;
use super::path::{split_namespace_path, validate_path_format};

/// Maps namespaces to their adapters and composes corpus paths.
#[derive(Default)]
pub struct StorageRegistry {
    namespaces: HashMap<String, Arc<dyn StorageAdapter>>,
    default_namespace: Option<String>,
}

/// Folder anchor a relative path is rebased against: the anchor object's
/// namespace and in-document folder path.
#[derive(Debug, Clone, Copy)]
pub struct PathAnchor<'a> {
    pub namespace: &'a str,
    pub folder_path: &'a str,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a namespace. The first mounted namespace
    /// becomes the default until one is set explicitly.
    pub fn mount(&mut self, namespace: impl Into<String>, adapter: Arc<dyn StorageAdapter>) {
        let namespace = namespace.into();
        if self.default_namespace.is_none() {
            self.default_namespace = Some(namespace.clone());
        }
        self.namespaces.insert(namespace, adapter);
    }

    pub fn unmount(&mut self, namespace: &str) -> bool {
        self.namespaces.remove(namespace).is_some()
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    pub fn fetch_adapter(&self, namespace: &str) -> CdmResult<Arc<dyn StorageAdapter>> {
        self.namespaces
            .get(namespace)
            .cloned()
            .ok_or_else(|| CdmError::UnknownNamespace(namespace.to_string()))
    }

    pub fn is_mounted(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Split a corpus path into `(namespace, path)`, falling back to the
    /// default namespace when the path carries none.
    pub fn resolve_namespace<'a>(&'a self, corpus_path: &'a str) -> CdmResult<(&'a str, &'a str)> {
        let (namespace, path) = split_namespace_path(corpus_path);
        let namespace = namespace
            .or(self.default_namespace())
            .ok_or_else(|| CdmError::UnknownNamespace(String::new()))?;
        Ok((namespace, path))
    }

    /// Build the absolute `ns:/...` form of a path, rebasing relative
    /// paths against the anchor's folder.
    pub fn create_absolute_corpus_path(
        &self,
        object_path: &str,
        anchor: Option<PathAnchor<'_>>,
    ) -> CdmResult<String> {
        validate_path_format(object_path)?;

        let (namespace, path) = split_namespace_path(object_path);
        if let Some(namespace) = namespace {
            // already absolute; keep the spelled namespace
            return Ok(format!("{namespace}:{path}"));
        }

        if let Some(rest) = path.strip_prefix('/') {
            let namespace = anchor
                .map(|a| a.namespace)
                .or(self.default_namespace())
                .ok_or_else(|| CdmError::UnknownNamespace(String::new()))?;
            return Ok(format!("{namespace}:/{rest}"));
        }

        // relative: rebase against the anchor folder (or the root)
        let (namespace, folder_path) = match anchor {
            Some(anchor) => (anchor.namespace, anchor.folder_path),
            None => (
                self.default_namespace()
                    .ok_or_else(|| CdmError::UnknownNamespace(String::new()))?,
                "/",
            ),
        };
        Ok(format!("{namespace}:{folder_path}{path}"))
    }
}

impl std::fmt::Debug for StorageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRegistry")
            .field("namespaces", &self.namespaces.keys().collect::<Vec<_>>())
            .field("default_namespace", &self.default_namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryAdapter;

    fn registry() -> StorageRegistry {
        let mut registry = StorageRegistry::new();
        registry.mount("local", Arc::new(MemoryAdapter::new()));
        registry
    }

    #[test]
    fn test_first_mount_sets_default_namespace() {
        let registry = registry();
        assert_eq!(registry.default_namespace(), Some("local"));
    }

    #[test]
    fn test_unmount_forgets_the_adapter() {
        let mut registry = registry();
        assert!(registry.is_mounted("local"));
        assert!(registry.unmount("local"));
        assert!(!registry.is_mounted("local"));
        assert!(!registry.unmount("local"));
    }

    #[test]
    fn test_fetch_adapter_unknown_namespace() {
        let registry = registry();
        assert!(matches!(
            registry.fetch_adapter("erp"),
            Err(CdmError::UnknownNamespace(ns)) if ns == "erp"
        ));
    }

    #[test]
    fn test_absolute_path_passthrough() {
        let registry = registry();
        let path = registry
            .create_absolute_corpus_path("erp:/a/b.cdm.json", None)
            .expect("absolute path");
        assert_eq!(path, "erp:/a/b.cdm.json");
    }

    #[test]
    fn test_rooted_path_gets_default_namespace() {
        let registry = registry();
        let path = registry
            .create_absolute_corpus_path("/a/b.cdm.json", None)
            .expect("absolute path");
        assert_eq!(path, "local:/a/b.cdm.json");
    }

    #[test]
    fn test_relative_path_rebased_against_anchor() {
        let registry = registry();
        let anchor = PathAnchor {
            namespace: "erp",
            folder_path: "/core/",
        };
        let path = registry
            .create_absolute_corpus_path("customer.cdm.json", Some(anchor))
            .expect("absolute path");
        assert_eq!(path, "erp:/core/customer.cdm.json");
    }

    #[test]
    fn test_malformed_path_rejected() {
        let registry = registry();
        assert!(matches!(
            registry.create_absolute_corpus_path("../b.cdm.json", None),
            Err(CdmError::PathFormat(_))
        ));
    }
}
