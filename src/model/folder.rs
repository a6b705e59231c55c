//! Folder trees, one per mounted namespace.

use indexmap::IndexMap;

use super::document::DocId;

/// Identifier of a folder in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(pub u32);

impl FolderId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in a namespace's folder tree. Owns its child folders and the
/// documents attached at this level, in insertion order.
#[derive(Debug)]
pub struct Folder {
    pub name: String,
    pub namespace: String,
    /// Absolute folder path with a trailing slash, e.g. `/core/sales/`.
    pub folder_path: String,
    pub parent: Option<FolderId>,
    pub child_folders: Vec<FolderId>,
    /// Document name -> document, in attach order.
    pub documents: IndexMap<String, DocId>,
}

/// Arena storage for folders across all namespaces.
#[derive(Debug, Default)]
pub struct FolderArena {
    folders: Vec<Folder>,
}

impl FolderArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the root folder of a namespace.
    pub fn alloc_root(&mut self, namespace: impl Into<String>) -> FolderId {
        let namespace = namespace.into();
        let id = FolderId::new(self.folders.len());
        self.folders.push(Folder {
            name: String::new(),
            namespace,
            folder_path: "/".to_string(),
            parent: None,
            child_folders: Vec::new(),
            documents: IndexMap::new(),
        });
        id
    }

    pub fn get(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id.index())
    }

    pub fn get_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        self.folders.get_mut(id.index())
    }

    /// Find the direct child folder with the given name.
    pub fn child_named(&self, id: FolderId, name: &str) -> Option<FolderId> {
        let folder = self.get(id)?;
        folder
            .child_folders
            .iter()
            .copied()
            .find(|&child| self.get(child).is_some_and(|f| f.name == name))
    }

    /// Create (or return) the direct child folder with the given name.
    pub fn make_child(&mut self, id: FolderId, name: &str) -> Option<FolderId> {
        if let Some(existing) = self.child_named(id, name) {
            return Some(existing);
        }
        let (namespace, folder_path) = {
            let parent = self.get(id)?;
            (parent.namespace.clone(), parent.folder_path.clone())
        };
        let child = FolderId::new(self.folders.len());
        self.folders.push(Folder {
            name: name.to_string(),
            namespace,
            folder_path: format!("{folder_path}{name}/"),
            parent: Some(id),
            child_folders: Vec::new(),
            documents: IndexMap::new(),
        });
        if let Some(parent) = self.get_mut(id) {
            parent.child_folders.push(child);
        }
        Some(child)
    }

    /// Walk a folder path from `root`, creating any missing folders
    /// along the way. Used when a document materializes into a folder
    /// that has not been seen yet.
    pub fn ensure_path(&mut self, root: FolderId, folder_path: &str) -> Option<FolderId> {
        let mut current = root;
        for segment in folder_path.split('/').filter(|segment| !segment.is_empty()) {
            current = self.make_child(current, segment)?;
        }
        Some(current)
    }

    /// Walk a `/a/b/...` path from `root` as deep as the tree goes,
    /// returning the last folder reached. Never creates folders.
    pub fn fetch_child_folder_from_path(&self, root: FolderId, object_path: &str) -> FolderId {
        let mut current = root;
        // the final segment is a document (or target) name, not a folder
        let trimmed = object_path.trim_start_matches('/');
        let Some((folder_part, _)) = trimmed.rsplit_once('/') else {
            return current;
        };
        for segment in folder_part.split('/').filter(|s| !s.is_empty()) {
            match self.child_named(current, segment) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Attach a document to a folder under its name.
    pub fn attach_document(&mut self, id: FolderId, name: &str, doc: DocId) {
        if let Some(folder) = self.get_mut(id) {
            folder.documents.insert(name.to_string(), doc);
        }
    }

    /// Detach a document from its folder by name.
    pub fn detach_document(&mut self, id: FolderId, name: &str) -> Option<DocId> {
        self.get_mut(id)?.documents.shift_remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_child_builds_paths() {
        let mut arena = FolderArena::new();
        let root = arena.alloc_root("local");
        let core = arena.make_child(root, "core").expect("child folder");
        let sales = arena.make_child(core, "sales").expect("child folder");

        assert_eq!(arena.get(core).map(|f| f.folder_path.as_str()), Some("/core/"));
        assert_eq!(
            arena.get(sales).map(|f| f.folder_path.as_str()),
            Some("/core/sales/")
        );
    }

    #[test]
    fn test_fetch_child_folder_stops_at_deepest_existing() {
        let mut arena = FolderArena::new();
        let root = arena.alloc_root("local");
        let core = arena.make_child(root, "core").expect("child folder");

        // `/core/order.cdm.json` lands in /core/
        let found = arena.fetch_child_folder_from_path(root, "/core/order.cdm.json");
        assert_eq!(found, core);

        // `/core/missing/order.cdm.json` goes as deep as possible only
        let found = arena.fetch_child_folder_from_path(root, "/core/missing/order.cdm.json");
        assert_eq!(found, core);

        // a root-level document stays at the root
        let found = arena.fetch_child_folder_from_path(root, "/order.cdm.json");
        assert_eq!(found, root);
    }

    #[test]
    fn test_attach_and_detach_document() {
        let mut arena = FolderArena::new();
        let root = arena.alloc_root("local");
        arena.attach_document(root, "a.cdm.json", DocId::new(7));
        assert_eq!(
            arena.get(root).and_then(|f| f.documents.get("a.cdm.json")),
            Some(&DocId::new(7))
        );
        assert_eq!(arena.detach_document(root, "a.cdm.json"), Some(DocId::new(7)));
        assert!(arena.get(root).is_some_and(|f| f.documents.is_empty()));
    }
}
