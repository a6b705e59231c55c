//! Storage: namespace registry, adapters and corpus-path handling.

pub mod adapter;
pub mod local;
pub mod memory;
pub mod path;
pub mod registry;

pub use adapter::StorageAdapter;
pub use local::LocalAdapter;
pub use memory::MemoryAdapter;
pub use path::{index_key, split_folder_and_name, split_namespace_path, validate_path_format};
pub use registry::{PathAnchor, StorageRegistry};
