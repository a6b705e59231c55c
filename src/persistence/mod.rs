//! Persistence: materializing document bytes into corpus objects.

pub mod json;

pub use json::{CDM_EXTENSION, materialize_document};
