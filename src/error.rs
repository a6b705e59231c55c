//! Error types for corpus operations.

use thiserror::Error;

use crate::model::ObjectType;

/// Errors that can occur while loading, indexing or resolving a corpus.
#[derive(Debug, Error)]
pub enum CdmError {
    /// Corpus path uses an unsupported format (`./`, `../` or `/./`).
    #[error("unsupported path format: '{0}'")]
    PathFormat(String),

    /// Path references a namespace with no registered adapter.
    #[error("the namespace '{0}' has not been registered")]
    UnknownNamespace(String),

    /// The loader could not fetch the object at the given path.
    #[error("object not found at '{0}'")]
    NotFound(String),

    /// The persistence layer rejected the document bytes.
    #[error("failed to parse document '{path}': {message}")]
    Parse { path: String, message: String },

    /// Two declarations landed on the same path inside one document.
    #[error("duplicate declaration for '{0}'")]
    DuplicateDeclaration(String),

    /// A named reference did not bind to any definition.
    #[error("unable to resolve the reference '{0}' to a known object")]
    UnresolvedSymbol(String),

    /// A moniker prefix was unknown in both the from-document and the
    /// witness document.
    #[error("moniker '{0}' is not recognized")]
    MonikerNotFound(String),

    /// A symbol resolved to a definition of the wrong object type.
    #[error("expected type {expected:?} for '{symbol}', found {found:?}")]
    ExpectedTypeMismatch {
        symbol: String,
        expected: ObjectType,
        found: ObjectType,
    },

    /// An argument value is not convertible to the parameter's data type.
    #[error("parameter '{parameter}' has the data type '{expected}' but the value '{value}' does not resolve to a known '{expected}' reference")]
    ParameterTypeMismatch {
        parameter: String,
        expected: String,
        value: String,
    },

    /// A trait invocation left a required parameter without a value.
    #[error("no argument supplied for required parameter '{parameter}' of trait '{trait_name}'")]
    MissingRequiredArgument {
        parameter: String,
        trait_name: String,
    },

    /// I/O failure inside a storage adapter.
    #[error("adapter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CdmError {
    /// Create a parse error for a document path.
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Corpus path the error should be reported against, when one is known.
    pub fn corpus_path(&self) -> Option<&str> {
        match self {
            Self::PathFormat(path) | Self::NotFound(path) => Some(path),
            Self::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type CdmResult<T> = Result<T, CdmError>;
