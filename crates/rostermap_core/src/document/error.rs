//! Document-level error types.

use crate::svg::ParseError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors from loading, reconciling and saving a document.
#[derive(Debug)]
pub enum DocumentError {
    /// The document has no entries layer.
    Structure(String),
    /// Two entries carry the same key.
    DuplicateKey {
        key: String,
        first: Option<String>,
        second: Option<String>,
    },
    /// Document or template markup is malformed.
    Parse(ParseError),
    /// A rendered entry lacks a node the reconciler requires.
    Template { key: String, missing: &'static str },
    /// A row without a usable key reached the reconciler.
    MissingKey,
    /// Filesystem failure at `path`.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structure(message) => write!(f, "invalid document structure: {message}"),
            Self::DuplicateKey { key, first, second } => write!(
                f,
                "duplicate key `{key}` in entries `{}` and `{}`",
                first.as_deref().unwrap_or("<unlabelled>"),
                second.as_deref().unwrap_or("<unlabelled>")
            ),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Template { key, missing } => {
                write!(f, "template for key `{key}` has no `{missing}` node")
            }
            Self::MissingKey => write!(f, "row has no key"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for DocumentError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl DocumentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
