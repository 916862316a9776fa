//! Error types for platen-core

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Structured failure from compiling or executing a template source unit.
///
/// The fields are preserved verbatim from the producer so diagnostics
/// (including engine-specific debug output) survive all the way to the
/// operator, rather than being flattened into a single message.
#[derive(Debug, Clone)]
pub struct CompileDiagnostic {
    /// Human-readable failure message
    pub message: String,
    /// Failure category as reported by the producer (e.g. a syntax error
    /// kind, "front-matter", "scss")
    pub kind: String,
    /// Engine debug output, when available (template source snippets,
    /// line markers)
    pub stack: Option<String>,
    /// Underlying cause, when the engine reports one
    pub cause: Option<String>,
}

impl std::fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A template source unit failed to build or failed during execution.
    /// Aborts the whole registry refresh; no partial state is exposed.
    #[error("failed to compile {}: {diagnostic}", path.display())]
    Compilation {
        path: PathBuf,
        diagnostic: CompileDiagnostic,
    },

    #[error("unknown document id: {0}")]
    DocumentNotFound(String),

    #[error("invalid page size: {0:?}")]
    InvalidPageSize(String),

    #[error("binarizer failed: {0}")]
    Binarize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A refresh failure fanned out to every caller awaiting the same
    /// in-flight refresh future.
    #[error(transparent)]
    Shared(#[from] Arc<Error>),
}

impl Error {
    /// The sharable form of this error, for handing one failure to every
    /// waiter of an in-flight refresh.
    pub fn into_shared(self) -> Arc<Error> {
        match self {
            Error::Shared(inner) => inner,
            other => Arc::new(other),
        }
    }

    /// True when this error (or the shared error it wraps) is a
    /// compilation failure.
    pub fn is_compilation(&self) -> bool {
        match self {
            Error::Compilation { .. } => true,
            Error::Shared(inner) => inner.is_compilation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
