use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("I/O operation failed on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not open filter rules {path:?}: {source}")]
    FilterUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid filter rule at line {line}: {details}")]
    FilterRule { line: usize, details: String },

    #[error("could not load pattern table {path:?}: {details}")]
    PatternTable { path: PathBuf, details: String },

    #[error("invalid SMARTS pattern '{smarts}': {details}")]
    InvalidPattern { smarts: String, details: String },

    #[error("could not parse molecule '{input}': {details}")]
    MoleculeParse { input: String, details: String },

    #[error("malformed JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot merge key '{key}' from {path:?}: {details}")]
    MergeConflict {
        key: String,
        path: PathBuf,
        details: String,
    },
}

impl ScreenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn molecule(input: impl Into<String>, details: impl ToString) -> Self {
        Self::MoleculeParse {
            input: input.into(),
            details: details.to_string(),
        }
    }

    /// Recoverable errors concern a single molecule or pattern; the caller logs
    /// them and moves on. Everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScreenError::MoleculeParse { .. } | ScreenError::InvalidPattern { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScreenError>;
