//! Error types for memory statistics collection.

use std::path::PathBuf;

/// Result alias used throughout the meminfo core.
pub type Result<T> = std::result::Result<T, MeminfoError>;

/// Every anomaly detected while reading a memory source aborts the whole
/// collection pass with one of these.
#[derive(Debug, thiserror::Error)]
pub enum MeminfoError {
    #[error("invalid value in {source_name}: {value:?}")]
    InvalidValue { source_name: String, value: String },

    #[error("invalid line in {source_name}: {line}")]
    InvalidLine { source_name: String, line: String },

    #[error("device node string didn't match regexp: {0}")]
    NodePathMismatch(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid node glob pattern {pattern:?}: {message}")]
    Glob { pattern: String, message: String },

    #[error("couldn't get {query}, native call returned {code}")]
    NativeQuery { query: &'static str, code: i64 },
}

impl MeminfoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeminfoError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(source_name: &str, value: &str) -> Self {
        MeminfoError::InvalidValue {
            source_name: source_name.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid_line(source_name: &str, line: &str) -> Self {
        MeminfoError::InvalidLine {
            source_name: source_name.to_string(),
            line: line.to_string(),
        }
    }
}
