//! Error types for hugetree.
//!
//! Navigation never fails loudly: an invalid handle or out-of-range index
//! simply yields an invalid handle, zero, or `None`. The errors here cover the
//! few construction-time operations that can be rejected up front.

/// Result type alias for hugetree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A search pattern could not be compiled as a regular expression.
    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A configuration value was rejected.
    #[error("Invalid value for '{field}': {message}")]
    InvalidConfig { field: &'static str, message: String },

    /// The textual form of a tree path could not be parsed.
    #[error("Invalid tree path '{input}': {message}")]
    InvalidTreePath { input: String, message: String },

    /// A proxy operation needed a master model but none is attached.
    #[error("No master model is attached to this proxy")]
    NoMasterModel,
}

impl Error {
    /// Create a pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Create a tree path parse error.
    pub fn invalid_tree_path(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTreePath {
            input: input.into(),
            message: message.into(),
        }
    }
}
