//! Error types for migration runs
//!
//! Every per-document error names the document; rule and tree errors also
//! name the structural path of the node being processed.

use docmig_catalog::{RuleError, SpecError};
use docmig_tree::{TreeError, XmlError};
use std::path::PathBuf;

/// Error that stops one document (or, for configuration, the whole run)
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Document does not parse
    #[error("{document}: parse error: {source}")]
    Parse {
        document: String,
        #[source]
        source: XmlError,
    },

    /// A rule failed
    #[error("{document}: rule '{rule}' failed at {node}: {source}")]
    Rule {
        document: String,
        rule: String,
        node: String,
        #[source]
        source: RuleError,
    },

    /// Tree mutation outside a rule failed
    #[error("{document}: tree error at {node}: {source}")]
    Tree {
        document: String,
        node: String,
        #[source]
        source: TreeError,
    },

    /// Rules kept replacing a node with another tagged node
    #[error("{document}: more than {limit} replacements at {node}")]
    DispatchLoop {
        document: String,
        node: String,
        limit: usize,
    },

    /// File could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document file is not UTF-8
    #[error("{path} is not valid utf-8")]
    Encoding { path: PathBuf },

    /// Configuration file is invalid
    #[error("invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Rule set is invalid
    #[error("invalid rule set: {0}")]
    Rules(#[from] SpecError),
}

impl MigrateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Document the error belongs to, if it is document-scoped
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::Parse { document, .. }
            | Self::Rule { document, .. }
            | Self::Tree { document, .. }
            | Self::DispatchLoop { document, .. } => Some(document),
            Self::Io { .. } | Self::Encoding { .. } | Self::Config { .. } | Self::Rules(_) => None,
        }
    }
}

/// Result type alias for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;
