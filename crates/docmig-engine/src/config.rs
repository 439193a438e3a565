//! Run configuration

use crate::error::{MigrateError, MigrateResult};
use docmig_catalog::RuleCatalog;
use docmig_context::ContextScope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where migrated documents are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputTarget {
    /// Overwrite changed documents where they are
    #[default]
    InPlace,

    /// Write every migrated document under `dir`, keeping relative paths
    Mirror {
        /// Output root
        dir: PathBuf,
    },
}

/// Configuration of a migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// File extensions (without dot) treated as documents
    pub extensions: Vec<String>,
    /// Which documents' path changes a document sees
    pub scope: ContextScope,
    /// Run per-document phases on the rayon pool
    pub parallel: bool,
    /// Migrate and report without writing anything
    pub dry_run: bool,
    /// Output target
    pub output: OutputTarget,
    /// External rule set; the builtin catalog when absent
    pub rules: Option<PathBuf>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xdi".to_string(), "xml".to_string()],
            scope: ContextScope::Batch,
            parallel: true,
            dry_run: false,
            output: OutputTarget::InPlace,
            rules: None,
        }
    }
}

impl MigrateConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns `MigrateError::Io` if the file cannot be read and
    /// `MigrateError::Config` if it is not a valid configuration
    pub fn load(path: &Path) -> MigrateResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MigrateError::io_error(path, e))?;
        Self::from_toml_str(&text).map_err(|source| MigrateError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns the TOML error if `text` is not a valid configuration
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// With document extensions
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// With context scope
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: ContextScope) -> Self {
        self.scope = scope;
        self
    }

    /// With parallel execution on or off
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// With dry run on or off
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With output target
    #[must_use]
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    /// With external rule set file
    #[must_use]
    pub fn with_rules(mut self, rules: impl Into<PathBuf>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    /// Whether `path` has one of the configured extensions
    ///
    /// Comparison ignores ASCII case.
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Build the rule catalog this configuration selects
    ///
    /// # Errors
    /// Returns `MigrateError::Io` if the rule file cannot be read and
    /// `MigrateError::Rules` if the rule set is invalid
    pub fn catalog(&self) -> MigrateResult<RuleCatalog> {
        match &self.rules {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|e| MigrateError::io_error(path, e))?;
                Ok(RuleCatalog::from_toml(&text)?)
            }
            None => Ok(RuleCatalog::builtin()?),
        }
    }
}
