//! Batch driver
//!
//! A batch runs in three stages:
//!
//! 1. parse every document
//! 2. collect every document, then freeze the merged context
//! 3. mutate and serialize every document against the frozen context
//!
//! Stages 2 and 3 run one document per rayon task when parallel execution
//! is on. No document enters stage 3 before every document has left stage 2.
//! A document that fails at any stage is reported and dropped from later
//! stages; the others carry on.

use crate::config::{MigrateConfig, OutputTarget};
use crate::error::{MigrateError, MigrateResult};
use crate::pipeline::Pipeline;
use crate::report::{BatchReport, DocumentReport, DocumentStatus};
use docmig_catalog::RuleCatalog;
use docmig_context::{ContextScope, MigrationContext, ScopedContexts};
use docmig_tree::{parse_document, to_xml_string, ContentHash, Document};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// One document handed to the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    /// Identifier used in reports, logs and errors
    pub id: String,
    /// Markup text
    pub text: String,
}

impl DocumentInput {
    /// Create input
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Outcome for one document, with its output when it succeeded
#[derive(Debug, Clone)]
pub struct MigratedDocument {
    /// Report entry
    pub report: DocumentReport,
    /// Serialized output; `None` for failed documents
    pub output: Option<String>,
}

impl MigratedDocument {
    fn failed(id: &str, error: &MigrateError) -> Self {
        tracing::error!(document = id, "{error}");
        Self {
            report: DocumentReport::failed(id, error),
            output: None,
        }
    }
}

/// In-memory result of a batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Per-document outcomes, in input order
    pub documents: Vec<MigratedDocument>,
    /// Entries in the migration context
    pub context_entries: usize,
}

impl BatchResult {
    /// Output of the document with `id`, if it succeeded
    #[must_use]
    pub fn output(&self, id: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.report.id == id)
            .and_then(|d| d.output.as_deref())
    }

    /// Report entry of the document with `id`
    #[must_use]
    pub fn report(&self, id: &str) -> Option<&DocumentReport> {
        self.documents
            .iter()
            .map(|d| &d.report)
            .find(|r| r.id == id)
    }

    /// Drop outputs and keep the report
    #[must_use]
    pub fn into_report(self) -> BatchReport {
        BatchReport::new(
            self.documents.into_iter().map(|d| d.report).collect(),
            self.context_entries,
        )
    }
}

enum Stage {
    Ready {
        doc: Document,
        input_digest: ContentHash,
    },
    Failed(MigrateError),
}

impl Stage {
    fn parse(input: &DocumentInput) -> Self {
        match parse_document(&input.text) {
            Ok(doc) => {
                let input_digest = ContentHash::of_text(&to_xml_string(&doc));
                Self::Ready { doc, input_digest }
            }
            Err(source) => Self::Failed(MigrateError::Parse {
                document: input.id.clone(),
                source,
            }),
        }
    }
}

/// Runs batches against one rule catalog
#[derive(Debug)]
pub struct Migrator {
    catalog: RuleCatalog,
    scope: ContextScope,
    parallel: bool,
}

impl Migrator {
    /// Create migrator with batch scope and parallel execution
    #[must_use]
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            scope: ContextScope::Batch,
            parallel: true,
        }
    }

    /// Create migrator from configuration
    ///
    /// # Errors
    /// Returns `MigrateError` if the configured rule set cannot be loaded
    pub fn from_config(config: &MigrateConfig) -> MigrateResult<Self> {
        Ok(Self::new(config.catalog()?)
            .with_scope(config.scope)
            .with_parallel(config.parallel))
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

    /// Rule catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    fn run<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T) -> R + Sync + Send,
    {
        if self.parallel {
            items
                .into_par_iter()
                .enumerate()
                .map(|(i, item)| f(i, item))
                .collect()
        } else {
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| f(i, item))
                .collect()
        }
    }

    /// Migrate documents held in memory
    ///
    /// Never fails as a whole; per-document failures are in the result.
    #[must_use]
    pub fn migrate_documents(&self, inputs: &[DocumentInput]) -> BatchResult {
        let pipeline = Pipeline::new(&self.catalog);
        tracing::info!(documents = inputs.len(), parallel = self.parallel, "batch started");

        let parsed = self.run(inputs.iter().collect(), |_, input| Stage::parse(input));

        let collected = self.run(parsed.iter().collect(), |i, stage| match stage {
            Stage::Ready { doc, .. } => pipeline.collect(doc, &inputs[i].id),
            Stage::Failed(_) => Ok(MigrationContext::new()),
        });

        let mut stages = Vec::with_capacity(parsed.len());
        let mut parts = Vec::with_capacity(parsed.len());
        for (stage, collected) in parsed.into_iter().zip(collected) {
            match collected {
                Ok(ctx) => {
                    parts.push(ctx);
                    stages.push(stage);
                }
                Err(error) => {
                    parts.push(MigrationContext::new());
                    stages.push(Stage::Failed(error));
                }
            }
        }

        let contexts = ScopedContexts::build(self.scope, parts);
        let context_entries = contexts.entry_count();
        tracing::info!(entries = context_entries, scope = ?self.scope, "context frozen");

        let empty = MigrationContext::new();
        let documents = self.run(stages, |i, stage| {
            let id = inputs[i].id.as_str();
            let shared = contexts.for_document(i).unwrap_or(&empty);
            finish(&pipeline, id, stage, shared)
        });

        BatchResult {
            documents,
            context_entries,
        }
    }

    /// Migrate every matching document under `root`
    ///
    /// Documents are identified by their path relative to `root`, with `/`
    /// separators. Output goes where `config` says, unless it is a dry run.
    ///
    /// # Errors
    /// Returns `MigrateError::Io` if `root` is not a readable directory.
    /// Problems with single documents are reported, not returned.
    pub fn migrate_directory(
        &self,
        config: &MigrateConfig,
        root: &Path,
    ) -> MigrateResult<BatchReport> {
        let files = discover(config, root)?;

        let mut inputs = Vec::with_capacity(files.len());
        let mut rels = Vec::with_capacity(files.len());
        let mut unreadable = Vec::new();
        for rel in files {
            let id = document_id(&rel);
            match read_document(&root.join(&rel)) {
                Ok(text) => {
                    inputs.push(DocumentInput::new(id, text));
                    rels.push(rel);
                }
                Err(error) => {
                    tracing::error!(document = %id, "{error}");
                    unreadable.push(DocumentReport::failed(id, error));
                }
            }
        }

        let result = self.migrate_documents(&inputs);
        let context_entries = result.context_entries;

        let mut reports = unreadable;
        for (migrated, rel) in result.documents.into_iter().zip(rels) {
            let MigratedDocument { mut report, output } = migrated;
            if let Some(output) = output.filter(|_| !config.dry_run) {
                if let Err(error) = commit(config, root, &rel, &report, &output) {
                    tracing::error!(document = %report.id, "{error}");
                    report.fail(error);
                }
            }
            reports.push(report);
        }
        reports.sort_by(|a, b| a.id.cmp(&b.id));

        let report = BatchReport::new(reports, context_entries);
        tracing::info!(
            documents = report.totals.documents,
            migrated = report.totals.migrated,
            unchanged = report.totals.unchanged,
            failed = report.totals.failed,
            dry_run = config.dry_run,
            "batch finished"
        );
        Ok(report)
    }
}

fn finish(
    pipeline: &Pipeline<'_>,
    id: &str,
    stage: Stage,
    shared: &MigrationContext,
) -> MigratedDocument {
    let (mut doc, input_digest) = match stage {
        Stage::Ready { doc, input_digest } => (doc, input_digest),
        Stage::Failed(error) => return MigratedDocument::failed(id, &error),
    };

    let stats = match pipeline.mutate(&mut doc, id, shared) {
        Ok(stats) => stats,
        Err(error) => return MigratedDocument::failed(id, &error),
    };

    let output = to_xml_string(&doc);
    let digest = ContentHash::of_text(&output);
    let status = if digest == input_digest {
        DocumentStatus::Unchanged
    } else {
        DocumentStatus::Migrated
    };
    tracing::debug!(document = id, ?status, digest = %digest.short(), "document done");

    MigratedDocument {
        report: DocumentReport {
            id: id.to_string(),
            status,
            rules_applied: stats.rules_applied,
            refs_rewritten: stats.refs_rewritten,
            warnings: stats.warnings,
            error: None,
            digest: Some(digest),
        },
        output: Some(output),
    }
}

/// Relative paths of matching documents under `root`, sorted
///
/// A mirror output directory inside `root` is not searched.
///
/// # Errors
/// Returns `MigrateError::Io` if `root` is not a directory
pub fn discover(config: &MigrateConfig, root: &Path) -> MigrateResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MigrateError::io_error(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    // compared canonically so any spelling of the mirror directory matches
    let skip = match &config.output {
        OutputTarget::Mirror { dir } => dir.canonicalize().ok(),
        OutputTarget::InPlace => None,
    };
    let is_mirror = |e: &DirEntry| {
        e.file_type().is_dir()
            && skip
                .as_deref()
                .is_some_and(|dir| e.path().canonicalize().is_ok_and(|p| p == dir))
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_mirror(e));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !config.matches_extension(entry.path()) {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn document_id(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_document(path: &Path) -> MigrateResult<String> {
    let bytes = std::fs::read(path).map_err(|e| MigrateError::io_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|_| MigrateError::Encoding {
        path: path.to_path_buf(),
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

fn commit(
    config: &MigrateConfig,
    root: &Path,
    rel: &Path,
    report: &DocumentReport,
    output: &str,
) -> MigrateResult<()> {
    let target = match &config.output {
        OutputTarget::InPlace if report.status == DocumentStatus::Migrated => root.join(rel),
        OutputTarget::InPlace => return Ok(()),
        OutputTarget::Mirror { dir } => dir.join(rel),
    };

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MigrateError::io_error(parent, e))?;
    }
    std::fs::write(&target, output).map_err(|e| MigrateError::io_error(&target, e))?;
    tracing::debug!(document = %report.id, path = %target.display(), "written");
    Ok(())
}
