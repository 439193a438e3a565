//! Batch reports

use chrono::{DateTime, Utc};
use docmig_tree::ContentHash;
use serde::{Deserialize, Serialize};

/// Final state of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Output differs from the canonical input
    Migrated,
    /// Migration produced the canonical input again
    Unchanged,
    /// Migration failed; nothing was written
    Failed,
}

/// Outcome for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Document identifier
    pub id: String,
    /// Final state
    pub status: DocumentStatus,
    /// Catalog entries that changed something
    pub rules_applied: usize,
    /// References rewritten
    pub refs_rewritten: usize,
    /// Recoverable conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Digest of the serialized output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<ContentHash>,
}

impl DocumentReport {
    /// Report for a document that failed
    #[must_use]
    pub fn failed(id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            id: id.into(),
            status: DocumentStatus::Failed,
            rules_applied: 0,
            refs_rewritten: 0,
            warnings: Vec::new(),
            error: Some(error.to_string()),
            digest: None,
        }
    }

    /// Mark a previously successful document as failed
    pub fn fail(&mut self, error: impl ToString) {
        self.status = DocumentStatus::Failed;
        self.error = Some(error.to_string());
    }
}

/// Document counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Documents processed
    pub documents: usize,
    /// Documents migrated
    pub migrated: usize,
    /// Documents left unchanged
    pub unchanged: usize,
    /// Documents failed
    pub failed: usize,
}

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Per-document outcomes, in batch order
    pub documents: Vec<DocumentReport>,
    /// Counts per status
    pub totals: Totals,
    /// Entries in the migration context
    pub context_entries: usize,
}

impl BatchReport {
    /// Build report from per-document outcomes
    #[must_use]
    pub fn new(documents: Vec<DocumentReport>, context_entries: usize) -> Self {
        let mut report = Self {
            generated_at: Utc::now(),
            documents,
            totals: Totals::default(),
            context_entries,
        };
        report.recount();
        report
    }

    /// Recompute totals after statuses changed
    pub fn recount(&mut self) {
        let mut totals = Totals {
            documents: self.documents.len(),
            ..Totals::default()
        };
        for doc in &self.documents {
            match doc.status {
                DocumentStatus::Migrated => totals.migrated += 1,
                DocumentStatus::Unchanged => totals.unchanged += 1,
                DocumentStatus::Failed => totals.failed += 1,
            }
        }
        self.totals = totals;
    }

    /// Whether any document failed
    #[inline]
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.totals.failed > 0
    }

    /// Report for the document with `id`
    #[must_use]
    pub fn document(&self, id: &str) -> Option<&DocumentReport> {
        self.documents.iter().find(|d| d.id == id)
    }
}
