//! Two-phase transform pipeline
//!
//! # Phases
//!
//! - **collect** reads a document and produces the path changes migrating it
//!   will cause. The document is not touched: the rules run on a scratch
//!   clone, and every element's path in the clone is compared with its path
//!   in the original. Node handles survive cloning, so the comparison is a
//!   plain lookup. Rules can add mappings for nodes that disappear (a
//!   collapsed wrapper maps to its payload).
//! - **mutate** walks the real document in pre-order, rewrites `ref`
//!   attributes through the frozen batch context and applies the catalog
//!   entries registered for each element's type tag.
//!
//! # Traversal
//!
//! Children of a node are snapshotted after the node's own rules ran, and a
//! snapshot entry is skipped if an earlier rule moved it elsewhere. A rule
//! that replaces its node hands back the replacement, which is dispatched
//! on its own tag.

use crate::error::{MigrateError, MigrateResult};
use docmig_catalog::{
    read_version, RuleCatalog, RuleContext, RuleOutcome, REF_ATTRIBUTE, VERSION_ATTRIBUTE,
};
use docmig_context::MigrationContext;
use docmig_tree::{Document, NodeId, TreeError};
use serde::Serialize;
use std::collections::HashSet;

/// Replacements allowed at one position before dispatch gives up
pub const MAX_REDISPATCH: usize = 32;

/// What the mutate phase did to one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutateStats {
    /// Catalog entries that changed something
    pub rules_applied: usize,
    /// `ref` attributes rewritten through the context
    pub refs_rewritten: usize,
    /// Recoverable conditions reported by rules
    pub warnings: Vec<String>,
    /// Path changes that did not match the collect projection
    pub divergences: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Projection,
    Live,
}

struct Walk<'r, 'c> {
    catalog: &'c RuleCatalog,
    document_id: &'r str,
    ctx: RuleContext<'r>,
    pass: Pass,
    seen_refs: HashSet<NodeId>,
    stats: MutateStats,
}

/// Transform pipeline over one rule catalog
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'c> {
    catalog: &'c RuleCatalog,
}

impl<'c> Pipeline<'c> {
    /// Create pipeline
    #[inline]
    #[must_use]
    pub fn new(catalog: &'c RuleCatalog) -> Self {
        Self { catalog }
    }

    /// Rule catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &'c RuleCatalog {
        self.catalog
    }

    /// Collect phase: path changes migrating `doc` will cause
    ///
    /// Mappings whose old and new path are equal are left out. Changes to
    /// nodes a pending rule matched, and to anything inside them, are
    /// shared with the batch. Other elements only shift because a rule
    /// changed their siblings; those mappings are recorded as local to
    /// `document_id`.
    ///
    /// # Errors
    /// Returns `MigrateError` if a rule fails on the scratch copy; the
    /// mutate phase would fail the same way.
    pub fn collect(&self, doc: &Document, document_id: &str) -> MigrateResult<MigrationContext> {
        let mut matched: HashSet<NodeId> = HashSet::new();
        let mut tracked: Vec<(String, NodeId, bool)> = Vec::new();
        for node in doc.descendants(doc.root()) {
            if let Some(tag) = doc.type_tag(node) {
                let version = read_version(doc, node).unwrap_or(0);
                for entry in self.catalog.rules_for(tag) {
                    if !entry.is_pending(version) {
                        continue;
                    }
                    if matched.insert(node) {
                        matched.extend(doc.descendants(node));
                    }
                    for (origin, target) in entry.rule().tracked_nodes(doc, node) {
                        tracked.push((doc.compute_path(origin).to_string(), target, true));
                    }
                }
            }
            tracked.push((doc.compute_path(node).to_string(), node, false));
        }

        let mut scratch = doc.clone();
        let empty = MigrationContext::new();
        self.walk(
            &mut scratch,
            document_id,
            RuleContext::quiet(document_id, &empty),
            Pass::Projection,
        )?;

        let mut ctx = MigrationContext::new();
        for (old, node, explicit) in tracked {
            if !scratch.is_attached(node) {
                continue;
            }
            let new = scratch.compute_path(node).to_string();
            if new == old {
                continue;
            }
            if explicit || matched.contains(&node) {
                ctx.record_from(document_id, old, new);
            } else {
                ctx.record_local(document_id, old, new);
            }
        }

        tracing::debug!(document = document_id, entries = ctx.len(), "collect finished");
        Ok(ctx)
    }

    /// Mutate phase: migrate `doc` in place
    ///
    /// `shared` is the frozen context of the batch (or of this document
    /// alone, depending on scope).
    ///
    /// # Errors
    /// Returns the first fatal `MigrateError`; `doc` may then be partially
    /// rewritten and must not be committed.
    pub fn mutate(
        &self,
        doc: &mut Document,
        document_id: &str,
        shared: &MigrationContext,
    ) -> MigrateResult<MutateStats> {
        let (local, mut stats) = self.walk(
            doc,
            document_id,
            RuleContext::new(document_id, shared),
            Pass::Live,
        )?;

        for produced in &local {
            if produced.old() == produced.new_path() {
                continue;
            }
            let projected = shared
                .iter()
                .any(|m| m.origin() == Some(document_id) && m.new_path() == produced.new_path());
            if !projected {
                tracing::warn!(
                    document = document_id,
                    old = produced.old(),
                    new = produced.new_path(),
                    "path change not predicted by collect phase"
                );
                stats.divergences += 1;
            }
        }

        tracing::debug!(
            document = document_id,
            rules = stats.rules_applied,
            refs = stats.refs_rewritten,
            "mutate finished"
        );
        Ok(stats)
    }

    fn walk<'r>(
        &self,
        doc: &mut Document,
        document_id: &'r str,
        ctx: RuleContext<'r>,
        pass: Pass,
    ) -> MigrateResult<(MigrationContext, MutateStats)> {
        let mut walk = Walk {
            catalog: self.catalog,
            document_id,
            ctx,
            pass,
            seen_refs: HashSet::new(),
            stats: MutateStats::default(),
        };

        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(doc.root(), None)];
        while let Some((node, expected_parent)) = stack.pop() {
            if doc.parent(node) != expected_parent {
                continue;
            }
            let Some(node) = walk.dispatch(doc, node)? else {
                continue;
            };
            for child in doc.child_elements(node).into_iter().rev() {
                stack.push((child, Some(node)));
            }
        }

        let (local, warnings) = walk.ctx.into_parts();
        let mut stats = walk.stats;
        stats.warnings = warnings;
        Ok((local, stats))
    }
}

impl Walk<'_, '_> {
    fn tree_error(&self, doc: &Document, node: NodeId, source: TreeError) -> MigrateError {
        MigrateError::Tree {
            document: self.document_id.to_string(),
            node: doc.compute_path(node).to_string(),
            source,
        }
    }

    /// Apply the catalog to `node`; returns the node now at its position
    fn dispatch(&mut self, doc: &mut Document, node: NodeId) -> MigrateResult<Option<NodeId>> {
        let catalog = self.catalog;
        let document_id = self.document_id;
        let mut current = node;
        let mut hops = 0;

        'redispatch: loop {
            if self.pass == Pass::Live && self.seen_refs.insert(current) {
                self.rewrite_ref(doc, current)?;
            }

            let Some(tag) = doc.type_tag(current).map(str::to_owned) else {
                return Ok(Some(current));
            };

            for entry in catalog.rules_for(&tag) {
                let path = doc.compute_path(current).to_string();
                let rule_error = |source| MigrateError::Rule {
                    document: document_id.to_string(),
                    rule: entry.rule().name().to_string(),
                    node: path.clone(),
                    source,
                };

                let version = read_version(doc, current).map_err(rule_error)?;
                if !entry.is_pending(version) {
                    continue;
                }

                let outcome = entry
                    .rule()
                    .apply(doc, current, &mut self.ctx)
                    .map_err(rule_error)?;

                if self.pass == Pass::Live {
                    tracing::debug!(
                        document = document_id,
                        node = %path,
                        rule = entry.rule().name(),
                        ?outcome,
                        "rule applied"
                    );
                }

                match outcome {
                    RuleOutcome::Unchanged | RuleOutcome::Modified => {
                        let mut changed = outcome == RuleOutcome::Modified;
                        if let Some(target) = entry.target_version() {
                            let previous = doc
                                .set_attribute(current, VERSION_ATTRIBUTE, target.to_string())
                                .map_err(|e| self.tree_error(doc, current, e))?;
                            changed |= previous.as_deref() != Some(target.to_string().as_str());
                        }
                        if changed {
                            self.stats.rules_applied += 1;
                        }
                    }
                    RuleOutcome::Replaced(next) => {
                        self.stats.rules_applied += 1;
                        hops += 1;
                        if hops > MAX_REDISPATCH {
                            return Err(MigrateError::DispatchLoop {
                                document: document_id.to_string(),
                                node: path,
                                limit: MAX_REDISPATCH,
                            });
                        }
                        current = next;
                        continue 'redispatch;
                    }
                    RuleOutcome::Removed => {
                        self.stats.rules_applied += 1;
                        return Ok(None);
                    }
                }
            }

            return Ok(Some(current));
        }
    }

    fn rewrite_ref(&mut self, doc: &mut Document, node: NodeId) -> MigrateResult<()> {
        let Some(value) = doc.attribute(node, REF_ATTRIBUTE) else {
            return Ok(());
        };
        let Some(new) = self.ctx.resolve(value) else {
            return Ok(());
        };
        if new == value {
            return Ok(());
        }

        tracing::debug!(
            document = self.document_id,
            old = value,
            new,
            "reference rewritten"
        );
        doc.set_attribute(node, REF_ATTRIBUTE, new)
            .map_err(|e| self.tree_error(doc, node, e))?;
        self.stats.refs_rewritten += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmig_tree::{parse_document, to_xml_string};
    use pretty_assertions::assert_eq;

    const RULES: &str = r#"
        [[rule]]
        types = ["w.Wrapper"]
        [rule.action]
        kind = "collapse"
        payload = "entityData"

        [[rule]]
        types = ["s.Settings"]
        version = 3
        [rule.action]
        kind = "insert_after"
        anchor = "a"
        element = { name = "b", text = "1" }
    "#;

    fn catalog() -> RuleCatalog {
        RuleCatalog::from_toml(RULES).unwrap()
    }

    const SCENE: &str = r#"<object>
        <item type="w.Wrapper"><name>x</name><entityData><v/></entityData></item>
        <entityData><other/></entityData>
        <link ref="/object/item"/>
        <link ref="/object/entityData"/>
        <link ref="/object/item/entityData/v"/>
        <link ref="/object/missing"/>
    </object>"#;

    #[test]
    fn collect_does_not_mutate() {
        let catalog = catalog();
        let doc = parse_document(SCENE).unwrap();
        let before = to_xml_string(&doc);
        Pipeline::new(&catalog).collect(&doc, "scene").unwrap();
        assert_eq!(to_xml_string(&doc), before);
    }

    #[test]
    fn collect_projects_wrapper_and_shifted_siblings() {
        let catalog = catalog();
        let doc = parse_document(SCENE).unwrap();
        let ctx = Pipeline::new(&catalog).collect(&doc, "scene").unwrap();

        assert_eq!(ctx.resolve("/object/item"), Some("/object/entityData"));
        assert_eq!(ctx.resolve("/object/item/entityData"), Some("/object/entityData"));
        assert_eq!(ctx.resolve("/object/item/entityData/v"), Some("/object/entityData/v"));
        assert_eq!(ctx.resolve("/object/item/name"), Some("/object/entityData/name"));
        // the existing payload-named sibling moves down one occurrence,
        // which only this document sees
        assert_eq!(ctx.resolve("/object/entityData"), Some("/object/entityData[1]"));
        assert_eq!(
            ctx.resolve_for("scene", "/object/entityData"),
            Some("/object/entityData[1]")
        );
        assert_eq!(ctx.resolve_for("other", "/object/entityData"), None);
        assert_eq!(
            ctx.resolve_for("other", "/object/item/name"),
            Some("/object/entityData/name")
        );
        // links themselves do not move
        assert_eq!(ctx.resolve("/object/link"), None);
    }

    #[test]
    fn mutate_rewrites_references() {
        let catalog = catalog();
        let pipeline = Pipeline::new(&catalog);
        let mut doc = parse_document(SCENE).unwrap();
        let ctx = pipeline.collect(&doc, "scene").unwrap();
        let stats = pipeline.mutate(&mut doc, "scene", &ctx).unwrap();

        let refs: Vec<_> = doc
            .child_elements_by_name(doc.root(), "link")
            .into_iter()
            .map(|l| doc.attribute(l, "ref").unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            refs,
            vec![
                "/object/entityData",
                "/object/entityData[1]",
                "/object/entityData/v",
                "/object/missing",
            ]
        );
        assert_eq!(stats.refs_rewritten, 3);
        assert_eq!(stats.rules_applied, 1);
        assert_eq!(stats.divergences, 0);
    }

    #[test]
    fn versioned_entry_stamps_target_and_is_idempotent() {
        let catalog = catalog();
        let pipeline = Pipeline::new(&catalog);
        let mut doc =
            parse_document(r#"<object type="s.Settings" version="1"><a/><c/></object>"#).unwrap();
        let ctx = pipeline.collect(&doc, "s").unwrap();
        pipeline.mutate(&mut doc, "s", &ctx).unwrap();

        assert_eq!(doc.attribute(doc.root(), "version"), Some("3"));
        let once = to_xml_string(&doc);

        let ctx = pipeline.collect(&doc, "s").unwrap();
        assert!(ctx.is_empty());
        let stats = pipeline.mutate(&mut doc, "s", &ctx).unwrap();
        assert_eq!(stats.rules_applied, 0);
        assert_eq!(to_xml_string(&doc), once);
    }

    #[test]
    fn missing_anchor_fails_with_context() {
        let catalog = catalog();
        let pipeline = Pipeline::new(&catalog);
        let doc = parse_document(r#"<object><s type="s.Settings" version="1"><c/></s></object>"#)
            .unwrap();
        let err = pipeline.collect(&doc, "bad.xdi").unwrap_err();
        match err {
            MigrateError::Rule {
                document,
                rule,
                node,
                ..
            } => {
                assert_eq!(document, "bad.xdi");
                assert_eq!(rule, "insert_after");
                assert_eq!(node, "/object/s");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_version_is_fatal() {
        let catalog = catalog();
        let pipeline = Pipeline::new(&catalog);
        let mut doc =
            parse_document(r#"<object type="s.Settings" version="x"><a/></object>"#).unwrap();
        let shared = MigrationContext::new();
        let err = pipeline.mutate(&mut doc, "v", &shared).unwrap_err();
        assert!(err.to_string().contains("invalid version 'x'"));
    }

    #[test]
    fn self_replacing_rule_is_bounded() {
        let catalog = RuleCatalog::from_toml(
            r#"
            [[rule]]
            types = ["l.Loop"]
            [rule.action]
            kind = "collapse"
            payload = "inner"
            "#,
        )
        .unwrap();
        let mut xml = String::from("<object>");
        for _ in 0..40 {
            xml.push_str(r#"<inner type="l.Loop">"#);
        }
        xml.push_str("<leaf/>");
        for _ in 0..40 {
            xml.push_str("</inner>");
        }
        xml.push_str("</object>");

        let mut doc = parse_document(&xml).unwrap();
        let shared = MigrationContext::new();
        let err = Pipeline::new(&catalog)
            .mutate(&mut doc, "loop", &shared)
            .unwrap_err();
        assert!(matches!(err, MigrateError::DispatchLoop { limit: MAX_REDISPATCH, .. }));
    }
}
