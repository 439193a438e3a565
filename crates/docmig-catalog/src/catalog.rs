//! Rule catalog: type tag to ordered rule entries

use crate::rule::Rule;
use crate::spec::{RuleSetSpec, SpecError};
use std::collections::HashMap;
use std::sync::Arc;

/// Builtin rule set, embedded at compile time
pub const BUILTIN_RULES: &str = include_str!("../rules/builtin.toml");

/// A rule registered for one type tag
#[derive(Debug, Clone)]
pub struct RuleEntry {
    type_tag: String,
    target_version: Option<i64>,
    rule: Arc<dyn Rule>,
}

impl RuleEntry {
    /// Create entry
    #[must_use]
    pub fn new(
        type_tag: impl Into<String>,
        target_version: Option<i64>,
        rule: Arc<dyn Rule>,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            target_version,
            rule,
        }
    }

    /// Type tag this entry is registered under
    #[inline]
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Version the element is left at, if the entry is versioned
    #[inline]
    #[must_use]
    pub fn target_version(&self) -> Option<i64> {
        self.target_version
    }

    /// The rule
    #[inline]
    #[must_use]
    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }

    /// Check if an element at `version` still needs this entry
    ///
    /// Unversioned entries are always pending; their own guards decide.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, version: i64) -> bool {
        self.target_version.map_or(true, |target| version < target)
    }
}

/// Dispatch table from type tag to rules, built once per run
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    by_tag: HashMap<String, Vec<RuleEntry>>,
    tags: Vec<String>,
}

impl RuleCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the builtin rule set
    ///
    /// # Errors
    /// Returns `SpecError` if the embedded rule set is invalid
    pub fn builtin() -> Result<Self, SpecError> {
        Self::from_toml(BUILTIN_RULES)
    }

    /// Catalog from rule set TOML
    ///
    /// # Errors
    /// Returns `SpecError` on invalid TOML or rule parameters
    pub fn from_toml(text: &str) -> Result<Self, SpecError> {
        Self::from_spec(&RuleSetSpec::from_toml(text)?)
    }

    /// Catalog from a parsed rule set
    ///
    /// A rule listing several types is registered once per type, sharing
    /// the same rule object.
    ///
    /// # Errors
    /// Returns `SpecError` if any rule is incomplete
    pub fn from_spec(spec: &RuleSetSpec) -> Result<Self, SpecError> {
        let mut catalog = Self::new();
        for (index, rule_spec) in spec.rules.iter().enumerate() {
            let rule = rule_spec.build(index)?;
            for tag in &rule_spec.types {
                catalog.register(RuleEntry::new(tag.clone(), rule_spec.version, Arc::clone(&rule)));
            }
        }
        Ok(catalog)
    }

    /// Append an entry after the existing ones for its tag
    pub fn register(&mut self, entry: RuleEntry) {
        if !self.by_tag.contains_key(&entry.type_tag) {
            self.tags.push(entry.type_tag.clone());
        }
        self.by_tag
            .entry(entry.type_tag.clone())
            .or_default()
            .push(entry);
    }

    /// Entries for `type_tag`, in application order; empty for unknown tags
    #[inline]
    #[must_use]
    pub fn rules_for(&self, type_tag: &str) -> &[RuleEntry] {
        self.by_tag.get(type_tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every entry, grouped by tag in registration order
    pub fn entries(&self) -> impl Iterator<Item = &RuleEntry> {
        self.tags
            .iter()
            .flat_map(|tag| self.rules_for(tag).iter())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.values().map(Vec::len).sum()
    }

    /// Check if catalog has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{BumpVersion, EnsureDefault};

    #[test]
    fn builtin_catalog_loads() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog
            .entries()
            .any(|e| e.rule().name() == "reencode_orientation" && e.target_version().is_some()));
        assert!(catalog.entries().any(|e| e.rule().name() == "collapse"));
    }

    #[test]
    fn unknown_tag_has_no_rules() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(catalog.rules_for("no.such.Type").is_empty());
    }

    #[test]
    fn entries_keep_registration_order_per_tag() {
        let mut catalog = RuleCatalog::new();
        catalog.register(RuleEntry::new("a.T", None, Arc::new(EnsureDefault::new("x", "1"))));
        catalog.register(RuleEntry::new("a.T", Some(2), Arc::new(BumpVersion::new(2))));
        let names: Vec<_> = catalog.rules_for("a.T").iter().map(|e| e.rule().name()).collect();
        assert_eq!(names, vec!["ensure_default", "bump_version"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn multi_type_rule_registers_per_tag() {
        let catalog = RuleCatalog::from_toml(
            r#"
            [[rule]]
            types = ["a.One", "a.Two"]
            [rule.action]
            kind = "rename_child"
            from = "instance"
            to = "entityData"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.rules_for("a.One").len(), 1);
        assert_eq!(catalog.rules_for("a.Two").len(), 1);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn pending_follows_target_version() {
        let entry = RuleEntry::new("a.T", Some(3), Arc::new(BumpVersion::new(3)));
        assert!(entry.is_pending(0));
        assert!(entry.is_pending(2));
        assert!(!entry.is_pending(3));
        assert!(!entry.is_pending(4));

        let unversioned = RuleEntry::new("a.T", None, Arc::new(EnsureDefault::new("x", "1")));
        assert!(unversioned.is_pending(100));
    }
}
