//! docmig schema rule catalog
//!
//! Named, versioned rewrite rules dispatched by an element's `type` tag.
//!
//! # Core Concepts
//!
//! - [`Rule`]: One rewrite action applied to a tagged element
//! - [`RuleCatalog`]: Type tag to ordered [`RuleEntry`] list, built once
//! - [`RuleSetSpec`]: Declarative TOML form of a catalog
//! - [`RuleContext`]: What a rule may touch besides the document
//!
//! # Action families
//!
//! - [`CollapseIndirection`]: Replace a wrapper by its payload
//! - [`RenameChild`]: Rename a child for allow-listed types
//! - [`EnsureDefault`]: Backfill a missing child
//! - [`Regroup`]: Parallel positional arrays to keyed entries
//! - [`InsertAfter`] / [`BumpVersion`]: Version bump with structural fixups
//! - [`ReencodeOrientation`]: Quaternion keys to heading/pitch
//!
//! # Example
//!
//! ```rust,ignore
//! use docmig_catalog::RuleCatalog;
//!
//! let catalog = RuleCatalog::builtin()?;
//! for entry in catalog.rules_for("traktor.theater.TrackData") {
//!     println!("{} {}", entry.rule().name(), entry.rule().describe());
//! }
//! ```

// Core modules
mod actions;
mod catalog;
pub mod orientation;
mod rule;
mod spec;

// Re-exports
pub use actions::{
    ArrayField, BumpVersion, CollapseIndirection, ElementTemplate, EnsureDefault, InsertAfter,
    ReencodeOrientation, Regroup, RenameChild,
};
pub use catalog::{RuleCatalog, RuleEntry, BUILTIN_RULES};
pub use rule::{
    read_version, Rule, RuleContext, RuleError, RuleOutcome, REF_ATTRIBUTE, VERSION_ATTRIBUTE,
};
pub use spec::{ActionSpec, ArraySpec, RuleSetSpec, RuleSpec, SpecError, TemplateSpec};
