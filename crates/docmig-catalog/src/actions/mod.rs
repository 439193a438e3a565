//! Rewrite actions
//!
//! One module per action family. Each action implements [`Rule`](crate::Rule)
//! and is guarded so that a second application to its own output changes
//! nothing, either structurally or through a target version.

mod bump_version;
mod collapse;
mod ensure_default;
mod insert_after;
mod orientation;
mod regroup;
mod rename;

pub use bump_version::BumpVersion;
pub use collapse::CollapseIndirection;
pub use ensure_default::EnsureDefault;
pub use insert_after::{ElementTemplate, InsertAfter};
pub use orientation::ReencodeOrientation;
pub use regroup::{ArrayField, Regroup};
pub use rename::RenameChild;
