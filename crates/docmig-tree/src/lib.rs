//! docmig document tree
//!
//! In-memory model for the hierarchical markup documents a migration run
//! rewrites.
//!
//! # Core Concepts
//!
//! - [`Document`]: Arena of element and text nodes with a single root
//! - [`NodeId`]: Stable handle to a node; survives detachment and cloning
//! - [`StructuralPath`]: Name and occurrence-index chain identifying an element
//! - [`resolve_single`] / [`resolve_single_or_fail`]: Path lookups with and
//!   without a failure channel
//! - [`parse_document`] / [`to_xml_string`]: Markup codec
//! - [`ContentHash`]: Digest of serialized output
//!
//! # Example
//!
//! ```rust,ignore
//! use docmig_tree::{parse_document, resolve_single, to_xml_string};
//!
//! let doc = parse_document(source)?;
//! if let Some(name) = resolve_single(&doc, doc.root(), "entity/name") {
//!     println!("{}", doc.compute_path(name));
//! }
//! let text = to_xml_string(&doc);
//! ```

// Core modules
mod document;
mod hash;
mod node;
mod path;
mod resolve;
mod xml;

// Re-exports
pub use document::{Document, TreeError};
pub use hash::{ContentHash, HashError};
pub use node::{Element, NodeId, NodeKind};
pub use path::{PathError, PathSegment, StructuralPath};
pub use resolve::{resolve_path, resolve_single, resolve_single_or_fail, ResolveError};
pub use xml::{parse_document, to_xml_string, XmlError, XML_DECLARATION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
