//! Reference integrity check

use docmig_catalog::REF_ATTRIBUTE;
use docmig_tree::{resolve_single, Document};
use serde::Serialize;

/// A `ref` attribute that addresses nothing in its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingRef {
    /// Path of the element carrying the attribute
    pub node_path: String,
    /// Attribute value
    pub target: String,
}

/// Every `ref` attribute of `doc` whose path does not resolve
///
/// Only root-anchored targets can resolve; a relative or malformed value is
/// reported as dangling.
#[must_use]
pub fn dangling_references(doc: &Document) -> Vec<DanglingRef> {
    let root = doc.root();
    doc.descendants(root)
        .into_iter()
        .filter_map(|node| {
            let target = doc.attribute(node, REF_ATTRIBUTE)?;
            let resolves = target.starts_with('/') && resolve_single(doc, root, target).is_some();
            (!resolves).then(|| DanglingRef {
                node_path: doc.compute_path(node).to_string(),
                target: target.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmig_tree::parse_document;
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_only_unresolved_targets() {
        let doc = parse_document(
            r#"<object>
                <a><b/></a>
                <r ref="/object/a/b"/>
                <r ref="/object/a/b[1]"/>
                <r ref="a/b"/>
                <r ref="/other/a"/>
            </object>"#,
        )
        .unwrap();

        let dangling = dangling_references(&doc);
        assert_eq!(
            dangling,
            vec![
                DanglingRef {
                    node_path: "/object/r[1]".into(),
                    target: "/object/a/b[1]".into()
                },
                DanglingRef {
                    node_path: "/object/r[2]".into(),
                    target: "a/b".into()
                },
                DanglingRef {
                    node_path: "/object/r[3]".into(),
                    target: "/other/a".into()
                },
            ]
        );
    }

    #[test]
    fn document_without_refs_is_clean() {
        let doc = parse_document("<object><a/></object>").unwrap();
        assert!(dangling_references(&doc).is_empty());
    }
}
