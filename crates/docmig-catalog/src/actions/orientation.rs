//! Orientation re-encoding for animation tracks

use crate::orientation::{parse_quaternion, HeadingPitch};
use crate::rule::{Rule, RuleContext, RuleError, RuleOutcome};
use docmig_tree::{resolve_single, Document, NodeId};

/// Rewrite quaternion key literals as heading/pitch
///
/// Keys are the `item` children of the element at `keys`; each key's
/// literal lives at `field`. A degenerate rotation reuses the previous
/// key's heading and pitch (zero for the first key) and is reported as a
/// warning. A literal that is not four numbers fails the document.
///
/// The output literal is itself four numbers, so the rule must be
/// registered with a target version to stay idempotent.
#[derive(Debug, Clone)]
pub struct ReencodeOrientation {
    keys: String,
    item: String,
    field: String,
}

impl ReencodeOrientation {
    /// Create rule
    #[must_use]
    pub fn new(keys: impl Into<String>, item: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            item: item.into(),
            field: field.into(),
        }
    }
}

impl Rule for ReencodeOrientation {
    fn name(&self) -> &str {
        "reencode_orientation"
    }

    fn describe(&self) -> String {
        format!("{}/{}/{}", self.keys, self.item, self.field)
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        let Some(keys) = resolve_single(doc, node, &self.keys) else {
            return Ok(RuleOutcome::Unchanged);
        };

        let mut previous = HeadingPitch::default();
        let mut outcome = RuleOutcome::Unchanged;

        for key in doc.child_elements_by_name(keys, &self.item) {
            let Some(field) = resolve_single(doc, key, &self.field) else {
                continue;
            };
            let literal = doc.text_content(field);
            let rotation = parse_quaternion(&literal)
                .map_err(|reason| RuleError::invalid_literal(doc, field, literal.clone(), reason))?;

            let derived = if let Some(hp) = rotation.heading_pitch() {
                hp
            } else {
                ctx.warn(format!(
                    "{}: degenerate rotation '{}', reusing previous key",
                    doc.compute_path(field),
                    literal.trim()
                ));
                previous
            };

            doc.set_text(field, derived.to_string())?;
            previous = derived;
            outcome = RuleOutcome::Modified;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmig_context::MigrationContext;
    use docmig_tree::parse_document;
    use pretty_assertions::assert_eq;

    fn rule() -> ReencodeOrientation {
        ReencodeOrientation::new("path/keys", "item", "value/orientation")
    }

    fn track(rotations: &[&str]) -> String {
        let keys: String = rotations
            .iter()
            .map(|r| format!("<item><value><orientation>{r}</orientation></value></item>"))
            .collect();
        format!("<object><path><keys>{keys}</keys></path></object>")
    }

    fn orientations(doc: &Document) -> Vec<String> {
        let keys = resolve_single(doc, doc.root(), "path/keys").unwrap();
        doc.child_elements(keys)
            .into_iter()
            .map(|k| {
                let field = resolve_single(doc, k, "value/orientation").unwrap();
                doc.text_content(field)
            })
            .collect()
    }

    #[test]
    fn identity_becomes_zero() {
        let mut doc = parse_document(&track(&["0,0,0,1"])).unwrap();
        let shared = MigrationContext::new();
        let mut ctx = RuleContext::new("doc", &shared);
        let root = doc.root();

        assert_eq!(rule().apply(&mut doc, root, &mut ctx).unwrap(), RuleOutcome::Modified);
        assert_eq!(orientations(&doc), vec!["0.0000,0.0000,0,0"]);
    }

    #[test]
    fn degenerate_key_reuses_previous() {
        let mut doc = parse_document(&track(&[
            "0,0.7071068,0,0.7071068",
            "0,0,0,0",
            "0,0,0,1",
        ]))
        .unwrap();
        let shared = MigrationContext::new();
        let mut ctx = RuleContext::new("doc", &shared);
        let root = doc.root();

        rule().apply(&mut doc, root, &mut ctx).unwrap();
        let out = orientations(&doc);
        assert_eq!(out[0], "1.5708,0.0000,0,0");
        assert_eq!(out[1], out[0]);
        assert_eq!(out[2], "0.0000,0.0000,0,0");
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn degenerate_first_key_is_zero() {
        let mut doc = parse_document(&track(&["0,0,0,0"])).unwrap();
        let shared = MigrationContext::new();
        let mut ctx = RuleContext::new("doc", &shared);
        let root = doc.root();

        rule().apply(&mut doc, root, &mut ctx).unwrap();
        assert_eq!(orientations(&doc), vec!["0.0000,0.0000,0,0"]);
    }

    #[test]
    fn malformed_literal_is_fatal() {
        let mut doc = parse_document(&track(&["0,0,1"])).unwrap();
        let shared = MigrationContext::new();
        let mut ctx = RuleContext::new("doc", &shared);
        let root = doc.root();

        let err = rule().apply(&mut doc, root, &mut ctx).unwrap_err();
        assert!(matches!(err, RuleError::InvalidLiteral { ref value, .. } if value == "0,0,1"));
    }

    #[test]
    fn track_without_keys_is_unchanged() {
        let mut doc = parse_document("<object><path/></object>").unwrap();
        let shared = MigrationContext::new();
        let mut ctx = RuleContext::new("doc", &shared);
        let root = doc.root();
        assert_eq!(rule().apply(&mut doc, root, &mut ctx).unwrap(), RuleOutcome::Unchanged);
    }
}
