//! Markup codec
//!
//! Reads and writes documents as XML. Parsing keeps elements, attributes (in
//! source order) and character data; comments, processing instructions and
//! the declaration are dropped, CDATA becomes plain text and whitespace-only
//! text next to element children is treated as indentation and discarded.
//!
//! Writing emits a UTF-8 declaration followed by the tree indented with
//! tabs. Elements without children are written self-closing, elements
//! holding only text are written on one line. Elements mixing text with
//! element children are written inline, descendants included, so no
//! indentation leaks into their text.

use crate::document::{Document, TreeError};
use crate::node::{NodeId, NodeKind};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;

/// Declaration written ahead of every serialized document
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Errors from reading markup
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// Malformed markup
    #[error("parse error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Input holds no root element
    #[error("document has no root element")]
    NoRoot,

    /// A second top-level element follows the root
    #[error("unexpected second root element <{name}> at byte {position}")]
    MultipleRoots { name: String, position: u64 },

    /// Non-whitespace text outside the root element
    #[error("text outside the root element at byte {position}")]
    TextOutsideRoot { position: u64 },

    /// Input ended inside an element
    #[error("unclosed element <{0}>")]
    Unclosed(String),

    /// Tree construction failed
    #[error(transparent)]
    Tree(#[from] TreeError),
}

fn syntax(position: u64, err: impl Display) -> XmlError {
    XmlError::Syntax {
        position,
        message: err.to_string(),
    }
}

struct Builder {
    doc: Option<Document>,
    stack: Vec<NodeId>,
    pending: String,
    closed: bool,
}

impl Builder {
    fn open(&mut self, start: &BytesStart<'_>, position: u64) -> Result<NodeId, XmlError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| syntax(position, e))?
            .to_string();

        if self.doc.is_some() && !self.stack.is_empty() {
            self.flush()?;
        }
        let id = match (&mut self.doc, self.stack.last().copied()) {
            (None, _) => {
                let doc = Document::new(name);
                let root = doc.root();
                self.doc = Some(doc);
                root
            }
            (Some(doc), Some(parent)) => {
                let id = doc.create_element(name);
                doc.add_child(parent, id)?;
                id
            }
            (Some(_), None) => return Err(XmlError::MultipleRoots { name, position }),
        };

        let Some(doc) = self.doc.as_mut() else {
            return Err(XmlError::NoRoot);
        };
        for attr in start.attributes() {
            let attr = attr.map_err(|e| syntax(position, e))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| syntax(position, e))?
                .to_string();
            let value = attr.unescape_value().map_err(|e| syntax(position, e))?;
            doc.set_attribute(id, key, value)?;
        }
        Ok(id)
    }

    fn flush(&mut self) -> Result<(), XmlError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending);
        if let (Some(doc), Some(&parent)) = (self.doc.as_mut(), self.stack.last()) {
            let t = doc.create_text(text);
            doc.add_child(parent, t)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), XmlError> {
        self.flush()?;
        let (Some(doc), Some(id)) = (self.doc.as_mut(), self.stack.pop()) else {
            return Ok(());
        };
        drop_indentation(doc, id)?;
        if self.stack.is_empty() {
            self.closed = true;
        }
        Ok(())
    }

    fn text(&mut self, text: &str, position: u64) -> Result<(), XmlError> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(XmlError::TextOutsideRoot { position });
        }
        self.pending.push_str(text);
        Ok(())
    }
}

fn drop_indentation(doc: &mut Document, id: NodeId) -> Result<(), TreeError> {
    let children = doc.children(id).to_vec();
    if !children.iter().any(|&c| doc.is_element(c)) {
        return Ok(());
    }
    for c in children {
        if doc.text(c).is_some_and(|t| t.trim().is_empty()) {
            doc.detach(c)?;
        }
    }
    Ok(())
}

/// Parse markup into a document
///
/// # Errors
/// Returns `XmlError` describing the first problem found, with its byte
/// offset where one is known
pub fn parse_document(input: &str) -> Result<Document, XmlError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut builder = Builder {
        doc: None,
        stack: Vec::new(),
        pending: String::new(),
        closed: false,
    };

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| syntax(reader.buffer_position(), e))?;

        match event {
            Event::Start(e) => {
                if builder.closed {
                    return Err(XmlError::MultipleRoots {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        position,
                    });
                }
                let id = builder.open(&e, position)?;
                builder.stack.push(id);
            }
            Event::Empty(e) => {
                if builder.closed {
                    return Err(XmlError::MultipleRoots {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        position,
                    });
                }
                builder.open(&e, position)?;
                if builder.stack.is_empty() {
                    builder.closed = true;
                }
            }
            Event::End(_) => builder.close()?,
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| syntax(position, e))?;
                builder.text(&text, position)?;
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let text = std::str::from_utf8(&raw).map_err(|e| syntax(position, e))?;
                builder.text(text, position)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(&open) = builder.stack.last() {
        let name = builder
            .doc
            .as_ref()
            .and_then(|d| d.name(open))
            .unwrap_or_default()
            .to_string();
        return Err(XmlError::Unclosed(name));
    }

    let doc = builder.doc.ok_or(XmlError::NoRoot)?;
    tracing::trace!(nodes = doc.node_count(), "document parsed");
    Ok(doc)
}

/// Serialize the attached tree of `doc`
#[must_use]
pub fn to_xml_string(doc: &Document) -> String {
    let mut out = String::with_capacity(doc.node_count() * 32);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_element(doc, doc.root(), 0, &mut out);
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_start(doc: &Document, id: NodeId, out: &mut String) -> bool {
    let Some(element) = doc.element(id) else {
        return false;
    };
    out.push('<');
    out.push_str(element.name());
    for (key, value) in element.attributes() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    true
}

fn write_end(doc: &Document, id: NodeId, out: &mut String) {
    out.push_str("</");
    out.push_str(doc.name(id).unwrap_or_default());
    out.push('>');
}

fn is_mixed(doc: &Document, children: &[NodeId]) -> bool {
    children.iter().any(|&c| doc.is_element(c))
        && children
            .iter()
            .any(|&c| doc.text(c).is_some_and(|t| !t.trim().is_empty()))
}

fn write_element(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    indent(depth, out);
    if !write_start(doc, id, out) {
        return;
    }

    let children = doc.children(id);
    if children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    if children.iter().all(|&c| !doc.is_element(c)) {
        out.push('>');
        out.push_str(&partial_escape(doc.text_content(id).as_str()));
    } else if is_mixed(doc, children) {
        out.push('>');
        write_inline_children(doc, children, out);
    } else {
        out.push_str(">\n");
        for &child in children {
            if doc.is_element(child) {
                write_element(doc, child, depth + 1, out);
            }
        }
        indent(depth, out);
    }

    write_end(doc, id, out);
    out.push('\n');
}

fn write_inline(doc: &Document, id: NodeId, out: &mut String) {
    if !write_start(doc, id, out) {
        return;
    }
    let children = doc.children(id);
    if children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if children.iter().all(|&c| !doc.is_element(c)) {
        out.push_str(&partial_escape(doc.text_content(id).as_str()));
    } else {
        write_inline_children(doc, children, out);
    }
    write_end(doc, id, out);
}

// whitespace-only runs beside elements read back as indentation, so skip them
fn write_inline_children(doc: &Document, children: &[NodeId], out: &mut String) {
    for &child in children {
        match doc.kind(child) {
            Some(NodeKind::Element(_)) => write_inline(doc, child, out),
            Some(NodeKind::Text(text)) if !text.trim().is_empty() => {
                out.push_str(&partial_escape(text.as_str()));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- exported -->
<object type="traktor.world.Scene" version="3">
	<name>Main &amp; Co</name>
	<items>
		<item ref="/object/name"/>
		<item><![CDATA[raw <data>]]></item>
	</items>
</object>
"#;

    #[test]
    fn parses_elements_attributes_and_text() {
        let doc = parse_document(SAMPLE).unwrap();
        let root = doc.root();
        assert_eq!(doc.name(root), Some("object"));
        assert_eq!(doc.type_tag(root), Some("traktor.world.Scene"));
        assert_eq!(doc.attribute(root, "version"), Some("3"));

        let name = doc.child_element_by_name(root, "name").unwrap();
        assert_eq!(doc.text_content(name), "Main & Co");

        let items = doc.child_element_by_name(root, "items").unwrap();
        let entries = doc.child_elements(items);
        assert_eq!(entries.len(), 2);
        assert_eq!(doc.attribute(entries[0], "ref"), Some("/object/name"));
        assert_eq!(doc.text_content(entries[1]), "raw <data>");
    }

    #[test]
    fn indentation_text_is_dropped() {
        let doc = parse_document(SAMPLE).unwrap();
        assert!(doc.children(doc.root()).iter().all(|&c| doc.is_element(c)));
    }

    #[test]
    fn serializes_with_tabs_and_inline_text() {
        let doc = parse_document(SAMPLE).unwrap();
        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<object type="traktor.world.Scene" version="3">
	<name>Main &amp; Co</name>
	<items>
		<item ref="/object/name"/>
		<item>raw &lt;data&gt;</item>
	</items>
</object>
"#;
        assert_eq!(to_xml_string(&doc), expected);
    }

    #[test]
    fn serialized_form_is_stable() {
        let doc = parse_document(SAMPLE).unwrap();
        let once = to_xml_string(&doc);
        let twice = to_xml_string(&parse_document(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn attribute_quotes_are_escaped() {
        let mut doc = Document::new("object");
        doc.set_attribute(doc.root(), "label", r#"say "hi" & <go>"#)
            .unwrap();
        let text = to_xml_string(&doc);
        let back = parse_document(&text).unwrap();
        assert_eq!(
            back.attribute(back.root(), "label"),
            Some(r#"say "hi" & <go>"#)
        );
    }

    #[test]
    fn mixed_content_is_written_inline() {
        let input = "<a>hello<b><c>1</c><d/></b>world</a>";
        let doc = parse_document(input).unwrap();
        let text = to_xml_string(&doc);
        assert_eq!(text, format!("{XML_DECLARATION}\n{input}\n"));

        let back = parse_document(&text).unwrap();
        assert!(back.same_structure(&doc));
        let first = back.children(back.root())[0];
        assert_eq!(back.text(first), Some("hello"));
        assert_eq!(to_xml_string(&back), text);
    }

    #[test]
    fn mixed_content_nested_in_indented_tree() {
        let doc = parse_document("<object>\n\t<p>x <i>y</i> z</p>\n\t<q/>\n</object>").unwrap();
        let text = to_xml_string(&doc);
        assert_eq!(
            text,
            format!("{XML_DECLARATION}\n<object>\n\t<p>x <i>y</i> z</p>\n\t<q/>\n</object>\n")
        );
        assert!(parse_document(&text).unwrap().same_structure(&doc));
    }

    #[test]
    fn whitespace_only_leaf_text_is_kept() {
        let doc = parse_document("<a><b> </b></a>").unwrap();
        let b = doc.child_element_by_name(doc.root(), "b").unwrap();
        assert_eq!(doc.text_content(b), " ");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_document("<a><b></a>"),
            Err(XmlError::Syntax { .. })
        ));
        assert!(matches!(
            parse_document("<a>"),
            Err(XmlError::Unclosed(_) | XmlError::Syntax { .. })
        ));
        assert!(matches!(parse_document(""), Err(XmlError::NoRoot)));
        assert!(matches!(
            parse_document("<a/><b/>"),
            Err(XmlError::MultipleRoots { .. })
        ));
        assert!(matches!(
            parse_document("<a/>junk"),
            Err(XmlError::TextOutsideRoot { .. })
        ));
    }
}
