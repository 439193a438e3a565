//! Testing utilities for docmig workspace
//!
//! Shared document fixtures for the builtin rule set, plus helpers to lay
//! out a batch on disk.

#![allow(missing_docs)]

use docmig_tree::{parse_document, resolve_single, Document};
use std::fmt::Write as _;
use std::path::Path;

pub const WRAPPER_TYPE: &str = "traktor.world.ExternalEntityData";
pub const GROUP_TYPE: &str = "traktor.world.GroupEntityData";
pub const SETTINGS_TYPE: &str = "traktor.world.WorldRenderSettings";
pub const COMBINE_TYPE: &str = "traktor.render.ImgStepCombine";
pub const TRACK_TYPE: &str = "traktor.theater.TrackData";
pub const ACT_TYPE: &str = "traktor.theater.ActData";

/// Layer holding one collapsible wrapper per name, each wrapping a mesh
/// entity, followed by a `refs` list pointing at every wrapper
pub fn create_wrapper_layer(root: &str, names: &[&str]) -> String {
    let mut xml = format!(r#"<{root} type="traktor.world.LayerEntityData"><entities>"#);
    for (i, name) in names.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<item type="{WRAPPER_TYPE}"><name>{name}</name><entityData type="traktor.mesh.MeshEntityData"><mesh>{i}</mesh></entityData></item>"#
        );
    }
    xml.push_str("</entities><refs>");
    for i in 0..names.len() {
        let _ = write!(xml, r#"<item ref="{}"/>"#, wrapper_path(root, i));
    }
    xml.push_str("</refs>");
    let _ = write!(xml, "</{root}>");
    xml
}

/// Old path of the `index`-th wrapper of [`create_wrapper_layer`]
pub fn wrapper_path(root: &str, index: usize) -> String {
    if index == 0 {
        format!("/{root}/entities/item")
    } else {
        format!("/{root}/entities/item[{index}]")
    }
}

/// Document whose only content is a list of `ref` attributes
pub fn create_ref_list(root: &str, refs: &[&str]) -> String {
    let mut xml = format!("<{root}>");
    for r in refs {
        let _ = write!(xml, r#"<item ref="{r}"/>"#);
    }
    let _ = write!(xml, "</{root}>");
    xml
}

/// Combine step with parallel `source`/`mul`/`add` arrays
pub fn create_parallel_arrays(source: &[&str], mul: &[&str], add: &[&str]) -> String {
    let array = |name: &str, items: &[&str]| {
        let mut out = format!("<{name}>");
        for item in items {
            let _ = write!(out, "<item>{item}</item>");
        }
        let _ = write!(out, "</{name}>");
        out
    };
    format!(
        r#"<object type="{COMBINE_TYPE}"><name>combine</name>{}{}{}</object>"#,
        array("source", source),
        array("mul", mul),
        array("add", add)
    )
}

/// Theater track with one key per rotation literal
pub fn create_orientation_track(rotations: &[&str]) -> String {
    let mut xml = format!(r#"<object type="{TRACK_TYPE}" version="1"><path><keys>"#);
    for (i, r) in rotations.iter().enumerate() {
        let _ = write!(
            xml,
            "<item><T>{i}</T><value><position>0, 0, 0, 1</position><orientation>{r}</orientation></value></item>"
        );
    }
    xml.push_str("</keys></path></object>");
    xml
}

/// World render settings at `version`, optionally with the `viewFarZ` anchor
pub fn create_world_settings(version: i64, with_anchor: bool) -> String {
    let anchor = if with_anchor { "<viewFarZ>1000</viewFarZ>" } else { "" };
    format!(
        r#"<object type="{SETTINGS_TYPE}" version="{version}"><viewNearZ>1</viewNearZ>{anchor}<shadowsEnabled>true</shadowsEnabled></object>"#
    )
}

pub fn parse(xml: &str) -> Document {
    parse_document(xml).unwrap()
}

/// Text of the element at `expr` from the root
pub fn text_at(doc: &Document, expr: &str) -> Option<String> {
    resolve_single(doc, doc.root(), expr).map(|n| doc.text_content(n))
}

/// Write `(relative path, contents)` pairs under `root`
pub fn write_batch(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}
