//! Document reconciler.
//!
//! # Responsibility
//! - Own one SVG tree and index its entries by key.
//! - Merge roster rows into entries: update hits in place, create misses.
//! - Prune entries whose key was not merged in the current pass.
//! - Persist the tree with numbered backups.
//!
//! # Invariants
//! - Every indexed key maps to exactly one entry attached to the entries layer.
//! - No two entries share a key; a duplicate on load is a hard error.
//! - Markup outside managed entry nodes is never modified, except the
//!   last-updated stamp on request.
//! - Nothing reaches disk before [`Document::save`].
//!
//! # See also
//! - `template` for entry markup and detail rendering.

mod error;
mod persist;
mod skeleton;

pub use error::{DocumentError, DocumentResult};
pub use persist::next_backup_path;

use crate::layout::{LayoutCursor, Orientation, PageSize};
use crate::model::{Record, RosterRow};
use crate::svg::{NodeId, SvgTree};
use crate::template::{labelled_text, TemplateFactory, KEY_LABEL, LABEL_ATTR, OCCUPANCY_LABEL};
use chrono::NaiveDate;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Fixed prologue written ahead of the root element.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" ?>"#;

const GROUPMODE_ATTR: &str = "inkscape:groupmode";
const ENTRIES_LAYER: &str = "Addresses";
const BASE_LAYER: &str = "Base";
const LAST_UPDATED_LABEL: &str = "textLastUpdated";

/// Result of merging one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
}

/// Details of a completed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    /// Where the previous file was moved, when a backup was made.
    pub backup_path: Option<PathBuf>,
}

/// An SVG document whose entries layer is reconciled against a roster.
#[derive(Debug)]
pub struct Document<T: TemplateFactory> {
    path: PathBuf,
    tree: SvgTree,
    entries: NodeId,
    records: IndexMap<String, Record>,
    cursor: LayoutCursor,
    template: T,
}

impl<T: TemplateFactory> Document<T> {
    /// Loads `path` when it is a file, otherwise starts a blank document.
    ///
    /// # Errors
    /// - Same as [`Document::load`] and [`Document::new`].
    pub fn open(
        path: impl Into<PathBuf>,
        orientation: Orientation,
        template: T,
    ) -> DocumentResult<Self> {
        let path = path.into();
        if path.is_file() {
            Self::load(path, template)
        } else {
            Self::new(path, orientation, template)
        }
    }

    /// Loads an existing document and indexes its entries.
    ///
    /// # Errors
    /// - [`DocumentError::Io`] when the file cannot be read.
    /// - [`DocumentError::Parse`] when the markup is malformed.
    /// - [`DocumentError::Structure`] when there is no entries layer.
    /// - [`DocumentError::DuplicateKey`] when two entries share a key.
    pub fn load(path: impl Into<PathBuf>, template: T) -> DocumentResult<Self> {
        let path = path.into();
        info!(
            "event=document_load module=document status=start path={}",
            path.display()
        );
        let text = std::fs::read_to_string(&path).map_err(|err| {
            warn!(
                "event=document_load module=document status=error path={} error={}",
                path.display(),
                err
            );
            DocumentError::io(&path, err)
        })?;
        Self::load_from_str(path, &text, template)
    }

    /// Same as [`Document::load`] for markup already in memory.
    ///
    /// `path` is where [`Document::save`] will write.
    pub fn load_from_str(path: impl Into<PathBuf>, text: &str, template: T) -> DocumentResult<Self> {
        let path = path.into();
        let tree = SvgTree::parse(text)?;
        let document = Self::from_tree(path, tree, template)?;
        info!(
            "event=document_load module=document status=ok kind={} entries={}",
            document.template.kind(),
            document.records.len()
        );
        Ok(document)
    }

    /// Creates a blank document with an empty entries layer.
    ///
    /// The file name of `path` is recorded as document metadata.
    ///
    /// # Errors
    /// - [`DocumentError::Parse`] if the built-in skeleton cannot be parsed.
    pub fn new(path: impl Into<PathBuf>, orientation: Orientation, template: T) -> DocumentResult<Self> {
        let path = path.into();
        let docname = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tree = SvgTree::parse(&skeleton::blank_markup(&docname, orientation))?;
        let document = Self::from_tree(path, tree, template)?;
        info!(
            "event=document_new module=document status=ok kind={} orientation={}",
            document.template.kind(),
            orientation.as_str()
        );
        Ok(document)
    }

    fn from_tree(path: PathBuf, tree: SvgTree, template: T) -> DocumentResult<Self> {
        let entries = tree
            .find_child(
                tree.root(),
                "svg:g",
                &[(GROUPMODE_ATTR, "layer"), (LABEL_ATTR, ENTRIES_LAYER)],
            )
            .ok_or_else(|| {
                DocumentError::Structure(format!(
                    "no `{ENTRIES_LAYER}` layer in {}",
                    path.display()
                ))
            })?;

        let mut records: IndexMap<String, Record> = IndexMap::new();
        for group in tree.children_named(entries, "svg:g") {
            let label = tree.attribute(group, LABEL_ATTR).map(str::to_string);
            let key = labelled_text(&tree, group, KEY_LABEL)
                .and_then(|text| tree.text(text))
                .map(str::trim)
                .filter(|key| !key.is_empty());
            let Some(key) = key else {
                warn!(
                    "event=entry_scan module=document status=skip label={} reason=no_key",
                    label.as_deref().unwrap_or("<unlabelled>")
                );
                continue;
            };
            if let Some(existing) = records.get(key) {
                return Err(DocumentError::DuplicateKey {
                    key: key.to_string(),
                    first: existing.label().map(str::to_string),
                    second: label,
                });
            }
            records.insert(key.to_string(), Record::new(key, group, label, None));
        }

        let cursor = LayoutCursor::new(template.layout(PageSize::from_root(&tree)));
        Ok(Self {
            path,
            tree,
            entries,
            records,
            cursor,
            template,
        })
    }

    /// Merges one row: updates the matching entry or creates a new one.
    ///
    /// # Errors
    /// - [`DocumentError::MissingKey`] when the row has no usable key.
    /// - [`DocumentError::Parse`] or [`DocumentError::Template`] when a new
    ///   entry cannot be rendered; the tree is left untouched.
    pub fn merge(&mut self, row: RosterRow) -> DocumentResult<MergeOutcome> {
        let key = row.key().ok_or(DocumentError::MissingKey)?.to_string();

        if let Some(record) = self.records.get_mut(&key) {
            record.set_row(row);
            let record = &self.records[&key];
            let details_changed = self
                .template
                .apply_details(&mut self.tree, record.node(), record);
            let glyph_changed = apply_occupancy(&mut self.tree, record);
            debug!(
                "event=entry_updated module=document status=ok key={} details_changed={} glyph_changed={}",
                key, details_changed, glyph_changed
            );
            return Ok(MergeOutcome::Updated);
        }

        let at = self.cursor.position();
        let fragment = self.template.render(&key, &row, at)?;
        let (scratch, node) = (fragment.tree(), fragment.node());
        if labelled_text(scratch, node, KEY_LABEL).is_none() {
            return Err(DocumentError::Template {
                key,
                missing: KEY_LABEL,
            });
        }
        if occupancy_node(scratch, node).is_none() {
            return Err(DocumentError::Template {
                key,
                missing: OCCUPANCY_LABEL,
            });
        }

        let node = self.tree.graft(self.entries, &fragment);
        let label = self.tree.attribute(node, LABEL_ATTR).map(str::to_string);
        let record = Record::new(key.clone(), node, label, Some(row));
        self.template.apply_details(&mut self.tree, node, &record);
        apply_occupancy(&mut self.tree, &record);
        self.cursor.advance();
        self.records.insert(key.clone(), record);
        info!(
            "event=entry_created module=document status=ok kind={} key={} x={} y={}",
            self.template.kind(),
            key,
            at.x,
            at.y
        );
        Ok(MergeOutcome::Created)
    }

    /// Removes every entry not merged since load or the last reset.
    ///
    /// Returns the pruned keys in document order.
    pub fn prune_stale(&mut self) -> Vec<String> {
        let tree = &mut self.tree;
        let mut pruned = Vec::new();
        self.records.retain(|key, record| {
            if !record.is_orphaned() {
                return true;
            }
            tree.detach(record.node());
            info!(
                "event=entry_pruned module=document status=ok key={} label={}",
                key,
                record.label().unwrap_or("<unlabelled>")
            );
            pruned.push(key.clone());
            false
        });
        pruned
    }

    /// Orphans every record so another pass can start.
    pub fn reset_rows(&mut self) {
        for record in self.records.values_mut() {
            record.clear_row();
        }
    }

    /// Sets the Base layer's last-updated text to `date`.
    ///
    /// Returns `false` when the document has no such text.
    pub fn stamp_last_updated(&mut self, date: NaiveDate) -> bool {
        let root = self.tree.root();
        let Some(base) = self.tree.find_child(
            root,
            "svg:g",
            &[(GROUPMODE_ATTR, "layer"), (LABEL_ATTR, BASE_LAYER)],
        ) else {
            return false;
        };
        let stamp_text =
            self.tree
                .find_descendant(base, "svg:text", &[(LABEL_ATTR, LAST_UPDATED_LABEL)]);
        let Some(text) = stamp_text else {
            return false;
        };
        let target = self.tree.text_target(text);
        let stamp = format!("Last updated: {}", date.format("%e %B %Y"));
        self.tree.set_text(target, &stamp);
        true
    }

    /// Serializes the document with its fixed prologue.
    pub fn to_xml_string(&self) -> String {
        format!("{XML_DECLARATION}\n{}\n", self.tree.to_xml_string())
    }

    /// Serializes only the entries layer.
    pub fn entries_to_string(&self) -> String {
        self.tree.subtree_to_string(self.entries)
    }

    /// Writes the document to its path, moving any previous file to a backup
    /// when `backup` is set.
    ///
    /// # Errors
    /// - [`DocumentError::Io`] when staging, backup or replacement fails; the
    ///   original file is left in place.
    pub fn save(&self, backup: bool) -> DocumentResult<SaveReport> {
        let contents = self.to_xml_string();
        let backup_path = persist::write_with_backup(&self.path, &contents, backup).map_err(|err| {
            warn!(
                "event=document_save module=document status=error path={} error={}",
                self.path.display(),
                err
            );
            err
        })?;
        info!(
            "event=document_save module=document status=ok path={} entries={} backup={}",
            self.path.display(),
            self.records.len(),
            backup_path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(SaveReport {
            path: self.path.clone(),
            backup_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tree(&self) -> &SvgTree {
        &self.tree
    }

    pub fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key.trim())
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.values()
    }

    /// Text of the labelled `svg:text` (or its tspan) inside entry `key`.
    pub fn entry_text(&self, key: &str, label: &str) -> Option<&str> {
        let record = self.get(key)?;
        let text = labelled_text(&self.tree, record.node(), label)?;
        self.tree.text(text)
    }

    /// Current `xlink:href` of entry `key`'s occupancy glyph.
    pub fn occupancy_href(&self, key: &str) -> Option<&str> {
        let record = self.get(key)?;
        let glyph = occupancy_node(&self.tree, record.node())?;
        self.tree.attribute(glyph, "xlink:href")
    }
}

fn occupancy_node(tree: &SvgTree, entry: NodeId) -> Option<NodeId> {
    tree.find_child(entry, "svg:use", &[(LABEL_ATTR, OCCUPANCY_LABEL)])
}

/// Points the entry's occupancy glyph at the record's symbol.
///
/// Returns `true` when the reference changed.
fn apply_occupancy(tree: &mut SvgTree, record: &Record) -> bool {
    let Some(glyph) = occupancy_node(tree, record.node()) else {
        warn!(
            "event=entry_occupancy module=document status=skip key={} reason=no_glyph",
            record.key()
        );
        return false;
    };
    let href = record.occupancy().glyph_href();
    if tree.attribute(glyph, "xlink:href") == Some(href.as_str()) {
        return false;
    }
    tree.set_attribute(glyph, "xlink:href", &href);
    true
}
