//! In-memory entry record bound to a tree node and its roster row.
//!
//! # Invariants
//! - `key` never changes for the lifetime of a record.
//! - `row == None` marks the record orphaned for the current pass.

use super::occupancy::Occupancy;
use super::row::RosterRow;
use crate::svg::NodeId;

/// One visual entry of a document.
#[derive(Debug, Clone)]
pub struct Record {
    key: String,
    node: NodeId,
    /// `inkscape:label` of the entry group, kept for diagnostics.
    label: Option<String>,
    row: Option<RosterRow>,
}

impl Record {
    pub(crate) fn new(
        key: impl Into<String>,
        node: NodeId,
        label: Option<String>,
        row: Option<RosterRow>,
    ) -> Self {
        Self {
            key: key.into(),
            node,
            label,
            row,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn row(&self) -> Option<&RosterRow> {
        self.row.as_ref()
    }

    /// No row in the current pass; a pruning candidate.
    pub fn is_orphaned(&self) -> bool {
        self.row.is_none()
    }

    pub(crate) fn set_row(&mut self, row: RosterRow) {
        self.row = Some(row);
    }

    pub(crate) fn clear_row(&mut self) {
        self.row = None;
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.row.as_ref().and_then(|row| row.field(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.row.as_ref().map(RosterRow::name_list).unwrap_or_default()
    }

    pub fn phones(&self) -> Vec<String> {
        self.row.as_ref().map(RosterRow::phone_list).unwrap_or_default()
    }

    /// Detail lines: names, a blank spacer when both groups exist, phones.
    pub fn details(&self) -> Vec<String> {
        let names = self.names();
        let phones = self.phones();
        let mut details = Vec::with_capacity(names.len() + phones.len() + 1);
        let spacer = !names.is_empty() && !phones.is_empty();
        details.extend(names);
        if spacer {
            details.push(String::new());
        }
        details.extend(phones);
        details
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::classify(self.field("occupancy"))
    }
}
