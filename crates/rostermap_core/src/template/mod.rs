//! Entry templates: markup for never-seen keys and detail rendering.
//!
//! # Responsibility
//! - Render a fresh entry fragment for a row at a cursor position.
//! - Describe how new entries are laid out on a page.
//! - Rewrite the detail text of an existing entry from its record.
//!
//! # Invariants
//! - Every rendered entry carries a key text node and an occupancy `use`.
//! - Row values are escaped before interpolation into markup.
//! - `apply_details` only touches the entry's detail text nodes.
//!
//! # See also
//! - `document` for the merge protocol that drives these hooks.

mod list;
mod map;

pub use list::ListTemplate;
pub use map::MapTemplate;

use crate::layout::{format_coordinate, LayoutPolicy, PageSize, Position};
use crate::model::{Record, RosterRow};
use crate::svg::{parse_fragment, Fragment, NodeId, ParseError, SvgTree};
use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use regex::{Captures, Regex};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(x|y|number|key)\}").expect("valid placeholder regex"));

/// Attribute carrying every managed node label.
pub const LABEL_ATTR: &str = "inkscape:label";
/// Label of the text holding an entry's key.
pub const KEY_LABEL: &str = "textRAPID";
/// Label of the `use` node pointing at the occupancy glyph.
pub const OCCUPANCY_LABEL: &str = "symbolOccupancy";
pub const NUMBER_LABEL: &str = "textNumber";
pub const DETAILS_LABEL: &str = "textDetails";
pub const NAMES_LABEL: &str = "textNames";
pub const PHONE_LABEL: &str = "textPhone";

/// Pluggable factory for one kind of entry.
pub trait TemplateFactory {
    /// Short name used in logs and CLI output, e.g. `map`.
    fn kind(&self) -> &'static str;

    /// Placement policy for new entries on a page of the given size.
    fn layout(&self, page: PageSize) -> LayoutPolicy;

    /// Renders a new entry for `key` at `at`.
    ///
    /// # Errors
    /// - Returns [`ParseError`] when the rendered markup is malformed.
    fn render(&self, key: &str, row: &RosterRow, at: Position) -> Result<Fragment, ParseError>;

    /// Rewrites detail text under `entry` from `record`.
    ///
    /// Returns `true` when the tree changed.
    fn apply_details(&self, tree: &mut SvgTree, entry: NodeId, record: &Record) -> bool;
}

/// Fills `{name}` placeholders and parses the result as a fragment.
///
/// Placeholders are filled in one pass; substituted values are never
/// rescanned.
pub(crate) fn render_entry(
    markup: &str,
    key: &str,
    row: &RosterRow,
    at: Position,
) -> Result<Fragment, ParseError> {
    let number = row.field("number").unwrap_or_default();
    let filled = PLACEHOLDER_RE.replace_all(markup, |caps: &Captures<'_>| match &caps[1] {
        "x" => format_coordinate(at.x),
        "y" => format_coordinate(at.y),
        "number" => escape(number).into_owned(),
        _ => escape(key).into_owned(),
    });
    parse_fragment(&filled)
}

/// Locates a labelled `svg:text` child of `entry`, or its `svg:tspan`.
pub(crate) fn labelled_text(tree: &SvgTree, entry: NodeId, label: &str) -> Option<NodeId> {
    tree.find_child(entry, "svg:text", &[(LABEL_ATTR, label)])
        .map(|text| tree.text_target(text))
}
