//! Blank document skeleton.
//!
//! The skeleton carries the occupancy glyph symbols, a Base layer with the
//! legend and a last-updated stamp, and an empty Addresses layer.

use crate::layout::{format_coordinate, Orientation};
use quick_xml::escape::escape;

const BLANK_MARKUP: &str = include_str!("blank.svg");

/// Blank document markup for `orientation`, named `docname` in metadata.
pub(crate) fn blank_markup(docname: &str, orientation: Orientation) -> String {
    let page = orientation.page();
    BLANK_MARKUP
        .replace("{width}", &format_coordinate(page.width))
        .replace("{height}", &format_coordinate(page.height))
        .replace("{docname}", &escape(docname))
}
