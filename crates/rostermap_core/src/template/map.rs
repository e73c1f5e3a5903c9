//! Map entries: boxed addresses in a wrapping grid with detail lines.

use super::{render_entry, TemplateFactory, DETAILS_LABEL, LABEL_ATTR};
use crate::layout::{format_coordinate, LayoutPolicy, PageSize, Position, RowWrap};
use crate::model::{Record, RosterRow};
use crate::svg::{Fragment, NodeId, ParseError, SvgTree};
use log::warn;

const ENTRY_MARKUP: &str = include_str!("map_entry.svg");

/// Vertical distance between detail lines.
const LINE_STEP: f64 = 1.76389;
const ORIGIN: Position = Position { x: 5.0, y: 5.0 };
const COLUMN_STEP: f64 = 25.0;
const ROW_STEP: f64 = 20.0;

/// Template for the address map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapTemplate;

impl TemplateFactory for MapTemplate {
    fn kind(&self) -> &'static str {
        "map"
    }

    fn layout(&self, page: PageSize) -> LayoutPolicy {
        LayoutPolicy {
            origin: ORIGIN,
            step: Position::new(COLUMN_STEP, 0.0),
            wrap: Some(RowWrap {
                max_x: page.width - COLUMN_STEP,
                row_step: ROW_STEP,
            }),
        }
    }

    fn render(&self, key: &str, row: &RosterRow, at: Position) -> Result<Fragment, ParseError> {
        render_entry(ENTRY_MARKUP, key, row, at)
    }

    fn apply_details(&self, tree: &mut SvgTree, entry: NodeId, record: &Record) -> bool {
        let Some(text) = tree.find_child(entry, "svg:text", &[(LABEL_ATTR, DETAILS_LABEL)]) else {
            warn!(
                "event=entry_details module=template status=skip kind=map key={} reason=no_details_text",
                record.key()
            );
            return false;
        };

        let details = record.details();
        let current = normalize(tree.itertext(text));
        let wanted = normalize(details.iter().map(String::as_str));
        if current == wanted {
            return false;
        }

        let x = tree.attribute(text, "x").unwrap_or("0").to_string();
        let mut y = tree
            .attribute(text, "y")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or_default();
        tree.clear_children(text);
        for line in &details {
            let y_value = format_coordinate(y);
            let tspan = tree.append_element(
                text,
                "svg:tspan",
                &[
                    ("x", x.as_str()),
                    ("y", y_value.as_str()),
                    ("sodipodi:role", "line"),
                ],
            );
            tree.set_text(tspan, line);
            y += LINE_STEP;
        }
        true
    }
}

/// Joins non-blank trimmed pieces with single spaces.
fn normalize<'a>(pieces: impl IntoIterator<Item = &'a str>) -> String {
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::MapTemplate;
    use crate::layout::{LayoutCursor, PageSize, Position};
    use crate::model::{Record, RosterRow};
    use crate::svg::SvgTree;
    use crate::template::{labelled_text, TemplateFactory, DETAILS_LABEL, KEY_LABEL, LABEL_ATTR};

    fn host() -> SvgTree {
        SvgTree::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
            r#"xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" "#,
            r#"xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" "#,
            r#"xmlns:xlink="http://www.w3.org/1999/xlink"><g id="layer"/></svg>"#
        ))
        .unwrap()
    }

    fn row() -> RosterRow {
        RosterRow {
            number: Some("12".to_string()),
            names: Some("Ann Lee, Bob Lee".to_string()),
            phone: Some("555 0101".to_string()),
            ..RosterRow::new("101")
        }
    }

    #[test]
    fn layout_wraps_at_page_width_minus_column() {
        let mut cursor = LayoutCursor::new(MapTemplate.layout(PageSize::new(297.0, 210.0)));
        for _ in 0..11 {
            cursor.advance();
        }
        assert_eq!(cursor.position(), Position::new(5.0, 25.0));
    }

    #[test]
    fn render_places_entry_with_key_number_and_glyph() {
        let fragment = MapTemplate
            .render("101", &row(), Position::new(30.0, 5.0))
            .unwrap();
        let tree = fragment.tree();
        let entry = fragment.node();
        assert!(tree.is_named(entry, "svg:g"));
        assert_eq!(tree.attribute(entry, "transform"), Some("translate(30, 5)"));
        let key = labelled_text(tree, entry, KEY_LABEL).unwrap();
        assert_eq!(tree.text(key), Some("101"));
        let glyph = tree
            .find_child(entry, "svg:use", &[(LABEL_ATTR, "symbolOccupancy")])
            .unwrap();
        assert_eq!(tree.attribute(glyph, "xlink:href"), Some("#question_mark_symbol"));
    }

    #[test]
    fn apply_details_writes_one_tspan_per_line() {
        let mut tree = host();
        let layer = tree.find_child(tree.root(), "svg:g", &[]).unwrap();
        let fragment = MapTemplate.render("101", &row(), Position::new(5.0, 5.0)).unwrap();
        let entry = tree.graft(layer, &fragment);
        let record = Record::new("101", entry, None, Some(row()));

        assert!(MapTemplate.apply_details(&mut tree, entry, &record));

        let text = tree
            .find_child(entry, "svg:text", &[(LABEL_ATTR, DETAILS_LABEL)])
            .unwrap();
        let lines = tree.children_named(text, "svg:tspan");
        assert_eq!(lines.len(), 4);
        assert_eq!(tree.attribute(lines[0], "y"), Some("7.5"));
        assert_eq!(tree.attribute(lines[1], "y"), Some("9.26389"));
        assert_eq!(tree.attribute(lines[0], "sodipodi:role"), Some("line"));
        assert_eq!(tree.attribute(lines[0], "x"), Some("9.6093454"));
        assert_eq!(tree.text(lines[1]), Some("Bob Lee"));
        assert_eq!(tree.text(lines[2]), None);
        assert_eq!(tree.text(lines[3]), Some("555 0101"));
    }

    #[test]
    fn apply_details_skips_unchanged_content() {
        let mut tree = host();
        let layer = tree.find_child(tree.root(), "svg:g", &[]).unwrap();
        let fragment = MapTemplate.render("101", &row(), Position::new(5.0, 5.0)).unwrap();
        let entry = tree.graft(layer, &fragment);
        let record = Record::new("101", entry, None, Some(row()));

        assert!(MapTemplate.apply_details(&mut tree, entry, &record));
        let before = tree.subtree_to_string(entry);
        assert!(!MapTemplate.apply_details(&mut tree, entry, &record));
        assert_eq!(tree.subtree_to_string(entry), before);
    }

    #[test]
    fn apply_details_without_details_text_is_noop() {
        let mut tree = host();
        let layer = tree.find_child(tree.root(), "svg:g", &[]).unwrap();
        let record = Record::new("7", layer, None, Some(row()));
        assert!(!MapTemplate.apply_details(&mut tree, layer, &record));
    }
}
