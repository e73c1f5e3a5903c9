//! List entries: one line per address with name and phone columns.

use super::{labelled_text, render_entry, TemplateFactory, NAMES_LABEL, PHONE_LABEL};
use crate::layout::{LayoutPolicy, PageSize, Position};
use crate::model::{Record, RosterRow};
use crate::svg::{Fragment, NodeId, ParseError, SvgTree};
use log::warn;

const ENTRY_MARKUP: &str = include_str!("list_entry.svg");

const ORIGIN: Position = Position { x: 8.5, y: 38.0 };
const LINE_STEP: f64 = 6.4;

/// Template for the printable address list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListTemplate;

impl TemplateFactory for ListTemplate {
    fn kind(&self) -> &'static str {
        "list"
    }

    fn layout(&self, _page: PageSize) -> LayoutPolicy {
        LayoutPolicy {
            origin: ORIGIN,
            step: Position::new(0.0, LINE_STEP),
            wrap: None,
        }
    }

    fn render(&self, key: &str, row: &RosterRow, at: Position) -> Result<Fragment, ParseError> {
        render_entry(ENTRY_MARKUP, key, row, at)
    }

    fn apply_details(&self, tree: &mut SvgTree, entry: NodeId, record: &Record) -> bool {
        let row = record.row();
        let names = row.and_then(|row| row.names.as_deref()).unwrap_or_default();
        let phone = row.and_then(|row| row.phone.as_deref()).unwrap_or_default();

        let mut changed = false;
        for (label, value) in [(NAMES_LABEL, names), (PHONE_LABEL, phone)] {
            let Some(target) = labelled_text(tree, entry, label) else {
                warn!(
                    "event=entry_details module=template status=skip kind=list key={} reason=no_{}",
                    record.key(),
                    label
                );
                continue;
            };
            if tree.text(target).unwrap_or_default() != value {
                tree.set_text(target, value);
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::ListTemplate;
    use crate::layout::{LayoutCursor, PageSize, Position};
    use crate::model::{Record, RosterRow};
    use crate::svg::SvgTree;
    use crate::template::{labelled_text, TemplateFactory, NAMES_LABEL, PHONE_LABEL};

    fn host() -> SvgTree {
        SvgTree::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
            r#"xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"><g/></svg>"#
        ))
        .unwrap()
    }

    #[test]
    fn layout_steps_down_without_wrapping() {
        let mut cursor = LayoutCursor::new(ListTemplate.layout(PageSize::new(210.0, 297.0)));
        assert_eq!(cursor.position(), Position::new(8.5, 38.0));
        for _ in 0..40 {
            cursor.advance();
        }
        assert_eq!(cursor.position().x, 8.5);
        assert!((cursor.position().y - (38.0 + 40.0 * 6.4)).abs() < 1e-9);
    }

    #[test]
    fn apply_details_writes_names_and_phone_verbatim() {
        let mut tree = host();
        let layer = tree.find_child(tree.root(), "svg:g", &[]).unwrap();
        let row = RosterRow {
            names: Some("Ann Lee, Bob Lee".to_string()),
            phone: Some("555 0101".to_string()),
            ..RosterRow::new("42")
        };
        let fragment = ListTemplate.render("42", &row, Position::new(8.5, 38.0)).unwrap();
        let entry = tree.graft(layer, &fragment);
        let record = Record::new("42", entry, None, Some(row));

        assert!(ListTemplate.apply_details(&mut tree, entry, &record));
        let names = labelled_text(&tree, entry, NAMES_LABEL).unwrap();
        let phone = labelled_text(&tree, entry, PHONE_LABEL).unwrap();
        assert_eq!(tree.text(names), Some("Ann Lee, Bob Lee"));
        assert_eq!(tree.text(phone), Some("555 0101"));

        assert!(!ListTemplate.apply_details(&mut tree, entry, &record));
    }

    #[test]
    fn apply_details_prefers_existing_tspan() {
        let mut tree = SvgTree::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
            r#"xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">"#,
            r#"<g><text inkscape:label="textNames"><tspan>old</tspan></text></g></svg>"#
        ))
        .unwrap();
        let entry = tree.find_child(tree.root(), "svg:g", &[]).unwrap();
        let row = RosterRow {
            names: Some("New Name".to_string()),
            ..RosterRow::new("5")
        };
        let record = Record::new("5", entry, None, Some(row));

        assert!(ListTemplate.apply_details(&mut tree, entry, &record));
        let target = labelled_text(&tree, entry, NAMES_LABEL).unwrap();
        assert!(tree.is_named(target, "svg:tspan"));
        assert_eq!(tree.text(target), Some("New Name"));
    }
}
