//! Markup serialization for [`SvgTree`].

use super::tree::{NodeData, NodeId, SvgTree};
use quick_xml::escape::partial_escape;

impl SvgTree {
    /// Serializes prolog nodes, the root element and epilog nodes.
    ///
    /// No XML declaration is written; callers add their own prologue.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        for id in self.prolog() {
            self.write_node(*id, &mut out);
            out.push('\n');
        }
        self.write_node(self.root(), &mut out);
        for id in self.epilog() {
            out.push('\n');
            self.write_node(*id, &mut out);
        }
        out
    }

    /// Serializes the subtree rooted at `id`.
    pub fn subtree_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for attr in &element.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    push_attribute_value(&attr.value, out);
                    out.push('"');
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
            NodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
            NodeData::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::ProcessingInstruction(text) => {
                out.push_str("<?");
                out.push_str(text);
                out.push_str("?>");
            }
            NodeData::DocType(text) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(text.trim_start());
                out.push('>');
            }
        }
    }
}

// Line breaks and tabs are written as character references so that
// attribute-value normalization in other readers cannot change them.
fn push_attribute_value(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
}
