//! Markup parsing into [`SvgTree`] via `quick-xml` events.
//!
//! # Invariants
//! - Whitespace text is preserved inside the root element.
//! - The XML declaration is dropped; it is regenerated on save.
//! - Exactly one root element is accepted.
//! - General entities declared in the internal DTD subset are expanded in
//!   text and attribute values; their replacement text is inserted as-is.
//!   External and parameter entities are not resolved.

use super::namespace::known_prefixes;
use super::tree::{Attribute, Element, NodeData, NodeId, SvgTree};
use once_cell::sync::Lazy;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from parsing documents and template fragments.
#[derive(Debug)]
pub enum ParseError {
    /// Low-level markup error reported by the reader.
    Xml(quick_xml::Error),
    /// Malformed attribute syntax.
    Attribute(quick_xml::events::attributes::AttrError),
    /// Name or raw content is not valid UTF-8.
    Utf8(std::str::Utf8Error),
    /// End tag without a matching start tag.
    UnexpectedEnd(String),
    /// Input ended with elements still open.
    Unclosed(String),
    /// Non-whitespace text outside the root element.
    TextOutsideRoot,
    /// Input contains no element at all.
    NoRootElement,
    /// A second top-level element was found.
    MultipleRoots,
    /// Fragment text must contain exactly one top-level element.
    FragmentRoots(usize),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(err) => write!(f, "malformed markup: {err}"),
            Self::Attribute(err) => write!(f, "malformed attribute: {err}"),
            Self::Utf8(err) => write!(f, "invalid utf-8 in markup: {err}"),
            Self::UnexpectedEnd(name) => write!(f, "unexpected end tag `{name}`"),
            Self::Unclosed(name) => write!(f, "element `{name}` is never closed"),
            Self::TextOutsideRoot => write!(f, "text found outside the root element"),
            Self::NoRootElement => write!(f, "document has no root element"),
            Self::MultipleRoots => write!(f, "document has more than one root element"),
            Self::FragmentRoots(count) => write!(
                f,
                "fragment must contain exactly one element, found {count}"
            ),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml(err) => Some(err),
            Self::Attribute(err) => Some(err),
            Self::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value)
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Self::Attribute(value)
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(value: std::str::Utf8Error) -> Self {
        Self::Utf8(value)
    }
}

/// A single parsed element plus the tree that owns it.
///
/// The tree also holds the synthetic wrapper carrying every known namespace
/// declaration, so prefixes inside the fragment resolve before grafting.
#[derive(Debug, Clone)]
pub struct Fragment {
    tree: SvgTree,
    node: NodeId,
}

impl Fragment {
    pub fn tree(&self) -> &SvgTree {
        &self.tree
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Parses a free-standing markup snippet that may use any known prefix.
pub fn parse_fragment(text: &str) -> Result<Fragment, ParseError> {
    let declarations = known_prefixes()
        .iter()
        .filter(|(prefix, _)| *prefix != "xml")
        .map(|(prefix, uri)| {
            if prefix.is_empty() {
                format!("xmlns=\"{uri}\"")
            } else {
                format!("xmlns:{prefix}=\"{uri}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let wrapped = format!("<svg {declarations}>{text}</svg>");

    let tree = SvgTree::parse(&wrapped)?;
    let roots: Vec<NodeId> = tree.element_children(tree.root()).collect();
    match roots.as_slice() {
        [node] => {
            let node = *node;
            Ok(Fragment { tree, node })
        }
        other => Err(ParseError::FragmentRoots(other.len())),
    }
}

static ENTITY_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!ENTITY\s+([A-Za-z_:][-A-Za-z0-9._:]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
        .expect("valid entity declaration regex")
});

/// Internal general entities declared by a document type.
#[derive(Debug, Default)]
struct Entities(HashMap<String, String>);

impl Entities {
    fn declare_from(&mut self, doctype: &str) {
        for caps in ENTITY_DECL_RE.captures_iter(doctype) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            // First declaration wins.
            self.0
                .entry(caps[1].to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.0.get(name).map(String::as_str))
    }
}

#[derive(Default)]
struct TreeBuilder {
    slots: Vec<(NodeData, Option<NodeId>, Vec<NodeId>)>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    prolog: Vec<NodeId>,
    epilog: Vec<NodeId>,
    entities: Entities,
}

impl TreeBuilder {
    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.slots.len());
        let parent = self.stack.last().copied();
        self.slots.push((data, parent, Vec::new()));
        if let Some(parent) = parent {
            self.slots[parent.index()].2.push(id);
        }
        id
    }

    fn open(&mut self, element: Element) -> Result<NodeId, ParseError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ParseError::MultipleRoots);
        }
        let id = self.push(NodeData::Element(element));
        if self.stack.is_empty() {
            self.root = Some(id);
        }
        Ok(id)
    }

    fn misc(&mut self, data: NodeData) {
        if !self.stack.is_empty() {
            self.push(data);
            return;
        }
        let id = self.push(data);
        if self.root.is_some() {
            self.epilog.push(id);
        } else {
            self.prolog.push(id);
        }
    }

    fn text(&mut self, text: String) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(ParseError::TextOutsideRoot);
        }
        self.push(NodeData::Text(text));
        Ok(())
    }

    fn finish(self) -> Result<SvgTree, ParseError> {
        if let Some(open) = self.stack.last() {
            let name = match &self.slots[open.index()].0 {
                NodeData::Element(element) => element.name.clone(),
                _ => String::new(),
            };
            return Err(ParseError::Unclosed(name));
        }
        let root = self.root.ok_or(ParseError::NoRootElement)?;
        Ok(SvgTree::from_parts(self.slots, root, self.prolog, self.epilog))
    }
}

fn element_from(start: &BytesStart<'_>, entities: &Entities) -> Result<Element, ParseError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        attributes.push(Attribute {
            name: std::str::from_utf8(attr.key.as_ref())?.to_string(),
            value: attr
                .unescape_value_with(|name| entities.resolve(name))?
                .into_owned(),
        });
    }
    Ok(Element { name, attributes })
}

impl SvgTree {
    /// Parses a complete document.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(text);
        let mut builder = TreeBuilder::default();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let element = element_from(&start, &builder.entities)?;
                    let id = builder.open(element)?;
                    builder.stack.push(id);
                }
                Event::Empty(start) => {
                    let element = element_from(&start, &builder.entities)?;
                    builder.open(element)?;
                }
                Event::End(end) => {
                    if builder.stack.pop().is_none() {
                        let name = std::str::from_utf8(end.name().as_ref())?.to_string();
                        return Err(ParseError::UnexpectedEnd(name));
                    }
                }
                Event::Text(text) => {
                    let text = text
                        .unescape_with(|name| builder.entities.resolve(name))?
                        .into_owned();
                    builder.text(text)?;
                }
                Event::CData(data) => {
                    let content = std::str::from_utf8(&data)?.to_string();
                    if builder.stack.is_empty() {
                        return Err(ParseError::TextOutsideRoot);
                    }
                    builder.push(NodeData::CData(content));
                }
                Event::Comment(comment) => {
                    let content = std::str::from_utf8(&comment)?.to_string();
                    builder.misc(NodeData::Comment(content));
                }
                Event::PI(instruction) => {
                    let content = std::str::from_utf8(&instruction)?.to_string();
                    builder.misc(NodeData::ProcessingInstruction(content));
                }
                Event::DocType(doctype) => {
                    let content = std::str::from_utf8(&doctype)?.to_string();
                    builder.entities.declare_from(&content);
                    builder.misc(NodeData::DocType(content));
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        builder.finish()
    }
}
