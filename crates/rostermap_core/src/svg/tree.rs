//! Arena-backed markup tree with namespace-aware lookups.
//!
//! # Responsibility
//! - Own every node of one document in a flat arena addressed by `NodeId`.
//! - Resolve element/attribute names through in-scope `xmlns` declarations.
//! - Provide the small set of queries and mutations the reconciler needs.
//!
//! # Invariants
//! - Raw names and namespace declarations are kept exactly as written, so an
//!   untouched subtree serializes back to the same markup.
//! - Detached nodes stay in the arena but are unreachable from the root.
//! - Any prefix this crate writes is declared in scope at the point of use.

use super::namespace::{
    declaration_name, declared_prefix, namespace_for_prefix, prefix_for_namespace, resolve,
    split_prefix, QualifiedName, XML_NS,
};

/// Stable handle to one node inside an [`SvgTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Raw name as written, e.g. `inkscape:label`.
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Raw tag name as written, e.g. `g` or `svg:g`.
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One parsed document (or fragment) as an arena of nodes.
#[derive(Debug, Clone)]
pub struct SvgTree {
    slots: Vec<Slot>,
    root: NodeId,
    /// Top-level nodes before the root element (doctype, comments).
    prolog: Vec<NodeId>,
    /// Top-level nodes after the root element.
    epilog: Vec<NodeId>,
}

impl SvgTree {
    pub(crate) fn from_parts(
        slots: Vec<(NodeData, Option<NodeId>, Vec<NodeId>)>,
        root: NodeId,
        prolog: Vec<NodeId>,
        epilog: Vec<NodeId>,
    ) -> Self {
        Self {
            slots: slots
                .into_iter()
                .map(|(data, parent, children)| Slot {
                    data,
                    parent,
                    children,
                })
                .collect(),
            root,
            prolog,
            epilog,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn prolog(&self) -> &[NodeId] {
        &self.prolog
    }

    pub fn epilog(&self) -> &[NodeId] {
        &self.epilog
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.slots[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.slots[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slots[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    /// Iterates direct element children in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Returns whether `id` is still reachable from the root element.
    #[cfg(test)]
    pub(crate) fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Looks up the namespace URI bound to `prefix` at `id`.
    ///
    /// Walks `xmlns` declarations from `id` up to the root. The `xml` prefix
    /// is always bound. An empty default declaration (`xmlns=""`) unbinds.
    pub fn lookup_namespace(&self, id: NodeId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(element) = self.element(current) {
                let declared = element
                    .attributes
                    .iter()
                    .find(|attr| declared_prefix(&attr.name) == Some(prefix));
                if let Some(attr) = declared {
                    return Some(attr.value.as_str()).filter(|uri| !uri.is_empty());
                }
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Resolves the element name of `id` through in-scope declarations.
    ///
    /// Returns `None` for non-element nodes and for unbound prefixes.
    pub fn element_name(&self, id: NodeId) -> Option<QualifiedName> {
        let element = self.element(id)?;
        match split_prefix(&element.name) {
            (Some(prefix), local) => {
                let uri = self.lookup_namespace(id, prefix)?;
                Some(QualifiedName::new(Some(uri), local))
            }
            (None, local) => Some(QualifiedName::new(self.lookup_namespace(id, ""), local)),
        }
    }

    fn attribute_qname(&self, id: NodeId, raw: &str) -> Option<QualifiedName> {
        if declared_prefix(raw).is_some() {
            return None;
        }
        match split_prefix(raw) {
            (Some(prefix), local) => {
                let uri = self.lookup_namespace(id, prefix)?;
                Some(QualifiedName::new(Some(uri), local))
            }
            (None, local) => Some(QualifiedName::new(None, local)),
        }
    }

    fn attribute_index(&self, id: NodeId, wanted: &QualifiedName) -> Option<usize> {
        let element = self.element(id)?;
        element
            .attributes
            .iter()
            .position(|attr| self.attribute_qname(id, &attr.name).as_ref() == Some(wanted))
    }

    /// Returns whether element `id` has the tag `name` (e.g. `svg:text`).
    pub fn is_named(&self, id: NodeId, name: &str) -> bool {
        self.element_name(id) == Some(resolve(name))
    }

    /// Reads attribute `name` (e.g. `inkscape:label`) of element `id`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let wanted = resolve(name);
        let index = self.attribute_index(id, &wanted)?;
        self.element(id)
            .map(|element| element.attributes[index].value.as_str())
    }

    /// Sets attribute `name` on element `id`, keeping its raw spelling when it
    /// already exists and declaring the prefix when it does not.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let wanted = resolve(name);
        if let Some(index) = self.attribute_index(id, &wanted) {
            if let Some(element) = self.element_mut(id) {
                element.attributes[index].value = value.to_string();
            }
            return;
        }

        let raw = self.raw_attribute_name(id, &wanted);
        if let Some(element) = self.element_mut(id) {
            element.attributes.push(Attribute {
                name: raw,
                value: value.to_string(),
            });
        }
    }

    fn raw_attribute_name(&mut self, id: NodeId, name: &QualifiedName) -> String {
        let Some(uri) = name.namespace() else {
            return name.local().to_string();
        };
        if uri == XML_NS {
            return format!("xml:{}", name.local());
        }

        let prefix = match self.prefix_in_scope(id, uri) {
            Some(prefix) if self.lookup_namespace(id, &prefix) == Some(uri) => prefix,
            _ => {
                let prefix = prefix_for_namespace(uri).unwrap_or("ns0").to_string();
                self.declare_namespace(id, &prefix, uri);
                prefix
            }
        };
        format!("{prefix}:{}", name.local())
    }

    /// Nearest non-empty prefix declared for `uri` at or above `id`.
    fn prefix_in_scope(&self, id: NodeId, uri: &str) -> Option<String> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(element) = self.element(current) {
                let declared = element.attributes.iter().find_map(|attr| {
                    declared_prefix(&attr.name)
                        .filter(|prefix| !prefix.is_empty() && attr.value == uri)
                });
                if let Some(prefix) = declared {
                    return Some(prefix.to_string());
                }
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Finds the first direct element child named `tag` whose attributes
    /// match every `(name, value)` pair in `filters`.
    pub fn find_child(&self, id: NodeId, tag: &str, filters: &[(&str, &str)]) -> Option<NodeId> {
        let wanted = resolve(tag);
        self.element_children(id).find(|child| {
            self.element_name(*child).as_ref() == Some(&wanted)
                && self.matches_filters(*child, filters)
        })
    }

    /// Depth-first (document order) search below `id`, excluding `id`.
    pub fn find_descendant(
        &self,
        id: NodeId,
        tag: &str,
        filters: &[(&str, &str)],
    ) -> Option<NodeId> {
        let wanted = resolve(tag);
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = pending.pop() {
            if self.element_name(current).as_ref() == Some(&wanted)
                && self.matches_filters(current, filters)
            {
                return Some(current);
            }
            pending.extend(self.children(current).iter().rev().copied());
        }
        None
    }

    /// Lists direct element children named `tag`.
    pub fn children_named(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let wanted = resolve(tag);
        self.element_children(id)
            .filter(|child| self.element_name(*child).as_ref() == Some(&wanted))
            .collect()
    }

    fn matches_filters(&self, id: NodeId, filters: &[(&str, &str)]) -> bool {
        filters
            .iter()
            .all(|(name, value)| self.attribute(id, name) == Some(*value))
    }

    /// Text content directly inside `id` before any child element.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.children(id).first().map(|child| self.data(*child)) {
            Some(NodeData::Text(text)) | Some(NodeData::CData(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Replaces the leading text of `id`; an empty `text` removes it.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let leading = self
            .children(id)
            .first()
            .copied()
            .filter(|child| matches!(self.data(*child), NodeData::Text(_) | NodeData::CData(_)));

        match (leading, text.is_empty()) {
            (Some(child), true) => {
                self.detach(child);
            }
            (Some(child), false) => {
                self.slots[child.0].data = NodeData::Text(text.to_string());
            }
            (None, true) => {}
            (None, false) => {
                let child = self.alloc(NodeData::Text(text.to_string()));
                self.slots[child.0].parent = Some(id);
                self.slots[id.0].children.insert(0, child);
            }
        }
    }

    /// Editable text target: the first `svg:tspan` child when present.
    pub fn text_target(&self, id: NodeId) -> NodeId {
        self.find_child(id, "svg:tspan", &[]).unwrap_or(id)
    }

    /// Every text fragment below `id` in document order.
    pub fn itertext(&self, id: NodeId) -> Vec<&str> {
        let mut texts = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = pending.pop() {
            match self.data(current) {
                NodeData::Text(text) | NodeData::CData(text) => texts.push(text.as_str()),
                NodeData::Element(_) => {
                    pending.extend(self.children(current).iter().rev().copied());
                }
                _ => {}
            }
        }
        texts
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.push(child);
    }

    /// Appends a new element `tag` with `attributes` under `parent`.
    ///
    /// The tag is written unprefixed when its namespace is the default one in
    /// scope; missing prefix declarations are added to the new element.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> NodeId {
        let name = resolve(tag);
        let raw = match name.namespace() {
            None => name.local().to_string(),
            Some(uri) if self.lookup_namespace(parent, "") == Some(uri) => {
                name.local().to_string()
            }
            Some(uri) => {
                let (prefix, _) = split_prefix(tag);
                let prefix = prefix
                    .filter(|prefix| namespace_for_prefix(prefix) == Some(uri))
                    .or_else(|| prefix_for_namespace(uri))
                    .unwrap_or("ns0");
                format!("{prefix}:{}", name.local())
            }
        };

        let id = self.alloc(NodeData::Element(Element::new(raw.clone())));
        self.attach(parent, id);
        if let (Some(prefix), _) = split_prefix(&raw) {
            if let Some(uri) = name.namespace() {
                if self.lookup_namespace(id, prefix) != Some(uri) {
                    self.declare_namespace(id, prefix, uri);
                }
            }
        }
        for (attr_name, value) in attributes {
            self.set_attribute(id, attr_name, value);
        }
        id
    }

    fn declare_namespace(&mut self, id: NodeId, prefix: &str, uri: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attributes.push(Attribute {
                name: declaration_name(prefix),
                value: uri.to_string(),
            });
        }
    }

    /// Detaches `id` from its parent. Returns `false` when already detached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.slots[id.0].parent.take() else {
            return false;
        };
        self.slots[parent.0].children.retain(|child| *child != id);
        true
    }

    /// Detaches every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.slots[id.0].children);
        for child in children {
            self.slots[child.0].parent = None;
        }
    }

    /// Copies the subtree rooted at `fragment.node()` under `parent`.
    ///
    /// Prefixes the fragment relied on from its synthetic wrapper are declared
    /// on the copied root when the destination scope binds them differently.
    pub fn graft(&mut self, parent: NodeId, fragment: &super::Fragment) -> NodeId {
        let source = fragment.tree();
        let mut copies: Vec<(NodeId, NodeId)> = Vec::new();
        let new_root = self.copy_subtree(source, fragment.node(), parent, &mut copies);

        let mut missing: Vec<(String, String)> = Vec::new();
        for (original, copy) in &copies {
            let Some(element) = source.element(*original) else {
                continue;
            };
            let mut used = vec![split_prefix(&element.name).0.unwrap_or("")];
            used.extend(
                element
                    .attributes
                    .iter()
                    .filter(|attr| declared_prefix(&attr.name).is_none())
                    .filter_map(|attr| split_prefix(&attr.name).0),
            );
            for prefix in used {
                let wanted = source.lookup_namespace(*original, prefix);
                let Some(wanted) = wanted else {
                    continue;
                };
                if self.lookup_namespace(*copy, prefix) != Some(wanted)
                    && !missing.iter().any(|(known, _)| known == prefix)
                {
                    missing.push((prefix.to_string(), wanted.to_string()));
                }
            }
        }

        for (prefix, uri) in missing {
            self.declare_namespace(new_root, &prefix, &uri);
        }
        new_root
    }

    fn copy_subtree(
        &mut self,
        source: &SvgTree,
        node: NodeId,
        parent: NodeId,
        copies: &mut Vec<(NodeId, NodeId)>,
    ) -> NodeId {
        let copy = self.alloc(source.data(node).clone());
        self.attach(parent, copy);
        copies.push((node, copy));
        for child in source.children(node) {
            self.copy_subtree(source, *child, copy, copies);
        }
        copy
    }
}
