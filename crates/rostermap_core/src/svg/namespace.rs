//! Fixed namespace prefix table and qualified-name resolution.
//!
//! # Responsibility
//! - Map short prefixes (`svg:`, `inkscape:`, `xlink:`, ...) to namespace URIs.
//! - Turn `prefix:local` strings into expanded `{uri}local` names.
//!
//! # Invariants
//! - The prefix table is process-wide and read-only after first use.
//! - The empty prefix is the SVG namespace (default element namespace).
//! - Unqualified names carry no namespace; expanded names pass through.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const SODIPODI_NS: &str = "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd";
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
pub const CC_NS: &str = "http://creativecommons.org/ns#";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// Implicitly bound by every XML document; never declared.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("", SVG_NS),
    ("svg", SVG_NS),
    ("xlink", XLINK_NS),
    ("sodipodi", SODIPODI_NS),
    ("inkscape", INKSCAPE_NS),
    ("cc", CC_NS),
    ("dc", DC_NS),
    ("rdf", RDF_NS),
    ("xml", XML_NS),
];

static PREFIX_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| KNOWN_PREFIXES.iter().copied().collect());

/// Returns the full prefix table in declaration order.
pub fn known_prefixes() -> &'static [(&'static str, &'static str)] {
    KNOWN_PREFIXES
}

/// Returns the namespace URI bound to `prefix` in the fixed table.
pub fn namespace_for_prefix(prefix: &str) -> Option<&'static str> {
    PREFIX_TABLE.get(prefix).copied()
}

/// Returns the first non-empty prefix bound to `uri` in the fixed table.
pub fn prefix_for_namespace(uri: &str) -> Option<&'static str> {
    KNOWN_PREFIXES
        .iter()
        .find(|(prefix, known)| !prefix.is_empty() && *known == uri)
        .map(|(prefix, _)| *prefix)
}

/// Namespace-expanded element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    namespace: Option<String>,
    local: String,
}

impl QualifiedName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|uri| !uri.is_empty()).map(str::to_owned),
            local: local.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(uri) => write!(f, "{{{uri}}}{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Resolves a name written with a short prefix against the fixed table.
///
/// - `inkscape:label` -> `{http://www.inkscape.org/namespaces/inkscape}label`
/// - `{uri}local` is taken as already expanded.
/// - `label` (no prefix) has no namespace.
///
/// # Panics
/// Panics when the prefix is not in the fixed table. Prefixes are written by
/// this crate's own code, so an unknown one is a programming error.
pub fn resolve(name: &str) -> QualifiedName {
    if let Some(rest) = name.strip_prefix('{') {
        if let Some((uri, local)) = rest.split_once('}') {
            return QualifiedName::new(Some(uri), local);
        }
    }

    match split_prefix(name) {
        (Some(prefix), local) => match namespace_for_prefix(prefix) {
            Some(uri) => QualifiedName::new(Some(uri), local),
            None => panic!("unknown namespace prefix `{prefix}` in name `{name}`"),
        },
        (None, local) => QualifiedName::new(None, local),
    }
}

/// Splits a raw `prefix:local` name. Names without a colon have no prefix.
pub fn split_prefix(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    }
}

/// Returns the prefix declared by an `xmlns`/`xmlns:p` attribute name.
///
/// The default namespace declaration yields the empty prefix.
pub(crate) fn declared_prefix(attribute_name: &str) -> Option<&str> {
    if attribute_name == "xmlns" {
        return Some("");
    }
    attribute_name.strip_prefix("xmlns:")
}

/// Builds the declaration attribute name for `prefix`.
pub(crate) fn declaration_name(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{prefix}")
    }
}

#[cfg(test)]
mod tests {
    use super::{declared_prefix, prefix_for_namespace, resolve, INKSCAPE_NS, SVG_NS, XLINK_NS};

    #[test]
    fn resolve_expands_known_prefixes() {
        let name = resolve("inkscape:label");
        assert_eq!(name.namespace(), Some(INKSCAPE_NS));
        assert_eq!(name.local(), "label");
        assert_eq!(
            resolve("xlink:href").to_string(),
            format!("{{{XLINK_NS}}}href")
        );
    }

    #[test]
    fn resolve_passes_unqualified_and_expanded_names_through() {
        assert_eq!(resolve("x").to_string(), "x");
        assert_eq!(resolve("x").namespace(), None);

        let expanded = format!("{{{SVG_NS}}}g");
        assert_eq!(resolve(&expanded).to_string(), expanded);
        assert_eq!(resolve(&expanded), resolve("svg:g"));
    }

    #[test]
    #[should_panic(expected = "unknown namespace prefix")]
    fn resolve_panics_on_unknown_prefix() {
        resolve("bogus:thing");
    }

    #[test]
    fn declared_prefix_recognizes_declarations() {
        assert_eq!(declared_prefix("xmlns"), Some(""));
        assert_eq!(declared_prefix("xmlns:svg"), Some("svg"));
        assert_eq!(declared_prefix("inkscape:label"), None);
    }

    #[test]
    fn prefix_for_namespace_skips_default_binding() {
        assert_eq!(prefix_for_namespace(SVG_NS), Some("svg"));
        assert_eq!(prefix_for_namespace("urn:nothing"), None);
    }
}
