//! Namespaced markup tree layer.
//!
//! # Responsibility
//! - Parse SVG documents and free-standing template fragments.
//! - Resolve short prefixes (`svg:`, `inkscape:`, `xlink:`, `sodipodi:`) on
//!   every tag and attribute access.
//! - Serialize trees back without disturbing unmanaged markup.
//!
//! # Invariants
//! - Every lookup goes through [`namespace::resolve`]; callers never compare
//!   raw prefixed names.
//! - Namespace declarations are preserved as written.

pub mod namespace;
mod parse;
mod tree;
mod write;

pub use namespace::{resolve, QualifiedName};
pub use parse::{parse_fragment, Fragment, ParseError};
pub use tree::{Attribute, Element, NodeData, NodeId, SvgTree};
