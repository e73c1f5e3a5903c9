//! Page geometry and the placement cursor for new entries.
//!
//! # Responsibility
//! - Describe page orientation and size for blank documents.
//! - Advance a deterministic cursor after each created entry.
//!
//! # Invariants
//! - A cursor only moves forward; it is reset to the policy origin on load.
//! - Placement never inspects existing entries; overlap is accepted.

use crate::svg::SvgTree;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)").expect("valid leading number regex")
});

/// Page orientation of a blank document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Fixed A4 page for this orientation, in millimetres.
    pub fn page(self) -> PageSize {
        match self {
            Self::Portrait => PageSize::new(210.0, 297.0),
            Self::Landscape => PageSize::new(297.0, 210.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Page dimensions in user units (millimetres for generated documents).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Reads `width`/`height` from the root element, ignoring units.
    ///
    /// A missing or unparsable dimension falls back to portrait A4.
    pub fn from_root(tree: &SvgTree) -> Self {
        let fallback = Orientation::Portrait.page();
        let root = tree.root();
        Self {
            width: tree
                .attribute(root, "width")
                .and_then(leading_number)
                .unwrap_or(fallback.width),
            height: tree
                .attribute(root, "height")
                .and_then(leading_number)
                .unwrap_or(fallback.height),
        }
    }
}

fn leading_number(value: &str) -> Option<f64> {
    LEADING_NUMBER
        .captures(value)
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Wrap rule: once X exceeds `max_x`, return to the origin X and step Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowWrap {
    pub max_x: f64,
    pub row_step: f64,
}

/// How a template places consecutive new entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPolicy {
    pub origin: Position,
    /// Offset applied after each placement.
    pub step: Position,
    pub wrap: Option<RowWrap>,
}

/// Next free position for a new entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    policy: LayoutPolicy,
    position: Position,
}

impl LayoutCursor {
    pub fn new(policy: LayoutPolicy) -> Self {
        Self {
            policy,
            position: policy.origin,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Moves past the current position and returns the new one.
    pub fn advance(&mut self) -> Position {
        self.position.x += self.policy.step.x;
        self.position.y += self.policy.step.y;
        if let Some(wrap) = self.policy.wrap {
            if self.position.x > wrap.max_x {
                self.position.x = self.policy.origin.x;
                self.position.y += wrap.row_step;
            }
        }
        self.position
    }
}

/// Formats a coordinate for markup, dropping float noise past 1e-6.
pub fn format_coordinate(value: f64) -> String {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}
