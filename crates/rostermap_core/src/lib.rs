//! Core reconciliation logic for rostermap.
//! Merges a keyed roster into a hand-authored SVG map or list, keeping every
//! piece of markup it does not manage intact.

pub mod config;
pub mod document;
pub mod layout;
pub mod logging;
pub mod model;
pub mod roster;
pub mod service;
pub mod svg;
pub mod template;

pub use config::ReconcileOptions;
pub use document::{Document, DocumentError, DocumentResult, MergeOutcome, SaveReport};
pub use layout::{LayoutCursor, LayoutPolicy, Orientation, PageSize, Position};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{Occupancy, Record, RosterRow};
pub use roster::{read_roster, read_roster_from_reader, Roster, RosterError, SkippedRow};
pub use service::reconcile_service::{
    ReconcileError, ReconcileReport, ReconcileResult, ReconcileService,
};
pub use template::{ListTemplate, MapTemplate, TemplateFactory};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
