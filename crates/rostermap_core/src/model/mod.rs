//! Record model for roster-driven entries.
//!
//! # Responsibility
//! - Define the typed external row and the in-memory entry record.
//! - Derive presentational fields (detail lines, occupancy) from a row.
//!
//! # Invariants
//! - A record is identified by its key; the key never changes.
//! - Derived fields are recomputed from the current row, never cached.

pub mod occupancy;
pub mod record;
pub mod row;

pub use occupancy::Occupancy;
pub use record::Record;
pub use row::RosterRow;
