//! External roster row model.
//!
//! # Responsibility
//! - Carry one decoded roster line with explicitly optional fields.
//! - Offer a named-field accessor for templates and diagnostics.
//!
//! # Invariants
//! - A row is usable only when `rapid` is present and not blank.
//! - Missing fields are `None`, never an error.

use serde::{Deserialize, Serialize};

/// Field name of the unique key column.
pub const KEY_FIELD: &str = "rapid";

/// One external record from the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    /// Unique rural address number binding the row to one entry.
    #[serde(default)]
    pub rapid: Option<String>,
    /// House or lot number shown prominently on the entry.
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Comma-separated phone numbers.
    #[serde(default)]
    pub phone: Option<String>,
    /// Comma-separated occupant names.
    #[serde(default)]
    pub names: Option<String>,
    /// Occupancy category, e.g. `Permanent` or `Holidays`.
    #[serde(default)]
    pub occupancy: Option<String>,
}

impl RosterRow {
    /// Creates a row carrying only its key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            rapid: Some(key.into()),
            ..Self::default()
        }
    }

    /// Trimmed key, or `None` when missing or blank.
    pub fn key(&self) -> Option<&str> {
        non_blank(self.rapid.as_deref())
    }

    /// Returns the trimmed value of a named field, `None` when absent/blank.
    ///
    /// Unknown field names also return `None`.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            KEY_FIELD => self.rapid.as_deref(),
            "number" => self.number.as_deref(),
            "address" => self.address.as_deref(),
            "phone" => self.phone.as_deref(),
            "names" => self.names.as_deref(),
            "occupancy" => self.occupancy.as_deref(),
            _ => None,
        };
        non_blank(value)
    }

    /// Occupant names split on commas, trimmed, blanks dropped.
    pub fn name_list(&self) -> Vec<String> {
        split_list(self.names.as_deref())
    }

    /// Phone numbers split on commas, trimmed, blanks dropped.
    pub fn phone_list(&self) -> Vec<String> {
        split_list(self.phone.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
