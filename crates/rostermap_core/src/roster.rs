//! Roster input: CSV rows decoded into [`RosterRow`]s.
//!
//! # Responsibility
//! - Decode a headed CSV roster with serde.
//! - Separate rows without a usable key from rows to merge.
//!
//! # Invariants
//! - Column order is irrelevant; columns are matched by header name.
//! - Unknown columns are ignored; missing or empty columns decode as `None`.
//! - A keyless row never aborts the read; it is logged and reported.

use crate::model::RosterRow;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub type RosterResult<T> = Result<T, RosterError>;

/// Errors from reading a roster.
#[derive(Debug)]
pub enum RosterError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed CSV or a value that does not decode.
    Csv(csv::Error),
}

impl Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv(err) => write!(f, "invalid roster: {err}"),
        }
    }
}

impl Error for RosterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<csv::Error> for RosterError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// A roster row dropped because its key is missing or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the source, header included.
    pub line: u64,
    pub names: Option<String>,
}

impl Display for SkippedRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}", self.line)?;
        if let Some(names) = &self.names {
            write!(f, " ({names})")?;
        }
        write!(f, " has no key")
    }
}

/// Decoded roster in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub rows: Vec<RosterRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Reads the roster at `path`.
///
/// # Errors
/// - [`RosterError::Io`] when the file cannot be opened.
/// - [`RosterError::Csv`] when the content is not valid CSV.
pub fn read_roster(path: &Path) -> RosterResult<Roster> {
    let file = File::open(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let roster = read_roster_from_reader(file)?;
    info!(
        "event=roster_read module=roster status=ok path={} rows={} skipped={}",
        path.display(),
        roster.rows.len(),
        roster.skipped.len()
    );
    Ok(roster)
}

/// Reads a roster from any byte source. The first record is the header.
pub fn read_roster_from_reader<R: Read>(reader: R) -> RosterResult<Roster> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut roster = Roster::default();
    let mut record = csv::StringRecord::new();
    while csv_reader.read_record(&mut record)? {
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row: RosterRow = record.deserialize(Some(&headers))?;
        if row.key().is_some() {
            roster.rows.push(row);
            continue;
        }
        let skipped = SkippedRow {
            line,
            names: row.names,
        };
        warn!(
            "event=roster_row_skipped module=roster status=skip line={} names={}",
            skipped.line,
            skipped.names.as_deref().unwrap_or("")
        );
        roster.skipped.push(skipped);
    }
    Ok(roster)
}
