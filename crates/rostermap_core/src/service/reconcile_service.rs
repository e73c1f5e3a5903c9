//! Reconciliation use-case service.
//!
//! # Responsibility
//! - Run one session: merge every row, prune, stamp the date, save.
//! - Report what changed for callers to display.
//!
//! # Invariants
//! - Any merge failure aborts the session before anything is written.
//! - Pruning happens only after every row has been merged.

use crate::config::ReconcileOptions;
use crate::document::{Document, DocumentError, MergeOutcome};
use crate::roster::{Roster, RosterError, SkippedRow};
use crate::template::TemplateFactory;
use chrono::{Local, NaiveDate};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors from a reconciliation session.
#[derive(Debug)]
pub enum ReconcileError {
    Document(DocumentError),
    Roster(RosterError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{err}"),
            Self::Roster(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::Roster(err) => Some(err),
        }
    }
}

impl From<DocumentError> for ReconcileError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<RosterError> for ReconcileError {
    fn from(value: RosterError) -> Self {
        Self::Roster(value)
    }
}

/// Summary of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub pruned: Vec<String>,
    pub skipped: Vec<SkippedRow>,
    /// `false` when the document has no last-updated text.
    pub stamped: bool,
    pub saved_to: Option<PathBuf>,
    pub backup_path: Option<PathBuf>,
}

/// Session runner for one template kind.
pub struct ReconcileService<T: TemplateFactory + Clone> {
    template: T,
    options: ReconcileOptions,
}

impl<T: TemplateFactory + Clone> ReconcileService<T> {
    pub fn new(template: T, options: ReconcileOptions) -> Self {
        Self { template, options }
    }

    /// Reconciles the document at `path` with `roster`, stamped with today's
    /// local date, and saves it.
    ///
    /// # Errors
    /// - Any [`DocumentError`] from open, merge or save.
    pub fn run(&self, path: &Path, roster: &Roster) -> ReconcileResult<ReconcileReport> {
        self.run_on(path, roster, Local::now().date_naive())
    }

    /// Same as [`ReconcileService::run`] with an explicit stamp date.
    pub fn run_on(
        &self,
        path: &Path,
        roster: &Roster,
        today: NaiveDate,
    ) -> ReconcileResult<ReconcileReport> {
        info!(
            "event=reconcile module=service status=start kind={} path={} rows={} prune={} backup={}",
            self.template.kind(),
            path.display(),
            roster.rows.len(),
            self.options.prune_stale,
            self.options.backup
        );
        let result = self.run_session(path, roster, today);
        match &result {
            Ok(report) => info!(
                "event=reconcile module=service status=ok kind={} created={} updated={} pruned={} skipped={}",
                self.template.kind(),
                report.created.len(),
                report.updated.len(),
                report.pruned.len(),
                report.skipped.len()
            ),
            Err(err) => error!(
                "event=reconcile module=service status=error kind={} error={}",
                self.template.kind(),
                err
            ),
        }
        result
    }

    /// Merges, prunes and stamps an already open document without saving.
    pub fn reconcile(
        &self,
        document: &mut Document<T>,
        roster: &Roster,
        today: NaiveDate,
    ) -> ReconcileResult<ReconcileReport> {
        let mut report = ReconcileReport {
            skipped: roster.skipped.clone(),
            ..ReconcileReport::default()
        };
        for row in &roster.rows {
            let key = row.key().unwrap_or_default().to_string();
            match document.merge(row.clone())? {
                MergeOutcome::Created => report.created.push(key),
                MergeOutcome::Updated => report.updated.push(key),
            }
        }
        if self.options.prune_stale {
            report.pruned = document.prune_stale();
        }
        report.stamped = document.stamp_last_updated(today);
        Ok(report)
    }

    fn run_session(
        &self,
        path: &Path,
        roster: &Roster,
        today: NaiveDate,
    ) -> ReconcileResult<ReconcileReport> {
        let mut document = Document::open(path, self.options.orientation, self.template.clone())?;
        let mut report = self.reconcile(&mut document, roster, today)?;
        let saved = document.save(self.options.backup)?;
        report.saved_to = Some(saved.path);
        report.backup_path = saved.backup_path;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReconcileError, ReconcileService};
    use crate::config::ReconcileOptions;
    use crate::document::{Document, DocumentError};
    use crate::layout::Orientation;
    use crate::model::RosterRow;
    use crate::roster::{Roster, SkippedRow};
    use crate::template::MapTemplate;
    use chrono::NaiveDate;
    use std::fs;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
    }

    fn roster(keys: &[&str]) -> Roster {
        Roster {
            rows: keys.iter().map(|key| RosterRow::new(*key)).collect(),
            skipped: vec![SkippedRow {
                line: 9,
                names: None,
            }],
        }
    }

    #[test]
    fn reconcile_reports_created_updated_and_pruned() {
        let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());
        let mut doc = Document::new("map.svg", Orientation::Portrait, MapTemplate).unwrap();
        service.reconcile(&mut doc, &roster(&["A", "B"]), today()).unwrap();
        doc.reset_rows();

        let report = service.reconcile(&mut doc, &roster(&["B", "C"]), today()).unwrap();
        assert_eq!(report.created, vec!["C"]);
        assert_eq!(report.updated, vec!["B"]);
        assert_eq!(report.pruned, vec!["A"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.stamped);
    }

    #[test]
    fn reconcile_without_pruning_keeps_stale_entries() {
        let options = ReconcileOptions {
            prune_stale: false,
            ..ReconcileOptions::default()
        };
        let service = ReconcileService::new(MapTemplate, options);
        let mut doc = Document::new("map.svg", Orientation::Portrait, MapTemplate).unwrap();
        service.reconcile(&mut doc, &roster(&["A"]), today()).unwrap();
        doc.reset_rows();
        let report = service.reconcile(&mut doc, &roster(&["B"]), today()).unwrap();
        assert!(report.pruned.is_empty());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn failed_open_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\" />").unwrap();

        let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());
        let result = service.run_on(&path, &roster(&["A"]), today());
        assert!(matches!(
            result,
            Err(ReconcileError::Document(DocumentError::Structure(_)))
        ));
        assert!(!dir.path().join("map.bak").exists());
    }

    #[test]
    fn run_creates_and_saves_new_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());

        let report = service.run_on(&path, &roster(&["A", "B"]), today()).unwrap();
        assert_eq!(report.created, vec!["A", "B"]);
        assert_eq!(report.saved_to.as_deref(), Some(path.as_path()));
        assert!(report.backup_path.is_none());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Last updated: 20 November 2025"));
    }
}
