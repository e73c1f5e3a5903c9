//! Reconciliation session options.

use crate::layout::Orientation;

/// Options for one reconciliation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Remove entries absent from the roster after merging.
    pub prune_stale: bool,
    /// Move the previous document aside before saving.
    pub backup: bool,
    /// Page orientation used only when a blank document is created.
    pub orientation: Orientation,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            prune_stale: true,
            backup: true,
            orientation: Orientation::Portrait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReconcileOptions;
    use crate::layout::Orientation;

    #[test]
    fn defaults_prune_and_back_up_in_portrait() {
        let options = ReconcileOptions::default();
        assert!(options.prune_stale);
        assert!(options.backup);
        assert_eq!(options.orientation, Orientation::Portrait);
    }
}
