//! Outcome types shared by the package path and the manual-tool path.

use crate::catalog::CatalogEntry;

/// Final state of one entry after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Already usable before the run
    AlreadyPresent,
    /// Installed by this run
    Installed,
    /// Not installable (unknown package, or skipped by the operator)
    Unavailable,
    /// Installation was attempted and failed
    Failed,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::AlreadyPresent => write!(f, "already present"),
            OutcomeStatus::Installed => write!(f, "installed"),
            OutcomeStatus::Unavailable => write!(f, "unavailable"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub entry: CatalogEntry,
    pub status: OutcomeStatus,
    pub detail: String,
}

impl InstallOutcome {
    pub fn new(entry: CatalogEntry, status: OutcomeStatus, detail: impl Into<String>) -> Self {
        Self {
            entry,
            status,
            detail: detail.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Unavailable | OutcomeStatus::Failed)
    }
}

/// All outcomes of one invocation, in entry order.
#[derive(Debug, Clone, Default)]
pub struct InstallationRun {
    outcomes: Vec<InstallOutcome>,
}

impl InstallationRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, outcome: InstallOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[InstallOutcome] {
        &self.outcomes
    }

    /// Entries that did not end up usable: failed or unavailable.
    pub fn failures(&self) -> Vec<&InstallOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure()).collect()
    }

    pub fn with_status(&self, status: OutcomeStatus) -> Vec<&InstallOutcome> {
        self.outcomes.iter().filter(|o| o.status == status).collect()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                OutcomeStatus::AlreadyPresent => summary.already_present += 1,
                OutcomeStatus::Installed => summary.installed += 1,
                OutcomeStatus::Unavailable => summary.unavailable += 1,
                OutcomeStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub installed: usize,
    pub already_present: usize,
    pub unavailable: usize,
    pub failed: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} installed, {} already present, {} unavailable, {} failed",
            self.installed, self.already_present, self.unavailable, self.failed
        )
    }
}
