//! Installation engine for package-manager entries.
//!
//! One run: split entries into present and missing, ask once, refresh the
//! index once, then install each missing entry on its own. A failing entry
//! is recorded and the loop moves on.
//!
//! ## Module structure
//! - `types` - InstallOutcome, OutcomeStatus, InstallationRun, RunSummary

mod types;

use crate::catalog::CatalogEntry;
use crate::package::{PackageInstallResult, PackageManager};
use crate::presence::PresenceChecker;

pub use types::{InstallOutcome, InstallationRun, OutcomeStatus};

pub const DETAIL_PRESENT: &str = "already installed";
pub const DETAIL_INSTALLED: &str = "installed";
pub const DETAIL_DECLINED: &str = "skipped by user";
pub const DETAIL_NOT_FOUND: &str = "not found in repository";
pub const DETAIL_FAILED: &str = "installer reported failure";

pub struct InstallationEngine<'a> {
    presence: &'a dyn PresenceChecker,
    packages: &'a dyn PackageManager,
}

impl<'a> InstallationEngine<'a> {
    pub fn new(presence: &'a dyn PresenceChecker, packages: &'a dyn PackageManager) -> Self {
        Self { presence, packages }
    }

    /// Install every missing entry.
    ///
    /// `confirm` receives the missing entries and is called at most once,
    /// only when something is missing. Declining leaves the host untouched.
    pub async fn run<F>(&self, entries: &[CatalogEntry], confirm: F) -> InstallationRun
    where
        F: FnOnce(&[CatalogEntry]) -> bool,
    {
        let mut run = InstallationRun::new();

        let present: Vec<bool> = entries
            .iter()
            .map(|e| self.presence.is_present(&e.logical_name))
            .collect();
        let missing: Vec<CatalogEntry> = entries
            .iter()
            .zip(&present)
            .filter(|(_, p)| !**p)
            .map(|(e, _)| e.clone())
            .collect();

        tracing::info!(
            "{} entries: {} present, {} missing",
            entries.len(),
            entries.len() - missing.len(),
            missing.len()
        );

        if missing.is_empty() {
            for entry in entries {
                run.record(InstallOutcome::new(
                    entry.clone(),
                    OutcomeStatus::AlreadyPresent,
                    DETAIL_PRESENT,
                ));
            }
            return run;
        }

        if !confirm(&missing) {
            tracing::info!("Installation of {} entries declined", missing.len());
            for (entry, is_present) in entries.iter().zip(&present) {
                let outcome = if *is_present {
                    InstallOutcome::new(entry.clone(), OutcomeStatus::AlreadyPresent, DETAIL_PRESENT)
                } else {
                    InstallOutcome::new(entry.clone(), OutcomeStatus::Unavailable, DETAIL_DECLINED)
                };
                run.record(outcome);
            }
            return run;
        }

        if let Err(e) = self.packages.refresh_index().await {
            tracing::warn!("Package index refresh failed, continuing: {}", e);
        }

        for (entry, is_present) in entries.iter().zip(&present) {
            let outcome = if *is_present {
                InstallOutcome::new(entry.clone(), OutcomeStatus::AlreadyPresent, DETAIL_PRESENT)
            } else {
                self.install_one(entry).await
            };
            run.record(outcome);
        }

        let summary = run.summary();
        tracing::info!("Package run finished: {}", summary);
        run
    }

    async fn install_one(&self, entry: &CatalogEntry) -> InstallOutcome {
        match self.packages.install_package(&entry.package_id).await {
            Ok(PackageInstallResult::Installed) => {
                tracing::info!("{} installed", entry);
                InstallOutcome::new(entry.clone(), OutcomeStatus::Installed, DETAIL_INSTALLED)
            }
            Ok(PackageInstallResult::NotFound) => {
                tracing::warn!("{}: package '{}' not found", entry.logical_name, entry.package_id);
                InstallOutcome::new(entry.clone(), OutcomeStatus::Unavailable, DETAIL_NOT_FOUND)
            }
            Ok(PackageInstallResult::Failed { code, message }) => {
                tracing::error!("{} installation failed ({:?}): {}", entry, code, message);
                let detail = match code {
                    Some(code) => format!("{} (exit {})", DETAIL_FAILED, code),
                    None => DETAIL_FAILED.to_string(),
                };
                InstallOutcome::new(entry.clone(), OutcomeStatus::Failed, detail)
            }
            Err(e) => {
                tracing::error!("{} installation could not start: {}", entry, e);
                InstallOutcome::new(
                    entry.clone(),
                    OutcomeStatus::Failed,
                    format!("{}: {}", DETAIL_FAILED, e),
                )
            }
        }
    }
}
