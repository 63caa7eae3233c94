//! Planning and running a batch of manual tools.

use super::{ArtifactInstaller, ManualTool, ReleaseResolver};
use crate::catalog::CatalogEntry;
use crate::engine::{InstallOutcome, InstallationRun, OutcomeStatus};
use crate::error::Result;
use crate::presence::PresenceChecker;

/// How a manual tool shows up in outcomes: its command name, provided by the tool.
pub fn tool_entry(tool: &ManualTool) -> CatalogEntry {
    CatalogEntry::new(tool.command_name(), &tool.name)
}

/// Hooks around each tool install, e.g. to drive a spinner.
///
/// `finished` is called before any privileged step for that tool, so a
/// password prompt never shares the terminal with live progress output.
pub trait BatchProgress {
    fn started(&mut self, _tool: &ManualTool) {}
    fn finished(&mut self, _tool: &ManualTool) {}
}

/// No progress reporting.
impl BatchProgress for () {}

/// Requested tools split into already usable and to be installed, in request order.
#[derive(Debug)]
struct ManualPlan<'t> {
    present: Vec<&'t ManualTool>,
    missing: Vec<&'t ManualTool>,
}

impl<'t> ManualPlan<'t> {
    fn missing_entries(&self) -> Vec<CatalogEntry> {
        self.missing.iter().map(|t| tool_entry(t)).collect()
    }

    /// Start a run with the tools that need nothing.
    fn start_run(&self) -> InstallationRun {
        let mut run = InstallationRun::new();
        for tool in &self.present {
            run.record(InstallOutcome::new(
                tool_entry(tool),
                OutcomeStatus::AlreadyPresent,
                crate::engine::DETAIL_PRESENT,
            ));
        }
        run
    }

    /// Record every missing tool as skipped.
    fn decline(&self, run: &mut InstallationRun) {
        for tool in &self.missing {
            run.record(InstallOutcome::new(
                tool_entry(tool),
                OutcomeStatus::Unavailable,
                crate::engine::DETAIL_DECLINED,
            ));
        }
    }
}

pub struct ManualBatch<'a> {
    presence: &'a dyn PresenceChecker,
    resolver: &'a ReleaseResolver,
    installer: &'a ArtifactInstaller<'a>,
}

impl<'a> ManualBatch<'a> {
    pub fn new(
        presence: &'a dyn PresenceChecker,
        resolver: &'a ReleaseResolver,
        installer: &'a ArtifactInstaller<'a>,
    ) -> Self {
        Self {
            presence,
            resolver,
            installer,
        }
    }

    /// On PATH, or already placed in the binary directory.
    pub fn is_installed(&self, tool: &ManualTool) -> bool {
        let command = tool.command_name();
        self.presence.is_present(command) || self.installer.bin_dir().join(command).exists()
    }

    /// Check every tool supports this host, then split present from missing.
    ///
    /// An unsupported architecture fails the whole plan, before any tool is
    /// downloaded.
    fn plan<'t>(&self, tools: &[&'t ManualTool]) -> Result<ManualPlan<'t>> {
        for tool in tools {
            tool.arch_token(self.resolver.arch())?;
        }

        let (present, missing) = tools.iter().copied().partition(|t| self.is_installed(t));
        Ok(ManualPlan { present, missing })
    }

    /// Resolve and install one tool. Download and unpack problems come back
    /// as a `Failed` outcome, not as `Err`.
    async fn install_one(&self, tool: &ManualTool) -> Result<InstallOutcome> {
        let artifact = self.resolver.resolve(tool).await?;
        Ok(self.installer.install(&artifact, tool).await)
    }

    /// Plan, confirm once, then install each missing tool in request order.
    ///
    /// `confirm` receives the missing tools and is not called when nothing
    /// is missing. A failing tool is recorded and the batch moves on.
    pub async fn run<F, P>(
        &self,
        tools: &[&ManualTool],
        confirm: F,
        progress: &mut P,
    ) -> Result<InstallationRun>
    where
        F: FnOnce(&[CatalogEntry]) -> bool,
        P: BatchProgress,
    {
        let plan = self.plan(tools)?;
        let mut run = plan.start_run();

        if plan.missing.is_empty() {
            return Ok(run);
        }
        if !confirm(&plan.missing_entries()) {
            plan.decline(&mut run);
            return Ok(run);
        }

        for tool in &plan.missing {
            progress.started(tool);
            let outcome = self.install_one(tool).await;
            progress.finished(tool);

            let mut outcome = outcome?;
            self.installer.link_system_wide(tool, &mut outcome).await;
            run.record(outcome);
        }
        Ok(run)
    }
}
