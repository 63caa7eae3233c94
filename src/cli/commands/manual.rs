use console::style;
use dialoguer::MultiSelect;
use indicatif::ProgressBar;

use super::display::{
    confirm_install, create_spinner, print_header, print_outcomes, print_reconcile_actions,
    print_summary,
};
use super::preflight;
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::engine::OutcomeStatus;
use crate::error::{BootstrapError, Result};
use crate::presence::PathPresence;
use crate::privilege::SudoPrivileged;
use crate::release::{
    host_arch, ArtifactInstaller, BatchProgress, ManualBatch, ManualTool, ReleaseResolver,
};
use crate::shell_profile::{dir_on_path, ProfileSink};

pub async fn execute(config: &AppConfig, names: Vec<String>, all: bool, yes: bool) -> Result<()> {
    preflight::ensure_not_root()?;

    let catalog = super::load_catalog(config)?;
    let arch = host_arch()?;
    let assume_yes = yes || config.assume_yes;

    let tools = select_tools(&catalog, &names, all, &arch)?;
    if tools.is_empty() {
        println!("  {}", style("No tools selected.").dim());
        return Ok(());
    }

    print_header(&format!("Manual tools ({})", arch));

    let presence = PathPresence::new();
    let privileged = SudoPrivileged::new();
    let resolver = ReleaseResolver::new(
        &config.github_api,
        config.github_token.clone(),
        config.discovery_timeout(),
        arch,
    )?;
    let installer = ArtifactInstaller::new(
        config.bin_dir(),
        config.system_bin_dir(),
        config.download_timeout(),
        &privileged,
    )?;
    let batch = ManualBatch::new(&presence, &resolver, &installer);

    let run = batch
        .run(
            &tools,
            |missing| confirm_install(missing, assume_yes),
            &mut SpinnerProgress::default(),
        )
        .await?;

    print_outcomes(&run);
    println!();

    if !run.with_status(OutcomeStatus::Installed).is_empty() {
        ensure_bin_dir_on_path(config)?;
    }

    let actions = super::reconcile::apply(config, &presence).await?;
    print_reconcile_actions(&actions);

    print_summary(&run);
    Ok(())
}

/// One spinner per tool, cleared before any sudo prompt.
#[derive(Default)]
struct SpinnerProgress {
    spinner: Option<ProgressBar>,
}

impl BatchProgress for SpinnerProgress {
    fn started(&mut self, tool: &ManualTool) {
        self.spinner = Some(create_spinner(&format!("Installing {}...", tool.name)));
    }

    fn finished(&mut self, _tool: &ManualTool) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Resolve tool names, `--all`, or an interactive pick.
///
/// With `--all`, tools that do not support this architecture are left out.
/// Named tools are kept so the batch reports the unsupported architecture.
fn select_tools<'c>(
    catalog: &'c Catalog,
    names: &[String],
    all: bool,
    arch: &str,
) -> Result<Vec<&'c ManualTool>> {
    if all {
        let (supported, unsupported): (Vec<_>, Vec<_>) = catalog
            .manual_tools
            .iter()
            .partition(|t| t.arch_token(arch).is_ok());
        for tool in unsupported {
            tracing::warn!("{} has no release for {}; skipping", tool.name, arch);
        }
        return Ok(supported);
    }

    if !names.is_empty() {
        return names
            .iter()
            .map(|name| {
                catalog
                    .manual_tool(name)
                    .ok_or_else(|| BootstrapError::UnknownManualTool(name.clone()))
            })
            .collect();
    }

    if catalog.manual_tools.is_empty() {
        return Ok(Vec::new());
    }

    let labels: Vec<String> = catalog
        .manual_tools
        .iter()
        .map(|t| format!("{:<12} {}", t.name, style(&t.description).dim()))
        .collect();

    let picked = MultiSelect::new()
        .with_prompt("Select tools to install (space to toggle)")
        .items(&labels)
        .interact()?;

    Ok(picked.into_iter().map(|i| &catalog.manual_tools[i]).collect())
}

fn ensure_bin_dir_on_path(config: &AppConfig) -> Result<()> {
    let bin_dir = config.bin_dir();
    if dir_on_path(&bin_dir) {
        return Ok(());
    }

    let sink = ProfileSink::new(config.shell_profile());
    if sink.ensure_path_entry(&bin_dir)? {
        println!(
            "  {} Added {} to PATH in {}",
            style("✓").green().bold(),
            style(bin_dir.display()).cyan(),
            style(sink.path().display()).dim()
        );
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;

    #[test]
    fn test_select_named_tools() {
        let catalog = builtin_catalog();
        let names = vec!["yq".to_string(), "lazygit".to_string()];
        let tools = select_tools(&catalog, &names, false, "x86_64").unwrap();
        let picked: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(picked, vec!["yq", "lazygit"]);
    }

    #[test]
    fn test_select_unknown_tool_fails() {
        let catalog = builtin_catalog();
        let err = select_tools(&catalog, &["nope".to_string()], false, "x86_64").unwrap_err();
        assert!(matches!(err, BootstrapError::UnknownManualTool(ref n) if n == "nope"));
    }

    #[test]
    fn test_select_all_drops_unsupported_arches() {
        let catalog = builtin_catalog();
        let tools = select_tools(&catalog, &[], true, "armv7").unwrap();
        let picked: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(picked.contains(&"lazygit"));
        assert!(!picked.contains(&"eza"));
        assert!(!picked.contains(&"tealdeer"));
    }
}
