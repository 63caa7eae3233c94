//! Display and prompt helpers shared by the install commands.

use std::time::Duration;

use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::CatalogEntry;
use crate::engine::{InstallationRun, OutcomeStatus};
use crate::reconcile::ReconcileAction;

pub fn print_header(title: &str) {
    println!();
    println!("  {}", style(title).cyan().bold());
    println!();
}

/// Ask once whether to install `missing`. Any prompt error counts as "no".
pub fn confirm_install(missing: &[CatalogEntry], assume_yes: bool) -> bool {
    println!("  {} to install:", style(format!("{} missing", missing.len())).yellow());
    for entry in missing {
        println!("    {} {}", style("-").dim(), entry);
    }
    println!();

    if assume_yes {
        return true;
    }

    match Confirm::new()
        .with_prompt(format!("  {} Install these now?", style("?").cyan().bold()))
        .default(true)
        .interact()
    {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!("Confirmation prompt failed: {}", e);
            false
        }
    }
}

pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn status_icon(status: OutcomeStatus) -> console::StyledObject<&'static str> {
    match status {
        OutcomeStatus::AlreadyPresent => style("[=]").dim(),
        OutcomeStatus::Installed => style("[+]").green().bold(),
        OutcomeStatus::Unavailable => style("[-]").yellow(),
        OutcomeStatus::Failed => style("[x]").red().bold(),
    }
}

/// One line per outcome, in entry order.
pub fn print_outcomes(run: &InstallationRun) {
    for outcome in run.outcomes() {
        let name = format!("{:<24}", outcome.entry.to_string());
        let name = match outcome.status {
            OutcomeStatus::AlreadyPresent => style(name).dim(),
            OutcomeStatus::Installed => style(name).green(),
            OutcomeStatus::Unavailable => style(name).yellow(),
            OutcomeStatus::Failed => style(name).red(),
        };
        println!(
            "  {} {} {}",
            status_icon(outcome.status),
            name,
            style(&outcome.detail).dim()
        );
    }
}

/// The closing count line every run ends with, plus the entries that did not make it.
pub fn print_summary(run: &InstallationRun) {
    let summary = run.summary();

    println!();
    println!(
        "  {} installed, {} already present, {} unavailable, {} failed",
        style(summary.installed).green().bold(),
        style(summary.already_present).dim(),
        style(summary.unavailable).yellow(),
        style(summary.failed).red().bold()
    );

    let failures = run.failures();
    if !failures.is_empty() {
        println!();
        println!("  {}", style("Not installed:").yellow().bold());
        for outcome in failures {
            println!(
                "    {} {}: {}",
                status_icon(outcome.status),
                outcome.entry,
                outcome.detail
            );
        }
    }
    println!();
}

pub fn print_reconcile_actions(actions: &[ReconcileAction]) {
    if actions.is_empty() {
        return;
    }

    println!("  {}", style("Compatibility fixes").dim().bold());
    for action in actions {
        let icon = match action {
            ReconcileAction::Skipped { .. } => style("!").yellow().bold(),
            _ => style("✓").green().bold(),
        };
        println!("    {} {}", icon, action);
    }
    println!();
}
