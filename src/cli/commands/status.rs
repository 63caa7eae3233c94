use console::style;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::Result;
use crate::presence::{PathPresence, PresenceChecker};
use crate::release::tool_entry;

pub fn execute(config: &AppConfig, tier: Option<String>) -> Result<()> {
    let catalog = super::load_catalog(config)?;
    let presence = PathPresence::new();

    println!();
    match tier {
        Some(tier) => print_tier(&catalog, &tier, &presence)?,
        None => print_overview(&catalog, &presence, config)?,
    }
    println!();

    Ok(())
}

fn print_tier(catalog: &Catalog, tier: &str, presence: &dyn PresenceChecker) -> Result<()> {
    let entries = catalog.resolve(tier)?;
    let present = entries
        .iter()
        .filter(|e| presence.is_present(&e.logical_name))
        .count();

    println!(
        "  {} {}",
        style(tier).cyan().bold(),
        style(format!("{}/{} present", present, entries.len())).dim()
    );
    println!();

    for entry in &entries {
        match presence.locate(&entry.logical_name) {
            Some(path) => println!(
                "    {} {:<24} {}",
                style("[x]").green(),
                entry.to_string(),
                style(path.display()).dim()
            ),
            None => println!(
                "    {} {}",
                style("[ ]").dim(),
                style(entry.to_string()).yellow()
            ),
        }
    }

    Ok(())
}

fn print_overview(catalog: &Catalog, presence: &dyn PresenceChecker, config: &AppConfig) -> Result<()> {
    println!("  {}", style("Tiers").cyan().bold());
    for tier in &catalog.tiers {
        let entries = catalog.resolve(&tier.name)?;
        let present = entries
            .iter()
            .filter(|e| presence.is_present(&e.logical_name))
            .count();
        let marker = if present == entries.len() {
            style("●").green()
        } else {
            style("○").yellow()
        };
        println!(
            "    {} {:<12} {}",
            marker,
            tier.name,
            style(format!("{}/{} present", present, entries.len())).dim()
        );
    }

    if catalog.manual_tools.is_empty() {
        return Ok(());
    }

    println!();
    println!("  {}", style("Manual tools").cyan().bold());
    let bin_dir = config.bin_dir();
    for tool in &catalog.manual_tools {
        let entry = tool_entry(tool);
        let installed = presence.is_present(&entry.logical_name)
            || bin_dir.join(&entry.logical_name).exists();
        if installed {
            println!("    {} {}", style("[x]").green(), entry);
        } else {
            println!("    {} {}", style("[ ]").dim(), style(entry.to_string()).yellow());
        }
    }

    Ok(())
}
