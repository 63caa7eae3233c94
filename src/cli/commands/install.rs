use console::style;
use dialoguer::Select;

use super::display::{confirm_install, print_header, print_outcomes, print_reconcile_actions, print_summary};
use super::preflight;
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::engine::InstallationEngine;
use crate::error::{BootstrapError, Result};
use crate::package::AptManager;
use crate::presence::PathPresence;

pub async fn execute(config: &AppConfig, tier: Option<String>, yes: bool) -> Result<()> {
    preflight::ensure_not_root()?;
    let apt = AptManager::new();
    preflight::ensure_package_manager(&apt)?;

    let catalog = super::load_catalog(config)?;
    let tier = match tier {
        Some(tier) => tier,
        None => select_tier(&catalog)?,
    };
    let entries = catalog.resolve(&tier)?;

    print_header(&format!("Tier {} ({} entries)", tier, entries.len()));

    let presence = PathPresence::new();
    let engine = InstallationEngine::new(&presence, &apt);
    let assume_yes = yes || config.assume_yes;

    let run = engine
        .run(&entries, |missing| confirm_install(missing, assume_yes))
        .await;

    print_outcomes(&run);
    println!();

    let actions = super::reconcile::apply(config, &presence).await?;
    print_reconcile_actions(&actions);

    print_summary(&run);

    if run.summary().installed > 0 {
        println!(
            "  {}",
            style("Open a new shell to pick up newly installed commands.").dim()
        );
        println!();
    }

    Ok(())
}

fn select_tier(catalog: &Catalog) -> Result<String> {
    if catalog.tiers.is_empty() {
        return Err(BootstrapError::Catalog("catalog defines no tiers".to_string()));
    }

    let labels: Vec<String> = catalog
        .tiers
        .iter()
        .map(|t| {
            if t.description.is_empty() {
                t.name.clone()
            } else {
                format!("{:<12} {}", t.name, t.description)
            }
        })
        .collect();

    let idx = Select::new()
        .with_prompt("Select a tier")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(catalog.tiers[idx].name.clone())
}
