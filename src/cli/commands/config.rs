use console::style;
use dialoguer::Confirm;

use crate::config::AppConfig;
use crate::error::Result;

pub fn show(config: &AppConfig) -> Result<()> {
    let config_path = AppConfig::config_path()?;

    println!("{}", style("Current Configuration").bold().cyan());
    println!();
    println!("  Bin dir:           {}", style(config.bin_dir().display()).white());
    println!("  System bin dir:    {}", style(config.system_bin_dir().display()).white());
    println!("  Log dir:           {}", style(config.log_dir().display()).white());
    println!("  Shell profile:     {}", style(config.shell_profile().display()).white());
    println!("  Discovery timeout: {}", style(&config.discovery_timeout).yellow());
    println!("  Download timeout:  {}", style(&config.download_timeout).yellow());
    println!("  GitHub API:        {}", style(&config.github_api).white());
    println!(
        "  GitHub token:      {}",
        if config.github_token.is_some() {
            style("set").green()
        } else {
            style("(none)").dim()
        }
    );
    print!("  Catalog:           ");
    match config.catalog_path() {
        Some(p) => println!("{}", style(p.display()).white()),
        None => println!("{}", style("(built-in)").dim()),
    }
    println!(
        "  Assume yes:        {}",
        if config.assume_yes {
            style("enabled").green()
        } else {
            style("disabled").dim()
        }
    );
    println!();

    if config_path.exists() {
        println!("Config file: {}", style(config_path.display()).dim());
    } else {
        println!(
            "{} Run {} to write one.",
            style("Using defaults.").dim(),
            style("devstrap config init").cyan()
        );
    }

    Ok(())
}

pub fn path() -> Result<()> {
    println!("{}", AppConfig::config_path()?.display());
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let config_path = AppConfig::config_path()?;

    if config_path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} exists. Overwrite with defaults?",
                config_path.display()
            ))
            .default(false)
            .interact()?;

        if !overwrite {
            println!("{}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    AppConfig::default().save()?;

    println!(
        "{} Configuration saved to {}",
        style("✓").green().bold(),
        style(config_path.display()).dim()
    );

    Ok(())
}
