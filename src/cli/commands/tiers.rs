use console::style;

use crate::config::AppConfig;
use crate::error::Result;

pub fn execute(config: &AppConfig) -> Result<()> {
    let catalog = super::load_catalog(config)?;

    println!();
    println!("  {}", style("Tiers").cyan().bold());
    println!();

    for tier in &catalog.tiers {
        let total = catalog.resolve(&tier.name)?.len();
        let parents = if tier.extends.is_empty() {
            String::new()
        } else {
            format!(" extends {}", tier.extends.join(", "))
        };

        println!(
            "  {} {}{}",
            style("●").green(),
            style(&tier.name).white().bold(),
            style(parents).dim()
        );
        if !tier.description.is_empty() {
            println!("    {}", tier.description);
        }
        println!(
            "    {}",
            style(format!(
                "{} own entries, {} in total",
                tier.entries.len(),
                total
            ))
            .dim()
        );
        println!();
    }

    if !catalog.manual_tools.is_empty() {
        let names: Vec<&str> = catalog.manual_tools.iter().map(|t| t.name.as_str()).collect();
        println!("  {}", style("Manual tools").cyan().bold());
        println!("    {}", names.join(", "));
        println!();
    }

    Ok(())
}
