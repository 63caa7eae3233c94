//! Tool catalog: tiers of package-manager entries plus manual tools.
//!
//! The catalog is plain data. It is built once at startup (either the
//! built-in one or a YAML file) and handed to the engine by reference.
//!
//! Tiers may extend other tiers. [`Catalog::resolve`] flattens a tier and
//! its ancestors into one deduplicated entry list, so a single engine run
//! covers the whole chain.

mod builtin;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};
use crate::release::ManualTool;

pub use builtin::builtin_catalog;

/// One installable item: the command expected on PATH and the package that provides it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "name")]
    pub logical_name: String,
    #[serde(rename = "package")]
    pub package_id: String,
}

impl CatalogEntry {
    pub fn new(logical_name: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            package_id: package_id.into(),
        }
    }
}

impl std::fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.logical_name == self.package_id {
            write!(f, "{}", self.logical_name)
        } else {
            write!(f, "{} ({})", self.logical_name, self.package_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Tiers whose entries come before this tier's own.
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tiers: Vec<Tier>,
    #[serde(default)]
    pub manual_tools: Vec<ManualTool>,
}

impl Catalog {
    /// Load a catalog from a YAML file and validate it.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml(&content)?;
        tracing::debug!("Loaded catalog from {}", path.display());
        Ok(catalog)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn manual_tool(&self, name: &str) -> Option<&ManualTool> {
        self.manual_tools.iter().find(|t| t.name == name)
    }

    /// Check structural invariants: unique names, known parents, no cycles.
    pub fn validate(&self) -> Result<()> {
        let mut tier_names = HashSet::new();
        for tier in &self.tiers {
            if !tier_names.insert(tier.name.as_str()) {
                return Err(BootstrapError::Catalog(format!(
                    "tier '{}' is defined more than once",
                    tier.name
                )));
            }

            let mut logical = HashSet::new();
            for entry in &tier.entries {
                if !logical.insert(entry.logical_name.as_str()) {
                    return Err(BootstrapError::Catalog(format!(
                        "tier '{}' lists '{}' more than once",
                        tier.name, entry.logical_name
                    )));
                }
            }
        }

        for tier in &self.tiers {
            for parent in &tier.extends {
                if !tier_names.contains(parent.as_str()) {
                    return Err(BootstrapError::Catalog(format!(
                        "tier '{}' extends unknown tier '{}'",
                        tier.name, parent
                    )));
                }
            }
        }

        for tier in &self.tiers {
            self.check_acyclic(&tier.name, &mut Vec::new())?;
        }

        let mut tool_names = HashSet::new();
        for tool in &self.manual_tools {
            if !tool_names.insert(tool.name.as_str()) {
                return Err(BootstrapError::Catalog(format!(
                    "manual tool '{}' is defined more than once",
                    tool.name
                )));
            }
        }

        Ok(())
    }

    fn check_acyclic<'a>(&'a self, name: &'a str, path: &mut Vec<&'a str>) -> Result<()> {
        if path.contains(&name) {
            path.push(name);
            return Err(BootstrapError::Catalog(format!(
                "tier inclusion cycle: {}",
                path.join(" -> ")
            )));
        }

        let Some(tier) = self.tier(name) else {
            return Ok(());
        };

        path.push(name);
        for parent in &tier.extends {
            self.check_acyclic(parent, path)?;
        }
        path.pop();

        Ok(())
    }

    /// Flatten a tier and everything it extends into one ordered entry list.
    ///
    /// Parents are visited first, in declared order. Duplicates are removed
    /// by logical name and the first occurrence wins.
    pub fn resolve(&self, tier_name: &str) -> Result<Vec<CatalogEntry>> {
        if self.tier(tier_name).is_none() {
            return Err(BootstrapError::UnknownTier(tier_name.to_string()));
        }

        let mut visited = HashSet::new();
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        self.collect(tier_name, &mut Vec::new(), &mut visited, &mut seen, &mut entries)?;

        Ok(entries)
    }

    fn collect<'a>(
        &'a self,
        name: &'a str,
        stack: &mut Vec<&'a str>,
        visited: &mut HashSet<&'a str>,
        seen: &mut HashSet<String>,
        out: &mut Vec<CatalogEntry>,
    ) -> Result<()> {
        if stack.contains(&name) {
            return Err(BootstrapError::Catalog(format!(
                "tier inclusion cycle through '{}'",
                name
            )));
        }
        // Diamond inclusion: a shared ancestor contributes once.
        if !visited.insert(name) {
            return Ok(());
        }

        let tier = self
            .tier(name)
            .ok_or_else(|| BootstrapError::UnknownTier(name.to_string()))?;

        stack.push(name);
        for parent in &tier.extends {
            self.collect(parent, stack, visited, seen, out)?;
        }
        stack.pop();

        for entry in &tier.entries {
            if seen.insert(entry.logical_name.clone()) {
                out.push(entry.clone());
            } else {
                tracing::debug!(
                    "Tier '{}' redefines '{}'; keeping the earlier entry",
                    name,
                    entry.logical_name
                );
            }
        }

        Ok(())
    }
}
