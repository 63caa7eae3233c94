pub mod config;
pub mod display;
pub mod install;
pub mod manual;
pub mod preflight;
pub mod reconcile;
pub mod status;
pub mod tiers;

use crate::catalog::{builtin_catalog, Catalog};
use crate::config::AppConfig;
use crate::error::Result;

/// The configured catalog file, or the built-in catalog.
pub fn load_catalog(config: &AppConfig) -> Result<Catalog> {
    match config.catalog_path() {
        Some(path) => Catalog::from_yaml_file(&path),
        None => Ok(builtin_catalog()),
    }
}
