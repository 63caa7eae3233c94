//! Package manager abstraction.
//!
//! The engine only needs two operations from the host package manager:
//! refresh the index and install one package. [`AptManager`] is the only
//! implementation; tests substitute in-memory fakes.

mod apt;

use async_trait::async_trait;

use crate::error::Result;

pub use apt::AptManager;

/// Classified result of a single package installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageInstallResult {
    Installed,
    /// The repository does not know the package (missing or renamed)
    NotFound,
    /// Any other installer failure
    Failed { code: Option<i32>, message: String },
}

#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Short name for display (e.g., "apt")
    fn name(&self) -> &'static str;

    /// Whether the manager's executables exist on this host
    fn is_available(&self) -> bool;

    /// Refresh the package index
    async fn refresh_index(&self) -> Result<()>;

    /// Install one package.
    ///
    /// `Err` means the installer could not be run at all; installer
    /// failures are reported through [`PackageInstallResult`].
    async fn install_package(&self, package_id: &str) -> Result<PackageInstallResult>;
}
