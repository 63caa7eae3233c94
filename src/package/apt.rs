use async_trait::async_trait;
use tokio::process::Command;

use super::{PackageInstallResult, PackageManager};
use crate::error::{BootstrapError, Result};

/// Stderr fragments apt prints when a package name is unknown to the index.
const NOT_FOUND_MARKERS: &[&str] = &[
    "Unable to locate package",
    "has no installation candidate",
    "is not available, but is referred to by another package",
];

/// `apt-get` driven through `sudo`.
#[derive(Debug, Clone)]
pub struct AptManager {
    sudo: String,
    apt_get: String,
}

impl Default for AptManager {
    fn default() -> Self {
        Self {
            sudo: "sudo".to_string(),
            apt_get: "apt-get".to_string(),
        }
    }
}

impl AptManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.sudo);
        cmd.args(["env", "DEBIAN_FRONTEND=noninteractive"])
            .arg(&self.apt_get);
        cmd
    }
}

/// Map an `apt-get install` exit into a result.
fn classify(success: bool, code: Option<i32>, stderr: &str) -> PackageInstallResult {
    if success {
        return PackageInstallResult::Installed;
    }

    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        return PackageInstallResult::NotFound;
    }

    let message = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with("E:"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .unwrap_or("")
        .trim()
        .to_string();

    PackageInstallResult::Failed { code, message }
}

#[async_trait]
impl PackageManager for AptManager {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn is_available(&self) -> bool {
        which::which(&self.apt_get).is_ok()
    }

    async fn refresh_index(&self) -> Result<()> {
        tracing::info!("Refreshing apt package index");

        let output = self.command().arg("update").output().await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(BootstrapError::Other(anyhow::anyhow!(
                "apt-get update failed: {}",
                stderr.trim()
            )))
        }
    }

    async fn install_package(&self, package_id: &str) -> Result<PackageInstallResult> {
        tracing::info!("Installing package {}", package_id);

        let output = self
            .command()
            .args(["install", "-y", "--no-install-recommends", package_id])
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let result = classify(output.status.success(), output.status.code(), &stderr);
        tracing::debug!("apt-get install {} -> {:?}", package_id, result);
        Ok(result)
    }
}
