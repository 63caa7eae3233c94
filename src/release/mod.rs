//! Tools installed from upstream release artifacts instead of the package manager.
//!
//! ## Module structure
//! - `resolver` - turns a [`ManualTool`] into a concrete download URL
//! - `installer` - downloads, unpacks and places the artifact
//! - `extract` - archive unpacking helpers
//! - `batch` - plans and runs several tools as one batch

mod batch;
mod extract;
mod installer;
mod resolver;

use std::collections::BTreeMap;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};

pub use batch::{tool_entry, BatchProgress, ManualBatch};
pub use installer::ArtifactInstaller;
pub use resolver::ReleaseResolver;

/// How a release artifact is turned into an executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackagingKind {
    /// The download is the executable itself
    RawBinary,
    /// A `.tar.gz` containing the executable somewhere inside
    Tarball,
    /// A `.zip` containing the executable somewhere inside
    Zip,
    /// A shell script that installs the tool on its own
    InstallerScript,
}

/// A tool that is not available from the package repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Upstream `owner/name` used for release discovery. Without it only the pinned URL is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub pinned_version: String,
    /// URL template; `{version}` and `{arch}` are substituted.
    pub url_pattern: String,
    /// Normalised host architecture -> token used in asset names.
    pub arch_map: BTreeMap<String, String>,
    pub packaging: PackagingKind,
    /// Regex template narrowing discovered asset names; `{arch}` is substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_pattern: Option<String>,
    /// Executable name as distributed.
    pub binary: String,
    /// Canonical invocation name when it differs from `binary`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Installer-script flags; `{bin_dir}` is substituted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script_args: Vec<String>,
    /// Also link the command into the system binary directory.
    #[serde(default)]
    pub system_link: bool,
}

impl ManualTool {
    /// Name the tool is invoked by.
    pub fn command_name(&self) -> &str {
        self.command.as_deref().unwrap_or(&self.binary)
    }

    pub fn arch_token(&self, arch: &str) -> Result<&str> {
        self.arch_map
            .get(arch)
            .map(String::as_str)
            .ok_or_else(|| BootstrapError::UnsupportedArchitecture {
                tool: self.name.clone(),
                arch: arch.to_string(),
            })
    }

    /// Last-known-good URL for the given architecture.
    pub fn pinned_url(&self, arch: &str) -> Result<String> {
        let token = self.arch_token(arch)?;
        Ok(self
            .url_pattern
            .replace("{version}", &self.pinned_version)
            .replace("{arch}", token))
    }

    /// Whether a discovered asset name is a candidate for this tool on `arch`.
    pub fn matches_asset(&self, asset_name: &str, arch: &str) -> Result<bool> {
        let token = self.arch_token(arch)?;

        if is_sidecar(asset_name) || !asset_name.contains(token) {
            return Ok(false);
        }

        match &self.asset_pattern {
            Some(pattern) => {
                let pattern = pattern.replace("{arch}", &regex_lite::escape(token));
                let re = Regex::new(&pattern).map_err(|e| {
                    BootstrapError::Catalog(format!(
                        "invalid asset_pattern for {}: {}",
                        self.name, e
                    ))
                })?;
                Ok(re.is_match(asset_name))
            }
            None => Ok(asset_name.to_lowercase().contains("linux")),
        }
    }
}

const SIDECAR_SUFFIXES: &[&str] = &[
    ".sha256", ".sha256sum", ".sha512", ".md5", ".sig", ".asc", ".pem", ".minisig", ".sbom",
    ".json",
];

/// Checksum, signature and metadata files published next to the real artifacts.
fn is_sidecar(asset_name: &str) -> bool {
    let lower = asset_name.to_lowercase();
    lower.contains("checksums") || SIDECAR_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Where a download URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Found by querying the upstream release listing
    Discovered,
    /// Computed from the tool's pinned version
    Pinned,
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactSource::Discovered => write!(f, "latest release"),
            ArtifactSource::Pinned => write!(f, "pinned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    pub source: ArtifactSource,
    pub version: String,
}

/// Map `uname -m` spellings onto the keys used in `arch_map`.
pub fn normalize_arch(machine: &str) -> String {
    match machine {
        "x86_64" | "amd64" => "x86_64".to_string(),
        "aarch64" | "arm64" => "aarch64".to_string(),
        "armv7l" | "armv7" | "armhf" => "armv7".to_string(),
        other => other.to_string(),
    }
}

/// Architecture reported by the running kernel.
#[cfg(unix)]
pub fn host_arch() -> Result<String> {
    let uts = nix::sys::utsname::uname()
        .map_err(|e| BootstrapError::EnvironmentUnsupported(format!("uname failed: {}", e)))?;
    Ok(normalize_arch(&uts.machine().to_string_lossy()))
}

#[cfg(not(unix))]
pub fn host_arch() -> Result<String> {
    Ok(normalize_arch(std::env::consts::ARCH))
}

#[cfg(test)]
pub(crate) fn test_tool(packaging: PackagingKind) -> ManualTool {
    ManualTool {
        name: "lazygit".to_string(),
        description: String::new(),
        repo: Some("jesseduffield/lazygit".to_string()),
        pinned_version: "0.44.1".to_string(),
        url_pattern: "https://github.com/jesseduffield/lazygit/releases/download/v{version}/lazygit_{version}_Linux_{arch}.tar.gz".to_string(),
        arch_map: BTreeMap::from([
            ("x86_64".to_string(), "x86_64".to_string()),
            ("aarch64".to_string(), "arm64".to_string()),
        ]),
        packaging,
        asset_pattern: Some(r"_Linux_{arch}\.tar\.gz$".to_string()),
        binary: "lazygit".to_string(),
        command: None,
        script_args: vec![],
        system_link: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_url_substitutes_version_and_arch() {
        let tool = test_tool(PackagingKind::Tarball);
        assert_eq!(
            tool.pinned_url("aarch64").unwrap(),
            "https://github.com/jesseduffield/lazygit/releases/download/v0.44.1/lazygit_0.44.1_Linux_arm64.tar.gz"
        );
    }

    #[test]
    fn test_unknown_arch_is_unsupported() {
        let tool = test_tool(PackagingKind::Tarball);
        let err = tool.pinned_url("riscv64").unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::UnsupportedArchitecture { ref arch, .. } if arch == "riscv64"
        ));
    }

    #[test]
    fn test_matches_asset_filters_sidecars_and_other_arches() {
        let tool = test_tool(PackagingKind::Tarball);
        assert!(tool
            .matches_asset("lazygit_0.45.0_Linux_x86_64.tar.gz", "x86_64")
            .unwrap());
        assert!(!tool
            .matches_asset("lazygit_0.45.0_Linux_arm64.tar.gz", "x86_64")
            .unwrap());
        assert!(!tool
            .matches_asset("lazygit_0.45.0_Linux_x86_64.tar.gz.sha256", "x86_64")
            .unwrap());
        assert!(!tool.matches_asset("checksums.txt", "x86_64").unwrap());
        assert!(!tool
            .matches_asset("lazygit_0.45.0_Darwin_x86_64.tar.gz", "x86_64")
            .unwrap());
    }

    #[test]
    fn test_matches_asset_without_pattern_requires_linux() {
        let mut tool = test_tool(PackagingKind::RawBinary);
        tool.asset_pattern = None;
        assert!(tool.matches_asset("tool-linux-x86_64", "x86_64").unwrap());
        assert!(!tool.matches_asset("tool-macos-x86_64", "x86_64").unwrap());
    }

    #[test]
    fn test_command_name_defaults_to_binary() {
        let mut tool = test_tool(PackagingKind::RawBinary);
        assert_eq!(tool.command_name(), "lazygit");
        tool.command = Some("lg".to_string());
        assert_eq!(tool.command_name(), "lg");
    }

    #[test]
    fn test_normalize_arch() {
        assert_eq!(normalize_arch("amd64"), "x86_64");
        assert_eq!(normalize_arch("arm64"), "aarch64");
        assert_eq!(normalize_arch("armv7l"), "armv7");
        assert_eq!(normalize_arch("riscv64"), "riscv64");
    }

    #[test]
    fn test_manual_tool_from_yaml() {
        let yaml = r#"
name: yq
pinned_version: 4.44.3
url_pattern: https://github.com/mikefarah/yq/releases/download/v{version}/yq_linux_{arch}
arch_map: { x86_64: amd64, aarch64: arm64 }
packaging: raw_binary
binary: yq
"#;
        let tool: ManualTool = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tool.packaging, PackagingKind::RawBinary);
        assert!(tool.repo.is_none());
        assert!(!tool.system_link);
        assert_eq!(
            tool.pinned_url("x86_64").unwrap(),
            "https://github.com/mikefarah/yq/releases/download/v4.44.3/yq_linux_amd64"
        );
    }
}
