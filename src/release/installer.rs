//! Download, unpack and place a resolved release artifact.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

use super::extract::{find_executable, unpack_tarball, unpack_zip};
use super::{tool_entry, ManualTool, PackagingKind, ResolvedArtifact};
use crate::engine::{InstallOutcome, OutcomeStatus};
use crate::error::Result;
use crate::privilege::Privileged;

const USER_AGENT: &str = concat!("devstrap/", env!("CARGO_PKG_VERSION"));

/// Stage at which a manual install stopped. Rendered into the outcome detail.
#[derive(Debug, Error)]
enum StageError {
    #[error("could not prepare workspace: {0}")]
    Workspace(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("unpack failed: {0}")]
    Unpack(String),

    #[error("installer script failed: {0}")]
    Script(String),

    #[error("placement failed: {0}")]
    Place(String),
}

pub struct ArtifactInstaller<'a> {
    client: Client,
    bin_dir: PathBuf,
    system_bin_dir: PathBuf,
    privileged: &'a dyn Privileged,
}

impl<'a> ArtifactInstaller<'a> {
    pub fn new(
        bin_dir: impl Into<PathBuf>,
        system_bin_dir: impl Into<PathBuf>,
        download_timeout: Duration,
        privileged: &'a dyn Privileged,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(download_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            bin_dir: bin_dir.into(),
            system_bin_dir: system_bin_dir.into(),
            privileged,
        })
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Install one tool into the binary directory. Never returns
    /// `Unavailable`: a manual tool either lands there or fails.
    ///
    /// The privileged system-wide link is a separate step, see
    /// [`ArtifactInstaller::link_system_wide`].
    pub async fn install(&self, artifact: &ResolvedArtifact, tool: &ManualTool) -> InstallOutcome {
        let entry = tool_entry(tool);

        tracing::info!(
            "Installing {} {} ({}) from {}",
            tool.name,
            artifact.version,
            artifact.source,
            artifact.url
        );

        match self.try_install(artifact, tool).await {
            Ok(()) => {
                let detail = format!("{} ({})", artifact.version, artifact.source);
                tracing::info!("{} installed: {}", tool.name, detail);
                InstallOutcome::new(entry, OutcomeStatus::Installed, detail)
            }
            Err(e) => {
                tracing::error!("{} failed: {}", tool.name, e);
                InstallOutcome::new(entry, OutcomeStatus::Failed, e.to_string())
            }
        }
    }

    async fn try_install(
        &self,
        artifact: &ResolvedArtifact,
        tool: &ManualTool,
    ) -> std::result::Result<(), StageError> {
        // Dropped on every return below, taking the downloads with it.
        let workdir = TempDir::new().map_err(|e| StageError::Workspace(e.to_string()))?;

        let download_path = workdir.path().join(artifact_file_name(&artifact.url, tool));
        self.download(&artifact.url, &download_path).await?;

        tokio::fs::create_dir_all(&self.bin_dir)
            .await
            .map_err(|e| StageError::Place(format!("{}: {}", self.bin_dir.display(), e)))?;

        match tool.packaging {
            PackagingKind::RawBinary => self.place(&download_path, &tool.binary).await?,
            PackagingKind::Tarball | PackagingKind::Zip => {
                let executable =
                    unpack(tool.packaging, download_path, workdir.path().join("unpacked"), &tool.binary)
                        .await?;
                self.place(&executable, &tool.binary).await?
            }
            PackagingKind::InstallerScript => {
                self.run_script(&download_path, tool).await?;
                let expected = self.bin_dir.join(&tool.binary);
                if !expected.exists() {
                    return Err(StageError::Script(format!(
                        "script finished but {} was not created",
                        expected.display()
                    )));
                }
            }
        }

        self.link_canonical_name(tool).await?;
        Ok(())
    }

    /// Link an installed tool into the system binary directory.
    ///
    /// Only for tools that ask for it and only after an `Installed` outcome.
    /// A refused escalation leaves the outcome `Installed` with a note.
    pub async fn link_system_wide(&self, tool: &ManualTool, outcome: &mut InstallOutcome) {
        if !tool.system_link || outcome.status != OutcomeStatus::Installed {
            return;
        }

        let target = self.bin_dir.join(tool.command_name());
        let link = self.system_bin_dir.join(tool.command_name());
        if let Err(e) = self.privileged.symlink(&target, &link).await {
            tracing::warn!(
                "Could not link {} into {}: {}",
                tool.command_name(),
                self.system_bin_dir.display(),
                e
            );
            outcome
                .detail
                .push_str(&format!("; system-wide link skipped ({})", e));
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> std::result::Result<(), StageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StageError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::Download(format!("{} returned {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StageError::Download(e.to_string()))?;
        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| StageError::Download(format!("could not save artifact: {}", e)))
    }

    /// Copy `source` into the binary directory as `name` with mode 0755.
    ///
    /// Writes to a sibling file first and renames it into place, so a
    /// running copy of the old binary is not clobbered mid-write.
    async fn place(&self, source: &Path, name: &str) -> std::result::Result<(), StageError> {
        let dest = self.bin_dir.join(name);
        let staging = self.bin_dir.join(format!(".{}.devstrap-new", name));

        let place_err = |e: std::io::Error| StageError::Place(format!("{}: {}", dest.display(), e));

        let result = async {
            tokio::fs::copy(source, &staging).await?;
            tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755)).await?;
            tokio::fs::rename(&staging, &dest).await
        }
        .await;

        if let Err(e) = result {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Could not remove {}: {}", staging.display(), cleanup);
                }
            }
            return Err(place_err(e));
        }

        Ok(())
    }

    /// Link the canonical command name to the placed binary when they differ.
    async fn link_canonical_name(
        &self,
        tool: &ManualTool,
    ) -> std::result::Result<(), StageError> {
        if tool.command_name() == tool.binary {
            return Ok(());
        }

        let link = self.bin_dir.join(tool.command_name());
        let link_err = |e: std::io::Error| StageError::Place(format!("{}: {}", link.display(), e));

        if tokio::fs::symlink_metadata(&link).await.is_ok() {
            tokio::fs::remove_file(&link).await.map_err(link_err)?;
        }
        tokio::fs::symlink(&tool.binary, &link).await.map_err(link_err)?;
        tracing::debug!("Linked {} -> {}", link.display(), tool.binary);

        Ok(())
    }

    /// Run an upstream install script as the invoking user.
    async fn run_script(&self, script: &Path, tool: &ManualTool) -> std::result::Result<(), StageError> {
        let bin_dir = self.bin_dir.to_string_lossy();
        let args: Vec<String> = tool
            .script_args
            .iter()
            .map(|a| a.replace("{bin_dir}", &bin_dir))
            .collect();

        tracing::debug!("sh {} {}", script.display(), args.join(" "));

        let output = Command::new("sh")
            .arg(script)
            .args(&args)
            .env("BIN_DIR", self.bin_dir.as_os_str())
            .output()
            .await
            .map_err(|e| StageError::Script(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
        Err(StageError::Script(match output.status.code() {
            Some(code) => format!("exit {}: {}", code, last.trim()),
            None => format!("terminated by signal: {}", last.trim()),
        }))
    }
}

async fn unpack(
    kind: PackagingKind,
    archive: PathBuf,
    dest: PathBuf,
    binary: &str,
) -> std::result::Result<PathBuf, StageError> {
    let binary = binary.to_string();

    tokio::task::spawn_blocking(move || -> std::result::Result<PathBuf, StageError> {
        let unpacked = match kind {
            PackagingKind::Zip => unpack_zip(&archive, &dest),
            _ => unpack_tarball(&archive, &dest),
        };
        unpacked.map_err(|e| StageError::Unpack(e.to_string()))?;

        find_executable(&dest, &binary)
            .ok_or_else(|| StageError::Unpack(format!("archive does not contain '{}'", binary)))
    })
    .await
    .map_err(|e| StageError::Unpack(e.to_string()))?
}

/// Last path segment of the URL, or the binary name when there is none.
fn artifact_file_name(url: &str, tool: &ManualTool) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| tool.binary.clone())
}
