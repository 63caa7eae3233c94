//! Actions that need elevated privilege, plus who we are running as.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{BootstrapError, Result};

/// Privileged host mutations. Each call may prompt the operator for a password.
#[async_trait]
pub trait Privileged: Send + Sync {
    /// Create (or replace) `link` pointing at `target`.
    async fn symlink(&self, target: &Path, link: &Path) -> Result<()>;

    /// Add `user` to the supplementary group `group`.
    async fn add_user_to_group(&self, user: &str, group: &str) -> Result<()>;
}

/// Escalates through `sudo`, one invocation per action.
#[derive(Debug, Clone)]
pub struct SudoPrivileged {
    program: String,
}

impl Default for SudoPrivileged {
    fn default() -> Self {
        Self {
            program: "sudo".to_string(),
        }
    }
}

impl SudoPrivileged {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different escalation program (e.g. `doas`).
    #[cfg(test)]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<()> {
        tracing::debug!("{} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .await
            .map_err(|e| {
                BootstrapError::PrivilegeEscalationDenied(format!(
                    "cannot run {}: {}",
                    self.program, e
                ))
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(BootstrapError::PrivilegeEscalationDenied(format!(
                "{} {} failed: {}",
                self.program,
                args.first().unwrap_or(&""),
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl Privileged for SudoPrivileged {
    async fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        let link = link.to_string_lossy();
        self.run(&["ln", "-sfn", &target, &link]).await
    }

    async fn add_user_to_group(&self, user: &str, group: &str) -> Result<()> {
        self.run(&["usermod", "-aG", group, user]).await
    }
}

/// Whether the process runs with an effective uid of 0.
#[cfg(unix)]
pub fn is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Login name of the invoking user.
pub fn current_user() -> Result<String> {
    #[cfg(unix)]
    {
        if let Ok(Some(user)) = nix::unistd::User::from_uid(nix::unistd::getuid()) {
            return Ok(user.name);
        }
    }

    std::env::var("USER").map_err(|_| {
        BootstrapError::EnvironmentUnsupported("cannot determine current user".to_string())
    })
}
