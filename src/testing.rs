//! In-memory host used by unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{BootstrapError, Result};
use crate::package::{PackageInstallResult, PackageManager};
use crate::presence::PresenceChecker;
use crate::privilege::Privileged;

/// What the fake package manager does for a package id.
#[derive(Debug, Clone)]
pub enum FakePackage {
    /// Installs and makes the given command present
    Provides(String),
    NotFound,
    Fails(i32),
}

/// Fake host: a set of present commands plus a scripted package manager.
pub struct FakeHost {
    present: Mutex<HashSet<String>>,
    packages: HashMap<String, FakePackage>,
    available: bool,
    pub refreshes: Mutex<usize>,
    pub install_calls: Mutex<Vec<String>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            present: Mutex::default(),
            packages: HashMap::new(),
            available: true,
            refreshes: Mutex::default(),
            install_calls: Mutex::default(),
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host where the package manager binary is missing.
    pub fn without_package_manager(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_present(self, name: &str) -> Self {
        self.present.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn with_package(mut self, package_id: &str, behavior: FakePackage) -> Self {
        self.packages.insert(package_id.to_string(), behavior);
        self
    }

    pub fn refresh_count(&self) -> usize {
        *self.refreshes.lock().unwrap()
    }

    pub fn installs(&self) -> Vec<String> {
        self.install_calls.lock().unwrap().clone()
    }
}

impl PresenceChecker for FakeHost {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.present
            .lock()
            .unwrap()
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}

#[async_trait]
impl PackageManager for FakeHost {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn refresh_index(&self) -> Result<()> {
        *self.refreshes.lock().unwrap() += 1;
        Ok(())
    }

    async fn install_package(&self, package_id: &str) -> Result<PackageInstallResult> {
        self.install_calls
            .lock()
            .unwrap()
            .push(package_id.to_string());

        Ok(match self.packages.get(package_id) {
            Some(FakePackage::Provides(command)) => {
                self.present.lock().unwrap().insert(command.clone());
                PackageInstallResult::Installed
            }
            Some(FakePackage::Fails(code)) => PackageInstallResult::Failed {
                code: Some(*code),
                message: "E: Sub-process /usr/bin/dpkg returned an error code (1)".to_string(),
            },
            Some(FakePackage::NotFound) | None => PackageInstallResult::NotFound,
        })
    }
}

/// Records privileged actions; symlinks are created for real so that follow-up
/// presence checks see them.
#[derive(Default)]
pub struct RecordingPrivileged {
    pub deny: bool,
    pub actions: Mutex<Vec<String>>,
}

impl RecordingPrivileged {
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Default::default()
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Privileged for RecordingPrivileged {
    async fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        if self.deny {
            return Err(BootstrapError::PrivilegeEscalationDenied(
                "sudo: a password is required".to_string(),
            ));
        }
        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(link)?;
        }
        std::os::unix::fs::symlink(target, link)?;
        self.actions
            .lock()
            .unwrap()
            .push(format!("ln {} {}", target.display(), link.display()));
        Ok(())
    }

    async fn add_user_to_group(&self, user: &str, group: &str) -> Result<()> {
        if self.deny {
            return Err(BootstrapError::PrivilegeEscalationDenied(
                "sudo: a password is required".to_string(),
            ));
        }
        self.actions
            .lock()
            .unwrap()
            .push(format!("usermod {} {}", group, user));
        Ok(())
    }
}
