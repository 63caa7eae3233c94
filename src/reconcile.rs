//! Post-install fixups for distribution naming quirks.
//!
//! Each fixup is a check followed by at most one action, so running the
//! reconciler again after it has done its work changes nothing.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::presence::PresenceChecker;
use crate::privilege::Privileged;

const GROUP_FILE: &str = "/etc/group";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixupKind {
    /// Link `expected` to the executable found under `actual`.
    Symlink,
    /// `actual` being present means the user should be in `group`.
    GroupMembership { group: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    pub expected: String,
    pub actual: String,
    pub kind: FixupKind,
}

impl Fixup {
    pub fn symlink(expected: &str, actual: &str) -> Self {
        Self {
            expected: expected.to_string(),
            actual: actual.to_string(),
            kind: FixupKind::Symlink,
        }
    }

    pub fn group(group: &str, actual: &str) -> Self {
        Self {
            expected: group.to_string(),
            actual: actual.to_string(),
            kind: FixupKind::GroupMembership {
                group: group.to_string(),
            },
        }
    }
}

/// Known Debian naming mismatches.
pub fn default_fixups() -> Vec<Fixup> {
    vec![
        Fixup::symlink("bat", "batcat"),
        Fixup::symlink("fd", "fdfind"),
        Fixup::group("docker", "docker"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    Linked { name: String, target: PathBuf },
    AddedToGroup { user: String, group: String },
    /// The fixup applied but could not be carried out.
    Skipped { name: String, reason: String },
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileAction::Linked { name, target } => {
                write!(f, "linked {} -> {}", name, target.display())
            }
            ReconcileAction::AddedToGroup { user, group } => {
                write!(f, "added {} to group {} (log in again to use it)", user, group)
            }
            ReconcileAction::Skipped { name, reason } => write!(f, "skipped {}: {}", name, reason),
        }
    }
}

pub struct Reconciler<'a> {
    presence: &'a dyn PresenceChecker,
    privileged: &'a dyn Privileged,
    bin_dir: PathBuf,
    user: Option<String>,
    group_file: PathBuf,
    fixups: Vec<Fixup>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        presence: &'a dyn PresenceChecker,
        privileged: &'a dyn Privileged,
        bin_dir: impl Into<PathBuf>,
        user: Option<String>,
    ) -> Self {
        Self {
            presence,
            privileged,
            bin_dir: bin_dir.into(),
            user,
            group_file: PathBuf::from(GROUP_FILE),
            fixups: default_fixups(),
        }
    }

    #[cfg(test)]
    pub fn with_group_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.group_file = path.into();
        self
    }

    #[cfg(test)]
    pub fn with_fixups(mut self, fixups: Vec<Fixup>) -> Self {
        self.fixups = fixups;
        self
    }

    /// Apply every fixup whose condition holds. Returns what was done.
    pub async fn reconcile(&self) -> Result<Vec<ReconcileAction>> {
        let mut actions = Vec::new();

        for fixup in &self.fixups {
            let Some(actual) = self.presence.locate(&fixup.actual) else {
                continue;
            };

            let action = match &fixup.kind {
                FixupKind::Symlink => self.link(&fixup.expected, &actual).await?,
                FixupKind::GroupMembership { group } => self.join_group(group).await?,
            };

            if let Some(action) = action {
                tracing::info!("Reconcile: {}", action);
                actions.push(action);
            }
        }

        if actions.is_empty() {
            tracing::debug!("Reconcile: nothing to do");
        }
        Ok(actions)
    }

    async fn link(&self, name: &str, target: &Path) -> Result<Option<ReconcileAction>> {
        let link = self.bin_dir.join(name);
        if self.presence.is_present(name) || link.symlink_metadata().is_ok() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.bin_dir).await?;
        if let Err(e) = tokio::fs::symlink(target, &link).await {
            tracing::warn!("Could not link {} to {}: {}", link.display(), target.display(), e);
            return Ok(Some(ReconcileAction::Skipped {
                name: name.to_string(),
                reason: e.to_string(),
            }));
        }

        Ok(Some(ReconcileAction::Linked {
            name: name.to_string(),
            target: target.to_path_buf(),
        }))
    }

    async fn join_group(&self, group: &str) -> Result<Option<ReconcileAction>> {
        let Some(user) = self.user.as_deref() else {
            tracing::debug!("Unknown user; not checking group '{}'", group);
            return Ok(None);
        };

        let content = match tokio::fs::read_to_string(&self.group_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(members) = group_members(&content, group) else {
            tracing::debug!("Group '{}' does not exist", group);
            return Ok(None);
        };
        if members.contains(&user) {
            return Ok(None);
        }

        match self.privileged.add_user_to_group(user, group).await {
            Ok(()) => Ok(Some(ReconcileAction::AddedToGroup {
                user: user.to_string(),
                group: group.to_string(),
            })),
            Err(e) => {
                tracing::warn!("Could not add {} to group {}: {}", user, group, e);
                Ok(Some(ReconcileAction::Skipped {
                    name: group.to_string(),
                    reason: e.to_string(),
                }))
            }
        }
    }
}

/// Supplementary members of `group` in `/etc/group` syntax, or `None` if the
/// group is not listed.
fn group_members<'c>(content: &'c str, group: &str) -> Option<Vec<&'c str>> {
    content.lines().find_map(|line| {
        let mut fields = line.split(':');
        if fields.next()? != group {
            return None;
        }
        let members = fields.nth(2).unwrap_or("");
        Some(members.split(',').filter(|m| !m.is_empty()).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHost, RecordingPrivileged};

    #[test]
    fn test_group_members() {
        let content = "root:x:0:\nsudo:x:27:alice\ndocker:x:999:alice,bob\n";
        assert_eq!(group_members(content, "docker"), Some(vec!["alice", "bob"]));
        assert_eq!(group_members(content, "root"), Some(vec![]));
        assert_eq!(group_members(content, "wheel"), None);
    }

    #[tokio::test]
    async fn test_symlink_fixup_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new().with_present("batcat");
        let privileged = RecordingPrivileged::default();
        let reconciler = Reconciler::new(&host, &privileged, dir.path(), None)
            .with_fixups(vec![Fixup::symlink("bat", "batcat")]);

        let first = reconciler.reconcile().await.unwrap();
        assert_eq!(
            first,
            vec![ReconcileAction::Linked {
                name: "bat".to_string(),
                target: PathBuf::from("/usr/bin/batcat"),
            }]
        );
        assert_eq!(
            std::fs::read_link(dir.path().join("bat")).unwrap(),
            PathBuf::from("/usr/bin/batcat")
        );

        let second = reconciler.reconcile().await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_no_action_when_expected_name_present() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new().with_present("fdfind").with_present("fd");
        let privileged = RecordingPrivileged::default();
        let reconciler = Reconciler::new(&host, &privileged, dir.path(), None)
            .with_fixups(vec![Fixup::symlink("fd", "fdfind")]);

        assert!(reconciler.reconcile().await.unwrap().is_empty());
        assert!(!dir.path().join("fd").exists());
    }

    #[tokio::test]
    async fn test_no_action_when_actual_name_absent() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new();
        let privileged = RecordingPrivileged::default();
        let reconciler = Reconciler::new(&host, &privileged, dir.path(), Some("alice".into()));

        assert!(reconciler.reconcile().await.unwrap().is_empty());
        assert!(privileged.actions().is_empty());
    }

    #[tokio::test]
    async fn test_group_fixup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let group_file = dir.path().join("group");
        std::fs::write(&group_file, "docker:x:999:\n").unwrap();

        let host = FakeHost::new().with_present("docker");
        let privileged = RecordingPrivileged::default();
        let reconciler = Reconciler::new(&host, &privileged, dir.path(), Some("alice".into()))
            .with_group_file(&group_file)
            .with_fixups(vec![Fixup::group("docker", "docker")]);

        let first = reconciler.reconcile().await.unwrap();
        assert_eq!(
            first,
            vec![ReconcileAction::AddedToGroup {
                user: "alice".to_string(),
                group: "docker".to_string(),
            }]
        );
        assert_eq!(privileged.actions(), vec!["usermod docker alice"]);

        // What usermod would have written.
        std::fs::write(&group_file, "docker:x:999:alice\n").unwrap();

        let second = reconciler.reconcile().await.unwrap();
        assert!(second.is_empty());
        assert_eq!(privileged.actions().len(), 1);
    }

    #[tokio::test]
    async fn test_denied_group_change_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let group_file = dir.path().join("group");
        std::fs::write(&group_file, "docker:x:999:\n").unwrap();

        let host = FakeHost::new().with_present("docker").with_present("batcat");
        let privileged = RecordingPrivileged::denying();
        let reconciler = Reconciler::new(&host, &privileged, dir.path(), Some("alice".into()))
            .with_group_file(&group_file);

        let actions = reconciler.reconcile().await.unwrap();
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], ReconcileAction::Linked { .. }));
        assert!(matches!(
            actions[1],
            ReconcileAction::Skipped { ref name, .. } if name == "docker"
        ));
    }

    #[tokio::test]
    async fn test_missing_group_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let group_file = dir.path().join("group");
        std::fs::write(&group_file, "users:x:100:\n").unwrap();

        let host = FakeHost::new().with_present("docker");
        let privileged = RecordingPrivileged::default();
        let reconciler = Reconciler::new(&host, &privileged, dir.path(), Some("alice".into()))
            .with_group_file(&group_file)
            .with_fixups(vec![Fixup::group("docker", "docker")]);

        assert!(reconciler.reconcile().await.unwrap().is_empty());
        assert!(privileged.actions().is_empty());
    }
}
