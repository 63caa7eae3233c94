//! Executable presence checks against the search path.

use std::ffi::OsString;
use std::path::PathBuf;

/// Answers whether a command is usable on this host.
///
/// Presence is purely "an executable with this name resolves on the search
/// path". Two packages shipping the same executable name look identical.
pub trait PresenceChecker: Send + Sync {
    /// Full path of the executable, if it resolves.
    fn locate(&self, name: &str) -> Option<PathBuf>;

    fn is_present(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

/// Resolves executables through `PATH` (or an explicit search path).
#[derive(Debug, Clone, Default)]
pub struct PathPresence {
    search_path: Option<OsString>,
}

impl PathPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `search_path` (colon separated) instead of the process `PATH`.
    #[cfg(test)]
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl PresenceChecker for PathPresence {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        match &self.search_path {
            None => which::which(name).ok(),
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(name, Some(paths), cwd).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_executable(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_present_executable_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let expected = write_executable(dir.path(), "mytool");

        let presence = PathPresence::with_search_path(dir.path());
        assert!(presence.is_present("mytool"));
        assert_eq!(presence.locate("mytool").unwrap(), expected);
    }

    #[test]
    fn test_missing_executable_is_absent_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let presence = PathPresence::with_search_path(dir.path());
        assert!(!presence.is_present("definitely-not-installed-xyz"));
        assert!(!presence.is_present(""));
    }

    #[test]
    fn test_non_executable_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "plain text").unwrap();

        let presence = PathPresence::with_search_path(dir.path());
        assert!(!presence.is_present("notes"));
    }

    #[test]
    fn test_searches_every_directory() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_executable(second.path(), "later");

        let joined = std::env::join_paths([first.path(), second.path()]).unwrap();
        let presence = PathPresence::with_search_path(joined);
        assert!(presence.is_present("later"));
    }
}
