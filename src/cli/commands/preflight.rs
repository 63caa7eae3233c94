//! Pre-flight checks before touching the host
//!
//! Both checks fail fast, before any prompt or mutation.

use crate::error::{BootstrapError, Result};
use crate::package::PackageManager;
use crate::privilege::is_root;

/// Refuse to run as root. Privileged steps go through sudo one at a time,
/// and files placed in the user's home must stay owned by the user.
pub fn ensure_not_root() -> Result<()> {
    check_not_root(is_root())
}

fn check_not_root(root: bool) -> Result<()> {
    if root {
        return Err(BootstrapError::RunningAsRoot);
    }
    Ok(())
}

/// Refuse to continue when the package manager is not installed.
pub fn ensure_package_manager(manager: &dyn PackageManager) -> Result<()> {
    if !manager.is_available() {
        return Err(BootstrapError::EnvironmentUnsupported(format!(
            "{} was not found; only Debian-family systems are supported",
            manager.name()
        )));
    }
    tracing::debug!("Package manager {} available", manager.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    #[test]
    fn test_root_is_refused() {
        assert!(matches!(
            check_not_root(true),
            Err(BootstrapError::RunningAsRoot)
        ));
        assert!(check_not_root(false).is_ok());
    }

    #[test]
    fn test_available_manager_passes() {
        assert!(ensure_package_manager(&FakeHost::new()).is_ok());
    }

    #[test]
    fn test_missing_manager_is_refused() {
        let host = FakeHost::new().without_package_manager();
        let err = ensure_package_manager(&host).unwrap_err();
        assert!(matches!(err, BootstrapError::EnvironmentUnsupported(ref m) if m.contains("fake")));
        assert_eq!(host.refresh_count(), 0);
    }
}
