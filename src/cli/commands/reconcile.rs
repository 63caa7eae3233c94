use console::style;

use super::display::{print_header, print_reconcile_actions};
use crate::config::AppConfig;
use crate::error::Result;
use crate::presence::PresenceChecker;
use crate::privilege::{current_user, SudoPrivileged};
use crate::reconcile::{ReconcileAction, Reconciler};

/// Run the reconciler against the real host.
pub async fn apply(config: &AppConfig, presence: &dyn PresenceChecker) -> Result<Vec<ReconcileAction>> {
    let privileged = SudoPrivileged::new();
    let user = match current_user() {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!("{}; skipping group fixes", e);
            None
        }
    };

    Reconciler::new(presence, &privileged, config.bin_dir(), user)
        .reconcile()
        .await
}

pub async fn execute(config: &AppConfig) -> Result<()> {
    super::preflight::ensure_not_root()?;

    print_header("Reconcile");

    let presence = crate::presence::PathPresence::new();
    let actions = apply(config, &presence).await?;

    if actions.is_empty() {
        println!("  {}", style("Nothing to fix.").dim());
        println!();
    } else {
        print_reconcile_actions(&actions);
    }

    Ok(())
}
