mod catalog;
mod cli;
mod config;
mod engine;
mod error;
mod package;
mod presence;
mod privilege;
mod reconcile;
mod release;
mod shell_profile;
#[cfg(test)]
mod testing;

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::Cli;
use config::AppConfig;
use error::Result;

const LOG_FILE: &str = "devstrap.log";

/// Console output plus the append-only run log in `log_dir`.
///
/// The console stays quiet unless `--verbose`; the file always records the
/// run at `RUST_LOG` (default `devstrap=info`). The returned guard flushes the
/// file writer and must live until exit.
fn init_logging(log_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let console_filter = if verbose { "devstrap=debug" } else { "devstrap=warn" };
    let console = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(console_filter));

    let appender = std::fs::create_dir_all(log_dir).ok().and_then(|_| {
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE)
            .build(log_dir)
            .ok()
    });

    let Some(appender) = appender else {
        tracing_subscriber::registry().with(console).init();
        tracing::warn!("Could not open run log in {}", log_dir.display());
        return None;
    };

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "devstrap=info".into()),
        );

    tracing_subscriber::registry().with(console).with(file).init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate()?;

    let _guard = init_logging(&config.log_dir(), cli.verbose);
    tracing::info!(
        "devstrap {} started: {}",
        env!("CARGO_PKG_VERSION"),
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let result = cli.execute(&config).await;
    if let Err(ref e) = result {
        tracing::error!("devstrap failed: {}", e);
    }
    result
}
