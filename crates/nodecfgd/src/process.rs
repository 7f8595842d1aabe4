//! Foreground process entry: bootstrap, serve, shut down.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use nodecfg_config::LaunchArgs;

use crate::bootstrap::{BootstrapError, FileConfigLoader, bootstrap_with};
use crate::health::StructuredHealthReporter;
use crate::providers::BuiltinProviderFactory;
use crate::signals::{SignalError, SignalThread};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors surfaced while launching or running the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The daemon could not be bootstrapped.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Control signals could not be set up or torn down.
    #[error(transparent)]
    Signals(#[from] SignalError),
}

/// Runs the daemon until a stop signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] for any fatal startup failure.
pub fn run_daemon(args: &LaunchArgs) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(
        Arc::new(FileConfigLoader::from_args(args)),
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(BuiltinProviderFactory),
    )?;
    let signals = SignalThread::spawn(daemon.server(), daemon.stop_handle())?;

    daemon.run();

    signals.close()?;
    info!(target: PROCESS_TARGET, "daemon stopped");
    Ok(())
}
