//! Control signals delivered to the running daemon.
//!
//! | Signal                        | Action                       |
//! |-------------------------------|------------------------------|
//! | `SIGHUP`                      | reconfigure from disk        |
//! | `SIGUSR1`                     | log every provider's `show`  |
//! | `SIGTERM`, `SIGINT`, `SIGQUIT`| stop the transport loop      |
//!
//! Signals are received on a dedicated thread, never inside the serving loop.

use std::io;
use std::os::raw::c_int;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGUSR1};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::{info, warn};

use crate::server::Server;
use crate::transport::StopHandle;

const SIGNALS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::signals");
const HANDLED_SIGNALS: [c_int; 5] = [SIGHUP, SIGUSR1, SIGTERM, SIGINT, SIGQUIT];

/// Action requested by a control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Rebuild the registry from freshly loaded settings.
    Reconfigure,
    /// Log the description of every registered provider.
    DumpConfig,
    /// Stop serving and exit.
    Stop,
}

impl ControlSignal {
    /// Maps a raw signal number onto its action.
    #[must_use]
    pub const fn from_raw(signal: c_int) -> Option<Self> {
        match signal {
            SIGHUP => Some(Self::Reconfigure),
            SIGUSR1 => Some(Self::DumpConfig),
            SIGTERM | SIGINT | SIGQUIT => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Performs the action requested by `signal`.
pub fn apply_signal(signal: ControlSignal, server: &Server, stop: &StopHandle) {
    match signal {
        ControlSignal::Reconfigure => {
            // Failures are surfaced by the server's health reporter.
            if let Ok(parts) = server.reconfigure() {
                info!(target: SIGNALS_TARGET, parts, "reconfiguration applied");
            }
        }
        ControlSignal::DumpConfig => match server.show_config() {
            Ok(entries) => {
                for entry in entries {
                    info!(
                        target: SIGNALS_TARGET,
                        part = %entry.part,
                        description = %entry.description,
                        "registered provider"
                    );
                }
            }
            Err(error) => warn!(
                target: SIGNALS_TARGET,
                error = %error,
                "failed to dump provider registry"
            ),
        },
        ControlSignal::Stop => {
            info!(target: SIGNALS_TARGET, "stop requested");
            stop.stop();
        }
    }
}

/// Errors reported by the control-signal thread.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal thread could not be spawned.
    #[error("failed to spawn signal thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal thread panicked.
    #[error("signal thread panicked")]
    ThreadPanic,
}

/// Background thread applying control signals to a server.
pub struct SignalThread {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalThread {
    /// Installs the handlers and starts the thread.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] when the handlers cannot be installed or the
    /// thread cannot be spawned.
    pub fn spawn(server: Arc<Server>, stop: StopHandle) -> Result<Self, SignalError> {
        let mut signals =
            Signals::new(HANDLED_SIGNALS).map_err(|source| SignalError::Install { source })?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name(String::from("nodecfgd-signals"))
            .spawn(move || {
                for raw in signals.forever() {
                    let Some(signal) = ControlSignal::from_raw(raw) else {
                        continue;
                    };
                    info!(
                        target: SIGNALS_TARGET,
                        signal = raw,
                        action = ?signal,
                        "control signal received"
                    );
                    apply_signal(signal, &server, &stop);
                }
            })
            .map_err(|source| SignalError::Spawn { source })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Unregisters the handlers and waits for the thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::ThreadPanic`] if the thread panicked.
    pub fn close(mut self) -> Result<(), SignalError> {
        self.handle.close();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| SignalError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for SignalThread {
    fn drop(&mut self) {
        self.handle.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::tests::support::{TestServer, settings_from};

    #[rstest]
    #[case::hangup(SIGHUP, Some(ControlSignal::Reconfigure))]
    #[case::usr1(SIGUSR1, Some(ControlSignal::DumpConfig))]
    #[case::term(SIGTERM, Some(ControlSignal::Stop))]
    #[case::int(SIGINT, Some(ControlSignal::Stop))]
    #[case::quit(SIGQUIT, Some(ControlSignal::Stop))]
    #[case::other(signal_hook::consts::signal::SIGUSR2, None)]
    fn maps_raw_signals(#[case] raw: c_int, #[case] expected: Option<ControlSignal>) {
        assert_eq!(ControlSignal::from_raw(raw), expected);
    }

    #[fixture]
    fn server() -> TestServer {
        TestServer::with_settings("[signalling.nodes]\n\"1\" = \"sig-1\"\n")
    }

    #[rstest]
    fn stop_sets_the_flag(server: TestServer) {
        let stop = StopHandle::default();
        apply_signal(ControlSignal::Stop, &server.server, &stop);
        assert!(stop.is_stopped());
    }

    #[rstest]
    fn reconfigure_picks_up_new_settings(server: TestServer) {
        let stop = StopHandle::default();
        server.loader.replace_system(settings_from(
            "[signalling.nodes]\n\"1\" = \"sig-1\"\n[lnp]\ndefault = \"lnp\"\n",
        ));

        apply_signal(ControlSignal::Reconfigure, &server.server, &stop);

        let parts = server.parts();
        assert_eq!(parts, ["lnp", "signalling"]);
        assert!(!stop.is_stopped());
    }

    #[rstest]
    fn dump_leaves_the_registry_untouched(server: TestServer) {
        let stop = StopHandle::default();
        apply_signal(ControlSignal::DumpConfig, &server.server, &stop);
        assert_eq!(server.parts(), ["signalling"]);
    }

    #[test]
    fn signal_thread_closes_cleanly() {
        let server = TestServer::with_settings("[lnp]\ndefault = \"x\"\n");
        let thread = SignalThread::spawn(Arc::clone(&server.server), StopHandle::default())
            .expect("spawn signal thread");
        thread.close().expect("close signal thread");
    }
}
