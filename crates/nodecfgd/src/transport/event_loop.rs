//! The single-threaded request/reply loop.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use nodecfg_config::SocketEndpoint;

use super::handler::serve_connection;
use super::listener::SocketListener;
use super::{MessageHandler, TRANSPORT_TARGET, TransportError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Cooperative stop flag shared with the transport loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the loop to return after its current iteration.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Bound endpoints served one request at a time.
#[derive(Debug)]
pub struct TransportLoop {
    listeners: Vec<SocketListener>,
    stop: StopHandle,
}

impl TransportLoop {
    /// Binds every endpoint in `endpoints`, skipping those that fail.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NoEndpoints`] for an empty list and
    /// [`TransportError::NothingBound`] when no endpoint could be bound.
    pub fn bind<S: AsRef<str>>(endpoints: &[S]) -> Result<Self, TransportError> {
        if endpoints.is_empty() {
            return Err(TransportError::NoEndpoints);
        }

        let mut listeners = Vec::with_capacity(endpoints.len());
        for raw in endpoints {
            let raw: &str = raw.as_ref();
            match SocketListener::bind_str(raw) {
                Ok(listener) => {
                    info!(
                        target: TRANSPORT_TARGET,
                        endpoint = %listener.endpoint(),
                        "listening"
                    );
                    listeners.push(listener);
                }
                Err(error) => warn!(
                    target: TRANSPORT_TARGET,
                    endpoint = raw,
                    error = %error,
                    "skipping endpoint that failed to bind"
                ),
            }
        }

        if listeners.is_empty() {
            return Err(TransportError::NothingBound {
                attempted: endpoints.len(),
            });
        }
        Ok(Self {
            listeners,
            stop: StopHandle::default(),
        })
    }

    /// Handle that stops [`TransportLoop::run`] from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests the loop to stop after its current iteration.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Endpoints that were bound successfully.
    pub fn endpoints(&self) -> impl Iterator<Item = &SocketEndpoint> {
        self.listeners.iter().map(SocketListener::endpoint)
    }

    /// Local addresses of the bound TCP endpoints.
    #[must_use]
    pub fn tcp_addrs(&self) -> Vec<SocketAddr> {
        self.listeners
            .iter()
            .filter_map(SocketListener::local_addr)
            .collect()
    }

    /// Serves requests until a stop is requested.
    ///
    /// Each iteration polls every listener once and fully serves any
    /// connection found before moving on. The stop flag is only checked
    /// between iterations, so an exchange in progress is never cut short.
    pub fn run(&self, handler: &dyn MessageHandler) {
        info!(
            target: TRANSPORT_TARGET,
            endpoints = self.listeners.len(),
            "transport loop running"
        );
        let mut last_errors: Vec<Option<io::ErrorKind>> = vec![None; self.listeners.len()];
        while !self.stop.is_stopped() {
            let outcome = poll_each(&self.listeners, &mut last_errors, |listener| {
                let accepted = listener.accept()?;
                Ok(accepted
                    .map(|mut stream| serve_connection(&mut stream, handler))
                    .is_some())
            });
            match outcome {
                PollOutcome::Served => {}
                PollOutcome::Idle => thread::sleep(ACCEPT_BACKOFF),
                PollOutcome::Failed => thread::sleep(ERROR_BACKOFF),
            }
        }
        info!(target: TRANSPORT_TARGET, "transport loop stopped");
    }
}

/// Result of polling every listener once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    /// At least one connection was served.
    Served,
    /// Nothing was pending.
    Idle,
    /// Nothing was served and at least one listener failed to accept.
    Failed,
}

/// Polls each listener in turn. A failing listener is logged once per error
/// kind and never prevents the remaining listeners from being polled.
fn poll_each<L, F>(
    listeners: &[L],
    last_errors: &mut [Option<io::ErrorKind>],
    mut accept_and_serve: F,
) -> PollOutcome
where
    L: fmt::Display,
    F: FnMut(&L) -> io::Result<bool>,
{
    let mut served = false;
    let mut failed = false;
    for (listener, last_error) in listeners.iter().zip(last_errors.iter_mut()) {
        match accept_and_serve(listener) {
            Ok(accepted) => {
                served |= accepted;
                *last_error = None;
            }
            Err(error) => {
                failed = true;
                let kind = error.kind();
                if *last_error != Some(kind) {
                    warn!(
                        target: TRANSPORT_TARGET,
                        endpoint = %listener,
                        error = %error,
                        "socket accept error"
                    );
                }
                *last_error = Some(kind);
            }
        }
    }
    match (served, failed) {
        (true, _) => PollOutcome::Served,
        (false, true) => PollOutcome::Failed,
        (false, false) => PollOutcome::Idle,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};

    use rstest::rstest;

    use super::*;

    struct UppercaseHandler;

    impl MessageHandler for UppercaseHandler {
        fn handle_message(&self, request: &[u8]) -> Vec<u8> {
            request.to_ascii_uppercase()
        }
    }

    #[test]
    fn empty_endpoint_list_is_rejected() {
        let endpoints: [&str; 0] = [];
        let error = TransportLoop::bind(&endpoints).expect_err("empty list");
        assert_eq!(error, TransportError::NoEndpoints);
    }

    #[rstest]
    #[case::unparseable(&["not an endpoint"])]
    #[case::mixed_failures(&["tcp://127.0.0.1", "bogus://x"])]
    fn all_failing_endpoints_are_fatal(#[case] endpoints: &[&str]) {
        let error = TransportLoop::bind(endpoints).expect_err("nothing should bind");
        assert_eq!(
            error,
            TransportError::NothingBound {
                attempted: endpoints.len()
            }
        );
    }

    #[test]
    fn failing_endpoints_are_skipped() {
        let occupied = TcpListener::bind("127.0.0.1:0").expect("reserve port");
        let taken = format!("tcp://{}", occupied.local_addr().expect("reserved addr"));

        let transport = TransportLoop::bind(&[taken.as_str(), "junk", "tcp://127.0.0.1:0"])
            .expect("one endpoint should bind");

        assert_eq!(transport.endpoints().count(), 1);
    }

    #[test]
    fn serves_until_stopped() {
        let transport = TransportLoop::bind(&["tcp://127.0.0.1:0"]).expect("bind");
        let addr = transport.tcp_addrs()[0];
        let stop = transport.stop_handle();

        thread::scope(|scope| {
            let server = scope.spawn(|| transport.run(&UppercaseHandler));

            for request in ["first\n", "second\n"] {
                let mut client = TcpStream::connect(addr).expect("connect");
                client.write_all(request.as_bytes()).expect("send request");
                let mut reply = String::new();
                BufReader::new(client)
                    .read_line(&mut reply)
                    .expect("read reply");
                assert_eq!(reply, request.to_ascii_uppercase());
            }

            stop.stop();
            server.join().expect("transport loop should exit");
        });
    }

    #[test]
    fn a_failing_listener_does_not_starve_the_others() {
        let listeners = ["broken", "healthy"];
        let mut last_errors = [None; 2];
        let mut polled = Vec::new();

        let outcome = poll_each(&listeners, &mut last_errors, |name| {
            polled.push(*name);
            if *name == "broken" {
                Err(io::Error::other("accept failed"))
            } else {
                Ok(true)
            }
        });

        assert_eq!(outcome, PollOutcome::Served);
        assert_eq!(polled, ["broken", "healthy"]);
        assert_eq!(last_errors, [Some(io::ErrorKind::Other), None]);
    }

    #[rstest]
    #[case::idle(Ok(false), PollOutcome::Idle)]
    #[case::failed(Err(io::ErrorKind::ConnectionAborted), PollOutcome::Failed)]
    fn outcome_without_served_connections(
        #[case] result: Result<bool, io::ErrorKind>,
        #[case] expected: PollOutcome,
    ) {
        let listeners = ["first", "second"];
        let mut last_errors = [None; 2];

        let outcome = poll_each(&listeners, &mut last_errors, |_| {
            result.map_err(io::Error::from)
        });

        assert_eq!(outcome, expected);
    }
}
