//! Test suites for the node configuration daemon.

mod dispatch_behaviour;
pub(crate) mod support;
