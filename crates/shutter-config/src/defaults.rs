use std::time::Duration;

use crate::socket::SocketEndpoint;

/// Default host for the forwarded control socket.
pub const DEFAULT_TCP_HOST: &str = "127.0.0.1";

/// Default TCP port; the device-side service listens on 6000 and the
/// forwarding agent mirrors it locally under the same number.
pub const DEFAULT_TCP_PORT: u16 = 6000;

/// Default timeout on each individual socket operation, in seconds.
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 10;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Computes the default endpoint for the device control socket.
#[must_use]
pub fn default_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
}

/// Default per-operation socket timeout.
#[must_use]
pub fn default_io_timeout() -> Duration {
    Duration::from_secs(DEFAULT_IO_TIMEOUT_SECS)
}
