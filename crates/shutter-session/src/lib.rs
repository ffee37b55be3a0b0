//! Session protocol engine for the remote imaging device.
//!
//! A [`Session`] owns one connected byte stream for its whole life and
//! drives the command/response exchanges that ride on it: the properties
//! query, burst image capture, and the 3A convergence loop. Exactly one
//! logical operation is in flight at a time: every operation borrows the
//! session mutably for its full duration, so overlap is rejected by the
//! compiler rather than by a runtime guard.
//!
//! The model is deliberately synchronous: each operation blocks the calling
//! thread until its terminal message arrives, the configured socket timeout
//! elapses, or the peer closes the stream. There is no cancellation beyond
//! dropping the session (which closes the socket) and no internal retry;
//! recovery is the caller's decision.

mod capture;
mod convergence;
mod errors;
mod session;
mod transport;

pub use capture::CaptureResult;
pub use convergence::{ConvergenceRequest, ConvergenceResult, Subsystem};
pub use errors::SessionError;
pub use session::Session;
