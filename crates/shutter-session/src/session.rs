//! The session shell: transport ownership and the public operation set.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use shutter_config::{Config, SocketEndpoint};
use shutter_protocol::{CaptureRequest, DeviceMessage, FrameReader, HostCommand, OutputSurface};

use crate::capture::{self, CaptureResult};
use crate::convergence::{self, ConvergenceRequest, ConvergenceResult};
use crate::errors::SessionError;
use crate::transport::{self, Connection};

const SESSION_TARGET: &str = "shutter::session";

/// Control session with the remote imaging device.
///
/// Owns the transport exclusively for its whole life: it is opened once at
/// construction and closed when the session is dropped, on every exit path.
/// All operations take `&mut self`, so at most one logical operation is in
/// flight on the socket at any time.
pub struct Session {
    connection: Connection,
}

impl Session {
    /// Connects to the device control socket.
    ///
    /// The endpoint must already be reachable; launching the device-side
    /// service and setting up port forwarding are the caller's concern. The
    /// returned session is ready to accept its first command. `io_timeout`
    /// bounds every individual read and write for the session's lifetime.
    ///
    /// # Errors
    ///
    /// Returns a transport-establishment error when the address does not
    /// resolve, the connection is refused, or timeouts cannot be installed.
    pub fn connect(endpoint: &SocketEndpoint, io_timeout: Duration) -> Result<Self, SessionError> {
        let connection = transport::connect(endpoint, io_timeout)?;
        info!(
            target: SESSION_TARGET,
            endpoint = %endpoint,
            timeout = ?io_timeout,
            "device session established"
        );
        Ok(Self { connection })
    }

    /// Connects using a resolved [`Config`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Session::connect`].
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        Self::connect(&config.endpoint, config.io_timeout)
    }

    /// Queries the device's static camera properties object.
    ///
    /// # Errors
    ///
    /// Fails with a protocol error when the reply carries any tag other
    /// than `cameraProperties`.
    pub fn camera_properties(&mut self) -> Result<Value, SessionError> {
        const CONTEXT: &str = "properties query";
        self.send(&HostCommand::GetCameraProperties)?;
        let message = self.read_one(CONTEXT)?;
        match message {
            DeviceMessage::CameraProperties { properties } => Ok(properties),
            other => Err(SessionError::UnexpectedMessage {
                tag: other.tag(),
                context: CONTEXT,
            }),
        }
    }

    /// Captures a single shot.
    ///
    /// Equivalent to a one-element burst; the wire traffic is identical.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Session::capture_burst`].
    pub fn capture_one(
        &mut self,
        request: &CaptureRequest,
        surface: Option<&OutputSurface>,
    ) -> Result<CaptureResult, SessionError> {
        let mut results = self.capture_burst(std::slice::from_ref(request), surface)?;
        results
            .pop()
            .ok_or_else(|| SessionError::internal("one-shot burst returned no result"))
    }

    /// Captures a burst of shots, one per request, in request order.
    ///
    /// The device may deliver image frames and metadata records in any
    /// interleaving; this call blocks until all of them have arrived and
    /// returns the reassembled per-shot results. All-or-nothing: any fault
    /// discards the partial burst.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyBurst`] when `requests` is empty (nothing is
    /// sent), plus the transport and protocol failure modes.
    pub fn capture_burst(
        &mut self,
        requests: &[CaptureRequest],
        surface: Option<&OutputSurface>,
    ) -> Result<Vec<CaptureResult>, SessionError> {
        if requests.is_empty() {
            return Err(SessionError::EmptyBurst);
        }
        debug!(
            target: SESSION_TARGET,
            shots = requests.len(),
            "starting burst capture"
        );
        let command = HostCommand::Capture {
            capture_requests: requests.to_vec(),
            output_surface: surface.copied(),
        };
        self.send(&command)?;
        let mut reader = FrameReader::new(&mut self.connection);
        capture::collect_burst(&mut reader, requests.len())
    }

    /// Runs the device's vendor 3A loop and waits for convergence.
    ///
    /// Blocks until the device signals completion. A device that never
    /// signals surfaces as [`SessionError::Timeout`];
    /// [`SessionError::Convergence`] is reserved for a completion signal
    /// that left a requested subsystem unreported.
    ///
    /// # Errors
    ///
    /// Transport, protocol, and convergence failure modes as above.
    pub fn run_auto_convergence(
        &mut self,
        request: &ConvergenceRequest,
    ) -> Result<ConvergenceResult, SessionError> {
        debug!(
            target: SESSION_TARGET,
            ae = request.run_ae,
            awb = request.run_awb,
            af = request.run_af,
            "starting 3A convergence"
        );
        self.send(&request.to_command())?;
        let mut reader = FrameReader::new(&mut self.connection);
        convergence::collect(&mut reader, request)
    }

    fn send(&mut self, command: &HostCommand) -> Result<(), SessionError> {
        command
            .write_jsonl(&mut self.connection)
            .map_err(SessionError::SendCommand)
    }

    fn read_one(&mut self, context: &'static str) -> Result<DeviceMessage, SessionError> {
        let mut reader = FrameReader::new(&mut self.connection);
        reader
            .read_message()
            .map_err(|error| SessionError::from_wire(error, context))
    }
}
