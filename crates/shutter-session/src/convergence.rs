//! 3A convergence orchestration.
//!
//! One trigger command starts the device's vendor 3A loop. Results arrive
//! as per-subsystem events in no fixed order, followed by an explicit
//! terminal signal. The orchestrator accumulates readings into slots and
//! validates, after the terminal signal, that every requested subsystem
//! actually reported: a device that says "done" while a requested slot is
//! empty failed to converge.

use std::io::Read;

use strum::Display;
use tracing::debug;

use shutter_protocol::{
    AeReading, AfReading, AwbReading, ConvergenceRegions, ConvergenceTriggers, DeviceMessage,
    FrameReader, HostCommand, NormalizedRect,
};

use crate::errors::SessionError;

const CONVERGENCE_TARGET: &str = "shutter::convergence";
const CONTEXT: &str = "3A convergence";

/// The three convergence subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Subsystem {
    /// Auto-exposure.
    #[strum(serialize = "AE")]
    Ae,
    /// Auto-white-balance.
    #[strum(serialize = "AWB")]
    Awb,
    /// Auto-focus.
    #[strum(serialize = "AF")]
    Af,
}

/// Parameters for one convergence run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceRequest {
    /// Auto-exposure metering region.
    pub ae_region: NormalizedRect,
    /// Auto-white-balance metering region.
    pub awb_region: NormalizedRect,
    /// Auto-focus metering region.
    pub af_region: NormalizedRect,
    /// Run auto-exposure.
    pub run_ae: bool,
    /// Run auto-white-balance.
    pub run_awb: bool,
    /// Run auto-focus.
    pub run_af: bool,
}

impl Default for ConvergenceRequest {
    /// Full-frame regions with all three subsystems requested.
    fn default() -> Self {
        Self {
            ae_region: NormalizedRect::FULL_FRAME,
            awb_region: NormalizedRect::FULL_FRAME,
            af_region: NormalizedRect::FULL_FRAME,
            run_ae: true,
            run_awb: true,
            run_af: true,
        }
    }
}

impl ConvergenceRequest {
    /// Builds the wire command for this run.
    #[must_use]
    pub fn to_command(&self) -> HostCommand {
        HostCommand::Converge {
            regions: ConvergenceRegions {
                ae: self.ae_region,
                awb: self.awb_region,
                af: self.af_region,
            },
            triggers: ConvergenceTriggers {
                ae: self.run_ae,
                af: self.run_af,
            },
        }
    }

    fn missing_from(&self, result: &ConvergenceResult) -> Vec<Subsystem> {
        let mut missing = Vec::new();
        if self.run_ae && result.ae.is_none() {
            missing.push(Subsystem::Ae);
        }
        if self.run_awb && result.awb.is_none() {
            missing.push(Subsystem::Awb);
        }
        if self.run_af && result.af.is_none() {
            missing.push(Subsystem::Af);
        }
        missing
    }
}

/// Aggregated outcome of one convergence run.
///
/// A slot is `None` when its subsystem was not requested; after a
/// successful run every requested slot is populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceResult {
    /// Auto-exposure reading, when requested.
    pub ae: Option<AeReading>,
    /// Auto-white-balance reading, when requested.
    pub awb: Option<AwbReading>,
    /// Auto-focus reading, when requested.
    pub af: Option<AfReading>,
}

/// Accumulates convergence events until the terminal signal.
pub(crate) fn collect<R>(
    reader: &mut FrameReader<R>,
    request: &ConvergenceRequest,
) -> Result<ConvergenceResult, SessionError>
where
    R: Read,
{
    let mut result = ConvergenceResult::default();
    loop {
        let message = reader
            .read_message()
            .map_err(|error| SessionError::from_wire(error, CONTEXT))?;
        match message {
            DeviceMessage::AeResult(reading) => {
                record(&mut result.ae, reading, Subsystem::Ae, request.run_ae);
            }
            DeviceMessage::AwbResult(reading) => {
                record(&mut result.awb, reading, Subsystem::Awb, request.run_awb);
            }
            DeviceMessage::AfResult(reading) => {
                record(&mut result.af, reading, Subsystem::Af, request.run_af);
            }
            DeviceMessage::ConvergenceDone => break,
            other => {
                return Err(SessionError::UnexpectedMessage {
                    tag: other.tag(),
                    context: CONTEXT,
                });
            }
        }
    }

    let missing = request.missing_from(&result);
    if missing.is_empty() {
        Ok(result)
    } else {
        Err(SessionError::Convergence { missing })
    }
}

fn record<T: std::fmt::Debug>(
    slot: &mut Option<T>,
    reading: T,
    subsystem: Subsystem,
    requested: bool,
) {
    if requested {
        debug!(
            target: CONVERGENCE_TARGET,
            %subsystem,
            ?reading,
            "convergence event recorded"
        );
        *slot = Some(reading);
    } else {
        // Unrequested subsystems stay unset even when the device reports them.
        debug!(
            target: CONVERGENCE_TARGET,
            %subsystem,
            "discarding event for unrequested subsystem"
        );
    }
}
