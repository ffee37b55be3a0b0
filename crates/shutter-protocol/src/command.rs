//! Outbound command modelling.
//!
//! Commands are JSON objects discriminated by `cmdName`, written to the
//! transport as a single line. The device accepts exactly three commands:
//! a properties query, a burst capture, and a 3A convergence trigger.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::ImageFormat;

/// Camera parameter key for a manual exposure time in nanoseconds.
pub const PARAM_EXPOSURE_TIME: &str = "android.sensor.exposureTime";

/// Camera parameter key for a manual sensitivity (ISO) value.
pub const PARAM_SENSITIVITY: &str = "android.sensor.sensitivity";

/// Commands sent from the host to the device.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "cmdName")]
pub enum HostCommand {
    /// Queries the static camera properties object.
    #[serde(rename = "getCameraProperties")]
    GetCameraProperties,

    /// Triggers 3A convergence over the given regions.
    #[serde(rename = "do3A")]
    Converge {
        regions: ConvergenceRegions,
        triggers: ConvergenceTriggers,
    },

    /// Requests a burst of captures, one per request object.
    #[serde(rename = "doCapture")]
    Capture {
        #[serde(rename = "captureRequests")]
        capture_requests: Vec<CaptureRequest>,
        #[serde(rename = "outputSurface", skip_serializing_if = "Option::is_none")]
        output_surface: Option<OutputSurface>,
    },
}

impl HostCommand {
    /// Writes the command as a JSONL line and flushes the writer.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when serialisation or the socket
    /// write fails.
    pub fn write_jsonl<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        serde_json::to_writer(&mut *writer, self).map_err(io::Error::from)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Normalised region rectangle, `[x, y, w, h]` with each value in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedRect([f64; 4]);

impl NormalizedRect {
    /// The full frame, `[0, 0, 1, 1]`.
    pub const FULL_FRAME: Self = Self([0.0, 0.0, 1.0, 1.0]);

    /// Builds a rectangle from origin and extent.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self([x, y, w, h])
    }

    /// Returns the rectangle as its wire representation.
    #[must_use]
    pub const fn as_array(&self) -> [f64; 4] {
        self.0
    }
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::FULL_FRAME
    }
}

/// Per-subsystem metering regions for a convergence command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConvergenceRegions {
    /// Auto-exposure metering region.
    pub ae: NormalizedRect,
    /// Auto-white-balance metering region.
    pub awb: NormalizedRect,
    /// Auto-focus metering region.
    pub af: NormalizedRect,
}

/// Trigger flags for a convergence command.
///
/// The device only exposes explicit triggers for AE and AF; AWB converges
/// whenever the loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceTriggers {
    /// Fire the auto-exposure precapture trigger.
    pub ae: bool,
    /// Fire the auto-focus trigger.
    pub af: bool,
}

/// A single capture request: an opaque bag of camera parameter key/value
/// pairs, forwarded verbatim to the device. No semantic validation happens
/// on the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureRequest(Map<String, Value>);

impl CaptureRequest {
    /// Creates an empty request; the device fills in its own defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary camera parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`CaptureRequest::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a manual exposure time in nanoseconds.
    #[must_use]
    pub fn with_exposure_ns(self, exposure_ns: i64) -> Self {
        self.with(PARAM_EXPOSURE_TIME, exposure_ns)
    }

    /// Sets a manual sensitivity (ISO) value.
    #[must_use]
    pub fn with_sensitivity(self, sensitivity: i32) -> Self {
        self.with(PARAM_SENSITIVITY, sensitivity)
    }

    /// Number of parameters carried by the request.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the request carries no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output surface specification for a capture command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSurface {
    /// Requested image width in pixels.
    pub width: u32,
    /// Requested image height in pixels.
    pub height: u32,
    /// Requested surface format.
    pub format: ImageFormat,
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn to_value(command: &HostCommand) -> Value {
        serde_json::to_value(command).expect("command should serialise")
    }

    #[test]
    fn properties_query_is_name_only() {
        let value = to_value(&HostCommand::GetCameraProperties);
        assert_eq!(value, json!({"cmdName": "getCameraProperties"}));
    }

    #[test]
    fn converge_carries_regions_and_triggers() {
        let command = HostCommand::Converge {
            regions: ConvergenceRegions {
                ae: NormalizedRect::new(0.0, 0.0, 1.0, 1.0),
                awb: NormalizedRect::new(0.25, 0.25, 0.5, 0.5),
                af: NormalizedRect::FULL_FRAME,
            },
            triggers: ConvergenceTriggers { ae: true, af: false },
        };
        let value = to_value(&command);
        assert_eq!(
            value,
            json!({
                "cmdName": "do3A",
                "regions": {
                    "ae": [0.0, 0.0, 1.0, 1.0],
                    "awb": [0.25, 0.25, 0.5, 0.5],
                    "af": [0.0, 0.0, 1.0, 1.0],
                },
                "triggers": {"ae": true, "af": false},
            })
        );
    }

    #[test]
    fn capture_always_sends_request_array() {
        let request = CaptureRequest::new()
            .with_exposure_ns(100_000_000)
            .with_sensitivity(100);
        let command = HostCommand::Capture {
            capture_requests: vec![request],
            output_surface: None,
        };
        let value = to_value(&command);
        assert_eq!(
            value,
            json!({
                "cmdName": "doCapture",
                "captureRequests": [{
                    "android.sensor.exposureTime": 100_000_000,
                    "android.sensor.sensitivity": 100,
                }],
            })
        );
    }

    #[test]
    fn capture_includes_surface_when_present() {
        let command = HostCommand::Capture {
            capture_requests: vec![CaptureRequest::new()],
            output_surface: Some(OutputSurface {
                width: 640,
                height: 480,
                format: ImageFormat::Yuv,
            }),
        };
        let value = to_value(&command);
        assert_eq!(
            value,
            json!({
                "cmdName": "doCapture",
                "captureRequests": [{}],
                "outputSurface": {"width": 640, "height": 480, "format": "yuv"},
            })
        );
    }

    #[test]
    fn write_jsonl_terminates_with_single_newline() {
        let mut buffer = Vec::new();
        HostCommand::GetCameraProperties
            .write_jsonl(&mut buffer)
            .expect("write should succeed");
        assert!(buffer.ends_with(b"\n"));
        assert_eq!(buffer.iter().filter(|byte| **byte == b'\n').count(), 1);
    }
}
