//! Burst capture orchestration.
//!
//! One capture command yields N image frames and N metadata records whose
//! arrival order is unspecified: the device emits each as soon as it is
//! ready, and images and metadata interleave freely. The orchestrator
//! collects both populations, then reassembles per-shot results.

use std::io::Read;

use serde_json::Value;
use tracing::debug;

use shutter_protocol::{DeviceMessage, FrameReader, ImageFormat};

use crate::errors::SessionError;

const CAPTURE_TARGET: &str = "shutter::capture";
const CONTEXT: &str = "burst capture";

/// One assembled shot from a burst. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    /// Raw image bytes in the surface format.
    pub data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Surface format of the image bytes.
    pub format: ImageFormat,
    /// Opaque capture result metadata, handed to the caller uninterpreted.
    pub metadata: Value,
}

/// Collects a burst of `count` shots off the transport.
///
/// Pairing is positional: the i-th image frame to arrive is matched with
/// the i-th metadata record to arrive. The wire protocol carries no
/// correlation id, so ordering is an assumption the remote peer is expected
/// to uphold; a future protocol revision should tag responses explicitly.
/// Width and height are taken from the most recent metadata record; the
/// protocol assumes one uniform surface per burst.
pub(crate) fn collect_burst<R>(
    reader: &mut FrameReader<R>,
    count: usize,
) -> Result<Vec<CaptureResult>, SessionError>
where
    R: Read,
{
    let mut images: Vec<(ImageFormat, Vec<u8>)> = Vec::with_capacity(count);
    let mut records: Vec<Value> = Vec::with_capacity(count);
    let mut dimensions: Option<(u32, u32)> = None;

    while images.len() < count || records.len() < count {
        let message = reader
            .read_message()
            .map_err(|error| SessionError::from_wire(error, CONTEXT))?;
        match message {
            DeviceMessage::Image { format, data } if images.len() < count => {
                debug!(
                    target: CAPTURE_TARGET,
                    %format,
                    bytes = data.len(),
                    collected = images.len() + 1,
                    expected = count,
                    "image frame collected"
                );
                images.push((format, data));
            }
            DeviceMessage::CaptureMetadata {
                width,
                height,
                metadata,
            } if records.len() < count => {
                debug!(
                    target: CAPTURE_TARGET,
                    width,
                    height,
                    collected = records.len() + 1,
                    expected = count,
                    "capture metadata collected"
                );
                dimensions = Some((width, height));
                records.push(metadata);
            }
            other => {
                return Err(SessionError::UnexpectedMessage {
                    tag: other.tag(),
                    context: CONTEXT,
                });
            }
        }
    }

    let (width, height) =
        dimensions.ok_or_else(|| SessionError::internal("burst finished without metadata"))?;
    let results = images
        .into_iter()
        .zip(records)
        .map(|((format, data), metadata)| CaptureResult {
            data,
            width,
            height,
            format,
            metadata,
        })
        .collect();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;

    fn frame(header: &str) -> Vec<u8> {
        format!("{header}\n").into_bytes()
    }

    fn image_frame(tag: &str, payload: &[u8]) -> Vec<u8> {
        let mut bytes = frame(&format!(
            r#"{{"tag":"{tag}","bufValueSize":{}}}"#,
            payload.len()
        ));
        bytes.extend_from_slice(payload);
        bytes
    }

    fn metadata_frame(width: u32, height: u32, sensitivity: u32) -> Vec<u8> {
        frame(&format!(
            r#"{{"tag":"captureResults","objValue":{{"width":{width},"height":{height},"captureResult":{{"android.sensor.sensitivity":{sensitivity}}}}}}}"#,
        ))
    }

    fn collect(bytes: Vec<u8>, count: usize) -> Result<Vec<CaptureResult>, SessionError> {
        let mut reader = FrameReader::new(Cursor::new(bytes));
        collect_burst(&mut reader, count)
    }

    #[test]
    fn reassembles_interleaved_arrivals_positionally() {
        let mut bytes = Vec::new();
        bytes.extend(metadata_frame(640, 480, 100));
        bytes.extend(image_frame("yuvImage", b"first"));
        bytes.extend(image_frame("jpegImage", b"second"));
        bytes.extend(metadata_frame(640, 480, 200));

        let results = collect(bytes, 2).expect("burst should assemble");
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.format, ImageFormat::Yuv);
        assert_eq!(first.data, b"first");
        assert_eq!(first.metadata, json!({"android.sensor.sensitivity": 100}));

        let second = &results[1];
        assert_eq!(second.format, ImageFormat::Jpeg);
        assert_eq!(second.data, b"second");
        assert_eq!(second.metadata, json!({"android.sensor.sensitivity": 200}));
    }

    #[test]
    fn all_results_share_the_most_recent_dimensions() {
        let mut bytes = Vec::new();
        bytes.extend(metadata_frame(640, 480, 100));
        bytes.extend(image_frame("yuvImage", b"a"));
        bytes.extend(image_frame("yuvImage", b"b"));
        bytes.extend(metadata_frame(1280, 720, 100));

        let results = collect(bytes, 2).expect("burst should assemble");
        for result in &results {
            assert_eq!((result.width, result.height), (1280, 720));
        }
    }

    #[test]
    fn single_shot_burst_yields_one_result() {
        let mut bytes = Vec::new();
        bytes.extend(image_frame("jpegImage", &[0xff, 0xd8]));
        bytes.extend(metadata_frame(320, 240, 50));

        let results = collect(bytes, 1).expect("burst should assemble");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].data, vec![0xff, 0xd8]);
        assert_eq!(results[0].format, ImageFormat::Jpeg);
    }

    #[test]
    fn foreign_tag_mid_burst_is_fatal() {
        let mut bytes = Vec::new();
        bytes.extend(image_frame("yuvImage", b"a"));
        bytes.extend(frame(r#"{"tag":"3aDone"}"#));

        let error = collect(bytes, 1).expect_err("foreign tag must fail the burst");
        assert!(matches!(
            error,
            SessionError::UnexpectedMessage {
                tag: "3aDone",
                context: "burst capture",
            }
        ));
    }

    #[test]
    fn surplus_image_is_fatal() {
        let mut bytes = Vec::new();
        bytes.extend(image_frame("yuvImage", b"a"));
        bytes.extend(image_frame("yuvImage", b"b"));

        let error = collect(bytes, 1).expect_err("second image must fail a one-shot burst");
        assert!(matches!(
            error,
            SessionError::UnexpectedMessage { tag: "yuvImage", .. }
        ));
    }

    #[test]
    fn stream_close_mid_burst_surfaces_as_closed() {
        let mut bytes = Vec::new();
        bytes.extend(image_frame("yuvImage", b"a"));
        // Metadata never arrives; the cursor simply ends.

        let error = collect(bytes, 1).expect_err("truncated burst must fail");
        assert!(matches!(error, SessionError::Closed));
    }
}
