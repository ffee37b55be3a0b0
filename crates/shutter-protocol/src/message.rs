//! Inbound message modelling.
//!
//! The device discriminates messages with a string `tag`. Rather than
//! probing a decoded dictionary for keys, the tag set is closed over a
//! single enum: every consumer matches exhaustively and an unknown tag is
//! rejected once, at decode time. Whitespace-delimited numeric payloads
//! (`strValue`) are parsed into typed readings here so the orchestrators
//! downstream only ever see well-formed values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::errors::WireError;

/// Surface formats the device can return.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageFormat {
    /// Full-frame YUV420.
    Yuv,
    /// JPEG-compressed frame.
    #[serde(alias = "jpg")]
    #[strum(to_string = "jpeg", serialize = "jpg")]
    Jpeg,
}

impl ImageFormat {
    /// Conventional file extension for buffers of this format.
    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::Yuv => "yuv",
            Self::Jpeg => "jpg",
        }
    }
}

/// Auto-exposure convergence reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AeReading {
    /// Converged sensitivity (ISO).
    pub sensitivity: i32,
    /// Converged exposure time in nanoseconds.
    pub exposure_ns: i64,
}

/// Auto-white-balance convergence reading.
#[derive(Debug, Clone, PartialEq)]
pub struct AwbReading {
    /// Per-channel colour gains.
    pub gains: [f64; 4],
    /// Colour transform matrix, row-major (normally nine values).
    pub transform: Vec<f64>,
}

/// Auto-focus convergence reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfReading {
    /// Converged focus distance in dioptres.
    pub focus_distance: f64,
}

/// A fully decoded message from the device, binary trailer included.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    /// Response to a properties query; the nested properties object.
    CameraProperties { properties: Value },
    /// One captured image buffer.
    Image { format: ImageFormat, data: Vec<u8> },
    /// Capture metadata for one shot, plus the burst's surface dimensions.
    CaptureMetadata {
        width: u32,
        height: u32,
        metadata: Value,
    },
    /// Auto-exposure converged.
    AeResult(AeReading),
    /// Auto-white-balance converged.
    AwbResult(AwbReading),
    /// Auto-focus converged.
    AfResult(AfReading),
    /// Terminal signal for the convergence loop.
    ConvergenceDone,
}

/// Classification of a message for dispatch decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Reply to a one-shot query.
    QueryResponse,
    /// Image-bearing frame inside a burst.
    ImageFrame,
    /// Metadata record inside a burst.
    CaptureMetadata,
    /// Auto-exposure convergence event.
    AeEvent,
    /// Auto-white-balance convergence event.
    AwbEvent,
    /// Auto-focus convergence event.
    AfEvent,
    /// Convergence loop terminator.
    ConvergenceDone,
}

impl DeviceMessage {
    /// Classifies the message for the active orchestrator.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::CameraProperties { .. } => MessageKind::QueryResponse,
            Self::Image { .. } => MessageKind::ImageFrame,
            Self::CaptureMetadata { .. } => MessageKind::CaptureMetadata,
            Self::AeResult(_) => MessageKind::AeEvent,
            Self::AwbResult(_) => MessageKind::AwbEvent,
            Self::AfResult(_) => MessageKind::AfEvent,
            Self::ConvergenceDone => MessageKind::ConvergenceDone,
        }
    }

    /// Returns the wire tag the message arrived under.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::CameraProperties { .. } => "cameraProperties",
            Self::Image {
                format: ImageFormat::Jpeg,
                ..
            } => "jpegImage",
            Self::Image {
                format: ImageFormat::Yuv,
                ..
            } => "yuvImage",
            Self::CaptureMetadata { .. } => "captureResults",
            Self::AeResult(_) => "aeResult",
            Self::AwbResult(_) => "awbResult",
            Self::AfResult(_) => "afResult",
            Self::ConvergenceDone => "3aDone",
        }
    }
}

/// Header decoded from one JSON line, before any trailer has been read.
#[derive(Debug)]
pub(crate) enum HeaderEvent {
    /// The header was the whole message.
    Message(DeviceMessage),
    /// The header declared a binary trailer of exactly `len` bytes.
    Image { format: ImageFormat, len: usize },
}

const KNOWN_TAGS: &[&str] = &[
    "cameraProperties",
    "jpegImage",
    "yuvImage",
    "captureResults",
    "aeResult",
    "afResult",
    "awbResult",
    "3aDone",
];

/// Wire representation of a message header.
#[derive(Debug, Deserialize)]
#[serde(tag = "tag")]
enum RawHeader {
    #[serde(rename = "cameraProperties")]
    CameraProperties {
        #[serde(rename = "objValue")]
        obj_value: PropertiesEnvelope,
    },
    #[serde(rename = "jpegImage")]
    JpegImage {
        #[serde(rename = "bufValueSize")]
        buf_value_size: usize,
    },
    #[serde(rename = "yuvImage")]
    YuvImage {
        #[serde(rename = "bufValueSize")]
        buf_value_size: usize,
    },
    #[serde(rename = "captureResults")]
    CaptureResults {
        #[serde(rename = "objValue")]
        obj_value: CaptureEnvelope,
    },
    #[serde(rename = "aeResult")]
    AeResult {
        #[serde(rename = "strValue")]
        str_value: String,
    },
    #[serde(rename = "afResult")]
    AfResult {
        #[serde(rename = "strValue")]
        str_value: String,
    },
    #[serde(rename = "awbResult")]
    AwbResult {
        #[serde(rename = "strValue")]
        str_value: String,
    },
    #[serde(rename = "3aDone")]
    ConvergenceDone,
}

#[derive(Debug, Deserialize)]
struct PropertiesEnvelope {
    #[serde(rename = "cameraProperties")]
    camera_properties: Value,
}

#[derive(Debug, Deserialize)]
struct CaptureEnvelope {
    width: u32,
    height: u32,
    #[serde(rename = "captureResult")]
    capture_result: Value,
}

/// Decodes one newline-terminated header line.
pub(crate) fn decode_header(line: &[u8]) -> Result<HeaderEvent, WireError> {
    let value: Value =
        serde_json::from_slice(line).map_err(WireError::from_json_error)?;
    let tag = value
        .get("tag")
        .and_then(Value::as_str)
        .ok_or_else(|| WireError::malformed_header("header is missing a string 'tag' field"))?;
    if !KNOWN_TAGS.contains(&tag) {
        return Err(WireError::UnrecognisedTag {
            tag: tag.to_owned(),
        });
    }

    let header: RawHeader =
        serde_json::from_value(value).map_err(WireError::from_json_error)?;
    let event = match header {
        RawHeader::CameraProperties { obj_value } => {
            HeaderEvent::Message(DeviceMessage::CameraProperties {
                properties: obj_value.camera_properties,
            })
        }
        RawHeader::JpegImage { buf_value_size } => HeaderEvent::Image {
            format: ImageFormat::Jpeg,
            len: buf_value_size,
        },
        RawHeader::YuvImage { buf_value_size } => HeaderEvent::Image {
            format: ImageFormat::Yuv,
            len: buf_value_size,
        },
        RawHeader::CaptureResults { obj_value } => {
            HeaderEvent::Message(DeviceMessage::CaptureMetadata {
                width: obj_value.width,
                height: obj_value.height,
                metadata: obj_value.capture_result,
            })
        }
        RawHeader::AeResult { str_value } => {
            HeaderEvent::Message(DeviceMessage::AeResult(parse_ae(&str_value)?))
        }
        RawHeader::AfResult { str_value } => {
            HeaderEvent::Message(DeviceMessage::AfResult(parse_af(&str_value)?))
        }
        RawHeader::AwbResult { str_value } => {
            HeaderEvent::Message(DeviceMessage::AwbResult(parse_awb(&str_value)?))
        }
        RawHeader::ConvergenceDone => HeaderEvent::Message(DeviceMessage::ConvergenceDone),
    };
    Ok(event)
}

fn parse_ae(payload: &str) -> Result<AeReading, WireError> {
    let mut tokens = payload.split_whitespace();
    let sensitivity = parse_token("aeResult", tokens.next(), "sensitivity")?;
    let exposure_ns = parse_token("aeResult", tokens.next(), "exposure time")?;
    if tokens.next().is_some() {
        return Err(WireError::malformed_value(
            "aeResult",
            format!("expected exactly two values, got '{payload}'"),
        ));
    }
    Ok(AeReading {
        sensitivity,
        exposure_ns,
    })
}

fn parse_af(payload: &str) -> Result<AfReading, WireError> {
    let focus_distance = parse_token("afResult", payload.split_whitespace().next(), "focus distance")?;
    Ok(AfReading { focus_distance })
}

fn parse_awb(payload: &str) -> Result<AwbReading, WireError> {
    let mut values = payload
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|error| {
                WireError::malformed_value("awbResult", format!("invalid float '{token}': {error}"))
            })
        })
        .collect::<Result<Vec<f64>, WireError>>()?;
    if values.len() < 4 {
        return Err(WireError::malformed_value(
            "awbResult",
            format!("expected at least four gains, got {}", values.len()),
        ));
    }
    // First four floats are the channel gains, the remainder the transform.
    let transform = values.split_off(4);
    let mut gains = [0.0; 4];
    for (slot, value) in gains.iter_mut().zip(values) {
        *slot = value;
    }
    Ok(AwbReading { gains, transform })
}

fn parse_token<T>(tag: &'static str, token: Option<&str>, field: &str) -> Result<T, WireError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let token =
        token.ok_or_else(|| WireError::malformed_value(tag, format!("missing {field}")))?;
    token.parse().map_err(|error| {
        WireError::malformed_value(tag, format!("invalid {field} '{token}': {error}"))
    })
}
