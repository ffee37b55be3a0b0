//! Wire protocol spoken with the remote imaging device.
//!
//! ## Wire format
//!
//! Every protocol unit, in either direction, starts with a JSON object
//! terminated by a single ASCII newline. Outbound commands carry a `cmdName`
//! discriminator and nothing after the newline. Inbound messages carry a
//! `tag` discriminator; when the header declares a `bufValueSize` integer,
//! exactly that many raw bytes follow the newline with no further delimiter
//! before the next header:
//!
//! ```text
//! {"tag":"captureResults","objValue":{...,"width":640,"height":480}}\n
//! {"tag":"jpegImage","bufValueSize":8192}\n<8192 raw bytes>
//! {"tag":"3aDone"}\n
//! ```
//!
//! There is no compression and no checksum; integrity is left to the
//! transport. This crate owns the typed representation of both directions
//! ([`HostCommand`], [`DeviceMessage`]) and the framing reader that turns a
//! byte stream into decoded messages ([`FrameReader`]). It holds no protocol
//! state: sequencing decisions belong to the session layer.

mod command;
mod errors;
mod frame;
mod message;

pub use command::{
    CaptureRequest, ConvergenceRegions, ConvergenceTriggers, HostCommand, NormalizedRect,
    OutputSurface, PARAM_EXPOSURE_TIME, PARAM_SENSITIVITY,
};
pub use errors::WireError;
pub use frame::{FrameReader, MAX_HEADER_BYTES};
pub use message::{
    AeReading, AfReading, AwbReading, DeviceMessage, ImageFormat, MessageKind,
};
