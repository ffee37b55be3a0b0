//! Framing reader: turns a byte stream into decoded [`DeviceMessage`]s.
//!
//! The header is accumulated one byte at a time. Anything past the newline
//! belongs to the binary trailer of the current message (or to the next
//! header), so the reader must never buffer ahead of the terminator.

use std::io::{self, Read};

use crate::errors::WireError;
use crate::message::{self, DeviceMessage, HeaderEvent};

/// Upper bound on a single header line.
///
/// Camera properties objects run to a few hundred kilobytes; a header that
/// grows past this without a terminator indicates a peer that is not
/// speaking this protocol.
pub const MAX_HEADER_BYTES: usize = 1024 * 1024;

/// Reads protocol messages off a byte stream.
///
/// The reader holds no protocol state beyond the bytes it has consumed;
/// sequencing decisions stay with the session layer.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    /// Wraps a byte stream.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads one complete message, trailer included.
    ///
    /// Blocks until the transport yields a full message or its configured
    /// timeout elapses.
    ///
    /// # Errors
    ///
    /// [`WireError::Timeout`] when the transport read times out,
    /// [`WireError::Closed`] when the stream ends mid-message, and the
    /// decode errors from [`WireError`] for semantically invalid headers.
    pub fn read_message(&mut self) -> Result<DeviceMessage, WireError> {
        let line = self.read_header_line()?;
        match message::decode_header(&line)? {
            HeaderEvent::Message(message) => Ok(message),
            HeaderEvent::Image { format, len } => {
                let data = self.read_trailer(len)?;
                Ok(DeviceMessage::Image { format, data })
            }
        }
    }

    fn read_header_line(&mut self) -> Result<Vec<u8>, WireError> {
        let mut line = Vec::new();
        let mut byte = [0_u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Err(WireError::Closed),
                Ok(_) => {
                    if byte[0] == b'\n' {
                        return Ok(line);
                    }
                    line.push(byte[0]);
                    if line.len() > MAX_HEADER_BYTES {
                        return Err(WireError::HeaderTooLarge {
                            limit: MAX_HEADER_BYTES,
                        });
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(WireError::from_read_error(error)),
            }
        }
    }

    fn read_trailer(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        // read_exact loops over partial reads; a single read call is never
        // assumed to return the whole payload.
        let mut data = vec![0_u8; len];
        self.inner
            .read_exact(&mut data)
            .map_err(WireError::from_read_error)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::message::ImageFormat;

    fn reader(bytes: Vec<u8>) -> FrameReader<Cursor<Vec<u8>>> {
        FrameReader::new(Cursor::new(bytes))
    }

    #[test]
    fn reads_header_only_message() {
        let mut frames = reader(b"{\"tag\":\"3aDone\"}\n".to_vec());
        assert_eq!(
            frames.read_message().expect("message should decode"),
            DeviceMessage::ConvergenceDone
        );
    }

    #[test]
    fn reads_trailer_of_declared_length() {
        let mut bytes = b"{\"tag\":\"jpegImage\",\"bufValueSize\":4}\n".to_vec();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let mut frames = reader(bytes);
        let message = frames.read_message().expect("message should decode");
        assert_eq!(
            message,
            DeviceMessage::Image {
                format: ImageFormat::Jpeg,
                data: vec![0xde, 0xad, 0xbe, 0xef],
            }
        );
    }

    #[test]
    fn trailer_bytes_do_not_bleed_into_next_header() {
        // A trailer that itself contains '\n' and '{' must not confuse the
        // reader; the byte count alone delimits it.
        let mut bytes = b"{\"tag\":\"yuvImage\",\"bufValueSize\":3}\n".to_vec();
        bytes.extend_from_slice(b"\n{\n");
        bytes.extend_from_slice(b"{\"tag\":\"3aDone\"}\n");
        let mut frames = reader(bytes);
        let first = frames.read_message().expect("image should decode");
        assert_eq!(
            first,
            DeviceMessage::Image {
                format: ImageFormat::Yuv,
                data: b"\n{\n".to_vec(),
            }
        );
        let second = frames.read_message().expect("terminator should decode");
        assert_eq!(second, DeviceMessage::ConvergenceDone);
    }

    #[test]
    fn truncated_trailer_is_a_closed_stream_never_a_short_buffer() {
        let mut bytes = b"{\"tag\":\"jpegImage\",\"bufValueSize\":10}\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        let mut frames = reader(bytes);
        let error = frames.read_message().expect_err("short trailer must fail");
        assert!(matches!(error, WireError::Closed));
    }

    #[test]
    fn eof_before_terminator_is_a_closed_stream() {
        let mut frames = reader(b"{\"tag\":\"3aDone\"".to_vec());
        let error = frames.read_message().expect_err("partial header must fail");
        assert!(matches!(error, WireError::Closed));
    }

    #[test]
    fn unterminated_header_is_bounded() {
        let mut bytes = vec![b'{'];
        bytes.resize(MAX_HEADER_BYTES + 2, b'a');
        let mut frames = reader(bytes);
        let error = frames.read_message().expect_err("oversized header must fail");
        assert!(matches!(error, WireError::HeaderTooLarge { .. }));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        struct InterruptOnce {
            interrupted: bool,
            inner: Cursor<Vec<u8>>,
        }

        impl Read for InterruptOnce {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::from(io::ErrorKind::Interrupted));
                }
                self.inner.read(buf)
            }
        }

        let mut frames = FrameReader::new(InterruptOnce {
            interrupted: false,
            inner: Cursor::new(b"{\"tag\":\"3aDone\"}\n".to_vec()),
        });
        assert_eq!(
            frames.read_message().expect("retry should succeed"),
            DeviceMessage::ConvergenceDone
        );
    }

    #[test]
    fn timeout_maps_to_wire_timeout() {
        struct AlwaysWouldBlock;

        impl Read for AlwaysWouldBlock {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::WouldBlock))
            }
        }

        let mut frames = FrameReader::new(AlwaysWouldBlock);
        let error = frames.read_message().expect_err("read must time out");
        assert!(matches!(error, WireError::Timeout));
    }
}
