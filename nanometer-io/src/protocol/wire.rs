//! Wire format serialization and framing
//!
//! # TCP Protocol
//!
//! Every message travels in its own length-prefixed frame:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ Postcard binary or JSON  │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - **Maximum frame size**: 16 MiB. A larger declared length is a decode error.
//! - **Payload**: one [`Message`], variant tag first.
//!
//! ## Wire Formats
//!
//! | Format | Use case |
//! |--------|----------|
//! | Postcard (default) | Production, ~45 bytes per point |
//! | JSON | Debugging with a packet sniffer |
//!
//! Both peers must be configured with the same format.
//!
//! ## Error Handling
//!
//! - **Unknown tag / malformed payload**: [`Error::Decode`]; the session
//!   treats the connection as unusable
//! - **Oversized length**: [`Error::Decode`]
//! - **EOF**: [`Error::ConnectionClosed`]

use crate::core::types::Point;
use crate::error::{Error, Result};
use crate::protocol::messages::Message;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read, Write};

/// Largest payload accepted in a single frame
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes
const HEADER_LEN: usize = 4;

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard - fast and compact
    #[default]
    Postcard,
    /// JSON format - human-readable for debugging
    Json,
}

/// Serializer for protocol messages in the configured format
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    /// Create a new serializer for the given format
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Serialize a message to bytes (no length prefix)
    pub fn encode(&self, msg: &Message) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(msg).map_err(|e| Error::Encode(e.to_string()))
            }
            WireFormat::Json => serde_json::to_vec(msg).map_err(|e| Error::Encode(e.to_string())),
        }
    }

    /// Deserialize bytes to a message
    pub fn decode(&self, bytes: &[u8]) -> Result<Message> {
        match self.format {
            WireFormat::Postcard => {
                let (msg, rest) = postcard::take_from_bytes::<Message>(bytes)
                    .map_err(|e| Error::Decode(e.to_string()))?;
                if !rest.is_empty() {
                    return Err(Error::Decode(format!(
                        "{} trailing bytes after {}",
                        rest.len(),
                        msg.kind()
                    )));
                }
                Ok(msg)
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
            }
        }
    }

    /// Encode a point request
    pub fn encode_point_request(&self, num: usize) -> Result<Vec<u8>> {
        self.encode(&Message::request(num))
    }

    /// Encode a point response
    pub fn encode_point_response(&self, points: Vec<Point>) -> Result<Vec<u8>> {
        self.encode(&Message::response(points))
    }

    /// Serialize a message into a complete frame (length prefix + payload)
    ///
    /// Reuses `buffer` to avoid an allocation per frame.
    pub fn encode_frame(&self, msg: &Message, buffer: &mut Vec<u8>) -> Result<()> {
        let payload = self.encode(msg)?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(Error::Encode(format!(
                "Message too large: {} bytes",
                payload.len()
            )));
        }
        buffer.clear();
        buffer.reserve(HEADER_LEN + payload.len());
        buffer.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buffer.extend_from_slice(&payload);
        Ok(())
    }

    /// Encode and write a single frame
    pub fn write_message<W: Write>(&self, writer: &mut W, msg: &Message) -> Result<()> {
        let mut frame = Vec::new();
        self.encode_frame(msg, &mut frame)?;
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(())
    }
}

/// Create a serializer for the given wire format
pub fn create_serializer(format: WireFormat) -> Serializer {
    Serializer::new(format)
}

/// Incremental frame reader
///
/// Accumulates partial reads so a read timeout in the middle of a frame
/// never loses bytes or desynchronizes the stream.
pub struct FrameReader {
    pending: Vec<u8>,
    chunk: Vec<u8>,
}

/// Read chunk size
const READ_CHUNK: usize = 16 * 1024;

impl FrameReader {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            chunk: vec![0u8; READ_CHUNK],
        }
    }

    /// Read until one full frame payload is available
    ///
    /// Returns `Ok(None)` when the reader timed out (or would block) before a
    /// frame completed; call again later. EOF maps to
    /// [`Error::ConnectionClosed`].
    pub fn read_frame<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(Some(frame));
            }
            match reader.read(&mut self.chunk) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => self.pending.extend_from_slice(&self.chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Pop a complete frame from the accumulated bytes, if there is one
    fn take_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.pending.len() < HEADER_LEN {
            return Ok(None);
        }
        let mut len_buf = [0u8; HEADER_LEN];
        len_buf.copy_from_slice(&self.pending[..HEADER_LEN]);
        let len = u32::from_be_bytes(len_buf) as usize;

        // Sanity check on length
        if len > MAX_FRAME_LEN {
            return Err(Error::Decode(format!("Frame too large: {} bytes", len)));
        }
        if self.pending.len() < HEADER_LEN + len {
            return Ok(None);
        }

        let frame = self.pending[HEADER_LEN..HEADER_LEN + len].to_vec();
        self.pending.drain(..HEADER_LEN + len);
        Ok(Some(frame))
    }

    /// Bytes received but not yet consumed as a frame
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Color;
    use std::io::Cursor;

    /// Reader that hands out at most `step` bytes per call, then times out once
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        stall: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.stall {
                self.stall = false;
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            self.stall = true;
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new(0.0, 1.0, Color::RED),
            Point::with_z(0.25, 0.5, -1.0, Color::new(0.1, 0.2, 0.3)),
        ]
    }

    #[test]
    fn test_both_formats_carry_both_kinds() {
        for format in [WireFormat::Postcard, WireFormat::Json] {
            let s = Serializer::new(format);
            let req = s.decode(&s.encode_point_request(1000).unwrap()).unwrap();
            assert_eq!(req, Message::PointRequest { num: 1000 });

            let resp = s
                .decode(&s.encode_point_response(sample_points()).unwrap())
                .unwrap();
            assert_eq!(resp, Message::response(sample_points()));
        }
    }

    #[test]
    fn test_unknown_tag_is_decode_error() {
        let s = Serializer::new(WireFormat::Postcard);
        // Variant index 7 does not exist
        assert!(matches!(s.decode(&[7, 1]), Err(Error::Decode(_))));

        let j = Serializer::new(WireFormat::Json);
        let err = j.decode(br#"{"PointShuffle":{"num":3}}"#);
        assert!(matches!(err, Err(Error::Decode(_))));
    }

    #[test]
    fn test_truncated_and_trailing_payloads_rejected() {
        let s = Serializer::new(WireFormat::Postcard);
        let mut bytes = s.encode_point_response(sample_points()).unwrap();
        assert!(matches!(
            s.decode(&bytes[..bytes.len() - 3]),
            Err(Error::Decode(_))
        ));
        bytes.push(0);
        assert!(matches!(s.decode(&bytes), Err(Error::Decode(_))));
    }

    #[test]
    fn test_json_accepts_missing_z() {
        let s = Serializer::new(WireFormat::Json);
        let msg = s
            .decode(br#"{"PointResponse":{"points":[{"x":0.5,"y":0.5,"r":1,"g":0,"b":0}]}}"#)
            .unwrap();
        assert_eq!(msg, Message::response(vec![Point::PADDING]));
    }

    #[test]
    fn test_frame_reader_reassembles_across_timeouts() {
        let s = Serializer::new(WireFormat::Postcard);
        let mut wire = Vec::new();
        let mut frame = Vec::new();
        s.encode_frame(&Message::request(5), &mut frame).unwrap();
        wire.extend_from_slice(&frame);
        s.encode_frame(&Message::response(sample_points()), &mut frame)
            .unwrap();
        wire.extend_from_slice(&frame);

        let mut reader = Trickle {
            data: wire,
            pos: 0,
            step: 3,
            stall: false,
        };
        let mut frames = FrameReader::new();
        let mut decoded = Vec::new();
        for _ in 0..200 {
            match frames.read_frame(&mut reader) {
                Ok(Some(payload)) => decoded.push(s.decode(&payload).unwrap()),
                Ok(None) => {}
                Err(Error::ConnectionClosed) => break,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(
            decoded,
            vec![Message::request(5), Message::response(sample_points())]
        );
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut data = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes().to_vec();
        data.extend_from_slice(&[0; 8]);
        let mut frames = FrameReader::new();
        let result = frames.read_frame(&mut Cursor::new(data));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_eof_is_connection_closed() {
        let mut frames = FrameReader::new();
        let result = frames.read_frame(&mut Cursor::new(vec![0u8, 0]));
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert_eq!(frames.buffered(), 2);
    }
}
