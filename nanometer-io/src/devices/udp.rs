//! UDP mirror sink
//!
//! Sends every streamed frame to a fixed target as PointResponse datagrams,
//! using the same length-prefixed framing as the TCP protocol so a listener
//! can reuse the decoder.
//!
//! ```text
//! ┌──────────────────┬───────────────────────────────┐
//! │ Length (4 bytes) │ PointResponse (≤ 512 points)  │
//! │ Big-endian u32   │ Postcard                      │
//! └──────────────────┴───────────────────────────────┘
//! ```
//!
//! Send errors are logged and skipped; a missing listener never stalls the
//! scheduler.

use crate::core::sink::PointSink;
use crate::core::types::Point;
use crate::error::{Error, Result};
use crate::protocol::messages::Message;
use crate::protocol::wire::{Serializer, WireFormat};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Points per datagram, keeps postcard payloads well under 64 KiB
pub const MAX_POINTS_PER_DATAGRAM: usize = 512;

pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
    serializer: Serializer,
    send_buffer: Vec<u8>,
    name: String,
}

impl UdpSink {
    pub fn new(target: &str) -> Result<Self> {
        let target = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Config(format!("Invalid UDP target: {}", target)))?;
        // Bind to any available port (we only send, not receive)
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        log::info!("UDP mirror streaming to {}", target);
        Ok(Self {
            socket,
            target,
            serializer: Serializer::new(WireFormat::Postcard),
            send_buffer: Vec::new(),
            name: format!("udp:{}", target),
        })
    }
}

impl PointSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream(&mut self, points: &[Point], _rate: u32) -> Result<()> {
        for chunk in points.chunks(MAX_POINTS_PER_DATAGRAM) {
            self.serializer
                .encode_frame(&Message::response(chunk.to_vec()), &mut self.send_buffer)?;
            if let Err(e) = self.socket.send_to(&self.send_buffer, self.target) {
                // UDP send errors are not fatal - just log and continue
                log::warn!("Failed to send {} points to {}: {}", chunk.len(), self.target, e);
            } else {
                log::trace!("Sent {} points to {}", chunk.len(), self.target);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire::FrameReader;
    use std::time::Duration;

    #[test]
    fn test_frames_arrive_chunked() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let target = listener.local_addr().unwrap().to_string();

        let mut sink = UdpSink::new(&target).unwrap();
        sink.stream(&vec![Point::PADDING; 600], 30_000).unwrap();

        let serializer = Serializer::new(WireFormat::Postcard);
        let mut sizes = Vec::new();
        let mut datagram = vec![0u8; 65_536];
        for _ in 0..2 {
            let n = listener.recv(&mut datagram).unwrap();
            let mut frames = FrameReader::new();
            let payload = frames
                .read_frame(&mut &datagram[..n])
                .unwrap()
                .unwrap();
            match serializer.decode(&payload).unwrap() {
                Message::PointResponse { points } => sizes.push(points.len()),
                other => panic!("unexpected message: {:?}", other),
            }
        }
        assert_eq!(sizes, vec![512, 88]);
    }
}
