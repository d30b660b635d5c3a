//! Point source client: connects to the daemon and answers point requests.
//!
//! The client owns a [`PointProvider`]. For every PointRequest it asks the
//! provider for exactly that many points and sends them back as a single
//! PointResponse.

use crate::core::source::{FallbackProvider, GeneratorProvider, PointProvider};
use crate::core::types::Point;
use crate::error::{Error, Result};
use crate::protocol::messages::Message;
use crate::protocol::wire::{FrameReader, Serializer, WireFormat};
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Read timeout so the run loop can notice shutdown
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Map scene coordinates in `[-1, 1]` to device-relative `[0, 1]`, dropping z
#[inline]
pub fn center_origin(point: &Point) -> Point {
    Point {
        x: (point.x + 1.0) / 2.0,
        y: (point.y + 1.0) / 2.0,
        z: None,
        ..*point
    }
}

/// TCP client serving points to a nanometer daemon
pub struct PointClient {
    stream: TcpStream,
    serializer: Serializer,
    frames: FrameReader,
    write_buffer: Vec<u8>,
    provider: Box<dyn PointProvider>,
    center_origin: bool,
    served: u64,
}

impl PointClient {
    /// Connect with timeout
    pub fn connect(addr: &str, timeout: Duration, format: WireFormat) -> Result<Self> {
        let sock_addr: SocketAddr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Config(format!("Invalid address: {}", addr)))?;
        let stream = TcpStream::connect_timeout(&sock_addr, timeout)?;
        log::info!("Connected to daemon at {}", sock_addr);
        Self::from_stream(stream, format)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream, format: WireFormat) -> Result<Self> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let _ = stream.set_nodelay(true);
        Ok(Self {
            stream,
            serializer: Serializer::new(format),
            frames: FrameReader::new(),
            write_buffer: Vec::new(),
            provider: Box::new(FallbackProvider),
            center_origin: true,
            served: 0,
        })
    }

    /// Toggle the `[-1, 1]` → `[0, 1]` coordinate mapping (on by default)
    pub fn set_center_origin(&mut self, enabled: bool) {
        self.center_origin = enabled;
    }

    /// Replace the point provider
    pub fn attach_provider(&mut self, provider: Box<dyn PointProvider>) {
        self.provider = provider;
    }

    /// Serve points from a restartable generator
    pub fn attach_generator<F, I>(&mut self, factory: F)
    where
        F: FnMut() -> I + Send + 'static,
        I: Iterator<Item = Point> + Send + 'static,
    {
        self.provider = Box::new(GeneratorProvider::new(factory));
    }

    /// Number of requests answered so far
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Answer requests until the daemon disconnects or `running` is cleared
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        log::info!("Point client serving {:?}", self.stream.peer_addr());
        while running.load(Ordering::Relaxed) {
            match self.serve_once() {
                Ok(_) => {}
                Err(e) if e.is_disconnect() => {
                    log::info!("Daemon closed the connection");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        log::info!("Point client stopped after {} responses", self.served);
        Ok(())
    }

    /// Wait for one message and handle it. Returns `Ok(false)` on timeout.
    pub fn serve_once(&mut self) -> Result<bool> {
        let Some(payload) = self.frames.read_frame(&mut self.stream)? else {
            return Ok(false);
        };
        match self.serializer.decode(&payload)? {
            Message::PointRequest { num } => {
                self.answer(num as usize)?;
                Ok(true)
            }
            Message::PointResponse { points } => {
                log::warn!("Ignoring unexpected PointResponse ({} points)", points.len());
                Ok(true)
            }
        }
    }

    fn answer(&mut self, num: usize) -> Result<()> {
        let points = match self.provider.get_points(num) {
            Ok(points) if self.center_origin => points.iter().map(center_origin).collect(),
            Ok(points) => points,
            Err(e) => {
                log::error!("Point provider failed ({}), sending empty batch", e);
                Vec::new()
            }
        };
        if points.len() != num {
            log::debug!("Provider returned {} of {} points", points.len(), num);
        }

        self.serializer
            .encode_frame(&Message::response(points), &mut self.write_buffer)?;
        self.stream.write_all(&self.write_buffer)?;
        self.stream.flush()?;
        self.served += 1;
        Ok(())
    }
}
