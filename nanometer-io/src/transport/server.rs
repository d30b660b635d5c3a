//! TCP point server: single active source, single outstanding request
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Source connects to the daemon port (1532 by default)
//! 2. If another source is already active, the new socket is shut down
//! 3. Otherwise it becomes the active peer and gets a reader thread
//! 4. request_points() writes a PointRequest and parks a resolver
//! 5. The reader thread resolves it when the PointResponse arrives
//! 6. On close, error or malformed message: the peer is cleared and any
//!    parked resolver is answered with an empty batch
//! ```
//!
//! Without an active peer, requests resolve immediately with
//! [`Point::FALLBACK`] so the scheduler never waits on nobody.
//!
//! # Safety Features
//!
//! - **Read timeout**: 500ms timeout allows periodic shutdown flag checks
//! - **Frame limit**: frames above 16 MiB are rejected as malformed
//! - **Stale readers**: each peer gets an id, so a reader exiting late can
//!   never clear a newer connection

use crate::core::source::{PendingPoints, PointSource, PointsResolver};
use crate::core::types::Point;
use crate::error::{Error, Result};
use crate::protocol::messages::Message;
use crate::protocol::wire::{FrameReader, Serializer};
use parking_lot::Mutex;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Read timeout on the active connection
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Accept loop poll interval when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Currently connected point source
struct ActivePeer {
    id: u64,
    addr: SocketAddr,
    writer: TcpStream,
}

#[derive(Default)]
struct SessionState {
    active: Option<ActivePeer>,
    pending: Option<PointsResolver>,
    next_id: u64,
    write_buffer: Vec<u8>,
}

/// Shared session state between the accept loop, reader threads and the
/// scheduler's loader threads
pub struct Session {
    serializer: Serializer,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(serializer: Serializer) -> Self {
        Self {
            serializer,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Whether a point source is connected
    pub fn is_connected(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Address of the connected point source
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.state.lock().active.as_ref().map(|p| p.addr)
    }

    /// Whether a request is waiting for its response
    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Try to make `stream` the active peer. Returns its id, or `None` when
    /// another peer already holds the session.
    fn attach(&self, stream: &TcpStream, addr: SocketAddr) -> Result<Option<u64>> {
        let mut state = self.state.lock();
        if let Some(active) = &state.active {
            log::warn!(
                "Rejecting connection from {}: already have active source {}",
                addr,
                active.addr
            );
            return Ok(None);
        }
        let writer = stream.try_clone()?;
        state.next_id += 1;
        let id = state.next_id;
        state.active = Some(ActivePeer { id, addr, writer });
        log::info!("Point source connected: {}", addr);
        Ok(Some(id))
    }

    /// Clear peer `id` and answer any parked request with an empty batch
    fn detach(&self, id: u64, reason: &str) {
        let mut state = self.state.lock();
        let is_current = state.active.as_ref().is_some_and(|p| p.id == id);
        if !is_current {
            return;
        }
        if let Some(peer) = state.active.take() {
            let _ = peer.writer.shutdown(Shutdown::Both);
            log::info!("Point source {} disconnected ({})", peer.addr, reason);
        }
        if let Some(resolver) = state.pending.take() {
            log::debug!("Resolving outstanding point request with empty batch");
            resolver.resolve(Vec::new());
        }
    }

    /// Route a message received from peer `id`
    fn handle_message(&self, id: u64, msg: Message) {
        match msg {
            Message::PointResponse { points } => {
                let mut state = self.state.lock();
                if !state.active.as_ref().is_some_and(|p| p.id == id) {
                    return;
                }
                match state.pending.take() {
                    Some(resolver) => {
                        log::trace!("Received {} points", points.len());
                        resolver.resolve(points);
                    }
                    None => log::warn!("Message received and no request pending"),
                }
            }
            Message::PointRequest { num } => {
                log::warn!("Ignoring PointRequest({}) sent by point source", num);
            }
        }
    }

    /// Close the active peer, if any
    pub fn disconnect(&self) {
        let id = self.state.lock().active.as_ref().map(|p| p.id);
        if let Some(id) = id {
            self.detach(id, "closed by daemon");
        }
    }

    /// Reader loop for peer `id`. Runs until the peer leaves or `running`
    /// is cleared.
    fn serve(&self, id: u64, mut stream: TcpStream, running: &AtomicBool) {
        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log::warn!("Failed to set read timeout: {}", e);
        }

        let mut frames = FrameReader::new();
        let reason = loop {
            if !running.load(Ordering::Relaxed) {
                break "daemon shutting down".to_string();
            }
            // The daemon side may have dropped us (write failure, disconnect())
            if !self.state.lock().active.as_ref().is_some_and(|p| p.id == id) {
                break "session cleared".to_string();
            }

            match frames.read_frame(&mut stream) {
                Ok(Some(payload)) => match self.serializer.decode(&payload) {
                    Ok(msg) => self.handle_message(id, msg),
                    Err(e) => {
                        log::error!("Dropping point source after malformed message: {}", e);
                        break format!("malformed message: {}", e);
                    }
                },
                Ok(None) => {
                    // Timeout, check flags and keep waiting
                }
                Err(e) if e.is_disconnect() => break "closed by peer".to_string(),
                Err(e) => {
                    log::error!("Failed to read from point source: {}", e);
                    break format!("error: {}", e);
                }
            }
        };

        self.detach(id, &reason);
    }
}

impl PointSource for Session {
    fn request_points(&self, num: usize) -> Result<PendingPoints> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(peer) = state.active.as_mut() else {
            return Ok(PendingPoints::ready(vec![Point::FALLBACK; num]));
        };
        if state.pending.is_some() {
            return Err(Error::RequestInFlight);
        }

        self.serializer
            .encode_frame(&Message::request(num), &mut state.write_buffer)?;
        if let Err(e) = peer
            .writer
            .write_all(&state.write_buffer)
            .and_then(|_| peer.writer.flush())
        {
            log::warn!("Failed to send point request to {}: {}", peer.addr, e);
            let id = peer.id;
            drop(guard);
            self.detach(id, "write failed");
            return Ok(PendingPoints::ready(Vec::new()));
        }

        log::trace!("Requested {} points from {}", num, peer.addr);
        let (resolver, pending) = PendingPoints::channel();
        state.pending = Some(resolver);
        Ok(pending)
    }
}

/// Listening side of the transport: owns the accept thread
pub struct PointServer {
    session: Arc<Session>,
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
    accept_handle: Option<JoinHandle<()>>,
}

impl PointServer {
    /// Bind and start accepting point sources
    pub fn bind<A: ToSocketAddrs>(addr: A, serializer: Serializer) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let session = Arc::new(Session::new(serializer));
        let running = Arc::new(AtomicBool::new(true));

        let accept_session = Arc::clone(&session);
        let accept_running = Arc::clone(&running);
        let accept_handle = thread::Builder::new()
            .name("point-accept".to_string())
            .spawn(move || accept_loop(listener, accept_session, accept_running))?;

        log::info!(
            "Point server listening on {} ({:?})",
            local_addr,
            serializer.format()
        );

        Ok(Self {
            session,
            running,
            local_addr,
            accept_handle: Some(accept_handle),
        })
    }

    /// Session handle, usable as the scheduler's [`PointSource`]
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and drop the active peer
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.accept_handle.take() {
            let _ = handle.join();
        }
        self.session.disconnect();
    }
}

impl Drop for PointServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Accept loop. Only one source at a time, extra connections are closed.
fn accept_loop(listener: TcpListener, session: Arc<Session>, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                // Set socket to blocking mode, reads use a timeout instead
                if let Err(e) = stream.set_nonblocking(false) {
                    log::error!("Failed to set socket to blocking mode: {}", e);
                    let _ = stream.shutdown(Shutdown::Both);
                    continue;
                }
                let _ = stream.set_nodelay(true);

                let id = match session.attach(&stream, addr) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        let _ = stream.shutdown(Shutdown::Both);
                        continue;
                    }
                    Err(e) => {
                        log::error!("Failed to attach point source {}: {}", addr, e);
                        let _ = stream.shutdown(Shutdown::Both);
                        continue;
                    }
                };

                let reader_session = Arc::clone(&session);
                let reader_running = Arc::clone(&running);
                let spawned = thread::Builder::new()
                    .name("point-session".to_string())
                    .spawn(move || reader_session.serve(id, stream, &reader_running));
                if let Err(e) = spawned {
                    log::error!("Failed to spawn session reader: {}", e);
                    session.detach(id, "reader spawn failed");
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                log::error!("Accept error: {}", e);
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
    log::debug!("Accept loop exiting");
}
