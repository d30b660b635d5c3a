//! Integration tests for the transport session over real loopback sockets.
//!
//! Every wait is bounded so a broken session fails the test instead of
//! hanging it.

use nanometer_io::protocol::{FrameReader, Message, Serializer, WireFormat};
use nanometer_io::transport::{PointClient, PointServer};
use nanometer_io::{Color, Error, FnProvider, Point, PointSource};
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(3);

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

fn bind(format: WireFormat) -> PointServer {
    PointServer::bind("127.0.0.1:0", Serializer::new(format)).expect("bind loopback")
}

/// Hand-driven peer speaking the wire protocol directly
struct RawPeer {
    stream: TcpStream,
    serializer: Serializer,
    frames: FrameReader,
}

impl RawPeer {
    fn connect(server: &PointServer) -> Self {
        let stream = TcpStream::connect(server.local_addr()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        Self {
            stream,
            serializer: Serializer::new(WireFormat::Postcard),
            frames: FrameReader::new(),
        }
    }

    fn recv(&mut self) -> Message {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            if let Some(payload) = self.frames.read_frame(&mut self.stream).unwrap() {
                return self.serializer.decode(&payload).unwrap();
            }
        }
        panic!("no message within {:?}", WAIT);
    }

    fn send(&mut self, msg: &Message) {
        self.serializer.write_message(&mut self.stream, msg).unwrap();
    }
}

fn ramp(num: usize) -> Vec<Point> {
    (0..num)
        .map(|i| Point::new(i as f64 / 10.0, 0.25, Color::BLUE))
        .collect()
}

#[test]
fn test_no_source_serves_fallback() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();
    assert!(!session.is_connected());
    let points = session.request_points(5).unwrap().wait_timeout(WAIT).unwrap();
    assert_eq!(points, vec![Point::FALLBACK; 5]);
}

#[test]
fn test_client_answers_exact_count() {
    for format in [WireFormat::Postcard, WireFormat::Json] {
        let server = bind(format);
        let session = server.session();

        let addr = server.local_addr().to_string();
        let running = Arc::new(AtomicBool::new(true));
        let client_running = Arc::clone(&running);
        let client = thread::spawn(move || {
            let mut client = PointClient::connect(&addr, WAIT, format).unwrap();
            client.set_center_origin(false);
            client.attach_provider(Box::new(FnProvider::new(ramp)));
            client.run(&client_running).unwrap();
            client.served()
        });

        assert!(wait_for(|| session.is_connected()));
        for num in [5, 1, 300] {
            let points = session
                .request_points(num)
                .unwrap()
                .wait_timeout(WAIT)
                .unwrap();
            assert_eq!(points, ramp(num));
        }

        running.store(false, Ordering::SeqCst);
        assert_eq!(client.join().unwrap(), 3);
    }
}

#[test]
fn test_client_centers_origin_by_default() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();

    let addr = server.local_addr().to_string();
    let running = Arc::new(AtomicBool::new(true));
    let client_running = Arc::clone(&running);
    let client = thread::spawn(move || {
        let mut client = PointClient::connect(&addr, WAIT, WireFormat::Postcard).unwrap();
        client.attach_generator(|| {
            [
                Point::with_z(-1.0, -1.0, 0.5, Color::RED),
                Point::with_z(1.0, 0.0, 0.5, Color::GREEN),
            ]
            .into_iter()
        });
        client.run(&client_running).unwrap();
    });

    assert!(wait_for(|| session.is_connected()));
    let points = session.request_points(3).unwrap().wait_timeout(WAIT).unwrap();
    assert_eq!(
        points,
        vec![
            Point::new(0.0, 0.0, Color::RED),
            Point::new(1.0, 0.5, Color::GREEN),
            Point::new(0.0, 0.0, Color::RED),
        ]
    );

    running.store(false, Ordering::SeqCst);
    client.join().unwrap();
}

#[test]
fn test_second_connection_rejected_without_disturbing_first() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();

    let mut first = RawPeer::connect(&server);
    assert!(wait_for(|| session.is_connected()));
    let first_addr = first.stream.local_addr().unwrap();
    assert_eq!(session.peer_addr(), Some(first_addr));

    let pending = session.request_points(2).unwrap();
    assert_eq!(first.recv(), Message::PointRequest { num: 2 });

    // The intruder is closed by the server
    let mut second = TcpStream::connect(server.local_addr()).unwrap();
    second.set_read_timeout(Some(WAIT)).unwrap();
    let mut buf = [0u8; 16];
    match second.read(&mut buf) {
        Ok(0) => {}
        Err(e) if e.kind() == ErrorKind::ConnectionReset => {}
        other => panic!("second connection was not closed: {:?}", other),
    }

    // The first session and its pending request are untouched
    assert_eq!(session.peer_addr(), Some(first_addr));
    assert!(session.has_pending());
    first.send(&Message::response(ramp(2)));
    assert_eq!(pending.wait_timeout(WAIT).unwrap(), ramp(2));
}

#[test]
fn test_second_request_while_pending_is_rejected() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();
    let mut peer = RawPeer::connect(&server);
    assert!(wait_for(|| session.is_connected()));

    let pending = session.request_points(4).unwrap();
    assert!(matches!(
        session.request_points(4),
        Err(Error::RequestInFlight)
    ));

    assert_eq!(peer.recv(), Message::PointRequest { num: 4 });
    peer.send(&Message::response(ramp(4)));
    assert_eq!(pending.wait_timeout(WAIT).unwrap().len(), 4);
}

#[test]
fn test_disconnect_resolves_pending_empty() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();
    let mut peer = RawPeer::connect(&server);
    assert!(wait_for(|| session.is_connected()));

    let pending = session.request_points(10).unwrap();
    assert_eq!(peer.recv(), Message::PointRequest { num: 10 });
    drop(peer);

    assert!(pending.wait_timeout(WAIT).unwrap().is_empty());
    assert!(wait_for(|| !session.is_connected()));

    // Back to the fallback path
    let points = session.request_points(2).unwrap().wait_timeout(WAIT).unwrap();
    assert_eq!(points, vec![Point::FALLBACK; 2]);
}

#[test]
fn test_malformed_message_drops_connection() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();
    let mut peer = RawPeer::connect(&server);
    assert!(wait_for(|| session.is_connected()));

    let pending = session.request_points(3).unwrap();
    assert_eq!(peer.recv(), Message::PointRequest { num: 3 });

    // Length 3, unknown variant tag
    peer.stream.write_all(&[0, 0, 0, 3, 9, 9, 9]).unwrap();

    assert!(pending.wait_timeout(WAIT).unwrap().is_empty());
    assert!(wait_for(|| !session.is_connected()));

    // A new source can take over
    let _replacement = RawPeer::connect(&server);
    assert!(wait_for(|| session.is_connected()));
}

#[test]
fn test_unsolicited_response_is_ignored() {
    let server = bind(WireFormat::Postcard);
    let session = server.session();
    let mut peer = RawPeer::connect(&server);
    assert!(wait_for(|| session.is_connected()));

    peer.send(&Message::response(ramp(3)));
    thread::sleep(Duration::from_millis(50));
    assert!(session.is_connected());

    let pending = session.request_points(1).unwrap();
    assert_eq!(peer.recv(), Message::PointRequest { num: 1 });
    peer.send(&Message::response(ramp(1)));
    assert_eq!(pending.wait_timeout(WAIT).unwrap(), ramp(1));
}
