//! Point source contracts.
//!
//! Two sides of the pull protocol:
//! - [`PointSource`]: what the scheduler pulls from. Returns a [`PendingPoints`]
//!   handle that resolves later (network round trip) or immediately (local).
//! - [`PointProvider`]: what a transport client answers requests with. Runs on
//!   the remote side, next to the geometry.

use crate::core::types::Point;
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::time::Duration;

/// Handle to a batch of points that may not have arrived yet
///
/// Backed by a one-shot channel. If the resolving side is dropped without
/// answering (connection lost, session torn down) the batch resolves empty.
#[derive(Debug)]
pub struct PendingPoints {
    rx: Receiver<Vec<Point>>,
}

/// Resolving half of a [`PendingPoints`]
#[derive(Debug)]
pub struct PointsResolver {
    tx: Sender<Vec<Point>>,
}

impl PendingPoints {
    /// Create an unresolved pair
    pub fn channel() -> (PointsResolver, PendingPoints) {
        let (tx, rx) = bounded(1);
        (PointsResolver { tx }, PendingPoints { rx })
    }

    /// Already-resolved batch
    pub fn ready(points: Vec<Point>) -> Self {
        let (resolver, pending) = Self::channel();
        resolver.resolve(points);
        pending
    }

    /// Block until the batch arrives (empty if the resolver was dropped)
    pub fn wait(self) -> Vec<Point> {
        self.rx.recv().unwrap_or_default()
    }

    /// Block for at most `timeout`
    pub fn wait_timeout(self, timeout: Duration) -> Result<Vec<Point>> {
        match self.rx.recv_timeout(timeout) {
            Ok(points) => Ok(points),
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout),
            Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
        }
    }

    /// Non-blocking poll
    pub fn try_take(&self) -> Option<Vec<Point>> {
        match self.rx.try_recv() {
            Ok(points) => Some(points),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Vec::new()),
        }
    }
}

impl PointsResolver {
    /// Fulfil the batch. A receiver that was already dropped is not an error.
    pub fn resolve(self, points: Vec<Point>) {
        let _ = self.tx.send(points);
    }
}

/// Scheduler-facing point source: "give me N points, eventually"
pub trait PointSource: Send + Sync {
    /// Request `num` points. At most one request may be outstanding;
    /// implementations return [`Error::RequestInFlight`] otherwise.
    fn request_points(&self, num: usize) -> Result<PendingPoints>;
}

/// Local, synchronous source built from a closure
pub struct FnSource<F> {
    f: F,
}

impl<F> FnSource<F>
where
    F: Fn(usize) -> Vec<Point> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PointSource for FnSource<F>
where
    F: Fn(usize) -> Vec<Point> + Send + Sync,
{
    fn request_points(&self, num: usize) -> Result<PendingPoints> {
        Ok(PendingPoints::ready((self.f)(num)))
    }
}

/// Client-side provider answering point requests
pub trait PointProvider: Send {
    /// Produce exactly `num` points
    fn get_points(&mut self, num: usize) -> Result<Vec<Point>>;
}

/// Provider used until a real one is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackProvider;

impl PointProvider for FallbackProvider {
    fn get_points(&mut self, num: usize) -> Result<Vec<Point>> {
        Ok(vec![Point::FALLBACK; num])
    }
}

/// Provider built from a closure
pub struct FnProvider<F> {
    f: F,
}

impl<F> FnProvider<F>
where
    F: FnMut(usize) -> Vec<Point> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PointProvider for FnProvider<F>
where
    F: FnMut(usize) -> Vec<Point> + Send,
{
    fn get_points(&mut self, num: usize) -> Result<Vec<Point>> {
        Ok((self.f)(num))
    }
}

/// Provider over a restartable generator
///
/// `factory` builds a fresh iterator. When the current one runs dry in the
/// middle of a request, a new one is built so the request is always filled.
/// A fresh iterator that yields nothing at all is reported as
/// [`Error::SourceExhausted`] instead of spinning forever.
pub struct GeneratorProvider<F, I> {
    factory: F,
    current: Option<I>,
}

impl<F, I> GeneratorProvider<F, I>
where
    F: FnMut() -> I + Send,
    I: Iterator<Item = Point> + Send,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    fn next_point(&mut self) -> Result<Point> {
        if let Some(point) = self.current.as_mut().and_then(Iterator::next) {
            return Ok(point);
        }
        let mut fresh = (self.factory)();
        let point = fresh.next().ok_or(Error::SourceExhausted)?;
        self.current = Some(fresh);
        Ok(point)
    }
}

impl<F, I> PointProvider for GeneratorProvider<F, I>
where
    F: FnMut() -> I + Send,
    I: Iterator<Item = Point> + Send,
{
    fn get_points(&mut self, num: usize) -> Result<Vec<Point>> {
        let mut points = Vec::with_capacity(num);
        for _ in 0..num {
            points.push(self.next_point()?);
        }
        Ok(points)
    }
}
