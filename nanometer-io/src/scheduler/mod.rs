//! Streaming scheduler: buffers pulled points and drains them to the devices
//!
//! # Clock Modes
//!
//! | Mode | Timing authority | Drain path |
//! |------|------------------|------------|
//! | Self-timed | Local ticker thread, every `threshold / rate` s | [`Scheduler::tick`] pushes one frame to every sink |
//! | External clock | The attached [`ClockMaster`] | Its callback runs [`Scheduler::fill`], other sinks get a mirror |
//!
//! # Buffering
//!
//! ```text
//! PointSource ──pull(threshold)──► buffer ──► drain ──► sinks
//!                                     └──────► clock master callback
//! ```
//!
//! - At most one pull is in flight (`loading`). A second trigger while a
//!   pull is loading is a no-op; `fill` waits on the running one instead.
//! - A pull is only started while `buffer < 2 × threshold`, and a batch is
//!   truncated to `threshold`, so the buffer stays below `3 × threshold`.
//! - Short or empty batches are never errors. The shortfall is covered with
//!   [`Point::PADDING`].
//! - `stop()` bumps a generation counter and wakes every waiting `fill`.
//!   Pulls that resolve afterwards are dropped instead of landing in a
//!   stopped buffer, and never hold up a later restart.

use crate::config::{ModeSetting, StreamingConfig};
use crate::core::sink::{ClockMaster, PointSink, PullCallback};
use crate::core::source::PointSource;
use crate::core::types::{DevicePoint, Point};
use crate::devices::Device;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Draining discipline chosen at start time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    SelfTimed,
    ExternalClock,
}

#[derive(Default)]
struct StreamState {
    buffer: VecDeque<Point>,
    drain: Vec<Point>,
    loading: bool,
    loads_completed: u64,
    last_load_len: usize,
    generation: u64,
    stopped: bool,
    source: Option<Arc<dyn PointSource>>,
}

struct Shared {
    config: StreamingConfig,
    state: Mutex<StreamState>,
    load_done: Condvar,
    sinks: Mutex<Vec<Box<dyn PointSink>>>,
}

/// Point scheduler between one [`PointSource`] and the output devices
pub struct Scheduler {
    shared: Arc<Shared>,
    clock_master: Mutex<Option<Box<dyn ClockMaster>>>,
    ticker: Option<JoinHandle<()>>,
    ticker_running: Arc<AtomicBool>,
    mode: Option<ClockMode>,
}

impl Scheduler {
    pub fn new(config: StreamingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(StreamState::default()),
                load_done: Condvar::new(),
                sinks: Mutex::new(Vec::new()),
            }),
            clock_master: Mutex::new(None),
            ticker: None,
            ticker_running: Arc::new(AtomicBool::new(false)),
            mode: None,
        })
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.shared.config
    }

    /// Attach a push-driven device
    pub fn use_sink(&mut self, sink: Box<dyn PointSink>) {
        log::info!("Attached sink: {}", sink.name());
        self.shared.sinks.lock().push(sink);
    }

    /// Attach the clock master. Only one is allowed.
    pub fn use_clock_master(&mut self, master: Box<dyn ClockMaster>) -> Result<()> {
        let slot = self.clock_master.get_mut();
        if let Some(existing) = slot.as_ref() {
            return Err(Error::Config(format!(
                "clock master {} already attached, cannot add {}",
                existing.name(),
                master.name()
            )));
        }
        log::info!("Attached clock master: {}", master.name());
        *slot = Some(master);
        Ok(())
    }

    /// Attach a device built from configuration
    pub fn use_device(&mut self, device: Device) -> Result<()> {
        match device {
            Device::Sink(sink) => {
                self.use_sink(sink);
                Ok(())
            }
            Device::ClockMaster(master) => self.use_clock_master(master),
        }
    }

    /// Pull points from `source` from now on
    pub fn stream_from(&self, source: Arc<dyn PointSource>) {
        self.shared.state.lock().source = Some(source);
    }

    /// Start with the configured mode
    pub fn start(&mut self) -> Result<ClockMode> {
        let mode = match self.shared.config.mode {
            ModeSetting::Auto if self.clock_master.get_mut().is_some() => {
                ClockMode::ExternalClock
            }
            ModeSetting::Auto | ModeSetting::SelfTimed => ClockMode::SelfTimed,
            ModeSetting::ExternalClock => ClockMode::ExternalClock,
        };
        self.start_with_mode(mode)
    }

    /// Start in `mode`. Starting an already running scheduler is a no-op.
    pub fn start_with_mode(&mut self, mode: ClockMode) -> Result<ClockMode> {
        if let Some(running) = self.mode {
            log::debug!("Scheduler already running in {:?} mode", running);
            return Ok(running);
        }

        self.shared.state.lock().stopped = false;

        match mode {
            ClockMode::SelfTimed => {
                if let Some(master) = self.clock_master.get_mut().as_ref() {
                    log::warn!("Self-timed mode: clock master {} stays idle", master.name());
                }
                self.ticker_running.store(true, Ordering::SeqCst);
                let shared = Arc::clone(&self.shared);
                let running = Arc::clone(&self.ticker_running);
                let handle = thread::Builder::new()
                    .name("point-ticker".to_string())
                    .spawn(move || ticker_loop(shared, running))?;
                self.ticker = Some(handle);
            }
            ClockMode::ExternalClock => {
                let Some(master) = self.clock_master.get_mut().as_mut() else {
                    return Err(Error::Config(
                        "external clock mode requires a clock master".to_string(),
                    ));
                };
                let shared = Arc::clone(&self.shared);
                let callback: PullCallback = Box::new(move |num| {
                    fill_shared(&shared, num)
                        .iter()
                        .map(DevicePoint::from)
                        .collect()
                });
                master.stream_points(self.shared.config.points_rate, callback)?;
            }
        }

        log::info!(
            "Scheduler started: {:?} at {} pts/s, threshold {}",
            mode,
            self.shared.config.points_rate,
            self.shared.config.buffer_threshold
        );
        self.mode = Some(mode);
        Ok(mode)
    }

    /// Stop the ticker or the clock master. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mode) = self.mode.take() else {
            return Ok(());
        };

        self.ticker_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.ticker.take() {
            let _ = handle.join();
        }

        // Release a clock master callback parked on a stalled pull before
        // joining the clock master's thread
        {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.stopped = true;
            state.loading = false;
            state.buffer.clear();
            state.drain.clear();
        }
        self.shared.load_done.notify_all();

        let result = match self.clock_master.get_mut().as_mut() {
            Some(master) if mode == ClockMode::ExternalClock => master.stop(),
            _ => Ok(()),
        };
        log::info!("Scheduler stopped");
        result
    }

    /// Active mode, `None` when stopped
    pub fn mode(&self) -> Option<ClockMode> {
        self.mode
    }

    /// One self-timed step: top up, then push a full frame to every sink.
    /// No-op after `stop` until the next start.
    pub fn tick(&self) {
        tick_shared(&self.shared);
    }

    /// Return exactly `num` points, waiting for pulls as needed. After
    /// `stop` it pads without waiting.
    pub fn fill(&self, num: usize) -> Vec<Point> {
        fill_shared(&self.shared, num)
    }

    /// Points currently buffered
    pub fn buffered(&self) -> usize {
        self.shared.state.lock().buffer.len()
    }

    /// Whether a pull is in flight
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().loading
    }

    /// Pulls completed so far
    pub fn loads_completed(&self) -> u64 {
        self.shared.state.lock().loads_completed
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Error stopping scheduler: {}", e);
        }
    }
}

/// Start a pull unless one is running. Caller holds the state lock.
fn begin_load(shared: &Arc<Shared>, state: &mut StreamState) {
    if state.loading || state.stopped {
        return;
    }
    let Some(source) = state.source.clone() else {
        return;
    };

    state.loading = true;
    let generation = state.generation;
    let threshold = shared.config.buffer_threshold;
    let loader = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name("point-loader".to_string())
        .spawn(move || {
            let points = match source.request_points(threshold) {
                Ok(pending) => pending.wait(),
                Err(e) => {
                    log::warn!("Point pull failed: {}", e);
                    Vec::new()
                }
            };
            finish_load(&loader, generation, points);
        });

    if let Err(e) = spawned {
        log::error!("Failed to spawn point loader: {}", e);
        state.loading = false;
    }
}

fn finish_load(shared: &Shared, generation: u64, mut points: Vec<Point>) {
    let threshold = shared.config.buffer_threshold;
    if points.len() > threshold {
        log::debug!("Truncating {} points to {}", points.len(), threshold);
        points.truncate(threshold);
    }

    let mut state = shared.state.lock();
    if state.generation != generation {
        // Stop already released `loading`; a newer load may own it now
        log::debug!("Dropping {} points pulled before stop", points.len());
        return;
    }
    let appended = points.len();
    state.buffer.extend(points);
    if appended < threshold {
        log::debug!("Pull returned {} of {} points", appended, threshold);
    }
    state.loading = false;
    state.loads_completed += 1;
    state.last_load_len = appended;
    drop(state);
    shared.load_done.notify_all();
}

fn tick_shared(shared: &Arc<Shared>) {
    let threshold = shared.config.buffer_threshold;
    let frame = {
        let mut state = shared.state.lock();
        if state.source.is_none() || state.stopped {
            return;
        }
        if state.buffer.len() < 2 * threshold {
            begin_load(shared, &mut state);
        }

        let mut padded = 0usize;
        while state.drain.len() < threshold {
            let point = match state.buffer.pop_front() {
                Some(point) => point,
                None => {
                    padded += 1;
                    Point::PADDING
                }
            };
            state.drain.push(point);
        }
        if padded > 0 {
            log::debug!("Buffer underflow, padded {} points", padded);
        }
        std::mem::take(&mut state.drain)
    };

    stream_to_sinks(shared, &frame);
}

fn fill_shared(shared: &Arc<Shared>, num: usize) -> Vec<Point> {
    let threshold = shared.config.buffer_threshold;
    let deadline = shared.config.pull_timeout().map(|t| Instant::now() + t);

    let mut state = shared.state.lock();
    if state.source.is_none() || state.stopped {
        return vec![Point::PADDING; num];
    }
    let generation = state.generation;

    while state.buffer.len() < num {
        if !state.loading {
            begin_load(shared, &mut state);
            if !state.loading {
                break;
            }
        }

        let observed = state.loads_completed;
        let timed_out = match deadline {
            Some(deadline) => shared
                .load_done
                .wait_until(&mut state, deadline)
                .timed_out(),
            None => {
                shared.load_done.wait(&mut state);
                false
            }
        };
        if state.generation != generation {
            log::debug!("Scheduler stopped while waiting for points");
            return vec![Point::PADDING; num];
        }
        if timed_out {
            log::warn!(
                "Timed out waiting for points ({} of {} buffered)",
                state.buffer.len(),
                num
            );
            break;
        }
        if state.loads_completed != observed && state.last_load_len == 0 {
            // Source has nothing right now, pad instead of spinning
            break;
        }
    }

    let take = num.min(state.buffer.len());
    let mut points: Vec<Point> = state.buffer.drain(..take).collect();
    if points.len() < num {
        log::debug!("Padding {} points", num - points.len());
        points.resize(num, Point::PADDING);
    }

    state.drain.extend_from_slice(&points);
    let mut frames = Vec::new();
    while state.drain.len() >= threshold {
        let rest = state.drain.split_off(threshold);
        frames.push(std::mem::replace(&mut state.drain, rest));
    }

    if state.buffer.len() < 2 * threshold {
        begin_load(shared, &mut state);
    }
    drop(state);

    for frame in &frames {
        stream_to_sinks(shared, frame);
    }
    points
}

fn stream_to_sinks(shared: &Shared, frame: &[Point]) {
    let rate = shared.config.points_rate;
    let mut sinks = shared.sinks.lock();
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.stream(frame, rate) {
            log::warn!(
                "Sink {} failed to stream {} points: {}",
                sink.name(),
                frame.len(),
                e
            );
        }
    }
}

/// Self-timed loop. Deadline based, so a slow tick does not shift later ones.
fn ticker_loop(shared: Arc<Shared>, running: Arc<AtomicBool>) {
    let interval = shared.config.tick_interval();
    log::debug!("Ticker running every {:?}", interval);

    let mut next = Instant::now();
    while running.load(Ordering::Relaxed) {
        tick_shared(&shared);

        next += interval;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            // Fell behind, resynchronize instead of bursting
            next = now;
        }
    }
    log::debug!("Ticker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::FnSource;
    use crate::core::types::Color;

    fn config(threshold: usize) -> StreamingConfig {
        StreamingConfig {
            points_rate: 30_000,
            buffer_threshold: threshold,
            ..Default::default()
        }
    }

    fn counting_source() -> Arc<dyn PointSource> {
        Arc::new(FnSource::new(|num| {
            (0..num)
                .map(|i| Point::new(i as f64 / num as f64, 0.0, Color::GREEN))
                .collect()
        }))
    }

    fn wait_idle(scheduler: &Scheduler) {
        let deadline = Instant::now() + std::time::Duration::from_secs(2);
        while scheduler.is_loading() && Instant::now() < deadline {
            thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    #[test]
    fn test_rejects_zero_rate() {
        let cfg = StreamingConfig {
            points_rate: 0,
            ..Default::default()
        };
        assert!(matches!(Scheduler::new(cfg), Err(Error::Config(_))));
    }

    #[test]
    fn test_fill_without_source_pads() {
        let scheduler = Scheduler::new(config(4)).unwrap();
        assert_eq!(scheduler.fill(6), vec![Point::PADDING; 6]);
        assert_eq!(scheduler.loads_completed(), 0);
    }

    #[test]
    fn test_fill_returns_exact_count() {
        let scheduler = Scheduler::new(config(4)).unwrap();
        scheduler.stream_from(counting_source());

        for num in [1, 7, 4, 13, 0] {
            assert_eq!(scheduler.fill(num).len(), num);
        }
        wait_idle(&scheduler);
        assert!(scheduler.buffered() < 3 * 4);
    }

    #[test]
    fn test_oversized_pull_is_truncated() {
        let scheduler = Scheduler::new(config(5)).unwrap();
        scheduler.stream_from(Arc::new(FnSource::new(|_| vec![Point::FALLBACK; 50])));
        let points = scheduler.fill(1);
        assert_eq!(points, vec![Point::FALLBACK]);
        wait_idle(&scheduler);
        assert!(scheduler.buffered() <= 3 * 5);
    }

    #[test]
    fn test_external_mode_requires_clock_master() {
        let mut scheduler = Scheduler::new(config(4)).unwrap();
        let result = scheduler.start_with_mode(ClockMode::ExternalClock);
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(scheduler.mode(), None);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut scheduler = Scheduler::new(config(4)).unwrap();
        scheduler.stop().unwrap();
        scheduler.stop().unwrap();
    }
}
