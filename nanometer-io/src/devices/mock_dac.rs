//! Software clock master
//!
//! Emulates a DAC with its own crystal: a named thread pulls `batch_size`
//! points every `batch_size / rate` seconds through the scheduler callback.
//! Lets external-clock mode run end to end without hardware.

use crate::core::sink::{ClockMaster, PullCallback};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pull counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DacStats {
    pub batches: u64,
    pub points: u64,
    /// Callbacks that returned a different count than requested
    pub short_batches: u64,
}

pub struct MockDac {
    batch_size: usize,
    stats: Arc<Mutex<DacStats>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockDac {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            stats: Arc::new(Mutex::new(DacStats::default())),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn stats(&self) -> Arc<Mutex<DacStats>> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl ClockMaster for MockDac {
    fn name(&self) -> &str {
        "mock_dac"
    }

    fn stream_points(&mut self, rate: u32, mut callback: PullCallback) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::Config("mock_dac is already streaming".to_string()));
        }
        if rate == 0 {
            return Err(Error::InvalidParameter("rate must be positive".to_string()));
        }

        let batch_size = self.batch_size;
        let period = Duration::from_secs_f64(batch_size as f64 / rate as f64);
        let stats = Arc::clone(&self.stats);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("mock-dac".to_string())
            .spawn(move || {
                log::info!("Mock DAC pulling {} points every {:?}", batch_size, period);
                let mut next = Instant::now();
                while running.load(Ordering::Relaxed) {
                    let points = callback(batch_size);
                    {
                        let mut stats = stats.lock();
                        stats.batches += 1;
                        stats.points += points.len() as u64;
                        if points.len() != batch_size {
                            stats.short_batches += 1;
                        }
                    }

                    next += period;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else {
                        next = now;
                    }
                }
                log::info!("Mock DAC stopped");
            });

        match handle {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(Error::Io(e))
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| Error::Other("mock DAC thread panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for MockDac {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
