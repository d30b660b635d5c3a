//! Loopback demo - daemon and point source in one process, 5 seconds
//!
//! Sequence:
//! 1. Bind the point server on an ephemeral loopback port
//! 2. Start the scheduler with a monitor sink and the mock DAC clock master
//! 3. Connect a client serving a slowly rotating square
//! 4. Stream, then report what the DAC pulled
//!
//! ```sh
//! RUST_LOG=info cargo run --example loopback
//! ```

use nanometer_io::devices::{MockDac, MonitorSink};
use nanometer_io::protocol::{Serializer, WireFormat};
use nanometer_io::{
    Color, FnProvider, Point, PointClient, PointServer, Scheduler, StreamingConfig,
};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== Nanometer loopback demo (5s) ===");

    // === 1. Point server ===
    let server = PointServer::bind("127.0.0.1:0", Serializer::new(WireFormat::Postcard))?;
    let addr = server.local_addr();

    // === 2. Scheduler with devices ===
    let mut scheduler = Scheduler::new(StreamingConfig::default())?;
    let monitor = MonitorSink::new();
    let monitor_stats = monitor.stats();
    let dac = MockDac::new(500);
    let dac_stats = dac.stats();
    scheduler.use_sink(Box::new(monitor));
    scheduler.use_clock_master(Box::new(dac))?;
    scheduler.stream_from(server.session());
    let mode = scheduler.start()?;
    log::info!("   ✓ Scheduler running in {:?} mode", mode);

    // === 3. Point source ===
    let running = Arc::new(AtomicBool::new(true));
    let client_running = Arc::clone(&running);
    let client = thread::spawn(move || -> nanometer_io::Result<u64> {
        let mut client = PointClient::connect(
            &addr.to_string(),
            Duration::from_secs(1),
            WireFormat::Postcard,
        )?;
        let mut phase = 0.0f64;
        client.attach_provider(Box::new(FnProvider::new(move |num| {
            (0..num)
                .map(|i| {
                    let t = (i % 400) as f64 / 400.0;
                    phase += 1e-5;
                    let corner = (t * 4.0).floor() * TAU / 4.0 + phase;
                    Point::new(0.5 * corner.cos(), 0.5 * corner.sin(), Color::GREEN)
                })
                .collect()
        })));
        client.run(&client_running)?;
        Ok(client.served())
    });

    // === 4. Stream ===
    thread::sleep(Duration::from_secs(5));
    running.store(false, Ordering::SeqCst);
    scheduler.stop()?;

    let served = client.join().map_err(|_| "client thread panicked")??;
    let dac = *dac_stats.lock();
    let monitor = monitor_stats.lock();
    log::info!("   ✓ Client answered {} requests", served);
    log::info!(
        "   ✓ DAC pulled {} points in {} batches ({} short)",
        dac.points,
        dac.batches,
        dac.short_batches
    );
    log::info!(
        "   ✓ Monitor saw {} frames, {} lit points",
        monitor.frames,
        monitor.lit_points
    );
    Ok(())
}
