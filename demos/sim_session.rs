//! Demonstration of the Neurosense acquisition pipeline.
//!
//! This example shows how to:
//! 1. Create and start a simulated headset stream
//! 2. Build an acquisition pipeline from a configuration
//! 3. React to gesture detections through a sink
//! 4. Inspect session telemetry afterwards
//!
//! Run with: cargo run --example sim_session
//!
//! The simulated accelerometer injects a shake burst every few seconds, so
//! detections appear without any hardware attached.

use std::thread;
use std::time::Duration;

use neurosense_agent::{
    config::Config,
    core::DiffPeak,
    pipeline::AcquisitionPipeline,
    stream::{SimulatedSource, SourceConfig, StreamKind},
    telemetry::create_shared_log,
    VERSION,
};

fn main() {
    println!("Neurosense Agent - Simulated Session Demo");
    println!("=========================================");
    println!();
    println!("Version: {VERSION}");
    println!();

    let config = Config {
        stream: StreamKind::Accelerometer,
        channels: vec![0],
        buffer_length_secs: 1.5,
        epoch_length_secs: 1.0,
        overlap_length_secs: 0.95,
        threshold: 0.25,
        smoothing_epochs: 1,
        ..Config::default()
    };

    let mut source = SimulatedSource::new(SourceConfig {
        kind: config.stream,
        chunk_size: 12,
        burst_every_chunks: 40,
    });
    let info = source.info();

    println!(
        "Stream: {} ({} Hz, {} channels)",
        info.kind, info.sample_rate, info.channel_count
    );
    println!(
        "Detector: threshold {}, buffer {}s, shift {}s",
        config.threshold,
        config.buffer_length_secs,
        config.shift_length_secs()
    );
    println!();
    println!("Running for 30 seconds; watch for shake detections...");
    println!();

    let mut pipeline = AcquisitionPipeline::new(&config, &info, Box::new(DiffPeak))
        .expect("default demo configuration is valid");
    let log = create_shared_log();

    // Stop the run after 30 seconds; Ctrl+C also works.
    let token = pipeline.cancel_token();
    let ctrlc_token = token.clone();
    ctrlc::set_handler(move || {
        ctrlc_token.cancel();
    })
    .expect("Error setting Ctrl+C handler");

    let timer_token = token.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(30));
        timer_token.cancel();
    });

    if let Err(e) = source.start() {
        eprintln!("Error starting source: {e}");
        return;
    }

    let mut detections = 0u32;
    let summary = pipeline
        .run(
            source.receiver(),
            &mut || {
                detections += 1;
                println!("  >>> shake detected!");
            },
            |epoch, value| {
                if epoch % 20 == 0 {
                    println!("  epoch {epoch}: diff-peak = {value:.4}");
                }
            },
            &log,
        )
        .expect("pipeline run failed");

    source.stop();

    println!();
    println!("=== Session Complete ===");
    println!("Epochs evaluated: {}", summary.epochs_evaluated);
    println!("Detections: {detections}");
    for record in &summary.detections {
        println!(
            "  epoch {} at {} (value {:.3})",
            record.epoch_index,
            record.timestamp.format("%H:%M:%S%.3f"),
            record.value
        );
    }
    println!();
    println!("{}", log.summary());
    println!();
    println!("Demo complete!");
}
