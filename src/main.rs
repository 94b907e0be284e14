//! Neurosense Agent CLI
//!
//! Real-time biosignal acquisition and gesture detection for consumer BCI
//! headsets.

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use neurosense_agent::{
    config::Config,
    core::{DiffPeak, FeatureExtractor, RearmPolicy, RmsAmplitude},
    pipeline::AcquisitionPipeline,
    stream::{SimulatedSource, SourceConfig, StreamKind},
    telemetry::create_shared_log_with_persistence,
    VERSION,
};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "neurosense")]
#[command(author = "Neurosense")]
#[command(version = VERSION)]
#[command(about = "Real-time biosignal gesture detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StreamArg {
    Eeg,
    Accelerometer,
}

impl From<StreamArg> for StreamKind {
    fn from(arg: StreamArg) -> Self {
        match arg {
            StreamArg::Eeg => StreamKind::Eeg,
            StreamArg::Accelerometer => StreamKind::Accelerometer,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeatureArg {
    /// Peak of the normalized first difference (shake detection)
    DiffPeak,
    /// Root-mean-square amplitude across the selected channels
    Rms,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RearmArg {
    /// Re-fire periodically while the signal stays above threshold
    Periodic,
    /// Require the signal to drop below threshold before re-arming
    OnRelease,
}

impl From<RearmArg> for RearmPolicy {
    fn from(arg: RearmArg) -> Self {
        match arg {
            RearmArg::Periodic => RearmPolicy::Periodic,
            RearmArg::OnRelease => RearmPolicy::OnRelease,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start acquiring and detecting gestures
    Start {
        /// Which headset stream to acquire
        #[arg(long, value_enum)]
        stream: Option<StreamArg>,

        /// Channel indices to analyze (comma-separated, stream order)
        #[arg(long, value_delimiter = ',')]
        channels: Option<Vec<usize>>,

        /// Detection threshold on the smoothed feature value
        #[arg(long)]
        threshold: Option<f64>,

        /// Raw sample buffer length in seconds
        #[arg(long)]
        buffer_length: Option<f64>,

        /// Analysis epoch length in seconds
        #[arg(long)]
        epoch_length: Option<f64>,

        /// Overlap between consecutive epochs in seconds
        #[arg(long)]
        overlap_length: Option<f64>,

        /// Number of epochs to average when smoothing
        #[arg(long)]
        smoothing: Option<usize>,

        /// Re-arm behavior under a sustained signal
        #[arg(long, value_enum)]
        rearm: Option<RearmArg>,

        /// Feature to extract per epoch
        #[arg(long, value_enum, default_value = "diff-peak")]
        feature: FeatureArg,

        /// Stop after this many seconds (0 = run until Ctrl+C)
        #[arg(long, default_value = "0")]
        duration: u64,

        /// Print the feature value every Nth epoch (0 = quiet)
        #[arg(long, default_value = "20")]
        print_every: u64,
    },

    /// Show current configuration and cumulative session statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            stream,
            channels,
            threshold,
            buffer_length,
            epoch_length,
            overlap_length,
            smoothing,
            rearm,
            feature,
            duration,
            print_every,
        } => {
            cmd_start(StartArgs {
                stream,
                channels,
                threshold,
                buffer_length,
                epoch_length,
                overlap_length,
                smoothing,
                rearm,
                feature,
                duration,
                print_every,
            });
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

struct StartArgs {
    stream: Option<StreamArg>,
    channels: Option<Vec<usize>>,
    threshold: Option<f64>,
    buffer_length: Option<f64>,
    epoch_length: Option<f64>,
    overlap_length: Option<f64>,
    smoothing: Option<usize>,
    rearm: Option<RearmArg>,
    feature: FeatureArg,
    duration: u64,
    print_every: u64,
}

fn cmd_start(args: StartArgs) {
    println!("Neurosense Agent v{VERSION}");
    println!();

    // Load configuration and apply CLI overrides
    let mut config = Config::load().unwrap_or_default();
    if let Some(stream) = args.stream {
        config.stream = stream.into();
    }
    if let Some(channels) = args.channels {
        config.channels = channels;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(buffer_length) = args.buffer_length {
        config.buffer_length_secs = buffer_length;
    }
    if let Some(epoch_length) = args.epoch_length {
        config.epoch_length_secs = epoch_length;
    }
    if let Some(overlap_length) = args.overlap_length {
        config.overlap_length_secs = overlap_length;
    }
    if let Some(smoothing) = args.smoothing {
        config.smoothing_epochs = smoothing;
    }
    if let Some(rearm) = args.rearm {
        config.rearm = rearm.into();
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    // Create the stream source (simulated; the physical driver is an
    // external collaborator)
    let mut source = SimulatedSource::new(SourceConfig {
        kind: config.stream,
        ..SourceConfig::default()
    });
    let info = source.info();

    let extractor: Box<dyn FeatureExtractor> = match args.feature {
        FeatureArg::DiffPeak => Box::new(DiffPeak),
        FeatureArg::Rms => Box::new(RmsAmplitude),
    };

    let mut pipeline = match AcquisitionPipeline::new(&config, &info, extractor) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("Starting acquisition...");
    println!("  Stream: {} ({} Hz, {} channels)", info.kind, info.sample_rate, info.channel_count);
    println!("  Channels: {:?}", config.channels);
    println!("  Feature: {}", pipeline.feature_name());
    println!("  Threshold: {}", config.threshold);
    println!(
        "  Buffer / epoch / shift: {}s / {}s / {}s",
        config.buffer_length_secs,
        config.epoch_length_secs,
        config.shift_length_secs()
    );
    println!("  Smoothing: {} epoch(s)", config.smoothing_epochs);
    println!("  Refractory: ~{} epoch(s)", pipeline.refractory_epochs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up session telemetry
    let log = create_shared_log_with_persistence(config.data_path.join("telemetry.json"));
    println!("Session ID: {}", log.session_id());
    println!("Device ID: {}", log.device_id());
    println!();

    // Wire Ctrl+C (and the optional duration limit) to the cancel token
    let token = pipeline.cancel_token();
    let ctrlc_token = token.clone();
    ctrlc::set_handler(move || {
        ctrlc_token.cancel();
    })
    .expect("Error setting Ctrl+C handler");

    if args.duration > 0 {
        let timer_token = token.clone();
        let limit = Duration::from_secs(args.duration);
        thread::spawn(move || {
            thread::sleep(limit);
            timer_token.cancel();
        });
    }

    if let Err(e) = source.start() {
        eprintln!("Error starting stream source: {e}");
        std::process::exit(1);
    }

    let print_every = args.print_every;
    let stream_name = info.kind;
    let run_result = pipeline.run(
        source.receiver(),
        &mut || {
            println!("[{}] Gesture detected on {stream_name}", Utc::now().format("%H:%M:%S%.3f"));
        },
        |epoch, value| {
            if print_every > 0 && epoch % print_every == 0 {
                println!("  epoch {epoch}: feature = {value:.4}");
            }
        },
        &log,
    );

    println!();
    println!("Stopping acquisition...");
    source.stop();

    let summary = match run_result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            std::process::exit(1);
        }
    };

    // Save session telemetry
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save session telemetry: {e}");
    }

    // Export detection records
    if !summary.detections.is_empty() {
        let export_path = config.export_path.join(format!(
            "detections_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));

        if let Some(parent) = export_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(&summary.detections) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&export_path, json) {
                    eprintln!("Error writing detection records: {e}");
                } else {
                    println!(
                        "Exported {} detection(s) to {:?}",
                        summary.detections.len(),
                        export_path
                    );
                }
            }
            Err(e) => {
                eprintln!("Error serializing detection records: {e}");
            }
        }
    } else {
        println!("No gestures detected this session.");
    }

    // Final stats
    println!();
    println!("{}", log.summary());
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Neurosense Agent Status");
    println!("=======================");
    println!();

    println!("Configuration:");
    println!("  Stream: {}", config.stream);
    println!("  Channels: {:?}", config.channels);
    println!("  Threshold: {}", config.threshold);
    println!(
        "  Buffer / epoch / shift: {}s / {}s / {}s",
        config.buffer_length_secs,
        config.epoch_length_secs,
        config.shift_length_secs()
    );
    println!("  Smoothing: {} epoch(s)", config.smoothing_epochs);
    println!();

    // Load and show cumulative telemetry if available
    let stats_path = config.data_path.join("telemetry.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(chunks) = stats.get("chunks_received") {
                    println!("  Chunks received: {chunks}");
                }
                if let Some(samples) = stats.get("samples_buffered") {
                    println!("  Samples buffered: {samples}");
                }
                if let Some(epochs) = stats.get("epochs_evaluated") {
                    println!("  Epochs evaluated: {epochs}");
                }
                if let Some(gestures) = stats.get("gestures_detected") {
                    println!("  Gestures detected: {gestures}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
