//! Voxguard - live-call deepfake voice monitoring
//!
//! Run with `voxguard` or `voxguard monitor` to start the monitoring loop.
//! Use `voxguard detect <file>` to analyze a single audio file.
//! Use `voxguard config` to print the effective configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voxguard::detect::create_detector;
use voxguard::monitor::{AnalysisEvent, AudioChunk, MonitorController, MonitorEvent};
use voxguard::Config;

#[derive(Parser)]
#[command(name = "voxguard")]
#[command(author, version, about = "Live-call deepfake voice monitoring")]
#[command(long_about = "
Voxguard continuously samples microphone audio in fixed-size windows,
submits each window to a remote deepfake-detection service, and reports
the verdicts in real time.

USAGE:
  Run `voxguard` to start monitoring the default input device.
  Press Ctrl+C to stop. Each 5-second window is analyzed independently;
  a network hiccup on one window never stops the session.
")]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Override the analysis window size in milliseconds
    #[arg(long, value_name = "MS")]
    window_ms: Option<u64>,

    /// Override the audio input device
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,

    /// Override the detection endpoint URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor the live audio source (default if no command specified)
    Monitor,

    /// Analyze a single audio file (WAV)
    Detect {
        /// Path to audio file
        file: PathBuf,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("voxguard={}", log_level))),
        )
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    // CLI overrides (highest priority)
    if let Some(window_ms) = cli.window_ms {
        config.monitor.window_ms = window_ms;
    }
    if let Some(device) = cli.device {
        config.audio.device = device;
    }
    if let Some(endpoint) = cli.endpoint {
        config.detector.endpoint = endpoint;
    }
    config.validate()?;

    match cli.command.unwrap_or(Commands::Monitor) {
        Commands::Monitor => run_monitor(config).await,
        Commands::Detect { file } => run_detect(config, file).await,
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Run the monitoring loop until Ctrl+C
async fn run_monitor(config: Config) -> anyhow::Result<()> {
    let controller = MonitorController::from_config(&config)?;

    controller.on_lifecycle(|event| match event {
        MonitorEvent::Started { info } => {
            tracing::info!("Session started: {}", info.source_label);
        }
        MonitorEvent::Stopped { info } => {
            tracing::info!("Session stopped: {}", info.source_label);
        }
    });

    controller.on_result(|event| match event {
        AnalysisEvent::Verdict { seq, verdict } => {
            if verdict.is_synthetic {
                println!(
                    "⚠ chunk {}: SYNTHETIC voice detected ({:.1}% confidence)",
                    seq, verdict.confidence
                );
            } else {
                println!(
                    "✓ chunk {}: authentic ({:.1}% confidence)",
                    seq, verdict.confidence
                );
            }
        }
        AnalysisEvent::Failed { seq, error } => {
            eprintln!("✗ chunk {}: analysis failed: {}", seq, error);
        }
    });

    controller.start().await?;
    tracing::info!("Monitoring... press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    controller.stop().await?;
    // Let any still-running classifications deliver their results
    controller.join_in_flight().await;

    Ok(())
}

/// One-shot analysis of an audio file
async fn run_detect(config: Config, file: PathBuf) -> anyhow::Result<()> {
    let data = std::fs::read(&file)?;
    let detector = create_detector(&config.detector)?;

    let chunk = AudioChunk {
        seq: 0,
        data,
        mime: "audio/wav".to_string(),
        captured_at_ms: chrono::Utc::now().timestamp_millis(),
    };

    let verdict = tokio::task::spawn_blocking({
        let detector = Arc::clone(&detector);
        move || detector.detect(&chunk)
    })
    .await??;

    println!("File: {}", file.display());
    println!(
        "Verdict: {}",
        if verdict.is_synthetic {
            "SYNTHETIC (deepfake)"
        } else {
            "authentic"
        }
    );
    println!("Confidence: {:.1}%", verdict.confidence);
    if !verdict.raw_message.is_empty() {
        println!("Message: {}", verdict.raw_message);
    }

    Ok(())
}
