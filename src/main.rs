use gesture_capture::config::GestureConfig;
use gesture_capture::console_display;
use gesture_capture::coordinator;
use gesture_capture::jsonl_reader::SessionReader;
use gesture_capture::simulator;
use gesture_capture::types::*;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::thread;

#[derive(Parser)]
#[command(name = "gesture-capture")]
#[command(about = "Streaming melodic gesture recognizer for note events")]
struct Cli {
    /// JSON config file (missing keys use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulator demo: "basic" (default), "scales", or "improv" (algorithmic)
    #[arg(long, default_value = "basic")]
    demo: String,

    /// Replay a recorded JSONL note session instead of running a demo
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Play the source without sleeping between ticks
    #[arg(long)]
    fast: bool,

    /// Enable console display (terminal dashboard)
    #[arg(long)]
    console: bool,

    /// Console display refresh rate (Hz)
    #[arg(long, default_value_t = 20)]
    display_hz: u32,

    /// Override: minimum run length (exclusive) for a reported gesture
    #[arg(long)]
    run_threshold: Option<u32>,

    /// Override: ticks of silence before in-progress runs are flushed
    #[arg(long)]
    silence_ticks: Option<u64>,

    /// Override: history buffer capacity
    #[arg(long)]
    buffer_capacity: Option<usize>,

    /// Override: display-loop tick period (ms)
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Override: velocity below which notes are shown as ghost notes
    #[arg(long)]
    velocity_threshold: Option<u8>,

    /// Write the effective config to this path and continue
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl Cli {
    fn effective_config(&self) -> GestureConfig {
        let mut config = match &self.config {
            Some(path) => GestureConfig::load(path).unwrap_or_else(|| {
                warn!("Using default config");
                GestureConfig::default()
            }),
            None => GestureConfig::default(),
        };
        if let Some(v) = self.run_threshold {
            config.run_length_threshold = v;
        }
        if let Some(v) = self.silence_ticks {
            config.silence_window_ticks = v;
        }
        if let Some(v) = self.buffer_capacity {
            config.buffer_capacity = v;
        }
        if let Some(v) = self.tick_ms {
            config.tick_interval_ms = v;
        }
        if let Some(v) = self.velocity_threshold {
            config.velocity_threshold = v;
        }
        config
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let config = cli.effective_config();

    if let Some(path) = &cli.save_config {
        if let Err(e) = config.save(path) {
            error!("Failed to save config to {:?}: {}", path, e);
        }
    }

    info!("═══════════════════════════════════════════════");
    info!("  GESTURE CAPTURE v{}", env!("CARGO_PKG_VERSION"));
    info!("  Source: {}", match &cli.replay {
        Some(p) => format!("REPLAY {:?}", p),
        None => format!("SIMULATOR ({})", cli.demo),
    });
    info!("  Run threshold: >{}  Silence window: {} ticks  Tick: {}ms",
        config.run_length_threshold, config.silence_window_ticks, config.tick_interval_ms);
    if cli.console { info!("  UI: Console dashboard"); }
    info!("═══════════════════════════════════════════════");

    // Channel: source → coordinator
    let (input_tx, input_rx) = bounded::<InputEvent>(4096);

    // Channels: coordinator → consumers
    let mut report_txs: Vec<crossbeam_channel::Sender<GestureReport>> = Vec::new();

    let mut handles = Vec::new();

    // ─── Console display (opt-in) ───────────────────────────────────
    if cli.console {
        let (tx, rx) = bounded::<GestureReport>(256);
        report_txs.push(tx);
        let hz = cli.display_hz;
        let (vel, run) = (config.velocity_threshold, config.run_length_threshold);
        handles.push(thread::Builder::new().name("display".into()).spawn(move || {
            console_display::ConsoleDisplay::new(rx, hz).with_thresholds(vel, run).run();
        }).expect("spawn display thread"));
    }

    // ─── Gesture log (headless) ─────────────────────────────────────
    if !cli.console {
        let (tx, rx) = bounded::<GestureReport>(1024);
        report_txs.push(tx);
        handles.push(thread::Builder::new().name("gesture-log".into()).spawn(move || {
            for report in rx.iter() {
                for c in &report.emitted {
                    info!("t={:>6}  {}", report.snapshot.tick, c);
                }
            }
        }).expect("spawn gesture log thread"));
    }

    // ─── Coordinator ────────────────────────────────────────────────
    let coord_config = config.clone();
    let report_every_tick = cli.console;
    handles.push(thread::Builder::new().name("coordinator".into()).spawn(move || {
        let mut coord = coordinator::Coordinator::new(input_rx, report_txs, &coord_config)
            .with_report_every_tick(report_every_tick);
        coord.run();
    }).expect("spawn coordinator thread"));

    // ─── Input source ───────────────────────────────────────────────
    let source = simulator::Simulator::new(input_tx, config.tick_interval_ms)
        .with_realtime(!cli.fast);
    match &cli.replay {
        Some(path) => {
            let events = match File::open(path)
                .map_err(|e| format!("open {:?}: {}", path, e))
                .and_then(|f| SessionReader::open(BufReader::new(f)))
            {
                Ok(reader) => {
                    if let Some(ms) = reader.header.tick_ms {
                        if ms != config.tick_interval_ms {
                            warn!("Session recorded at {}ms ticks, playing at {}ms", ms, config.tick_interval_ms);
                        }
                    }
                    reader.read_all()
                }
                Err(e) => {
                    error!("Cannot replay session: {}", e);
                    Vec::new()
                }
            };
            info!("Replaying {} note events...", events.len());
            source.play(&events);
        }
        None => source.run(&cli.demo),
    }
    // Dropping the source closes the input channel; the pipeline drains and exits.
    drop(source);

    for h in handles {
        let _ = h.join();
    }
    info!("Done.");
}
