//! Facelamp CLI
//!
//! Usage:
//!   facelamp --host 192.168.1.12              # Probe device, then watch the camera
//!   facelamp --probe                          # Connectivity test only
//!   facelamp --simulate-device --addr 0.0.0.0:8000   # Fake LED controller
//!   facelamp --config lamp.json --json        # Config file, JSON transition log

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use facelamp::core::{run_device_server, DeviceClient, HttpDispatcher, LoopSummary};
use facelamp::types::StepOutput;
use facelamp::{LampConfig, SHUTDOWN_GRACE_MS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "facelamp",
    version = VERSION,
    about = "Switch a networked LED on while a face is in front of the camera",
    long_about = "Facelamp watches the webcam for faces and drives an LED controller\n\
                  over HTTP (GET /led/on, GET /led/off).\n\n\
                  A face counts only if its mean brightness is strictly between\n\
                  30 and 220. After every switch the lamp holds its state for the\n\
                  cooldown period, so brief flicker is ignored. On exit the lamp\n\
                  is always switched off.\n\n\
                  Modes:\n  \
                  (default)          Probe device, then run the camera loop\n  \
                  --probe            Probe device only\n  \
                  --simulate-device  Serve a fake LED controller"
)]
struct Args {
    /// LED controller host, optionally with port
    #[arg(long)]
    host: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum time between two LED commands (milliseconds)
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Camera index tried first
    #[arg(long)]
    camera: Option<i32>,

    /// Haar cascade XML file
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Do not open the preview window
    #[arg(long)]
    no_preview: bool,

    /// Only run the connectivity probe
    #[arg(long)]
    probe: bool,

    /// Run a simulated LED controller instead of the detector
    #[arg(long)]
    simulate_device: bool,

    /// Listen address for --simulate-device
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: String,

    /// Print transitions as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    if args.simulate_device {
        run_simulator(&args).await;
        return Ok(());
    }

    let config = build_config(&args)?;
    let client = Arc::new(DeviceClient::from_config(&config)?);

    print_header(&config);

    if !probe_device(&client).await {
        std::process::exit(1);
    }
    if args.probe {
        return Ok(());
    }

    run_detector(config, client, args.json).await
}

/// Defaults, then config file, then CLI flags
fn build_config(args: &Args) -> facelamp::Result<LampConfig> {
    let mut config = match &args.config {
        Some(path) => LampConfig::load(path)?,
        None => LampConfig::default(),
    };

    if let Some(host) = &args.host {
        config.device_host = host.clone();
    }
    if let Some(ms) = args.cooldown_ms {
        config.cooldown_ms = ms;
    }
    if let Some(index) = args.camera {
        config.camera_index = index;
    }
    if let Some(path) = &args.cascade {
        config.cascade_path = Some(path.clone());
    }
    if args.no_preview {
        config.preview = false;
    }

    config.validate()?;
    Ok(config)
}

/// Print header
fn print_header(config: &LampConfig) {
    println!("{}", "==================================================".bold());
    println!("{}", format!("  Facelamp v{} - face presence LED", VERSION).bold());
    println!("  Device:   {}", config.base_url());
    println!("  Cooldown: {:.1}s", config.cooldown_ms as f64 / 1000.0);
    println!("  Press 'q' in the preview window or Ctrl-C to quit");
    println!("{}", "==================================================".bold());
    println!();
}

/// Startup probe; prints the remediation checklist on failure
async fn probe_device(client: &DeviceClient) -> bool {
    println!("Testing connection to {}...", client.host());
    match client.probe().await {
        Ok(()) => {
            println!("{}", format!("✓ Device reachable (host: {})", client.host()).green());
            true
        }
        Err(e) => {
            println!("{}", format!("✗ Cannot reach device (host: {})", client.host()).red());
            println!("  {}", e.to_string().dimmed());
            println!("Please check that:");
            println!("  1. The LED controller is on the same WiFi network");
            println!("  2. The IP address is correct");
            println!("  3. The web server firmware has been uploaded to the controller");
            false
        }
    }
}

/// Camera loop on a blocking thread; commands go out on the async runtime
async fn run_detector(config: LampConfig, client: Arc<DeviceClient>, json: bool) -> anyhow::Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let dispatcher = HttpDispatcher::on_current_runtime(client);
    let sink = dispatcher.clone();
    let loop_stop = Arc::clone(&stop);

    let summary = tokio::task::spawn_blocking(move || run_camera_loop(&config, sink, &loop_stop, json)).await??;
    print_summary(&summary);

    // Give the final OFF a chance to reach the device
    if !dispatcher.wait_idle(Duration::from_millis(SHUTDOWN_GRACE_MS)).await {
        warn!("exiting with LED commands still in flight");
    }
    let counts = dispatcher.counts();
    info!(
        submitted = counts.submitted,
        delivered = counts.succeeded,
        failed = counts.failed,
        "dispatcher finished"
    );
    println!("Exited.");
    Ok(())
}

#[cfg(feature = "opencv")]
fn run_camera_loop(
    config: &LampConfig,
    sink: HttpDispatcher,
    stop: &AtomicBool,
    json: bool,
) -> facelamp::Result<LoopSummary> {
    use facelamp::core::{CameraSource, CascadeDetector, PresenceLoop, Preview, PreviewWindow};

    let detector = CascadeDetector::load(config.cascade_path.as_deref())?;
    let camera = CameraSource::open(config)?;
    info!(index = camera.index(), "camera opened");

    let mut window = if config.preview {
        Some(PreviewWindow::open(camera.fps())?)
    } else {
        None
    };
    let preview = window.as_mut().map(|w| w as &mut dyn Preview);

    let presence = PresenceLoop::new(camera, detector, sink, config);
    let mut report = |output: &StepOutput| report_step(output, json);
    Ok(presence.run(stop, preview, &mut report))
}

#[cfg(not(feature = "opencv"))]
fn run_camera_loop(
    _config: &LampConfig,
    _sink: HttpDispatcher,
    _stop: &AtomicBool,
    _json: bool,
) -> facelamp::Result<LoopSummary> {
    Err(facelamp::LampError::DetectorInit(
        "camera and face detection need the `opencv` feature (cargo build --features opencv)".into(),
    ))
}

/// Print transitions only; steady frames are left to debug logging
#[cfg_attr(not(feature = "opencv"), allow(dead_code))]
fn report_step(output: &StepOutput, json: bool) {
    if !output.is_transition() {
        return;
    }
    if json {
        match serde_json::to_string(output) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "could not serialize step"),
        }
    } else if colored::control::SHOULD_COLORIZE.should_colorize() {
        println!("{}", output.to_terminal_string());
    } else {
        println!("{}", output.to_parseable_string());
    }
}

fn print_summary(summary: &LoopSummary) {
    println!();
    println!(
        "Frames read: {} | processed: {} | capture failures: {} | detector failures: {} | commands: {}",
        summary.frames_read,
        summary.frames_processed,
        summary.capture_failures,
        summary.detector_failures,
        summary.commands_submitted
    );
}

/// Run simulated LED controller
async fn run_simulator(args: &Args) {
    println!();
    println!("{}", "==================================================".bold());
    println!("{}", "  Facelamp simulated LED controller".bold());
    println!("  Listening on http://{}", args.addr);
    println!("{}", "==================================================".bold());
    println!();

    if let Err(e) = run_device_server(&args.addr).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
