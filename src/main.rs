use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use syncwall::media::{HeadlessSurface, ImageSequenceSource};
use syncwall::network::{OscConfigSender, OscReceiver, DEFAULT_CONTROL_PORT};
use syncwall::settings::{SettingsStore, XmlSettingsStore};
use syncwall::telemetry::{init_logging, LogConfig, LogFormat};
use syncwall::{App, NodeState};

#[derive(Parser, Debug)]
#[command(name = "syncwall", version, about = "Frame-synchronized video wall node")]
struct Cli {
    /// Settings file (default: <config dir>/syncwall/settings.xml).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// UDP port for inbound control messages.
    #[arg(long, default_value_t = DEFAULT_CONTROL_PORT)]
    port: u16,

    /// Viewport width of the headless surface.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Viewport height of the headless surface.
    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Ticks per second.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,

    /// Override the persisted frame history window.
    #[arg(long)]
    history_capacity: Option<usize>,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// JSON log lines on stderr.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        file_path: cli.log_file.clone(),
        format: if cli.log_json { LogFormat::Json } else { LogFormat::Text },
        ..LogConfig::default()
    };
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let mut store = match cli.settings {
        Some(path) => XmlSettingsStore::new(path),
        None => XmlSettingsStore::in_config_dir()?,
    };
    tracing::info!(path = %store.path().display(), "Settings file");

    let mut state = match store.load() {
        Ok(Some(document)) => NodeState::from_document(document),
        Ok(None) => NodeState::first_run(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load settings, using defaults");
            NodeState::first_run()
        }
    };
    if let Some(capacity) = cli.history_capacity {
        state.set_history_capacity(capacity);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("syncwall-net")
        .enable_all()
        .build()?;

    let mut receiver = OscReceiver::bind(
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port)),
        runtime.handle(),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                running.store(false, Ordering::SeqCst);
            }
        });
    }

    let mut app = App::new(
        state,
        ImageSequenceSource::new(),
        HeadlessSurface::new(cli.width, cli.height),
        Box::new(store),
        Box::new(OscConfigSender::new(runtime.handle().clone())),
    );

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(cli.fps));
    let mut next_tick = Instant::now();
    while running.load(Ordering::SeqCst) {
        app.tick(&mut receiver);

        next_tick += frame_interval;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            // Fell behind; don't try to catch up with a burst of ticks
            next_tick = now;
        }
    }

    drop(receiver);
    runtime.shutdown_timeout(Duration::from_secs(1));
    tracing::info!(ticks = app.tick_count(), "Stopped");
    Ok(())
}
