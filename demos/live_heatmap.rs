//! Live heat-map demo
//!
//! Feeds synthetic activity from a producer thread into a heat-map view and
//! rewrites an SVG file every time the scene changes.

use activity_heatmap::ingest::DEFAULT_CHANNEL_CAPACITY;
use activity_heatmap::{
    logging, ChannelSource, Config, HeatmapView, IngestionLoop, RawActivityEvent, SystemClock,
    VERSION,
};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "live-heatmap")]
#[command(version = VERSION)]
#[command(about = "Render a live activity heat-map to SVG", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the rendered SVG
    #[arg(long, short, default_value = "heatmap.svg")]
    output: PathBuf,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<f64>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<f64>,

    /// Ingestion period in seconds
    #[arg(long)]
    period: Option<u64>,

    /// Synthetic events produced per second
    #[arg(long, default_value = "2")]
    rate: u32,
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Warning: could not load config ({e}), using defaults");
        Config::default()
    });
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(period) = cli.period {
        config.ingest_period = Duration::from_secs(period.max(1));
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        eprintln!("Error setting Ctrl+C handler: {e}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };

    let local = tokio::task::LocalSet::new();
    if let Err(e) = local.block_on(&runtime, run(cli, config, running)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Spacing between synthetic events for `rate` events per second.
fn producer_step(rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate.max(1)))
}

async fn run(
    cli: Cli,
    config: Config,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = HeatmapView::new(config, Utc::now())?;
    println!("Activity heat-map v{VERSION}");
    println!("Writing to {} (Ctrl+C to stop)", cli.output.display());

    let view = Rc::new(RefCell::new(view));
    let output = cli.output.clone();
    view.borrow_mut().on_render(move |scene| {
        if let Err(e) = std::fs::write(&output, scene.to_svg()) {
            eprintln!("Warning: failed to write {}: {e}", output.display());
        }
    });

    let (sender, source) = ChannelSource::bounded(DEFAULT_CHANNEL_CAPACITY);
    let producer_running = running.clone();
    let rate = cli.rate;
    let producer = thread::spawn(move || {
        let step = producer_step(rate);
        let mut phase = 0.0f64;
        while producer_running.load(Ordering::SeqCst) {
            let end = Utc::now();
            let start = end - ChronoDuration::from_std(step).unwrap_or(ChronoDuration::zero());
            phase += 0.05;
            let event = RawActivityEvent {
                category: if phase.sin() > 0.0 { "typing" } else { "pointer" }.to_string(),
                start_time: start,
                end_time: end,
                intensity: 0.5 + 0.45 * phase.sin() * (phase * 0.3).cos(),
                confidence: 0.9,
                metrics: BTreeMap::new(),
            };
            if sender.send(event).is_err() {
                break;
            }
            thread::sleep(step);
        }
    });

    let mut handle = IngestionLoop::spawn(view.clone(), source, SystemClock);
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    handle.stop();
    // The producer observes the cleared flag within one step
    let _ = producer.join();

    println!();
    println!("{}", view.borrow().stats().summary());
    Ok(())
}
