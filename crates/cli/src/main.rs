//! Headless batch driver for the fire-event pipeline

mod files;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use fire_events_core::{DateWindow, PipelineConfig, PipelineService};
use geo::{coord, Rect};
use tracing::error;
use tracing_subscriber::EnvFilter;

use files::{load_config, load_regions, JsonDetectionFile, JsonEventStore};

/// Cluster fire detections into events and persist the new large ones
#[derive(Parser, Debug)]
#[command(name = "fire-events")]
#[command(about = "Wildfire event pipeline over projected thermal-anomaly detections", long_about = None)]
struct Args {
    /// JSON array of projected detections
    #[arg(short, long)]
    detections: PathBuf,

    /// JSON array of administrative regions, in priority order
    #[arg(short, long)]
    regions: PathBuf,

    /// JSON event store (created if missing)
    #[arg(short, long)]
    store: PathBuf,

    /// JSON pipeline configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First acquisition date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last acquisition date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Projected bounding box: min_x,min_y,max_x,max_y
    #[arg(long, value_delimiter = ',', num_args = 4, allow_negative_numbers = true)]
    bbox: Option<Vec<f64>>,

    /// Maximum day gap between linked detections
    #[arg(long)]
    time_lag_days: Option<i64>,

    /// Maximum distance between linked detections (projected units)
    #[arg(long)]
    distance_threshold: Option<f64>,

    /// Minimum detections for a group to become an event
    #[arg(long)]
    min_event_detections: Option<usize>,

    /// Area in hectares at which an event is persisted
    #[arg(long)]
    large_event_threshold_ha: Option<f64>,

    /// Print the service status after the run
    #[arg(long)]
    status: bool,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig, files::FileError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(days) = self.time_lag_days {
            config.time_lag_days = days;
        }
        if let Some(distance) = self.distance_threshold {
            config.distance_threshold = distance;
        }
        if let Some(count) = self.min_event_detections {
            config.min_event_detections = count;
        }
        if let Some(threshold) = self.large_event_threshold_ha {
            config.large_event_threshold_ha = threshold;
        }
        Ok(config)
    }

    fn bounding_box(&self) -> Rect<f64> {
        match self.bbox.as_deref() {
            Some(&[min_x, min_y, max_x, max_y]) => {
                Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y })
            }
            _ => Rect::new(
                coord! { x: f64::MIN, y: f64::MIN },
                coord! { x: f64::MAX, y: f64::MAX },
            ),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to render output"),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = match args.pipeline_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let regions = match load_regions(&args.regions) {
        Ok(regions) => regions,
        Err(e) => {
            error!(error = %e, "cannot load administrative regions");
            return ExitCode::FAILURE;
        }
    };

    let service = PipelineService::new(
        JsonDetectionFile::new(&args.detections),
        JsonEventStore::new(&args.store),
        regions,
        config,
    );

    let summary = service.run(DateWindow::new(args.start, args.end), args.bounding_box());
    print_json(&summary);

    if args.status {
        print_json(&service.status());
    }

    if summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
