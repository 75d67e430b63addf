use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use featbench::{
    CsvReporter, CvImageLoader, DescriptorKind, DetectorKind, FrameBuffer, MatcherKind, Selector,
    Sweep, SweepConfig, Toolkit,
};

/// Benchmark keypoint detector / descriptor combinations on an image sequence.
#[derive(Parser, Debug)]
#[command(name = "featbench", version, about, long_about = None)]
struct Args {
    /// JSON sweep configuration. Flags below override its fields.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory the image prefix is resolved against
    #[arg(long, value_name = "DIR")]
    images: Option<PathBuf>,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    extension: Option<String>,
    /// First image index (inclusive)
    #[arg(long)]
    start: Option<usize>,
    /// Last image index (inclusive)
    #[arg(long)]
    end: Option<usize>,
    /// Digits in the zero padded image index
    #[arg(long)]
    fill_width: Option<usize>,
    /// CSV output file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Detectors to sweep, e.g. FAST,ORB
    #[arg(long, value_delimiter = ',')]
    detectors: Option<Vec<DetectorKind>>,
    /// Descriptors to sweep, e.g. BRIEF,SIFT
    #[arg(long, value_delimiter = ',')]
    descriptors: Option<Vec<DescriptorKind>>,
    /// MAT_BF or MAT_FLANN
    #[arg(long)]
    matcher: Option<MatcherKind>,
    /// SEL_NN or SEL_KNN
    #[arg(long)]
    selector: Option<Selector>,
    /// Keep at most this many keypoints per frame
    #[arg(long)]
    max_keypoints: Option<usize>,
    /// Keep keypoints from the whole frame instead of the vehicle region
    #[arg(long)]
    no_roi: bool,
    /// Log every pipeline stage
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<SweepConfig> {
        let mut cfg = match &self.config {
            Some(path) => SweepConfig::from_json_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => SweepConfig::default(),
        };
        if let Some(v) = self.images {
            cfg.images.base_path = v;
        }
        if let Some(v) = self.prefix {
            cfg.images.prefix = v;
        }
        if let Some(v) = self.extension {
            cfg.images.extension = v;
        }
        if let Some(v) = self.start {
            cfg.images.start_index = v;
        }
        if let Some(v) = self.end {
            cfg.images.end_index = v;
        }
        if let Some(v) = self.fill_width {
            cfg.images.fill_width = v;
        }
        if let Some(v) = self.output {
            cfg.output = v;
        }
        if let Some(v) = self.detectors {
            cfg.detectors = v;
        }
        if let Some(v) = self.descriptors {
            cfg.descriptors = v;
        }
        if let Some(v) = self.matcher {
            cfg.matcher = v;
        }
        if let Some(v) = self.selector {
            cfg.selector = v;
        }
        if self.max_keypoints.is_some() {
            cfg.keypoint_limit = self.max_keypoints;
        }
        if self.no_roi {
            cfg.roi = None;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = args.into_config()?;
    run(&config)
}

fn run(config: &SweepConfig) -> Result<()> {
    let loader = CvImageLoader::new(config.images.clone());
    let mut toolkit =
        Toolkit::opencv().context("Failed to create OpenCV detectors and extractors")?;
    let mut buffer = FrameBuffer::new(config.buffer_capacity);
    let mut reporter = CsvReporter::create(&config.output)
        .with_context(|| format!("Failed to create {}", config.output.display()))?;

    tracing::info!(
        images = config.images.len(),
        output = %config.output.display(),
        matcher = %config.matcher,
        selector = %config.selector,
        "starting sweep"
    );

    let summary = Sweep::new(config, &mut toolkit, &loader).run(&mut buffer, &mut reporter);

    println!("Errors : {}", summary.error_count());
    Ok(())
}
