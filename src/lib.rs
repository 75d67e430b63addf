use std::time::{Duration, Instant};
use thiserror::Error;

/// Keypoints, matches and descriptor rows shared by every pipeline stage.
pub mod keypoint;
pub use keypoint::{Descriptors, ElementType, Keypoint, Match};

/// Closed sets of detector and descriptor names.
pub mod kinds;
pub use kinds::{DescriptorClass, DescriptorKind, DetectorKind};

/// Which detector/descriptor pairs are allowed to run together.
pub mod compat;

/// Frames and the fixed-capacity ring buffer that holds them.
pub mod frame;
pub use frame::{Frame, FrameBuffer};

/// Region of interest and keypoint count limiting.
pub mod filter;
pub use filter::Roi;

/// Harris candidate extraction and overlap based non-maximum suppression.
pub mod corners;

/// Descriptor matching between two frames.
pub mod matcher;
pub use matcher::{MatchError, Matcher, MatcherKind, Selector};

/// Detector and extractor capability traits and their lookup table.
pub mod toolkit;
pub use toolkit::{DescriptorExtractor, KeypointDetector, Toolkit};

/// Indexed image file naming and the frame source seam.
pub mod sequence;
pub use sequence::{FrameSource, ImageSequence};

/// Per-frame metric records and the CSV writer.
pub mod report;
pub use report::{CsvReporter, MetricRecord};

/// Sweep configuration.
pub mod config;
pub use config::SweepConfig;

/// The detector x descriptor sweep.
pub mod sweep;
pub use sweep::{PairOutcome, Sweep, SweepSummary};

/// OpenCV backed detectors, extractors and image loading.
#[cfg(feature = "opencv")]
pub mod opencv_utils;
#[cfg(feature = "opencv")]
pub use opencv_utils::*;

/// Run `f` and return its result together with the wall-clock time it took.
pub fn timed<T, F: FnOnce() -> T>(f: F) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Duration in fractional milliseconds, as written to the CSV and the logs.
pub fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.
}

pub type BenchResult<T> = std::result::Result<T, BenchErr>;

#[derive(Error, Debug)]
pub enum BenchErr {
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config Error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Unknown detector: {0}")]
    UnknownDetector(String),
    #[error("Unknown descriptor: {0}")]
    UnknownDescriptor(String),
    #[error("Unknown matcher or selector: {0}")]
    UnknownMatcher(String),
    #[error("No {0} registered in toolkit")]
    NotRegistered(String),
    #[error("Could not load image {}", .0.display())]
    ImageLoad(std::path::PathBuf),
    #[error("Backend error: {0}")]
    Backend(String),
    #[cfg(feature = "opencv")]
    #[error("Opencv Error: {0}")]
    OpenCvInternal(#[from] opencv::Error),
    #[cfg(feature = "opencv")]
    #[error("Opencv Descriptor decode error")]
    OpenCvDecode,
}
