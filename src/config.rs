use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    frame::DEFAULT_CAPACITY, BenchResult, DescriptorKind, DetectorKind, ImageSequence,
    MatcherKind, Roi, Selector,
};

/// Everything that parameterizes a sweep. Missing JSON fields fall back to
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub images: ImageSequence,
    /// Frames held in memory at once.
    pub buffer_capacity: usize,
    /// Keypoints outside this rectangle are discarded. `None` keeps all.
    pub roi: Option<Roi>,
    /// Cap on keypoints per frame, applied after the region filter.
    pub keypoint_limit: Option<usize>,
    pub detectors: Vec<DetectorKind>,
    pub descriptors: Vec<DescriptorKind>,
    pub matcher: MatcherKind,
    pub selector: Selector,
    pub output: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            images: ImageSequence::default(),
            buffer_capacity: DEFAULT_CAPACITY,
            roi: Some(Roi::VEHICLE),
            keypoint_limit: None,
            detectors: DetectorKind::ALL.to_vec(),
            descriptors: DescriptorKind::SWEEP.to_vec(),
            matcher: MatcherKind::BruteForce,
            selector: Selector::KNearest,
            output: PathBuf::from("results/data.csv"),
        }
    }
}

impl SweepConfig {
    pub fn from_json_str(json: &str) -> BenchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> BenchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
