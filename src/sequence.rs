use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{BenchErr, BenchResult};

/// Supplies the images of a sweep, addressed by position `0..len()`.
pub trait FrameSource<I> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load and decode the `position`-th image as grayscale.
    fn load(&self, position: usize) -> BenchResult<I>;
}

/// In-memory frames, mostly for tests and synthetic runs.
impl<I: Clone> FrameSource<I> for Vec<I> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn load(&self, position: usize) -> BenchResult<I> {
        self.get(position)
            .cloned()
            .ok_or_else(|| BenchErr::Backend(format!("no frame at position {}", position)))
    }
}

/// An indexed image sequence on disk:
/// `base_path/<prefix><zero padded index><extension>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSequence {
    pub base_path: PathBuf,
    pub prefix: String,
    pub extension: String,
    /// First file index, inclusive.
    pub start_index: usize,
    /// Last file index, inclusive.
    pub end_index: usize,
    /// Number of digits the index is padded to.
    pub fill_width: usize,
}

impl Default for ImageSequence {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("images"),
            prefix: "KITTI/2011_09_26/image_00/data/000000".to_string(),
            extension: ".png".to_string(),
            start_index: 0,
            end_index: 9,
            fill_width: 4,
        }
    }
}

impl ImageSequence {
    /// Number of images in the closed index interval. Zero when
    /// `end_index < start_index`.
    pub fn len(&self) -> usize {
        if self.end_index < self.start_index {
            0
        } else {
            self.end_index - self.start_index + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the `position`-th image, counting from `start_index`.
    pub fn path_for(&self, position: usize) -> PathBuf {
        let index = self.start_index + position;
        let name = format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.extension,
            width = self.fill_width
        );
        self.base_path.join(name)
    }

    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (0..self.len()).map(move |p| self.path_for(p))
    }
}
