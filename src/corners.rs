use crate::Keypoint;

/// Parameters of the Harris corner response detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarrisParams {
    /// Neighbourhood considered around every pixel.
    pub block_size: i32,
    /// Sobel aperture, must be odd.
    pub aperture: i32,
    /// Harris free parameter.
    pub k: f64,
    /// Minimum value in the response map scaled to `0..=255`.
    pub min_response: i32,
    /// Overlap above which two keypoints compete during suppression.
    pub max_overlap: f32,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            block_size: 2,
            aperture: 3,
            k: 0.04,
            min_response: 100,
            max_overlap: 0.,
        }
    }
}

/// Parameters of the Shi-Tomasi good-features-to-track detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiTomasiParams {
    pub block_size: i32,
    /// Permissible overlap between two corners, as a fraction.
    pub max_overlap: f64,
    pub quality_level: f64,
    pub k: f64,
}

impl Default for ShiTomasiParams {
    fn default() -> Self {
        Self {
            block_size: 4,
            max_overlap: 0.,
            quality_level: 0.01,
            k: 0.04,
        }
    }
}

impl ShiTomasiParams {
    pub fn min_distance(&self) -> f64 {
        (1. - self.max_overlap) * self.block_size as f64
    }

    /// Upper bound on returned corners for an image of the given size.
    pub fn max_corners(&self, rows: usize, cols: usize) -> i32 {
        ((rows * cols) as f64 / self.min_distance().max(1.)) as i32
    }
}

/// Row-major per-pixel corner response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ResponseMap {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), width * height, "response map size mismatch");
        Self {
            width,
            height,
            data,
        }
    }

    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Linearly rescale so the minimum maps to `lo` and the maximum to `hi`.
    /// A flat map becomes all `lo`. Raw Harris responses can be tiny, so any
    /// positive range is stretched.
    pub fn normalized(&self, lo: f32, hi: f32) -> ResponseMap {
        let (min, max) = self
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(a, b), &v| (a.min(v), b.max(v)));
        let range = max - min;
        let data = if self.data.is_empty() || range <= 0. || !range.is_finite() {
            vec![lo; self.data.len()]
        } else {
            let scale = (hi - lo) / range;
            self.data.iter().map(|&v| lo + (v - min) * scale).collect()
        };
        ResponseMap::new(self.width, self.height, data)
    }
}

/// Turn a normalized response map into Harris keypoints.
///
/// Pixels are visited row by row. Every pixel whose truncated response
/// exceeds `min_response` becomes a candidate of diameter `2 * aperture`,
/// then goes through [`suppress`].
pub fn harris_keypoints(map: &ResponseMap, params: &HarrisParams) -> Vec<Keypoint> {
    let mut keypoints = Vec::new();
    for y in 0..map.height {
        for x in 0..map.width {
            let response = map.at(x, y) as i32;
            if response > params.min_response {
                let candidate = Keypoint::new(x as f32, y as f32, 2. * params.aperture as f32)
                    .with_response(response as f32);
                suppress(&mut keypoints, candidate, params.max_overlap);
            }
        }
    }
    keypoints
}

/// Non-maximum suppression step for one candidate.
///
/// The candidate is compared with the accepted keypoints in order. At the
/// first one it overlaps by more than `max_overlap` with a strictly lower
/// response, it takes that keypoint's slot and comparison stops. Any overlap
/// without winning means the candidate is dropped. Without overlap it is
/// appended.
pub fn suppress(accepted: &mut Vec<Keypoint>, candidate: Keypoint, max_overlap: f32) {
    let mut overlapped = false;
    for kp in accepted.iter_mut() {
        if candidate.overlap(kp) > max_overlap {
            overlapped = true;
            if candidate.response > kp.response {
                *kp = candidate;
                break;
            }
        }
    }
    if !overlapped {
        accepted.push(candidate);
    }
}
