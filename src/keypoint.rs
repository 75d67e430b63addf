use std::f32::consts::PI;
use std::fmt;

/// A detected image location with scale and strength metadata.
///
/// Carries every field OpenCV keeps on its keypoints. Some extractors read
/// `octave` and `class_id` back from the detector that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the meaningful neighbourhood.
    pub size: f32,
    /// Orientation in degrees, `-1.` when not applicable.
    pub angle: f32,
    /// Detector confidence. Zero for detectors that don't report one.
    pub response: f32,
    pub octave: i32,
    pub class_id: i32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            angle: -1.,
            response: 0.,
            octave: 0,
            class_id: -1,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    /// Intersection over union of the two keypoint circles (diameter = `size`).
    ///
    /// When one circle lies entirely inside the other the ratio of their
    /// areas is returned. Disjoint circles give `0.`.
    pub fn overlap(&self, other: &Keypoint) -> f32 {
        let a = self.size * 0.5;
        let b = other.size * 0.5;
        let a_2 = a * a;
        let b_2 = b * b;
        let c = ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt();

        if a.min(b) + c <= a.max(b) {
            return a_2.min(b_2) / a_2.max(b_2);
        }
        if c >= a + b {
            return 0.;
        }

        let c_2 = c * c;
        let cos_alpha = ((b_2 + c_2 - a_2) / (other.size * c)).clamp(-1., 1.);
        let cos_beta = ((a_2 + c_2 - b_2) / (self.size * c)).clamp(-1., 1.);
        let alpha = cos_alpha.acos();
        let beta = cos_beta.acos();

        let segment_a = a_2 * beta;
        let segment_b = b_2 * alpha;
        let triangle_a = a_2 * beta.sin() * cos_beta;
        let triangle_b = b_2 * alpha.sin() * cos_alpha;

        let intersection = segment_a + segment_b - triangle_a - triangle_b;
        let union = (a_2 + b_2) * PI - intersection;
        intersection / union
    }

    /// True if the keypoint position lies inside a `width` x `height` image.
    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        self.x >= 0. && self.y >= 0. && self.x < width as f32 && self.y < height as f32
    }
}

/// Correspondence between a keypoint of the source (older) frame and one of
/// the reference (newer) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub source: usize,
    pub reference: usize,
    pub distance: f32,
}

/// Element type of a descriptor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    U8,
    F32,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::U8 => write!(f, "u8"),
            ElementType::F32 => write!(f, "f32"),
        }
    }
}

/// Descriptor rows of one frame, index aligned with its keypoints.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptors {
    Binary(Vec<Vec<u8>>),
    Float(Vec<Vec<f32>>),
}

impl Default for Descriptors {
    fn default() -> Self {
        Descriptors::Binary(Vec::new())
    }
}

impl Descriptors {
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(rows) => rows.len(),
            Descriptors::Float(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row width in elements, `None` for an empty set.
    pub fn width(&self) -> Option<usize> {
        match self {
            Descriptors::Binary(rows) => rows.first().map(Vec::len),
            Descriptors::Float(rows) => rows.first().map(Vec::len),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Descriptors::Binary(_) => ElementType::U8,
            Descriptors::Float(_) => ElementType::F32,
        }
    }

    /// Rows as bytes. Float values are rounded and saturated to `0..=255`.
    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        match self {
            Descriptors::Binary(rows) => rows.clone(),
            Descriptors::Float(rows) => rows
                .iter()
                .map(|r| r.iter().map(|&v| v.round().clamp(0., 255.) as u8).collect())
                .collect(),
        }
    }

    pub fn to_floats(&self) -> Vec<Vec<f32>> {
        match self {
            Descriptors::Binary(rows) => rows
                .iter()
                .map(|r| r.iter().map(|&v| v as f32).collect())
                .collect(),
            Descriptors::Float(rows) => rows.clone(),
        }
    }
}
