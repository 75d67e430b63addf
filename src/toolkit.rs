use std::collections::BTreeMap;

use crate::{BenchErr, BenchResult, DescriptorKind, Descriptors, DetectorKind, Keypoint};

/// Produces keypoints from a grayscale image.
pub trait KeypointDetector<I> {
    fn detect(&mut self, image: &I) -> BenchResult<Vec<Keypoint>>;
}

/// Computes one descriptor row per keypoint.
///
/// Extractors may drop keypoints they can't describe (too close to the
/// border, for instance). `keypoints` is updated in place so that the returned
/// rows stay index aligned with it.
pub trait DescriptorExtractor<I> {
    fn extract(&mut self, image: &I, keypoints: &mut Vec<Keypoint>) -> BenchResult<Descriptors>;
}

impl<I, F> KeypointDetector<I> for F
where
    F: FnMut(&I) -> BenchResult<Vec<Keypoint>>,
{
    fn detect(&mut self, image: &I) -> BenchResult<Vec<Keypoint>> {
        self(image)
    }
}

impl<I, F> DescriptorExtractor<I> for F
where
    F: FnMut(&I, &mut Vec<Keypoint>) -> BenchResult<Descriptors>,
{
    fn extract(&mut self, image: &I, keypoints: &mut Vec<Keypoint>) -> BenchResult<Descriptors> {
        self(image, keypoints)
    }
}

/// Lookup table from detector/descriptor names to their implementations,
/// built once before a sweep.
pub struct Toolkit<I> {
    detectors: BTreeMap<DetectorKind, Box<dyn KeypointDetector<I>>>,
    extractors: BTreeMap<DescriptorKind, Box<dyn DescriptorExtractor<I>>>,
}

impl<I> Default for Toolkit<I> {
    fn default() -> Self {
        Self {
            detectors: BTreeMap::new(),
            extractors: BTreeMap::new(),
        }
    }
}

impl<I> Toolkit<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector<D>(mut self, kind: DetectorKind, detector: D) -> Self
    where
        D: KeypointDetector<I> + 'static,
    {
        self.detectors.insert(kind, Box::new(detector));
        self
    }

    pub fn with_extractor<E>(mut self, kind: DescriptorKind, extractor: E) -> Self
    where
        E: DescriptorExtractor<I> + 'static,
    {
        self.extractors.insert(kind, Box::new(extractor));
        self
    }

    pub fn detector(&mut self, kind: DetectorKind) -> BenchResult<&mut dyn KeypointDetector<I>> {
        match self.detectors.get_mut(&kind) {
            Some(d) => Ok(d.as_mut()),
            None => Err(BenchErr::NotRegistered(format!("detector {}", kind))),
        }
    }

    pub fn extractor(
        &mut self,
        kind: DescriptorKind,
    ) -> BenchResult<&mut dyn DescriptorExtractor<I>> {
        match self.extractors.get_mut(&kind) {
            Some(e) => Ok(e.as_mut()),
            None => Err(BenchErr::NotRegistered(format!("descriptor {}", kind))),
        }
    }

    pub fn detectors(&self) -> impl Iterator<Item = DetectorKind> + '_ {
        self.detectors.keys().copied()
    }

    pub fn extractors(&self) -> impl Iterator<Item = DescriptorKind> + '_ {
        self.extractors.keys().copied()
    }
}
