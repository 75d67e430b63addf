use opencv::{
    core::{self, KeyPoint, Mat, Point2f, Vector},
    features2d::{
        self, FastFeatureDetector_DetectorType, Feature2DTrait, ORB_ScoreType, AKAZE, BRISK, ORB,
        SIFT,
    },
    imgcodecs, imgproc,
    prelude::*,
    xfeatures2d,
};

use crate::{
    corners::{self, HarrisParams, ResponseMap, ShiTomasiParams},
    BenchErr, BenchResult, DescriptorExtractor, DescriptorKind, Descriptors, DetectorKind,
    FrameSource, ImageSequence, Keypoint, KeypointDetector, Toolkit,
};

type CvImage = Mat;

/// Loads every image of an [`ImageSequence`] as an 8-bit grayscale `Mat`.
pub struct CvImageLoader {
    sequence: ImageSequence,
}

impl CvImageLoader {
    pub fn new(sequence: ImageSequence) -> Self {
        Self { sequence }
    }
}

impl FrameSource<CvImage> for CvImageLoader {
    fn len(&self) -> usize {
        self.sequence.len()
    }

    fn load(&self, position: usize) -> BenchResult<CvImage> {
        let path = self.sequence.path_for(position);
        let name = path
            .to_str()
            .ok_or_else(|| BenchErr::ImageLoad(path.clone()))?;
        let img = imgcodecs::imread(name, imgcodecs::IMREAD_GRAYSCALE)?;
        if img.empty() {
            return Err(BenchErr::ImageLoad(path));
        }
        Ok(img)
    }
}

impl Toolkit<CvImage> {
    /// Every detector and extractor, backed by OpenCV.
    pub fn opencv() -> BenchResult<Self> {
        let mut toolkit = Toolkit::new();
        for kind in DetectorKind::ALL {
            toolkit = toolkit.with_detector(kind, CvDetector(kind));
        }
        for kind in DescriptorKind::ALL {
            toolkit = toolkit.with_extractor(kind, CvExtractor::new(kind)?);
        }
        Ok(toolkit)
    }
}

/// OpenCV keypoint detector with the parameters the sweep uses.
pub struct CvDetector(pub DetectorKind);

impl KeypointDetector<CvImage> for CvDetector {
    fn detect(&mut self, image: &CvImage) -> BenchResult<Vec<Keypoint>> {
        match self.0 {
            DetectorKind::ShiTomasi => shi_tomasi(image),
            DetectorKind::Harris => harris(image),
            DetectorKind::Fast => detect_with(
                features2d::FastFeatureDetector::create(
                    30,
                    true,
                    FastFeatureDetector_DetectorType::TYPE_9_16,
                )?,
                image,
            ),
            DetectorKind::Brisk => detect_with(BRISK::create(30, 3, 1.0)?, image),
            DetectorKind::Orb => detect_with(orb()?, image),
            DetectorKind::Akaze => detect_with(AKAZE::create_def()?, image),
            DetectorKind::Sift => detect_with(SIFT::create_def()?, image),
        }
    }
}

/// OpenCV descriptor extractor with the parameters the sweep uses.
///
/// The OpenCV object is created once in [`CvExtractor::new`]; `extract` only
/// converts keypoints and runs `compute`.
pub struct CvExtractor {
    kind: DescriptorKind,
    algo: ExtractorAlgo,
}

enum ExtractorAlgo {
    Brisk(core::Ptr<BRISK>),
    Brief(core::Ptr<xfeatures2d::BriefDescriptorExtractor>),
    Orb(core::Ptr<ORB>),
    Freak(core::Ptr<xfeatures2d::FREAK>),
    Akaze(core::Ptr<AKAZE>),
    Sift(core::Ptr<SIFT>),
}

impl CvExtractor {
    pub fn new(kind: DescriptorKind) -> BenchResult<Self> {
        let algo = match kind {
            DescriptorKind::Brisk => ExtractorAlgo::Brisk(BRISK::create(30, 3, 1.0)?),
            DescriptorKind::Brief => {
                ExtractorAlgo::Brief(xfeatures2d::BriefDescriptorExtractor::create(32, false)?)
            }
            DescriptorKind::Orb => ExtractorAlgo::Orb(orb()?),
            DescriptorKind::Freak => ExtractorAlgo::Freak(xfeatures2d::FREAK::create_def()?),
            DescriptorKind::Akaze => ExtractorAlgo::Akaze(AKAZE::create_def()?),
            DescriptorKind::Sift => ExtractorAlgo::Sift(SIFT::create_def()?),
        };
        Ok(Self { kind, algo })
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }
}

impl DescriptorExtractor<CvImage> for CvExtractor {
    fn extract(
        &mut self,
        image: &CvImage,
        keypoints: &mut Vec<Keypoint>,
    ) -> BenchResult<Descriptors> {
        match &mut self.algo {
            ExtractorAlgo::Brisk(a) => compute_with(a, image, keypoints),
            ExtractorAlgo::Brief(a) => compute_with(a, image, keypoints),
            ExtractorAlgo::Orb(a) => compute_with(a, image, keypoints),
            ExtractorAlgo::Freak(a) => compute_with(a, image, keypoints),
            ExtractorAlgo::Akaze(a) => compute_with(a, image, keypoints),
            ExtractorAlgo::Sift(a) => compute_with(a, image, keypoints),
        }
    }
}

fn orb() -> BenchResult<core::Ptr<ORB>> {
    Ok(ORB::create(
        500,
        1.2,
        8,
        31,
        0,
        2,
        ORB_ScoreType::HARRIS_SCORE,
        31,
        20,
    )?)
}

fn detect_with<D: Feature2DTrait>(mut algo: D, image: &CvImage) -> BenchResult<Vec<Keypoint>> {
    let mut kps = Vector::<KeyPoint>::new();
    let mask = Mat::default();
    algo.detect(image, &mut kps, &mask)?;
    Ok(from_cv_keypoints(&kps))
}

fn compute_with<E: Feature2DTrait>(
    algo: &mut E,
    image: &CvImage,
    keypoints: &mut Vec<Keypoint>,
) -> BenchResult<Descriptors> {
    let mut kps = to_cv_keypoints(keypoints)?;
    let mut desc = Mat::default();
    algo.compute(image, &mut kps, &mut desc)?;
    // compute() drops keypoints it can't describe
    *keypoints = from_cv_keypoints(&kps);
    descriptors_from_mat(&desc)
}

fn shi_tomasi(image: &CvImage) -> BenchResult<Vec<Keypoint>> {
    let p = ShiTomasiParams::default();
    let max_corners = p.max_corners(image.rows() as usize, image.cols() as usize);

    let mut corners = Vector::<Point2f>::new();
    let mask = Mat::default();
    imgproc::good_features_to_track(
        image,
        &mut corners,
        max_corners,
        p.quality_level,
        p.min_distance(),
        &mask,
        p.block_size,
        false,
        p.k,
    )?;

    Ok(corners
        .iter()
        .map(|c| Keypoint::new(c.x, c.y, p.block_size as f32))
        .collect())
}

fn harris(image: &CvImage) -> BenchResult<Vec<Keypoint>> {
    let p = HarrisParams::default();
    let mut dst = Mat::default();
    imgproc::corner_harris(
        image,
        &mut dst,
        p.block_size,
        p.aperture,
        p.k,
        core::BORDER_DEFAULT,
    )?;

    let (rows, cols) = (dst.rows(), dst.cols());
    let mut data = Vec::with_capacity((rows * cols).max(0) as usize);
    for r in 0..rows {
        data.extend_from_slice(dst.at_row::<f32>(r)?);
    }
    let map = ResponseMap::new(cols as usize, rows as usize, data).normalized(0., 255.);
    Ok(corners::harris_keypoints(&map, &p))
}

fn from_cv_keypoints(kps: &Vector<KeyPoint>) -> Vec<Keypoint> {
    kps.iter()
        .map(|kp| {
            let pt = kp.pt();
            Keypoint {
                x: pt.x,
                y: pt.y,
                size: kp.size(),
                angle: kp.angle(),
                response: kp.response(),
                octave: kp.octave(),
                class_id: kp.class_id(),
            }
        })
        .collect()
}

fn to_cv_keypoints(kps: &[Keypoint]) -> BenchResult<Vector<KeyPoint>> {
    let mut out = Vector::<KeyPoint>::with_capacity(kps.len());
    for kp in kps {
        out.push(KeyPoint::new_coords(
            kp.x,
            kp.y,
            kp.size,
            kp.angle,
            kp.response,
            kp.octave,
            kp.class_id,
        )?);
    }
    Ok(out)
}

/// Copy descriptor rows out of an OpenCV matrix.
fn descriptors_from_mat(desc: &Mat) -> BenchResult<Descriptors> {
    if desc.empty() {
        return Ok(Descriptors::default());
    }
    let rows = desc.rows();
    match desc.typ() {
        core::CV_8UC1 => (0..rows)
            .map(|r| Ok(desc.at_row::<u8>(r)?.to_vec()))
            .collect::<BenchResult<Vec<_>>>()
            .map(Descriptors::Binary),
        core::CV_32FC1 => (0..rows)
            .map(|r| Ok(desc.at_row::<f32>(r)?.to_vec()))
            .collect::<BenchResult<Vec<_>>>()
            .map(Descriptors::Float),
        _ => Err(BenchErr::OpenCvDecode),
    }
}
