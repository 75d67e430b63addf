use crate::{DescriptorKind, DetectorKind};

/// Whether a detector/descriptor pair may be swept.
///
/// Two exclusions apply:
/// 1. AKAZE descriptors need the AKAZE detector's keypoints (class ids and
///    octaves that other detectors don't fill in).
/// 2. ORB descriptors fail on SIFT keypoints, whose octave encoding ORB
///    can't read.
pub fn is_compatible(detector: DetectorKind, descriptor: DescriptorKind) -> bool {
    match (detector, descriptor) {
        (DetectorKind::Akaze, DescriptorKind::Akaze) => true,
        (_, DescriptorKind::Akaze) => false,
        (DetectorKind::Sift, DescriptorKind::Orb) => false,
        _ => true,
    }
}
