use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::BenchErr;

/// Keypoint detectors the sweep knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DetectorKind {
    ShiTomasi,
    Harris,
    Fast,
    Brisk,
    Orb,
    Akaze,
    Sift,
}

/// Descriptor extractors the sweep knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DescriptorKind {
    Brisk,
    Brief,
    Orb,
    Freak,
    Akaze,
    Sift,
}

/// Distance family a descriptor is matched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorClass {
    /// Bit strings, compared with Hamming distance.
    Binary,
    /// Histogram of gradients style vectors, compared with L1 distance.
    Gradient,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 7] = [
        DetectorKind::ShiTomasi,
        DetectorKind::Harris,
        DetectorKind::Fast,
        DetectorKind::Brisk,
        DetectorKind::Orb,
        DetectorKind::Sift,
        DetectorKind::Akaze,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DetectorKind::ShiTomasi => "SHITOMASI",
            DetectorKind::Harris => "HARRIS",
            DetectorKind::Fast => "FAST",
            DetectorKind::Brisk => "BRISK",
            DetectorKind::Orb => "ORB",
            DetectorKind::Akaze => "AKAZE",
            DetectorKind::Sift => "SIFT",
        }
    }
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 6] = [
        DescriptorKind::Brisk,
        DescriptorKind::Brief,
        DescriptorKind::Orb,
        DescriptorKind::Freak,
        DescriptorKind::Akaze,
        DescriptorKind::Sift,
    ];

    /// Descriptors swept by default. BRISK is available but not part of the
    /// default sweep.
    pub const SWEEP: [DescriptorKind; 5] = [
        DescriptorKind::Brief,
        DescriptorKind::Orb,
        DescriptorKind::Freak,
        DescriptorKind::Sift,
        DescriptorKind::Akaze,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DescriptorKind::Brisk => "BRISK",
            DescriptorKind::Brief => "BRIEF",
            DescriptorKind::Orb => "ORB",
            DescriptorKind::Freak => "FREAK",
            DescriptorKind::Akaze => "AKAZE",
            DescriptorKind::Sift => "SIFT",
        }
    }

    /// Fixed lookup the matcher uses to pick its distance. FREAK is matched
    /// under L1 together with SIFT.
    pub fn class(self) -> DescriptorClass {
        match self {
            DescriptorKind::Akaze
            | DescriptorKind::Brief
            | DescriptorKind::Brisk
            | DescriptorKind::Orb => DescriptorClass::Binary,
            DescriptorKind::Freak | DescriptorKind::Sift => DescriptorClass::Gradient,
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DescriptorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorClass::Binary => f.write_str("DES_BINARY"),
            DescriptorClass::Gradient => f.write_str("DES_HOG"),
        }
    }
}

impl FromStr for DetectorKind {
    type Err = BenchErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectorKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BenchErr::UnknownDetector(s.to_string()))
    }
}

impl FromStr for DescriptorKind {
    type Err = BenchErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DescriptorKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BenchErr::UnknownDescriptor(s.to_string()))
    }
}

impl TryFrom<String> for DetectorKind {
    type Error = BenchErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for DescriptorKind {
    type Error = BenchErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DetectorKind> for String {
    fn from(k: DetectorKind) -> Self {
        k.name().to_string()
    }
}

impl From<DescriptorKind> for String {
    fn from(k: DescriptorKind) -> Self {
        k.name().to_string()
    }
}
