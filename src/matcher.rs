use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::{BenchErr, DescriptorClass, Descriptors, ElementType, Match};

/// Ratio a best match must stay under, relative to the second best.
pub const RATIO_THRESHOLD: f32 = 0.8;

/// How candidates are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MatcherKind {
    /// Exhaustive search on byte descriptors: Hamming for binary
    /// descriptors, L1 otherwise.
    BruteForce,
    /// Exact linear search on `f32` descriptors under Euclidean distance.
    /// Stands in for FLANN; no approximate index is built.
    Flann,
}

/// Which candidates become matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    /// Closest reference row for every source row.
    NearestNeighbor,
    /// Two closest rows, kept only when they pass the ratio test.
    KNearest,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("descriptor width mismatch: source {source_width}, reference {reference_width}")]
    WidthMismatch {
        source_width: usize,
        reference_width: usize,
    },
    #[error("ragged descriptor rows")]
    Ragged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Norm {
    Hamming,
    L1,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    pub kind: MatcherKind,
    pub selector: Selector,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            kind: MatcherKind::BruteForce,
            selector: Selector::KNearest,
        }
    }
}

impl Matcher {
    pub fn new(kind: MatcherKind, selector: Selector) -> Self {
        Self { kind, selector }
    }

    /// Match every source row against the reference rows.
    pub fn match_descriptors(
        &self,
        source: &Descriptors,
        reference: &Descriptors,
        class: DescriptorClass,
    ) -> Result<Vec<Match>, MatchError> {
        check_widths(source, reference)?;
        match self.kind {
            MatcherKind::BruteForce => {
                let norm = match class {
                    DescriptorClass::Binary => Norm::Hamming,
                    DescriptorClass::Gradient => Norm::L1,
                };
                let (src, dst) = (source.to_bytes(), reference.to_bytes());
                Ok(self.select(&src, &dst, |a, b| byte_distance(norm, a, b)))
            }
            MatcherKind::Flann => {
                let (src, dst) = (source.to_floats(), reference.to_floats());
                Ok(self.select(&src, &dst, |a, b| float_distance(Norm::L2, a, b)))
            }
        }
    }

    fn select<T, D>(&self, source: &[Vec<T>], reference: &[Vec<T>], distance: D) -> Vec<Match>
    where
        D: Fn(&[T], &[T]) -> f32,
    {
        let mut matches = Vec::with_capacity(source.len());
        for (i, row) in source.iter().enumerate() {
            let best = two_nearest(row, reference, &distance);
            match self.selector {
                Selector::NearestNeighbor => {
                    if let Some(&(j, d)) = best.first() {
                        matches.push(Match {
                            source: i,
                            reference: j,
                            distance: d,
                        });
                    }
                }
                Selector::KNearest => {
                    if let [(j, d0), (_, d1)] = best[..] {
                        if d0 < RATIO_THRESHOLD * d1 {
                            matches.push(Match {
                                source: i,
                                reference: j,
                                distance: d0,
                            });
                        }
                    }
                }
            }
        }
        matches
    }
}

/// The (up to) two closest reference rows, closest first. Ties keep the
/// lower reference index first.
fn two_nearest<T, D>(row: &[T], reference: &[Vec<T>], distance: &D) -> SmallVec<[(usize, f32); 2]>
where
    D: Fn(&[T], &[T]) -> f32,
{
    let mut best: SmallVec<[(usize, f32); 2]> = SmallVec::new();
    for (j, candidate) in reference.iter().enumerate() {
        let d = distance(row, candidate);
        match best.len() {
            0 => best.push((j, d)),
            1 => {
                if d < best[0].1 {
                    best.insert(0, (j, d));
                } else {
                    best.push((j, d));
                }
            }
            _ => {
                if d < best[0].1 {
                    best[1] = best[0];
                    best[0] = (j, d);
                } else if d < best[1].1 {
                    best[1] = (j, d);
                }
            }
        }
    }
    best
}

fn check_widths(source: &Descriptors, reference: &Descriptors) -> Result<(), MatchError> {
    fn uniform(d: &Descriptors) -> bool {
        match d {
            Descriptors::Binary(rows) => rows.windows(2).all(|w| w[0].len() == w[1].len()),
            Descriptors::Float(rows) => rows.windows(2).all(|w| w[0].len() == w[1].len()),
        }
    }
    if !uniform(source) || !uniform(reference) {
        return Err(MatchError::Ragged);
    }
    match (source.width(), reference.width()) {
        (Some(s), Some(r)) if s != r => Err(MatchError::WidthMismatch {
            source_width: s,
            reference_width: r,
        }),
        _ => Ok(()),
    }
}

fn byte_distance(norm: Norm, a: &[u8], b: &[u8]) -> f32 {
    match norm {
        Norm::Hamming => a
            .iter()
            .zip(b)
            .fold(0u32, |acc, (x, y)| acc + (x ^ y).count_ones()) as f32,
        Norm::L1 => a
            .iter()
            .zip(b)
            .fold(0u32, |acc, (&x, &y)| acc + (x as i32 - y as i32).unsigned_abs()) as f32,
        Norm::L2 => float_distance(
            Norm::L2,
            &a.iter().map(|&v| v as f32).collect::<Vec<_>>(),
            &b.iter().map(|&v| v as f32).collect::<Vec<_>>(),
        ),
    }
}

fn float_distance(norm: Norm, a: &[f32], b: &[f32]) -> f32 {
    match norm {
        Norm::L1 => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        Norm::L2 | Norm::Hamming => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

/// Element types of both sides, for diagnostics when matching fails.
pub fn element_types(source: &Descriptors, reference: &Descriptors) -> (ElementType, ElementType) {
    (source.element_type(), reference.element_type())
}

impl MatcherKind {
    pub fn name(self) -> &'static str {
        match self {
            MatcherKind::BruteForce => "MAT_BF",
            MatcherKind::Flann => "MAT_FLANN",
        }
    }
}

impl Selector {
    pub fn name(self) -> &'static str {
        match self {
            Selector::NearestNeighbor => "SEL_NN",
            Selector::KNearest => "SEL_KNN",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatcherKind {
    type Err = BenchErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MAT_BF" | "BF" => Ok(MatcherKind::BruteForce),
            "MAT_FLANN" | "FLANN" => Ok(MatcherKind::Flann),
            _ => Err(BenchErr::UnknownMatcher(s.to_string())),
        }
    }
}

impl FromStr for Selector {
    type Err = BenchErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SEL_NN" | "NN" => Ok(Selector::NearestNeighbor),
            "SEL_KNN" | "KNN" => Ok(Selector::KNearest),
            _ => Err(BenchErr::UnknownMatcher(s.to_string())),
        }
    }
}

impl TryFrom<String> for MatcherKind {
    type Error = BenchErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for Selector {
    type Error = BenchErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MatcherKind> for String {
    fn from(k: MatcherKind) -> Self {
        k.name().to_string()
    }
}

impl From<Selector> for String {
    fn from(s: Selector) -> Self {
        s.name().to_string()
    }
}
