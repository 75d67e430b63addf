use std::{io::Write, time::Duration};
use tracing::{debug, error, info, warn};

use crate::{
    compat, filter, matcher, millis, timed, BenchErr, BenchResult, CsvReporter, DescriptorKind,
    DetectorKind, Frame, FrameBuffer, FrameSource, Matcher, MetricRecord, SweepConfig, Toolkit,
};

/// How one detector/descriptor pair ended. `frames` counts the CSV rows
/// written for the pair; on failure those rows stay in the output.
#[derive(Debug)]
pub enum PairOutcome {
    Completed {
        detector: DetectorKind,
        descriptor: DescriptorKind,
        frames: usize,
    },
    Failed {
        detector: DetectorKind,
        descriptor: DescriptorKind,
        frames: usize,
        error: BenchErr,
    },
}

impl PairOutcome {
    pub fn pair(&self) -> (DetectorKind, DescriptorKind) {
        match self {
            PairOutcome::Completed {
                detector,
                descriptor,
                ..
            }
            | PairOutcome::Failed {
                detector,
                descriptor,
                ..
            } => (*detector, *descriptor),
        }
    }

    pub fn frames(&self) -> usize {
        match self {
            PairOutcome::Completed { frames, .. } | PairOutcome::Failed { frames, .. } => *frames,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PairOutcome::Failed { .. })
    }
}

#[derive(Debug, Default)]
pub struct SweepSummary {
    /// Every pair that was attempted, in sweep order.
    pub pairs: Vec<PairOutcome>,
    /// Pairs excluded by the compatibility rule.
    pub skipped: Vec<(DetectorKind, DescriptorKind)>,
}

impl SweepSummary {
    /// Number of pairs abandoned because of an error.
    pub fn error_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_failed()).count()
    }

    /// Total CSV rows written.
    pub fn rows(&self) -> usize {
        self.pairs.iter().map(PairOutcome::frames).sum()
    }
}

/// Runs every configured detector x descriptor pair over the frame source.
pub struct Sweep<'a, I, S> {
    config: &'a SweepConfig,
    toolkit: &'a mut Toolkit<I>,
    source: &'a S,
    matcher: Matcher,
}

impl<'a, I, S: FrameSource<I>> Sweep<'a, I, S> {
    pub fn new(config: &'a SweepConfig, toolkit: &'a mut Toolkit<I>, source: &'a S) -> Self {
        Self {
            config,
            toolkit,
            source,
            matcher: Matcher::new(config.matcher, config.selector),
        }
    }

    /// Visit all pairs. Pair failures are logged and counted, never
    /// propagated.
    pub fn run<W: Write>(
        &mut self,
        buffer: &mut FrameBuffer<I>,
        reporter: &mut CsvReporter<W>,
    ) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for &detector in &self.config.detectors {
            for &descriptor in &self.config.descriptors {
                if !compat::is_compatible(detector, descriptor) {
                    debug!(%detector, %descriptor, "skipping incompatible pair");
                    summary.skipped.push((detector, descriptor));
                    continue;
                }

                buffer.clear();
                let outcome = self.run_pair(detector, descriptor, buffer, reporter);
                match &outcome {
                    PairOutcome::Completed { frames, .. } => {
                        info!(%detector, %descriptor, frames, "pair done")
                    }
                    PairOutcome::Failed { frames, error, .. } => {
                        error!(%detector, %descriptor, frames, "pair failed: {}", error)
                    }
                }
                summary.pairs.push(outcome);
            }
        }
        info!(
            pairs = summary.pairs.len(),
            skipped = summary.skipped.len(),
            errors = summary.error_count(),
            "sweep finished"
        );
        summary
    }

    /// Run the frame loop of one pair. The first error abandons the rest of
    /// the pair's frames.
    pub fn run_pair<W: Write>(
        &mut self,
        detector: DetectorKind,
        descriptor: DescriptorKind,
        buffer: &mut FrameBuffer<I>,
        reporter: &mut CsvReporter<W>,
    ) -> PairOutcome {
        let mut frames = 0;
        for position in 0..self.source.len() {
            let written = self
                .process_frame(position, detector, descriptor, buffer)
                .and_then(|record| reporter.write(record));
            if let Err(error) = written {
                return PairOutcome::Failed {
                    detector,
                    descriptor,
                    frames,
                    error,
                };
            }
            frames += 1;
        }
        PairOutcome::Completed {
            detector,
            descriptor,
            frames,
        }
    }

    fn process_frame(
        &mut self,
        position: usize,
        detector: DetectorKind,
        descriptor: DescriptorKind,
        buffer: &mut FrameBuffer<I>,
    ) -> BenchResult<MetricRecord> {
        let mut frame = Frame::new(self.source.load(position)?);
        debug!(position, "image loaded");

        let (keypoints, detect_time) =
            timed(|| self.toolkit.detector(detector)?.detect(&frame.image));
        let mut keypoints = keypoints?;
        debug!(%detector, n = keypoints.len(), ms = millis(detect_time), "keypoints detected");

        if let Some(roi) = &self.config.roi {
            let before = keypoints.len();
            roi.retain(&mut keypoints);
            debug!(before, after = keypoints.len(), "region filter applied");
        }
        if let Some(limit) = self.config.keypoint_limit {
            // Shi-Tomasi output is sorted by quality and has no response
            if detector == DetectorKind::ShiTomasi {
                keypoints.truncate(limit);
            } else {
                filter::retain_best(&mut keypoints, limit);
            }
        }
        let keypoint_count = keypoints.len();

        let (descriptors, extract_time) = timed(|| {
            self.toolkit
                .extractor(descriptor)?
                .extract(&frame.image, &mut keypoints)
        });
        frame.descriptors = descriptors?;
        frame.keypoints = keypoints;
        debug!(%descriptor, rows = frame.descriptors.len(), ms = millis(extract_time), "descriptors extracted");

        buffer.push(frame);

        let (matches, match_time) = match buffer.last_two_mut() {
            Some((previous, latest)) => {
                let class = descriptor.class();
                let (found, elapsed) = timed(|| {
                    self.matcher
                        .match_descriptors(&previous.descriptors, &latest.descriptors, class)
                });
                latest.matches = match found {
                    Ok(matches) => matches,
                    Err(e) => {
                        let (src, dst) = matcher::element_types(&previous.descriptors, &latest.descriptors);
                        warn!(%class, source = %src, reference = %dst, "matcher error: {}", e);
                        Vec::new()
                    }
                };
                debug!(n = latest.matches.len(), ms = millis(elapsed), "descriptors matched");
                (latest.matches.len(), elapsed)
            }
            None => (0, Duration::ZERO),
        };

        Ok(MetricRecord {
            detector,
            detect_time,
            keypoints: keypoint_count,
            descriptor,
            extract_time,
            matches,
            match_time,
        })
    }
}
