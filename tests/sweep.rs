//! Sweep controller end to end, on a synthetic in-memory backend.

use featbench::{
    report::CSV_HEADER, BenchErr, BenchResult, CsvReporter, DescriptorKind, Descriptors,
    DetectorKind, FrameBuffer, Keypoint, PairOutcome, Roi, Sweep, SweepConfig, Toolkit,
};

/// Tiny grayscale image. `broken` makes the synthetic detector fail.
#[derive(Clone)]
struct Gray {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    broken: bool,
}

impl Gray {
    /// Bright spots at the given positions on a dark background.
    fn with_spots(width: usize, height: usize, spots: &[(usize, usize)]) -> Self {
        let mut pixels = vec![10u8; width * height];
        for (i, &(x, y)) in spots.iter().enumerate() {
            pixels[y * width + x] = 200 + i as u8;
        }
        Self {
            width,
            height,
            pixels,
            broken: false,
        }
    }

    fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// Every pixel brighter than 128 is a keypoint; response is the intensity.
fn bright_pixels(img: &Gray) -> BenchResult<Vec<Keypoint>> {
    if img.broken {
        return Err(BenchErr::Backend("unsupported image".to_string()));
    }
    let mut kps = Vec::new();
    for y in 0..img.height {
        for x in 0..img.width {
            let v = img.pixels[y * img.width + x];
            if v > 128 {
                kps.push(Keypoint::new(x as f32, y as f32, 3.).with_response(v as f32));
            }
        }
    }
    Ok(kps)
}

/// 32-byte rows keyed on the spot intensity, so a spot matches itself
/// across frames.
fn intensity_rows(img: &Gray, kps: &mut Vec<Keypoint>) -> BenchResult<Descriptors> {
    Ok(Descriptors::Binary(
        kps.iter()
            .map(|kp| {
                let v = img.pixels[kp.y as usize * img.width + kp.x as usize];
                let mut row = vec![0u8; 32];
                row[0] = v;
                row[31] = v.rotate_left(3);
                row
            })
            .collect(),
    ))
}

/// Row width follows the image width, so frames of different widths can't
/// be matched.
fn width_rows(img: &Gray, kps: &mut Vec<Keypoint>) -> BenchResult<Descriptors> {
    Ok(Descriptors::Binary(vec![vec![1u8; img.width]; kps.len()]))
}

fn toolkit() -> Toolkit<Gray> {
    let mut toolkit = Toolkit::new();
    for kind in DetectorKind::ALL {
        toolkit = toolkit.with_detector(kind, bright_pixels);
    }
    for kind in DescriptorKind::ALL {
        toolkit = toolkit.with_extractor(kind, intensity_rows);
    }
    toolkit
}

fn config(detectors: &[DetectorKind], descriptors: &[DescriptorKind]) -> SweepConfig {
    SweepConfig {
        roi: None,
        detectors: detectors.to_vec(),
        descriptors: descriptors.to_vec(),
        ..SweepConfig::default()
    }
}

fn spots() -> Vec<(usize, usize)> {
    vec![(2, 3), (7, 7), (12, 4), (15, 15), (5, 12)]
}

fn shifted(dx: usize) -> Vec<(usize, usize)> {
    spots().into_iter().map(|(x, y)| (x + dx, y)).collect()
}

/// Data rows of the CSV, split into fields.
fn rows(reporter: CsvReporter<Vec<u8>>) -> Vec<Vec<String>> {
    let text = String::from_utf8(reporter.into_inner()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    lines
        .map(|l| l.split(',').map(str::to_string).collect())
        .collect()
}

#[test]
fn two_frames_fast_brief() {
    let frames = vec![
        Gray::with_spots(20, 20, &spots()),
        Gray::with_spots(20, 20, &shifted(1)),
    ];
    let cfg = config(&[DetectorKind::Fast], &[DescriptorKind::Brief]);
    let mut toolkit = toolkit();
    let mut buffer = FrameBuffer::new(cfg.buffer_capacity);
    let mut reporter = CsvReporter::new(Vec::new());

    let summary = Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.rows(), 2);
    assert_eq!(reporter.rows(), 2);
    let rows = rows(reporter);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0][0], "FAST");
    assert_eq!(rows[0][3], "BRIEF");
    assert_eq!(rows[0][5], "0");
    assert_eq!(rows[0][6], "0.000");

    let k1: usize = rows[0][2].parse().unwrap();
    let k2: usize = rows[1][2].parse().unwrap();
    let m: usize = rows[1][5].parse().unwrap();
    assert_eq!((k1, k2), (5, 5));
    assert!(m <= k1.min(k2));
    assert_eq!(m, 5);

    // matches were stored on the newest frame, pointing back at the older one
    let latest = buffer.latest().unwrap();
    assert_eq!(latest.matches.len(), 5);
    for mt in &latest.matches {
        assert_eq!(mt.source, mt.reference);
        assert_eq!(mt.distance, 0.);
    }
}

#[test]
fn incompatible_pairs_are_skipped_silently() {
    let frames = vec![Gray::with_spots(20, 20, &spots())];
    let cfg = config(
        &[DetectorKind::ShiTomasi, DetectorKind::Sift, DetectorKind::Akaze],
        &[DescriptorKind::Akaze, DescriptorKind::Orb],
    );
    let mut toolkit = toolkit();
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new());

    let summary = Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    assert_eq!(
        summary.skipped,
        vec![
            (DetectorKind::ShiTomasi, DescriptorKind::Akaze),
            (DetectorKind::Sift, DescriptorKind::Akaze),
            (DetectorKind::Sift, DescriptorKind::Orb),
        ]
    );
    let run: Vec<_> = summary.pairs.iter().map(PairOutcome::pair).collect();
    assert_eq!(
        run,
        vec![
            (DetectorKind::ShiTomasi, DescriptorKind::Orb),
            (DetectorKind::Akaze, DescriptorKind::Akaze),
            (DetectorKind::Akaze, DescriptorKind::Orb),
        ]
    );
    assert_eq!(summary.error_count(), 0);

    let pairs: Vec<(String, String)> = rows(reporter)
        .into_iter()
        .map(|r| (r[0].clone(), r[3].clone()))
        .collect();
    assert!(!pairs.contains(&("SIFT".to_string(), "ORB".to_string())));
    assert!(!pairs.contains(&("SHITOMASI".to_string(), "AKAZE".to_string())));
    assert!(pairs.contains(&("AKAZE".to_string(), "AKAZE".to_string())));
}

#[test]
fn failing_pair_keeps_earlier_rows_and_sweep_continues() {
    let frames = vec![
        Gray::with_spots(20, 20, &spots()),
        Gray::with_spots(20, 20, &shifted(1)),
        Gray::with_spots(20, 20, &shifted(2)).broken(),
        Gray::with_spots(20, 20, &shifted(3)),
    ];
    let cfg = config(&[DetectorKind::Fast], &[DescriptorKind::Brief, DescriptorKind::Orb]);
    let mut toolkit = toolkit();
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new());

    let summary = Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    assert_eq!(summary.error_count(), 2);
    for outcome in &summary.pairs {
        match outcome {
            PairOutcome::Failed { frames, error, .. } => {
                assert_eq!(*frames, 2);
                assert!(matches!(error, BenchErr::Backend(_)));
            }
            PairOutcome::Completed { .. } => panic!("pair should have failed"),
        }
    }
    let rows = rows(reporter);
    assert_eq!(rows.len(), 4);
    // the second pair starts on a fresh buffer
    assert_eq!(rows[2][3], "ORB");
    assert_eq!(rows[2][5], "0");
}

#[test]
fn one_bad_pair_does_not_affect_the_next() {
    let frames = vec![
        Gray::with_spots(20, 20, &spots()),
        Gray::with_spots(20, 20, &shifted(1)),
    ];
    let cfg = config(&[DetectorKind::Harris, DetectorKind::Fast], &[DescriptorKind::Brief]);
    let mut toolkit = toolkit().with_detector(
        DetectorKind::Harris,
        |_: &Gray| -> BenchResult<Vec<Keypoint>> {
            Err(BenchErr::Backend("no response map".to_string()))
        },
    );
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new());

    let summary = Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    assert_eq!(summary.error_count(), 1);
    assert!(summary.pairs[0].is_failed());
    assert_eq!(summary.pairs[0].frames(), 0);
    assert!(matches!(summary.pairs[1], PairOutcome::Completed { frames: 2, .. }));
    let rows = rows(reporter);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r[0] == "FAST"));
}

#[test]
fn matcher_failure_leaves_frame_unmatched() {
    let frames = vec![
        Gray::with_spots(20, 20, &spots()),
        Gray::with_spots(24, 20, &spots()),
    ];
    let cfg = config(&[DetectorKind::Orb], &[DescriptorKind::Orb]);
    let mut toolkit = toolkit().with_extractor(DescriptorKind::Orb, width_rows);
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new());

    let summary = Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    assert_eq!(summary.error_count(), 0);
    let rows = rows(reporter);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][5], "0");
    assert!(buffer.latest().unwrap().matches.is_empty());
}

#[test]
fn no_match_counts_carry_over_between_pairs() {
    let frames = vec![
        Gray::with_spots(20, 20, &spots()),
        Gray::with_spots(20, 20, &shifted(1)),
    ];
    let cfg = config(&[DetectorKind::Fast, DetectorKind::Brisk], &[DescriptorKind::Brief]);
    let mut toolkit = toolkit();
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new());

    Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    let rows = rows(reporter);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1][5], "5");
    assert_eq!(rows[2][0], "BRISK");
    assert_eq!(rows[2][5], "0");
    assert_eq!(rows[2][6], "0.000");
    assert_eq!(rows[3][5], "5");
}

#[test]
fn region_and_limit_shape_keypoint_counts() {
    let frames = vec![Gray::with_spots(20, 20, &spots())];
    let mut cfg = config(&[DetectorKind::Fast, DetectorKind::ShiTomasi], &[DescriptorKind::Brief]);
    // (2,3), (7,7) and (5,12) lie inside
    cfg.roi = Some(Roi {
        x: 0.,
        y: 0.,
        width: 10.,
        height: 12.,
    });
    cfg.keypoint_limit = Some(2);
    let mut toolkit = toolkit();
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new()).keep_records();

    Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);
    let records = reporter.records().to_vec();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.keypoints == 2));

    let rows = rows(reporter);
    assert_eq!(rows[0][2], "2");
    // the buffer holds the last ShiTomasi frame: first two in detection order
    let kept: Vec<(f32, f32)> = buffer
        .latest()
        .unwrap()
        .keypoints
        .iter()
        .map(|k| (k.x, k.y))
        .collect();
    assert_eq!(kept, vec![(2., 3.), (7., 7.)]);
}

#[test]
fn unregistered_descriptor_fails_the_pair() {
    let frames = vec![Gray::with_spots(20, 20, &spots())];
    let cfg = config(&[DetectorKind::Fast], &[DescriptorKind::Freak]);
    let mut toolkit = Toolkit::new().with_detector(DetectorKind::Fast, bright_pixels);
    let mut buffer = FrameBuffer::default();
    let mut reporter = CsvReporter::new(Vec::new());

    let summary = Sweep::new(&cfg, &mut toolkit, &frames).run(&mut buffer, &mut reporter);

    assert_eq!(summary.error_count(), 1);
    assert!(matches!(
        &summary.pairs[0],
        PairOutcome::Failed {
            error: BenchErr::NotRegistered(_),
            ..
        }
    ));
    assert_eq!(reporter.rows(), 0);
}
