use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    time::Duration,
};

use crate::{millis, BenchResult, DescriptorKind, DetectorKind};

pub const CSV_HEADER: &str = "detect T,t_detect,keypoints,descr T,t_extract,matches,t_match";

/// Metrics of one processed frame for one detector/descriptor pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub detector: DetectorKind,
    pub detect_time: Duration,
    /// Keypoints left after region and count filtering.
    pub keypoints: usize,
    pub descriptor: DescriptorKind,
    pub extract_time: Duration,
    /// Zero for frames that had no predecessor to match against.
    pub matches: usize,
    pub match_time: Duration,
}

impl MetricRecord {
    pub fn csv_row(&self) -> String {
        format!(
            "{},{:.3},{},{},{:.3},{},{:.3}",
            self.detector,
            millis(self.detect_time),
            self.keypoints,
            self.descriptor,
            millis(self.extract_time),
            self.matches,
            millis(self.match_time),
        )
    }
}

/// Writes one CSV row per frame.
///
/// The header goes out once, before the first row. Each row is flushed as
/// soon as it's written. Records are only kept in memory after
/// [`CsvReporter::keep_records`]; a long sweep otherwise holds nothing but a
/// row count.
pub struct CsvReporter<W: Write> {
    out: W,
    header_written: bool,
    rows: usize,
    records: Option<Vec<MetricRecord>>,
}

impl CsvReporter<BufWriter<File>> {
    /// Create (or truncate) a CSV file, creating missing parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> CsvReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
            rows: 0,
            records: None,
        }
    }

    /// Also keep every written record, readable through [`records`](Self::records).
    pub fn keep_records(mut self) -> Self {
        self.records.get_or_insert_with(Vec::new);
        self
    }

    pub fn write(&mut self, record: MetricRecord) -> BenchResult<()> {
        if !self.header_written {
            writeln!(self.out, "{}", CSV_HEADER)?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", record.csv_row())?;
        self.out.flush()?;
        self.rows += 1;
        if let Some(records) = &mut self.records {
            records.push(record);
        }
        Ok(())
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Kept records; empty unless [`keep_records`](Self::keep_records) was
    /// called.
    pub fn records(&self) -> &[MetricRecord] {
        self.records.as_deref().unwrap_or(&[])
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
