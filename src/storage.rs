//! CSV sample storage, one file per sweep step.
//!
//! Each step lands in `scan_<|current|>.csv` inside the session directory:
//! the metadata snapshot as leading `#`-prefixed comment rows, then a
//! `time,quadrant,ch0,ch1` table of the decoded samples.

use crate::error::AppResult;
use crate::frame::SampleSet;
use crate::metadata::MetadataMap;
use crate::scan::SampleSink;
use chrono::Local;
use log::debug;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build a timestamped session directory path under `base`.
pub fn session_dir(base: &Path) -> PathBuf {
    base.join(format!("scan_{}", Local::now().format("%Y%m%d_%H%M%S")))
}

/// [`SampleSink`] writing one CSV file per step.
pub struct CsvStepWriter {
    dir: PathBuf,
}

impl CsvStepWriter {
    /// Create the writer, creating `dir` (and parents) if needed.
    pub fn new(dir: &Path) -> AppResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory the step files land in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn step_path(&self, current: f64) -> PathBuf {
        self.dir.join(format!("scan_{:.3}.csv", current.abs()))
    }
}

impl SampleSink for CsvStepWriter {
    fn write_step(
        &mut self,
        current: f64,
        meta: &MetadataMap,
        samples: &SampleSet,
    ) -> AppResult<()> {
        let path = self.step_path(current);
        debug!("writing {} samples to {}", samples.len(), path.display());

        let mut file = File::create(&path)?;
        for (key, value) in meta.iter() {
            writeln!(file, "# {} {}", key, value)?;
        }

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["time", "quadrant", "ch0", "ch1"])?;
        for i in 0..samples.len() {
            writer.write_record([
                samples.time[i].to_string(),
                samples.quadrant[i].to_string(),
                samples.ch0[i].to_string(),
                samples.ch1[i].to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> SampleSet {
        SampleSet {
            time: vec![1, 4],
            quadrant: vec![0, 1],
            ch0: vec![2, 5],
            ch1: vec![3, 6],
        }
    }

    #[test]
    fn writes_metadata_comments_then_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvStepWriter::new(dir.path()).unwrap();

        let mut meta = MetadataMap::new();
        meta.insert("LASERID", "LASER-A");
        meta.insert("LASERCUR", "-1.900");

        writer.write_step(-1.9, &meta, &sample_set()).unwrap();

        let content = fs::read_to_string(dir.path().join("scan_1.900.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "# LASERID LASER-A");
        assert_eq!(lines[1], "# LASERCUR -1.900");
        assert_eq!(lines[2], "time,quadrant,ch0,ch1");
        assert_eq!(lines[3], "1,0,2,3");
        assert_eq!(lines[4], "4,1,5,6");
    }

    #[test]
    fn file_name_uses_current_magnitude() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvStepWriter::new(dir.path()).unwrap();
        assert!(writer
            .step_path(-2.402)
            .ends_with("scan_2.402.csv"));
    }

    #[test]
    fn session_dir_nests_under_base() {
        let path = session_dir(Path::new("data"));
        assert!(path.starts_with("data"));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("scan_")));
    }
}
