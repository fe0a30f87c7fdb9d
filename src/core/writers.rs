//! Data writers for analysis tables and point-set JSON files.
//!
//! This module provides functions for writing pipeline outputs:
//! - Distance-sample CSV (`dist,comparison,cases`)
//! - Summary CSV (`comparison,peak,mean,median`)
//! - Point-set JSON per the colored point-set schema
//!
//! JSON outputs are written to a temporary sibling file and renamed into
//! place on success, so an interrupted run never leaves a corrupt file.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::loaders::ColoredPointSet;
use crate::processors::density::SummaryRecord;
use crate::processors::distance::DistanceSample;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error for '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("JSON serialization error for '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(BufWriter::new(file)))
}

/// Write distance samples to CSV with `dist,comparison,cases` columns.
///
/// Row order is preserved: comparisons in encounter order, ascending
/// distance within each comparison.
pub fn write_distances_csv(path: &Path, samples: &[DistanceSample]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    let path_str = path.display().to_string();

    writer
        .write_record(["dist", "comparison", "cases"])
        .map_err(|e| WriteError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

    for sample in samples {
        writer
            .write_record(&[
                format!("{:.6}", sample.dist),
                sample.comparison.to_string(),
                sample.cases.clone(),
            ])
            .map_err(|e| WriteError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write summary records to CSV with `comparison,peak,mean,median` columns.
pub fn write_summary_csv(path: &Path, records: &[SummaryRecord]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    let path_str = path.display().to_string();

    writer
        .write_record(["comparison", "peak", "mean", "median"])
        .map_err(|e| WriteError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

    for record in records {
        writer
            .write_record(&[
                record.comparison.clone(),
                format!("{:.6}", record.peak),
                format!("{:.6}", record.mean),
                format!("{:.6}", record.median),
            ])
            .map_err(|e| WriteError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write point sets as a JSON array per the colored point-set schema.
///
/// The data is written to a `.tmp` sibling first and renamed into place, so
/// the target path either holds the previous content or the complete new
/// content, never a partial write.
pub fn write_point_sets(path: &Path, sets: &[ColoredPointSet]) -> Result<()> {
    ensure_parent_dirs(path)?;

    let tmp_path = path.with_extension("json.tmp");
    let path_str = path.display().to_string();

    let file = File::create(&tmp_path).map_err(|e| WriteError::CreateFile {
        path: tmp_path.display().to_string(),
        source: e,
    })?;
    serde_json::to_writer(BufWriter::new(file), sets).map_err(|e| WriteError::Json {
        path: path_str.clone(),
        source: e,
    })?;

    fs::rename(&tmp_path, path).map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Derive the spread output path: `_spread` inserted before the extension.
pub fn spread_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = input.extension().and_then(|s| s.to_str()).unwrap_or("json");
    input.with_file_name(format!("{}_spread.{}", stem, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::load_point_sets;
    use tempfile::tempdir;

    #[test]
    fn test_write_distances_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("distances.csv");
        let samples = vec![
            DistanceSample {
                dist: 0.5,
                comparison: 1,
                cases: "a vs b".to_string(),
            },
            DistanceSample {
                dist: 1.25,
                comparison: 1,
                cases: "a vs b".to_string(),
            },
        ];

        write_distances_csv(&path, &samples).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "dist,comparison,cases");
        assert_eq!(lines[1], "0.500000,1,a vs b");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_summary_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let records = vec![SummaryRecord {
            comparison: "a vs b".to_string(),
            peak: 1.0,
            mean: 1.5,
            median: 1.25,
        }];

        write_summary_csv(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "comparison,peak,mean,median");
        assert_eq!(lines[1], "a vs b,1.000000,1.500000,1.250000");
    }

    #[test]
    fn test_write_point_sets_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        let sets = vec![ColoredPointSet {
            idx: 0,
            count: 1,
            r: 255,
            g: 0,
            b: 0,
            name: "exp1".to_string(),
            triplets: vec![1.0, 2.0, 3.0],
        }];

        write_point_sets(&path, &sets).unwrap();

        let loaded = load_point_sets(&path).unwrap();
        assert_eq!(loaded, sets);

        // No temporary file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("out.json");

        write_point_sets(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_spread_output_path() {
        assert_eq!(
            spread_output_path(Path::new("/data/exp1.json")),
            PathBuf::from("/data/exp1_spread.json")
        );
        assert_eq!(
            spread_output_path(Path::new("exp1.json")),
            PathBuf::from("exp1_spread.json")
        );
    }
}
