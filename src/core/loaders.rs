//! Data loaders for point-set JSON files and the case-overview CSV.
//!
//! This module provides:
//! - The colored point-set file schema (MeshView-compatible JSON)
//! - `CoordinateStore`, which resolves experiment case names to point clouds
//! - The case-overview CSV parser (one row per pairwise comparison)

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during file loading and case resolution.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("case '{0}' not found under '{1}'")]
    NotFound(String, PathBuf),

    #[error("schema error in '{path}': {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("missing required columns in '{path}': {columns}")]
    MissingColumns { path: PathBuf, columns: String },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One entry of the point-set file schema: a named, colored set of
/// interleaved x,y,z coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoredPointSet {
    pub idx: u32,
    pub count: usize,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub name: String,
    pub triplets: Vec<f32>,
}

impl ColoredPointSet {
    /// Returns the flat triplet sequence reshaped into ordered 3D points.
    ///
    /// The triplet length must already have been validated as a multiple
    /// of 3 (see [`load_point_sets`]).
    pub fn to_points(&self) -> Vec<[f32; 3]> {
        self.triplets
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect()
    }

    /// Returns a copy of this set with new coordinates, keeping the
    /// idx/color/name metadata.
    pub fn with_points(&self, points: &[[f32; 3]]) -> Self {
        let mut triplets = Vec::with_capacity(points.len() * 3);
        for p in points {
            triplets.extend_from_slice(p);
        }
        Self {
            idx: self.idx,
            count: points.len(),
            r: self.r,
            g: self.g,
            b: self.b,
            name: self.name.clone(),
            triplets,
        }
    }
}

/// An ordered 3D point cloud for one experiment case.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub case_name: String,
    pub points: Vec<[f32; 3]>,
}

impl PointCloud {
    /// Returns the number of points in the cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud contains no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One row of the case-overview table: a designated pairing of two cases
/// within a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSpec {
    pub panel: String,
    pub comparison: u32,
    pub case_1: String,
    pub case_2: String,
}

/// Load all point sets from a JSON file and validate triplet lengths.
pub fn load_point_sets<P: AsRef<Path>>(path: P) -> Result<Vec<ColoredPointSet>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let sets: Vec<ColoredPointSet> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| LoaderError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;

    for set in &sets {
        if set.triplets.len() % 3 != 0 {
            return Err(LoaderError::Schema {
                path: path.to_path_buf(),
                reason: format!(
                    "set '{}' has {} coordinates, not a multiple of 3",
                    set.name,
                    set.triplets.len()
                ),
            });
        }
    }

    Ok(sets)
}

/// Resolves experiment case names to point clouds stored as `<case>.json`
/// anywhere under a data directory.
#[derive(Debug, Clone)]
pub struct CoordinateStore {
    data_dir: PathBuf,
}

impl CoordinateStore {
    /// Create a store rooted at the given data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory of the store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a case name to its point cloud.
    ///
    /// Searches recursively for `<case_name>.json`, taking the first match in
    /// sorted path order. Files holding a single point set yield entry 0;
    /// multi-entry exports carry the marker coordinates in entry 2.
    pub fn resolve(&self, case_name: &str) -> Result<PointCloud> {
        let path = self.find_case_file(case_name)?;
        let sets = load_point_sets(&path)?;

        let set = match sets.len() {
            0 => {
                return Err(LoaderError::Schema {
                    path,
                    reason: "file contains no point sets".to_string(),
                })
            }
            1 => &sets[0],
            len => sets.get(2).ok_or_else(|| LoaderError::Schema {
                path: path.clone(),
                reason: format!("multi-entry file has {} entries, expected at least 3", len),
            })?,
        };

        Ok(PointCloud {
            case_name: case_name.to_string(),
            points: set.to_points(),
        })
    }

    fn find_case_file(&self, case_name: &str) -> Result<PathBuf> {
        let target = format!("{}.json", case_name);
        let mut matches = Vec::new();
        collect_files_named(&self.data_dir, &target, &mut matches)?;
        matches.sort();
        matches
            .into_iter()
            .next()
            .ok_or_else(|| LoaderError::NotFound(case_name.to_string(), self.data_dir.clone()))
    }
}

/// Recursively collect files with the given name under `dir`.
fn collect_files_named(dir: &Path, name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_named(&path, name, out)?;
        } else if path.file_name().map(|n| n == name).unwrap_or(false) {
            out.push(path);
        }
    }
    Ok(())
}

/// Recursively collect point-set JSON files under a directory, in sorted
/// path order, skipping previously generated `_spread` outputs.
pub fn find_point_set_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.retain(|p| {
        p.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| !s.ends_with("_spread"))
            .unwrap_or(true)
    });
    files.sort();
    Ok(files)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Load the case-overview CSV.
///
/// Expected columns (case-insensitive): `panel`, `comparison`, `case_1`,
/// `case_2`. One row per pairwise comparison.
pub fn load_case_overview<P: AsRef<Path>>(path: P) -> Result<Vec<ComparisonSpec>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (panel_idx, comp_idx, c1_idx, c2_idx) =
        match (col("panel"), col("comparison"), col("case_1"), col("case_2")) {
            (Some(p), Some(c), Some(a), Some(b)) => (p, c, a, b),
            _ => {
                return Err(LoaderError::MissingColumns {
                    path: path.to_path_buf(),
                    columns: "panel, comparison, case_1, case_2".to_string(),
                })
            }
        };

    let mut specs = Vec::new();
    for result in reader.records() {
        let record = result?;
        let comparison: u32 = record
            .get(comp_idx)
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| LoaderError::Schema {
                path: path.to_path_buf(),
                reason: format!("non-integer comparison value in row {:?}", record),
            })?;

        specs.push(ComparisonSpec {
            panel: record.get(panel_idx).unwrap_or_default().trim().to_string(),
            comparison,
            case_1: record.get(c1_idx).unwrap_or_default().trim().to_string(),
            case_2: record.get(c2_idx).unwrap_or_default().trim().to_string(),
        });
    }

    Ok(specs)
}
