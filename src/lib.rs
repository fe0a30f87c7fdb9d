//! Labeled 3D marker point cloud analysis pipeline.
//!
//! This crate provides tools for:
//! - Resolving experiment case names to point clouds (MeshView-style JSON)
//! - Aggregating cases into labeled groups and computing nearest-neighbor
//!   distance distributions between them
//! - Summarizing those distributions (density mode, mean, median)
//! - Spreading point clouds along a local cutting-plane normal with a
//!   seeded Gaussian perturbation (slice-thickness simulation)
//!
//! # Example
//!
//! ```no_run
//! use marker_pipeline::core::loaders::{load_case_overview, CoordinateStore};
//! use marker_pipeline::processors::distance::compare_clouds;
//! use marker_pipeline::config::DescriptionConfig;
//!
//! let store = CoordinateStore::new("data");
//! let overview = load_case_overview("case_overview.csv").unwrap();
//! let samples = compare_clouds(&overview, "T", &store, &DescriptionConfig::default()).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{AnalysisConfig, DensityConfig, DescriptionConfig, SpreadConfig};
pub use core::loaders::{ColoredPointSet, ComparisonSpec, CoordinateStore, PointCloud};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
