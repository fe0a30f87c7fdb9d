//! Core data loading and writing.

pub mod loaders;
pub mod writers;

pub use loaders::{ColoredPointSet, ComparisonSpec, CoordinateStore, PointCloud};
