//! Processing stages of the marker pipeline.
//!
//! - `grouping`: aggregation of case clouds into one labeled table
//! - `distance`: nearest-neighbor distance analysis between groups
//! - `density`: distribution summarization (density mode, mean, median)
//! - `spread`: slice-thickness simulation along the cutting-plane normal

pub mod density;
pub mod distance;
pub mod grouping;
pub mod spread;
