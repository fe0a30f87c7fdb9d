//! Visualization tools for distance distributions.
//!
//! Renders the summarizer's pure density curves as a PNG line chart using
//! the plotters library. Rendering is a byproduct for inspection; the
//! summarizer never depends on it.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::processors::density::DensityCurve;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("no density curves to plot")]
    EmptyInput,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default plot width in pixels.
const DEFAULT_WIDTH: u32 = 1280;

/// Default plot height in pixels.
const DEFAULT_HEIGHT: u32 = 960;

/// Color palette for comparison curves.
const CURVE_COLORS: &[(u8, u8, u8)] = &[
    (128, 128, 128), // Gray
    (228, 26, 28),   // Red
    (55, 126, 184),  // Blue
    (77, 175, 74),   // Green
    (152, 78, 163),  // Purple
    (255, 127, 0),   // Orange
];

/// Plot one density curve per comparison and save as PNG.
///
/// Curves are drawn in input order with a fixed palette cycling per
/// comparison.
pub fn plot_density_curves(
    output_path: &Path,
    curves: &[(String, DensityCurve)],
) -> Result<()> {
    if curves.is_empty() {
        return Err(VisualizationError::EmptyInput);
    }

    let (x_min, x_max, y_max) = compute_bounds(curves);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = y_max * 0.05;

    let root =
        BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            0.0f32..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    for (i, (_, curve)) in curves.iter().enumerate() {
        let (r, g, b) = CURVE_COLORS[i % CURVE_COLORS.len()];
        let color = RGBColor(r, g, b);

        chart
            .draw_series(LineSeries::new(
                curve.xs.iter().copied().zip(curve.ys.iter().copied()),
                color.stroke_width(2),
            ))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    }

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Compute the x range and maximum density across all curves.
fn compute_bounds(curves: &[(String, DensityCurve)]) -> (f32, f32, f32) {
    let mut x_min = f32::MAX;
    let mut x_max = f32::MIN;
    let mut y_max = f32::MIN;

    for (_, curve) in curves {
        for &x in &curve.xs {
            if x < x_min {
                x_min = x;
            }
            if x > x_max {
                x_max = x;
            }
        }
        for &y in &curve.ys {
            if y > y_max {
                y_max = y;
            }
        }
    }

    if (x_max - x_min).abs() < f32::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }

    (x_min, x_max, y_max)
}
