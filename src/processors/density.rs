//! Distribution summarization: density mode, mean, and median per comparison.
//!
//! The density estimate is a pure numerical operation returning sampled
//! (x, density) pairs; rendering (see [`crate::visualization`]) consumes that
//! result as a side concern and is never required for correctness.

use thiserror::Error;

use crate::config::DensityConfig;
use crate::processors::distance::DistanceSample;

/// Errors specific to distribution summarization.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("no distance samples to summarize")]
    NoSamples,

    #[error("density grid size must be at least 2, got {0}")]
    InvalidGridSize(usize),
}

/// Result type for summarization operations.
pub type Result<T> = std::result::Result<T, SummaryError>;

/// A sampled one-dimensional density curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
}

impl DensityCurve {
    /// Returns the x-value at which the curve attains its maximum height.
    pub fn peak(&self) -> f32 {
        let mut best = 0;
        for i in 1..self.ys.len() {
            if self.ys[i] > self.ys[best] {
                best = i;
            }
        }
        self.xs[best]
    }
}

/// Per-comparison summary of a distance distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    /// Human-readable comparison description
    pub comparison: String,
    /// Density mode (peak of the kernel estimate)
    pub peak: f32,
    pub mean: f32,
    pub median: f32,
}

/// Scott's-rule bandwidth: sample standard deviation times n^(-1/5).
fn scott_bandwidth(samples: &[f32]) -> f32 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let var = samples
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1) as f64;
    (var.sqrt() * (n as f64).powf(-0.2)) as f32
}

/// Fit a Gaussian kernel density estimate over the samples.
///
/// The curve is evaluated on a uniform grid of `grid_size` points spanning
/// the data range extended by `cut` bandwidths on both sides. Deterministic
/// for identical input. Degenerate inputs (a single sample, or zero
/// variance) collapse to a one-point curve at the sample value.
pub fn density_estimate(samples: &[f32], grid_size: usize, cut: f32) -> Result<DensityCurve> {
    if samples.is_empty() {
        return Err(SummaryError::NoSamples);
    }
    if grid_size < 2 {
        return Err(SummaryError::InvalidGridSize(grid_size));
    }

    let h = scott_bandwidth(samples) as f64;
    if !(h > 0.0) {
        return Ok(DensityCurve {
            xs: vec![samples[0]],
            ys: vec![1.0],
        });
    }

    let min = samples.iter().copied().fold(f32::MAX, f32::min) as f64;
    let max = samples.iter().copied().fold(f32::MIN, f32::max) as f64;
    let lo = min - cut as f64 * h;
    let hi = max + cut as f64 * h;
    let step = (hi - lo) / (grid_size - 1) as f64;

    let n = samples.len() as f64;
    let norm = 1.0 / (n * h * (2.0 * std::f64::consts::PI).sqrt());

    let mut xs = Vec::with_capacity(grid_size);
    let mut ys = Vec::with_capacity(grid_size);
    for i in 0..grid_size {
        let x = lo + step * i as f64;
        let density: f64 = samples
            .iter()
            .map(|&v| {
                let u = (x - v as f64) / h;
                (-0.5 * u * u).exp()
            })
            .sum::<f64>()
            * norm;
        xs.push(x as f32);
        ys.push(density as f32);
    }

    Ok(DensityCurve { xs, ys })
}

/// Mean of the raw distance values.
fn mean(values: &[f32]) -> f32 {
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

/// Median of the raw distance values.
fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Group distance samples by comparison index, in first-appearance order.
fn group_by_comparison(samples: &[DistanceSample]) -> Vec<(u32, String, Vec<f32>)> {
    let mut groups: Vec<(u32, String, Vec<f32>)> = Vec::new();
    for sample in samples {
        match groups.iter_mut().find(|(c, _, _)| *c == sample.comparison) {
            Some((_, _, dists)) => dists.push(sample.dist),
            None => groups.push((sample.comparison, sample.cases.clone(), vec![sample.dist])),
        }
    }
    groups
}

/// Compute one [`SummaryRecord`] per distinct comparison.
///
/// The peak comes from the kernel density estimate; mean and median are
/// computed directly over the raw distance values of the same comparison.
pub fn summarize(samples: &[DistanceSample], config: &DensityConfig) -> Result<Vec<SummaryRecord>> {
    if samples.is_empty() {
        return Err(SummaryError::NoSamples);
    }

    let mut records = Vec::new();
    for (_, description, dists) in group_by_comparison(samples) {
        let curve = density_estimate(&dists, config.grid_size, config.cut)?;
        records.push(SummaryRecord {
            comparison: description,
            peak: curve.peak(),
            mean: mean(&dists),
            median: median(&dists),
        });
    }

    Ok(records)
}

/// Density curves per comparison, labeled by description, for rendering.
pub fn density_curves(
    samples: &[DistanceSample],
    config: &DensityConfig,
) -> Result<Vec<(String, DensityCurve)>> {
    if samples.is_empty() {
        return Err(SummaryError::NoSamples);
    }

    group_by_comparison(samples)
        .into_iter()
        .map(|(_, description, dists)| {
            density_estimate(&dists, config.grid_size, config.cut)
                .map(|curve| (description, curve))
        })
        .collect()
}
