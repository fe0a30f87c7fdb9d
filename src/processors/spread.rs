//! Slice-thickness spreading: displacing points along a local cutting-plane
//! normal with a seeded Gaussian perturbation.
//!
//! All draws come from one caller-owned generator, consumed in input-list
//! order and then point order within each set, so repeated runs over the same
//! ordered input produce byte-identical output. The generator is seeded once
//! per run (default seed [`DEFAULT_SEED`]) and never re-seeded between sets.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

use crate::core::loaders::{load_point_sets, ColoredPointSet};
use crate::core::writers::{spread_output_path, write_point_sets};

/// Fixed seed for reproducible spreading runs.
pub const DEFAULT_SEED: u64 = 12345;

/// Default standard deviation of the perturbation.
pub const DEFAULT_SD: f32 = 2.5;

/// Errors specific to the spreading pipeline.
#[derive(Debug, Error)]
pub enum SpreadError {
    #[error("set '{name}': plane estimation needs at least 3 points, found {count}")]
    TooFewPoints { name: String, count: usize },

    #[error("set '{name}': reference points are collinear, plane normal is degenerate")]
    DegenerateGeometry { name: String },

    #[error("standard deviation must be non-negative, got {0}")]
    InvalidSigma(f32),
}

/// Result type for spreading operations.
pub type Result<T> = std::result::Result<T, SpreadError>;

/// Select the indices of a locally coplanar reference triple.
///
/// Distinct z-values are scanned in ascending order; the first z-value with
/// at least 3 points within `z_tolerance` selects the first 3 such points in
/// original order. If no z-value qualifies, index positions (0, 2, 1) are
/// used, in that re-ordering.
fn reference_triple(points: &[[f32; 3]], z_tolerance: f32) -> [usize; 3] {
    let mut z_values: Vec<f32> = points.iter().map(|p| p[2]).collect();
    z_values.sort_by(|a, b| a.total_cmp(b));
    z_values.dedup();

    for z in z_values {
        let mut triple = [0usize; 3];
        let mut found = 0;
        for (i, p) in points.iter().enumerate() {
            if (p[2] - z).abs() <= z_tolerance {
                triple[found] = i;
                found += 1;
                if found == 3 {
                    return triple;
                }
            }
        }
    }

    [0, 2, 1]
}

/// Unit normal of the plane through three points, if they span one.
///
/// Returns `None` when the cross product of the two edge vectors has zero
/// magnitude (collinear points).
pub fn plane_normal(a: &[f32; 3], b: &[f32; 3], c: &[f32; 3]) -> Option<[f32; 3]> {
    let u = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let v = [a[0] - c[0], a[1] - c[1], a[2] - c[2]];

    let cross = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];

    let norm = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    if norm == 0.0 {
        return None;
    }
    Some([cross[0] / norm, cross[1] / norm, cross[2] / norm])
}

/// Spread one point set along its estimated cutting-plane normal.
///
/// Every point (reference points included) is displaced by `g · n̂` with
/// `g ~ N(0, sd)`, drawn sequentially from `rng` in point order. The input
/// set is left unmodified; the result carries the same idx/color/name
/// metadata. `sd = 0` yields coordinates identical to the input.
pub fn spread_set(
    set: &ColoredPointSet,
    sd: f32,
    z_tolerance: f32,
    rng: &mut StdRng,
) -> Result<ColoredPointSet> {
    if sd < 0.0 || !sd.is_finite() {
        return Err(SpreadError::InvalidSigma(sd));
    }

    let points = set.to_points();
    if points.len() < 3 {
        return Err(SpreadError::TooFewPoints {
            name: set.name.clone(),
            count: points.len(),
        });
    }

    let [i1, i2, i3] = reference_triple(&points, z_tolerance);
    let normal = plane_normal(&points[i1], &points[i2], &points[i3]).ok_or_else(|| {
        SpreadError::DegenerateGeometry {
            name: set.name.clone(),
        }
    })?;

    // sd has been validated above, so construction cannot fail
    let gauss = Normal::new(0.0f32, sd).map_err(|_| SpreadError::InvalidSigma(sd))?;

    let displaced: Vec<[f32; 3]> = points
        .iter()
        .map(|p| {
            let g = gauss.sample(rng);
            [
                p[0] + normal[0] * g,
                p[1] + normal[1] * g,
                p[2] + normal[2] * g,
            ]
        })
        .collect();

    Ok(set.with_points(&displaced))
}

/// Spread a collection of point sets in input-list order.
///
/// Stops on the first failure; progress is logged per set.
pub fn spread_sets(
    sets: &[ColoredPointSet],
    sd: f32,
    z_tolerance: f32,
    rng: &mut StdRng,
) -> Result<Vec<ColoredPointSet>> {
    let mut out = Vec::with_capacity(sets.len());
    for set in sets {
        log::info!("spreading set '{}' ({} points)", set.name, set.count);
        out.push(spread_set(set, sd, z_tolerance, rng)?);
    }
    Ok(out)
}

/// Spread every point set in a file and write the `_spread` sibling.
///
/// The output uses the same schema as the input and is written via a
/// temporary file, so a failed run leaves no partial output. Returns the
/// output path.
pub fn spread_file(
    input: &Path,
    sd: f32,
    z_tolerance: f32,
    rng: &mut StdRng,
) -> anyhow::Result<PathBuf> {
    let sets = load_point_sets(input)?;
    let spread = spread_sets(&sets, sd, z_tolerance, rng)?;

    let out_path = spread_output_path(input);
    write_point_sets(&out_path, &spread)?;
    log::info!("{} -> {}", input.display(), out_path.display());

    Ok(out_path)
}
