//! Nearest-neighbor distance analysis between labeled point-cloud groups.
//!
//! For every comparison the two case clouds are aggregated, partitioned by
//! label, and each point of group 1 is matched to its nearest neighbor in
//! group 2. Queries run against a `kiddo` KD-tree, which produces the same
//! minima as the brute-force pairwise scan ([`distance_matrix`]) at
//! O(n log n) instead of O(m·n).

use anyhow::Result;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use thiserror::Error;

use crate::config::DescriptionConfig;
use crate::core::loaders::{ComparisonSpec, CoordinateStore};
use crate::processors::grouping::{extract_groupdata, CaseSpec};

/// Errors specific to distance analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("comparison {comparison}: group for case '{case_name}' has no points")]
    EmptyCloud { comparison: u32, case_name: String },

    #[error(
        "panel '{panel}': no description for comparison {comparison} (table has {table_len} entries)"
    )]
    MissingDescription {
        panel: String,
        comparison: u32,
        table_len: usize,
    },

    #[error("no comparisons found for panel '{0}'")]
    NoComparisons(String),
}

/// One scalar nearest-neighbor distance, tagged with its comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceSample {
    pub dist: f32,
    pub comparison: u32,
    pub cases: String,
}

/// Euclidean distance between two points.
#[inline]
pub fn euclidean(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Full pairwise distance matrix between two clouds, shape `a.len() × b.len()`.
///
/// This is the brute-force reference for the KD-tree minima and stays cheap
/// at the expected scale of hundreds of points.
pub fn distance_matrix(a: &[[f32; 3]], b: &[[f32; 3]]) -> Vec<Vec<f32>> {
    a.iter()
        .map(|pa| b.iter().map(|pb| euclidean(pa, pb)).collect())
        .collect()
}

/// Nearest-neighbor distance from every point of `from` to the cloud `to`.
///
/// `to` must be nonempty; callers guard with [`AnalysisError::EmptyCloud`].
pub fn min_distances(from: &[[f32; 3]], to: &[[f32; 3]]) -> Vec<f32> {
    let tree: ImmutableKdTree<f32, 3> = ImmutableKdTree::new_from_slice(to);
    from.iter()
        .map(|p| tree.nearest_one::<SquaredEuclidean>(p).distance.sqrt())
        .collect()
}

/// Resolve the description for one comparison.
fn describe(
    spec: &ComparisonSpec,
    table: Option<&[String]>,
) -> std::result::Result<String, AnalysisError> {
    match table {
        Some(table) => {
            let idx = spec.comparison.checked_sub(1).map(|i| i as usize);
            match idx.and_then(|i| table.get(i)) {
                Some(description) => Ok(description.clone()),
                None => Err(AnalysisError::MissingDescription {
                    panel: spec.panel.clone(),
                    comparison: spec.comparison,
                    table_len: table.len(),
                }),
            }
        }
        None => Ok(format!("{} vs {}", spec.case_1, spec.case_2)),
    }
}

/// Compute nearest-neighbor distance samples for every comparison of a panel.
///
/// Comparisons run in encounter order; within a comparison the samples are
/// sorted ascending by distance (point correspondence is discarded). The
/// batch stops on the first failure.
pub fn compare_clouds(
    overview: &[ComparisonSpec],
    panel: &str,
    store: &CoordinateStore,
    descriptions: &DescriptionConfig,
) -> Result<Vec<DistanceSample>> {
    let specs: Vec<&ComparisonSpec> = overview.iter().filter(|s| s.panel == panel).collect();
    if specs.is_empty() {
        return Err(AnalysisError::NoComparisons(panel.to_string()).into());
    }

    let table = descriptions.table_for(panel);

    // Validate description coverage up front so a bad table fails the batch
    // before any distances are computed.
    for spec in &specs {
        describe(spec, table)?;
    }

    let mut samples = Vec::new();
    for spec in specs {
        log::info!(
            "comparison {}: {} vs {}",
            spec.comparison,
            spec.case_1,
            spec.case_2
        );

        let case_names = CaseSpec::Flat(vec![spec.case_1.clone(), spec.case_2.clone()]);
        let table_rows = extract_groupdata(&case_names, store)?;

        let cloud1 = table_rows.points_with_label(1);
        let cloud2 = table_rows.points_with_label(2);

        if cloud1.is_empty() {
            return Err(AnalysisError::EmptyCloud {
                comparison: spec.comparison,
                case_name: spec.case_1.clone(),
            }
            .into());
        }
        if cloud2.is_empty() {
            return Err(AnalysisError::EmptyCloud {
                comparison: spec.comparison,
                case_name: spec.case_2.clone(),
            }
            .into());
        }

        let mut dists = min_distances(&cloud1, &cloud2);
        dists.sort_by(|a, b| a.total_cmp(b));

        let description = describe(spec, table)?;
        samples.extend(dists.into_iter().map(|dist| DistanceSample {
            dist,
            comparison: spec.comparison,
            cases: description.clone(),
        }));
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::ColoredPointSet;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_case(dir: &Path, name: &str, points: &[[f32; 3]]) {
        let mut triplets = Vec::new();
        for p in points {
            triplets.extend_from_slice(p);
        }
        let set = ColoredPointSet {
            idx: 0,
            count: points.len(),
            r: 0,
            g: 0,
            b: 0,
            name: name.to_string(),
            triplets,
        };
        let json = serde_json::to_string(&[set]).unwrap();
        std::fs::write(dir.join(format!("{}.json", name)), json).unwrap();
    }

    fn spec(panel: &str, comparison: u32, case_1: &str, case_2: &str) -> ComparisonSpec {
        ComparisonSpec {
            panel: panel.to_string(),
            comparison,
            case_1: case_1.to_string(),
            case_2: case_2.to_string(),
        }
    }

    #[test]
    fn test_euclidean_symmetry() {
        let a = [1.0, 2.0, 3.0];
        let b = [-4.0, 0.5, 9.0];
        assert_eq!(euclidean(&a, &b), euclidean(&b, &a));
    }

    #[test]
    fn test_distance_matrix_shape() {
        let a = vec![[0.0f32; 3]; 4];
        let b = vec![[1.0f32; 3]; 7];
        let matrix = distance_matrix(&a, &b);
        assert_eq!(matrix.len(), 4);
        assert!(matrix.iter().all(|row| row.len() == 7));
    }

    #[test]
    fn test_min_distance_exact_scenario() {
        // A = {(0,0,0)}, B = {(1,0,0), (0,0,5)} => min distance 1.0 exactly
        let a = vec![[0.0, 0.0, 0.0]];
        let b = vec![[1.0, 0.0, 0.0], [0.0, 0.0, 5.0]];
        let dists = min_distances(&a, &b);
        assert_eq!(dists, vec![1.0]);
    }

    #[test]
    fn test_min_distance_zero_iff_member() {
        let b = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];

        let member = vec![[4.0, 5.0, 6.0]];
        assert_eq!(min_distances(&member, &b), vec![0.0]);

        let outsider = vec![[4.0, 5.0, 6.5]];
        assert!(min_distances(&outsider, &b)[0] > 0.0);
    }

    #[test]
    fn test_min_distances_match_brute_force() {
        let from: Vec<[f32; 3]> = (0..20)
            .map(|i| {
                let t = i as f32;
                [t * 0.7 - 5.0, (t * 1.3).sin() * 4.0, t * 0.1]
            })
            .collect();
        let to: Vec<[f32; 3]> = (0..15)
            .map(|i| {
                let t = i as f32;
                [(t * 0.9).cos() * 6.0, t * 0.5 - 3.0, (t * 0.3).sin()]
            })
            .collect();

        let fast = min_distances(&from, &to);
        let matrix = distance_matrix(&from, &to);
        for (i, row) in matrix.iter().enumerate() {
            let brute = row.iter().copied().fold(f32::MAX, f32::min);
            assert!((fast[i] - brute).abs() < 1e-4, "point {}: {} vs {}", i, fast[i], brute);
        }
    }

    #[test]
    fn test_compare_clouds_sorted_and_tagged() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", &[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
        write_case(dir.path(), "b", &[[1.0, 0.0, 0.0]]);
        let store = CoordinateStore::new(dir.path());

        let overview = vec![spec("S", 1, "a", "b")];
        let samples =
            compare_clouds(&overview, "S", &store, &DescriptionConfig::default()).unwrap();

        assert_eq!(samples.len(), 2);
        assert!(samples[0].dist <= samples[1].dist);
        assert_eq!(samples[0].dist, 1.0);
        assert_eq!(samples[0].comparison, 1);
        assert_eq!(samples[0].cases, "a vs b");
    }

    #[test]
    fn test_compare_clouds_panel_table_description() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", &[[0.0, 0.0, 0.0]]);
        write_case(dir.path(), "b", &[[1.0, 0.0, 0.0]]);
        let store = CoordinateStore::new(dir.path());

        let overview = vec![spec("T", 1, "a", "b")];
        let samples =
            compare_clouds(&overview, "T", &store, &DescriptionConfig::default()).unwrap();

        assert_eq!(samples[0].cases, "ABC combined vs FGH combined");
    }

    #[test]
    fn test_compare_clouds_missing_description_fails_early() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", &[[0.0, 0.0, 0.0]]);
        write_case(dir.path(), "b", &[[1.0, 0.0, 0.0]]);
        let store = CoordinateStore::new(dir.path());

        // Default "T" table has 2 entries; comparison 3 is uncovered.
        let overview = vec![spec("T", 3, "a", "b")];
        let err = compare_clouds(&overview, "T", &store, &DescriptionConfig::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::MissingDescription { comparison: 3, .. })
        ));
    }

    #[test]
    fn test_compare_clouds_empty_panel() {
        let dir = TempDir::new().unwrap();
        let store = CoordinateStore::new(dir.path());

        let overview = vec![spec("S", 1, "a", "b")];
        let err = compare_clouds(&overview, "X", &store, &DescriptionConfig::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::NoComparisons(_))
        ));
    }

    #[test]
    fn test_compare_clouds_empty_cloud() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", &[[0.0, 0.0, 0.0]]);
        write_case(dir.path(), "b", &[]);
        let store = CoordinateStore::new(dir.path());

        let overview = vec![spec("S", 1, "a", "b")];
        let err = compare_clouds(&overview, "S", &store, &DescriptionConfig::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::EmptyCloud { comparison: 1, .. })
        ));
    }

    #[test]
    fn test_compare_clouds_concatenates_in_encounter_order() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", &[[0.0, 0.0, 0.0]]);
        write_case(dir.path(), "b", &[[1.0, 0.0, 0.0]]);
        write_case(dir.path(), "c", &[[0.0, 2.0, 0.0]]);
        let store = CoordinateStore::new(dir.path());

        let overview = vec![spec("S", 2, "a", "b"), spec("S", 1, "a", "c")];
        let samples =
            compare_clouds(&overview, "S", &store, &DescriptionConfig::default()).unwrap();

        // Encounter order, not comparison-index order
        assert_eq!(samples[0].comparison, 2);
        assert_eq!(samples[1].comparison, 1);
        assert_eq!(samples[1].dist, 2.0);
    }
}
