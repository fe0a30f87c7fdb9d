//! Group aggregation: assembling experiment clouds into one labeled table.

use crate::core::loaders::{CoordinateStore, Result};

/// Case specification for group aggregation.
///
/// `Flat` gives every case its own label (1-based position); `Grouped` shares
/// one label per inner sequence (1-based outer index).
#[derive(Debug, Clone, PartialEq)]
pub enum CaseSpec {
    Flat(Vec<String>),
    Grouped(Vec<Vec<String>>),
}

/// One row of the aggregated group table.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub point: [f32; 3],
    pub label: u32,
    pub case_name: String,
}

/// Consolidated table of points tagged with (label, case_name).
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    pub rows: Vec<LabeledPoint>,
}

impl GroupTable {
    /// Returns the number of rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the points carrying the given label, in table order.
    pub fn points_with_label(&self, label: u32) -> Vec<[f32; 3]> {
        self.rows
            .iter()
            .filter(|row| row.label == label)
            .map(|row| row.point)
            .collect()
    }

    /// Returns the distinct labels present, in first-appearance order.
    pub fn labels(&self) -> Vec<u32> {
        let mut labels = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.label) {
                labels.push(row.label);
            }
        }
        labels
    }

    fn append_case(&mut self, store: &CoordinateStore, case_name: &str, label: u32) -> Result<()> {
        let cloud = store.resolve(case_name)?;
        self.rows.extend(cloud.points.into_iter().map(|point| LabeledPoint {
            point,
            label,
            case_name: case_name.to_string(),
        }));
        Ok(())
    }
}

/// Aggregate experiment clouds into one labeled table.
///
/// Labels always start at 1. Store failures (`NotFound`, `Schema`) propagate
/// unchanged, aborting the aggregation.
pub fn extract_groupdata(spec: &CaseSpec, store: &CoordinateStore) -> Result<GroupTable> {
    let mut table = GroupTable::default();

    match spec {
        CaseSpec::Flat(case_names) => {
            for (i, case_name) in case_names.iter().enumerate() {
                table.append_case(store, case_name, i as u32 + 1)?;
            }
        }
        CaseSpec::Grouped(groups) => {
            for (i, group) in groups.iter().enumerate() {
                for case_name in group {
                    table.append_case(store, case_name, i as u32 + 1)?;
                }
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::{ColoredPointSet, LoaderError};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_case(dir: &Path, name: &str, triplets: Vec<f32>) {
        let set = ColoredPointSet {
            idx: 0,
            count: triplets.len() / 3,
            r: 0,
            g: 0,
            b: 0,
            name: name.to_string(),
            triplets,
        };
        let json = serde_json::to_string(&[set]).unwrap();
        std::fs::write(dir.join(format!("{}.json", name)), json).unwrap();
    }

    #[test]
    fn test_flat_labels_are_positions() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", vec![1.0, 1.0, 1.0]);
        write_case(dir.path(), "b", vec![2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        write_case(dir.path(), "c", vec![4.0, 4.0, 4.0]);

        let store = CoordinateStore::new(dir.path());
        let spec = CaseSpec::Flat(vec!["a".into(), "b".into(), "c".into()]);
        let table = extract_groupdata(&spec, &store).unwrap();

        assert_eq!(table.labels(), vec![1, 2, 3]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.points_with_label(2).len(), 2);
        assert_eq!(table.rows[0].case_name, "a");
    }

    #[test]
    fn test_grouped_labels_shared_within_group() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", vec![1.0, 1.0, 1.0]);
        write_case(dir.path(), "b", vec![2.0, 2.0, 2.0]);
        write_case(dir.path(), "c", vec![3.0, 3.0, 3.0]);

        let store = CoordinateStore::new(dir.path());
        let spec = CaseSpec::Grouped(vec![vec!["a".into(), "b".into()], vec!["c".into()]]);
        let table = extract_groupdata(&spec, &store).unwrap();

        assert_eq!(table.labels(), vec![1, 2]);
        assert_eq!(table.points_with_label(1).len(), 2);
        assert_eq!(table.points_with_label(2), vec![[3.0, 3.0, 3.0]]);
    }

    #[test]
    fn test_missing_case_propagates_not_found() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "a", vec![1.0, 1.0, 1.0]);

        let store = CoordinateStore::new(dir.path());
        let spec = CaseSpec::Flat(vec!["a".into(), "missing".into()]);

        assert!(matches!(
            extract_groupdata(&spec, &store),
            Err(LoaderError::NotFound(..))
        ));
    }

    #[test]
    fn test_row_order_follows_input_order() {
        let dir = TempDir::new().unwrap();
        write_case(dir.path(), "first", vec![1.0, 0.0, 0.0]);
        write_case(dir.path(), "second", vec![2.0, 0.0, 0.0]);

        let store = CoordinateStore::new(dir.path());
        let spec = CaseSpec::Flat(vec!["second".into(), "first".into()]);
        let table = extract_groupdata(&spec, &store).unwrap();

        assert_eq!(table.rows[0].point, [2.0, 0.0, 0.0]);
        assert_eq!(table.rows[0].label, 1);
        assert_eq!(table.rows[1].point, [1.0, 0.0, 0.0]);
        assert_eq!(table.rows[1].label, 2);
    }
}
