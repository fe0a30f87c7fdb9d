//! Configuration types for the marker pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Human-readable descriptions for comparisons, keyed by panel.
///
/// Panels present in the map use the table entry at `comparison - 1`; other
/// panels synthesize a "`case_1` vs `case_2`" description. Completeness is
/// validated before any comparison runs, never at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionConfig {
    #[serde(default = "default_description_tables")]
    pub tables: HashMap<String, Vec<String>>,
}

fn default_description_tables() -> HashMap<String, Vec<String>> {
    let mut tables = HashMap::new();
    tables.insert(
        "T".to_string(),
        vec![
            "ABC combined vs FGH combined".to_string(),
            "ABC combined vs KLM combined".to_string(),
        ],
    );
    tables
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            tables: default_description_tables(),
        }
    }
}

impl DescriptionConfig {
    /// Returns the fixed description table for a panel, if one is configured.
    pub fn table_for(&self, panel: &str) -> Option<&[String]> {
        self.tables.get(panel).map(|v| v.as_slice())
    }
}

/// Configuration for the kernel density estimate used by the summarizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityConfig {
    /// Number of grid points the density curve is evaluated on
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,

    /// Grid extension beyond the data range, in bandwidths
    #[serde(default = "default_cut")]
    pub cut: f32,
}

fn default_grid_size() -> usize {
    200
}

fn default_cut() -> f32 {
    3.0
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            cut: default_cut(),
        }
    }
}

/// Configuration for the slice-thickness spreading pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadConfig {
    /// Standard deviation of the Gaussian perturbation
    #[serde(default = "default_sd")]
    pub sd: f32,

    /// Seed for the shared random generator, applied once per run
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Absolute z tolerance when searching for a coplanar reference triple
    #[serde(default = "default_z_tolerance")]
    pub z_tolerance: f32,
}

fn default_sd() -> f32 {
    2.5
}

fn default_seed() -> u64 {
    12345
}

fn default_z_tolerance() -> f32 {
    1.0
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            sd: default_sd(),
            seed: default_seed(),
            z_tolerance: default_z_tolerance(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub descriptions: DescriptionConfig,

    #[serde(default)]
    pub density: DensityConfig,

    #[serde(default)]
    pub spread: SpreadConfig,
}

impl AnalysisConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptions() {
        let config = DescriptionConfig::default();
        let table = config.table_for("T").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], "ABC combined vs FGH combined");
        assert!(config.table_for("S").is_none());
    }

    #[test]
    fn test_default_analysis_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.density.grid_size, 200);
        assert_eq!(config.density.cut, 3.0);
        assert_eq!(config.spread.sd, 2.5);
        assert_eq!(config.spread.seed, 12345);
        assert_eq!(config.spread.z_tolerance, 1.0);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = AnalysisConfig::default();
        config.spread.sd = 1.0;
        config.to_yaml(&path).unwrap();

        let loaded = AnalysisConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.spread.sd, 1.0);
        assert_eq!(loaded.density.grid_size, 200);
    }
}
