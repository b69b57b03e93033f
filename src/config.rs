//! Deployment configuration
//!
//! Every section has defaults, so an empty YAML document is a valid config.

use crate::graph::{LayerName, MultiplexError, MultiplexResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub paths: PathsConfig,
    pub coupling: CouplingConfig,
    pub pagerank: PageRankConfig,
    pub communities: CommunityConfig,
    pub asymmetry: AsymmetryConfig,
    pub meta_stability: MetaStabilityConfig,
    pub dominance: DominanceConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> MultiplexResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> MultiplexResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MultiplexError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Reject values no analysis can run with
    pub fn validate(&self) -> MultiplexResult<()> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(MultiplexError::Config(format!("{} must be in [0, 1], got {}", name, v)))
            }
        };
        let percentile = |name: &str, v: f64| {
            if (0.0..=100.0).contains(&v) {
                Ok(())
            } else {
                Err(MultiplexError::Config(format!("{} must be in [0, 100], got {}", name, v)))
            }
        };

        unit("coupling.default_strength", self.coupling.default_strength)?;
        unit("pagerank.inter_layer_weight", self.pagerank.inter_layer_weight)?;
        unit("pagerank.damping", self.pagerank.damping)?;
        unit("meta_stability.high_band", self.meta_stability.high_band)?;
        unit("meta_stability.moderate_band", self.meta_stability.moderate_band)?;
        percentile("asymmetry.hub_percentile", self.asymmetry.hub_percentile)?;
        percentile("asymmetry.periphery_percentile", self.asymmetry.periphery_percentile)?;
        percentile("dominance.dominant_percentile", self.dominance.dominant_percentile)?;

        if self.meta_stability.moderate_band > self.meta_stability.high_band {
            return Err(MultiplexError::Config(
                "meta_stability.moderate_band exceeds high_band".into(),
            ));
        }
        if self.pagerank.tolerance <= 0.0 {
            return Err(MultiplexError::Config("pagerank.tolerance must be positive".into()));
        }
        if self.meta_stability.layer_weights.values().any(|w| *w < 0.0) {
            return Err(MultiplexError::Config(
                "meta_stability.layer_weights must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Path search bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Cap on paths returned by one search
    pub max_paths: usize,
    pub cross_layer_max_depth: usize,
    /// Per-layer overrides of the default path depth
    pub layer_max_depth: BTreeMap<LayerName, usize>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            max_paths: 1000,
            cross_layer_max_depth: 6,
            layer_max_depth: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingConfig {
    /// Strength given to auto-generated couplings
    pub default_strength: f64,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            default_strength: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Share of a walker's move that crosses a coupling
    pub inter_layer_weight: f64,
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 change below which iteration stops
    pub tolerance: f64,
    pub top_n: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            inter_layer_weight: 0.5,
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub max_iterations: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

/// Distribution the asymmetry analysis measures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMeasure {
    /// Nodes reachable within `max_hops`
    #[default]
    Reach,
    /// Incident edge count
    Degree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsymmetryConfig {
    pub measure: AccessMeasure,
    pub max_hops: usize,
    pub hub_percentile: f64,
    pub periphery_percentile: f64,
    /// Minimum normalized access gap for a reported pair
    pub pair_threshold: f64,
    pub max_pairs: usize,
}

impl Default for AsymmetryConfig {
    fn default() -> Self {
        Self {
            measure: AccessMeasure::Reach,
            max_hops: 3,
            hub_percentile: 90.0,
            periphery_percentile: 10.0,
            pair_threshold: 0.3,
            max_pairs: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaStabilityConfig {
    /// Weight per layer; layers not listed weigh 1.0
    pub layer_weights: BTreeMap<LayerName, f64>,
    pub high_band: f64,
    pub moderate_band: f64,
}

impl MetaStabilityConfig {
    pub fn weight(&self, layer: LayerName) -> f64 {
        self.layer_weights.get(&layer).copied().unwrap_or(1.0)
    }
}

impl Default for MetaStabilityConfig {
    fn default() -> Self {
        Self {
            layer_weights: BTreeMap::new(),
            high_band: 0.7,
            moderate_band: 0.4,
        }
    }
}

/// Which dominance scoring policy to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominancePolicyKind {
    #[default]
    ReachMass,
    PathCoverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DominanceConfig {
    pub policy: DominancePolicyKind,
    pub max_hops: usize,
    pub dominant_percentile: f64,
}

impl Default for DominanceConfig {
    fn default() -> Self {
        Self {
            policy: DominancePolicyKind::ReachMass,
            max_hops: 5,
            dominant_percentile: 80.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.paths.max_paths, 1000);
        assert_eq!(config.pagerank.damping, 0.85);
        assert_eq!(config.communities.max_iterations, 100);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
paths:
  max_paths: 25
  layer_max_depth:
    COALITION: 3
asymmetry:
  measure: degree
dominance:
  policy: path_coverage
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.paths.max_paths, 25);
        assert_eq!(config.paths.cross_layer_max_depth, 6);
        assert_eq!(config.paths.layer_max_depth.get(&LayerName::Coalition), Some(&3));
        assert_eq!(config.asymmetry.measure, AccessMeasure::Degree);
        assert_eq!(config.asymmetry.max_hops, 3);
        assert_eq!(config.dominance.policy, DominancePolicyKind::PathCoverage);
    }

    #[test]
    fn out_of_range_values_are_config_errors() {
        let err = EngineConfig::from_yaml_str("pagerank:\n  damping: 1.5\n").unwrap_err();
        assert!(matches!(err, MultiplexError::Config(_)));

        let err = EngineConfig::from_yaml_str(
            "meta_stability:\n  high_band: 0.3\n  moderate_band: 0.5\n",
        )
        .unwrap_err();
        assert!(matches!(err, MultiplexError::Config(_)));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = EngineConfig::from_yaml_str("paths: [unclosed").unwrap_err();
        assert!(matches!(err, MultiplexError::Yaml(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "coupling:\n  default_strength: 0.25\n").unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.coupling.default_strength, 0.25);

        let missing = EngineConfig::from_path(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(missing, MultiplexError::Config(_)));
    }

    #[test]
    fn unlisted_layer_weight_is_one() {
        let config = MetaStabilityConfig::default();
        assert_eq!(config.weight(LayerName::Procedural), 1.0);
    }
}
