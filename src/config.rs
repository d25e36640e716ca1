use crate::cluster::{DEFAULT_MAX_ITER, DEFAULT_SEED, EmptyClusterPolicy};
use crate::decomposition::{DEFAULT_MAX_SWEEPS, DEFAULT_ORTHOGONALITY_TOL, DEFAULT_TOLERANCE};
use crate::error::{Error, Result};
use crate::preprocessing::DEFAULT_ZERO_VARIANCE_TOL;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every knob of an [`Analysis`](crate::Analysis) run.
///
/// Exactly one of `components` and `variance_threshold` decides how many
/// principal components feed the clustering step.
///
/// ```toml
/// variance_threshold = 0.8
/// clusters = 4
/// seed = 42
///
/// [pca]
/// max_sweeps = 100
///
/// [kmeans]
/// max_iter = 300
/// empty_cluster = "reinitialize"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Fixed number of leading components to keep.
    #[serde(default)]
    pub components: Option<usize>,
    /// Keep the fewest components whose cumulative explained variance reaches this.
    #[serde(default)]
    pub variance_threshold: Option<f64>,
    pub clusters: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_zero_variance_tol")]
    pub zero_variance_tol: f64,
    #[serde(default)]
    pub pca: PcaSettings,
    #[serde(default)]
    pub kmeans: KMeansSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PcaSettings {
    pub max_sweeps: usize,
    pub tolerance: f64,
    pub orthogonality_tol: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KMeansSettings {
    pub max_iter: usize,
    pub empty_cluster: EmptyClusterPolicy,
}

impl Default for PcaSettings {
    fn default() -> Self {
        Self {
            max_sweeps: DEFAULT_MAX_SWEEPS,
            tolerance: DEFAULT_TOLERANCE,
            orthogonality_tol: DEFAULT_ORTHOGONALITY_TOL,
        }
    }
}

impl Default for KMeansSettings {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            empty_cluster: EmptyClusterPolicy::default(),
        }
    }
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_zero_variance_tol() -> f64 {
    DEFAULT_ZERO_VARIANCE_TOL
}

impl AnalysisConfig {
    /// Keeps `components` leading components and asks for `clusters` clusters.
    pub fn with_components(components: usize, clusters: usize) -> Self {
        Self {
            components: Some(components),
            variance_threshold: None,
            clusters,
            seed: DEFAULT_SEED,
            zero_variance_tol: DEFAULT_ZERO_VARIANCE_TOL,
            pca: PcaSettings::default(),
            kmeans: KMeansSettings::default(),
        }
    }

    /// Keeps as many components as needed to explain `threshold` of the variance.
    pub fn with_variance_threshold(threshold: f64, clusters: usize) -> Self {
        Self {
            components: None,
            variance_threshold: Some(threshold),
            ..Self::with_components(0, clusters)
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        match (self.components, self.variance_threshold) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParameter(
                    "set either `components` or `variance_threshold`, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(Error::InvalidParameter(
                    "one of `components` or `variance_threshold` is required".to_string(),
                ));
            }
            (Some(0), None) => {
                return Err(Error::InvalidParameter("`components` must be > 0".to_string()));
            }
            (None, Some(t)) if !(t > 0.0 && t <= 1.0) => {
                return Err(Error::InvalidParameter(format!(
                    "`variance_threshold` must be in (0, 1], got {t}"
                )));
            }
            _ => {}
        }

        if self.clusters == 0 {
            return Err(Error::InvalidParameter("`clusters` must be > 0".to_string()));
        }
        if self.kmeans.max_iter == 0 {
            return Err(Error::InvalidParameter("`kmeans.max_iter` must be > 0".to_string()));
        }
        if !(self.pca.tolerance > 0.0) || !(self.pca.orthogonality_tol > 0.0) {
            return Err(Error::InvalidParameter(
                "`pca.tolerance` and `pca.orthogonality_tol` must be positive".to_string(),
            ));
        }
        if !(self.zero_variance_tol >= 0.0) {
            return Err(Error::InvalidParameter(
                "`zero_variance_tol` must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
