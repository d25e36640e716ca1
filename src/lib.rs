//! Standardized principal component analysis and k-means clustering over
//! named numeric feature tables.
//!
//! The stages can be driven one at a time (`StandardScaler`, `PCA`,
//! `ExplainedVariance`, `KMeans`) or through the [`Analysis`] pipeline, which
//! keeps row keys attached to every result.

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod analysis;
pub mod cluster;
pub mod config;
pub mod dataset;
pub mod decomposition;
pub mod error;
pub mod metrics;
pub mod preprocessing;

pub use analysis::{Analysis, AnalysisReport};
pub use cluster::{ClusterAssignment, EmptyClusterPolicy, KMeans};
pub use config::{AnalysisConfig, KMeansSettings, PcaSettings};
pub use dataset::FeatureTable;
pub use decomposition::{ExplainedVariance, PCA};
pub use error::{Error, Result};
pub use preprocessing::StandardScaler;

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;
