//! Principal component analysis and explained-variance ranking.
//!
//! This module provides:
//! - `PCA`: covariance eigen-decomposition with deterministic ordering and signs
//! - `ExplainedVariance`: per-component and cumulative variance ratios
//! - `jacobi_eigen`: the symmetric eigensolver behind `PCA`
//!
//! # Examples
//!
//! ```rust
//! use eigencluster::{PCA, StandardScaler};
//! use ndarray::array;
//!
//! let x = array![
//!     [1.0, 2.0, 3.0],
//!     [4.0, 5.0, 7.0],
//!     [7.0, 8.0, 8.0],
//!     [10.0, 11.0, 15.0]
//! ];
//!
//! let x_scaled = StandardScaler::new().fit_transform(&x).unwrap();
//! let mut pca = PCA::new();
//! let projected = pca.fit_transform(&x_scaled).unwrap();
//!
//! let variance = pca.variance().unwrap();
//! println!("Explained variance ratio: {:?}", variance.ratio());
//! let k = variance.components_for_threshold(0.9).unwrap();
//! let reduced = pca.truncated(k).unwrap();
//! assert_eq!(reduced.nrows(), projected.nrows());
//! ```

mod eigen;
mod pca;
mod variance;

pub use eigen::{jacobi_eigen, SymmetricEigen};
pub use pca::{DEFAULT_MAX_SWEEPS, DEFAULT_ORTHOGONALITY_TOL, DEFAULT_TOLERANCE, PCA};
pub use variance::ExplainedVariance;
