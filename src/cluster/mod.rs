//! Partitional clustering of projected coordinates.
//!
//! - `KMeans`: Lloyd iterations from seeded, distinct initial points
//! - `ClusterAssignment`: labels keyed by row identity
//!
//! # Examples
//!
//! ```rust
//! use eigencluster::{EmptyClusterPolicy, KMeans};
//! use ndarray::array;
//!
//! let x = array![
//!     [0.0, 0.0],
//!     [0.0, 1.0],
//!     [1.0, 0.0],
//!     [10.0, 10.0],
//!     [10.0, 11.0],
//!     [11.0, 10.0]
//! ];
//!
//! let mut kmeans = KMeans::new(2)
//!     .seed(7)
//!     .max_iter(100)
//!     .empty_cluster(EmptyClusterPolicy::KeepInPlace);
//! let labels = kmeans.fit_predict(&x).unwrap();
//! assert_ne!(labels[0], labels[3]);
//!
//! let centers = kmeans.centroids().unwrap();
//! println!("Cluster centers: {:?}", centers);
//! println!("Inertia: {:.4}", kmeans.inertia().unwrap());
//! ```

mod assignment;
mod kmeans;

pub use assignment::ClusterAssignment;
pub use kmeans::{DEFAULT_MAX_ITER, DEFAULT_SEED, EmptyClusterPolicy, KMeans};
