use crate::dataset::ensure_finite;
use crate::error::{Error, Result};
use crate::metrics::{inertia, squared_euclidean};
use crate::Matrix;
use ndarray::{ArrayView1, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_SEED: u64 = 0;

/// What the update step does with a centroid that lost all of its points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyClusterPolicy {
    /// The centroid stays where it was.
    #[default]
    KeepInPlace,
    /// The centroid jumps to the point farthest from its own centroid.
    /// Within one update step no point is handed to two empty clusters.
    Reinitialize,
}

/// Lloyd's k-means with seeded initialization on distinct input points.
///
/// Iteration stops once an assignment pass changes no label, or after
/// `max_iter` assignment passes. Distance ties go to the lowest label.
#[derive(Clone, Debug)]
pub struct KMeans {
    n_clusters: usize,
    max_iter: usize,
    seed: u64,
    empty_cluster: EmptyClusterPolicy,
    fitted: Option<KMeansFit>,
}

#[derive(Clone, Debug)]
struct KMeansFit {
    labels: Vec<usize>,
    centroids: Matrix,
    n_iter: usize,
    converged: bool,
    inertia: f64,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: DEFAULT_MAX_ITER,
            seed: DEFAULT_SEED,
            empty_cluster: EmptyClusterPolicy::default(),
            fitted: None,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster = policy;
        self
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::InvalidParameter("n_clusters must be > 0".to_string()));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter("max_iter must be > 0".to_string()));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(Error::InvalidParameter(
                "input matrix must have at least one sample and one feature".to_string(),
            ));
        }
        if self.n_clusters > x.nrows() {
            return Err(Error::InvalidParameter(format!(
                "n_clusters={} cannot exceed n_samples={}",
                self.n_clusters,
                x.nrows()
            )));
        }
        ensure_finite(x)?;

        let mut centroids = self.initialize_centroids(x)?;
        let mut labels = assign(x, &centroids);
        let mut n_iter = 1;
        let mut converged = false;

        while n_iter < self.max_iter {
            self.update_centroids(x, &labels, &mut centroids);

            let next = assign(x, &centroids);
            n_iter += 1;

            let changed = next.iter().zip(&labels).filter(|(a, b)| a != b).count();
            log::debug!("k-means pass {n_iter}: {changed} labels changed");

            labels = next;
            if changed == 0 {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "k-means with K={} stopped at the iteration bound ({}) before labels settled",
                self.n_clusters,
                self.max_iter
            );
        }

        let inertia = inertia(x, &labels, &centroids)?;
        log::info!(
            "k-means with K={} finished after {n_iter} passes (converged: {converged}, inertia {inertia:.4})",
            self.n_clusters
        );

        self.fitted = Some(KMeansFit {
            labels,
            centroids,
            n_iter,
            converged,
            inertia,
        });

        Ok(())
    }

    pub fn fit_predict(&mut self, x: &Matrix) -> Result<Vec<usize>> {
        self.fit(x)?;
        Ok(self.fit_ref()?.labels.clone())
    }

    /// Labels new points with their nearest fitted centroid.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        let fit = self.fit_ref()?;

        if x.ncols() != fit.centroids.ncols() {
            return Err(Error::DimensionMismatch {
                expected: fit.centroids.ncols(),
                found: x.ncols(),
            });
        }

        Ok(assign(x, &fit.centroids))
    }

    pub fn labels(&self) -> Option<&[usize]> {
        self.fitted.as_ref().map(|f| f.labels.as_slice())
    }

    pub fn centroids(&self) -> Option<&Matrix> {
        self.fitted.as_ref().map(|f| &f.centroids)
    }

    pub fn n_iter(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_iter)
    }

    pub fn converged(&self) -> Option<bool> {
        self.fitted.as_ref().map(|f| f.converged)
    }

    pub fn inertia(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.inertia)
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    fn fit_ref(&self) -> Result<&KMeansFit> {
        self.fitted.as_ref().ok_or(Error::NotFitted("KMeans"))
    }

    fn initialize_centroids(&self, x: &Matrix) -> Result<Matrix> {
        let distinct = distinct_rows(x);

        if distinct.len() < self.n_clusters {
            return Err(Error::InsufficientData(format!(
                "{} clusters requested but the input has only {} distinct points",
                self.n_clusters,
                distinct.len()
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let rows: Vec<usize> = rand::seq::index::sample(&mut rng, distinct.len(), self.n_clusters)
            .iter()
            .map(|i| distinct[i])
            .collect();

        log::debug!("k-means seed {} picked initial rows {:?}", self.seed, rows);
        Ok(x.select(Axis(0), &rows))
    }

    fn update_centroids(&self, x: &Matrix, labels: &[usize], centroids: &mut Matrix) {
        let k = centroids.nrows();
        let mut sums = Matrix::zeros((k, x.ncols()));
        let mut counts = vec![0usize; k];

        for (row, &label) in x.rows().into_iter().zip(labels) {
            let mut target = sums.row_mut(label);
            target += &row;
            counts[label] += 1;
        }

        let empty: Vec<usize> = (0..k).filter(|&c| counts[c] == 0).collect();
        let replacements = match self.empty_cluster {
            EmptyClusterPolicy::Reinitialize if !empty.is_empty() => {
                farthest_points(x, labels, centroids, empty.len())
            }
            _ => Vec::new(),
        };

        for c in 0..k {
            if counts[c] > 0 {
                let mean = &sums.row(c) / counts[c] as f64;
                centroids.row_mut(c).assign(&mean);
            }
        }

        for (&c, &row) in empty.iter().zip(&replacements) {
            centroids.row_mut(c).assign(&x.row(row));
        }
        if !empty.is_empty() {
            log::debug!(
                "{} empty clusters ({:?}); {} reinitialized",
                empty.len(),
                self.empty_cluster,
                replacements.len()
            );
        }
    }
}

fn nearest(point: &ArrayView1<f64>, centroids: &Matrix) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (label, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = squared_euclidean(point, &centroid);
        if distance < best_distance {
            best_distance = distance;
            best = label;
        }
    }
    best
}

fn assign(x: &Matrix, centroids: &Matrix) -> Vec<usize> {
    x.axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| nearest(&row, centroids))
        .collect()
}

/// Row indices of the first occurrence of every distinct point.
fn distinct_rows(x: &Matrix) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(x.nrows());

    x.rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| {
            // -0.0 and 0.0 are the same point.
            let key: Vec<u64> = row.iter().map(|v| (v + 0.0).to_bits()).collect();
            seen.insert(key)
        })
        .map(|(i, _)| i)
        .collect()
}

/// The `count` points farthest from their assigned centroid, largest first,
/// ties to the lower row index.
fn farthest_points(x: &Matrix, labels: &[usize], centroids: &Matrix, count: usize) -> Vec<usize> {
    let mut by_distance: Vec<(usize, f64)> = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| (i, squared_euclidean(&x.row(i), &centroids.row(label))))
        .collect();

    by_distance.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    by_distance.into_iter().take(count).map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Normal;
    use ndarray_rand::RandomExt;

    fn two_blobs() -> Matrix {
        array![
            [0.0, 0.0],
            [10.0, 10.0],
            [0.0, 1.0],
            [10.0, 11.0],
            [1.0, 0.0],
            [11.0, 10.0]
        ]
    }

    #[test]
    fn test_kmeans_basic() {
        let x = array![
            [1.0, 1.0],
            [1.5, 2.0],
            [3.0, 4.0],
            [5.0, 7.0],
            [3.5, 5.0],
            [4.5, 5.0],
            [3.5, 4.5]
        ];

        let mut kmeans = KMeans::new(2).seed(42);
        let labels = kmeans.fit_predict(&x).unwrap();

        assert_eq!(labels.len(), x.nrows());
        assert!(kmeans.centroids().is_some());
        assert!(kmeans.inertia().unwrap() >= 0.0);

        let unique: HashSet<usize> = labels.iter().copied().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_separated_blobs_for_any_seed() {
        let x = two_blobs();

        for seed in 0..50 {
            let mut kmeans = KMeans::new(2).seed(seed);
            let labels = kmeans.fit_predict(&x).unwrap();

            assert!(kmeans.converged().unwrap(), "seed {seed} did not converge");
            assert_eq!(labels[0], labels[2]);
            assert_eq!(labels[0], labels[4]);
            assert_eq!(labels[1], labels[3]);
            assert_eq!(labels[1], labels[5]);
            assert_ne!(labels[0], labels[1], "seed {seed} merged the blobs");
        }
    }

    #[test]
    fn test_too_few_distinct_points() {
        let x = array![[1.0, 1.0], [5.0, 5.0], [1.0, 1.0], [5.0, 5.0], [1.0, 1.0], [5.0, 5.0]];
        let mut kmeans = KMeans::new(5);
        assert!(matches!(kmeans.fit(&x), Err(Error::InsufficientData(_))));

        let repeated = array![[1.0, 1.0], [5.0, 5.0], [1.0, 1.0], [5.0, 5.0], [-0.0, 0.0], [0.0, 0.0]];
        let mut kmeans = KMeans::new(4);
        assert!(matches!(kmeans.fit(&repeated), Err(Error::InsufficientData(_))));
        assert!(kmeans.labels().is_none());
    }

    #[test]
    fn test_more_clusters_than_rows() {
        let x = array![[0.0, 0.0], [1.0, 2.0], [3.0, 1.0]];
        let mut kmeans = KMeans::new(5);

        assert!(matches!(kmeans.fit(&x), Err(Error::InvalidParameter(_))));
        assert!(kmeans.labels().is_none());
    }

    #[test]
    fn test_reinitialize_policy_in_full_fit() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let x = Matrix::random_using((40, 2), Normal::new(0.0, 1.0).unwrap(), &mut rng);

        let mut converged_runs = 0;
        for seed in 0..30 {
            let mut kmeans = KMeans::new(12)
                .seed(seed)
                .empty_cluster(EmptyClusterPolicy::Reinitialize);
            let labels = kmeans.fit_predict(&x).unwrap();

            assert_eq!(labels.len(), 40);
            assert!(labels.iter().all(|&l| l < 12));
            if kmeans.converged().unwrap() {
                // A reinitialized centroid captures its new point on the next pass.
                let unique: HashSet<usize> = labels.iter().copied().collect();
                assert_eq!(unique.len(), 12, "seed {seed} left a cluster empty");
                converged_runs += 1;
            }
        }
        assert!(converged_runs > 0);
    }

    #[test]
    fn test_invalid_parameters() {
        let x = two_blobs();
        assert!(matches!(KMeans::new(0).fit(&x), Err(Error::InvalidParameter(_))));
        assert!(matches!(
            KMeans::new(2).max_iter(0).fit(&x),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_kmeans_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let x = Matrix::random_using((80, 3), Normal::new(0.0, 2.0).unwrap(), &mut rng);

        let mut a = KMeans::new(4).seed(99);
        let mut b = KMeans::new(4).seed(99);
        a.fit(&x).unwrap();
        b.fit(&x).unwrap();

        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.centroids(), b.centroids());
        assert_eq!(a.n_iter(), b.n_iter());
        assert_eq!(a.inertia().map(f64::to_bits), b.inertia().map(f64::to_bits));
    }

    #[test]
    fn test_iteration_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let x = Matrix::random_using((60, 2), Normal::new(0.0, 1.0).unwrap(), &mut rng);

        let mut kmeans = KMeans::new(3).max_iter(1);
        kmeans.fit(&x).unwrap();

        assert_eq!(kmeans.n_iter(), Some(1));
        assert_eq!(kmeans.converged(), Some(false));
        assert_eq!(kmeans.labels().unwrap().len(), 60);
    }

    #[test]
    fn test_ties_go_to_lowest_label() {
        let centroids = array![[1.0, 0.0], [-1.0, 0.0]];
        let point = array![0.0, 5.0];
        assert_eq!(nearest(&point.view(), &centroids), 0);
    }

    #[test]
    fn test_empty_cluster_policies() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [9.0, 9.0]];
        let labels = [0, 0, 0];

        let mut kept = array![[3.0, 3.0], [100.0, 100.0]];
        KMeans::new(2).update_centroids(&x, &labels, &mut kept);
        assert_eq!(kept.row(1), array![100.0, 100.0]);
        assert_eq!(kept.row(0), array![3.0, 10.0 / 3.0]);

        let mut moved = array![[3.0, 3.0], [100.0, 100.0]];
        KMeans::new(2)
            .empty_cluster(EmptyClusterPolicy::Reinitialize)
            .update_centroids(&x, &labels, &mut moved);
        assert_eq!(moved.row(1), array![9.0, 9.0]);
    }

    #[test]
    fn test_predict() {
        let mut kmeans = KMeans::new(2).seed(3);
        let labels = kmeans.fit_predict(&two_blobs()).unwrap();

        let predicted = kmeans.predict(&array![[0.5, 0.5], [10.5, 10.5]]).unwrap();
        assert_eq!(predicted, vec![labels[0], labels[1]]);

        assert!(matches!(
            kmeans.predict(&array![[1.0, 2.0, 3.0]]),
            Err(Error::DimensionMismatch { expected: 2, found: 3 })
        ));
        assert!(matches!(
            KMeans::new(2).predict(&two_blobs()),
            Err(Error::NotFitted(_))
        ));
    }
}
