use crate::error::{Error, Result};
use crate::Matrix;
use ndarray::ArrayView1;

pub fn squared_euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
}

pub fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Symmetric `n × n` matrix of Euclidean distances between rows.
pub fn pairwise_distances(x: &Matrix) -> Matrix {
    let n = x.nrows();
    let mut distances = Matrix::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean_distance(&x.row(i), &x.row(j));
            distances[[i, j]] = d;
            distances[[j, i]] = d;
        }
    }
    distances
}

/// Within-cluster sum of squared distances to the assigned centroid.
pub fn inertia(x: &Matrix, labels: &[usize], centroids: &Matrix) -> Result<f64> {
    if labels.len() != x.nrows() {
        return Err(Error::InvalidParameter(format!(
            "{} labels supplied for {} rows",
            labels.len(),
            x.nrows()
        )));
    }
    if x.ncols() != centroids.ncols() {
        return Err(Error::DimensionMismatch {
            expected: centroids.ncols(),
            found: x.ncols(),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&l| l >= centroids.nrows()) {
        return Err(Error::InvalidParameter(format!(
            "label {bad} has no centroid ({} centroids)",
            centroids.nrows()
        )));
    }

    Ok(labels
        .iter()
        .enumerate()
        .map(|(i, &label)| squared_euclidean(&x.row(i), &centroids.row(label)))
        .sum())
}
