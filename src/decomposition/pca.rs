use super::eigen::jacobi_eigen;
use super::variance::ExplainedVariance;
use crate::dataset::ensure_finite;
use crate::error::{Error, Result};
use crate::{Matrix, Vector};
use ndarray::{s, ArrayView1, ArrayViewMut1, Axis};

pub const DEFAULT_MAX_SWEEPS: usize = 100;
pub const DEFAULT_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_ORTHOGONALITY_TOL: f64 = 1e-6;

/// Eigenvalues this far below zero, relative to the total variance, are
/// treated as round-off and clamped to zero.
const NEGATIVE_EIGENVALUE_SLACK: f64 = 1e-9;

/// Principal component analysis over the covariance of a (standardized)
/// matrix, decomposed with cyclic Jacobi rotations.
///
/// All `d` components are kept. Components are ordered by descending
/// eigenvalue; exactly tied eigenvalues keep the order of the Jacobi
/// diagonal. Each component is signed so that its largest-magnitude entry is
/// positive (lowest index wins a magnitude tie), which makes repeated fits on
/// the same input bit-identical.
#[derive(Clone, Debug)]
pub struct PCA {
    max_sweeps: usize,
    tolerance: f64,
    orthogonality_tol: f64,
    fitted: Option<PcaFit>,
}

#[derive(Clone, Debug)]
struct PcaFit {
    /// One unit eigenvector per row, shape (d, d).
    components: Matrix,
    explained_variance: Vector,
    mean: Vector,
    projected: Matrix,
    total_variance: f64,
    sweeps: usize,
}

impl PCA {
    pub fn new() -> Self {
        Self {
            max_sweeps: DEFAULT_MAX_SWEEPS,
            tolerance: DEFAULT_TOLERANCE,
            orthogonality_tol: DEFAULT_ORTHOGONALITY_TOL,
            fitted: None,
        }
    }

    pub fn max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Relative off-diagonal norm at which the Jacobi iteration stops.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn orthogonality_tol(mut self, tol: f64) -> Self {
        self.orthogonality_tol = tol;
        self
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        let (n_samples, n_features) = x.dim();
        if n_features == 0 {
            return Err(Error::InvalidParameter(
                "input matrix must have at least one feature".to_string(),
            ));
        }
        if n_samples < 2 {
            return Err(Error::InsufficientData(format!(
                "PCA needs at least 2 samples, got {n_samples}"
            )));
        }
        if !(self.orthogonality_tol > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "orthogonality_tol must be positive, got {}",
                self.orthogonality_tol
            )));
        }
        ensure_finite(x)?;
        if n_samples <= n_features {
            log::warn!(
                "PCA on {n_samples} samples x {n_features} features is rank-deficient; \
                 trailing eigenvalues will be zero"
            );
        }

        // Center the data
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InsufficientData("empty matrix".to_string()))?;
        let x_centered = x - &mean.view().insert_axis(Axis(0));

        let cov = x_centered.t().dot(&x_centered) / (n_samples as f64 - 1.0);
        let total_variance = cov.diag().sum();

        let eig = jacobi_eigen(&cov, self.max_sweeps, self.tolerance)?;
        log::debug!("Jacobi converged after {} sweeps", eig.sweeps);

        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| eig.values[b].total_cmp(&eig.values[a]));

        let slack = NEGATIVE_EIGENVALUE_SLACK * total_variance.max(f64::MIN_POSITIVE);
        let mut explained_variance = Vector::zeros(n_features);
        let mut components = Matrix::zeros((n_features, n_features));
        for (rank, &idx) in order.iter().enumerate() {
            let value = eig.values[idx];
            if value < -slack {
                return Err(Error::NumericalInstability(format!(
                    "covariance eigenvalue {value:e} is negative beyond round-off"
                )));
            }
            explained_variance[rank] = value.max(0.0);

            let mut row = components.row_mut(rank);
            row.assign(&eig.vectors.column(idx));
            fix_sign(row);
        }

        check_orthonormal(&components, self.orthogonality_tol)?;

        let projected = x_centered.dot(&components.t());

        log::info!(
            "PCA fitted on {n_samples} samples x {n_features} features; leading eigenvalue {:.4}, total variance {:.4}",
            explained_variance[0],
            total_variance
        );

        self.fitted = Some(PcaFit {
            components,
            explained_variance,
            mean,
            projected,
            total_variance,
            sweeps: eig.sweeps,
        });

        Ok(())
    }

    /// Projects new rows onto every fitted component.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let fit = self.fit_ref()?;

        if x.ncols() != fit.mean.len() {
            return Err(Error::DimensionMismatch {
                expected: fit.mean.len(),
                found: x.ncols(),
            });
        }

        let x_centered = x - &fit.mean.view().insert_axis(Axis(0));
        Ok(x_centered.dot(&fit.components.t()))
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        Ok(self.fit_ref()?.projected.clone())
    }

    /// Maps coordinates on the leading `x.ncols()` components back to feature space.
    pub fn inverse_transform(&self, x: &Matrix) -> Result<Matrix> {
        let fit = self.fit_ref()?;
        let k = x.ncols();

        if k == 0 || k > fit.components.nrows() {
            return Err(Error::InvalidParameter(format!(
                "cannot invert {k} components; the model has {}",
                fit.components.nrows()
            )));
        }

        let basis = fit.components.slice(s![..k, ..]);
        Ok(x.dot(&basis) + &fit.mean.view().insert_axis(Axis(0)))
    }

    /// Projected coordinates of the fitted rows restricted to the first `k` components.
    pub fn truncated(&self, k: usize) -> Result<Matrix> {
        let fit = self.fit_ref()?;
        let d = fit.projected.ncols();

        if k == 0 || k > d {
            return Err(Error::InvalidParameter(format!(
                "number of retained components must be in 1..={d}, got {k}"
            )));
        }
        Ok(fit.projected.slice(s![.., ..k]).to_owned())
    }

    pub fn variance(&self) -> Result<ExplainedVariance> {
        ExplainedVariance::from_eigenvalues(&self.fit_ref()?.explained_variance)
    }

    pub fn components(&self) -> Option<&Matrix> {
        self.fitted.as_ref().map(|f| &f.components)
    }

    /// Feature weights of one component.
    pub fn loadings(&self, component: usize) -> Option<ArrayView1<'_, f64>> {
        let fit = self.fitted.as_ref()?;
        (component < fit.components.nrows()).then(|| fit.components.row(component))
    }

    pub fn explained_variance(&self) -> Option<&Vector> {
        self.fitted.as_ref().map(|f| &f.explained_variance)
    }

    pub fn projected(&self) -> Option<&Matrix> {
        self.fitted.as_ref().map(|f| &f.projected)
    }

    pub fn mean(&self) -> Option<&Vector> {
        self.fitted.as_ref().map(|f| &f.mean)
    }

    pub fn total_variance(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.total_variance)
    }

    pub fn sweeps(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.sweeps)
    }

    fn fit_ref(&self) -> Result<&PcaFit> {
        self.fitted.as_ref().ok_or(Error::NotFitted("PCA"))
    }
}

impl Default for PCA {
    fn default() -> Self {
        Self::new()
    }
}

fn fix_sign(mut v: ArrayViewMut1<f64>) {
    let mut pivot = 0;
    let mut largest = f64::NEG_INFINITY;
    for (i, x) in v.iter().enumerate() {
        if x.abs() > largest {
            largest = x.abs();
            pivot = i;
        }
    }
    if v[pivot] < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

fn check_orthonormal(components: &Matrix, tol: f64) -> Result<()> {
    let gram = components.dot(&components.t());
    for ((i, j), &g) in gram.indexed_iter() {
        let expected = if i == j { 1.0 } else { 0.0 };
        if (g - expected).abs() > tol {
            return Err(Error::NumericalInstability(format!(
                "components {i} and {j} have inner product {g:e}, expected {expected}"
            )));
        }
    }
    Ok(())
}
