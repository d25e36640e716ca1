use crate::dataset::ensure_finite;
use crate::error::{Error, Result};
use crate::{Matrix, Vector};
use ndarray::Axis;

/// Default threshold below which a column's standard deviation counts as zero.
pub const DEFAULT_ZERO_VARIANCE_TOL: f64 = 1e-12;

/// Rescales columns to zero mean and unit sample standard deviation.
///
/// The fitted `(mean, std)` pairs are kept so new rows can be mapped into the
/// same space, or standardized rows mapped back.
#[derive(Clone, Debug)]
pub struct StandardScaler {
    mean: Option<Vector>,
    std: Option<Vector>,
    zero_variance_tol: f64,
    column_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            zero_variance_tol: DEFAULT_ZERO_VARIANCE_TOL,
            column_names: None,
        }
    }

    pub fn zero_variance_tol(mut self, tol: f64) -> Self {
        self.zero_variance_tol = tol;
        self
    }

    /// Names used in `DegenerateColumn` errors instead of bare indices.
    pub fn column_names(mut self, names: &[String]) -> Self {
        self.column_names = Some(names.to_vec());
        self
    }

    pub fn fit(&mut self, data: &Matrix) -> Result<()> {
        if !(self.zero_variance_tol >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "zero_variance_tol must be non-negative, got {}",
                self.zero_variance_tol
            )));
        }
        if data.ncols() == 0 {
            return Err(Error::InvalidParameter(
                "cannot standardize a matrix with no columns".to_string(),
            ));
        }
        if data.nrows() < 2 {
            return Err(Error::InsufficientData(format!(
                "sample standard deviation needs at least 2 rows, got {}",
                data.nrows()
            )));
        }
        if let Some(names) = &self.column_names {
            if names.len() != data.ncols() {
                return Err(Error::DimensionMismatch {
                    expected: names.len(),
                    found: data.ncols(),
                });
            }
        }
        ensure_finite(data)?;

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InsufficientData("empty matrix".to_string()))?;
        let std = data.std_axis(Axis(0), 1.0);

        if let Some((j, &s)) = std
            .iter()
            .enumerate()
            .find(|&(_, &s)| s <= self.zero_variance_tol)
        {
            let column = match &self.column_names {
                Some(names) => names[j].clone(),
                None => format!("#{j}"),
            };
            return Err(Error::DegenerateColumn { column, std: s });
        }

        log::debug!("Fitted scaler over {} rows x {} columns", data.nrows(), data.ncols());

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    pub fn transform(&self, data: &Matrix) -> Result<Matrix> {
        let (mean, std) = self.fitted(data.ncols())?;

        let mut result = data.clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            row -= mean;
            row /= std;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, data: &Matrix) -> Result<Matrix> {
        self.fit(data)?;
        self.transform(data)
    }

    pub fn inverse_transform(&self, data: &Matrix) -> Result<Matrix> {
        let (mean, std) = self.fitted(data.ncols())?;

        let mut result = data.clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            row *= std;
            row += mean;
        }

        Ok(result)
    }

    pub fn mean(&self) -> Option<&Vector> {
        self.mean.as_ref()
    }

    pub fn std(&self) -> Option<&Vector> {
        self.std.as_ref()
    }

    fn fitted(&self, n_columns: usize) -> Result<(&Vector, &Vector)> {
        let mean = self.mean.as_ref().ok_or(Error::NotFitted("StandardScaler"))?;
        let std = self.std.as_ref().ok_or(Error::NotFitted("StandardScaler"))?;

        if n_columns != mean.len() {
            return Err(Error::DimensionMismatch {
                expected: mean.len(),
                found: n_columns,
            });
        }
        Ok((mean, std))
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
