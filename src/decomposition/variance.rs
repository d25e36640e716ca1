use crate::error::{Error, Result};
use crate::Vector;

/// Explained-variance ratios and their running sum for an ordered spectrum.
///
/// Nothing here picks a cutoff; [`ExplainedVariance::components_for_threshold`]
/// only answers the question for a threshold the caller chose.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplainedVariance {
    ratio: Vector,
    cumulative: Vector,
}

impl ExplainedVariance {
    pub fn from_eigenvalues(eigenvalues: &Vector) -> Result<Self> {
        if eigenvalues.is_empty() {
            return Err(Error::InvalidParameter("no eigenvalues supplied".to_string()));
        }
        if let Some(bad) = eigenvalues.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::InvalidParameter(format!(
                "eigenvalues must be finite and non-negative, found {bad}"
            )));
        }

        let total = eigenvalues.sum();
        if total <= 0.0 {
            return Err(Error::InvalidParameter(
                "eigenvalues sum to zero; explained variance is undefined".to_string(),
            ));
        }

        let ratio = eigenvalues.mapv(|v| v / total);
        let mut running = 0.0;
        let cumulative = ratio.mapv(|r| {
            running += r;
            running.min(1.0)
        });

        Ok(Self { ratio, cumulative })
    }

    pub fn ratio(&self) -> &Vector {
        &self.ratio
    }

    pub fn cumulative(&self) -> &Vector {
        &self.cumulative
    }

    pub fn len(&self) -> usize {
        self.ratio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratio.is_empty()
    }

    /// Smallest number of leading components whose cumulative ratio reaches
    /// `threshold`, which must lie in `(0, 1]`.
    pub fn components_for_threshold(&self, threshold: f64) -> Result<usize> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "variance threshold must be in (0, 1], got {threshold}"
            )));
        }

        // The running sum can land a few ulps short of 1.0.
        let k = self
            .cumulative
            .iter()
            .position(|&c| c >= threshold)
            .map_or(self.len(), |i| i + 1);
        Ok(k)
    }
}
