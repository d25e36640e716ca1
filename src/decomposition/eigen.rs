use crate::error::{Error, Result};
use crate::{Matrix, Vector};

/// Eigen-decomposition of a real symmetric matrix by cyclic Jacobi rotation.
///
/// `values[i]` pairs with column `i` of `vectors`. Pairs come back in the
/// diagonal order left by the final sweep; callers sort them.
#[derive(Clone, Debug)]
pub struct SymmetricEigen {
    pub values: Vector,
    pub vectors: Matrix,
    pub sweeps: usize,
}

/// Runs cyclic Jacobi sweeps until the off-diagonal Frobenius norm falls to
/// `tolerance * ‖A‖_F`, failing after `max_sweeps` sweeps.
pub fn jacobi_eigen(matrix: &Matrix, max_sweeps: usize, tolerance: f64) -> Result<SymmetricEigen> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(Error::InvalidParameter(format!(
            "eigen-decomposition needs a square matrix, got {}x{}",
            n,
            matrix.ncols()
        )));
    }
    if !(tolerance > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "tolerance must be positive, got {tolerance}"
        )));
    }

    let mut a = matrix.clone();
    let mut v = Matrix::eye(n);
    let scale = frobenius_norm(&a);
    let target = tolerance * scale;

    for sweep in 0..=max_sweeps {
        let off = off_diagonal_norm(&a);
        log::debug!("Jacobi sweep {sweep}: off-diagonal norm {off:e}");

        if off <= target {
            return Ok(SymmetricEigen {
                values: a.diag().to_owned(),
                vectors: v,
                sweeps: sweep,
            });
        }
        if sweep == max_sweeps {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q);
            }
        }

        if !a.iter().all(|x| x.is_finite()) {
            return Err(Error::NumericalInstability(format!(
                "non-finite entries appeared during Jacobi sweep {}",
                sweep + 1
            )));
        }
    }

    Err(Error::NumericalInstability(format!(
        "Jacobi eigen-decomposition did not converge within {max_sweeps} sweeps \
         (off-diagonal norm {:e}, target {:e})",
        off_diagonal_norm(&a),
        target
    )))
}

/// Applies the rotation that zeroes `a[p, q]`, accumulating it into `v`.
fn rotate(a: &mut Matrix, v: &mut Matrix, p: usize, q: usize) {
    let apq = a[[p, q]];
    if apq == 0.0 {
        return;
    }

    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
    // Smaller root of t^2 + 2 theta t - 1 = 0 keeps the rotation angle below pi/4.
    let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
    let c = 1.0 / t.hypot(1.0);
    let s = t * c;

    let n = a.nrows();
    for k in 0..n {
        let akp = a[[k, p]];
        let akq = a[[k, q]];
        a[[k, p]] = c * akp - s * akq;
        a[[k, q]] = s * akp + c * akq;
    }
    for k in 0..n {
        let apk = a[[p, k]];
        let aqk = a[[q, k]];
        a[[p, k]] = c * apk - s * aqk;
        a[[q, k]] = s * apk + c * aqk;
    }
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for k in 0..n {
        let vkp = v[[k, p]];
        let vkq = v[[k, q]];
        v[[k, p]] = c * vkp - s * vkq;
        v[[k, q]] = s * vkp + c * vkq;
    }
}

fn frobenius_norm(a: &Matrix) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn off_diagonal_norm(a: &Matrix) -> f64 {
    a.indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, x)| x * x)
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_diagonal_matrix_needs_no_sweep() {
        let a = array![[3.0, 0.0], [0.0, 1.0]];
        let eig = jacobi_eigen(&a, 10, 1e-12).unwrap();

        assert_eq!(eig.sweeps, 0);
        assert_eq!(eig.values, array![3.0, 1.0]);
        assert_eq!(eig.vectors, Matrix::eye(2));
    }

    #[test]
    fn test_two_by_two() {
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let eig = jacobi_eigen(&a, 10, 1e-12).unwrap();

        let mut values = eig.values.to_vec();
        values.sort_by(|x, y| x.total_cmp(y));
        assert_abs_diff_eq!(values[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reconstructs_symmetric_matrix() {
        let a = array![
            [4.0, -2.0, 1.0, 0.5],
            [-2.0, 5.0, 0.3, -1.0],
            [1.0, 0.3, 3.0, 2.0],
            [0.5, -1.0, 2.0, 6.0]
        ];
        let eig = jacobi_eigen(&a, 50, 1e-14).unwrap();

        let lambda = Matrix::from_diag(&eig.values);
        let rebuilt = eig.vectors.dot(&lambda).dot(&eig.vectors.t());
        assert_abs_diff_eq!(rebuilt, a, epsilon = 1e-10);

        let gram = eig.vectors.t().dot(&eig.vectors);
        assert_abs_diff_eq!(gram, Matrix::eye(4), epsilon = 1e-12);
    }

    #[test]
    fn test_sweep_bound_is_enforced() {
        let a = array![[1.0, 0.9, 0.7], [0.9, 1.0, 0.4], [0.7, 0.4, 1.0]];
        assert!(matches!(
            jacobi_eigen(&a, 0, 1e-12),
            Err(Error::NumericalInstability(_))
        ));
    }

    #[test]
    fn test_rejects_non_square() {
        let a = Matrix::zeros((2, 3));
        assert!(matches!(
            jacobi_eigen(&a, 10, 1e-12),
            Err(Error::InvalidParameter(_))
        ));
    }
}
