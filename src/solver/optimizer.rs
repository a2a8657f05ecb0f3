use super::problem::LeastSquaresProblem;
use crate::error::{PipelineError, Result};
use nalgebra::{DMatrix, DVector};

/// Smallest Cholesky pivot accepted, relative to the column's own Gram diagonal.
const RELATIVE_PIVOT_FLOOR: f64 = 1e-10;

/// Solves the ridge problem through its normal equations.
///
/// Forms `X^T X + diag(penalties)` and `X^T y`, factorizes with Cholesky and
/// solves. A rank-deficient system or a non-finite coefficient is reported as
/// `FitDivergence`.
pub fn solve(problem: &LeastSquaresProblem) -> Result<Vec<f64>> {
    let p = problem.cols;
    let n = problem.rows();
    if p == 0 || n == 0 {
        return Err(PipelineError::FitDivergence("Empty design matrix".to_string()));
    }

    let x = DMatrix::from_row_slice(n, p, &problem.design);
    let y = DVector::from_column_slice(&problem.target);
    let xt = x.transpose();
    let gram = &xt * &x + DMatrix::from_diagonal(&DVector::from_column_slice(&problem.penalties));
    let rhs = &xt * &y;
    let scale = gram.diagonal();

    let chol = gram.cholesky().ok_or_else(|| {
        PipelineError::FitDivergence(format!("Normal equations are not positive definite ({} columns)", p))
    })?;
    let l = chol.l();
    if let Some(j) = (0..p).find(|&j| !(l[(j, j)].powi(2) > scale[j] * RELATIVE_PIVOT_FLOOR)) {
        return Err(PipelineError::FitDivergence(format!(
            "Normal equations are rank deficient at column {} of {}",
            j, p
        )));
    }
    let coefficients = chol.solve(&rhs);

    if let Some(j) = coefficients.iter().position(|c| !c.is_finite()) {
        return Err(PipelineError::FitDivergence(format!("Coefficient {} is not finite", j)));
    }
    Ok(coefficients.iter().copied().collect())
}
