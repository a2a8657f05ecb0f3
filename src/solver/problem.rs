/// A ridge-regularized least squares problem.
///
/// Minimizes `||X b - y||^2 + sum_j penalties[j] * b[j]^2`. The design matrix
/// is stored row-major in one flat buffer (`rows * cols`), so a row is a
/// contiguous slice.
#[derive(Debug, Clone, Default)]
pub struct LeastSquaresProblem {
    pub design: Vec<f64>,
    pub target: Vec<f64>,
    pub penalties: Vec<f64>,
    pub cols: usize,
}

impl LeastSquaresProblem {
    pub fn new(cols: usize) -> Self {
        Self { cols, penalties: vec![0.0; cols], ..Default::default() }
    }

    pub fn rows(&self) -> usize {
        self.target.len()
    }

    pub fn push_row(&mut self, features: &[f64], y: f64) {
        debug_assert_eq!(features.len(), self.cols);
        self.design.extend_from_slice(features);
        self.target.push(y);
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.design[i * self.cols..(i + 1) * self.cols]
    }

    /// Sets the ridge penalty for the half-open column range `[start, end)`.
    pub fn penalize(&mut self, start: usize, end: usize, penalty: f64) {
        for p in &mut self.penalties[start..end] {
            *p = penalty;
        }
    }
}
