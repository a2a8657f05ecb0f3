//! Ridge-regularized least squares used to fit the forecasting model.
pub mod optimizer;
pub mod problem;

pub use optimizer::solve;
pub use problem::LeastSquaresProblem;
