//! Invariant checks run at every stage boundary.
//!
//! The `Validator` applies a set of row-local rules to the columns of a frame
//! and reports every broken invariant at once. Frames call it from their
//! constructors, so a frame that exists is a frame that passed.

pub use self::error::{summarize, Violation, ViolationType};
pub use self::validator::Validator;

mod error;
mod validator;
mod rules {
    pub mod temporal;
    pub mod values;
}
