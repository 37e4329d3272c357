//! Closure and renormalisation of compositional data.
//!
//! - **close**: scale each row of a matrix (or a single vector) to sum to one
//! - **renormalise**: scale a labeled table to an arbitrary total, optionally
//!   restricted to a sub-composition

pub mod close;
pub mod renorm;

pub use close::{close, close_vector, close_vector_with, close_with, nansum, sum};
pub use renorm::renormalise;
