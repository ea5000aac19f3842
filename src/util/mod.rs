//! Utility types for PLY.
//!
//! This module contains fundamental types used throughout the library:
//! - [`ScalarType`] / [`Scalar`] - Fixed-width numeric types and values
//! - [`Error`] / [`Result`] - Error handling

mod error;
mod scalar;

pub use error::*;
pub use scalar::*;
