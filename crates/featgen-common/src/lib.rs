//! Shared utilities for featgen crates.
//!
//! This crate bridges Polars column dtypes and the featgen type model, and
//! provides the missing-value helpers used by the type-enforcement stage.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use crate::polars::{
    UnsupportedDtype, any_to_string, fill_missing_with_zero, infer_feature_metadata,
    missing_count, polars_dtype, raw_dtype_of, raw_group_of, uncoercible_samples,
};
