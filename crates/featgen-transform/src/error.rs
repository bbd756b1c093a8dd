//! Error types for feature generators.

use featgen_common::UnsupportedDtype;
use featgen_model::{MetadataError, RawDtype};
use polars::prelude::PolarsError;
use thiserror::Error;

/// Lifecycle violations: using a generator in the wrong state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// An operation that needs fit-time state was called before fit.
    #[error("{generator} is not fitted; call fit before {operation}")]
    NotFitted {
        generator: String,
        operation: &'static str,
    },

    /// Fit was called on a generator that is already fitted.
    #[error("{generator} is already fitted; construct a new instance to refit")]
    AlreadyFitted { generator: String },
}

/// One feature that could not be cast to its fit-time dtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure {
    pub feature: String,
    /// Polars dtype of the incoming column.
    pub source_dtype: String,
    pub target: RawDtype,
    /// A few of the offending values.
    pub samples: Vec<String>,
    pub reason: String,
}

/// Values that cannot be represented in their fit-time dtypes.
///
/// Carries every failing feature of the call, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_failures(.generator, .failures))]
pub struct TypeCoercionError {
    pub generator: String,
    pub failures: Vec<CoercionFailure>,
}

impl TypeCoercionError {
    /// Names of the failing features, in scope order.
    pub fn features(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.feature.as_str()).collect()
    }
}

fn render_failures(generator: &str, failures: &[CoercionFailure]) -> String {
    let details: Vec<String> = failures
        .iter()
        .map(|failure| {
            let mut detail = format!(
                "'{}' ({} -> {})",
                failure.feature, failure.source_dtype, failure.target
            );
            if !failure.samples.is_empty() {
                detail.push_str(&format!(" rejected values {:?}", failure.samples));
            }
            detail
        })
        .collect();
    format!(
        "{generator}: cannot coerce {} feature(s) to their fit-time dtypes: {}",
        failures.len(),
        details.join("; ")
    )
}

/// Errors that can occur while fitting or applying a generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Coercion(#[from] TypeCoercionError),

    /// The input frame lacks features the generator is responsible for.
    #[error("{generator}: input is missing in-scope features {features:?}")]
    MissingFeatures {
        generator: String,
        features: Vec<String>,
    },

    /// A fit-time column has a dtype the generator cannot lock in.
    #[error("{generator}: {source}")]
    UnsupportedDtype {
        generator: String,
        #[source]
        source: UnsupportedDtype,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<PolarsError> for GeneratorError {
    fn from(err: PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;
