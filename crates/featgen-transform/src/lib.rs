//! Feature generator lifecycle and exact-dtype enforcement.
//!
//! - **generator**: [`GeneratorBase`] and the [`FeatureGenerator`] contract
//! - **astype**: [`TypeEnforcementStage`], which locks in exact dtypes at fit
//!   and restores them at transform
//! - **diagnostics**: injected message sinks ([`TracingSink`], [`MemorySink`])
//! - **error**: lifecycle, coercion and generator errors

pub mod astype;
pub mod diagnostics;
pub mod error;
pub mod generator;

pub use astype::TypeEnforcementStage;
pub use diagnostics::{DiagnosticsSink, LogEntry, MemorySink, TracingSink, tracing_sink};
pub use error::{
    CoercionFailure, GeneratorError, LifecycleError, Result, TypeCoercionError,
};
pub use generator::{FeatureGenerator, GeneratorBase};
