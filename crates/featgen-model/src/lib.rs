//! Feature type definitions shared by the featgen crates.
//!
//! - **dtype**: exact storage dtypes ([`RawDtype`]) and their coarse groups ([`RawGroup`])
//! - **metadata**: the feature registry value type ([`FeatureMetadata`])
//! - **snapshot**: the exact dtype snapshot taken at fit time ([`ExactTypeSnapshot`])
//! - **options**: stage configuration ([`EnforcementOptions`])

pub mod dtype;
pub mod error;
pub mod metadata;
pub mod options;
pub mod snapshot;

pub use dtype::{RawDtype, RawGroup};
pub use error::{MetadataError, Result};
pub use metadata::{FeatureFilter, FeatureMetadata, SharedRawFeatures, SpecialGroupMap};
pub use options::{EnforcementOptions, NullRepairPolicy};
pub use snapshot::{ExactTypeSnapshot, SnapshotEntry, SnapshotReport};
