//! Error types for feature registry operations.

use thiserror::Error;

use crate::dtype::RawGroup;

/// Errors raised while building, parsing or merging feature registries.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A dtype name did not match any supported storage type.
    #[error("unknown dtype '{value}'")]
    UnknownDtype { value: String },

    /// A raw group name did not match any known group.
    #[error("unknown raw group '{value}'")]
    UnknownRawGroup { value: String },

    /// A special type references features that have no raw type.
    #[error("special type '{special_type}' references features without a raw type: {features:?}")]
    UnknownSpecialFeatures {
        special_type: String,
        features: Vec<String>,
    },

    /// Two registries being joined both define the same features.
    #[error("features are present in both registries: {features:?}")]
    SharedFeatures { features: Vec<String> },

    /// A shared feature has different raw groups in the two registries.
    #[error("feature '{feature}' has raw type '{left}' in one registry and '{right}' in the other")]
    ConflictingRawType {
        feature: String,
        left: RawGroup,
        right: RawGroup,
    },

    /// Renaming would map two features onto the same name.
    #[error("renaming produces duplicate feature '{feature}'")]
    DuplicateFeature { feature: String },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetadataError::ConflictingRawType {
            feature: "age".to_string(),
            left: RawGroup::Int,
            right: RawGroup::Float,
        };
        assert_eq!(
            err.to_string(),
            "feature 'age' has raw type 'int' in one registry and 'float' in the other"
        );
    }
}
