//! Tests for the feature registry.

use std::collections::BTreeMap;

use featgen_model::{FeatureFilter, FeatureMetadata, MetadataError, RawGroup, SharedRawFeatures};

fn numeric() -> FeatureMetadata {
    FeatureMetadata::from_raw_types([("age", RawGroup::Int), ("income", RawGroup::Float)])
}

fn text() -> FeatureMetadata {
    FeatureMetadata::from_raw_types([("bio", RawGroup::Object), ("age", RawGroup::Int)])
        .with_special_type("text", &["bio"])
        .unwrap()
}

#[test]
fn join_rejects_shared_features_by_default() {
    let err = numeric()
        .join(&text(), SharedRawFeatures::Error)
        .unwrap_err();
    match err {
        MetadataError::SharedFeatures { features } => assert_eq!(features, vec!["age"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn join_accepts_agreeing_shared_features() {
    let joined = numeric()
        .join(&text(), SharedRawFeatures::ErrorIfDifferent)
        .unwrap();
    assert_eq!(joined.get_features(), vec!["age", "bio", "income"]);
    assert_eq!(joined.get_feature_types_special("bio"), vec!["text"]);
}

#[test]
fn join_rejects_conflicting_raw_types() {
    let other = FeatureMetadata::from_raw_types([("age", RawGroup::Float)]);
    let err = numeric()
        .join(&other, SharedRawFeatures::ErrorIfDifferent)
        .unwrap_err();
    assert!(matches!(
        err,
        MetadataError::ConflictingRawType {
            left: RawGroup::Int,
            right: RawGroup::Float,
            ..
        }
    ));
}

#[test]
fn type_group_map_raw_groups_features() {
    let joined = numeric()
        .join(&text(), SharedRawFeatures::ErrorIfDifferent)
        .unwrap();
    let groups = joined.get_type_group_map_raw();
    assert_eq!(groups[&RawGroup::Int], vec!["age"]);
    assert_eq!(groups[&RawGroup::Float], vec!["income"]);
    assert_eq!(groups[&RawGroup::Object], vec!["bio"]);
}

#[test]
fn required_special_types_filter() {
    let metadata = text();
    let filter = FeatureFilter::new().with_required_special_types(["text"]);
    assert_eq!(metadata.get_features_filtered(&filter), vec!["bio"]);

    let filter = FeatureFilter::new().with_valid_special_types(["binned"]);
    // Features without special types pass a valid-special filter.
    assert_eq!(metadata.get_features_filtered(&filter), vec!["age"]);
}

#[test]
fn rename_moves_special_types() {
    let mut renames = BTreeMap::new();
    renames.insert("bio".to_string(), "biography".to_string());
    let renamed = text().rename_features(&renames).unwrap();
    assert!(renamed.contains("biography"));
    assert!(!renamed.contains("bio"));
    assert_eq!(renamed.get_feature_types_special("biography"), vec!["text"]);
}

#[test]
fn rename_onto_existing_feature_fails() {
    let mut renames = BTreeMap::new();
    renames.insert("bio".to_string(), "age".to_string());
    let err = text().rename_features(&renames).unwrap_err();
    assert!(matches!(err, MetadataError::DuplicateFeature { .. }));
}

#[test]
fn keep_and_missing_features() {
    let metadata = text();
    assert_eq!(metadata.missing_features(&["age", "nope"]), vec!["nope"]);
    let kept = metadata.keep_features(&["age"]);
    assert_eq!(kept.get_features(), vec!["age"]);
    assert!(kept.type_group_map_special().is_empty());
}

#[test]
fn registry_serializes_with_group_names() {
    let json = serde_json::to_value(text()).unwrap();
    assert_eq!(json["type_map_raw"]["bio"], "object");
    assert_eq!(json["type_group_map_special"]["text"][0], "bio");
}
