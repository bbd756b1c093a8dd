//! Feature type registry.
//!
//! [`FeatureMetadata`] maps every feature to its [`RawGroup`] and tags
//! features with free-form special types (`text`, `datetime_as_int`, ...).
//! It is an immutable value: every mutating operation returns a new
//! instance and leaves the receiver untouched.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dtype::RawGroup;
use crate::error::{MetadataError, Result};

/// Special type name -> features carrying that type.
pub type SpecialGroupMap = BTreeMap<String, Vec<String>>;

/// How [`FeatureMetadata::join`] treats features present in both registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SharedRawFeatures {
    /// Any shared feature is an error.
    #[default]
    Error,
    /// Shared features are allowed when both sides agree on the raw group.
    ErrorIfDifferent,
}

/// Selection criteria for [`FeatureMetadata::get_features_filtered`].
///
/// An empty filter selects every feature.
#[derive(Debug, Clone, Default)]
pub struct FeatureFilter {
    valid_raw_types: Option<Vec<RawGroup>>,
    invalid_raw_types: Vec<RawGroup>,
    valid_special_types: Option<Vec<String>>,
    invalid_special_types: Vec<String>,
    required_special_types: Vec<String>,
}

impl FeatureFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only features whose raw group is one of `groups`.
    pub fn with_valid_raw_types(mut self, groups: impl IntoIterator<Item = RawGroup>) -> Self {
        self.valid_raw_types = Some(groups.into_iter().collect());
        self
    }

    /// Drop features whose raw group is one of `groups`.
    pub fn with_invalid_raw_types(mut self, groups: impl IntoIterator<Item = RawGroup>) -> Self {
        self.invalid_raw_types = groups.into_iter().collect();
        self
    }

    /// Keep features with no special type, or with at least one of `types`.
    pub fn with_valid_special_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.valid_special_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Drop features carrying any of `types`.
    pub fn with_invalid_special_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.invalid_special_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Keep only features carrying all of `types`.
    pub fn with_required_special_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_special_types = types.into_iter().map(Into::into).collect();
        self
    }

    fn accepts(&self, raw: RawGroup, special: &[String]) -> bool {
        if let Some(valid) = &self.valid_raw_types {
            if !valid.contains(&raw) {
                return false;
            }
        }
        if self.invalid_raw_types.contains(&raw) {
            return false;
        }
        if let Some(valid) = &self.valid_special_types {
            if !special.is_empty() && !special.iter().any(|s| valid.contains(s)) {
                return false;
            }
        }
        if special.iter().any(|s| self.invalid_special_types.contains(s)) {
            return false;
        }
        self.required_special_types
            .iter()
            .all(|required| special.contains(required))
    }
}

/// Registry of feature raw groups and special types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    type_map_raw: BTreeMap<String, RawGroup>,
    #[serde(default)]
    type_group_map_special: SpecialGroupMap,
}

impl FeatureMetadata {
    /// Builds a registry, checking that every feature tagged with a special
    /// type also has a raw group.
    pub fn new(
        type_map_raw: BTreeMap<String, RawGroup>,
        type_group_map_special: SpecialGroupMap,
    ) -> Result<Self> {
        for (special_type, features) in &type_group_map_special {
            let unknown: Vec<String> = features
                .iter()
                .filter(|f| !type_map_raw.contains_key(*f))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(MetadataError::UnknownSpecialFeatures {
                    special_type: special_type.clone(),
                    features: unknown,
                });
            }
        }
        Ok(Self {
            type_map_raw,
            type_group_map_special,
        })
    }

    /// Builds a registry with raw groups only.
    pub fn from_raw_types<S: Into<String>>(types: impl IntoIterator<Item = (S, RawGroup)>) -> Self {
        Self {
            type_map_raw: types.into_iter().map(|(f, g)| (f.into(), g)).collect(),
            type_group_map_special: SpecialGroupMap::new(),
        }
    }

    /// Returns a copy with `features` tagged as `special_type`.
    pub fn with_special_type(
        &self,
        special_type: impl Into<String>,
        features: &[&str],
    ) -> Result<Self> {
        let mut special = self.type_group_map_special.clone();
        let entry = special.entry(special_type.into()).or_default();
        for feature in features {
            if !entry.iter().any(|f| f == *feature) {
                entry.push((*feature).to_string());
            }
        }
        Self::new(self.type_map_raw.clone(), special)
    }

    pub fn type_map_raw(&self) -> &BTreeMap<String, RawGroup> {
        &self.type_map_raw
    }

    pub fn type_group_map_special(&self) -> &SpecialGroupMap {
        &self.type_group_map_special
    }

    pub fn len(&self) -> usize {
        self.type_map_raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_map_raw.is_empty()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.type_map_raw.contains_key(feature)
    }

    /// All features, sorted by name.
    pub fn get_features(&self) -> Vec<String> {
        self.type_map_raw.keys().cloned().collect()
    }

    /// Features matching `filter`, sorted by name.
    pub fn get_features_filtered(&self, filter: &FeatureFilter) -> Vec<String> {
        self.type_map_raw
            .iter()
            .filter(|(feature, raw)| filter.accepts(**raw, &self.get_feature_types_special(feature)))
            .map(|(feature, _)| feature.clone())
            .collect()
    }

    pub fn get_feature_type_raw(&self, feature: &str) -> Option<RawGroup> {
        self.type_map_raw.get(feature).copied()
    }

    /// Special types carried by `feature`, in special-type name order.
    pub fn get_feature_types_special(&self, feature: &str) -> Vec<String> {
        self.type_group_map_special
            .iter()
            .filter(|(_, features)| features.iter().any(|f| f == feature))
            .map(|(special_type, _)| special_type.clone())
            .collect()
    }

    /// Raw group -> features in that group.
    pub fn get_type_group_map_raw(&self) -> BTreeMap<RawGroup, Vec<String>> {
        let mut groups: BTreeMap<RawGroup, Vec<String>> = BTreeMap::new();
        for (feature, raw) in &self.type_map_raw {
            groups.entry(*raw).or_default().push(feature.clone());
        }
        groups
    }

    /// Names in `features` that this registry does not know.
    pub fn missing_features<S: AsRef<str>>(&self, features: &[S]) -> Vec<String> {
        features
            .iter()
            .map(AsRef::as_ref)
            .filter(|f| !self.contains(f))
            .map(str::to_string)
            .collect()
    }

    /// Returns a registry without `features`. Unknown names are ignored.
    pub fn remove_features<S: AsRef<str>>(&self, features: &[S]) -> Self {
        let drop: BTreeSet<&str> = features.iter().map(AsRef::as_ref).collect();
        self.retain(|feature| !drop.contains(feature))
    }

    /// Returns a registry restricted to `features`. Unknown names are ignored.
    pub fn keep_features<S: AsRef<str>>(&self, features: &[S]) -> Self {
        let keep: BTreeSet<&str> = features.iter().map(AsRef::as_ref).collect();
        self.retain(|feature| keep.contains(feature))
    }

    fn retain(&self, keep: impl Fn(&str) -> bool) -> Self {
        let type_map_raw = self
            .type_map_raw
            .iter()
            .filter(|(feature, _)| keep(feature))
            .map(|(feature, raw)| (feature.clone(), *raw))
            .collect();
        let type_group_map_special = self
            .type_group_map_special
            .iter()
            .filter_map(|(special_type, features)| {
                let kept: Vec<String> = features.iter().filter(|f| keep(f)).cloned().collect();
                (!kept.is_empty()).then(|| (special_type.clone(), kept))
            })
            .collect();
        Self {
            type_map_raw,
            type_group_map_special,
        }
    }

    /// Merges two registries into a new one.
    pub fn join(&self, other: &FeatureMetadata, shared: SharedRawFeatures) -> Result<Self> {
        let shared_features: Vec<String> = self
            .type_map_raw
            .keys()
            .filter(|f| other.contains(f))
            .cloned()
            .collect();
        match shared {
            SharedRawFeatures::Error if !shared_features.is_empty() => {
                return Err(MetadataError::SharedFeatures {
                    features: shared_features,
                });
            }
            SharedRawFeatures::ErrorIfDifferent => {
                for feature in &shared_features {
                    let left = self.type_map_raw[feature];
                    let right = other.type_map_raw[feature];
                    if left != right {
                        return Err(MetadataError::ConflictingRawType {
                            feature: feature.clone(),
                            left,
                            right,
                        });
                    }
                }
            }
            SharedRawFeatures::Error => {}
        }

        let mut type_map_raw = self.type_map_raw.clone();
        type_map_raw.extend(other.type_map_raw.iter().map(|(f, g)| (f.clone(), *g)));

        let mut special = self.type_group_map_special.clone();
        for (special_type, features) in &other.type_group_map_special {
            let entry = special.entry(special_type.clone()).or_default();
            for feature in features {
                if !entry.contains(feature) {
                    entry.push(feature.clone());
                }
            }
        }
        Self::new(type_map_raw, special)
    }

    /// Returns a registry with features renamed per `renames`; names not in
    /// the map are kept as-is.
    pub fn rename_features(&self, renames: &BTreeMap<String, String>) -> Result<Self> {
        let rename = |feature: &String| renames.get(feature).unwrap_or(feature).clone();
        let mut type_map_raw = BTreeMap::new();
        for (feature, raw) in &self.type_map_raw {
            let renamed = rename(feature);
            if type_map_raw.insert(renamed.clone(), *raw).is_some() {
                return Err(MetadataError::DuplicateFeature { feature: renamed });
            }
        }
        let type_group_map_special = self
            .type_group_map_special
            .iter()
            .map(|(special_type, features)| {
                (special_type.clone(), features.iter().map(&rename).collect())
            })
            .collect();
        Self::new(type_map_raw, type_group_map_special)
    }

    /// One line per `(raw group, special types)` combination:
    /// `('int', ['binned']) : 2 | ['age', 'height']`.
    pub fn feature_metadata_lines(&self) -> Vec<String> {
        let mut grouped: BTreeMap<(RawGroup, Vec<String>), Vec<String>> = BTreeMap::new();
        for (feature, raw) in &self.type_map_raw {
            grouped
                .entry((*raw, self.get_feature_types_special(feature)))
                .or_default()
                .push(feature.clone());
        }
        let keys: Vec<String> = grouped
            .keys()
            .map(|(raw, special)| format!("('{raw}', {})", quoted_list(special)))
            .collect();
        let width = keys.iter().map(String::len).max().unwrap_or(0);
        keys.into_iter()
            .zip(grouped.values())
            .map(|(key, features)| {
                format!("{key:<width$} : {} | {}", features.len(), quoted_list(features))
            })
            .collect()
    }
}

/// Formats names as `['a', 'b']`.
pub fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{item}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureMetadata {
        FeatureMetadata::from_raw_types([
            ("age", RawGroup::Int),
            ("income", RawGroup::Float),
            ("name", RawGroup::Object),
        ])
        .with_special_type("text", &["name"])
        .unwrap()
    }

    #[test]
    fn special_features_must_have_raw_type() {
        let mut special = SpecialGroupMap::new();
        special.insert("text".to_string(), vec!["ghost".to_string()]);
        let err = FeatureMetadata::new(BTreeMap::new(), special).unwrap_err();
        assert!(matches!(err, MetadataError::UnknownSpecialFeatures { .. }));
    }

    #[test]
    fn remove_features_is_a_new_value() {
        let metadata = sample();
        let removed = metadata.remove_features(&["name", "unknown"]);
        assert!(metadata.contains("name"));
        assert!(!removed.contains("name"));
        assert!(removed.type_group_map_special().is_empty());
        assert_eq!(removed.len(), 2);
    }

    #[test]
    fn filter_by_raw_group() {
        let metadata = sample();
        let ints = metadata
            .get_features_filtered(&FeatureFilter::new().with_valid_raw_types([RawGroup::Int]));
        assert_eq!(ints, vec!["age".to_string()]);

        let not_text = metadata
            .get_features_filtered(&FeatureFilter::new().with_invalid_special_types(["text"]));
        assert_eq!(not_text, vec!["age".to_string(), "income".to_string()]);
    }

    #[test]
    fn lines_group_by_raw_and_special() {
        let lines = sample().feature_metadata_lines();
        assert_eq!(
            lines,
            vec![
                "('int', [])          : 1 | ['age']".to_string(),
                "('float', [])        : 1 | ['income']".to_string(),
                "('object', ['text']) : 1 | ['name']".to_string(),
            ]
        );
    }
}
