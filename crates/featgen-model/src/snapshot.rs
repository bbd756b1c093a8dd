//! Exact dtype snapshot locked in at fit time.
//!
//! The snapshot keeps two views of the same data: `raw_type_map`
//! (feature -> exact dtype) and `type_group_map` (raw group -> features).
//! Both are only ever changed together, so every feature in one is in the
//! other exactly once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dtype::{RawDtype, RawGroup};
use crate::metadata::quoted_list;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactTypeSnapshot {
    raw_type_map: BTreeMap<String, RawDtype>,
    type_group_map: BTreeMap<RawGroup, BTreeSet<String>>,
}

impl ExactTypeSnapshot {
    /// Builds a snapshot from observed `(feature, dtype)` pairs. A feature
    /// listed twice keeps its last dtype.
    pub fn from_observed<S: Into<String>>(observed: impl IntoIterator<Item = (S, RawDtype)>) -> Self {
        let mut snapshot = Self::default();
        for (feature, dtype) in observed {
            snapshot.insert(feature.into(), dtype);
        }
        snapshot
    }

    fn insert(&mut self, feature: String, dtype: RawDtype) {
        if let Some(previous) = self.raw_type_map.insert(feature.clone(), dtype) {
            self.unlink(&feature, previous.group());
        }
        self.type_group_map
            .entry(dtype.group())
            .or_default()
            .insert(feature);
    }

    fn unlink(&mut self, feature: &str, group: RawGroup) {
        if let Some(members) = self.type_group_map.get_mut(&group) {
            members.remove(feature);
            if members.is_empty() {
                self.type_group_map.remove(&group);
            }
        }
    }

    pub fn raw_type_map(&self) -> &BTreeMap<String, RawDtype> {
        &self.raw_type_map
    }

    pub fn type_group_map(&self) -> &BTreeMap<RawGroup, BTreeSet<String>> {
        &self.type_group_map
    }

    pub fn dtype(&self, feature: &str) -> Option<RawDtype> {
        self.raw_type_map.get(feature).copied()
    }

    /// Features in `group`, sorted by name.
    pub fn features_in_group(&self, group: RawGroup) -> Vec<String> {
        self.type_group_map
            .get(&group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.raw_type_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_type_map.is_empty()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.raw_type_map.contains_key(feature)
    }

    /// Removes `features` from both maps and returns the names that were
    /// not tracked.
    pub fn remove_features<S: AsRef<str>>(&mut self, features: &[S]) -> Vec<String> {
        let mut untracked = Vec::new();
        for feature in features.iter().map(AsRef::as_ref) {
            match self.raw_type_map.remove(feature) {
                Some(dtype) => self.unlink(feature, dtype.group()),
                None => untracked.push(feature.to_string()),
            }
        }
        untracked
    }

    /// Groups features by `(exact dtype, raw group)` for display.
    pub fn report(&self) -> SnapshotReport {
        let mut grouped: BTreeMap<RawDtype, Vec<String>> = BTreeMap::new();
        for (feature, dtype) in &self.raw_type_map {
            grouped.entry(*dtype).or_default().push(feature.clone());
        }
        SnapshotReport {
            entries: grouped
                .into_iter()
                .map(|(dtype, features)| SnapshotEntry {
                    dtype,
                    group: dtype.group(),
                    features,
                })
                .collect(),
        }
    }
}

/// Features sharing one exact dtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub dtype: RawDtype,
    pub group: RawGroup,
    pub features: Vec<String>,
}

/// Operator-facing view of an [`ExactTypeSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub entries: Vec<SnapshotEntry>,
}

impl SnapshotReport {
    pub fn feature_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.features.len()).sum()
    }

    /// One line per entry: `('int16', 'int') : 2 | ['a', 'b']`.
    pub fn lines(&self) -> Vec<String> {
        let keys: Vec<String> = self
            .entries
            .iter()
            .map(|entry| format!("('{}', '{}')", entry.dtype, entry.group))
            .collect();
        let width = keys.iter().map(String::len).max().unwrap_or(0);
        keys.into_iter()
            .zip(&self.entries)
            .map(|(key, entry)| {
                format!(
                    "{key:<width$} : {} | {}",
                    entry.features.len(),
                    quoted_list(&entry.features)
                )
            })
            .collect()
    }
}

impl fmt::Display for SnapshotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
