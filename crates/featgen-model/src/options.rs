//! Configuration options for the type-enforcement stage.

use serde::{Deserialize, Serialize};

/// What to do with missing values that show up at transform time in
/// features that had an integer dtype at fit time.
///
/// Matches on this enum are exhaustive across the workspace, so a new
/// variant has to be handled wherever repairs are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NullRepairPolicy {
    /// Replace every missing value with `0`.
    #[default]
    FillZero,
    // TODO: add Mean / Mode / Median once fit-time statistics are recorded
    // alongside the dtype snapshot.
}

/// Options controlling type enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementOptions {
    /// Repair applied to integer features that gained missing values.
    pub null_repair: NullRepairPolicy,

    /// Warn at fit time when an integer feature already contains nulls.
    /// Those nulls will be repaired on every transform.
    pub warn_on_fit_nulls: bool,
}

impl Default for EnforcementOptions {
    fn default() -> Self {
        Self {
            null_repair: NullRepairPolicy::FillZero,
            warn_on_fit_nulls: true,
        }
    }
}

impl EnforcementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fit_null_warning(mut self, enable: bool) -> Self {
        self.warn_on_fit_nulls = enable;
        self
    }
}
