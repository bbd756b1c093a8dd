//! Exact dtype enforcement.
//!
//! [`TypeEnforcementStage`] records the exact dtype of every in-scope feature
//! at fit time and casts each later frame back to it. Integer features that
//! gained missing values since fit are zero-filled first, since an integer
//! column cannot hold them.

use std::sync::Arc;

use featgen_common::{
    UnsupportedDtype, fill_missing_with_zero, missing_count, polars_dtype, raw_dtype_of,
    uncoercible_samples,
};
use featgen_model::metadata::quoted_list;
use featgen_model::{
    EnforcementOptions, ExactTypeSnapshot, FeatureMetadata, NullRepairPolicy, SnapshotReport,
    SpecialGroupMap,
};
use polars::prelude::{Column, DataFrame};
use tracing::{Level, debug};

use crate::diagnostics::DiagnosticsSink;
use crate::error::{CoercionFailure, GeneratorError, LifecycleError, Result, TypeCoercionError};
use crate::generator::{FeatureGenerator, GeneratorBase};

/// Number of rejected values quoted per failing feature.
const SAMPLE_LIMIT: usize = 3;

/// Locks in exact feature dtypes at fit and enforces them at transform.
#[derive(Debug)]
pub struct TypeEnforcementStage {
    base: GeneratorBase,
    options: EnforcementOptions,
    snapshot: Option<ExactTypeSnapshot>,
}

impl TypeEnforcementStage {
    pub const NAME: &'static str = "TypeEnforcementStage";

    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            base: GeneratorBase::new(Self::NAME, sink),
            options: EnforcementOptions::default(),
            snapshot: None,
        }
    }

    pub fn with_options(mut self, options: EnforcementOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EnforcementOptions {
        &self.options
    }

    /// Exact dtypes recorded at fit, `None` before fit.
    pub fn snapshot(&self) -> Option<&ExactTypeSnapshot> {
        self.snapshot.as_ref()
    }

    /// Fit-time dtypes grouped by `(exact dtype, raw group)`.
    pub fn describe(&self) -> std::result::Result<SnapshotReport, LifecycleError> {
        self.base.ensure_fitted("describe")?;
        Ok(self.fitted_snapshot("describe")?.report())
    }

    fn fitted_snapshot(
        &self,
        operation: &'static str,
    ) -> std::result::Result<&ExactTypeSnapshot, LifecycleError> {
        self.snapshot.as_ref().ok_or_else(|| LifecycleError::NotFitted {
            generator: self.base.name().to_string(),
            operation,
        })
    }

    /// In-scope features whose declared raw group cannot hold missing values.
    fn null_intolerant_features(&self) -> Vec<String> {
        let metadata = self.base.feature_metadata_in();
        self.base
            .features_in()
            .iter()
            .filter(|feature| {
                metadata
                    .get_feature_type_raw(feature)
                    .is_some_and(|group| group.is_null_intolerant())
            })
            .cloned()
            .collect()
    }

    fn snapshot_dtypes(&self, df: &DataFrame) -> Result<ExactTypeSnapshot> {
        let mut observed = Vec::with_capacity(self.base.features_in().len());
        for feature in self.base.features_in() {
            let column = df.column(feature)?;
            let dtype = raw_dtype_of(column.dtype()).ok_or_else(|| {
                GeneratorError::UnsupportedDtype {
                    generator: self.base.name().to_string(),
                    source: UnsupportedDtype {
                        column: feature.clone(),
                        dtype: column.dtype().to_string(),
                    },
                }
            })?;
            observed.push((feature.clone(), dtype));
        }
        Ok(ExactTypeSnapshot::from_observed(observed))
    }

    fn warn_fit_nulls(&self, df: &DataFrame) -> Result<()> {
        let mut with_nulls = Vec::new();
        for feature in self.null_intolerant_features() {
            if missing_count(df.column(&feature)?)? > 0 {
                with_nulls.push(feature);
            }
        }
        if !with_nulls.is_empty() {
            self.base.log(
                Level::WARN,
                format!(
                    "Int features contain null values at fit time and will be imputed to 0 \
                     on every transform: {}",
                    quoted_list(&with_nulls)
                ),
            );
        }
        Ok(())
    }

    /// Zero-fill integer features that carry missing values.
    fn repair_missing(&self, df: &mut DataFrame) -> Result<()> {
        let mut divergent = Vec::new();
        for feature in self.null_intolerant_features() {
            let column = df.column(&feature)?;
            let missing = missing_count(column)?;
            if missing == 0 {
                continue;
            }
            let repaired = match self.options.null_repair {
                NullRepairPolicy::FillZero => fill_missing_with_zero(column)?,
            };
            df.with_column(repaired)?;
            divergent.push((feature, missing));
        }
        if divergent.is_empty() {
            return Ok(());
        }

        let listed: Vec<String> = divergent
            .iter()
            .map(|(feature, missing)| format!("'{feature}' ({missing})"))
            .collect();
        self.base.log(
            Level::WARN,
            format!(
                "Int features without null values at fit time contain null values at \
                 transform time! Imputing nulls to 0. To avoid this, pass the features as \
                 floats during fit. Int features with nulls: [{}]",
                listed.join(", ")
            ),
        );
        Ok(())
    }

    /// Strict-cast every in-scope column, collecting all failures.
    fn coerce(&self, df: &DataFrame, snapshot: &ExactTypeSnapshot) -> Result<Vec<Column>> {
        let mut columns = Vec::with_capacity(self.base.features_in().len());
        let mut failures = Vec::new();
        for feature in self.base.features_in() {
            let column = df.column(feature)?;
            let Some(target) = snapshot.dtype(feature) else {
                columns.push(column.clone());
                continue;
            };
            let target_dtype = polars_dtype(target);
            if column.dtype() == &target_dtype {
                columns.push(column.clone());
                continue;
            }
            match column.strict_cast(&target_dtype) {
                Ok(cast) => columns.push(cast),
                Err(err) => failures.push(CoercionFailure {
                    feature: feature.clone(),
                    source_dtype: column.dtype().to_string(),
                    target,
                    samples: uncoercible_samples(column, &target_dtype, SAMPLE_LIMIT)
                        .unwrap_or_default(),
                    reason: err.to_string(),
                }),
            }
        }
        if failures.is_empty() {
            Ok(columns)
        } else {
            Err(TypeCoercionError {
                generator: self.base.name().to_string(),
                failures,
            }
            .into())
        }
    }
}

impl FeatureGenerator for TypeEnforcementStage {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GeneratorBase {
        &mut self.base
    }

    fn infer_features_in_full(
        &mut self,
        df: &DataFrame,
        metadata_in: Option<FeatureMetadata>,
    ) -> Result<()> {
        self.base.infer_features_in(df, metadata_in)?;
        let snapshot = self.snapshot_dtypes(df)?;
        debug!(
            generator = %self.base.name(),
            features = snapshot.len(),
            "recorded exact dtypes"
        );
        self.snapshot = Some(snapshot);
        if self.options.warn_on_fit_nulls {
            self.warn_fit_nulls(df)?;
        }
        Ok(())
    }

    fn fit_transform_impl(&mut self, df: DataFrame) -> Result<(DataFrame, SpecialGroupMap)> {
        let special = self.base.feature_metadata_in().type_group_map_special().clone();
        Ok((df, special))
    }

    fn transform_impl(&self, mut df: DataFrame) -> Result<DataFrame> {
        let snapshot = self.fitted_snapshot("transform")?;
        self.repair_missing(&mut df)?;
        let columns = self.coerce(&df, snapshot)?;
        Ok(DataFrame::new(columns)?)
    }

    fn remove_features_in(&mut self, features: &[String]) -> Result<()> {
        self.base.remove_features_in(features);
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.remove_features(features);
        }
        Ok(())
    }

    fn log_feature_metadata_info(&self, level: Level) {
        if let Some(snapshot) = &self.snapshot {
            self.base
                .log(level, "Original Features (exact raw dtype, raw dtype):");
            for line in snapshot.report().lines() {
                self.base.log(level, format!("\t{line}"));
            }
        }
        self.base.log_feature_metadata(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use polars::df;

    fn fitted(sink: Arc<MemorySink>) -> TypeEnforcementStage {
        let mut stage = TypeEnforcementStage::new(sink);
        let train = df!(
            "a" => [1i16, 2, 3],
            "b" => [0.5f32, 1.5, 2.5],
        )
        .unwrap();
        stage.fit(train, None).unwrap();
        stage
    }

    #[test]
    fn null_intolerant_features_follow_declared_registry() {
        let stage = fitted(Arc::new(MemorySink::new()));
        assert_eq!(stage.null_intolerant_features(), vec!["a"]);
    }

    #[test]
    fn unsigned_features_are_null_intolerant() {
        let mut stage = TypeEnforcementStage::new(Arc::new(MemorySink::new()));
        let train = df!(
            "u" => [1u16, 2],
            "s" => ["x", "y"],
            "i" => [3i8, 4],
        )
        .unwrap();
        stage.fit(train, None).unwrap();
        assert_eq!(stage.null_intolerant_features(), vec!["u", "i"]);
    }

    #[test]
    fn explicit_fill_zero_policy_repairs_int_nulls() {
        let sink = Arc::new(MemorySink::new());
        let options = EnforcementOptions {
            null_repair: NullRepairPolicy::FillZero,
            ..EnforcementOptions::default()
        };
        let mut stage = TypeEnforcementStage::new(sink.clone()).with_options(options);
        stage.fit(df!("a" => [1i32, 2]).unwrap(), None).unwrap();

        let output = stage
            .transform(&df!("a" => [Some(7i32), None]).unwrap())
            .unwrap();
        let a: Vec<Option<i32>> = output.column("a").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(a, vec![Some(7), Some(0)]);
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn missing_snapshot_reports_the_calling_operation() {
        let stage = TypeEnforcementStage::new(Arc::new(MemorySink::new()));
        let err = stage.fitted_snapshot("describe").unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::NotFitted {
                operation: "describe",
                ..
            }
        ));
    }

    #[test]
    fn repair_is_skipped_without_missing_values() {
        let sink = Arc::new(MemorySink::new());
        let stage = fitted(sink.clone());
        let mut df = df!("a" => [4i64, 5], "b" => [1.0f64, 2.0]).unwrap();
        stage.repair_missing(&mut df).unwrap();
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn fit_time_nulls_warn_once() {
        let sink = Arc::new(MemorySink::new());
        let mut stage = TypeEnforcementStage::new(sink.clone());
        let train = df!("a" => [Some(1i64), None], "c" => [Some(2i32), None]).unwrap();
        stage.fit(train, None).unwrap();

        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("['a', 'c']"));
    }

    #[test]
    fn fit_time_null_warning_can_be_disabled() {
        let sink = Arc::new(MemorySink::new());
        let mut stage = TypeEnforcementStage::new(sink.clone())
            .with_options(EnforcementOptions::new().with_fit_null_warning(false));
        let train = df!("a" => [Some(1i64), None]).unwrap();
        stage.fit(train, None).unwrap();
        assert!(sink.warnings().is_empty());
    }
}
