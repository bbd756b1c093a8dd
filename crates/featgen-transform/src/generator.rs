//! Feature generator lifecycle.
//!
//! A feature generator is one stage of a feature-generation pipeline. It is
//! fitted once on training data and then applied to any number of frames.
//! The lifecycle is split in two pieces:
//!
//! - [`GeneratorBase`]: scope bookkeeping shared by every generator
//!   (`features_in`, input/output registries, fitted flag, log prefix).
//! - [`FeatureGenerator`]: the contract an orchestrator drives. Provided
//!   methods enforce calling order and scope selection; implementors supply
//!   the `*_impl` hooks and may refine scope inference and feature removal.
//!
//! # Example
//!
//! ```ignore
//! use featgen_transform::{FeatureGenerator, TypeEnforcementStage, tracing_sink};
//!
//! let mut stage = TypeEnforcementStage::new(tracing_sink());
//! let (train, special) = stage.fit_transform(train_df, None)?;
//! let served = stage.transform(&inference_df)?;
//! ```

use std::sync::Arc;

use featgen_common::infer_feature_metadata;
use featgen_model::metadata::quoted_list;
use featgen_model::{FeatureMetadata, SpecialGroupMap};
use polars::prelude::DataFrame;
use tracing::{Level, debug, info_span};

use crate::diagnostics::DiagnosticsSink;
use crate::error::{GeneratorError, LifecycleError, Result};

/// Scope and registry state shared by all generators.
pub struct GeneratorBase {
    name: String,
    sink: Arc<dyn DiagnosticsSink>,
    log_prefix: String,
    features_in: Vec<String>,
    feature_metadata_in: FeatureMetadata,
    feature_metadata: FeatureMetadata,
    fitted: bool,
}

impl std::fmt::Debug for GeneratorBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorBase")
            .field("name", &self.name)
            .field("features_in", &self.features_in)
            .field("fitted", &self.fitted)
            .finish_non_exhaustive()
    }
}

impl GeneratorBase {
    pub fn new(name: impl Into<String>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        let name = name.into();
        Self {
            log_prefix: format!("{name}: "),
            name,
            sink,
            features_in: Vec::new(),
            feature_metadata_in: FeatureMetadata::default(),
            feature_metadata: FeatureMetadata::default(),
            fitted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Features in scope, in the column order of the fit frame.
    pub fn features_in(&self) -> &[String] {
        &self.features_in
    }

    /// Registry of the features in scope.
    pub fn feature_metadata_in(&self) -> &FeatureMetadata {
        &self.feature_metadata_in
    }

    /// Registry of the features produced by fit.
    pub fn feature_metadata(&self) -> &FeatureMetadata {
        &self.feature_metadata
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Send a prefixed message to the diagnostics sink.
    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        self.sink
            .log(level, &format!("{}{}", self.log_prefix, message.as_ref()));
    }

    pub fn ensure_fitted(&self, operation: &'static str) -> std::result::Result<(), LifecycleError> {
        if self.fitted {
            Ok(())
        } else {
            Err(LifecycleError::NotFitted {
                generator: self.name.clone(),
                operation,
            })
        }
    }

    pub fn ensure_unfitted(&self) -> std::result::Result<(), LifecycleError> {
        if self.fitted {
            Err(LifecycleError::AlreadyFitted {
                generator: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Determine the features in scope from `metadata_in`, or from the
    /// columns of `df` when no registry is declared.
    pub fn infer_features_in(
        &mut self,
        df: &DataFrame,
        metadata_in: Option<FeatureMetadata>,
    ) -> Result<()> {
        let metadata = match metadata_in {
            Some(metadata) => metadata,
            None => infer_feature_metadata(df).map_err(|source| GeneratorError::UnsupportedDtype {
                generator: self.name.clone(),
                source,
            })?,
        };
        let columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let missing: Vec<String> = metadata
            .get_features()
            .into_iter()
            .filter(|feature| !columns.contains(feature))
            .collect();
        if !missing.is_empty() {
            return Err(GeneratorError::MissingFeatures {
                generator: self.name.clone(),
                features: missing,
            });
        }
        self.features_in = columns
            .into_iter()
            .filter(|column| metadata.contains(column))
            .collect();
        self.feature_metadata_in = metadata;
        debug!(
            generator = %self.name,
            features = self.features_in.len(),
            "inferred features in scope"
        );
        Ok(())
    }

    /// Returns a new frame holding only the in-scope columns, in scope order.
    pub fn select_features_in(&self, df: &DataFrame) -> Result<DataFrame> {
        let missing: Vec<String> = self
            .features_in
            .iter()
            .filter(|feature| df.column(feature.as_str()).is_err())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GeneratorError::MissingFeatures {
                generator: self.name.clone(),
                features: missing,
            });
        }
        Ok(df.select(self.features_in.iter().map(String::as_str))?)
    }

    /// Drop `features` from the scope and the input registry.
    pub fn remove_features_in(&mut self, features: &[String]) {
        self.features_in.retain(|feature| !features.contains(feature));
        self.feature_metadata_in = self.feature_metadata_in.remove_features(features);
    }

    /// Drop `features` from the output registry.
    pub fn remove_features_out(&mut self, features: &[String]) {
        self.feature_metadata = self.feature_metadata.remove_features(features);
    }

    /// Record the output registry and mark the generator fitted.
    pub fn finish_fit(&mut self, output: &DataFrame, special: SpecialGroupMap) -> Result<()> {
        let raw = infer_feature_metadata(output).map_err(|source| {
            GeneratorError::UnsupportedDtype {
                generator: self.name.clone(),
                source,
            }
        })?;
        self.feature_metadata = FeatureMetadata::new(raw.type_map_raw().clone(), special)?;
        self.fitted = true;
        Ok(())
    }

    /// Dump the input and output registries to the sink.
    pub fn log_feature_metadata(&self, level: Level) {
        self.log(level, "Types of features in original data (raw dtype, special dtypes):");
        for line in self.feature_metadata_in.feature_metadata_lines() {
            self.log(level, format!("\t{line}"));
        }
        self.log(level, "Types of features in processed data (raw dtype, special dtypes):");
        for line in self.feature_metadata.feature_metadata_lines() {
            self.log(level, format!("\t{line}"));
        }
    }
}

/// Fit/transform contract for a pipeline stage.
///
/// Fit happens exactly once. `transform` only reads fit-time state and is
/// safe to call concurrently through a shared reference.
pub trait FeatureGenerator: Send + Sync {
    fn base(&self) -> &GeneratorBase;

    fn base_mut(&mut self) -> &mut GeneratorBase;

    /// Fit on the in-scope frame and return the output frame together with
    /// the special-type map the stage declares for its output.
    fn fit_transform_impl(&mut self, df: DataFrame) -> Result<(DataFrame, SpecialGroupMap)>;

    /// Apply the fitted stage to an in-scope frame.
    fn transform_impl(&self, df: DataFrame) -> Result<DataFrame>;

    /// Scope refinement hook, called once at fit before `fit_transform_impl`.
    fn infer_features_in_full(
        &mut self,
        df: &DataFrame,
        metadata_in: Option<FeatureMetadata>,
    ) -> Result<()> {
        self.base_mut().infer_features_in(df, metadata_in)
    }

    /// Called when upstream drops features from scope.
    fn remove_features_in(&mut self, features: &[String]) -> Result<()> {
        self.base_mut().remove_features_in(features);
        Ok(())
    }

    /// Dump fit-time type information through the diagnostics sink.
    fn log_feature_metadata_info(&self, level: Level) {
        self.base().log_feature_metadata(level);
    }

    fn fit_transform(
        &mut self,
        df: DataFrame,
        metadata_in: Option<FeatureMetadata>,
    ) -> Result<(DataFrame, SpecialGroupMap)> {
        self.base().ensure_unfitted()?;
        let span = info_span!(
            "fit_transform",
            generator = %self.base().name(),
            rows = df.height(),
            columns = df.width()
        );
        let _guard = span.enter();

        self.infer_features_in_full(&df, metadata_in)?;
        let df = self.base().select_features_in(&df)?;
        let (output, special) = self.fit_transform_impl(df)?;
        self.base_mut().finish_fit(&output, special.clone())?;
        Ok((output, special))
    }

    fn fit(&mut self, df: DataFrame, metadata_in: Option<FeatureMetadata>) -> Result<()> {
        self.fit_transform(df, metadata_in).map(|_| ())
    }

    /// Restrict `df` to the fit-time scope and apply the stage. The caller's
    /// frame is left untouched.
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.base().ensure_fitted("transform")?;
        let span = info_span!(
            "transform",
            generator = %self.base().name(),
            rows = df.height()
        );
        let _guard = span.enter();

        let df = self.base().select_features_in(df)?;
        self.transform_impl(df)
    }

    /// Drop `features` from scope. Names outside the scope are ignored.
    fn remove_features(&mut self, features: &[String]) -> Result<()> {
        self.base().ensure_fitted("remove_features")?;
        if features.is_empty() {
            return Ok(());
        }
        let absent: Vec<String> = features
            .iter()
            .filter(|feature| !self.base().features_in().contains(feature))
            .cloned()
            .collect();
        if !absent.is_empty() {
            self.base().log(
                Level::DEBUG,
                format!("Ignoring removal of features not in scope: {}", quoted_list(&absent)),
            );
        }
        self.remove_features_in(features)?;
        self.base_mut().remove_features_out(features);
        Ok(())
    }
}
