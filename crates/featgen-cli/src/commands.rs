use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};
use tracing::{Level, debug, info, info_span};

use featgen_common::{polars_dtype, raw_dtype_of};
use featgen_model::{EnforcementOptions, RawDtype, SnapshotReport};
use featgen_transform::{
    DiagnosticsSink, FeatureGenerator, LogEntry, MemorySink, TracingSink, TypeEnforcementStage,
};

use crate::cli::{DescribeArgs, DtypeOverride, EnforceArgs, FitArgs};

/// Forwards to `tracing` and keeps a copy for the end-of-run summary.
#[derive(Debug, Default)]
pub struct RecordingSink {
    memory: MemorySink,
}

impl RecordingSink {
    pub fn warnings(&self) -> Vec<LogEntry> {
        self.memory.warnings()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn log(&self, level: Level, message: &str) {
        TracingSink.log(level, message);
        self.memory.log(level, message);
    }
}

/// Dtype of one feature before and after enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDtypes {
    pub feature: String,
    /// Dtype the feature had in the input CSV, `None` if unsupported.
    pub input: Option<RawDtype>,
    pub enforced: RawDtype,
}

#[derive(Debug)]
pub struct EnforceResult {
    pub frame: DataFrame,
    pub features: Vec<FeatureDtypes>,
    pub dropped: Vec<String>,
    pub warnings: Vec<String>,
    pub output: Option<PathBuf>,
}

pub fn run_enforce(args: &EnforceArgs) -> Result<EnforceResult> {
    let span = info_span!("enforce", train = %args.fit.train.display());
    let _guard = span.enter();
    let start = Instant::now();

    let sink = Arc::new(RecordingSink::default());
    let mut stage = fit_stage(&args.fit, sink.clone())?;

    if !args.drop.is_empty() {
        stage
            .remove_features(&args.drop)
            .context("drop features from scope")?;
        info!(dropped = args.drop.len(), "dropped features from scope");
    }

    let input_path = args.input.as_deref().unwrap_or(args.fit.train.as_path());
    let input = read_csv(input_path)?;
    let mut frame = stage
        .transform(&input)
        .with_context(|| format!("enforce dtypes on {}", input_path.display()))?;

    let snapshot = stage.snapshot().context("fitted stage has no dtype snapshot")?;
    let features = stage
        .base()
        .features_in()
        .iter()
        .filter_map(|feature| {
            let enforced = snapshot.dtype(feature)?;
            let input = input
                .column(feature)
                .ok()
                .and_then(|column| raw_dtype_of(column.dtype()));
            Some(FeatureDtypes {
                feature: feature.clone(),
                input,
                enforced,
            })
        })
        .collect();

    if let Some(path) = &args.output {
        write_csv(&mut frame, path)?;
    }
    info!(
        rows = frame.height(),
        columns = frame.width(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "enforcement complete"
    );

    Ok(EnforceResult {
        frame,
        features,
        dropped: args.drop.clone(),
        warnings: sink.warnings().into_iter().map(|entry| entry.message).collect(),
        output: args.output.clone(),
    })
}

pub fn run_describe(args: &DescribeArgs) -> Result<SnapshotReport> {
    let span = info_span!("describe", train = %args.fit.train.display());
    let _guard = span.enter();

    let stage = fit_stage(&args.fit, Arc::new(TracingSink))?;
    stage.log_feature_metadata_info(Level::INFO);
    Ok(stage.describe()?)
}

fn fit_stage(args: &FitArgs, sink: Arc<dyn DiagnosticsSink>) -> Result<TypeEnforcementStage> {
    let train = read_csv(&args.train)?;
    let train = apply_dtype_overrides(train, &args.dtypes)?;
    let options = EnforcementOptions::new().with_fit_null_warning(!args.no_fit_null_warning);
    let mut stage = TypeEnforcementStage::new(sink).with_options(options);
    stage
        .fit(train, None)
        .with_context(|| format!("fit on {}", args.train.display()))?;
    debug!(features = stage.base().features_in().len(), "stage fitted");
    Ok(stage)
}

/// Cast training columns to the requested dtypes before fit.
pub fn apply_dtype_overrides(mut df: DataFrame, overrides: &[DtypeOverride]) -> Result<DataFrame> {
    for DtypeOverride { feature, dtype } in overrides {
        let column = df
            .column(feature)
            .with_context(|| format!("--dtype names unknown column '{feature}'"))?;
        let cast = column
            .strict_cast(&polars_dtype(*dtype))
            .with_context(|| format!("cast '{feature}' from {} to {dtype}", column.dtype()))?;
        df.with_column(cast)?;
    }
    Ok(df)
}

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        bail!("CSV file not found: {}", path.display());
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("open {}", path.display()))?
        .finish()
        .with_context(|| format!("parse {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read csv");
    Ok(df)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
