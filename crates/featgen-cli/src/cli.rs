//! CLI argument definitions for featgen.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use featgen_model::RawDtype;

#[derive(Parser)]
#[command(
    name = "featgen",
    version,
    about = "Lock in exact column dtypes on training data and enforce them on new data",
    long_about = "Fit a type-enforcement stage on a training CSV and apply it to other CSVs.\n\n\
                  Integer columns that gained missing values are zero-filled, and every\n\
                  column is cast back to the dtype it had at fit time."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fit on a training CSV and enforce its dtypes on an input CSV.
    Enforce(EnforceArgs),

    /// Fit on a training CSV and print the recorded dtypes.
    Describe(DescribeArgs),
}

/// Options shared by every command that fits a stage.
#[derive(Args, Clone, Debug)]
pub struct FitArgs {
    /// Training CSV the stage is fitted on.
    #[arg(long = "train", value_name = "CSV")]
    pub train: PathBuf,

    /// Cast a training column before fit (repeatable), e.g. `age=int16`.
    #[arg(long = "dtype", value_name = "FEATURE=DTYPE", value_parser = parse_dtype_override)]
    pub dtypes: Vec<DtypeOverride>,

    /// Do not warn about integer columns that already have nulls at fit.
    #[arg(long = "no-fit-null-warning")]
    pub no_fit_null_warning: bool,
}

#[derive(Args, Clone, Debug)]
pub struct EnforceArgs {
    #[command(flatten)]
    pub fit: FitArgs,

    /// CSV to transform (default: the training CSV).
    #[arg(long = "input", value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Write the transformed frame to this CSV instead of printing a preview.
    #[arg(long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Drop features from scope after fit (comma separated or repeated).
    #[arg(long = "drop", value_name = "FEATURE", value_delimiter = ',')]
    pub drop: Vec<String>,

    /// Rows shown in the preview when no output file is given.
    #[arg(long = "preview-rows", value_name = "N", default_value_t = 10)]
    pub preview_rows: usize,
}

#[derive(Args, Clone, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub fit: FitArgs,

    /// Print the snapshot as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

/// A `FEATURE=DTYPE` pair given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DtypeOverride {
    pub feature: String,
    pub dtype: RawDtype,
}

pub fn parse_dtype_override(value: &str) -> Result<DtypeOverride, String> {
    let (feature, dtype) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected FEATURE=DTYPE, got '{value}'"))?;
    let feature = feature.trim();
    if feature.is_empty() {
        return Err(format!("missing feature name in '{value}'"));
    }
    let dtype = dtype.parse::<RawDtype>().map_err(|err| err.to_string())?;
    Ok(DtypeOverride {
        feature: feature.to_string(),
        dtype,
    })
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
