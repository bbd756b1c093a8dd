//! featgen CLI.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use featgen_cli::cli::{Cli, Command, DescribeArgs, LogFormatArg, LogLevelArg};
use featgen_cli::commands::{run_describe, run_enforce};
use featgen_cli::logging::{LogConfig, LogFormat, init_logging};

mod summary;

use crate::summary::{print_enforce_summary, print_report};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Enforce(args) => match run_enforce(&args) {
            Ok(result) => {
                print_enforce_summary(&result, args.preview_rows);
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Describe(args) => match describe(&args) {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

fn describe(args: &DescribeArgs) -> Result<()> {
    let report = run_describe(args)?;
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize snapshot")?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
