//! CLI library components for featgen.

pub mod cli;
pub mod commands;
pub mod logging;
