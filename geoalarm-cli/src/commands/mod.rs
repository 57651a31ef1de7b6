//! CLI subcommands.

pub mod config;
pub mod distance;
pub mod simulate;
