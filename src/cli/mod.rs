//! Command-line interface
//!
//! The binary is the thin glue between an external scheduler and the
//! tracker: one-shot ticks for cron, a built-in fixed-interval loop, and
//! operator commands for inspecting state.

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
