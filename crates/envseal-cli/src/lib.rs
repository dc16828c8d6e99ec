//! envseal CLI library
//!
//! Subcommand implementations for the `envseal` binary. Each command takes
//! its clap arguments plus the resolved [`envseal_core::Config`] and returns
//! the path it wrote (if any), so the commands can be driven from tests.

pub mod check_cmd;
pub mod keygen_cmd;
pub mod ledger_cmd;
pub mod open_cmd;
pub mod output;
pub mod seal_cmd;
