//! `containerv`'s binary-crate internals, exposed as a library so its CLI
//! wiring can be exercised from integration tests without spawning a
//! separate process.

pub mod cli;
pub mod commands;
pub mod config;
pub mod state;

pub use cli::{Cli, Command};
pub use config::Config;
