//! Presence watcher CLI library.
//!
//! This crate wires the gateway event feed, the session store and the
//! notifier together behind the `aw` command.

mod cli;
pub mod commands;
mod config;
pub mod source;
pub mod store;
pub mod watcher;

pub use cli::{Cli, Commands};
pub use config::Config;
