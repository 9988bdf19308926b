//! CLI subcommand implementations.

pub mod sessions;
pub mod status;
pub mod util;
pub mod watch;
