//! CLI argument parsing module.

mod args;
mod commands;
mod logging;

pub use args::Cli;
pub use commands::execute;
pub use logging::init_logging;
