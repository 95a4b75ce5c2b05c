//! CLI command handlers. Each command is in its own file.

mod config;
mod engine;
mod fetch;
mod run;

pub use config::run_config;
pub use fetch::run_fetch;
pub use run::run_regions;
