//! `tokgen config` – show where the config lives and what it resolves to.

use anyhow::Result;
use std::path::Path;
use tokgen_core::config::{self, TokgenConfig};

pub fn run_config(cfg: &TokgenConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", cfg.to_toml_string()?);
    Ok(())
}
