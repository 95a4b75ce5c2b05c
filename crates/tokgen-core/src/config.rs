use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::regions::RegionJob;
use crate::retry::BackoffPolicy;

pub const DEFAULT_ENDPOINT_URL: &str = "https://jwt-gen-api-forpaglubot.vercel.app/token";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per account (including the first).
    pub max_attempts: u32,
    /// Flat delay before every request, in time units.
    pub pacing_units: u32,
    /// Length of one time unit in seconds; every backoff wait is a multiple of it.
    pub time_unit_secs: f64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            pacing_units: 2,
            time_unit_secs: 1.0,
            request_timeout_secs: 20.0,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: self.max_attempts,
            pacing_units: self.pacing_units,
            unit: secs(self.time_unit_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }
}

/// One region entry: account list in, token list out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub label: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl RegionConfig {
    pub fn job(&self) -> RegionJob {
        RegionJob {
            label: self.label.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
        }
    }
}

/// Global configuration loaded from `~/.config/tokgen/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokgenConfig {
    /// Token issuance endpoint; `uid` and `password` are appended as query parameters.
    pub endpoint_url: String,
    /// Maximum concurrent requests per region.
    pub concurrency: usize,
    /// Log a progress summary every N completed accounts.
    pub progress_every: usize,
    /// Pause between regions in the paced strategy, in seconds.
    pub region_pause_secs: f64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,
}

impl Default for TokgenConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            concurrency: 5,
            progress_every: 5,
            region_pause_secs: 2.0,
            retry: None,
            regions: default_regions(),
        }
    }
}

impl TokgenConfig {
    pub fn retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn region_pause(&self) -> Duration {
        secs(self.region_pause_secs)
    }

    pub fn region_jobs(&self) -> Vec<RegionJob> {
        self.regions.iter().map(RegionConfig::job).collect()
    }

    /// Effective settings as TOML, with the retry section filled in.
    pub fn to_toml_string(&self) -> Result<String> {
        let effective = TokgenConfig {
            retry: Some(self.retry()),
            ..self.clone()
        };
        Ok(toml::to_string_pretty(&effective)?)
    }
}

fn default_regions() -> Vec<RegionConfig> {
    [("bd", "BANGLADESH"), ("ind", "INDIA"), ("br", "BRAZIL")]
        .into_iter()
        .map(|(code, label)| RegionConfig {
            label: label.to_string(),
            input: PathBuf::from(format!("uidpass_{}.json", code)),
            output: PathBuf::from(format!("token_{}.json", code)),
        })
        .collect()
}

// Negative, NaN or absurd values collapse to zero instead of panicking.
fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v).unwrap_or(Duration::ZERO)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tokgen")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<TokgenConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: TokgenConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TokgenConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TokgenConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}
