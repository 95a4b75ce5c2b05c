//! `tokgen fetch` – generate tokens for one account list.

use anyhow::{bail, Result};
use std::path::PathBuf;
use tokgen_core::config::TokgenConfig;
use tokgen_core::regions::{self, RegionJob, RegionStatus};

use super::engine::Engine;

pub async fn run_fetch(
    cfg: &TokgenConfig,
    input: PathBuf,
    output: PathBuf,
    region: String,
    concurrency: Option<usize>,
) -> Result<()> {
    let job = RegionJob {
        label: region,
        input,
        output,
    };

    let engine = Engine::build(cfg, concurrency)?;
    let run = regions::run_region(&job, &engine.dispatcher).await;
    engine.finish().await;

    if let Some(report) = &run.report {
        println!("{}", report);
    }
    match run.status {
        RegionStatus::Success => {
            println!(
                "{} updated: {} tokens in {:.2}s",
                job.output.display(),
                run.tokens_written,
                run.elapsed.as_secs_f64()
            );
            Ok(())
        }
        RegionStatus::Partial => bail!(
            "{}: {} tokens written to {}, but some accounts failed",
            job.label,
            run.tokens_written,
            job.output.display()
        ),
        RegionStatus::Failed => bail!(
            "{}: {}",
            job.label,
            run.error.as_deref().unwrap_or("no tokens generated")
        ),
    }
}
