//! Multi-region orchestration with strategy fallback.
//!
//! Each region is one batch: read its account list, dispatch it, log the
//! report, persist the tokens. A strategy runs every region and fails when
//! fewer regions succeed than were submitted; `run_with_fallback` tries the
//! configured strategies in order until one succeeds.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use thiserror::Error;
use tokio::time::Instant;

use crate::fetch::TokenEndpoint;
use crate::report::{self, Report};
use crate::scheduler::Dispatcher;
use crate::store;

/// One region: where its accounts come from and where its tokens go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionJob {
    pub label: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    /// Every account produced a token and the token file was written.
    Success,
    /// Token file written, but some accounts failed.
    Partial,
    /// Nothing written.
    Failed,
}

impl fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionStatus::Success => write!(f, "SUCCESS"),
            RegionStatus::Partial => write!(f, "PARTIAL"),
            RegionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionRun {
    pub label: String,
    pub status: RegionStatus,
    /// Present when the batch actually ran.
    pub report: Option<Report>,
    pub tokens_written: usize,
    pub elapsed: Duration,
    /// Why the region failed before or after the batch (read/write errors, cancellation).
    pub error: Option<String>,
}

impl RegionRun {
    fn failed(job: &RegionJob, started: Instant, error: String) -> Self {
        Self {
            label: job.label.clone(),
            status: RegionStatus::Failed,
            report: None,
            tokens_written: 0,
            elapsed: started.elapsed(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RegionStatus::Success
    }
}

/// How regions are walked within one orchestration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStrategy {
    /// One region at a time with a pause between regions.
    Paced(Duration),
    /// One region at a time, back-to-back.
    Sequential,
}

impl fmt::Display for RunStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStrategy::Paced(d) => write!(f, "paced ({:.1}s between regions)", d.as_secs_f64()),
            RunStrategy::Sequential => write!(f, "sequential"),
        }
    }
}

impl RunStrategy {
    /// Default order: paced first, plain sequential as the fallback.
    pub fn default_chain(region_pause: Duration) -> Vec<RunStrategy> {
        vec![RunStrategy::Paced(region_pause), RunStrategy::Sequential]
    }

    fn pause(&self) -> Duration {
        match self {
            RunStrategy::Paced(d) => *d,
            RunStrategy::Sequential => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub strategy: RunStrategy,
    pub regions: Vec<RegionRun>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn successful(&self) -> usize {
        self.regions.iter().filter(|r| r.is_success()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.successful() == self.regions.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== FINAL RESULTS ({}) ===", self.strategy)?;
        writeln!(
            f,
            "Total time: {:.2} seconds ({:.1} minutes)",
            self.elapsed.as_secs_f64(),
            self.elapsed.as_secs_f64() / 60.0
        )?;
        write!(f, "Successful regions: {}/{}", self.successful(), self.regions.len())?;
        for region in &self.regions {
            write!(f, "\n  {}: {}", region.label, region.status)?;
        }
        Ok(())
    }
}

/// A strategy ran to the end but not every region succeeded.
#[derive(Debug, Error)]
#[error(
    "only {}/{} regions updated successfully ({})",
    .summary.successful(),
    .summary.regions.len(),
    .summary.strategy
)]
pub struct IncompleteRun {
    pub summary: RunSummary,
}

/// Run one region end-to-end. Never fails; problems are folded into the status.
///
/// A cancelled batch never touches the output file, so the previous tokens survive.
pub async fn run_region<E: TokenEndpoint>(
    job: &RegionJob,
    dispatcher: &Dispatcher<E>,
) -> RegionRun {
    let started = Instant::now();
    tracing::info!(region = %job.label, input = %job.input.display(), "region started");

    let items = match store::read_work_items(&job.input) {
        Ok(items) if !items.is_empty() => items,
        Ok(_) => {
            tracing::error!(region = %job.label, "account list is empty");
            let error = format!("{} has no accounts", job.input.display());
            return RegionRun::failed(job, started, error);
        }
        Err(e) => {
            tracing::error!(region = %job.label, error = %e, "cannot read account list");
            return RegionRun::failed(job, started, e.to_string());
        }
    };

    let result = dispatcher.run(items, &job.label).await;
    let report = report::summarize(&result, &job.label);
    tracing::info!("\n{}", report);

    if dispatcher.cancel_token().is_cancelled() {
        tracing::warn!(
            region = %job.label,
            output = %job.output.display(),
            "batch cancelled, keeping existing token file"
        );
        return RegionRun {
            report: Some(report),
            ..RegionRun::failed(job, started, "cancelled".into())
        };
    }

    let tokens = result.tokens();
    if tokens.is_empty() {
        tracing::error!(region = %job.label, "no tokens generated");
        return RegionRun {
            report: Some(report),
            ..RegionRun::failed(job, started, "no tokens generated".into())
        };
    }

    if let Err(e) = store::write_tokens(&job.output, &tokens) {
        tracing::error!(region = %job.label, error = %e, "cannot write tokens");
        return RegionRun {
            report: Some(report),
            ..RegionRun::failed(job, started, e.to_string())
        };
    }

    let elapsed = started.elapsed();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        tokens.len() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    tracing::info!(
        region = %job.label,
        output = %job.output.display(),
        tokens = tokens.len(),
        elapsed_secs = %format!("{:.2}", elapsed.as_secs_f64()),
        tokens_per_sec = %format!("{:.1}", rate),
        "tokens written"
    );

    let status = if report.is_clean() {
        RegionStatus::Success
    } else {
        RegionStatus::Partial
    };
    RegionRun {
        label: job.label.clone(),
        status,
        report: Some(report),
        tokens_written: tokens.len(),
        elapsed,
        error: None,
    }
}

/// Run every region under one strategy. Errors when any region did not succeed.
pub async fn run_strategy<E: TokenEndpoint>(
    strategy: RunStrategy,
    jobs: &[RegionJob],
    dispatcher: &Dispatcher<E>,
) -> Result<RunSummary> {
    let started = Instant::now();
    let cancel = dispatcher.cancel_token();
    let mut regions = Vec::with_capacity(jobs.len());

    for (i, job) in jobs.iter().enumerate() {
        if cancel.is_cancelled() {
            regions.push(RegionRun::failed(job, Instant::now(), "cancelled".into()));
            continue;
        }
        tracing::info!(
            strategy = %strategy,
            "processing region {}/{}: {}",
            i + 1,
            jobs.len(),
            job.label
        );
        regions.push(run_region(job, dispatcher).await);

        let pause = strategy.pause();
        if i + 1 < jobs.len() && !pause.is_zero() {
            tracing::info!("waiting {:.1}s before next region", pause.as_secs_f64());
            cancel.sleep(pause).await;
        }
    }

    let summary = RunSummary {
        strategy,
        regions,
        elapsed: started.elapsed(),
    };
    tracing::info!("\n{}", summary);

    if !summary.is_complete() {
        return Err(IncompleteRun { summary }.into());
    }
    Ok(summary)
}

/// Try each strategy in order until one completes every region.
/// Returns the last strategy's error if none does, or stops early on cancellation.
pub async fn run_with_fallback<E: TokenEndpoint>(
    strategies: &[RunStrategy],
    jobs: &[RegionJob],
    dispatcher: &Dispatcher<E>,
) -> Result<RunSummary> {
    let mut last_err = None;
    for strategy in strategies {
        if dispatcher.cancel_token().is_cancelled() {
            break;
        }
        match run_strategy(*strategy, jobs, dispatcher).await {
            Ok(summary) => return Ok(summary),
            Err(e) => {
                tracing::warn!(strategy = %strategy, error = %e, "strategy failed");
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None if dispatcher.cancel_token().is_cancelled() => {
            bail!("cancelled before any region ran")
        }
        None => bail!("no run strategy configured"),
    }
}
