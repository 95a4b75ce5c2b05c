//! `tokgen run` – generate tokens for every configured region.

use anyhow::Result;
use tokgen_core::config::TokgenConfig;
use tokgen_core::regions::{self, IncompleteRun, RunStrategy, RunSummary};

use super::engine::Engine;

pub async fn run_regions(
    cfg: &TokgenConfig,
    concurrency: Option<usize>,
    sequential: bool,
) -> Result<()> {
    let jobs = cfg.region_jobs();
    if jobs.is_empty() {
        println!("No regions configured.");
        return Ok(());
    }

    let strategies = if sequential {
        vec![RunStrategy::Sequential]
    } else {
        RunStrategy::default_chain(cfg.region_pause())
    };

    let engine = Engine::build(cfg, concurrency)?;
    println!(
        "Generating tokens for {} region(s), {} concurrent request(s) per region",
        jobs.len(),
        engine.dispatcher.concurrency()
    );
    let outcome = regions::run_with_fallback(&strategies, &jobs, &engine.dispatcher).await;
    engine.finish().await;

    match outcome {
        Ok(summary) => {
            print_summary(&summary);
            let minutes = summary.elapsed.as_secs_f64() / 60.0;
            println!("\nAll regions completed in {:.1} minutes!", minutes);
            Ok(())
        }
        Err(err) => {
            if let Some(incomplete) = err.downcast_ref::<IncompleteRun>() {
                print_summary(&incomplete.summary);
            }
            Err(err)
        }
    }
}

fn print_summary(summary: &RunSummary) {
    for region in &summary.regions {
        println!();
        match (&region.report, &region.error) {
            (Some(report), _) => println!("{}", report),
            (None, Some(error)) => println!("{}: {}", region.label, error),
            (None, None) => {}
        }
        if region.tokens_written > 0 {
            println!(
                "{}: {} tokens written in {:.2}s",
                region.label,
                region.tokens_written,
                region.elapsed.as_secs_f64()
            );
        }
    }
    println!("\n{}", summary);
}
