//! Shared setup for commands that hit the endpoint: dispatcher, progress
//! printer, and Ctrl-C cancellation.

use anyhow::Result;
use std::sync::Arc;
use tokgen_core::config::TokgenConfig;
use tokgen_core::control::CancelToken;
use tokgen_core::fetch::{CurlEndpoint, FetchWorker};
use tokgen_core::scheduler::{Dispatcher, ProgressStats};

pub(super) struct Engine {
    pub dispatcher: Dispatcher<CurlEndpoint>,
    progress_handle: tokio::task::JoinHandle<()>,
    signal_handle: tokio::task::JoinHandle<()>,
}

impl Engine {
    pub fn build(cfg: &TokgenConfig, concurrency: Option<usize>) -> Result<Self> {
        let retry = cfg.retry();
        let endpoint = Arc::new(CurlEndpoint::new(&cfg.endpoint_url)?);
        let cancel = CancelToken::new();
        let worker = FetchWorker::new(endpoint, retry.policy(), retry.request_timeout())
            .with_cancel(cancel.clone());

        let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
        let progress_handle = tokio::spawn(async move {
            while let Some(stats) = progress_rx.recv().await {
                println!("PROGRESS: {}", stats);
            }
        });

        let signal_handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, stopping after in-flight requests");
                tracing::warn!("cancel requested by user");
                cancel.cancel();
            }
        });

        let dispatcher = Dispatcher::new(worker, concurrency.unwrap_or(cfg.concurrency))
            .with_progress_every(cfg.progress_every)
            .with_progress_channel(progress_tx);

        Ok(Self {
            dispatcher,
            progress_handle,
            signal_handle,
        })
    }

    /// Drop the dispatcher (closing the progress channel) and wait for the printer.
    pub async fn finish(self) {
        self.signal_handle.abort();
        drop(self.dispatcher);
        let _ = self.progress_handle.await;
    }
}
