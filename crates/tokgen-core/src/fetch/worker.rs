//! Per-item fetch worker: pacing, request, classification, backoff.

use std::sync::Arc;
use std::time::Duration;

use crate::batch::{Outcome, WorkItem};
use crate::control::CancelToken;
use crate::retry::{classify, BackoffPolicy, ErrorKind, FetchError};

use super::endpoint::{usable_token, TokenEndpoint};

/// Worker-local attempt bookkeeping for one item. Never shared.
#[derive(Debug)]
pub struct AttemptState {
    pub item: WorkItem,
    /// 0-based index of the current attempt.
    pub attempt: u32,
    pub max_attempts: u32,
}

impl AttemptState {
    pub fn new(item: WorkItem, max_attempts: u32) -> Self {
        Self {
            item,
            attempt: 0,
            max_attempts,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    pub fn advance(&mut self) {
        self.attempt += 1;
    }
}

/// Runs one work item end-to-end and always produces an `Outcome`.
pub struct FetchWorker<E> {
    endpoint: Arc<E>,
    policy: BackoffPolicy,
    request_timeout: Duration,
    cancel: CancelToken,
}

impl<E> Clone for FetchWorker<E> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            policy: self.policy,
            request_timeout: self.request_timeout,
            cancel: self.cancel.clone(),
        }
    }
}

impl<E: TokenEndpoint> FetchWorker<E> {
    pub fn new(endpoint: Arc<E>, policy: BackoffPolicy, request_timeout: Duration) -> Self {
        Self {
            endpoint,
            policy,
            request_timeout,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a cancel token; sleeps and in-flight requests abort when it fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub async fn process(&self, item: WorkItem) -> Outcome {
        let mut state = AttemptState::new(item, self.policy.max_attempts);

        while !state.exhausted() {
            if !self.cancel.sleep(self.policy.pacing()).await {
                return cancelled(state);
            }

            tracing::debug!(
                id = %state.item.id,
                attempt = state.attempt + 1,
                max = state.max_attempts,
                "attempt start"
            );
            let result = tokio::select! {
                r = self.endpoint.issue(&state.item, self.request_timeout) => Some(r),
                _ = self.cancel.cancelled() => None,
            };
            let Some(result) = result else {
                return cancelled(state);
            };

            let err = match result {
                Ok(resp) => match usable_token(resp) {
                    Some(token) => {
                        tracing::debug!(
                            id = %state.item.id,
                            attempt = state.attempt + 1,
                            "token issued"
                        );
                        return Outcome::success(state.item.id, token);
                    }
                    None => FetchError::EmptyToken,
                },
                Err(e) => e,
            };

            let kind = classify(&err);
            let decision = self.policy.decide(kind, state.attempt);
            if !decision.should_retry {
                tracing::warn!(
                    id = %state.item.id,
                    attempts = state.attempt + 1,
                    kind = %kind,
                    error = %err,
                    "giving up"
                );
                return Outcome::failure(state.item.id, kind, Some(err.to_string()));
            }

            tracing::info!(
                id = %state.item.id,
                attempt = state.attempt + 1,
                kind = %kind,
                wait_ms = decision.wait.as_millis() as u64,
                "retrying"
            );
            if !self.cancel.sleep(decision.wait).await {
                return cancelled(state);
            }
            state.advance();
        }

        tracing::warn!(id = %state.item.id, "attempt budget exhausted");
        Outcome::failure(state.item.id, ErrorKind::MaxRetriesExceeded, None)
    }
}

fn cancelled(state: AttemptState) -> Outcome {
    tracing::debug!(id = %state.item.id, attempt = state.attempt + 1, "cancelled");
    let detail = format!("cancelled during attempt {}", state.attempt + 1);
    Outcome::failure(state.item.id, ErrorKind::Cancelled, Some(detail))
}
