//! Scripted in-memory endpoint for worker and dispatcher tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::endpoint::{TokenEndpoint, TokenResponse};
use crate::batch::WorkItem;
use crate::retry::FetchError;

pub(crate) type Reply = Result<TokenResponse, FetchError>;

pub(crate) fn ok(token: &str) -> Reply {
    Ok(TokenResponse {
        token: Some(token.to_string()),
    })
}

pub(crate) fn empty() -> Reply {
    Ok(TokenResponse {
        token: Some("N/A".to_string()),
    })
}

fn clone_reply(r: &Reply) -> Reply {
    match r {
        Ok(resp) => Ok(resp.clone()),
        Err(FetchError::Http(c)) => Err(FetchError::Http(*c)),
        Err(FetchError::Transport { failure, message }) => Err(FetchError::Transport {
            failure: *failure,
            message: message.clone(),
        }),
        Err(FetchError::EmptyToken) => Err(FetchError::EmptyToken),
        Err(other) => Err(FetchError::Other(other.to_string())),
    }
}

/// Replies from a queue shared by all items (falls back to `fallback` once
/// the queue is empty), or from per-id scripts. Tracks calls and peak
/// concurrency; each call holds its slot for `latency`.
pub(crate) struct ScriptedEndpoint {
    shared: Mutex<VecDeque<Reply>>,
    per_id: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Option<Reply>,
    latency: Duration,
    calls: AtomicU32,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    panic_on: Option<String>,
}

impl ScriptedEndpoint {
    pub(crate) fn new(script: Vec<Reply>) -> Self {
        Self {
            shared: Mutex::new(script.into()),
            per_id: Mutex::new(HashMap::new()),
            fallback: None,
            latency: Duration::ZERO,
            calls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            panic_on: None,
        }
    }

    pub(crate) fn repeating(reply: Reply) -> Self {
        let mut ep = Self::new(Vec::new());
        ep.fallback = Some(reply);
        ep
    }

    pub(crate) fn with_script(self, id: &str, script: Vec<Reply>) -> Self {
        self.per_id
            .lock()
            .unwrap()
            .insert(id.to_string(), script.into());
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn panicking_on(mut self, id: &str) -> Self {
        self.panic_on = Some(id.to_string());
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, id: &str) -> Reply {
        if let Some(script) = self.per_id.lock().unwrap().get_mut(id) {
            if let Some(r) = script.pop_front() {
                return r;
            }
        }
        if let Some(r) = self.shared.lock().unwrap().pop_front() {
            return r;
        }
        match &self.fallback {
            Some(r) => clone_reply(r),
            None => Err(FetchError::Other("script exhausted".into())),
        }
    }
}

impl TokenEndpoint for ScriptedEndpoint {
    async fn issue(
        &self,
        item: &WorkItem,
        _timeout: Duration,
    ) -> Result<TokenResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.as_deref() == Some(item.id.as_str()) {
            panic!("scripted panic for {}", item.id);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_reply(&item.id)
    }
}
