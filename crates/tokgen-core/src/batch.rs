//! Work items and per-item outcomes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::retry::ErrorKind;

/// Maximum length (in chars) of a failure detail string.
pub const MAX_DETAIL_CHARS: usize = 100;

/// One credential pair to exchange for a token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "uid", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

// Account lists in the wild carry uids both as strings and as bare numbers.
fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// Persisted output row: only the token is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    pub id: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub id: String,
    pub reason: ErrorKind,
    /// Human-readable cause, at most `MAX_DETAIL_CHARS` chars.
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(id: impl Into<String>, reason: ErrorKind, detail: Option<String>) -> Self {
        Self {
            id: id.into(),
            reason,
            detail: detail.map(|d| truncate_detail(&d)),
        }
    }
}

/// Result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Success),
    Failure(Failure),
}

impl Outcome {
    pub fn success(id: impl Into<String>, token: impl Into<String>) -> Self {
        Outcome::Success(Success {
            id: id.into(),
            token: token.into(),
        })
    }

    pub fn failure(id: impl Into<String>, reason: ErrorKind, detail: Option<String>) -> Self {
        Outcome::Failure(Failure::new(id, reason, detail))
    }

    pub fn id(&self) -> &str {
        match self {
            Outcome::Success(s) => &s.id,
            Outcome::Failure(f) => &f.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// All outcomes of one batch, partitioned in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub successes: Vec<Success>,
    pub failures: Vec<Failure>,
    pub total_submitted: usize,
}

impl BatchResult {
    pub fn new(total_submitted: usize) -> Self {
        Self {
            successes: Vec::with_capacity(total_submitted),
            failures: Vec::new(),
            total_submitted,
        }
    }

    /// Append one outcome. Called only by the single collecting consumer.
    pub fn push(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success(s) => self.successes.push(s),
            Outcome::Failure(f) => self.failures.push(f),
        }
    }

    pub fn completed(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.total_submitted
    }

    /// Success set in the persisted output shape.
    pub fn tokens(&self) -> Vec<TokenRecord> {
        self.successes
            .iter()
            .map(|s| TokenRecord {
                token: s.token.clone(),
            })
            .collect()
    }
}

/// Cap a detail string at `MAX_DETAIL_CHARS` characters (never splits a char).
pub fn truncate_detail(s: &str) -> String {
    match s.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
