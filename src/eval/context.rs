use chrono::{DateTime, Utc};
use serde::Serialize;

/// The pull request under evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub number: u64,
    /// Current head commit. Approvals on other commits can be disregarded.
    pub head_sha: String,
    /// Base branch; the CODEOWNERS file is read from here.
    pub base_ref: String,
}

/// Review state as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    /// COMMENTED, DISMISSED, PENDING, or anything else. Ignored by replay.
    Other(String),
}

impl ReviewState {
    pub fn from_api(state: &str) -> Self {
        match state {
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            other => ReviewState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Other(s) => s,
        }
    }
}

/// A single submitted review, validated at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEvent {
    /// Reviewer login, lowercased.
    pub reviewer: String,
    pub state: ReviewState,
    pub commit_sha: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReviewEvent {
    pub fn new(reviewer: &str, state: ReviewState, commit_sha: impl Into<String>) -> Self {
        Self {
            reviewer: reviewer.to_lowercase(),
            state,
            commit_sha: commit_sha.into(),
            submitted_at: None,
        }
    }
}
