//! Platform data providers.
//!
//! The engine only sees the [`PullRequestSource`] and
//! [`TeamDirectory`](crate::eval::TeamDirectory) traits; [`GitHubClient`]
//! is the REST implementation of both.

pub mod client;
pub mod types;

pub use client::GitHubClient;

use chrono::{DateTime, Utc};

use crate::config::PullRequestSelector;
use crate::error::GateError;
use crate::eval::{PullRequestContext, ReviewEvent};

/// A pull request as returned by a branch listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub number: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Read access to one repository's pull request data.
pub trait PullRequestSource {
    /// File content at `git_ref`, or `None` when the file does not exist.
    fn get_content(&self, path: &str, git_ref: &str) -> Result<Option<String>, GateError>;

    fn get_pull_request(&self, number: u64) -> Result<PullRequestContext, GateError>;

    /// Pull requests in any state whose head is `branch`.
    fn list_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, GateError>;

    /// Changed paths, all pages flattened.
    fn list_changed_files(&self, number: u64) -> Result<Vec<String>, GateError>;

    /// Submitted reviews in ascending submission order, all pages flattened.
    fn list_reviews(&self, number: u64) -> Result<Vec<ReviewEvent>, GateError>;
}

/// Resolve the selector to a pull request number.
///
/// For a branch, the most recently created pull request wins.
pub fn resolve_pull_number<S: PullRequestSource + ?Sized>(
    source: &S,
    selector: &PullRequestSelector,
) -> Result<u64, GateError> {
    match selector {
        PullRequestSelector::Number(n) => Ok(*n),
        PullRequestSelector::Branch(branch) => {
            let prs = source.list_pull_requests_for_branch(branch)?;
            let newest = prs
                .into_iter()
                .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.number.cmp(&b.number)))
                .ok_or_else(|| GateError::not_found(format!("pull request for branch {branch}")))?;
            log::info!("Using PR #{} for branch {branch}", newest.number);
            Ok(newest.number)
        }
    }
}

/// Fetch the first CODEOWNERS file that exists among `paths`.
///
/// Returns the path used and its content.
pub fn fetch_codeowners<S: PullRequestSource + ?Sized>(
    source: &S,
    paths: &[String],
    git_ref: &str,
) -> Result<(String, String), GateError> {
    for path in paths {
        if let Some(content) = source.get_content(path, git_ref)? {
            log::debug!("Using {path} at {git_ref}");
            return Ok((path.clone(), content));
        }
    }
    Err(GateError::NoOwnershipData {
        searched: paths.to_vec(),
    })
}
