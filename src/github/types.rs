//! GitHub REST payloads and their validation into engine types.
//!
//! Only the fields the gate reads are declared. Anything the engine relies
//! on is checked here, so a malformed payload surfaces as an upstream error
//! instead of a panic deep in replay.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::GateError;
use crate::eval::{PullRequestContext, ReviewEvent, ReviewState, Team};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommitRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPullRequest {
    pub number: u64,
    pub head: ApiCommitRef,
    pub base: ApiCommitRef,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ApiPullRequest> for PullRequestContext {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            head_sha: pr.head.sha,
            base_ref: pr.base.git_ref,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFile {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiReview {
    pub id: Option<u64>,
    /// Null for deleted accounts.
    pub user: Option<ApiUser>,
    pub state: Option<String>,
    pub commit_id: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ApiReview {
    /// Validate into a [`ReviewEvent`].
    ///
    /// Every review needs a state. An APPROVED or CHANGES_REQUESTED review
    /// also needs a `commit_id`. A review without a user belongs to a deleted
    /// account and is dropped. Other states with a null `user` or
    /// `commit_id` are dropped as well.
    pub fn into_event(self) -> Result<Option<ReviewEvent>, GateError> {
        let id = self
            .id
            .map_or_else(|| "<unknown>".to_string(), |id| id.to_string());
        let state = self
            .state
            .filter(|s| !s.is_empty())
            .map(|s| ReviewState::from_api(&s))
            .ok_or_else(|| GateError::upstream(format!("review {id} has no state")))?;
        let actionable = !matches!(state, ReviewState::Other(_));

        let Some(login) = self.user.map(|u| u.login).filter(|l| !l.is_empty()) else {
            if actionable {
                log::warn!("review {id} ({}) has no user, skipping", state.as_str());
            }
            return Ok(None);
        };
        let commit_sha = match self.commit_id {
            Some(sha) => sha,
            None if actionable => {
                return Err(GateError::upstream(format!("review {id} has no commit_id")));
            }
            None => return Ok(None),
        };

        Ok(Some(ReviewEvent {
            reviewer: login.to_lowercase(),
            state,
            commit_sha,
            submitted_at: self.submitted_at,
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTeam {
    pub slug: String,
    pub name: String,
}

impl From<ApiTeam> for Team {
    fn from(team: ApiTeam) -> Self {
        Self {
            slug: team.slug,
            name: team.name,
        }
    }
}

/// `GET /repos/{owner}/{repo}/contents/{path}` for a file.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiContent {
    pub content: Option<String>,
    pub encoding: Option<String>,
}

impl ApiContent {
    /// Decode the file body. GitHub wraps base64 at 60 columns.
    pub fn decode(self, path: &str) -> Result<String, GateError> {
        use base64::Engine;

        let raw = self.content.ok_or_else(|| {
            GateError::upstream(format!("{path} has no content (is it a directory?)"))
        })?;
        match self.encoding.as_deref() {
            Some("base64") | None => {
                let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
                String::from_utf8(bytes)
                    .map_err(|_| GateError::upstream(format!("{path} is not valid UTF-8")))
            }
            Some(other) => Err(GateError::upstream(format!(
                "{path} uses unsupported encoding {other:?}"
            ))),
        }
    }
}
