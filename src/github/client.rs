//! Blocking GitHub REST client.
//!
//! Read-only: the gate never writes to the platform.

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, header};
use serde::de::DeserializeOwned;

use super::types::{ApiContent, ApiFile, ApiPullRequest, ApiReview, ApiTeam, ApiUser};
use super::{PullRequestSource, PullRequestSummary};
use crate::config::GitHubConfig;
use crate::error::GateError;
use crate::eval::{PullRequestContext, ReviewEvent, Team, TeamDirectory};

const USER_AGENT: &str = concat!("codeowners-gate/", env!("CARGO_PKG_VERSION"));

/// GitHub API client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    per_page: u32,
}

impl GitHubClient {
    /// Create a client authenticated with `token`.
    pub fn new(
        config: &GitHubConfig,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Self, GateError> {
        let mut headers = header::HeaderMap::new();

        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GateError::config("token contains characters not allowed in a header"))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            header::HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GateError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            per_page: config.per_page,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn repo_path(&self, rest: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, rest)
    }

    /// Turn a non-success response into an upstream error.
    fn check(response: Response, endpoint: &str) -> Result<Response, GateError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let body_message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

        let message = match (status, body_message) {
            (StatusCode::UNAUTHORIZED, _) => "Bad credentials".to_string(),
            (StatusCode::FORBIDDEN, Some(msg)) => format!("Access denied: {msg}"),
            (StatusCode::NOT_FOUND, _) => "Resource not found".to_string(),
            (_, Some(msg)) => msg,
            _ => format!("Request failed ({}): {body}", status.as_u16()),
        };
        Err(GateError::upstream_status(message, status.as_u16(), endpoint))
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GateError> {
        let response = self.client.get(self.url(endpoint)).send()?;
        let response = Self::check(response, endpoint)?;
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch every page of a list endpoint, following `Link: rel="next"`.
    fn get_all_pages<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GateError> {
        let mut all = Vec::new();
        let per_page = self.per_page.to_string();
        let mut request = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .query(&[("per_page", per_page.as_str())]);

        loop {
            let response = Self::check(request.send()?, endpoint)?;
            let next = next_page_url(response.headers());
            let body = response.text()?;
            let page: Vec<T> = serde_json::from_str(&body)?;
            all.extend(page);

            match next {
                Some(url) => request = self.client.get(url),
                None => break,
            }
        }

        Ok(all)
    }
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_page_url(headers: &header::HeaderMap) -> Option<String> {
    let link = headers.get(header::LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

impl PullRequestSource for GitHubClient {
    fn get_content(&self, path: &str, git_ref: &str) -> Result<Option<String>, GateError> {
        let endpoint = self.repo_path(&format!("/contents/{}", path.trim_start_matches('/')));
        let response = self
            .client
            .get(self.url(&endpoint))
            .query(&[("ref", git_ref)])
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, &endpoint)?;
        let body = response.text()?;
        let content: ApiContent = serde_json::from_str(&body)?;
        content.decode(path).map(Some)
    }

    fn get_pull_request(&self, number: u64) -> Result<PullRequestContext, GateError> {
        let pr: ApiPullRequest = self.get_json(&self.repo_path(&format!("/pulls/{number}")))?;
        Ok(pr.into())
    }

    fn list_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, GateError> {
        let head = format!("{}:{branch}", self.owner);
        let prs: Vec<ApiPullRequest> = self.get_all_pages(
            &self.repo_path("/pulls"),
            &[("state", "all"), ("head", head.as_str())],
        )?;
        Ok(prs
            .into_iter()
            .map(|pr| PullRequestSummary {
                number: pr.number,
                created_at: pr.created_at,
            })
            .collect())
    }

    fn list_changed_files(&self, number: u64) -> Result<Vec<String>, GateError> {
        let files: Vec<ApiFile> =
            self.get_all_pages(&self.repo_path(&format!("/pulls/{number}/files")), &[])?;
        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    fn list_reviews(&self, number: u64) -> Result<Vec<ReviewEvent>, GateError> {
        let reviews: Vec<ApiReview> =
            self.get_all_pages(&self.repo_path(&format!("/pulls/{number}/reviews")), &[])?;
        let mut events = Vec::with_capacity(reviews.len());
        for review in reviews {
            if let Some(event) = review.into_event()? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

impl TeamDirectory for GitHubClient {
    fn list_org_teams(&self, org: &str) -> Result<Vec<Team>, GateError> {
        let teams: Vec<ApiTeam> = self.get_all_pages(&format!("/orgs/{org}/teams"), &[])?;
        Ok(teams.into_iter().map(Team::from).collect())
    }

    fn list_team_members(&self, org: &str, slug: &str) -> Result<Vec<String>, GateError> {
        let members: Vec<ApiUser> =
            self.get_all_pages(&format!("/orgs/{org}/teams/{slug}/members"), &[])?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }
}
