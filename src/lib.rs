//! codeowners-gate: a pull request approval gate driven by CODEOWNERS.
//!
//! The gate reads the CODEOWNERS file from the pull request's base branch,
//! works out which users and teams own the changed files, replays the
//! submitted reviews in order, and decides whether the required owners (all
//! of them, or any one) have approved and enough distinct people approved.
//! The result is a [`eval::GateDecision`]: a boolean plus a reason.
//!
//! # Architecture
//!
//! - **[`parse`]** — CODEOWNERS parsing: owner normalization, glob compilation, rule types.
//! - **[`eval`]** — Engine: required owners, team membership, review replay, policy.
//! - **[`github`]** — Data providers: the source traits and the blocking REST client.
//! - **[`config`]** — Configuration: embedded defaults, overlay merge, action inputs.
//! - **[`logging`]** — Terminal logger setup and the decision line.
//! - **[`output`]** — The `approved=<bool>` result sink.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error type shared across the crate.
pub mod error;
/// Evaluation engine: requirements, membership, replay, policy.
pub mod eval;
/// GitHub data providers.
pub mod github;
/// Logger initialization and decision logging.
pub mod logging;
/// Result sink for the workflow step.
pub mod output;
/// CODEOWNERS parsing: rules, patterns, owner identifiers.
pub mod parse;

use config::{Config, PullRequestSelector};
use error::GateError;
use eval::{ApprovalGate, GateDecision, MembershipResolver, TeamDirectory};
use github::PullRequestSource;

/// Evaluate the gate for one pull request.
///
/// This is the whole pipeline: identify the pull request, load CODEOWNERS
/// from its base branch, compute required owners from the changed files,
/// replay reviews with team lookups, and apply the policy. Any provider
/// error aborts before a decision is made.
pub fn run<S, D>(
    config: &Config,
    selector: &PullRequestSelector,
    source: &S,
    directory: &D,
) -> Result<GateDecision, GateError>
where
    S: PullRequestSource + ?Sized,
    D: TeamDirectory + ?Sized,
{
    let number = github::resolve_pull_number(source, selector)?;
    let pr = source.get_pull_request(number)?;

    let (path, content) = github::fetch_codeowners(source, &config.codeowners.paths, &pr.base_ref)?;
    let gate = ApprovalGate::from_codeowners(&content, &config.settings);
    log::debug!("{} rule(s) parsed from {path}", gate.rules().len());

    let changed_files = source.list_changed_files(pr.number)?;
    let requirements = gate.requirements(&changed_files);
    let owners: Vec<&str> = requirements.required.owners().map(|o| o.as_str()).collect();
    log::info!("Required codeowners: {}", owners.join(", "));

    let reviews = source.list_reviews(pr.number)?;

    let org = config.settings.org_name.as_str();
    let all_teams = directory.list_org_teams(org)?;
    let candidates = eval::candidate_teams(
        all_teams,
        &requirements.required,
        config.settings.limit_org_teams_to_codeowners_file,
        org,
    );
    let mut membership = MembershipResolver::new(directory, org, candidates);

    gate.decide(requirements.required, &reviews, &mut membership, &pr.head_sha)
}
