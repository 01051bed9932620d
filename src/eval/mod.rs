pub mod context;
pub mod decision;
pub mod replay;
pub mod requirements;
pub mod teams;

pub use context::{PullRequestContext, ReviewEvent, ReviewState};
pub use decision::{ApprovalMode, GateDecision, Policy, evaluate_policy};
pub use replay::{ReplayOptions, ReplayOutcome, replay};
pub use requirements::{Approval, RequiredOwners, Requirements, resolve_requirements};
pub use teams::{MembershipResolver, Team, TeamDirectory, TeamMembership, candidate_teams};

use crate::config::Settings;
use crate::error::GateError;
use crate::parse::{self, OwnershipRule};

/// Parsed CODEOWNERS rules plus the policy they are enforced with.
pub struct ApprovalGate {
    rules: Vec<OwnershipRule>,
    policy: Policy,
    require_latest_commit: bool,
}

impl ApprovalGate {
    /// Build the gate from CODEOWNERS text and settings.
    pub fn from_codeowners(content: &str, settings: &Settings) -> Self {
        Self {
            rules: parse::parse_codeowners(content),
            policy: Policy {
                mode: settings.approval_mode,
                min_approvals: settings.min_approvals,
            },
            require_latest_commit: settings.require_all_approvals_latest_commit,
        }
    }

    pub fn rules(&self) -> &[OwnershipRule] {
        &self.rules
    }

    /// Required owners for the given changed files, all unsatisfied.
    pub fn requirements<S: AsRef<str>>(&self, changed_files: &[S]) -> Requirements {
        let req = resolve_requirements(&self.rules, changed_files);
        for file in &req.unmatched_files {
            log::debug!("  no CODEOWNERS rule matches {file}");
        }
        req
    }

    /// Replay reviews over `required` and apply the policy.
    pub fn decide<M: TeamMembership + ?Sized>(
        &self,
        required: RequiredOwners,
        reviews: &[ReviewEvent],
        membership: &mut M,
        head_sha: &str,
    ) -> Result<GateDecision, GateError> {
        let opts = ReplayOptions {
            head_sha: head_sha.to_string(),
            require_latest_commit: self.require_latest_commit,
        };
        log::info!("Found {} review(s):", reviews.len());
        for review in reviews {
            let when = review
                .submitted_at
                .map_or_else(|| "unknown time".to_string(), |t| t.to_rfc3339());
            log::debug!(
                "  review by {} {} on {} at {when}",
                review.reviewer,
                review.state.as_str(),
                review.commit_sha
            );
        }
        let outcome = replay(required, reviews, membership, &opts)?;

        for (owner, state) in outcome.required.iter() {
            log::debug!("  {owner}: {}", if state.is_satisfied() { "approved" } else { "pending" });
        }
        log::info!(
            "{} of {} required codeowner(s) satisfied",
            outcome.required.satisfied_count(),
            outcome.required.len()
        );

        Ok(evaluate_policy(
            &outcome.required,
            &outcome.approvers,
            self.policy,
        ))
    }
}
