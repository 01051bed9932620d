//! Chronological replay of review events over the satisfaction table.

use std::collections::BTreeSet;

use crate::error::GateError;
use crate::eval::context::{ReviewEvent, ReviewState};
use crate::eval::requirements::{Approval, RequiredOwners};
use crate::eval::teams::TeamMembership;

/// Commit gating for approvals.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub head_sha: String,
    /// Only count approvals submitted against `head_sha`.
    pub require_latest_commit: bool,
}

/// Final table after replay, plus who approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub required: RequiredOwners,
    /// Distinct logins whose approval satisfied at least one required owner.
    pub approvers: BTreeSet<String>,
}

/// Apply `events` in the order given.
///
/// An approval satisfies every required key the reviewer maps to (their
/// login and any required team they are on); a change request unsatisfies
/// the same keys. The last applicable event per key wins, so callers must
/// pass events in submission order.
pub fn replay<M: TeamMembership + ?Sized>(
    mut required: RequiredOwners,
    events: &[ReviewEvent],
    membership: &mut M,
    opts: &ReplayOptions,
) -> Result<ReplayOutcome, GateError> {
    let mut approvers = BTreeSet::new();

    for event in events {
        let login = event.reviewer.as_str();
        if let ReviewState::Other(state) = &event.state {
            log::debug!("  {login} {state}: ignoring");
            continue;
        }

        let keys = owner_keys(&required, login, membership)?;

        match &event.state {
            ReviewState::Approved => {
                for key in &keys {
                    if opts.require_latest_commit && event.commit_sha != opts.head_sha {
                        log::info!(
                            "  {login} APPROVED: at commit: {} for: {key} (not the latest commit, ignoring)",
                            event.commit_sha
                        );
                        continue;
                    }
                    required.set(key, Approval::Satisfied);
                    approvers.insert(login.to_string());
                    log::info!("  {login} APPROVED: at commit: {} for: {key}", event.commit_sha);
                }
            }
            ReviewState::ChangesRequested => {
                for key in &keys {
                    required.set(key, Approval::Unsatisfied);
                    log::info!("  {login} CHANGES_REQUESTED: for: {key}");
                }
            }
            ReviewState::Other(_) => {}
        }
    }

    Ok(ReplayOutcome {
        required,
        approvers,
    })
}

/// Required keys a reviewer speaks for: required teams they are on, then
/// their own login if it is required.
fn owner_keys<M: TeamMembership + ?Sized>(
    required: &RequiredOwners,
    login: &str,
    membership: &mut M,
) -> Result<Vec<String>, GateError> {
    let mut keys: Vec<String> = membership
        .teams_for(login)?
        .into_iter()
        .filter(|slug| required.contains(slug))
        .collect();
    if required.contains(login) && !keys.iter().any(|k| k == login) {
        keys.push(login.to_string());
    }
    Ok(keys)
}
