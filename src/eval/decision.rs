use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::eval::requirements::RequiredOwners;

/// How many required owners must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalMode {
    /// Every required owner.
    #[default]
    All,
    /// At least one required owner.
    Any,
}

impl ApprovalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalMode::All => "ALL",
            ApprovalMode::Any => "ANY",
        }
    }
}

impl fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(ApprovalMode::All),
            "ANY" => Ok(ApprovalMode::Any),
            other => Err(format!("approval mode must be ALL or ANY, got {other:?}")),
        }
    }
}

/// Policy knobs applied to the replayed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub mode: ApprovalMode,
    pub min_approvals: usize,
}

/// The gate's verdict, with each sub-check kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub approved: bool,
    pub mode: ApprovalMode,
    pub all_satisfied: bool,
    pub any_satisfied: bool,
    /// `all_satisfied` or `any_satisfied`, depending on `mode`.
    ///
    /// An empty table passes in both modes. In ANY mode this differs from
    /// `any_satisfied`, which stays false for an empty table: when the
    /// changed files have no codeowners there is nobody to wait for.
    pub owner_check: bool,
    /// Distinct approvers counted.
    pub approvals: usize,
    pub min_approvals: usize,
    pub count_check: bool,
    pub reason: String,
}

/// Combine the owner check and the distinct-approver count.
pub fn evaluate_policy(
    required: &RequiredOwners,
    approvers: &BTreeSet<String>,
    policy: Policy,
) -> GateDecision {
    let all_satisfied = required.all_satisfied();
    let any_satisfied = required.any_satisfied();
    // Nothing required means nothing to wait for, in either mode.
    let owner_check = match policy.mode {
        ApprovalMode::All => all_satisfied,
        ApprovalMode::Any => any_satisfied || required.is_empty(),
    };

    let approvals = approvers.len();
    let count_check = approvals >= policy.min_approvals;

    let owner_reason = match (policy.mode, owner_check) {
        (ApprovalMode::All, true) => "All codeowners have approved.",
        (ApprovalMode::All, false) => "Not all codeowners have approved.",
        (ApprovalMode::Any, true) if required.is_empty() => "No codeowners are required.",
        (ApprovalMode::Any, true) => "At least one of the codeowners has approved.",
        (ApprovalMode::Any, false) => "None of the codeowners has approved.",
    };
    let cmp = if count_check { ">=" } else { "<" };
    let reason = format!(
        "{owner_reason} and total approvals:{approvals} {cmp} minimum approvals:{}",
        policy.min_approvals
    );

    GateDecision {
        approved: owner_check && count_check,
        mode: policy.mode,
        all_satisfied,
        any_satisfied,
        owner_check,
        approvals,
        min_approvals: policy.min_approvals,
        count_check,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::requirements::Approval;
    use crate::parse::normalize_owner;

    fn table(states: &[(&str, bool)]) -> RequiredOwners {
        let mut t =
            RequiredOwners::unsatisfied(states.iter().filter_map(|(o, _)| normalize_owner(o)));
        for (owner, ok) in states {
            if *ok {
                t.set(owner, Approval::Satisfied);
            }
        }
        t
    }

    fn approvers(logins: &[&str]) -> BTreeSet<String> {
        logins.iter().map(|s| s.to_string()).collect()
    }

    fn policy(mode: ApprovalMode, min_approvals: usize) -> Policy {
        Policy {
            mode,
            min_approvals,
        }
    }

    #[test]
    fn all_mode_requires_every_owner() {
        let d = evaluate_policy(
            &table(&[("alice", true), ("bob", false)]),
            &approvers(&["alice"]),
            policy(ApprovalMode::All, 1),
        );
        assert!(!d.approved);
        assert!(!d.owner_check);
        assert!(d.count_check);
        assert_eq!(
            d.reason,
            "Not all codeowners have approved. and total approvals:1 >= minimum approvals:1"
        );
    }

    #[test]
    fn any_mode_needs_one_owner() {
        let d = evaluate_policy(
            &table(&[("alice", true), ("bob", false)]),
            &approvers(&["alice"]),
            policy(ApprovalMode::Any, 1),
        );
        assert!(d.approved);
        assert!(d.any_satisfied);
        assert!(!d.all_satisfied);
    }

    #[test]
    fn count_check_can_fail_alone() {
        let d = evaluate_policy(
            &table(&[("alice", true)]),
            &approvers(&["alice"]),
            policy(ApprovalMode::All, 2),
        );
        assert!(d.owner_check);
        assert!(!d.count_check);
        assert!(!d.approved);
        assert_eq!((d.approvals, d.min_approvals), (1, 2));
        assert!(d.reason.ends_with("total approvals:1 < minimum approvals:2"));
    }

    #[test]
    fn empty_table_is_vacuous() {
        let empty = RequiredOwners::default();
        let all = evaluate_policy(&empty, &approvers(&[]), policy(ApprovalMode::All, 0));
        assert!(all.approved);
        let any = evaluate_policy(&empty, &approvers(&[]), policy(ApprovalMode::Any, 0));
        assert!(!any.any_satisfied);
        assert!(any.owner_check);
        assert!(any.approved);
        assert!(any.reason.starts_with("No codeowners are required."));
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("any".parse::<ApprovalMode>(), Ok(ApprovalMode::Any));
        assert_eq!(" ALL ".parse::<ApprovalMode>(), Ok(ApprovalMode::All));
        assert!("MOST".parse::<ApprovalMode>().is_err());
    }
}
