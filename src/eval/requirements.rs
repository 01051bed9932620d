//! Required owners for a pull request and their satisfaction state.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::parse::{OwnerId, OwnershipRule};

/// Whether a required owner's approval currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    Unsatisfied,
    Satisfied,
}

impl Approval {
    pub fn is_satisfied(self) -> bool {
        self == Approval::Satisfied
    }
}

/// The satisfaction table: required owner → [`Approval`].
///
/// The key set is fixed when the table is built from the changed files.
/// Replay can only flip values of existing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RequiredOwners {
    states: BTreeMap<OwnerId, Approval>,
}

impl RequiredOwners {
    /// Build a table with every owner unsatisfied.
    pub fn unsatisfied<I: IntoIterator<Item = OwnerId>>(owners: I) -> Self {
        Self {
            states: owners
                .into_iter()
                .map(|o| (o, Approval::Unsatisfied))
                .collect(),
        }
    }

    pub fn contains(&self, owner: &str) -> bool {
        self.states.contains_key(owner)
    }

    pub fn get(&self, owner: &str) -> Option<Approval> {
        self.states.get(owner).copied()
    }

    /// Set the state of an existing key. Unknown keys are left alone and
    /// `false` is returned.
    pub(crate) fn set(&mut self, owner: &str, state: Approval) -> bool {
        match self.states.get_mut(owner) {
            Some(slot) => {
                *slot = state;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn owners(&self) -> impl Iterator<Item = &OwnerId> {
        self.states.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OwnerId, Approval)> {
        self.states.iter().map(|(k, v)| (k, *v))
    }

    /// Every owner satisfied. True for an empty table.
    pub fn all_satisfied(&self) -> bool {
        self.states.values().all(|s| s.is_satisfied())
    }

    /// At least one owner satisfied. False for an empty table.
    pub fn any_satisfied(&self) -> bool {
        self.states.values().any(|s| s.is_satisfied())
    }

    pub fn satisfied_count(&self) -> usize {
        self.states.values().filter(|s| s.is_satisfied()).count()
    }
}

/// Result of matching changed files against the rules.
#[derive(Debug, Clone)]
pub struct Requirements {
    pub required: RequiredOwners,
    /// Changed files no rule matched. They add no requirement.
    pub unmatched_files: Vec<String>,
}

/// Compute the required owners for a set of changed files.
///
/// Every rule matching any changed file contributes all of its owners; the
/// global `*` rule matches every file. There is no early exit and no rule
/// overrides another. With no changed files nothing is required, not even
/// the global owners.
pub fn resolve_requirements<S: AsRef<str>>(
    rules: &[OwnershipRule],
    changed_files: &[S],
) -> Requirements {
    let mut owners = BTreeSet::new();
    let mut unmatched_files = Vec::new();

    for file in changed_files {
        let file = file.as_ref();
        let mut matched = false;
        for rule in rules {
            if rule.pattern.matches(file) {
                log::debug!(
                    "  {file} matches line {} ({})",
                    rule.line,
                    rule.pattern.as_str()
                );
                matched = true;
                owners.extend(rule.owners.iter().cloned());
            }
        }
        if !matched {
            unmatched_files.push(file.to_string());
        }
    }

    Requirements {
        required: RequiredOwners::unsatisfied(owners),
        unmatched_files,
    }
}
