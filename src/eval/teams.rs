//! Team membership resolution for reviewers.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::GateError;
use crate::eval::RequiredOwners;

/// An organization team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    /// URL-safe identifier; this is what CODEOWNERS `@org/<slug>` refers to.
    pub slug: String,
    pub name: String,
}

/// Read access to an organization's teams and their rosters.
pub trait TeamDirectory {
    /// All teams in `org`.
    fn list_org_teams(&self, org: &str) -> Result<Vec<Team>, GateError>;

    /// Logins of every member of `org/slug`.
    fn list_team_members(&self, org: &str, slug: &str) -> Result<Vec<String>, GateError>;
}

/// Answers "which of the candidate teams is this reviewer on?".
pub trait TeamMembership {
    /// Slugs of the candidate teams `login` belongs to. Empty when none.
    fn teams_for(&mut self, login: &str) -> Result<Vec<String>, GateError>;
}

/// Narrow the org's teams to the candidates membership is checked against.
///
/// Without `limit_to_required` every team is kept. Otherwise only teams whose
/// slug is a required owner are kept, and each required owner without a
/// matching team is reported (it may just be an individual login).
pub fn candidate_teams(
    all_teams: Vec<Team>,
    required: &RequiredOwners,
    limit_to_required: bool,
    org: &str,
) -> Vec<Team> {
    if !limit_to_required {
        return all_teams;
    }

    let filtered: Vec<Team> = all_teams
        .into_iter()
        .filter(|t| required.contains(&t.slug.to_lowercase()))
        .collect();

    if filtered.len() != required.len() {
        for owner in required.owners() {
            if !filtered
                .iter()
                .any(|t| t.slug.eq_ignore_ascii_case(owner.as_str()))
            {
                log::warn!("  Team: {owner} not found in Org: {org}");
            }
        }
    }

    filtered
}

/// Membership resolver backed by a [`TeamDirectory`].
///
/// Each team roster is fetched at most once per run and cached, so a
/// reviewer with several reviews costs no extra requests.
pub struct MembershipResolver<'a, D: TeamDirectory + ?Sized> {
    directory: &'a D,
    org: String,
    candidates: Vec<Team>,
    rosters: HashMap<String, HashSet<String>>,
}

impl<'a, D: TeamDirectory + ?Sized> MembershipResolver<'a, D> {
    pub fn new(directory: &'a D, org: impl Into<String>, candidates: Vec<Team>) -> Self {
        for team in &candidates {
            log::debug!("  candidate team {} ({})", team.slug, team.name);
        }
        Self {
            directory,
            org: org.into(),
            candidates,
            rosters: HashMap::new(),
        }
    }

    fn roster(&mut self, slug: &str) -> Result<&HashSet<String>, GateError> {
        if !self.rosters.contains_key(slug) {
            let members = self.directory.list_team_members(&self.org, slug)?;
            log::debug!("  fetched {} member(s) of {}/{slug}", members.len(), self.org);
            let members = members.into_iter().map(|m| m.to_lowercase()).collect();
            self.rosters.insert(slug.to_string(), members);
        }
        self.rosters
            .get(slug)
            .ok_or_else(|| GateError::upstream(format!("team roster for {slug} unavailable")))
    }
}

impl<D: TeamDirectory + ?Sized> TeamMembership for MembershipResolver<'_, D> {
    fn teams_for(&mut self, login: &str) -> Result<Vec<String>, GateError> {
        let login = login.to_lowercase();
        let slugs: Vec<String> = self.candidates.iter().map(|t| t.slug.clone()).collect();
        let mut teams = Vec::new();
        for slug in slugs {
            if self.roster(&slug)?.contains(&login) {
                teams.push(slug.to_lowercase());
            }
        }
        Ok(teams)
    }
}
