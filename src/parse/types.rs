//! Types produced by the CODEOWNERS parser and consumed by the eval layer.

use std::collections::BTreeSet;
use std::fmt;

use globset::GlobSet;
use serde::Serialize;

/// A normalized owner identifier: an individual login or a team slug.
///
/// Always lowercase, never empty. Two raw tokens that normalize to the same
/// string name the same entity. See [`crate::parse::owner::normalize_owner`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap an already-normalized identifier.
    pub(crate) fn from_normalized(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for OwnerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which paths a rule applies to.
#[derive(Debug, Clone)]
pub enum RulePattern {
    /// The literal `*` line: matches every changed file.
    Global,
    /// A path glob, compiled.
    ///
    /// `source` is the pattern as written in the file; `globs` are the
    /// rooted expansions actually handed to `globset`.
    Path {
        source: String,
        globs: Vec<String>,
        set: GlobSet,
    },
}

impl RulePattern {
    /// Whether this pattern covers `path` (relative, `/`-separated).
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RulePattern::Global => true,
            RulePattern::Path { set, .. } => set.is_match(path.trim_start_matches('/')),
        }
    }

    /// The pattern text as it appeared in the CODEOWNERS file.
    pub fn as_str(&self) -> &str {
        match self {
            RulePattern::Global => "*",
            RulePattern::Path { source, .. } => source,
        }
    }
}

impl PartialEq for RulePattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RulePattern::Global, RulePattern::Global) => true,
            (
                RulePattern::Path { source: a, globs: ga, .. },
                RulePattern::Path { source: b, globs: gb, .. },
            ) => a == b && ga == gb,
            _ => false,
        }
    }
}

impl Eq for RulePattern {}

/// One line of a CODEOWNERS file: a path pattern and the owners it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRule {
    pub pattern: RulePattern,
    /// Normalized owners. May be empty, in which case the rule is a no-op.
    pub owners: BTreeSet<OwnerId>,
    /// 1-based line number in the source file.
    pub line: usize,
}
