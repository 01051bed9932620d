use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::eval::ApprovalMode;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Overlay file looked up in the workspace when `CODEOWNERS_GATE_CONFIG` is unset.
const WORKSPACE_OVERLAY: &str = ".github/codeowners-gate.toml";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub codeowners: CodeownersConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub approval_mode: ApprovalMode,
    #[serde(default)]
    pub min_approvals: usize,
    #[serde(default)]
    pub require_all_approvals_latest_commit: bool,
    #[serde(default)]
    pub limit_org_teams_to_codeowners_file: bool,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodeownersConfig {
    /// Candidate CODEOWNERS locations, first found wins.
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GitHubConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub timeout_secs: u64,
    #[serde(default)]
    pub per_page: u32,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    codeowners: CodeownersOverlay,
    #[serde(default)]
    github: GitHubOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    approval_mode: Option<ApprovalMode>,
    min_approvals: Option<usize>,
    require_all_approvals_latest_commit: Option<bool>,
    limit_org_teams_to_codeowners_file: Option<bool>,
    org_name: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CodeownersOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    remove_paths: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GitHubOverlay {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    per_page: Option<u32>,
}

// ── Action inputs ──

/// Values supplied by the Actions runner through the environment.
///
/// Empty strings count as unset, matching how the runner passes omitted
/// `with:` inputs.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub token: Option<String>,
    pub org_read_token: Option<String>,
    pub org_name: Option<String>,
    pub min_approvals: Option<String>,
    pub require_all_approvals_latest_commit: Option<String>,
    pub approval_mode: Option<String>,
    pub limit_org_teams_to_codeowners_file: Option<String>,
    pub pr_number: Option<String>,
    pub branch: Option<String>,
    /// `GITHUB_REF`, e.g. `refs/pull/42/merge`.
    pub github_ref: Option<String>,
    /// `GITHUB_REPOSITORY`, `owner/name`.
    pub repository: Option<String>,
    /// `GITHUB_OUTPUT` file path.
    pub output_path: Option<String>,
    pub api_url: Option<String>,
    pub workspace: Option<String>,
    pub config_path: Option<String>,
    pub runner_debug: bool,
}

impl Inputs {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build inputs from an arbitrary variable lookup.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            token: get("INPUT_TOKEN"),
            org_read_token: get("INPUT_READ_ORG_SCOPED_TOKEN"),
            org_name: get("INPUT_ORG_NAME"),
            min_approvals: get("INPUT_MIN_APPROVALS"),
            require_all_approvals_latest_commit: get("INPUT_REQUIRE_ALL_APPROVALS_LATEST_COMMIT"),
            approval_mode: get("INPUT_APPROVAL_MODE"),
            limit_org_teams_to_codeowners_file: get("INPUT_LIMIT_ORG_TEAMS_TO_CODEOWNERS_FILE"),
            pr_number: get("INPUT_PR_NUMBER"),
            branch: get("INPUT_BRANCH"),
            github_ref: get("GITHUB_REF"),
            repository: get("GITHUB_REPOSITORY"),
            output_path: get("GITHUB_OUTPUT"),
            api_url: get("GITHUB_API_URL"),
            workspace: get("GITHUB_WORKSPACE"),
            config_path: get("CODEOWNERS_GATE_CONFIG"),
            runner_debug: get("RUNNER_DEBUG").is_some_and(|v| v == "1"),
        }
    }

    /// Token for pull request reads.
    pub fn token(&self) -> Result<&str, GateError> {
        self.token
            .as_deref()
            .ok_or_else(|| GateError::config("input `token` is required"))
    }

    /// Token for organization team reads; falls back to `token`.
    pub fn org_read_token(&self) -> Result<&str, GateError> {
        match self.org_read_token.as_deref() {
            Some(t) => Ok(t),
            None => self.token(),
        }
    }

    /// Split `GITHUB_REPOSITORY` into owner and repository name.
    pub fn repository(&self) -> Result<(String, String), GateError> {
        let full = self
            .repository
            .as_deref()
            .ok_or_else(|| GateError::config("GITHUB_REPOSITORY is not set"))?;
        match full.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner.to_string(), name.to_string()))
            }
            _ => Err(GateError::config(format!(
                "GITHUB_REPOSITORY must be owner/name, got {full:?}"
            ))),
        }
    }

    /// Which pull request to evaluate: explicit number, then branch, then
    /// the number embedded in `GITHUB_REF`.
    pub fn pull_request_selector(&self) -> Result<PullRequestSelector, GateError> {
        if let Some(raw) = &self.pr_number {
            return raw
                .trim()
                .parse()
                .map(PullRequestSelector::Number)
                .map_err(|_| {
                    GateError::config(format!("input `pr_number` is not a number: {raw:?}"))
                });
        }
        if let Some(branch) = &self.branch {
            return Ok(PullRequestSelector::Branch(branch.trim().to_string()));
        }
        let git_ref = self.github_ref.as_deref().ok_or_else(|| {
            GateError::config("no pr_number, branch or GITHUB_REF to identify the pull request")
        })?;
        number_from_ref(git_ref)
            .map(PullRequestSelector::Number)
            .ok_or_else(|| {
                GateError::config(format!("GITHUB_REF does not name a pull request: {git_ref:?}"))
            })
    }
}

/// How the pull request under evaluation is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestSelector {
    Number(u64),
    /// Newest pull request whose head is this branch.
    Branch(String),
}

/// `refs/pull/42/merge` → 42.
fn number_from_ref(git_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = git_ref.split('/').collect();
    if parts.len() < 2 {
        return None;
    }
    parts[parts.len() - 2].parse().ok()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, GateError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(GateError::config(format!(
            "input `{name}` must be true or false, got {other:?}"
        ))),
    }
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay file, if one exists
    /// 3. Apply action inputs
    ///
    /// The overlay is `$CODEOWNERS_GATE_CONFIG` (`~` and `$VARS` expanded) or
    /// `.github/codeowners-gate.toml` under the workspace.
    pub fn load(inputs: &Inputs) -> Result<Self, GateError> {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay(inputs)? {
            config.apply_overlay(overlay);
        }
        config.apply_inputs(inputs)?;
        config.validate()?;
        Ok(config)
    }

    fn load_overlay(inputs: &Inputs) -> Result<Option<ConfigOverlay>, GateError> {
        let path = match &inputs.config_path {
            Some(raw) => {
                let expanded = shellexpand::full(raw)
                    .map_err(|e| GateError::config(format!("config path {raw:?}: {e}")))?;
                std::path::PathBuf::from(expanded.as_ref())
            }
            None => {
                let root = inputs.workspace.as_deref().unwrap_or(".");
                let candidate = std::path::Path::new(root).join(WORKSPACE_OVERLAY);
                if !candidate.is_file() {
                    return Ok(None);
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| GateError::config(format!("reading {}: {e}", path.display())))?;
        log::debug!("loaded config overlay from {}", path.display());
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| GateError::config(format!("{}: {e}", path.display())))
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.approval_mode {
            self.settings.approval_mode = v;
        }
        if let Some(v) = s.min_approvals {
            self.settings.min_approvals = v;
        }
        if let Some(v) = s.require_all_approvals_latest_commit {
            self.settings.require_all_approvals_latest_commit = v;
        }
        if let Some(v) = s.limit_org_teams_to_codeowners_file {
            self.settings.limit_org_teams_to_codeowners_file = v;
        }
        if let Some(v) = s.org_name {
            self.settings.org_name = v;
        }
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }

        // Codeowners
        let c = overlay.codeowners;
        merge_list(&mut self.codeowners.paths, c.paths, &c.remove_paths, c.replace);

        // GitHub
        let g = overlay.github;
        if let Some(v) = g.api_url {
            self.github.api_url = v;
        }
        if let Some(v) = g.timeout_secs {
            self.github.timeout_secs = v;
        }
        if let Some(v) = g.per_page {
            self.github.per_page = v;
        }
    }

    /// Apply action inputs; these win over file configuration.
    pub fn apply_inputs(&mut self, inputs: &Inputs) -> Result<(), GateError> {
        if let Some(v) = &inputs.org_name {
            self.settings.org_name = v.trim().to_string();
        }
        if let Some(v) = &inputs.min_approvals {
            self.settings.min_approvals = v.trim().parse().map_err(|_| {
                GateError::config(format!(
                    "input `min_approvals` must be a non-negative integer, got {v:?}"
                ))
            })?;
        }
        if let Some(v) = &inputs.require_all_approvals_latest_commit {
            self.settings.require_all_approvals_latest_commit =
                parse_bool("require_all_approvals_latest_commit", v)?;
        }
        if let Some(v) = &inputs.approval_mode {
            self.settings.approval_mode = v.parse().map_err(GateError::Configuration)?;
        }
        if let Some(v) = &inputs.limit_org_teams_to_codeowners_file {
            self.settings.limit_org_teams_to_codeowners_file =
                parse_bool("limit_org_teams_to_codeowners_file", v)?;
        }
        if let Some(v) = &inputs.api_url {
            self.github.api_url = v.trim().to_string();
        }
        if inputs.runner_debug {
            self.settings.log_level = "debug".into();
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), GateError> {
        if self.settings.org_name.is_empty() {
            return Err(GateError::config("input `org_name` is required"));
        }
        if self.codeowners.paths.is_empty() {
            return Err(GateError::config("codeowners.paths must name at least one file"));
        }
        if self.github.per_page == 0 || self.github.per_page > 100 {
            return Err(GateError::config("github.per_page must be between 1 and 100"));
        }
        Ok(())
    }

    /// Log level from settings, defaulting to `Info`.
    pub fn log_level(&self) -> log::LevelFilter {
        self.settings
            .log_level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn inputs(vars: &[(&str, &str)]) -> Inputs {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Inputs::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.settings.approval_mode, ApprovalMode::All);
        assert_eq!(config.settings.min_approvals, 0);
        assert!(!config.settings.require_all_approvals_latest_commit);
        assert!(!config.settings.limit_org_teams_to_codeowners_file);
        assert_eq!(config.codeowners.paths, vec![".github/CODEOWNERS", "CODEOWNERS"]);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.per_page, 100);
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_overrides_scalars() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            approval_mode = "ANY"
            min_approvals = 2
            org_name = "acme"
        "#,
        );
        assert_eq!(config.settings.approval_mode, ApprovalMode::Any);
        assert_eq!(config.settings.min_approvals, 2);
        assert_eq!(config.settings.org_name, "acme");
        // Untouched settings keep defaults
        assert!(!config.settings.require_all_approvals_latest_commit);
    }

    #[test]
    fn overlay_extends_paths() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [codeowners]
            paths = ["docs/CODEOWNERS"]
        "#,
        );
        assert_eq!(
            config.codeowners.paths,
            vec![".github/CODEOWNERS", "CODEOWNERS", "docs/CODEOWNERS"]
        );
    }

    #[test]
    fn overlay_removes_and_replaces_paths() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [codeowners]
            remove_paths = ["CODEOWNERS"]
        "#,
        );
        assert_eq!(config.codeowners.paths, vec![".github/CODEOWNERS"]);

        config.apply_overlay_str(
            r#"
            [codeowners]
            replace = true
            paths = ["OWNERS"]
        "#,
        );
        assert_eq!(config.codeowners.paths, vec!["OWNERS"]);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.codeowners.paths, original.codeowners.paths);
        assert_eq!(config.github.api_url, original.github.api_url);
    }

    // ── Inputs ──

    #[test]
    fn inputs_override_file_settings() {
        let mut config = Config::default_config();
        config.apply_overlay_str("[settings]\nmin_approvals = 5\n");
        config
            .apply_inputs(&inputs(&[
                ("INPUT_MIN_APPROVALS", "1"),
                ("INPUT_APPROVAL_MODE", "any"),
                ("INPUT_REQUIRE_ALL_APPROVALS_LATEST_COMMIT", "true"),
                ("INPUT_LIMIT_ORG_TEAMS_TO_CODEOWNERS_FILE", "false"),
                ("INPUT_ORG_NAME", "acme"),
            ]))
            .unwrap();
        assert_eq!(config.settings.min_approvals, 1);
        assert_eq!(config.settings.approval_mode, ApprovalMode::Any);
        assert!(config.settings.require_all_approvals_latest_commit);
        assert_eq!(config.settings.org_name, "acme");
    }

    #[test]
    fn empty_inputs_count_as_unset() {
        let mut config = Config::default_config();
        config
            .apply_inputs(&inputs(&[("INPUT_MIN_APPROVALS", ""), ("INPUT_APPROVAL_MODE", "  ")]))
            .unwrap();
        assert_eq!(config.settings.min_approvals, 0);
        assert_eq!(config.settings.approval_mode, ApprovalMode::All);
    }

    #[test]
    fn invalid_inputs_are_configuration_errors() {
        for (key, value) in [
            ("INPUT_MIN_APPROVALS", "-1"),
            ("INPUT_MIN_APPROVALS", "two"),
            ("INPUT_APPROVAL_MODE", "MOST"),
            ("INPUT_REQUIRE_ALL_APPROVALS_LATEST_COMMIT", "yes"),
        ] {
            let mut config = Config::default_config();
            let err = config.apply_inputs(&inputs(&[(key, value)])).unwrap_err();
            assert!(matches!(err, GateError::Configuration(_)), "{key}={value}");
        }
    }

    #[test]
    fn load_requires_org_name() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().to_str().unwrap();
        let err = Config::load(&inputs(&[("GITHUB_WORKSPACE", workspace)])).unwrap_err();
        assert!(err.to_string().contains("org_name"));
    }

    #[test]
    fn load_reads_workspace_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".github")).unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_OVERLAY),
            "[settings]\norg_name = \"acme\"\napproval_mode = \"ANY\"\n",
        )
        .unwrap();
        let workspace = dir.path().to_str().unwrap();
        let config = Config::load(&inputs(&[("GITHUB_WORKSPACE", workspace)])).unwrap();
        assert_eq!(config.settings.org_name, "acme");
        assert_eq!(config.settings.approval_mode, ApprovalMode::Any);
    }

    #[test]
    fn load_rejects_broken_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "[settings\n").unwrap();
        let err = Config::load(&inputs(&[
            ("CODEOWNERS_GATE_CONFIG", path.to_str().unwrap()),
            ("INPUT_ORG_NAME", "acme"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));
    }

    #[test]
    fn runner_debug_raises_log_level() {
        let mut config = Config::default_config();
        assert_eq!(config.log_level(), log::LevelFilter::Info);
        config.apply_inputs(&inputs(&[("RUNNER_DEBUG", "1")])).unwrap();
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn org_read_token_falls_back_to_token() {
        let i = inputs(&[("INPUT_TOKEN", "t1")]);
        assert_eq!(i.org_read_token().unwrap(), "t1");
        let i = inputs(&[("INPUT_TOKEN", "t1"), ("INPUT_READ_ORG_SCOPED_TOKEN", "t2")]);
        assert_eq!(i.org_read_token().unwrap(), "t2");
        assert!(inputs(&[]).token().is_err());
    }

    #[test]
    fn repository_splits_owner_and_name() {
        let i = inputs(&[("GITHUB_REPOSITORY", "acme/widgets")]);
        assert_eq!(i.repository().unwrap(), ("acme".into(), "widgets".into()));
        assert!(inputs(&[("GITHUB_REPOSITORY", "widgets")]).repository().is_err());
    }

    // ── Pull request selection ──

    #[test]
    fn explicit_number_wins() {
        let i = inputs(&[
            ("INPUT_PR_NUMBER", "7"),
            ("INPUT_BRANCH", "feature"),
            ("GITHUB_REF", "refs/pull/42/merge"),
        ]);
        assert_eq!(i.pull_request_selector().unwrap(), PullRequestSelector::Number(7));
    }

    #[test]
    fn branch_beats_ref() {
        let i = inputs(&[("INPUT_BRANCH", "feature"), ("GITHUB_REF", "refs/pull/42/merge")]);
        assert_eq!(
            i.pull_request_selector().unwrap(),
            PullRequestSelector::Branch("feature".into())
        );
    }

    #[test]
    fn number_from_pull_ref() {
        let i = inputs(&[("GITHUB_REF", "refs/pull/42/merge")]);
        assert_eq!(i.pull_request_selector().unwrap(), PullRequestSelector::Number(42));
    }

    #[test]
    fn branch_ref_is_not_a_pull_request() {
        let i = inputs(&[("GITHUB_REF", "refs/heads/main")]);
        assert!(matches!(
            i.pull_request_selector(),
            Err(GateError::Configuration(_))
        ));
        assert!(inputs(&[("INPUT_PR_NUMBER", "abc")]).pull_request_selector().is_err());
    }
}
