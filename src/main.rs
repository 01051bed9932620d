//! codeowners-gate: approval gate for GitHub pull requests.
//!
//! Runs as an Actions step. Reads inputs from `INPUT_*` / `GITHUB_*`
//! environment variables, writes `approved=<bool>` to `$GITHUB_OUTPUT`
//! and exits 0 when approved, 1 when not approved or on any error.

use std::path::Path;
use std::process::ExitCode;

use codeowners_gate::config::{Config, Inputs};
use codeowners_gate::error::GateError;
use codeowners_gate::eval::GateDecision;
use codeowners_gate::github::GitHubClient;
use codeowners_gate::{logging, output};

fn main() -> ExitCode {
    let inputs = Inputs::from_env();
    let config = Config::load(&inputs);
    let level = config
        .as_ref()
        .map(Config::log_level)
        .unwrap_or(log::LevelFilter::Info);
    logging::init(level);

    let output_path = inputs.output_path.as_deref().map(Path::new);
    let decision = match config.and_then(|c| evaluate(&c, &inputs)) {
        Ok(d) => d,
        Err(e) => {
            log::error!("{e}");
            if let Err(io) = output::write_approved(output_path, false) {
                log::error!("failed to write output: {io}");
            }
            return ExitCode::FAILURE;
        }
    };

    logging::log_decision(&decision);
    if let Err(e) = output::write_approved(output_path, decision.approved) {
        log::error!("failed to write output: {e}");
        return ExitCode::FAILURE;
    }

    if decision.approved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn evaluate(config: &Config, inputs: &Inputs) -> Result<GateDecision, GateError> {
    let (owner, repo) = inputs.repository()?;
    let selector = inputs.pull_request_selector()?;

    let source = GitHubClient::new(&config.github, inputs.token()?, &owner, &repo)?;
    let directory = GitHubClient::new(&config.github, inputs.org_read_token()?, &owner, &repo)?;

    codeowners_gate::run(config, &selector, &source, &directory)
}
