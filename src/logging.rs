use crate::eval::GateDecision;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, SimpleLogger, TermLogger, TerminalMode};

/// Install the process logger on stderr.
///
/// Falls back to a plain logger when no terminal is attached. Calling this
/// twice is harmless; the second call is ignored.
pub fn init(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    if TermLogger::init(level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        let _ = SimpleLogger::init(level, config);
    }
}

/// The one user-visible line: the decision and why.
pub fn log_decision(decision: &GateDecision) {
    if decision.approved {
        log::info!("Required approvals met: {}", decision.reason);
    } else {
        log::warn!("Required approvals not met: {}", decision.reason);
    }
    if let Ok(json) = serde_json::to_string(decision) {
        log::debug!("decision: {json}");
    }
}
