//! Central constants for runtime knobs and defaults.

/// Environment variable that answers "yes" to the non-empty target question.
pub const ENV_ASSUME_YES: &str = "TREESKEL_ASSUME_YES";

/// Environment variable holding a `tracing` filter directive.
pub const ENV_LOG_FILTER: &str = "TREESKEL_LOG";

/// Log filter used when neither `--verbose` nor `TREESKEL_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Log filter used with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "debug";

/// Replies accepted as consent at the confirmation prompt (case-insensitive).
pub const CONFIRM_REPLIES: [&str; 2] = ["y", "yes"];

/// Choose the log filter from the verbose flag and an optional override.
pub fn log_filter(verbose: bool, env_override: Option<&str>) -> String {
    match env_override.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_string(),
        _ if verbose => VERBOSE_LOG_FILTER.to_string(),
        _ => DEFAULT_LOG_FILTER.to_string(),
    }
}

/// Whether a line typed at the confirmation prompt means "continue".
pub fn is_confirm_reply(reply: &str) -> bool {
    let reply = reply.trim();
    CONFIRM_REPLIES
        .iter()
        .any(|accepted| reply.eq_ignore_ascii_case(accepted))
}
