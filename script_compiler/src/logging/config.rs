//! Logging settings
//!
//! Buffer sizes and the verbosity floor are fixed at build time by
//! `config::compile_time::logging`. Output format and verbosity above the
//! floor come from the `LoggingPreferences` installed at startup.

use crate::config::compile_time::logging::{
    LOG_BUFFER_SIZE, MAX_LOG_EVENTS_PER_FILE, MAX_LOG_MESSAGE_LENGTH, SECURITY_MIN_LOG_LEVEL,
};
use crate::config::runtime::LoggingPreferences;
use crate::logging::events::LogLevel;
use std::sync::OnceLock;

static PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Install startup preferences. A second call is rejected.
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    PREFERENCES
        .set(preferences)
        .map_err(|_| "Logging preferences already installed".to_string())
}

fn preferences() -> LoggingPreferences {
    PREFERENCES.get().cloned().unwrap_or_default()
}

/// Quietest level a build allows; script warnings stay visible unless the
/// floor is 0.
fn verbosity_floor() -> LogLevel {
    match SECURITY_MIN_LOG_LEVEL {
        0 => LogLevel::Error,
        1 => LogLevel::Warning,
        _ => LogLevel::Info,
    }
}

fn effective_level(requested: LogLevel, floor: LogLevel) -> LogLevel {
    requested.max(floor)
}

/// Most verbose level that reaches the loggers
pub fn get_min_log_level() -> LogLevel {
    effective_level(preferences().min_log_level.to_events_log_level(), verbosity_floor())
}

pub fn use_structured_logging() -> bool {
    preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    preferences().enable_console_logging
}

/// Whether per-script read and compile timings are logged
pub fn log_performance_events() -> bool {
    preferences().log_performance_events
}

pub fn use_cargo_style_output() -> bool {
    preferences().enable_cargo_style_output
}

/// Whether events carry the path and id of the script being compiled
pub fn include_file_context() -> bool {
    preferences().include_file_context
}

pub fn get_error_buffer_size() -> usize {
    LOG_BUFFER_SIZE
}

/// Messages longer than this are truncated
pub fn get_max_log_message_length() -> usize {
    MAX_LOG_MESSAGE_LENGTH
}

pub fn validate_config() -> Result<(), String> {
    if !(100..=100_000).contains(&LOG_BUFFER_SIZE) {
        return Err(format!(
            "log buffer size {} outside 100..=100000",
            LOG_BUFFER_SIZE
        ));
    }
    if MAX_LOG_EVENTS_PER_FILE > LOG_BUFFER_SIZE {
        return Err(format!(
            "{} events per script exceeds the {} event buffer",
            MAX_LOG_EVENTS_PER_FILE, LOG_BUFFER_SIZE
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_constants_are_valid() {
        assert!(validate_config().is_ok());
    }

    #[test]
    fn test_floor_raises_quiet_requests() {
        assert_eq!(effective_level(LogLevel::Error, LogLevel::Warning), LogLevel::Warning);
        assert_eq!(effective_level(LogLevel::Debug, LogLevel::Warning), LogLevel::Debug);
        assert_eq!(effective_level(LogLevel::Error, LogLevel::Error), LogLevel::Error);
    }

    #[test]
    fn test_min_level_never_below_floor() {
        assert!(get_min_log_level() >= verbosity_floor());
    }
}
