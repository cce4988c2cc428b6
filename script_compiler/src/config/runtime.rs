// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to reject files without a known script extension
    pub require_script_extension: bool,

    /// Whether to enable detailed performance logging (user preference)
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_script_extension: env::var(env_vars::REQUIRE_SCRIPT_EXTENSION)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_performance_logging: env::var(env_vars::ENABLE_PERFORMANCE_LOGGING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerPreferences {
    /// Whether to emit a debug event every time a rule path is entered
    pub trace_rule_paths: bool,
}

impl Default for TokenizerPreferences {
    fn default() -> Self {
        Self {
            trace_rule_paths: env::var(env_vars::TOKENIZER_TRACE_RULE_PATHS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerPreferences {
    /// Whether `import` statements are resolved
    pub process_imports: bool,

    /// Whether base objects are overlaid onto derived objects
    pub process_objects: bool,

    /// Whether `$variable` references are expanded
    pub process_variables: bool,

    /// Whether a top-level object with no registered translator is an error
    pub report_untranslated_objects: bool,
}

impl Default for CompilerPreferences {
    fn default() -> Self {
        Self {
            process_imports: env::var(env_vars::COMPILER_PROCESS_IMPORTS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            process_objects: env::var(env_vars::COMPILER_PROCESS_OBJECTS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            process_variables: env::var(env_vars::COMPILER_PROCESS_VARIABLES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            report_untranslated_objects: env::var(env_vars::COMPILER_REPORT_UNTRANSLATED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging (user preference)
    pub use_structured_logging: bool,

    /// Whether to enable console output (user preference)
    pub enable_console_logging: bool,

    /// User preferred minimum log level (within security constraints)
    pub min_log_level: LogLevel,

    /// Whether to include performance metrics in logs
    pub log_performance_events: bool,

    /// Whether to enable cargo-style error reporting
    pub enable_cargo_style_output: bool,

    /// Whether to include file context in log messages
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            log_performance_events: env::var(env_vars::LOGGING_LOG_PERFORMANCE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            enable_cargo_style_output: env::var(env_vars::LOGGING_CARGO_STYLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_file_context: env::var(env_vars::LOGGING_INCLUDE_FILE_CONTEXT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub tokenizer: TokenizerPreferences,
    pub compiler: CompilerPreferences,
    pub logging: LoggingPreferences,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    #[error("Failed to read runtime configuration '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid runtime configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RuntimeConfig {
    /// Parse preferences from TOML text. Missing sections fall back to the
    /// environment-driven defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, RuntimeConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load preferences from a TOML file on disk
    pub fn from_file(path: &Path) -> Result<Self, RuntimeConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuntimeConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const REQUIRE_SCRIPT_EXTENSION: &str = "SCRIPT_REQUIRE_SCRIPT_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "SCRIPT_ENABLE_PERFORMANCE_LOGGING";

    // Tokenizer
    pub const TOKENIZER_TRACE_RULE_PATHS: &str = "SCRIPT_TOKENIZER_TRACE_RULE_PATHS";

    // Compiler
    pub const COMPILER_PROCESS_IMPORTS: &str = "SCRIPT_COMPILER_PROCESS_IMPORTS";
    pub const COMPILER_PROCESS_OBJECTS: &str = "SCRIPT_COMPILER_PROCESS_OBJECTS";
    pub const COMPILER_PROCESS_VARIABLES: &str = "SCRIPT_COMPILER_PROCESS_VARIABLES";
    pub const COMPILER_REPORT_UNTRANSLATED: &str = "SCRIPT_COMPILER_REPORT_UNTRANSLATED";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "SCRIPT_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "SCRIPT_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "SCRIPT_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "SCRIPT_LOGGING_LOG_PERFORMANCE";
    pub const LOGGING_CARGO_STYLE: &str = "SCRIPT_LOGGING_CARGO_STYLE";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "SCRIPT_LOGGING_INCLUDE_FILE_CONTEXT";
}
