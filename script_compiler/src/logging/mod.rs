//! Process-wide logging for the script compiler
//!
//! A single [`LoggingService`] receives every event. Events raised while a
//! script is being compiled also land in the [`ErrorCollector`] under that
//! script, so the cargo-style report can group diagnostics by file. The
//! script in flight is tracked per thread because batch compiles run one
//! script per worker.

pub mod codes;
pub mod collector;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use collector::{ErrorCollector, FileProcessingContext, ProcessingSummary};
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static SERVICE: OnceLock<Arc<LoggingService>> = OnceLock::new();
static COLLECTOR: OnceLock<Arc<ErrorCollector>> = OnceLock::new();

thread_local! {
    static CURRENT_SCRIPT: RefCell<Option<FileProcessingContext>> = const { RefCell::new(None) };
}

/// Codes every front end reports through; init refuses to start without them
const REQUIRED_CODES: &[Code] = &[
    codes::system::INTERNAL_ERROR,
    codes::file_processing::FILE_NOT_FOUND,
    codes::compile::OBJECT_NAME_EXPECTED,
];

/// Install the logging service and error collector. Fails when called twice.
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Invalid logging configuration: {}", e))?;

    if let Some(code) = REQUIRED_CODES
        .iter()
        .find(|code| codes::get_description(code.as_str()) == "Unknown error")
    {
        return Err(format!("No description registered for {}", code.as_str()));
    }

    let service = Arc::new(service::create_configured_service());
    SERVICE
        .set(service.clone())
        .map_err(|_| "Logging service already installed")?;
    COLLECTOR
        .set(Arc::new(ErrorCollector::new()))
        .map_err(|_| "Error collector already installed")?;

    service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Script compiler logging ready",
    ));
    Ok(())
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    SERVICE.get().map(Arc::as_ref)
}

pub fn try_get_global_error_collector() -> Option<&'static ErrorCollector> {
    COLLECTOR.get().map(Arc::as_ref)
}

/// Restores the previously compiled script when dropped, so nested
/// compiles (imports) hand attribution back to their parent.
struct ScriptScope {
    previous: Option<FileProcessingContext>,
}

impl ScriptScope {
    fn enter(context: FileProcessingContext) -> Self {
        if let Some(collector) = try_get_global_error_collector() {
            collector.record_file_context(context.clone());
        }
        let previous = CURRENT_SCRIPT.with(|current| current.borrow_mut().replace(context));
        Self { previous }
    }
}

impl Drop for ScriptScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_SCRIPT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Run `f` with `file_path` as the script that logged events belong to
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _scope = ScriptScope::enter(FileProcessingContext::new(file_path, file_id));
    f()
}

pub fn get_current_file_context() -> Option<FileProcessingContext> {
    CURRENT_SCRIPT.with(|current| current.borrow().clone())
}

fn with_context(mut event: LogEvent, context: Vec<(&str, &str)>) -> LogEvent {
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if config::include_file_context() {
        if let Some(script) = get_current_file_context() {
            event = event
                .with_context("file", &script.file_path.display().to_string())
                .with_context("file_id", &script.file_id.to_string());
        }
    }
    event
}

fn emit(event: LogEvent) {
    if let Some(service) = try_get_global_logger() {
        service.log_event(event);
    }
}

// Entry points for the log_* macros

pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::Span>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(span) = span {
        event = event.with_span(span);
    }
    let event = with_context(event, context);

    if let (Some(script), Some(collector)) =
        (get_current_file_context(), try_get_global_error_collector())
    {
        collector.record_event(&script.file_path, event.clone());
    }
    emit(event);
}

pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    emit(with_context(LogEvent::success(code, message), context));
}

pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    emit(with_context(LogEvent::info(message), context));
}

pub fn log_warning_with_context(message: &str, context: Vec<(&str, &str)>) {
    emit(with_context(LogEvent::warning(message), context));
}

pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    emit(with_context(LogEvent::debug(message), context));
}

/// Print the per-script error report when cargo-style output is on
pub fn print_cargo_style_summary() {
    if !config::use_cargo_style_output() {
        return;
    }
    match try_get_global_error_collector() {
        Some(collector) => println!("{}", collector::format_cargo_style_errors(collector)),
        None => println!("No error collector available for summary"),
    }
}

/// Report a failure that may happen before logging is installed. Always
/// reaches stderr.
pub fn safe_log_critical(code: Code, message: &str) {
    emit(LogEvent::error(code, message));
    eprintln!("CRITICAL ERROR [{}]: {}", code.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_installs_service_once() {
        if try_get_global_logger().is_none() {
            assert!(init_global_logging().is_ok());
        }
        assert!(try_get_global_logger().is_some());
        assert!(try_get_global_error_collector().is_some());
        assert!(init_global_logging().is_err());
    }

    #[test]
    fn test_required_codes_are_described() {
        for code in REQUIRED_CODES {
            assert_ne!(codes::get_description(code.as_str()), "Unknown error");
        }
    }

    #[test]
    fn test_script_scope_is_cleared_after_run() {
        assert!(get_current_file_context().is_none());

        let result = with_file_context(PathBuf::from("ember.particle"), 2, || {
            let current = get_current_file_context().unwrap();
            assert_eq!(current.file_path, PathBuf::from("ember.particle"));
            assert_eq!(current.file_id, 2);
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_nested_scripts_restore_the_parent() {
        with_file_context(PathBuf::from("base.material"), 1, || {
            with_file_context(PathBuf::from("shared.material"), 2, || {
                assert_eq!(get_current_file_context().unwrap().file_id, 2);
            });
            assert_eq!(get_current_file_context().unwrap().file_id, 1);
        });
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_context_pairs_are_attached() {
        let event = with_context(LogEvent::info("compiled"), vec![("objects", "3")]);
        assert_eq!(event.context.get("objects").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_critical_logging_works_without_service() {
        safe_log_critical(codes::system::INTERNAL_ERROR, "registry poisoned");
    }
}
