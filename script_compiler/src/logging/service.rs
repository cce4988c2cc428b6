//! Logging service and its output targets

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Filters events by level and hands them to one [`Logger`]
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Console or structured output, per the runtime preferences. With the
    /// console disabled nothing is printed; the error collector still records.
    pub fn with_config() -> Self {
        let min_level = config::get_min_log_level();
        let mut outputs = MultiLogger::new(min_level);
        if config::use_console_logging() {
            if config::use_structured_logging() {
                outputs.add_logger(Arc::new(StructuredLogger::new(min_level)));
            } else {
                outputs = outputs.with_console(min_level);
            }
        }

        Self::new(Arc::new(outputs), min_level)
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.should_log(event.level) {
            self.logger.log(&event);
        }
    }

    pub fn log_error(&self, error_code: Code, message: &str) {
        self.log_event(LogEvent::error(error_code, message));
    }

    pub fn log_success(&self, success_code: Code, message: &str) {
        self.log_event(LogEvent::success(success_code, message));
    }

    pub fn log_info(&self, message: &str) {
        self.log_event(LogEvent::info(message));
    }

    pub fn log_warning(&self, message: &str) {
        self.log_event(LogEvent::warning(message));
    }

    pub fn log_debug(&self, message: &str) {
        self.log_event(LogEvent::debug(message));
    }
}

/// Plain text to stdout, errors to stderr
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        match event.level {
            LogLevel::Error => eprintln!("{}", event.format()),
            _ => println!("{}", event.format()),
        }
    }
}

/// One JSON object per line
pub struct StructuredLogger {
    min_level: LogLevel,
}

impl StructuredLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        let line = event.format_json().unwrap_or_else(|_| event.format());
        match event.level {
            LogLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

/// Keeps events in memory, bounded by the configured buffer size
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    pub fn get_errors(&self) -> Vec<LogEvent> {
        self.filtered(LogEvent::is_error)
    }

    pub fn get_events_with_code(&self, code: Code) -> Vec<LogEvent> {
        self.filtered(|e| e.code == code)
    }

    pub fn get_events_by_category(&self, category: &str) -> Vec<LogEvent> {
        self.filtered(|e| e.category() == category)
    }

    pub fn has_error_with_code(&self, code: Code) -> bool {
        self.lock().iter().any(|e| e.is_error() && e.code == code)
    }

    pub fn has_success_with_code(&self, code: Code) -> bool {
        self.lock().iter().any(|e| e.is_info() && e.code == code)
    }

    pub fn get_summary(&self) -> EventSummary {
        let events = self.lock();
        EventSummary {
            total_count: events.len(),
            error_count: events.iter().filter(|e| e.is_error()).count(),
            warning_count: events.iter().filter(|e| e.is_warning()).count(),
            info_count: events.iter().filter(|e| e.is_info()).count(),
            critical_count: events
                .iter()
                .filter(|e| e.is_error() && e.requires_halt())
                .count(),
        }
    }

    fn filtered(&self, keep: impl Fn(&LogEvent) -> bool) -> Vec<LogEvent> {
        self.lock().iter().filter(|e| keep(e)).cloned().collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.lock();
        let max_events = config::get_error_buffer_size();
        if events.len() >= max_events {
            let overflow = events.len() - max_events + 1;
            events.drain(0..overflow);
        }
        events.push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSummary {
    pub total_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub critical_count: usize,
}

impl EventSummary {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_critical_errors(&self) -> bool {
        self.critical_count > 0
    }
}

/// Appends to a log file; write failures are dropped so logging never recurses
pub struct FileLogger {
    file_path: PathBuf,
    min_level: LogLevel,
    structured: bool,
}

impl FileLogger {
    pub fn new(file_path: impl AsRef<Path>, min_level: LogLevel, structured: bool) -> std::io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        Ok(Self {
            file_path,
            min_level,
            structured,
        })
    }
}

impl Logger for FileLogger {
    fn log(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        let line = if self.structured {
            event.format_json().unwrap_or_else(|_| event.format())
        } else {
            event.format()
        };

        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
        {
            use std::io::Write;
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Fans events out to several loggers
pub struct MultiLogger {
    loggers: Vec<Arc<dyn Logger>>,
    min_level: LogLevel,
}

impl MultiLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            loggers: Vec::new(),
            min_level,
        }
    }

    pub fn add_logger(&mut self, logger: Arc<dyn Logger>) {
        self.loggers.push(logger);
    }

    pub fn with_console(mut self, level: LogLevel) -> Self {
        self.add_logger(Arc::new(ConsoleLogger::new(level)));
        self
    }

    pub fn with_file(mut self, file_path: impl AsRef<Path>, level: LogLevel, structured: bool) -> std::io::Result<Self> {
        self.add_logger(Arc::new(FileLogger::new(file_path, level, structured)?));
        Ok(self)
    }

    pub fn with_memory(mut self) -> (Self, Arc<MemoryLogger>) {
        let memory = Arc::new(MemoryLogger::new());
        self.add_logger(memory.clone());
        (self, memory)
    }
}

impl Logger for MultiLogger {
    fn log(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        for logger in &self.loggers {
            logger.log(event);
        }
    }
}

pub fn create_configured_service() -> LoggingService {
    LoggingService::with_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;
    use tempfile::TempDir;

    #[test]
    fn test_memory_logger() {
        let logger = MemoryLogger::new();
        logger.log(&LogEvent::info("Compiling water.material"));
        logger.log(&LogEvent::error(codes::compile::UNDEFINED_VARIABLE, "$colour is not defined"));

        assert_eq!(logger.event_count(), 2);
        assert_eq!(logger.get_events()[0].message, "Compiling water.material");
        assert_eq!(logger.get_errors().len(), 1);
        assert!(logger.has_error_with_code(codes::compile::UNDEFINED_VARIABLE));

        let summary = logger.get_summary();
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.info_count, 1);
        assert!(summary.has_errors());
        assert!(!summary.has_critical_errors());

        logger.clear();
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_service_filters_by_level() {
        let logger = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(logger.clone(), LogLevel::Error);

        service.log_debug("Rule entered");
        service.log_info("Translation started");
        service.log_error(codes::system::INTERNAL_ERROR, "Registry missing");

        assert_eq!(logger.event_count(), 1);
        assert_eq!(logger.get_summary().critical_count, 1);
    }

    #[test]
    fn test_service_success_events() {
        let logger = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(logger.clone(), LogLevel::Debug);

        service.log_success(codes::success::COMPILE_COMMITTED, "Compile committed");
        service.log_warning("Duplicate translator registration ignored");

        assert!(logger.has_success_with_code(codes::success::COMPILE_COMMITTED));
        assert_eq!(logger.get_events_with_code(codes::success::COMPILE_COMMITTED).len(), 1);
    }

    #[test]
    fn test_events_by_category() {
        let logger = MemoryLogger::new();
        logger.log(&LogEvent::error(codes::file_processing::FILE_NOT_FOUND, "missing"));
        logger.log(&LogEvent::error(codes::compile::OBJECT_NAME_EXPECTED, "no name"));
        logger.log(&LogEvent::error(codes::tokenizer::TRAILING_INPUT, "left over"));

        assert_eq!(logger.get_events_by_category("FileProcessing").len(), 1);
        assert_eq!(logger.get_events_by_category("Compile").len(), 1);
        assert_eq!(logger.get_events_by_category("Tokenizer").len(), 1);
    }

    #[test]
    fn test_multi_logger_with_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("compile.log");

        let (multi, memory) = MultiLogger::new(LogLevel::Info).with_memory();
        let multi = multi.with_file(&path, LogLevel::Info, true).unwrap();
        multi.log(&LogEvent::success(codes::success::TRANSLATION_COMPLETE, "Translation complete"));
        multi.log(&LogEvent::debug("filtered out"));

        assert_eq!(memory.event_count(), 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"code\":\"I060\""));
        assert_eq!(written.lines().count(), 1);
    }
}
