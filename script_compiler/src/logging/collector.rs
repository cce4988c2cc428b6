//! Per-file event collection with cargo-style reporting
//!
//! Errors raised while a file context is set are grouped under that script, so
//! a batch run can print every script's problems together at the end.

use super::events::LogEvent;
use crate::config::compile_time::logging::{MAX_ERROR_COLLECTION, MAX_LOG_EVENTS_PER_FILE};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// The script a thread is currently compiling
#[derive(Debug, Clone)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
    pub start_time: Instant,
}

impl FileProcessingContext {
    pub fn new(file_path: PathBuf, file_id: usize) -> Self {
        Self {
            file_path,
            file_id,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessingSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub files_with_warnings: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_processing_time: Duration,
    pub average_file_time: Duration,
}

impl ProcessingSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.successful_files as f64 / self.total_files as f64
        }
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }
}

pub struct ErrorCollector {
    file_events: Mutex<BTreeMap<PathBuf, Vec<LogEvent>>>,
    file_contexts: Mutex<BTreeMap<PathBuf, FileProcessingContext>>,
    processing_start: Instant,
    per_file_limit: usize,
    total_limit: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::with_limits(MAX_LOG_EVENTS_PER_FILE, MAX_ERROR_COLLECTION)
    }

    /// Collector keeping at most `per_file` events for one script and
    /// `total` events overall
    pub fn with_limits(per_file: usize, total: usize) -> Self {
        Self {
            file_events: Mutex::new(BTreeMap::new()),
            file_contexts: Mutex::new(BTreeMap::new()),
            processing_start: Instant::now(),
            per_file_limit: per_file,
            total_limit: total,
        }
    }

    /// Record an event against `file_path`. Past the per-file limit a single
    /// warning marks the overflow and further events are dropped. Once the
    /// collector holds `total` events every new event is dropped.
    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let mut events = lock(&self.file_events);
        if events.values().map(Vec::len).sum::<usize>() >= self.total_limit {
            return;
        }
        let file_events = events.entry(file_path.to_path_buf()).or_default();

        if file_events.len() < self.per_file_limit {
            file_events.push(event);
        } else if file_events.len() == self.per_file_limit {
            file_events.push(LogEvent::warning(&format!(
                "Too many events for file (limit: {})",
                self.per_file_limit
            )));
        }
    }

    pub fn record_file_context(&self, context: FileProcessingContext) {
        lock(&self.file_contexts).insert(context.file_path.clone(), context);
    }

    pub fn get_file_events(&self, file_path: &Path) -> Vec<LogEvent> {
        lock(&self.file_events)
            .get(file_path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_file_errors(&self, file_path: &Path) -> Vec<LogEvent> {
        lock(&self.file_events)
            .get(file_path)
            .map(|events| events.iter().filter(|e| e.is_error()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_all_file_events(&self) -> BTreeMap<PathBuf, Vec<LogEvent>> {
        lock(&self.file_events).clone()
    }

    pub fn get_files_with_errors(&self) -> Vec<PathBuf> {
        lock(&self.file_events)
            .iter()
            .filter(|(_, events)| events.iter().any(LogEvent::is_error))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Errors whose code requires halting, with the file they came from
    pub fn get_critical_errors(&self) -> Vec<(PathBuf, LogEvent)> {
        lock(&self.file_events)
            .iter()
            .flat_map(|(path, events)| {
                events
                    .iter()
                    .filter(|e| e.is_error() && e.requires_halt())
                    .map(move |e| (path.clone(), e.clone()))
            })
            .collect()
    }

    pub fn get_summary(&self) -> ProcessingSummary {
        let events = lock(&self.file_events);
        let contexts = lock(&self.file_contexts);

        let mut summary = ProcessingSummary {
            total_files: events.len(),
            total_processing_time: self.processing_start.elapsed(),
            ..ProcessingSummary::default()
        };

        let mut timed = Duration::ZERO;
        let mut timed_files = 0u32;
        for (path, file_events) in events.iter() {
            let errors = file_events.iter().filter(|e| e.is_error()).count();
            let warnings = file_events.iter().filter(|e| e.is_warning()).count();
            summary.total_errors += errors;
            summary.total_warnings += warnings;

            if errors > 0 {
                summary.failed_files += 1;
            } else if warnings > 0 {
                summary.files_with_warnings += 1;
            } else {
                summary.successful_files += 1;
            }

            if let Some(context) = contexts.get(path) {
                timed += context.elapsed();
                timed_files += 1;
            }
        }
        if timed_files > 0 {
            summary.average_file_time = timed / timed_files;
        }

        summary
    }

    pub fn clear(&self) {
        lock(&self.file_events).clear();
        lock(&self.file_contexts).clear();
    }

    pub fn total_event_count(&self) -> usize {
        lock(&self.file_events).values().map(Vec::len).sum()
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors and warnings grouped per script, cargo style
pub fn format_cargo_style_errors(collector: &ErrorCollector) -> String {
    let mut output = String::new();

    for (file_path, events) in &collector.get_all_file_events() {
        let reported: Vec<_> = events
            .iter()
            .filter(|e| e.is_error() || e.is_warning())
            .collect();
        if reported.is_empty() {
            continue;
        }

        output.push_str(&format!("Checking {}...\n", file_path.display()));
        for event in reported {
            let kind = if event.is_error() { "error" } else { "warning" };
            output.push_str(&format!("{}[{}]: {}\n", kind, event.code, event.message));

            if let Some(line) = event.line() {
                let column = event.span.as_ref().map_or(1, |s| s.start().column);
                output.push_str(&format!("  --> {}:{}:{}\n", file_path.display(), line, column));
            }
            for (key, value) in &event.context {
                if !matches!(key.as_str(), "file" | "file_id" | "line") {
                    output.push_str(&format!("  = {}: {}\n", key, value));
                }
            }
            if event.is_error() {
                let action = event.recommended_action();
                if action != "No specific action available" {
                    output.push_str(&format!("  = help: {}\n", action));
                }
            }
        }
        output.push('\n');
    }

    let summary = collector.get_summary();
    if summary.total_errors > 0 {
        output.push_str(&format!("Total errors: {}\n", summary.total_errors));
    }
    if summary.total_warnings > 0 {
        output.push_str(&format!("Total warnings: {}\n", summary.total_warnings));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_events_are_grouped_per_file() {
        let collector = ErrorCollector::new();
        let water = PathBuf::from("water.material");
        let bloom = PathBuf::from("bloom.compositor");

        collector.record_event(&water, LogEvent::error(codes::compile::NUMBER_EXPECTED, "diffuse requires a colour"));
        collector.record_event(&water, LogEvent::warning("Duplicate translator registration ignored"));
        collector.record_event(&bloom, LogEvent::info("Translation complete"));

        assert_eq!(collector.get_file_events(&water).len(), 2);
        assert_eq!(collector.get_file_errors(&water).len(), 1);
        assert_eq!(collector.get_files_with_errors(), vec![water]);

        let summary = collector.get_summary();
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.successful_files, 1);
        assert_eq!(summary.total_errors, 1);
        assert_eq!(summary.total_warnings, 1);
        assert_eq!(summary.success_rate(), 0.5);
    }

    #[test]
    fn test_per_file_limit() {
        let collector = ErrorCollector::new();
        let path = PathBuf::from("noisy.particle");
        for _ in 0..MAX_LOG_EVENTS_PER_FILE + 5 {
            collector.record_event(&path, LogEvent::error(codes::compile::INVALID_PARAMETERS, "bad"));
        }

        let events = collector.get_file_events(&path);
        assert_eq!(events.len(), MAX_LOG_EVENTS_PER_FILE + 1);
        assert!(events.last().unwrap().is_warning());
    }

    #[test]
    fn test_total_limit_spans_files() {
        let collector = ErrorCollector::with_limits(3, 5);
        let first = PathBuf::from("a.material");
        let second = PathBuf::from("b.material");
        for _ in 0..4 {
            collector.record_event(&first, LogEvent::error(codes::compile::NUMBER_EXPECTED, "bad"));
        }
        for _ in 0..3 {
            collector.record_event(&second, LogEvent::error(codes::compile::NUMBER_EXPECTED, "bad"));
        }

        assert_eq!(collector.get_file_events(&first).len(), 4);
        assert_eq!(collector.get_file_events(&second).len(), 1);
        assert_eq!(collector.total_event_count(), 5);
    }

    #[test]
    fn test_critical_errors() {
        let collector = ErrorCollector::new();
        let path = PathBuf::from("smoke.particle");
        collector.record_event(&path, LogEvent::error(codes::system::INTERNAL_ERROR, "Registry missing"));
        collector.record_event(&path, LogEvent::error(codes::compile::UNEXPECTED_TOKEN, "token \"foo\" is not recognized"));

        let critical = collector.get_critical_errors();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].1.code, codes::system::INTERNAL_ERROR);

        collector.clear();
        assert_eq!(collector.total_event_count(), 0);
    }

    #[test]
    fn test_cargo_style_output() {
        let collector = ErrorCollector::new();
        let path = PathBuf::from("post.compositor");
        collector.record_event(
            &path,
            LogEvent::error(codes::compile::OBJECT_NAME_EXPECTED, "compositor must be given a name")
                .with_context("line", "3")
                .with_context("file", "post.compositor"),
        );

        let output = format_cargo_style_errors(&collector);
        assert!(output.contains("Checking post.compositor..."));
        assert!(output.contains("error[E065]: compositor must be given a name"));
        assert!(output.contains("--> post.compositor:3:1"));
        assert!(!output.contains("= file:"));
        assert!(output.contains("Total errors: 1"));
    }
}
