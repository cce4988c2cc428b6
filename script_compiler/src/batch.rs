//! Directory batches of script files
//!
//! Every file gets its own compiler and registry, so files can be compiled
//! on separate threads without sharing state. Errors land in the global
//! collector under each file, ready for the cargo-style summary.

use crate::config::compile_time::batch_processing::{
    MAX_BATCH_MEMORY, MAX_FILES_PER_BATCH, MAX_WORKER_THREADS,
};
use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
use crate::config::runtime::{CompilerPreferences, FileProcessorPreferences};
use crate::file_processor::is_script_path;
use crate::logging::codes;
use crate::pipeline::{self, PipelineError, PipelineResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
    pub files: FileProcessorPreferences,
    pub compiler: CompilerPreferences,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(4)
                .min(MAX_WORKER_THREADS),
            recursive: true,
            max_files: None,
            progress_reporting: true,
            fail_fast: false,
            files: FileProcessorPreferences::default(),
            compiler: CompilerPreferences::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchResults {
    pub successful_files: Vec<(PathBuf, PipelineResult)>,
    pub failed_files: Vec<(PathBuf, PipelineError)>,
    pub processing_duration: Duration,
    pub files_processed: usize,
    pub files_discovered: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.successful_files.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_files.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.successful_files.len() as f64 / self.files_processed as f64
        }
    }

    /// Compile errors across every failed file
    pub fn compile_error_count(&self) -> usize {
        self.failed_files
            .iter()
            .map(|(_, error)| error.compile_errors().len())
            .sum()
    }

    pub fn add_success(&mut self, file_path: PathBuf, result: PipelineResult) {
        self.successful_files.push((file_path, result));
        self.files_processed += 1;
    }

    pub fn add_failure(&mut self, file_path: PathBuf, error: PipelineError) {
        self.failed_files.push((file_path, error));
        self.files_processed += 1;
    }

    pub fn merge(&mut self, other: BatchResults) {
        self.successful_files.extend(other.successful_files);
        self.failed_files.extend(other.failed_files);
        self.files_processed += other.files_processed;
    }

    fn sort(&mut self) {
        self.successful_files.sort_by(|a, b| a.0.cmp(&b.0));
        self.failed_files.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch compile completed: {} files processed, {} successful ({:.1}%), {} failed, {:.2}s total",
            self.files_processed,
            self.success_count(),
            self.success_rate() * 100.0,
            self.failure_count(),
            self.processing_duration.as_secs_f64()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No script files found in directory: {path}")]
    NoFilesFound { path: String },

    #[error("Too many files found: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("IO error during directory traversal: {error}")]
    IoError { error: String },

    #[error("Worker thread error: {message}")]
    ThreadError { message: String },
}

impl BatchError {
    pub fn error_code(&self) -> codes::Code {
        match self {
            BatchError::DirectoryNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            BatchError::NoFilesFound { .. } => codes::file_processing::INVALID_PATH,
            BatchError::TooManyFiles { .. } => codes::file_processing::FILE_TOO_LARGE,
            BatchError::IoError { .. } => codes::file_processing::IO_ERROR,
            BatchError::ThreadError { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}

/// Script files under `dir_path`, sorted
pub fn discover_script_files(dir_path: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    crate::log_info!("Starting file discovery",
        "directory" => dir_path.display(),
        "recursive" => config.recursive
    );

    if !dir_path.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: dir_path.display().to_string(),
        });
    }

    let limit = config.max_files.unwrap_or(MAX_FILES_PER_BATCH).min(MAX_FILES_PER_BATCH);
    let mut files = Vec::new();
    visit_directory(dir_path, config.recursive, limit, &mut files)?;

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir_path.display().to_string(),
        });
    }
    if config.max_files.is_none() && files.len() >= MAX_FILES_PER_BATCH {
        return Err(BatchError::TooManyFiles {
            count: files.len(),
            max: MAX_FILES_PER_BATCH,
        });
    }

    files.sort();

    crate::log_success!(
        codes::success::FILE_VALIDATION_PASSED,
        "File discovery completed",
        "files_found" => files.len(),
        "directory" => dir_path.display()
    );

    Ok(files)
}

/// Returns false once `limit` files have been collected
fn visit_directory(
    dir_path: &Path,
    recursive: bool,
    limit: usize,
    files: &mut Vec<PathBuf>,
) -> Result<bool, BatchError> {
    let entries = fs::read_dir(dir_path).map_err(|e| BatchError::IoError {
        error: format!("{}: {}", dir_path.display(), e),
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| BatchError::IoError {
                error: e.to_string(),
            })?
            .path();

        if path.is_dir() {
            if recursive && !visit_directory(&path, recursive, limit, files)? {
                return Ok(false);
            }
        } else if path.is_file() && is_script_path(&path) {
            files.push(path);
            if files.len() >= limit {
                crate::log_warning!("Reached maximum file limit",
                    "files_found" => files.len(),
                    "limit" => limit
                );
                return Ok(false);
            }
        }
    }

    Ok(true)
}

/// Split files into those worth compiling and those rejected up front.
/// Files past `memory_budget` bytes of combined source are rejected too.
fn validate_files(files: &[PathBuf], memory_budget: u64) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
    let mut valid_files = Vec::new();
    let mut invalid_files = Vec::new();
    let mut total_bytes = 0u64;

    for file in files {
        match validate_single_file(file) {
            Ok(size) if total_bytes.saturating_add(size) > memory_budget => invalid_files.push((
                file.clone(),
                format!("Batch memory budget exhausted (max: {} bytes)", memory_budget),
            )),
            Ok(size) => {
                total_bytes += size;
                valid_files.push(file.clone());
            }
            Err(reason) => invalid_files.push((file.clone(), reason)),
        }
    }

    for (file_path, reason) in &invalid_files {
        crate::log_error!(codes::file_processing::INVALID_PATH, "File validation failed",
            "file" => file_path.display(),
            "reason" => reason
        );
    }

    (valid_files, invalid_files)
}

/// Size in bytes of a file that may be compiled
fn validate_single_file(file_path: &Path) -> Result<u64, String> {
    if !file_path.is_file() {
        return Err("Path is not a file".to_string());
    }

    let metadata = fs::metadata(file_path).map_err(|e| format!("Cannot read file metadata: {}", e))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(format!(
            "File too large: {} bytes (max: {} bytes)",
            metadata.len(),
            MAX_FILE_SIZE
        ));
    }

    Ok(metadata.len())
}

fn compile_one(file_path: &Path, file_id: usize, config: &BatchConfig, results: &mut BatchResults) -> bool {
    let path_str = file_path.to_string_lossy();
    match pipeline::process_file_with_preferences(&path_str, &config.files, &config.compiler, file_id) {
        Ok(result) => {
            results.add_success(file_path.to_path_buf(), result);
            true
        }
        Err(error) => {
            crate::log_error!(error.error_code(), "Script failed to compile",
                "file" => file_path.display(),
                "file_id" => file_id,
                "error" => &error
            );
            results.add_failure(file_path.to_path_buf(), error);
            false
        }
    }
}

pub fn process_directory_sequential(dir_path: &Path, config: &BatchConfig) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    crate::log_info!("Starting sequential batch compile", "directory" => dir_path.display());

    let discovered_files = discover_script_files(dir_path, config)?;
    let (valid_files, _) = validate_files(&discovered_files, MAX_BATCH_MEMORY);

    let mut results = BatchResults::new();
    results.files_discovered = discovered_files.len();

    for (file_id, file_path) in valid_files.iter().enumerate() {
        if config.progress_reporting {
            println!(
                "Compiling file {} of {}: {}",
                file_id + 1,
                valid_files.len(),
                file_path.display()
            );
        }

        if !compile_one(file_path, file_id, config, &mut results) && config.fail_fast {
            crate::log_warning!("Fail-fast mode enabled, stopping batch compile");
            break;
        }
    }

    results.processing_duration = start_time.elapsed();
    log_completion("Sequential batch compile completed", &results, 1);

    Ok(results)
}

pub fn process_directory_parallel(dir_path: &Path, config: &BatchConfig) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let threads = config.max_threads.clamp(1, MAX_WORKER_THREADS);
    crate::log_info!("Starting parallel batch compile",
        "directory" => dir_path.display(),
        "threads" => threads
    );

    let discovered_files = discover_script_files(dir_path, config)?;
    let (valid_files, _) = validate_files(&discovered_files, MAX_BATCH_MEMORY);

    let mut results = BatchResults::new();
    results.files_discovered = discovered_files.len();

    let files_per_thread = valid_files.len().div_ceil(threads).max(1);
    let stop = AtomicBool::new(false);

    let outcomes: Vec<thread::Result<BatchResults>> = thread::scope(|scope| {
        let handles: Vec<_> = valid_files
            .chunks(files_per_thread)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let stop = &stop;
                scope.spawn(move || {
                    let mut local = BatchResults::new();
                    for (offset, file_path) in chunk.iter().enumerate() {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        let file_id = chunk_index * files_per_thread + offset;
                        if !compile_one(file_path, file_id, config, &mut local) && config.fail_fast {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                    local
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join()).collect()
    });

    for outcome in outcomes {
        let local = outcome.map_err(|_| BatchError::ThreadError {
            message: "Worker thread panicked during compile".to_string(),
        })?;
        results.merge(local);
    }
    if stop.load(Ordering::Relaxed) {
        crate::log_warning!("Fail-fast mode enabled, stopped batch compile early");
    }

    results.sort();
    results.processing_duration = start_time.elapsed();
    log_completion("Parallel batch compile completed", &results, threads);

    Ok(results)
}

fn log_completion(message: &str, results: &BatchResults, threads: usize) {
    crate::log_success!(
        codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
        message,
        "files_processed" => results.files_processed,
        "successful" => results.success_count(),
        "failed" => results.failure_count(),
        "threads" => threads,
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );
}

/// Compile a directory with the default configuration
pub fn process_directory(dir_path: &Path) -> Result<BatchResults, BatchError> {
    process_directory_with_config(dir_path, &BatchConfig::default())
}

pub fn process_directory_with_config(dir_path: &Path, config: &BatchConfig) -> Result<BatchResults, BatchError> {
    if config.max_threads <= 1 {
        process_directory_sequential(dir_path, config)
    } else {
        process_directory_parallel(dir_path, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    const MATERIAL: &str = "material Red\n{\n    technique\n    {\n        pass\n        {\n            diffuse 1 0 0\n        }\n    }\n}\n";

    fn quiet(threads: usize) -> BatchConfig {
        BatchConfig {
            max_threads: threads,
            progress_reporting: false,
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_file_discovery() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("red.material"), MATERIAL).unwrap();
        fs::write(dir.path().join("bloom.compositor"), "compositor Bloom\n{\n}\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a script").unwrap();
        fs::create_dir(dir.path().join("fx")).unwrap();
        fs::write(dir.path().join("fx").join("smoke.particle"), "particle_system Smoke\n{\n}\n").unwrap();

        let files = discover_script_files(dir.path(), &quiet(1)).unwrap();
        assert_eq!(files.len(), 3);

        let flat = BatchConfig {
            recursive: false,
            ..quiet(1)
        };
        assert_eq!(discover_script_files(dir.path(), &flat).unwrap().len(), 2);
    }

    #[test]
    fn test_discovery_errors() {
        let dir = tempdir().unwrap();
        assert_matches!(
            discover_script_files(dir.path(), &quiet(1)),
            Err(BatchError::NoFilesFound { .. })
        );
        assert_matches!(
            discover_script_files(&dir.path().join("missing"), &quiet(1)),
            Err(BatchError::DirectoryNotFound { .. })
        );
    }

    #[test]
    fn test_max_files() {
        let dir = tempdir().unwrap();
        for name in ["a.material", "b.material", "c.material"] {
            fs::write(dir.path().join(name), MATERIAL).unwrap();
        }
        let config = BatchConfig {
            max_files: Some(2),
            ..quiet(1)
        };
        assert_eq!(discover_script_files(dir.path(), &config).unwrap().len(), 2);
    }

    #[test]
    fn test_file_validation() {
        let dir = tempdir().unwrap();
        let valid = dir.path().join("valid.material");
        fs::write(&valid, MATERIAL).unwrap();

        let (ok, rejected) = validate_files(&[valid, dir.path().join("gone.material")], MAX_BATCH_MEMORY);
        assert_eq!(ok.len(), 1);
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn test_memory_budget_rejects_later_files() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.material");
        let second = dir.path().join("b.material");
        fs::write(&first, MATERIAL).unwrap();
        fs::write(&second, MATERIAL).unwrap();

        let budget = MATERIAL.len() as u64 + 10;
        let (ok, rejected) = validate_files(&[first.clone(), second.clone()], budget);
        assert_eq!(ok, vec![first]);
        assert_eq!(rejected[0].0, second);
        assert!(rejected[0].1.contains("memory budget"));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.material"), MATERIAL).unwrap();
        fs::write(dir.path().join("b.material"), MATERIAL.replace("Red", "Blue")).unwrap();
        fs::write(dir.path().join("c.compositor"), "compositor\n{\n}\n").unwrap();

        let sequential = process_directory_with_config(dir.path(), &quiet(1)).unwrap();
        let parallel = process_directory_with_config(dir.path(), &quiet(3)).unwrap();

        for results in [&sequential, &parallel] {
            assert_eq!(results.files_discovered, 3);
            assert_eq!(results.success_count(), 2);
            assert_eq!(results.failure_count(), 1);
            assert_eq!(results.compile_error_count(), 1);
            assert!(results.failed_files[0].0.ends_with("c.compositor"));
        }
        assert_eq!(parallel.successful_files[0].0, sequential.successful_files[0].0);
    }

    #[test]
    fn test_fail_fast() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.compositor"), "compositor\n{\n}\n").unwrap();
        fs::write(dir.path().join("b.material"), MATERIAL).unwrap();

        let config = BatchConfig {
            fail_fast: true,
            ..quiet(1)
        };
        let results = process_directory_with_config(dir.path(), &config).unwrap();
        assert_eq!(results.files_processed, 1);
        assert_eq!(results.failure_count(), 1);
    }

    #[test]
    fn test_process_directory_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("red.material"), MATERIAL).unwrap();

        let results = process_directory(dir.path()).unwrap();
        assert_eq!(results.success_count(), 1);
        assert_eq!(results.successful_files[0].1.stats.objects.materials, 1);
    }

    #[test]
    fn test_batch_results() {
        let results = BatchResults::new();
        assert_eq!(results.success_rate(), 0.0);
        assert!(results.summary().contains("0 files processed"));
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert!(config.max_threads >= 1);
        assert!(config.max_threads <= MAX_WORKER_THREADS);
        assert!(config.recursive);
        assert!(!config.fail_fast);
        assert!(config.max_files.is_none());
    }
}
