//! Script file reading with compile-time limits

mod processor;

pub use processor::{
    is_script_path, FileMetadata, FileProcessingResult, FileProcessor, FileProcessorError,
    SCRIPT_EXTENSIONS,
};

/// Check that every file processing code has metadata registered
pub fn init_file_processor_logging() -> Result<(), String> {
    use crate::logging::codes::{self, file_processing};

    let required = [
        file_processing::FILE_NOT_FOUND,
        file_processing::INVALID_EXTENSION,
        file_processing::FILE_TOO_LARGE,
        file_processing::EMPTY_FILE,
        file_processing::PERMISSION_DENIED,
        file_processing::INVALID_ENCODING,
        file_processing::IO_ERROR,
        file_processing::INVALID_PATH,
    ];

    for code in &required {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "File processor error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    crate::log_debug!("File processor limits loaded",
        "max_file_size" => FileProcessor::max_file_size(),
        "extensions" => SCRIPT_EXTENSIONS.join(","));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Bloom.compositor");
        fs::write(&file_path, "compositor Bloom\n{\n}\n").unwrap();

        let result = FileProcessor::new()
            .process_file(file_path.to_str().unwrap())
            .unwrap();
        assert!(result.metadata.is_script_file);
        assert_eq!(result.metadata.line_count, 3);
    }

    #[test]
    fn test_logging_init() {
        assert!(init_file_processor_logging().is_ok());
    }
}
