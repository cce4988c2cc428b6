//! Single-file pipeline: read a script, compile it into its own registry

mod error;
pub mod output;
mod result;

pub use error::PipelineError;
pub use output::PipelineOutput;
pub use result::{PipelineResult, PipelineStats};

use crate::compiler::{CompileErrorCode, DirectoryImporter, ScriptCompiler};
use crate::config::runtime::{CompilerPreferences, FileProcessorPreferences};
use crate::file_processor::FileProcessor;
use crate::logging::{self, codes};
use crate::registry::EngineRegistry;
use crate::script_enum::ScriptEnum;
use std::path::PathBuf;
use std::time::Instant;

/// Read and compile one script with the default compiler preferences
pub fn process_file(file_path: &str) -> Result<PipelineResult, PipelineError> {
    process_file_with_preferences(
        file_path,
        &FileProcessorPreferences::default(),
        &CompilerPreferences::default(),
        0,
    )
}

/// Read and compile one script. Imports resolve relative to the script's
/// directory; `file_id` tags the events logged for it.
pub fn process_file_with_preferences(
    file_path: &str,
    files: &FileProcessorPreferences,
    preferences: &CompilerPreferences,
    file_id: usize,
) -> Result<PipelineResult, PipelineError> {
    logging::with_file_context(PathBuf::from(file_path), file_id, || {
        crate::log_info!("Compiling script", "file" => file_path);

        let read_start = Instant::now();
        let file_result = FileProcessor::from_preferences(files).process_file(file_path)?;
        let read_duration = read_start.elapsed();

        let compile_start = Instant::now();
        let mut registry = EngineRegistry::new();
        let mut compiler = ScriptCompiler::from_preferences(preferences)
            .with_listener(DirectoryImporter::for_script(&file_result.metadata.path));
        let compiled = compiler.compile(&file_result.source, file_path, &mut registry);
        let compile_duration = compile_start.elapsed();
        if logging::config::log_performance_events() {
            crate::log_info!(
                "Script timings",
                "read_us" => read_duration.as_micros(),
                "compile_us" => compile_duration.as_micros()
            );
        }

        if !compiled {
            return Err(PipelineError::Compilation {
                file: file_path.to_string(),
                errors: compiler.errors().to_vec(),
            });
        }

        let stats = PipelineStats {
            source_bytes: file_result.metadata.size,
            line_count: file_result.metadata.line_count,
            objects: registry.summary(),
            read_duration,
            compile_duration,
        };
        let result = PipelineResult {
            file_metadata: file_result.metadata,
            environment: compiler.environment().clone(),
            state: compiler.state(),
            registry,
            stats,
        };
        result.log_success(file_path);

        Ok(result)
    })
}

/// Check that every code the pipeline can raise has metadata registered
pub fn validate_pipeline() -> Result<(), String> {
    crate::file_processor::init_file_processor_logging()?;

    for &(_, code) in CompileErrorCode::ENTRIES {
        if codes::get_error_metadata(code.code().as_str()).is_none() {
            return Err(format!("No metadata for compile error code {}", code.code().as_str()));
        }
    }

    crate::log_success!(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Pipeline validation succeeded",
        "compile_codes" => CompileErrorCode::ENTRIES.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileState;
    use crate::file_processor::FileProcessorError;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_pipeline() {
        assert!(validate_pipeline().is_ok());
    }

    #[test]
    fn test_process_file_with_import() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("base.material"),
            "abstract pass Lit\n{\n    lighting on\n}\n",
        )
        .unwrap();
        let main = dir.path().join("rock.material");
        fs::write(
            &main,
            "import Lit from \"base.material\"\n\nmaterial Rock\n{\n    technique\n    {\n        pass : Lit\n        {\n        }\n    }\n}\n",
        )
        .unwrap();

        let result = process_file(main.to_str().unwrap()).unwrap();
        assert_eq!(result.state, CompileState::Committed);
        assert_eq!(result.stats.objects.materials, 1);
        assert_eq!(result.stats.line_count, 11);

        let output = result.output("rock.material");
        let json = output.to_json().unwrap();
        assert!(json.contains("\"Rock\""));
        assert!(json.contains("\"compiled_at\""));
    }

    #[test]
    fn test_compile_failure_carries_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.compositor");
        fs::write(&path, "compositor\n{\n}\n").unwrap();

        let error = process_file(path.to_str().unwrap()).unwrap_err();
        assert_eq!(error.compile_errors().len(), 1);
        assert_eq!(error.error_code(), codes::compile::OBJECT_NAME_EXPECTED);
    }

    #[test]
    fn test_missing_file() {
        let result = process_file("/no/such/dir/none.material");
        assert_matches!(
            result,
            Err(PipelineError::FileProcessing(FileProcessorError::FileNotFound { .. }))
        );
    }

    #[test]
    fn test_pipeline_error_creation() {
        let error = PipelineError::pipeline_error("registry lost");
        assert_matches!(error, PipelineError::Pipeline { ref message } if message == "registry lost");
        assert_eq!(error.error_code(), codes::system::INTERNAL_ERROR);
    }
}
