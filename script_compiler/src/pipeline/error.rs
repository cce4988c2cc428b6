use crate::compiler::CompileError;
use crate::file_processor::FileProcessorError;
use crate::logging::{codes, Code};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File processing failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    #[error("Compilation of {file} failed with {} error(s)", errors.len())]
    Compilation { file: String, errors: Vec<CompileError> },

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },
}

impl PipelineError {
    pub fn pipeline_error(message: &str) -> Self {
        Self::Pipeline {
            message: message.to_string(),
        }
    }

    /// Code of the first underlying problem
    pub fn error_code(&self) -> Code {
        match self {
            Self::FileProcessing(error) => error.error_code(),
            Self::Compilation { errors, .. } => errors
                .first()
                .map(|error| error.code.code())
                .unwrap_or(codes::compile::SCRIPT_SYNTAX_ERROR),
            Self::Pipeline { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    /// Compile errors carried by this failure, if any
    pub fn compile_errors(&self) -> &[CompileError] {
        match self {
            Self::Compilation { errors, .. } => errors,
            _ => &[],
        }
    }
}
