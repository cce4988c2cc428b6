//! Compile errors collected while converting and translating a script

use crate::logging::codes;
use crate::script::ScriptError;
use crate::script_enum::{define_script_enum, ScriptEnum};
use serde::Serialize;
use std::fmt;

define_script_enum! {
    CompileErrorCode {
        StringExpected => "string expected",
        NumberExpected => "number expected",
        FewerParametersExpected => "fewer parameters expected",
        VariableExpected => "variable expected",
        UndefinedVariable => "undefined variable",
        ObjectNameExpected => "object name expected",
        ObjectAllocationError => "object allocation error",
        InvalidParameters => "invalid parameters",
        DuplicateOverride => "duplicate object override",
        UnexpectedToken => "unexpected token",
        ObjectBaseNotFound => "object base not found",
        ReferenceToNonExistingObject => "reference to non existing object",
        TooManyErrors => "too many errors",
        ScriptSyntaxError => "script syntax error",
    }
}

impl CompileErrorCode {
    /// Logging code for this kind of error
    pub fn code(self) -> codes::Code {
        match self {
            Self::StringExpected => codes::compile::STRING_EXPECTED,
            Self::NumberExpected => codes::compile::NUMBER_EXPECTED,
            Self::FewerParametersExpected => codes::compile::FEWER_PARAMETERS_EXPECTED,
            Self::VariableExpected => codes::compile::VARIABLE_EXPECTED,
            Self::UndefinedVariable => codes::compile::UNDEFINED_VARIABLE,
            Self::ObjectNameExpected => codes::compile::OBJECT_NAME_EXPECTED,
            Self::ObjectAllocationError => codes::compile::OBJECT_ALLOCATION_ERROR,
            Self::InvalidParameters => codes::compile::INVALID_PARAMETERS,
            Self::DuplicateOverride => codes::compile::DUPLICATE_OVERRIDE,
            Self::UnexpectedToken => codes::compile::UNEXPECTED_TOKEN,
            Self::ObjectBaseNotFound => codes::compile::OBJECT_BASE_NOT_FOUND,
            Self::ReferenceToNonExistingObject => codes::compile::REFERENCE_TO_NON_EXISTING_OBJECT,
            Self::TooManyErrors => codes::compile::TOO_MANY_ERRORS,
            Self::ScriptSyntaxError => codes::compile::SCRIPT_SYNTAX_ERROR,
        }
    }
}

/// One error, in the order it was raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileError {
    pub code: CompileErrorCode,
    pub file: String,
    pub line: u32,
    pub message: Option<String>,
}

impl CompileError {
    pub fn new(code: CompileErrorCode, file: &str, line: u32) -> Self {
        Self {
            code,
            file: file.to_string(),
            line,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn from_script_error(error: &ScriptError) -> Self {
        Self::new(CompileErrorCode::ScriptSyntaxError, error.file(), error.line())
            .with_message(error.to_string())
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compiler error: {} in {}({})",
            self.code.script_name(),
            self.file,
            self.line
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_log_format() {
        let error = CompileError::new(CompileErrorCode::ObjectNameExpected, "post.compositor", 3);
        assert_eq!(
            error.to_string(),
            "Compiler error: object name expected in post.compositor(3)"
        );

        let error = error.with_message("compositor needs a name");
        assert!(error.to_string().ends_with("(3): compositor needs a name"));
    }

    #[test]
    fn test_every_code_is_registered() {
        for (_, code) in CompileErrorCode::ENTRIES {
            let metadata = codes::get_error_metadata(code.code().as_str());
            assert!(metadata.is_some(), "{} has no metadata", code);
        }
    }

    #[test]
    fn test_script_names_look_up() {
        assert_eq!(
            CompileErrorCode::lookup("Undefined Variable"),
            Some(CompileErrorCode::UndefinedVariable)
        );
    }
}
