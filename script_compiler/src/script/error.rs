//! Lexer and parser errors

use crate::config::compile_time::parser::{MAX_NESTING_DEPTH, MAX_TOKENS_PER_STATEMENT};
use crate::logging::codes;
use thiserror::Error;

pub type ScriptResult<T> = Result<T, ScriptError>;

/// First lexical or structural problem found in a script. Lexing and
/// parsing stop at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("{file}({line}): unterminated quoted string")]
    UnterminatedQuote { file: String, line: u32 },

    #[error("{file}({line}): unterminated block comment")]
    UnterminatedComment { file: String, line: u32 },

    #[error("{file}({line}): '$' must be followed by a variable name")]
    InvalidVariable { file: String, line: u32 },

    #[error("{file}({line}): unbalanced brace")]
    UnbalancedBrace { file: String, line: u32 },

    #[error("{file}({line}): unexpected '{symbol}'")]
    UnexpectedSymbol {
        file: String,
        line: u32,
        symbol: String,
    },

    #[error("{file}({line}): unexpected end of script, expected {expected}")]
    UnexpectedEnd {
        file: String,
        line: u32,
        expected: &'static str,
    },

    #[error("{file}({line}): invalid import: {message}")]
    InvalidImport {
        file: String,
        line: u32,
        message: String,
    },

    #[error("{file}({line}): 'set' expects a variable name and at least one value")]
    InvalidVariableAssignment { file: String, line: u32 },

    #[error("{file}({line}): blocks nested deeper than {MAX_NESTING_DEPTH}")]
    NestingTooDeep { file: String, line: u32 },

    #[error("{file}({line}): statement longer than {MAX_TOKENS_PER_STATEMENT} tokens")]
    StatementTooLong { file: String, line: u32 },
}

impl ScriptError {
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::UnterminatedQuote { .. } => codes::lexer::UNTERMINATED_QUOTE,
            Self::UnterminatedComment { .. } => codes::lexer::UNTERMINATED_COMMENT,
            Self::InvalidVariable { .. } => codes::lexer::INVALID_VARIABLE,
            Self::UnbalancedBrace { .. } => codes::parse::UNBALANCED_BRACE,
            Self::UnexpectedSymbol { .. } => codes::parse::UNEXPECTED_SYMBOL,
            Self::UnexpectedEnd { .. } => codes::parse::UNEXPECTED_END,
            Self::InvalidImport { .. } => codes::parse::INVALID_IMPORT,
            Self::InvalidVariableAssignment { .. } => codes::parse::INVALID_VARIABLE_ASSIGNMENT,
            Self::NestingTooDeep { .. } => codes::parse::NESTING_TOO_DEEP,
            Self::StatementTooLong { .. } => codes::parse::STATEMENT_TOO_LONG,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::UnterminatedQuote { file, .. }
            | Self::UnterminatedComment { file, .. }
            | Self::InvalidVariable { file, .. }
            | Self::UnbalancedBrace { file, .. }
            | Self::UnexpectedSymbol { file, .. }
            | Self::UnexpectedEnd { file, .. }
            | Self::InvalidImport { file, .. }
            | Self::InvalidVariableAssignment { file, .. }
            | Self::NestingTooDeep { file, .. }
            | Self::StatementTooLong { file, .. } => file,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Self::UnterminatedQuote { line, .. }
            | Self::UnterminatedComment { line, .. }
            | Self::InvalidVariable { line, .. }
            | Self::UnbalancedBrace { line, .. }
            | Self::UnexpectedSymbol { line, .. }
            | Self::UnexpectedEnd { line, .. }
            | Self::InvalidImport { line, .. }
            | Self::InvalidVariableAssignment { line, .. }
            | Self::NestingTooDeep { line, .. }
            | Self::StatementTooLong { line, .. } => *line,
        }
    }

    /// Lexer errors, as opposed to parser errors
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedQuote { .. }
                | Self::UnterminatedComment { .. }
                | Self::InvalidVariable { .. }
        )
    }
}
