//! Errors raised by the rule-path tokenizer

use crate::config::compile_time::tokenizer::{MAX_CONSTANT_COUNT, MAX_TOKEN_COUNT};
use crate::logging::codes;
use thiserror::Error;

pub type Compiler2PassResult<T> = Result<T, Compiler2PassError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Compiler2PassError {
    #[error("Invalid grammar: {reason}")]
    InvalidGrammar { reason: String },

    /// The root rule path did not match. Position is the furthest point a
    /// terminal was tried at.
    #[error("Source does not match the grammar at line {line} (byte {char_pos})")]
    Pass1Failed { line: u32, char_pos: usize },

    #[error("Unexpected input after the root rule at line {line} (byte {char_pos})")]
    TrailingInput { line: u32, char_pos: usize },

    #[error("Rule path nesting exceeded {max_depth} at line {line}")]
    RecursionLimit { max_depth: usize, line: u32 },

    #[error("Too many tokens (max {MAX_TOKEN_COUNT})")]
    TooManyTokens,

    #[error("Too many numeric constants (max {MAX_CONSTANT_COUNT})")]
    TooManyConstants,

    #[error("Pass 2 failed: {message}")]
    Pass2 { message: String },
}

impl Compiler2PassError {
    pub fn invalid_grammar(reason: impl Into<String>) -> Self {
        Self::InvalidGrammar {
            reason: reason.into(),
        }
    }

    pub fn pass2(message: impl Into<String>) -> Self {
        Self::Pass2 {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::InvalidGrammar { .. } => codes::tokenizer::INVALID_GRAMMAR,
            Self::Pass1Failed { .. } => codes::tokenizer::GRAMMAR_MISMATCH,
            Self::TrailingInput { .. } => codes::tokenizer::TRAILING_INPUT,
            Self::RecursionLimit { .. } => codes::tokenizer::RULE_DEPTH_EXCEEDED,
            Self::TooManyTokens | Self::TooManyConstants => codes::tokenizer::TOO_MANY_TOKENS,
            Self::Pass2 { .. } => codes::tokenizer::PASS2_FAILURE,
        }
    }

    /// Byte offset the error points at, when it has one
    pub fn char_pos(&self) -> Option<usize> {
        match self {
            Self::Pass1Failed { char_pos, .. } | Self::TrailingInput { char_pos, .. } => {
                Some(*char_pos)
            }
            _ => None,
        }
    }
}
