//! Rule table and token types shared by both passes

use serde::{Deserialize, Serialize};

/// Symbol identifier. Doubles as the index of the symbol's entry in the
/// symbol table.
pub type Symbol = u32;

/// Context key that is valid in every context
pub const ALL_CONTEXTS: u32 = 0xFFFF_FFFF;

/// Step operator inside a rule path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Starts a rule path; the step's token is the non-terminal it defines
    Rule,
    /// Must match, unless an earlier step already failed
    And,
    /// Alternative tried only when the steps before it failed
    Or,
    /// Tried when the path is passing, never fails the path
    Optional,
    /// Matched as many times as possible, at least once
    Repeat,
    /// Terminates the rule path
    End,
}

/// One step of a rule path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRule {
    pub operation: Operation,
    pub token_id: Symbol,
    /// Literal text for terminal steps
    pub text: Option<&'static str>,
}

impl TokenRule {
    pub const fn new(operation: Operation, token_id: Symbol, text: Option<&'static str>) -> Self {
        Self {
            operation,
            token_id,
            text,
        }
    }

    pub const fn rule(token_id: Symbol, text: &'static str) -> Self {
        Self::new(Operation::Rule, token_id, Some(text))
    }

    pub const fn and(token_id: Symbol) -> Self {
        Self::new(Operation::And, token_id, None)
    }

    pub const fn and_text(token_id: Symbol, text: &'static str) -> Self {
        Self::new(Operation::And, token_id, Some(text))
    }

    pub const fn or(token_id: Symbol) -> Self {
        Self::new(Operation::Or, token_id, None)
    }

    pub const fn or_text(token_id: Symbol, text: &'static str) -> Self {
        Self::new(Operation::Or, token_id, Some(text))
    }

    pub const fn optional(token_id: Symbol) -> Self {
        Self::new(Operation::Optional, token_id, None)
    }

    pub const fn optional_text(token_id: Symbol, text: &'static str) -> Self {
        Self::new(Operation::Optional, token_id, Some(text))
    }

    pub const fn repeat(token_id: Symbol) -> Self {
        Self::new(Operation::Repeat, token_id, None)
    }

    pub const fn end() -> Self {
        Self::new(Operation::End, 0, None)
    }
}

/// Per-symbol metadata.
///
/// `rule_index == 0` marks a terminal. Rule path 0 is the grammar root, so the
/// root symbol can never be referenced as a non-terminal from another path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolDef {
    pub id: Symbol,
    /// Symbol is only attempted when `context_key & active_contexts != 0`
    pub context_key: u32,
    /// Bits set in the active contexts after the symbol is accepted
    pub context_pattern_set: u32,
    /// Bits cleared in the active contexts after the symbol is accepted
    pub context_pattern_clear: u32,
    /// Rule step holding this symbol's default literal text
    pub default_text_index: Option<usize>,
    /// Rule path defining this symbol, 0 for terminals
    pub rule_index: usize,
}

impl SymbolDef {
    /// Symbol valid everywhere that does not touch the active contexts
    pub const fn new(id: Symbol) -> Self {
        Self::with_contexts(id, ALL_CONTEXTS, 0, 0)
    }

    pub const fn with_contexts(id: Symbol, key: u32, set: u32, clear: u32) -> Self {
        Self {
            id,
            context_key: key,
            context_pattern_set: set,
            context_pattern_clear: clear,
            default_text_index: None,
            rule_index: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rule_index == 0
    }
}

/// An accepted token, in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInstruction {
    pub id: Symbol,
    /// Non-terminal whose rule path accepted this token
    pub ntt_rule_id: Symbol,
    pub line: u32,
    /// Byte offset of the token's first character
    pub char_pos: usize,
}
