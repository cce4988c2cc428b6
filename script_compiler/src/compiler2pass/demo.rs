//! Small pass-block grammar used by the `--tokenize` command line mode.
//!
//! ```text
//! pass
//!     ambient 0.2 0.2 0.2
//!     diffuse 1 0.5 0 0.8
//!     scale 2
//! end_pass
//! ```
//!
//! Colour and scale statements are only valid between `pass` and
//! `end_pass`; the two keywords flip the base and pass context bits.

use super::error::{Compiler2PassError, Compiler2PassResult};
use super::grammar::Grammar;
use super::tokenizer::{Pass1Output, Pass2};
use super::types::{Symbol, SymbolDef, TokenRule};
use serde::Serialize;

pub const SID_PROGRAM: Symbol = 0;
pub const SID_BLOCK: Symbol = 1;
pub const SID_STATEMENT: Symbol = 2;
pub const SID_COLOUR_KEY: Symbol = 3;
pub const SID_PASS: Symbol = 4;
pub const SID_END_PASS: Symbol = 5;
pub const SID_AMBIENT: Symbol = 6;
pub const SID_DIFFUSE: Symbol = 7;
pub const SID_SCALE: Symbol = 8;
pub const SID_VALUE: Symbol = 9;

pub const CTX_BASE: u32 = 0x1;
pub const CTX_PASS: u32 = 0x2;

const RULES: &[TokenRule] = &[
    TokenRule::rule(SID_PROGRAM, "program"),
    TokenRule::repeat(SID_BLOCK),
    TokenRule::end(),
    TokenRule::rule(SID_BLOCK, "block"),
    TokenRule::and_text(SID_PASS, "pass"),
    TokenRule::repeat(SID_STATEMENT),
    TokenRule::and_text(SID_END_PASS, "end_pass"),
    TokenRule::end(),
    TokenRule::rule(SID_STATEMENT, "statement"),
    TokenRule::and(SID_COLOUR_KEY),
    TokenRule::and(SID_VALUE),
    TokenRule::and(SID_VALUE),
    TokenRule::and(SID_VALUE),
    TokenRule::optional(SID_VALUE),
    TokenRule::or_text(SID_SCALE, "scale"),
    TokenRule::and(SID_VALUE),
    TokenRule::end(),
    TokenRule::rule(SID_COLOUR_KEY, "colour_key"),
    TokenRule::and_text(SID_AMBIENT, "ambient"),
    TokenRule::or_text(SID_DIFFUSE, "diffuse"),
    TokenRule::end(),
];

/// Build the pass-block grammar. Tokenize with active contexts set to
/// [`CTX_BASE`].
pub fn demo_grammar() -> Compiler2PassResult<Grammar> {
    let symbols = vec![
        SymbolDef::new(SID_PROGRAM),
        SymbolDef::new(SID_BLOCK),
        SymbolDef::new(SID_STATEMENT),
        SymbolDef::new(SID_COLOUR_KEY),
        SymbolDef::with_contexts(SID_PASS, CTX_BASE, CTX_PASS, CTX_BASE),
        SymbolDef::with_contexts(SID_END_PASS, CTX_PASS, CTX_BASE, CTX_PASS),
        SymbolDef::with_contexts(SID_AMBIENT, CTX_PASS, 0, 0),
        SymbolDef::with_contexts(SID_DIFFUSE, CTX_PASS, 0, 0),
        SymbolDef::with_contexts(SID_SCALE, CTX_PASS, 0, 0),
        SymbolDef::with_contexts(SID_VALUE, CTX_PASS, 0, 0),
    ];
    Grammar::new(RULES.to_vec(), symbols, SID_VALUE)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DemoInstruction {
    BeginPass { line: u32 },
    Colour { key: &'static str, rgba: [f32; 4], line: u32 },
    Scale { factor: f32, line: u32 },
    EndPass { line: u32 },
}

/// Turns a pass-block token list into instructions
#[derive(Debug, Default)]
pub struct DemoPass2;

impl Pass2 for DemoPass2 {
    type Output = Vec<DemoInstruction>;

    fn do_pass2(
        &mut self,
        grammar: &Grammar,
        pass1: &Pass1Output,
    ) -> Compiler2PassResult<Self::Output> {
        let mut instructions = Vec::new();
        let mut constants = pass1.constants.iter().copied();
        let mut tokens = pass1.tokens.iter().peekable();

        while let Some(token) = tokens.next() {
            let mut values = Vec::new();
            while tokens.next_if(|next| next.id == SID_VALUE).is_some() {
                let value = constants
                    .next()
                    .ok_or_else(|| Compiler2PassError::pass2("value token without a constant"))?;
                values.push(value);
            }

            let instruction = match (token.id, values.as_slice()) {
                (SID_PASS, []) => DemoInstruction::BeginPass { line: token.line },
                (SID_END_PASS, []) => DemoInstruction::EndPass { line: token.line },
                (SID_AMBIENT | SID_DIFFUSE, [r, g, b, rest @ ..]) => DemoInstruction::Colour {
                    key: grammar.type_def_text(token.id).unwrap_or("colour"),
                    rgba: [*r, *g, *b, rest.first().copied().unwrap_or(1.0)],
                    line: token.line,
                },
                (SID_SCALE, [factor]) => DemoInstruction::Scale {
                    factor: *factor,
                    line: token.line,
                },
                (id, _) => {
                    return Err(Compiler2PassError::pass2(format!(
                        "unexpected symbol {} with {} values at line {}",
                        id,
                        values.len(),
                        token.line
                    )))
                }
            };
            instructions.push(instruction);
        }

        Ok(instructions)
    }
}
