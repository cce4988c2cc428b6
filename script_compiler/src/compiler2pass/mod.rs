//! Table-driven two-pass compiler framework
//!
//! A grammar is a flat table of [`TokenRule`] steps grouped into rule paths
//! plus a symbol table. Pass 1 walks the rule paths against the source with
//! backtracking and produces a flat token list with the numeric constants
//! split out. Pass 2 is supplied by the grammar owner through [`Pass2`].
//!
//! Symbols carry a context key. A terminal accepted in the source can set or
//! clear context bits, which enables or disables other symbols for the rest
//! of the run.

pub mod demo;
pub mod error;
pub mod grammar;
pub mod scanner;
pub mod tokenizer;
pub mod types;

pub use demo::{demo_grammar, DemoInstruction, DemoPass2};
pub use error::{Compiler2PassError, Compiler2PassResult};
pub use grammar::Grammar;
pub use scanner::{ScanState, Snapshot};
pub use tokenizer::{Compiler2Pass, Pass1Output, Pass2};
pub use types::{Operation, Symbol, SymbolDef, TokenInstruction, TokenRule, ALL_CONTEXTS};
