//! Compiler for material, compositor and particle scripts
//!
//! Two front ends share the crate. [`compiler2pass`] is a table-driven
//! rule-path tokenizer for grammars described as data. [`compiler`] turns
//! brace-structured scripts into an abstract tree, resolves imports,
//! inheritance and variables, and hands every object to a translator that
//! fills an [`EngineRegistry`].

// Internal modules
pub mod ast;
pub mod batch;
pub mod compiler;
pub mod compiler2pass;
pub mod config;
pub mod file_processor;
pub mod keywords;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod script;
pub mod script_enum;
pub mod translators;
pub mod utils;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults};
pub use compiler::{CompileError, CompileErrorCode, ScriptCompiler};
pub use pipeline::{PipelineError, PipelineResult};
pub use registry::EngineRegistry;

pub use pipeline::output::PipelineOutput;
