//! Shared source-location helpers

pub mod span;

pub use span::{Position, SourceMap, Span};
