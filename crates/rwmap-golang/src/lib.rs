//! Go language support for rwmap.
//!
//! The template and the generated code are Go; this crate parses Go source
//! with `tree-sitter-go` into an owned syntax tree, resolves identifiers to
//! the objects they name, and prints the tree back out in gofmt style.

pub mod ast;
pub mod error;
pub mod imports;
pub mod parser;
pub mod resolve;
pub mod serializer;
pub mod span;
pub mod visit;

pub use error::{GoError, Result};
pub use parser::GoParser;
pub use serializer::GoSerializer;
pub use span::Span;

#[cfg(test)]
mod tests;
