use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoError {
    #[error("failed to load tree-sitter Go grammar: {0}")]
    Language(String),
    #[error("tree-sitter returned no syntax tree")]
    NoTree,
    #[error("syntax error at {span}: `{snippet}`")]
    Syntax { span: Span, snippet: String },
    #[error("unsupported {context} `{kind}` at {span}")]
    Unsupported {
        context: &'static str,
        kind: String,
        span: Span,
    },
    #[error("{node} is missing its {field} at {span}")]
    Missing {
        node: &'static str,
        field: &'static str,
        span: Span,
    },
    #[error("`{text}` is not a single type expression")]
    NotAType { text: String },
}

impl GoError {
    /// Location the error points at, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            GoError::Syntax { span, .. }
            | GoError::Unsupported { span, .. }
            | GoError::Missing { span, .. } => Some(*span),
            GoError::Language(_) | GoError::NoTree | GoError::NotAType { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GoError>;
