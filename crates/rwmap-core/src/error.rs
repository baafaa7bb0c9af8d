use std::path::PathBuf;

use derive_more::Display;
use miette::{Diagnostic, SourceSpan};
use rwmap_golang::GoError;
use thiserror::Error;

use crate::registry::Namespace;

/// Everything that can stop a generation run. No variant leaves partial
/// output behind.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("invalid argument: {0}")]
    #[diagnostic(
        code(rwmap::invalid_argument),
        help("the argument must be a map type such as `map[string]int`")
    )]
    InvalidArgument(String),

    #[error("malformed type expression `{text}`")]
    #[diagnostic(code(rwmap::malformed_type))]
    MalformedTypeExpression {
        #[source_code]
        text: String,
        #[label("{reason}")]
        span: SourceSpan,
        reason: String,
    },

    #[error("the map template does not parse")]
    #[diagnostic(
        code(rwmap::malformed_template),
        help("the embedded template is broken; this is a bug in rwmap")
    )]
    MalformedTemplate(#[source] GoError),

    #[error("template drift: {0}")]
    #[diagnostic(
        code(rwmap::template_drift),
        help("the template and the declaration registry disagree; update both together")
    )]
    TemplateDrift(Drift),

    #[error("failed to render the generated code: {0}")]
    #[diagnostic(code(rwmap::render))]
    Render(String),

    #[error("failed to write {}", path.display())]
    #[diagnostic(code(rwmap::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The ways a template can disagree with the declaration registry.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Drift {
    #[display("unrecognized {namespace} declaration `{name}`")]
    Unrecognized { namespace: Namespace, name: String },
    #[display("declarations never seen in the template: {}", entries.join(", "))]
    Unconsumed { entries: Vec<String> },
    #[display("{namespace} declaration `{name}` has an unexpected shape: {detail}")]
    Shape {
        namespace: Namespace,
        name: String,
        detail: String,
    },
    #[display("{count} placeholder type(s) survived specialization")]
    Placeholder { count: usize },
    #[display("value declaration `{name}` declares {count} names, expected 1")]
    ValueArity { name: String, count: usize },
}

impl From<Drift> for Error {
    fn from(drift: Drift) -> Self {
        Error::TemplateDrift(drift)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
