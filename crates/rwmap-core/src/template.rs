//! The Go template the specializer works on.
//!
//! The container is written once against `interface{}`. One of two
//! accumulate blocks is appended before parsing; both declare the same
//! functions with the same signatures so the declaration registry sees the
//! same shape either way.

use crate::options::Extension;

const MAP_TEMPLATE: &str = include_str!("../templates/map.go.tmpl");
const ACCUMULATE: &str = include_str!("../templates/accumulate.go.tmpl");
const ACCUMULATE_STUB: &str = include_str!("../templates/accumulate_stub.go.tmpl");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(extension: Extension) -> Self {
        let tail = match extension {
            Extension::Accumulate => ACCUMULATE,
            Extension::Stub => ACCUMULATE_STUB,
        };
        Self {
            source: format!("{MAP_TEMPLATE}{tail}"),
        }
    }

    /// A template with arbitrary source, for exercising drift detection.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_variants_declare_the_accumulate_functions() {
        for extension in [Extension::Accumulate, Extension::Stub] {
            let template = Template::new(extension);
            assert!(template.source().starts_with("package rwmap\n"));
            assert!(template.source().contains("func (m *Map) AddStore("));
            assert!(template.source().contains("func (m *Map) AddStores("));
        }
        assert!(Template::new(Extension::Stub).source().contains("panic("));
        assert!(!Template::new(Extension::Accumulate).source().contains("panic("));
    }
}
