use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which bodies the accumulate operations (`AddStore`, `AddStores`) get.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    /// Numeric accumulate-in-place; only compiles for numeric or string values.
    #[display("accumulate")]
    Accumulate,
    /// Same signatures, bodies that panic when called.
    #[default]
    #[display("stub")]
    Stub,
}

impl Extension {
    pub fn from_flag(extended: bool) -> Self {
        if extended {
            Extension::Accumulate
        } else {
            Extension::Stub
        }
    }
}

/// Inputs of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializeOptions {
    /// `map[K]V` as typed by the caller.
    pub map_type: String,
    /// Name of the generated container type.
    pub name: String,
    /// Package clause of the generated file.
    pub package: String,
    pub extension: Extension,
}

impl SpecializeOptions {
    pub const DEFAULT_NAME: &'static str = "Map";
    pub const DEFAULT_PACKAGE: &'static str = "main";

    pub fn new(map_type: impl Into<String>) -> Self {
        Self {
            map_type: map_type.into(),
            name: Self::DEFAULT_NAME.to_string(),
            package: Self::DEFAULT_PACKAGE.to_string(),
            extension: Extension::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension = extension;
        self
    }

    /// Checks that the output and package names can be spliced into Go source.
    pub fn validate(&self) -> Result<()> {
        check_identifier("output name", &self.name)?;
        check_identifier("package name", &self.package)?;
        if self.package == "_" {
            return Err(Error::InvalidArgument(
                "package name must not be the blank identifier".to_string(),
            ));
        }
        Ok(())
    }
}

const GO_KEYWORDS: [&str; 25] = [
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

pub fn is_go_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !GO_KEYWORDS.contains(&text)
}

fn check_identifier(what: &str, text: &str) -> Result<()> {
    if is_go_identifier(text) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "{what} `{text}` is not a valid Go identifier"
        )))
    }
}
