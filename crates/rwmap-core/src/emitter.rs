use std::io::Write;
use std::path::{Path, PathBuf};

use rwmap_golang::ast::Ident;
use rwmap_golang::imports::{add_import, normalize_imports, KnownPackages};
use rwmap_golang::{GoParser, GoSerializer};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::specializer::Specialization;

pub const GENERATED_HEADER: &str = "// Code generated by rwmap; DO NOT EDIT.\n\n";

/// Output path used when none is given: `001_<lowercase name>.go`.
pub fn default_output_path(name: &str) -> PathBuf {
    PathBuf::from(format!("001_{}.go", name.to_lowercase()))
}

/// Turns a specialization into Go source text and writes it out.
#[derive(Debug, Clone, Default)]
pub struct Emitter {
    known: KnownPackages,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `known` to resolve package qualifiers that have no import yet.
    pub fn with_known_packages(known: KnownPackages) -> Self {
        Self { known }
    }

    pub fn known_packages_mut(&mut self) -> &mut KnownPackages {
        &mut self.known
    }

    pub fn render(&self, specialization: &Specialization) -> Result<String> {
        let mut file = specialization.file.clone();
        file.package = Ident::with_span(specialization.package.clone(), file.package.span);
        add_import(&mut file, "sync");
        let changes = normalize_imports(&mut file, &self.known);
        debug!(
            added = changes.added.len(),
            removed = changes.removed.len(),
            "normalized imports"
        );

        let code = format!(
            "{GENERATED_HEADER}{}",
            GoSerializer::new().serialize_file(&file)
        );
        let mut parser = GoParser::new().map_err(|err| Error::Render(err.to_string()))?;
        parser
            .parse_file(&code)
            .map_err(|err| Error::Render(format!("generated code does not parse: {err}")))?;
        Ok(code)
    }

    /// Writes `contents` to `path`, or to standard output when `path` is `-`.
    pub fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let io_error = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        if path == Path::new("-") {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes()).map_err(io_error)?;
            stdout.flush().map_err(io_error)?;
            return Ok(());
        }
        std::fs::write(path, contents).map_err(io_error)?;
        info!(path = %path.display(), bytes = contents.len(), "wrote generated code");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_is_lowercased() {
        assert_eq!(default_output_path("Counter"), PathBuf::from("001_counter.go"));
        assert_eq!(default_output_path("Map"), PathBuf::from("001_map.go"));
    }
}
