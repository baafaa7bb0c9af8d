//! Configuration file handling

use crate::{CliError, Result};
use rwmap_golang::imports::KnownPackages;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Defaults read from `rwmap.toml`. Command-line flags win over every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RwmapConfig {
    /// Container type name
    pub name: Option<String>,

    /// Package clause of the generated file
    pub package: Option<String>,

    /// Generate the numeric accumulate bodies
    pub extended: Option<bool>,

    /// Extra package name -> import path pairs for import resolution
    pub imports: BTreeMap<String, String>,
}

impl RwmapConfig {
    pub const LOCAL_FILE: &'static str = "rwmap.toml";

    /// Loads `explicit` when given, otherwise the first file found among
    /// `./rwmap.toml` and the user config directory. No file at all is fine.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        let candidates = [Some(PathBuf::from(Self::LOCAL_FILE)), Self::default_config_path()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::load_from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Fields set in `other` take precedence; import tables are combined.
    pub fn merge(mut self, other: Self) -> Self {
        self.name = other.name.or(self.name);
        self.package = other.package.or(self.package);
        self.extended = other.extended.or(self.extended);
        self.imports.extend(other.imports);
        self
    }

    /// `<config dir>/rwmap/config.toml` for the current user.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rwmap").join("config.toml"))
    }

    /// Import resolution table: the built-in packages plus `[imports]`.
    pub fn known_packages(&self) -> KnownPackages {
        let mut known = KnownPackages::default();
        for (name, path) in &self.imports {
            known.insert(name.clone(), path.clone());
        }
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_empty() {
        let config = RwmapConfig::default();
        assert_eq!(config.name, None);
        assert!(config.imports.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "name = \"Counter\"\nextended = true\n\n[imports]\nxxhash = \"github.com/cespare/xxhash/v2\"\n"
        )
        .unwrap();

        let config = RwmapConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.name.as_deref(), Some("Counter"));
        assert_eq!(config.package, None);
        assert_eq!(config.extended, Some(true));
        assert_eq!(
            config.known_packages().path_for("xxhash"),
            Some("github.com/cespare/xxhash/v2")
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "nmae = \"Counter\"\n").unwrap();
        let err = RwmapConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)), "{err:?}");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RwmapConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = RwmapConfig {
            name: Some("Map".into()),
            package: Some("store".into()),
            extended: None,
            imports: BTreeMap::from([("a".to_string(), "x/a".to_string())]),
        };
        let other = RwmapConfig {
            name: Some("Cache".into()),
            imports: BTreeMap::from([("b".to_string(), "x/b".to_string())]),
            ..RwmapConfig::default()
        };
        let merged = base.merge(other);
        assert_eq!(merged.name.as_deref(), Some("Cache"));
        assert_eq!(merged.package.as_deref(), Some("store"));
        assert_eq!(merged.imports.len(), 2);
    }
}
