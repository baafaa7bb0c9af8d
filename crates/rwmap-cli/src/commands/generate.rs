use crate::{cli::RwmapConfig, Result};
use rwmap_core::{default_output_path, Emitter, Extension, SpecializeOptions, Specializer};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// `map[K]V` to specialize for
    pub map_type: String,
    /// Container type name
    pub name: Option<String>,
    /// Package clause of the generated file
    pub package: Option<String>,
    /// Output file, `-` for standard output
    pub output: Option<PathBuf>,
    /// Generate the numeric accumulate bodies; `None` leaves it to the config
    pub extended: Option<bool>,
    /// Print the specialized syntax tree as JSON instead of Go source
    pub dump_ast: bool,
}

impl GenerateArgs {
    pub fn new(map_type: impl Into<String>) -> Self {
        Self {
            map_type: map_type.into(),
            ..Self::default()
        }
    }

    /// Flags as a configuration layer, so they can be merged over the file.
    fn overrides(&self) -> RwmapConfig {
        RwmapConfig {
            name: self.name.clone(),
            package: self.package.clone(),
            extended: self.extended,
            ..RwmapConfig::default()
        }
    }
}

pub fn generate_command(args: GenerateArgs, config: &RwmapConfig) -> Result<()> {
    let settings = config.clone().merge(args.overrides());
    let options = SpecializeOptions::new(args.map_type)
        .with_name(
            settings
                .name
                .clone()
                .unwrap_or_else(|| SpecializeOptions::DEFAULT_NAME.to_string()),
        )
        .with_package(
            settings
                .package
                .clone()
                .unwrap_or_else(|| SpecializeOptions::DEFAULT_PACKAGE.to_string()),
        )
        .with_extension(Extension::from_flag(settings.extended.unwrap_or(false)));
    debug!(
        map_type = %options.map_type,
        name = %options.name,
        package = %options.package,
        extension = %options.extension,
        "generating"
    );

    let specialization = Specializer::new(options).specialize()?;
    let emitter = Emitter::with_known_packages(settings.known_packages());

    if args.dump_ast {
        let json = serde_json::to_string_pretty(&specialization.file)?;
        let path = args.output.unwrap_or_else(|| PathBuf::from("-"));
        emitter.write(&path, &format!("{json}\n"))?;
        return Ok(());
    }

    let code = emitter.render(&specialization)?;
    let path = args
        .output
        .unwrap_or_else(|| default_output_path(&specialization.name));
    emitter.write(&path, &code)?;
    info!(
        name = %specialization.name,
        key = %specialization.key,
        value = %specialization.value,
        "generated {}",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.go");
        let config = RwmapConfig {
            name: Some("FromFile".into()),
            package: Some("store".into()),
            extended: Some(true),
            imports: BTreeMap::new(),
        };
        let args = GenerateArgs {
            name: Some("FromFlag".into()),
            output: Some(output.clone()),
            ..GenerateArgs::new("map[int]int")
        };

        generate_command(args, &config).unwrap();

        let code = std::fs::read_to_string(&output).unwrap();
        assert!(code.contains("\npackage store\n"), "{code}");
        assert!(code.contains("type FromFlag struct {\n"), "{code}");
        assert!(code.contains("\tret = m.data[key] + value\n"), "{code}");
    }

    #[test]
    fn test_flag_can_disable_configured_extension() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.go");
        let config = RwmapConfig {
            extended: Some(true),
            ..RwmapConfig::default()
        };
        let args = GenerateArgs {
            output: Some(output.clone()),
            extended: Some(false),
            ..GenerateArgs::new("map[int]int")
        };

        generate_command(args, &config).unwrap();

        let code = std::fs::read_to_string(&output).unwrap();
        assert!(
            code.contains("\tpanic(\"rwmap: AddStore requires a map generated with -ex\")\n"),
            "{code}"
        );
        assert!(!code.contains("m.data[key] + value"), "{code}");
    }

    #[test]
    fn test_dump_ast_writes_json() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tree.json");
        let args = GenerateArgs {
            output: Some(output.clone()),
            dump_ast: true,
            ..GenerateArgs::new("map[string]bool")
        };

        generate_command(args, &RwmapConfig::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert!(json.get("decls").is_some_and(|decls| decls.is_array()));
        assert_eq!(json["package"]["name"], "main");
    }

    #[test]
    fn test_invalid_name_is_reported_before_writing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.go");
        let args = GenerateArgs {
            name: Some("not-an-ident".into()),
            output: Some(output.clone()),
            ..GenerateArgs::new("map[int]int")
        };

        let err = generate_command(args, &RwmapConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::CliError::Core(rwmap_core::Error::InvalidArgument(_))
        ));
        assert!(!output.exists());
    }
}
