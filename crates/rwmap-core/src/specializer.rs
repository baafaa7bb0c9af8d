//! Drives one generation run over the template.
//!
//! The run moves through [`Stage`]s in a fixed order: the template is parsed,
//! every top-level declaration is handed to its registry handler in source
//! order, the registry is checked for unclaimed entries, and finally the
//! rename table is applied to the whole tree. Any error moves the run to
//! [`Stage::Failed`] and nothing is produced.

use derive_more::Display;
use rwmap_golang::ast::{Decl, File};
use rwmap_golang::GoParser;
use tracing::{debug, trace};

use crate::error::{Drift, Error, Result};
use crate::options::SpecializeOptions;
use crate::registry::{DeclarationRegistry, Namespace};
use crate::rewrite::{count_placeholders, RenameTable, ShapeMismatch};
use crate::template::Template;
use crate::type_expr::{MapArgument, TypeExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[display("initialized")]
    Initialized,
    #[display("parsing")]
    Parsing,
    #[display("walking")]
    Walking,
    #[display("validating")]
    Validating,
    #[display("renaming")]
    Renaming,
    #[display("done")]
    Done,
    #[display("failed")]
    Failed,
}

/// The specialized tree and what it was specialized for.
#[derive(Debug, Clone)]
pub struct Specialization {
    pub file: File,
    pub key: TypeExpr,
    pub value: TypeExpr,
    pub name: String,
    pub package: String,
}

pub struct Specializer {
    options: SpecializeOptions,
    template: Template,
    stage: Stage,
}

impl Specializer {
    pub fn new(options: SpecializeOptions) -> Self {
        let template = Template::new(options.extension);
        Self::with_template(options, template)
    }

    pub fn with_template(options: SpecializeOptions, template: Template) -> Self {
        Self {
            options,
            template,
            stage: Stage::Initialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn specialize(&mut self) -> Result<Specialization> {
        match self.run() {
            Ok(specialization) => Ok(specialization),
            Err(err) => {
                self.transition(Stage::Failed);
                Err(err)
            }
        }
    }

    fn transition(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "specializer stage");
        self.stage = stage;
    }

    fn run(&mut self) -> Result<Specialization> {
        self.options.validate()?;
        let table = RenameTable::for_output(&self.options.name);
        if !table.is_idempotent() {
            return Err(Error::InvalidArgument(format!(
                "output name `{}` collides with a template helper name",
                self.options.name
            )));
        }

        self.transition(Stage::Parsing);
        let mut parser = GoParser::new().map_err(Error::MalformedTemplate)?;
        let arg = MapArgument::parse(&mut parser, &self.options.map_type)?;
        debug!(key = %arg.key, value = %arg.value, "parsed map argument");
        let mut file = parser
            .parse_file(self.template.source())
            .map_err(Error::MalformedTemplate)?;

        self.transition(Stage::Walking);
        let mut registry = DeclarationRegistry::new();
        for decl in &mut file.decls {
            dispatch(&mut registry, decl, &arg)?;
        }

        self.transition(Stage::Validating);
        if !registry.is_empty() {
            return Err(Drift::Unconsumed {
                entries: registry.pending(),
            }
            .into());
        }
        if !arg.key.contains_placeholder() && !arg.value.contains_placeholder() {
            let count = count_placeholders(&file);
            if count > 0 {
                return Err(Drift::Placeholder { count }.into());
            }
        }

        self.transition(Stage::Renaming);
        let renamed = table.apply(&mut file);
        file.package.name = self.options.package.clone();
        debug!(renamed, name = %self.options.name, "applied rename table");

        self.transition(Stage::Done);
        Ok(Specialization {
            file,
            key: arg.key,
            value: arg.value,
            name: self.options.name.clone(),
            package: self.options.package.clone(),
        })
    }
}

fn dispatch(
    registry: &mut DeclarationRegistry,
    decl: &mut Decl,
    arg: &MapArgument,
) -> Result<()> {
    let name = decl.name().to_string();
    let shape = |namespace: Namespace, mismatch: ShapeMismatch| Drift::Shape {
        namespace,
        name: name.clone(),
        detail: mismatch.0,
    };
    let unrecognized = |namespace: Namespace| Drift::Unrecognized {
        namespace,
        name: name.clone(),
    };

    match decl {
        Decl::Type(spec) => {
            let handler = registry
                .take_type(&name)
                .ok_or_else(|| unrecognized(Namespace::Type))?;
            trace!(name = %name, "type handler");
            handler(spec, arg).map_err(|err| shape(Namespace::Type, err))?;
        }
        Decl::Func(func) => {
            let handler = registry
                .take_func(&name)
                .ok_or_else(|| unrecognized(Namespace::Func))?;
            trace!(name = %name, "function handler");
            handler(func, arg).map_err(|err| shape(Namespace::Func, err))?;
        }
        Decl::Value(spec) => {
            if spec.names.len() != 1 {
                return Err(Drift::ValueArity {
                    name: name.clone(),
                    count: spec.names.len(),
                }
                .into());
            }
            let handler = registry
                .take_value(&name)
                .ok_or_else(|| unrecognized(Namespace::Value))?;
            trace!(name = %name, "value handler");
            handler(spec, arg).map_err(|err| shape(Namespace::Value, err))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_run_ends_done() {
        let mut specializer = Specializer::new(SpecializeOptions::new("map[string]int"));
        assert_eq!(specializer.stage(), Stage::Initialized);
        specializer.specialize().unwrap();
        assert_eq!(specializer.stage(), Stage::Done);
    }

    #[test]
    fn failed_run_ends_failed() {
        let mut specializer = Specializer::new(SpecializeOptions::new("[]int"));
        let err = specializer.specialize().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(specializer.stage(), Stage::Failed);
    }

    #[test]
    fn helper_names_are_rejected_as_output_names() {
        let options = SpecializeOptions::new("map[string]int").with_name("entry");
        let err = Specializer::new(options).specialize().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{err:?}");
    }

    #[test]
    fn value_declarations_must_bind_one_name() {
        let source = format!(
            "{}\nvar a, b = 1, 2\n",
            Template::new(Default::default()).source()
        );
        let mut specializer = Specializer::with_template(
            SpecializeOptions::new("map[string]int"),
            Template::from_source(source),
        );
        let err = specializer.specialize().unwrap_err();
        assert!(
            matches!(err, Error::TemplateDrift(Drift::ValueArity { count: 2, .. })),
            "{err:?}"
        );
    }
}
