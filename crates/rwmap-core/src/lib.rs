//! Specializes the rwmap Go template for concrete key and value types.
//!
//! ```no_run
//! use rwmap_core::{Emitter, SpecializeOptions, Specializer};
//!
//! let options = SpecializeOptions::new("map[string]int").with_name("Counter");
//! let specialization = Specializer::new(options).specialize()?;
//! let code = Emitter::new().render(&specialization)?;
//! # Ok::<(), rwmap_core::Error>(())
//! ```

pub mod emitter;
pub mod error;
pub mod options;
pub mod registry;
pub mod rewrite;
pub mod specializer;
pub mod template;
pub mod type_expr;

pub use emitter::{default_output_path, Emitter, GENERATED_HEADER};
pub use error::{Drift, Error, Result};
pub use options::{Extension, SpecializeOptions};
pub use specializer::{Specialization, Specializer, Stage};
pub use template::Template;
pub use type_expr::{MapArgument, TypeExpr};

/// Specializes the template and renders the result in one go.
pub fn generate(options: SpecializeOptions) -> Result<String> {
    let specialization = Specializer::new(options).specialize()?;
    Emitter::new().render(&specialization)
}
