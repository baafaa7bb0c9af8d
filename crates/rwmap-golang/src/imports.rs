//! Import bookkeeping: which packages a file actually uses, and the import
//! block that matches that usage.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::{debug, warn};

use crate::ast::*;
use crate::visit::{walk_expr, walk_type, Visit};

/// Package name to import path table used to add missing imports.
#[derive(Debug, Clone)]
pub struct KnownPackages {
    paths: BTreeMap<String, String>,
}

impl Default for KnownPackages {
    fn default() -> Self {
        let mut known = Self {
            paths: BTreeMap::new(),
        };
        for path in [
            "bufio",
            "bytes",
            "context",
            "encoding/binary",
            "encoding/json",
            "errors",
            "fmt",
            "io",
            "math",
            "os",
            "reflect",
            "sort",
            "strconv",
            "strings",
            "sync",
            "sync/atomic",
            "time",
            "unsafe",
        ] {
            known.insert(package_name_for_path(path), path);
        }
        known.insert("jsoniter", "github.com/json-iterator/go");
        known
    }
}

impl KnownPackages {
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.paths.insert(name.into(), path.into());
    }

    pub fn path_for(&self, name: &str) -> Option<&str> {
        self.paths.get(name).map(String::as_str)
    }

    /// Name a package is referred to by when imported without an alias.
    pub fn name_for_path(&self, path: &str) -> String {
        self.paths
            .iter()
            .find(|(_, known)| known.as_str() == path)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| package_name_for_path(path))
    }
}

/// Best guess at the package name of an import path: its last segment, minus
/// a `go-` prefix, `-go` suffix or `vN` major version segment.
pub fn package_name_for_path(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    let is_major_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    if is_major_version {
        last = segments.next().unwrap_or(last);
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.strip_suffix("-go").unwrap_or(last);
    last.replace(['-', '.'], "_")
}

/// Standard library paths have no dot in their first segment.
pub fn is_standard_library(path: &str) -> bool {
    path.split('/').next().is_some_and(|first| !first.contains('.'))
}

/// Package qualifiers used by the file: `pkg.Name` types and `pkg.Sel`
/// selectors whose base does not resolve to a local or package object.
pub fn used_packages(file: &File) -> BTreeSet<String> {
    struct Qualifiers(BTreeSet<String>);

    impl Visit for Qualifiers {
        fn visit_type(&mut self, ty: &Type) {
            if let TypeKind::Qualified { package, .. } = &ty.kind {
                self.0.insert(package.name.clone());
            }
            walk_type(self, ty)
        }

        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Selector { x, .. } = &expr.kind {
                if let Some(base) = x.as_ident() {
                    if base.obj.is_none() {
                        self.0.insert(base.name.clone());
                    }
                }
            }
            walk_expr(self, expr)
        }
    }

    let mut qualifiers = Qualifiers(BTreeSet::new());
    qualifiers.visit_file(file);
    qualifiers.0
}

/// Add an unaliased import unless the path is already imported.
pub fn add_import(file: &mut File, path: &str) -> bool {
    if file.imports.iter().any(|spec| spec.path == path) {
        return false;
    }
    file.imports.push(ImportSpec::new(path));
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Drop unused imports, add imports for known qualifiers that are used but not
/// imported, and sort what remains: standard library first, then the rest.
///
/// Blank (`_`) and dot imports are always kept.
pub fn normalize_imports(file: &mut File, known: &KnownPackages) -> ImportChanges {
    let used = used_packages(file);
    let mut changes = ImportChanges::default();

    let imported_name = |spec: &ImportSpec| match &spec.name {
        Some(alias) => alias.name.clone(),
        None => known.name_for_path(&spec.path),
    };

    let mut kept = Vec::new();
    for spec in file.imports.drain(..) {
        let name = imported_name(&spec);
        if name == "_" || name == "." || used.contains(&name) {
            kept.push(spec);
        } else {
            debug!(path = %spec.path, "dropping unused import");
            changes.removed.push(spec.path);
        }
    }

    let imported: BTreeSet<String> = kept.iter().map(imported_name).collect();
    for name in used.difference(&imported) {
        match known.path_for(name) {
            Some(path) => {
                debug!(package = %name, path, "adding missing import");
                changes.added.push(path.to_string());
                kept.push(ImportSpec::new(path));
            }
            None => warn!(package = %name, "no import path known for package qualifier"),
        }
    }

    file.imports = kept
        .into_iter()
        .sorted_by(|a, b| {
            (!is_standard_library(&a.path), &a.path).cmp(&(!is_standard_library(&b.path), &b.path))
        })
        .dedup_by(|a, b| a.path == b.path && a.name == b.name)
        .collect();
    changes
}
