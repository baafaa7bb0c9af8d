//! Syntax-level identifier resolution.
//!
//! Links every identifier that refers to a package-level declaration or a
//! function-local variable to its [`Object`], the way `go/parser` fills in
//! `ast.Ident.Obj`. No type checking is involved: method names, selector
//! fields and composite literal keys stay unresolved, and identifiers from the
//! universe scope (`int`, `nil`, `make`) have no object.

use std::collections::HashMap;

use tracing::trace;

use crate::ast::*;
use crate::visit::{walk_block_mut, walk_expr_mut, walk_stmt_mut, walk_type_mut, Visit, VisitMut};

/// Rebuild `file.objects` and relink all identifiers.
pub fn resolve_file(file: &mut File) {
    let File { decls, objects, .. } = file;
    *objects = ObjectTable::default();

    let mut package = HashMap::new();
    for decl in decls.iter_mut() {
        let (idents, kind): (Vec<&mut Ident>, ObjKind) = match decl {
            Decl::Type(spec) => (vec![&mut spec.name], ObjKind::Type),
            Decl::Func(func) if func.recv.is_none() => (vec![&mut func.name], ObjKind::Func),
            Decl::Func(_) => continue,
            Decl::Value(spec) => {
                let kind = match spec.keyword {
                    ValueKeyword::Var => ObjKind::Var,
                    ValueKeyword::Const => ObjKind::Const,
                };
                (spec.names.iter_mut().collect(), kind)
            }
        };
        for ident in idents {
            if ident.is_blank() {
                continue;
            }
            let id = objects.insert(Object {
                name: ident.name.clone(),
                kind,
                span: ident.span,
            });
            ident.obj = Some(id);
            package.insert(ident.name.clone(), id);
        }
    }

    let mut resolver = Resolver {
        objects,
        package,
        scopes: Vec::new(),
    };
    for decl in decls.iter_mut() {
        match decl {
            Decl::Type(spec) => resolver.visit_type_mut(&mut spec.ty),
            Decl::Func(func) => resolver.func_decl(func),
            Decl::Value(spec) => resolver.visit_value_spec_mut(spec),
        }
    }
    trace!(objects = resolver.objects.len(), "resolved identifiers");
}

struct Resolver<'a> {
    objects: &'a mut ObjectTable,
    package: HashMap<String, ObjId>,
    scopes: Vec<HashMap<String, ObjId>>,
}

impl Resolver<'_> {
    fn lookup(&self, name: &str) -> Option<ObjId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .or_else(|| self.package.get(name).copied())
    }

    fn declare(&mut self, ident: &mut Ident, kind: ObjKind) {
        if ident.is_blank() {
            return;
        }
        let id = self.objects.insert(Object {
            name: ident.name.clone(),
            kind,
            span: ident.span,
        });
        ident.obj = Some(id);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(ident.name.clone(), id);
        }
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }

    /// Resolve the types of a field list, then declare its names.
    fn declare_fields(&mut self, list: &mut FieldList) {
        for field in &mut list.list {
            self.visit_type_mut(&mut field.ty);
        }
        for field in &mut list.list {
            for name in &mut field.names {
                self.declare(name, ObjKind::Var);
            }
        }
    }

    fn signature(&mut self, ty: &mut FuncType) {
        self.declare_fields(&mut ty.params);
        if let Some(results) = &mut ty.results {
            self.declare_fields(results);
        }
    }

    fn func_decl(&mut self, func: &mut FuncDecl) {
        self.scoped(|this| {
            if let Some(recv) = &mut func.recv {
                this.declare_fields(recv);
            }
            this.signature(&mut func.ty);
            if let Some(body) = &mut func.body {
                walk_block_mut(this, body);
            }
        });
    }
}

impl VisitMut for Resolver<'_> {
    fn visit_ident_mut(&mut self, ident: &mut Ident) {
        ident.obj = self.lookup(&ident.name);
    }

    fn visit_field_mut(&mut self, field: &mut Field) {
        // struct field and interface parameter names are not references
        self.visit_type_mut(&mut field.ty);
    }

    fn visit_func_type_mut(&mut self, ty: &mut FuncType) {
        self.scoped(|this| this.signature(ty));
    }

    fn visit_type_mut(&mut self, ty: &mut Type) {
        if let TypeKind::Interface(elems) = &mut ty.kind {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { ty, .. } => self.visit_func_type_mut(ty),
                    InterfaceElem::Embed(ty) => self.visit_type_mut(ty),
                }
            }
            return;
        }
        walk_type_mut(self, ty)
    }

    fn visit_value_spec_mut(&mut self, spec: &mut ValueSpec) {
        if let Some(ty) = &mut spec.ty {
            self.visit_type_mut(ty);
        }
        for value in &mut spec.values {
            self.visit_expr_mut(value);
        }
        if self.scopes.is_empty() {
            return;
        }
        let kind = match spec.keyword {
            ValueKeyword::Var => ObjKind::Var,
            ValueKeyword::Const => ObjKind::Const,
        };
        for name in &mut spec.names {
            self.declare(name, kind);
        }
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        self.scoped(|this| walk_block_mut(this, block));
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::FuncLit { ty, body } => self.scoped(|this| {
                this.signature(ty);
                walk_block_mut(this, body);
            }),
            ExprKind::KeyValue { key, value } => {
                if key.as_ident().is_none() {
                    self.visit_expr_mut(key);
                }
                self.visit_expr_mut(value);
            }
            _ => walk_expr_mut(self, expr),
        }
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if matches!(stmt.kind, StmtKind::If { .. } | StmtKind::For { .. }) {
            self.scoped(|this| walk_stmt_mut(this, stmt));
            return;
        }
        match &mut stmt.kind {
            StmtKind::Assign { lhs, op, rhs } if op == ":=" => {
                for expr in rhs.iter_mut() {
                    self.visit_expr_mut(expr);
                }
                for expr in lhs.iter_mut() {
                    let ExprKind::Ident(ident) = &mut expr.kind else {
                        self.visit_expr_mut(expr);
                        continue;
                    };
                    let existing = self
                        .scopes
                        .last()
                        .and_then(|scope| scope.get(&ident.name).copied());
                    match existing {
                        Some(id) => ident.obj = Some(id),
                        None => self.declare(ident, ObjKind::Var),
                    }
                }
            }
            StmtKind::Range {
                key,
                value,
                define: true,
                x,
                body,
            } => {
                self.visit_expr_mut(x);
                self.scoped(|this| {
                    for target in [key, value].into_iter().flatten() {
                        match &mut target.kind {
                            ExprKind::Ident(ident) => this.declare(ident, ObjKind::Var),
                            _ => this.visit_expr_mut(target),
                        }
                    }
                    walk_block_mut(this, body);
                });
            }
            _ => walk_stmt_mut(self, stmt),
        }
    }
}

impl File {
    /// Identifiers whose name disagrees with the object they are linked to.
    ///
    /// Always empty for a freshly parsed file; a rename that updates
    /// identifiers without their objects (or the other way round) shows up
    /// here.
    pub fn binding_mismatches(&self) -> Vec<Ident> {
        struct Mismatches<'a> {
            objects: &'a ObjectTable,
            found: Vec<Ident>,
        }

        impl Visit for Mismatches<'_> {
            fn visit_ident(&mut self, ident: &Ident) {
                let Some(id) = ident.obj else {
                    return;
                };
                let matches = self
                    .objects
                    .get(id)
                    .is_some_and(|object| object.name == ident.name);
                if !matches {
                    self.found.push(ident.clone());
                }
            }
        }

        let mut visitor = Mismatches {
            objects: &self.objects,
            found: Vec::new(),
        };
        visitor.visit_file(self);
        visitor.found
    }
}
