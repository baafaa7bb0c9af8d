//! Visitors over the Go syntax tree.
//!
//! [`VisitMut`] is the mutable traversal used by every rewrite; [`Visit`] is
//! its read-only twin used for queries such as counting placeholders or
//! collecting package qualifiers. Each `visit_*` hook defaults to the matching
//! `walk_*` function, so an implementation overrides only the nodes it cares
//! about and calls `walk_*` itself when it still wants to descend.
//!
//! Selector field names (`x.field`) and branch labels are not identifier
//! references and are not reported through `visit_ident`.

use crate::ast::*;

pub trait VisitMut {
    fn visit_file_mut(&mut self, file: &mut File) {
        walk_file_mut(self, file)
    }
    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl)
    }
    fn visit_type_spec_mut(&mut self, spec: &mut TypeSpec) {
        walk_type_spec_mut(self, spec)
    }
    fn visit_func_decl_mut(&mut self, func: &mut FuncDecl) {
        walk_func_decl_mut(self, func)
    }
    fn visit_value_spec_mut(&mut self, spec: &mut ValueSpec) {
        walk_value_spec_mut(self, spec)
    }
    fn visit_func_type_mut(&mut self, ty: &mut FuncType) {
        walk_func_type_mut(self, ty)
    }
    fn visit_field_list_mut(&mut self, list: &mut FieldList) {
        walk_field_list_mut(self, list)
    }
    fn visit_field_mut(&mut self, field: &mut Field) {
        walk_field_mut(self, field)
    }
    fn visit_type_mut(&mut self, ty: &mut Type) {
        walk_type_mut(self, ty)
    }
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr)
    }
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt)
    }
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block)
    }
    fn visit_ident_mut(&mut self, _ident: &mut Ident) {}
}

pub fn walk_file_mut<V: VisitMut + ?Sized>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        v.visit_decl_mut(decl);
    }
}

pub fn walk_decl_mut<V: VisitMut + ?Sized>(v: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Type(spec) => v.visit_type_spec_mut(spec),
        Decl::Func(func) => v.visit_func_decl_mut(func),
        Decl::Value(spec) => v.visit_value_spec_mut(spec),
    }
}

pub fn walk_type_spec_mut<V: VisitMut + ?Sized>(v: &mut V, spec: &mut TypeSpec) {
    v.visit_ident_mut(&mut spec.name);
    v.visit_type_mut(&mut spec.ty);
}

pub fn walk_func_decl_mut<V: VisitMut + ?Sized>(v: &mut V, func: &mut FuncDecl) {
    if let Some(recv) = &mut func.recv {
        v.visit_field_list_mut(recv);
    }
    v.visit_ident_mut(&mut func.name);
    v.visit_func_type_mut(&mut func.ty);
    if let Some(body) = &mut func.body {
        v.visit_block_mut(body);
    }
}

pub fn walk_value_spec_mut<V: VisitMut + ?Sized>(v: &mut V, spec: &mut ValueSpec) {
    for name in &mut spec.names {
        v.visit_ident_mut(name);
    }
    if let Some(ty) = &mut spec.ty {
        v.visit_type_mut(ty);
    }
    for value in &mut spec.values {
        v.visit_expr_mut(value);
    }
}

pub fn walk_func_type_mut<V: VisitMut + ?Sized>(v: &mut V, ty: &mut FuncType) {
    v.visit_field_list_mut(&mut ty.params);
    if let Some(results) = &mut ty.results {
        v.visit_field_list_mut(results);
    }
}

pub fn walk_field_list_mut<V: VisitMut + ?Sized>(v: &mut V, list: &mut FieldList) {
    for field in &mut list.list {
        v.visit_field_mut(field);
    }
}

pub fn walk_field_mut<V: VisitMut + ?Sized>(v: &mut V, field: &mut Field) {
    for name in &mut field.names {
        v.visit_ident_mut(name);
    }
    v.visit_type_mut(&mut field.ty);
}

pub fn walk_type_mut<V: VisitMut + ?Sized>(v: &mut V, ty: &mut Type) {
    match &mut ty.kind {
        TypeKind::Name(ident) => v.visit_ident_mut(ident),
        TypeKind::Qualified { .. } => {}
        TypeKind::Pointer(elem) | TypeKind::Slice(elem) | TypeKind::Paren(elem) => {
            v.visit_type_mut(elem)
        }
        TypeKind::Array { len, elem } => {
            if let Some(len) = len {
                v.visit_expr_mut(len);
            }
            v.visit_type_mut(elem);
        }
        TypeKind::Map { key, value } => {
            v.visit_type_mut(key);
            v.visit_type_mut(value);
        }
        TypeKind::Chan { elem, .. } => v.visit_type_mut(elem),
        TypeKind::Func(func) => v.visit_func_type_mut(func),
        TypeKind::Interface(elems) => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { name, ty } => {
                        v.visit_ident_mut(name);
                        v.visit_func_type_mut(ty);
                    }
                    InterfaceElem::Embed(ty) => v.visit_type_mut(ty),
                }
            }
        }
        TypeKind::Struct(fields) => {
            for field in fields {
                v.visit_field_mut(field);
            }
        }
        TypeKind::Generic { base, args } => {
            v.visit_type_mut(base);
            for arg in args {
                v.visit_type_mut(arg);
            }
        }
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Ident(ident) => v.visit_ident_mut(ident),
        ExprKind::Lit(_) => {}
        ExprKind::Composite { ty, elts } => {
            if let Some(ty) = ty {
                v.visit_type_mut(ty);
            }
            for elt in elts {
                v.visit_expr_mut(elt);
            }
        }
        ExprKind::KeyValue { key, value } => {
            v.visit_expr_mut(key);
            v.visit_expr_mut(value);
        }
        ExprKind::FuncLit { ty, body } => {
            v.visit_func_type_mut(ty);
            v.visit_block_mut(body);
        }
        ExprKind::Paren(x) => v.visit_expr_mut(x),
        ExprKind::Selector { x, .. } => v.visit_expr_mut(x),
        ExprKind::Index { x, index } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(index);
        }
        ExprKind::Slice { x, low, high, max } => {
            v.visit_expr_mut(x);
            for bound in [low, high, max].into_iter().flatten() {
                v.visit_expr_mut(bound);
            }
        }
        ExprKind::TypeAssert { x, ty } => {
            v.visit_expr_mut(x);
            if let Some(ty) = ty {
                v.visit_type_mut(ty);
            }
        }
        ExprKind::Call { fun, args, .. } => {
            v.visit_expr_mut(fun);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        ExprKind::Unary { x, .. } => v.visit_expr_mut(x),
        ExprKind::Binary { x, y, .. } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(y);
        }
        ExprKind::Type(ty) => v.visit_type_mut(ty),
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr(expr) | StmtKind::Defer(expr) | StmtKind::Go(expr) => v.visit_expr_mut(expr),
        StmtKind::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter_mut().chain(rhs.iter_mut()) {
                v.visit_expr_mut(expr);
            }
        }
        StmtKind::IncDec { x, .. } => v.visit_expr_mut(x),
        StmtKind::Return(results) => {
            for expr in results {
                v.visit_expr_mut(expr);
            }
        }
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(cond);
            v.visit_block_mut(then);
            if let Some(els) = els {
                v.visit_stmt_mut(els);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(cond) = cond {
                v.visit_expr_mut(cond);
            }
            if let Some(post) = post {
                v.visit_stmt_mut(post);
            }
            v.visit_block_mut(body);
        }
        StmtKind::Range {
            key, value, x, body, ..
        } => {
            for target in [key, value].into_iter().flatten() {
                v.visit_expr_mut(target);
            }
            v.visit_expr_mut(x);
            v.visit_block_mut(body);
        }
        StmtKind::Branch { .. } | StmtKind::Comment(_) => {}
        StmtKind::Block(block) => v.visit_block_mut(block),
        StmtKind::Decl(spec) => v.visit_value_spec_mut(spec),
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub trait Visit {
    fn visit_file(&mut self, file: &File) {
        walk_file(self, file)
    }
    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl)
    }
    fn visit_type_spec(&mut self, spec: &TypeSpec) {
        walk_type_spec(self, spec)
    }
    fn visit_func_decl(&mut self, func: &FuncDecl) {
        walk_func_decl(self, func)
    }
    fn visit_value_spec(&mut self, spec: &ValueSpec) {
        walk_value_spec(self, spec)
    }
    fn visit_func_type(&mut self, ty: &FuncType) {
        walk_func_type(self, ty)
    }
    fn visit_field_list(&mut self, list: &FieldList) {
        walk_field_list(self, list)
    }
    fn visit_field(&mut self, field: &Field) {
        walk_field(self, field)
    }
    fn visit_type(&mut self, ty: &Type) {
        walk_type(self, ty)
    }
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block)
    }
    fn visit_ident(&mut self, _ident: &Ident) {}
}

pub fn walk_file<V: Visit + ?Sized>(v: &mut V, file: &File) {
    for decl in &file.decls {
        v.visit_decl(decl);
    }
}

pub fn walk_decl<V: Visit + ?Sized>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Type(spec) => v.visit_type_spec(spec),
        Decl::Func(func) => v.visit_func_decl(func),
        Decl::Value(spec) => v.visit_value_spec(spec),
    }
}

pub fn walk_type_spec<V: Visit + ?Sized>(v: &mut V, spec: &TypeSpec) {
    v.visit_ident(&spec.name);
    v.visit_type(&spec.ty);
}

pub fn walk_func_decl<V: Visit + ?Sized>(v: &mut V, func: &FuncDecl) {
    if let Some(recv) = &func.recv {
        v.visit_field_list(recv);
    }
    v.visit_ident(&func.name);
    v.visit_func_type(&func.ty);
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

pub fn walk_value_spec<V: Visit + ?Sized>(v: &mut V, spec: &ValueSpec) {
    for name in &spec.names {
        v.visit_ident(name);
    }
    if let Some(ty) = &spec.ty {
        v.visit_type(ty);
    }
    for value in &spec.values {
        v.visit_expr(value);
    }
}

pub fn walk_func_type<V: Visit + ?Sized>(v: &mut V, ty: &FuncType) {
    v.visit_field_list(&ty.params);
    if let Some(results) = &ty.results {
        v.visit_field_list(results);
    }
}

pub fn walk_field_list<V: Visit + ?Sized>(v: &mut V, list: &FieldList) {
    for field in &list.list {
        v.visit_field(field);
    }
}

pub fn walk_field<V: Visit + ?Sized>(v: &mut V, field: &Field) {
    for name in &field.names {
        v.visit_ident(name);
    }
    v.visit_type(&field.ty);
}

pub fn walk_type<V: Visit + ?Sized>(v: &mut V, ty: &Type) {
    match &ty.kind {
        TypeKind::Name(ident) => v.visit_ident(ident),
        TypeKind::Qualified { .. } => {}
        TypeKind::Pointer(elem) | TypeKind::Slice(elem) | TypeKind::Paren(elem) => v.visit_type(elem),
        TypeKind::Array { len, elem } => {
            if let Some(len) = len {
                v.visit_expr(len);
            }
            v.visit_type(elem);
        }
        TypeKind::Map { key, value } => {
            v.visit_type(key);
            v.visit_type(value);
        }
        TypeKind::Chan { elem, .. } => v.visit_type(elem),
        TypeKind::Func(func) => v.visit_func_type(func),
        TypeKind::Interface(elems) => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { name, ty } => {
                        v.visit_ident(name);
                        v.visit_func_type(ty);
                    }
                    InterfaceElem::Embed(ty) => v.visit_type(ty),
                }
            }
        }
        TypeKind::Struct(fields) => {
            for field in fields {
                v.visit_field(field);
            }
        }
        TypeKind::Generic { base, args } => {
            v.visit_type(base);
            for arg in args {
                v.visit_type(arg);
            }
        }
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Ident(ident) => v.visit_ident(ident),
        ExprKind::Lit(_) => {}
        ExprKind::Composite { ty, elts } => {
            if let Some(ty) = ty {
                v.visit_type(ty);
            }
            for elt in elts {
                v.visit_expr(elt);
            }
        }
        ExprKind::KeyValue { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
        ExprKind::FuncLit { ty, body } => {
            v.visit_func_type(ty);
            v.visit_block(body);
        }
        ExprKind::Paren(x) => v.visit_expr(x),
        ExprKind::Selector { x, .. } => v.visit_expr(x),
        ExprKind::Index { x, index } => {
            v.visit_expr(x);
            v.visit_expr(index);
        }
        ExprKind::Slice { x, low, high, max } => {
            v.visit_expr(x);
            for bound in [low, high, max].into_iter().flatten() {
                v.visit_expr(bound);
            }
        }
        ExprKind::TypeAssert { x, ty } => {
            v.visit_expr(x);
            if let Some(ty) = ty {
                v.visit_type(ty);
            }
        }
        ExprKind::Call { fun, args, .. } => {
            v.visit_expr(fun);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Unary { x, .. } => v.visit_expr(x),
        ExprKind::Binary { x, y, .. } => {
            v.visit_expr(x);
            v.visit_expr(y);
        }
        ExprKind::Type(ty) => v.visit_type(ty),
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expr(expr) | StmtKind::Defer(expr) | StmtKind::Go(expr) => v.visit_expr(expr),
        StmtKind::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs.iter()) {
                v.visit_expr(expr);
            }
        }
        StmtKind::IncDec { x, .. } => v.visit_expr(x),
        StmtKind::Return(results) => {
            for expr in results {
                v.visit_expr(expr);
            }
        }
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(els) = els {
                v.visit_stmt(els);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        StmtKind::Range {
            key, value, x, body, ..
        } => {
            for target in [key, value].into_iter().flatten() {
                v.visit_expr(target);
            }
            v.visit_expr(x);
            v.visit_block(body);
        }
        StmtKind::Branch { .. } | StmtKind::Comment(_) => {}
        StmtKind::Block(block) => v.visit_block(block),
        StmtKind::Decl(spec) => v.visit_value_spec(spec),
    }
}

pub fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

/// A syntax node a visitor can be applied to directly, so rewrites can be
/// scoped to any subtree: a whole declaration, one field list, one field.
pub trait Node {
    fn accept<V: Visit + ?Sized>(&self, v: &mut V);
    fn accept_mut<V: VisitMut + ?Sized>(&mut self, v: &mut V);
}

macro_rules! impl_node {
    ($($ty:ty => $visit:ident, $visit_mut:ident;)*) => {
        $(
            impl Node for $ty {
                fn accept<V: Visit + ?Sized>(&self, v: &mut V) {
                    v.$visit(self)
                }
                fn accept_mut<V: VisitMut + ?Sized>(&mut self, v: &mut V) {
                    v.$visit_mut(self)
                }
            }
        )*
    };
}

impl_node! {
    File => visit_file, visit_file_mut;
    Decl => visit_decl, visit_decl_mut;
    TypeSpec => visit_type_spec, visit_type_spec_mut;
    FuncDecl => visit_func_decl, visit_func_decl_mut;
    ValueSpec => visit_value_spec, visit_value_spec_mut;
    FuncType => visit_func_type, visit_func_type_mut;
    FieldList => visit_field_list, visit_field_list_mut;
    Field => visit_field, visit_field_mut;
    Type => visit_type, visit_type_mut;
    Expr => visit_expr, visit_expr_mut;
    Stmt => visit_stmt, visit_stmt_mut;
    Block => visit_block, visit_block_mut;
}
