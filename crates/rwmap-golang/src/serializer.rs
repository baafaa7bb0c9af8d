//! Go source serializer.
//!
//! Output follows gofmt conventions: tab indentation, aligned struct field
//! columns, binary operator spacing chosen by expression depth the way
//! `go/printer` does it, and single blank lines kept between statements that
//! were separated in the parsed source.

use itertools::Itertools;

use crate::ast::*;
use crate::imports::is_standard_library;

/// Public entry point used to render files and fragments.
#[derive(Clone, Debug, Default)]
pub struct GoSerializer;

impl GoSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize_file(&self, file: &File) -> String {
        let mut emitter = GoEmitter::new(0);
        emitter.emit_file(file);
        emitter.finish()
    }

    pub fn type_to_string(&self, ty: &Type) -> String {
        GoEmitter::new(0).ty(ty)
    }

    pub fn expr_to_string(&self, expr: &Expr) -> String {
        GoEmitter::new(0).expr(expr)
    }
}

struct GoEmitter {
    code: String,
    indent: usize,
}

impl GoEmitter {
    fn new(indent: usize) -> Self {
        Self {
            code: String::new(),
            indent,
        }
    }

    fn finish(self) -> String {
        let mut code = self.code.trim_end().to_string();
        code.push('\n');
        code
    }

    fn push_line(&mut self, line: &str) {
        if line.is_empty() {
            self.code.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.code.push('\t');
        }
        self.code.push_str(line);
        self.code.push('\n');
    }

    fn tabs(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn emit_file(&mut self, file: &File) {
        self.push_line(&format!("package {}", file.package));
        self.emit_imports(&file.imports);
        for decl in &file.decls {
            self.push_line("");
            self.emit_decl(decl);
        }
    }

    fn emit_imports(&mut self, imports: &[ImportSpec]) {
        let render = |spec: &ImportSpec| match &spec.name {
            Some(name) => format!("{name} \"{}\"", spec.path),
            None => format!("\"{}\"", spec.path),
        };
        match imports {
            [] => {}
            [single] => {
                self.push_line("");
                self.push_line(&format!("import {}", render(single)));
            }
            _ => {
                self.push_line("");
                self.push_line("import (");
                let (std, other): (Vec<&ImportSpec>, Vec<&ImportSpec>) = imports
                    .iter()
                    .partition(|spec| is_standard_library(&spec.path));
                self.indent += 1;
                for spec in &std {
                    self.push_line(&render(spec));
                }
                if !std.is_empty() && !other.is_empty() {
                    self.push_line("");
                }
                for spec in &other {
                    self.push_line(&render(spec));
                }
                self.indent -= 1;
                self.push_line(")");
            }
        }
    }

    fn emit_doc(&mut self, doc: &[String]) {
        for line in doc {
            self.push_line(line);
        }
    }

    fn emit_decl(&mut self, decl: &Decl) {
        self.emit_doc(decl.doc());
        match decl {
            Decl::Type(spec) => self.emit_type_spec(spec),
            Decl::Func(func) => self.emit_func_decl(func),
            Decl::Value(spec) => {
                let line = self.value_spec(spec);
                self.push_line(&line);
            }
        }
    }

    fn emit_type_spec(&mut self, spec: &TypeSpec) {
        let assign = if spec.alias { "= " } else { "" };
        let head = format!("type {} {assign}", spec.name);
        match &spec.ty.kind {
            TypeKind::Struct(fields) if !fields.is_empty() => {
                self.push_line(&format!("{head}struct {{"));
                self.indent += 1;
                for line in self.struct_field_lines(fields) {
                    self.push_line(&line);
                }
                self.indent -= 1;
                self.push_line("}");
            }
            TypeKind::Interface(elems) if !elems.is_empty() => {
                self.push_line(&format!("{head}interface {{"));
                self.indent += 1;
                for elem in elems {
                    let line = self.interface_elem(elem);
                    self.push_line(&line);
                }
                self.indent -= 1;
                self.push_line("}");
            }
            _ => {
                let line = format!("{head}{}", self.ty(&spec.ty));
                self.push_line(&line);
            }
        }
    }

    /// One line per field with the name and type columns aligned.
    fn struct_field_lines(&self, fields: &[Field]) -> Vec<String> {
        let names: Vec<String> = fields
            .iter()
            .map(|field| field.names.iter().join(", "))
            .collect();
        let types: Vec<String> = fields.iter().map(|field| self.ty(&field.ty)).collect();
        let name_width = names.iter().map(String::len).max().unwrap_or(0);
        let type_width = fields
            .iter()
            .zip(&names)
            .zip(&types)
            .filter(|((field, _), _)| field.tag.is_some())
            .map(|((_, name), ty)| {
                if name.is_empty() {
                    ty.len()
                } else {
                    name_width + 1 + ty.len()
                }
            })
            .max()
            .unwrap_or(0);

        fields
            .iter()
            .zip(names)
            .zip(types)
            .map(|((field, name), ty)| {
                let column = if name.is_empty() {
                    ty
                } else {
                    format!("{name:<name_width$} {ty}")
                };
                match &field.tag {
                    Some(tag) => format!("{column:<type_width$} {tag}"),
                    None => column,
                }
            })
            .collect()
    }

    fn interface_elem(&self, elem: &InterfaceElem) -> String {
        match elem {
            InterfaceElem::Method { name, ty } => format!("{name}{}", self.signature(ty)),
            InterfaceElem::Embed(ty) => self.ty(ty),
        }
    }

    fn value_spec(&self, spec: &ValueSpec) -> String {
        let mut line = format!("{} {}", spec.keyword.as_str(), spec.names.iter().join(", "));
        if let Some(ty) = &spec.ty {
            line.push(' ');
            line.push_str(&self.ty(ty));
        }
        if !spec.values.is_empty() {
            line.push_str(" = ");
            line.push_str(&self.expr_list(&spec.values, 1));
        }
        line
    }

    fn emit_func_decl(&mut self, func: &FuncDecl) {
        let recv = match &func.recv {
            Some(recv) => format!("{} ", self.params(recv)),
            None => String::new(),
        };
        let head = format!("func {recv}{}{}", func.name, self.signature(&func.ty));
        match &func.body {
            None => self.push_line(&head),
            Some(body) if body.stmts.is_empty() => self.push_line(&format!("{head} {{}}")),
            Some(body) => {
                self.push_line(&format!("{head} {{"));
                self.emit_stmts(&body.stmts);
                self.push_line("}");
            }
        }
    }

    fn params(&self, list: &FieldList) -> String {
        let params = list
            .list
            .iter()
            .map(|field| {
                let ellipsis = if field.variadic { "..." } else { "" };
                let ty = self.ty(&field.ty);
                if field.names.is_empty() {
                    format!("{ellipsis}{ty}")
                } else {
                    format!("{} {ellipsis}{ty}", field.names.iter().join(", "))
                }
            })
            .join(", ");
        format!("({params})")
    }

    /// Parameters and results, without the `func` keyword.
    fn signature(&self, ty: &FuncType) -> String {
        let params = self.params(&ty.params);
        match &ty.results {
            None => params,
            Some(results) if results.list.is_empty() => params,
            Some(results) => match results.list.as_slice() {
                [single] if single.names.is_empty() => format!("{params} {}", self.ty(&single.ty)),
                _ => format!("{params} {}", self.params(results)),
            },
        }
    }

    fn ty(&self, ty: &Type) -> String {
        match &ty.kind {
            TypeKind::Name(ident) => ident.name.clone(),
            TypeKind::Qualified { package, name } => format!("{package}.{name}"),
            TypeKind::Pointer(elem) => format!("*{}", self.ty(elem)),
            TypeKind::Slice(elem) => format!("[]{}", self.ty(elem)),
            TypeKind::Array { len, elem } => match len {
                Some(len) => format!("[{}]{}", self.expr(len), self.ty(elem)),
                None => format!("[...]{}", self.ty(elem)),
            },
            TypeKind::Map { key, value } => format!("map[{}]{}", self.ty(key), self.ty(value)),
            TypeKind::Chan { dir, elem } => match dir {
                ChanDir::Both => format!("chan {}", self.ty(elem)),
                ChanDir::Send => format!("chan<- {}", self.ty(elem)),
                ChanDir::Recv => format!("<-chan {}", self.ty(elem)),
            },
            TypeKind::Func(func) => format!("func{}", self.signature(func)),
            TypeKind::Interface(elems) if elems.is_empty() => "interface{}".to_string(),
            TypeKind::Interface(elems) => format!(
                "interface{{ {} }}",
                elems.iter().map(|elem| self.interface_elem(elem)).join("; ")
            ),
            TypeKind::Struct(fields) if fields.is_empty() => "struct{}".to_string(),
            TypeKind::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|field| {
                        let ty = self.ty(&field.ty);
                        let mut text = if field.names.is_empty() {
                            ty
                        } else {
                            format!("{} {ty}", field.names.iter().join(", "))
                        };
                        if let Some(tag) = &field.tag {
                            text.push(' ');
                            text.push_str(tag);
                        }
                        text
                    })
                    .join("; ");
                format!("struct{{ {fields} }}")
            }
            TypeKind::Generic { base, args } => format!(
                "{}[{}]",
                self.ty(base),
                args.iter().map(|arg| self.ty(arg)).join(", ")
            ),
            TypeKind::Paren(inner) => format!("({})", self.ty(inner)),
        }
    }

    fn emit_stmts(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        let mut prev_end: Option<u32> = None;
        for stmt in stmts {
            if let Some(end) = prev_end {
                if !stmt.span.is_null() && stmt.span.line > end + 1 {
                    self.push_line("");
                }
            }
            self.emit_stmt(stmt);
            prev_end = (!stmt.span.is_null()).then_some(stmt.span.end_line);
        }
        self.indent -= 1;
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::If { .. } => self.emit_if(stmt, ""),
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                let header = match (init, cond, post) {
                    (None, None, None) => "for {".to_string(),
                    (None, Some(cond), None) => format!("for {} {{", self.expr(cond)),
                    _ => {
                        let init = init.as_deref().map(|s| self.simple_stmt(s)).unwrap_or_default();
                        let cond = cond.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                        let post = post.as_deref().map(|s| self.simple_stmt(s)).unwrap_or_default();
                        format!("for {init}; {cond}; {post} {{")
                    }
                };
                self.push_line(&header);
                self.emit_stmts(&body.stmts);
                self.push_line("}");
            }
            StmtKind::Range {
                key,
                value,
                define,
                x,
                body,
            } => {
                let targets = [key, value]
                    .into_iter()
                    .flatten()
                    .map(|target| self.expr(target))
                    .join(", ");
                let header = if targets.is_empty() {
                    format!("for range {} {{", self.expr(x))
                } else {
                    let op = if *define { ":=" } else { "=" };
                    format!("for {targets} {op} range {} {{", self.expr(x))
                };
                self.push_line(&header);
                self.emit_stmts(&body.stmts);
                self.push_line("}");
            }
            StmtKind::Block(block) => {
                self.push_line("{");
                self.emit_stmts(&block.stmts);
                self.push_line("}");
            }
            _ => {
                let line = self.simple_stmt(stmt);
                self.push_line(&line);
            }
        }
    }

    fn emit_if(&mut self, stmt: &Stmt, prefix: &str) {
        let StmtKind::If {
            init,
            cond,
            then,
            els,
        } = &stmt.kind
        else {
            return;
        };
        let init = match init {
            Some(init) => format!("{}; ", self.simple_stmt(init)),
            None => String::new(),
        };
        let header = format!("{prefix}if {init}{} {{", self.expr(cond));
        self.push_line(&header);
        self.emit_stmts(&then.stmts);
        match els.as_deref() {
            None => self.push_line("}"),
            Some(els) => match &els.kind {
                StmtKind::If { .. } => self.emit_if(els, "} else "),
                StmtKind::Block(block) => {
                    self.push_line("} else {");
                    self.emit_stmts(&block.stmts);
                    self.push_line("}");
                }
                _ => {
                    self.push_line("} else {");
                    self.indent += 1;
                    self.emit_stmt(els);
                    self.indent -= 1;
                    self.push_line("}");
                }
            },
        }
    }

    /// Statements that fit on one line, also used in `if` and `for` headers.
    fn simple_stmt(&self, stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.expr0(expr, 1),
            StmtKind::Assign { lhs, op, rhs } => {
                let depth = if lhs.len() > 1 && rhs.len() > 1 { 2 } else { 1 };
                format!(
                    "{} {op} {}",
                    self.expr_list(lhs, depth),
                    self.expr_list(rhs, depth)
                )
            }
            StmtKind::IncDec { x, inc } => {
                format!("{}{}", self.expr0(x, 2), if *inc { "++" } else { "--" })
            }
            StmtKind::Return(results) if results.is_empty() => "return".to_string(),
            StmtKind::Return(results) => format!("return {}", self.expr_list(results, 1)),
            StmtKind::Defer(call) => format!("defer {}", self.expr(call)),
            StmtKind::Go(call) => format!("go {}", self.expr(call)),
            StmtKind::Branch { keyword, label } => match label {
                Some(label) => format!("{keyword} {label}"),
                None => keyword.clone(),
            },
            StmtKind::Decl(spec) => self.value_spec(spec),
            StmtKind::Comment(text) => text.clone(),
            StmtKind::If { .. }
            | StmtKind::For { .. }
            | StmtKind::Range { .. }
            | StmtKind::Block(_) => {
                let mut nested = GoEmitter::new(self.indent);
                nested.emit_stmt(stmt);
                nested.code.trim().to_string()
            }
        }
    }

    fn expr_list(&self, exprs: &[Expr], depth: usize) -> String {
        exprs.iter().map(|expr| self.expr0(expr, depth)).join(", ")
    }

    fn expr(&self, expr: &Expr) -> String {
        self.expr1(expr, 0, 1)
    }

    fn expr0(&self, expr: &Expr, depth: usize) -> String {
        self.expr1(expr, 0, depth)
    }

    fn expr1(&self, expr: &Expr, prec1: u8, depth: usize) -> String {
        match &expr.kind {
            ExprKind::Ident(ident) => ident.name.clone(),
            ExprKind::Lit(lit) => lit.value.clone(),
            ExprKind::Binary { op, x, y } => {
                let prec = binary_precedence(op);
                if prec < prec1 {
                    return format!("({})", self.expr0(expr, reduce_depth(depth)));
                }
                let blank = prec < cutoff(op, x, y, depth);
                let left = self.expr1(x, prec, depth + diff_prec(x, prec));
                let right = self.expr1(y, prec + 1, depth + 1);
                if blank {
                    format!("{left} {op} {right}")
                } else {
                    format!("{left}{op}{right}")
                }
            }
            ExprKind::Unary { op, x } => {
                if UNARY_PRECEDENCE < prec1 {
                    format!("({})", self.expr(expr))
                } else {
                    format!("{op}{}", self.expr1(x, UNARY_PRECEDENCE, depth))
                }
            }
            ExprKind::KeyValue { key, value } => {
                format!("{}: {}", self.expr(key), self.expr(value))
            }
            ExprKind::Paren(inner) => match &inner.kind {
                ExprKind::Paren(_) => self.expr0(inner, depth),
                _ => format!("({})", self.expr0(inner, reduce_depth(depth))),
            },
            ExprKind::Selector { x, sel } => {
                format!("{}.{sel}", self.expr1(x, HIGHEST_PRECEDENCE, depth))
            }
            ExprKind::TypeAssert { x, ty } => {
                let ty = ty.as_ref().map(|ty| self.ty(ty)).unwrap_or_else(|| "type".to_string());
                format!("{}.({ty})", self.expr1(x, HIGHEST_PRECEDENCE, depth))
            }
            ExprKind::Index { x, index } => format!(
                "{}[{}]",
                self.expr1(x, HIGHEST_PRECEDENCE, 1),
                self.expr0(index, depth + 1)
            ),
            ExprKind::Slice { x, low, high, max } => {
                let mut indices = vec![low.as_deref(), high.as_deref()];
                if max.is_some() {
                    indices.push(max.as_deref());
                }
                let present = indices.iter().flatten().count();
                let has_binary = indices
                    .iter()
                    .flatten()
                    .any(|index| matches!(index.kind, ExprKind::Binary { .. }));
                let blanks = depth <= 1 && present > 1 && has_binary;

                let mut text = format!("{}[", self.expr1(x, HIGHEST_PRECEDENCE, 1));
                for (idx, index) in indices.iter().enumerate() {
                    if idx > 0 {
                        if indices[idx - 1].is_some() && blanks {
                            text.push(' ');
                        }
                        text.push(':');
                        if index.is_some() && blanks {
                            text.push(' ');
                        }
                    }
                    if let Some(index) = index {
                        text.push_str(&self.expr0(index, depth + 1));
                    }
                }
                text.push(']');
                text
            }
            ExprKind::Call {
                fun,
                args,
                ellipsis,
            } => {
                let depth = if args.len() > 1 { depth + 1 } else { depth };
                let fun = match &fun.kind {
                    ExprKind::Type(Type {
                        kind: TypeKind::Func(_),
                        ..
                    }) => format!("({})", self.expr1(fun, HIGHEST_PRECEDENCE, depth)),
                    _ => self.expr1(fun, HIGHEST_PRECEDENCE, depth),
                };
                let ellipsis = if *ellipsis { "..." } else { "" };
                format!("{fun}({}{ellipsis})", self.expr_list(args, depth))
            }
            ExprKind::Composite { ty, elts } => {
                let ty = ty.as_ref().map(|ty| self.ty(ty)).unwrap_or_default();
                let multiline = !expr.span.is_null()
                    && elts.iter().any(|elt| elt.span.line > expr.span.line);
                if !multiline {
                    return format!("{ty}{{{}}}", self.expr_list(elts, 1));
                }
                let inner = GoEmitter::new(self.indent + 1);
                let mut text = format!("{ty}{{\n");
                for elt in elts {
                    text.push_str(&inner.tabs());
                    text.push_str(&inner.expr(elt));
                    text.push_str(",\n");
                }
                text.push_str(&self.tabs());
                text.push('}');
                text
            }
            ExprKind::FuncLit { ty, body } => {
                let signature = self.signature(ty);
                if body.stmts.is_empty() {
                    return format!("func{signature} {{}}");
                }
                let mut inner = GoEmitter::new(self.indent);
                inner.emit_stmts(&body.stmts);
                format!("func{signature} {{\n{}{}}}", inner.code, self.tabs())
            }
            ExprKind::Type(ty) => self.ty(ty),
        }
    }
}

fn reduce_depth(depth: usize) -> usize {
    depth.saturating_sub(1).max(1)
}

fn diff_prec(expr: &Expr, prec: u8) -> usize {
    match &expr.kind {
        ExprKind::Binary { op, .. } if binary_precedence(op) == prec => 0,
        _ => 1,
    }
}

/// Precedence at and above which operators are printed without surrounding
/// blanks.
fn cutoff(op: &str, x: &Expr, y: &Expr, depth: usize) -> u8 {
    let (has4, has5, max_problem) = walk_binary(op, x, y);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (true, false) => 4,
        (false, true) => 6,
        (false, false) => 4,
    }
}

fn walk_binary(op: &str, x: &Expr, y: &Expr) -> (bool, bool, u8) {
    let prec = binary_precedence(op);
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let ExprKind::Binary { op: lop, x: lx, y: ly } = &x.kind {
        if binary_precedence(lop) >= prec {
            let (h4, h5, problem) = walk_binary(lop, lx, ly);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(problem);
        }
    }

    match &y.kind {
        ExprKind::Binary { op: rop, x: rx, y: ry } => {
            if binary_precedence(rop) > prec {
                let (h4, h5, problem) = walk_binary(rop, rx, ry);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(problem);
            }
        }
        ExprKind::Unary { op: uop, .. } => match format!("{op}{uop}").as_str() {
            "/*" | "&&" | "&^" => max_problem = 5,
            "++" | "--" => max_problem = max_problem.max(4),
            _ => {}
        },
        _ => {}
    }
    (has4, has5, max_problem)
}
