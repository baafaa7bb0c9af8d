//! Go parser built on top of `tree-sitter-go`.
//!
//! The concrete syntax tree produced by tree-sitter is lowered into the owned
//! tree in [`crate::ast`]. Lowering is strict: error nodes fail the parse, and
//! syntax outside the supported subset is reported instead of skipped, so a
//! successfully parsed file always prints back to equivalent Go.

use tracing::{debug, trace};
use tree_sitter::{Node as TsNode, Parser as TsParser};

use crate::ast::*;
use crate::error::{GoError, Result};
use crate::resolve::resolve_file;
use crate::span::Span;

/// Prefix used to parse a standalone type expression as a type declaration.
const TYPE_WRAPPER_PREFIX: &str = "package p\n\ntype T ";

/// High-level parser that owns a tree-sitter instance for Go.
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    /// Create a new parser instance with the Go grammar loaded.
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|err| GoError::Language(err.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse a complete Go source file and resolve its identifiers.
    pub fn parse_file(&mut self, source: &str) -> Result<File> {
        let tree = self.parser.parse(source, None).ok_or(GoError::NoTree)?;
        let root = tree.root_node();
        let lowering = Lowering::new(source);
        lowering.check_errors(root)?;

        let mut file = lowering.file(root)?;
        resolve_file(&mut file);
        debug!(
            package = %file.package,
            decls = file.decls.len(),
            objects = file.objects.len(),
            "parsed go file"
        );
        Ok(file)
    }

    /// Parse a standalone type expression such as `map[string]*Widget`.
    ///
    /// Spans of the returned tree are relative to `text`.
    pub fn parse_type(&mut self, text: &str) -> Result<Type> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(GoError::NotAType {
                text: text.to_string(),
            });
        }
        let wrapped = format!("{TYPE_WRAPPER_PREFIX}{trimmed}\n");
        let tree = self.parser.parse(&wrapped, None).ok_or(GoError::NoTree)?;
        let root = tree.root_node();
        let lowering = Lowering {
            source: &wrapped,
            offset: TYPE_WRAPPER_PREFIX.len(),
            line_offset: 2,
        };
        lowering.check_errors(root)?;

        let not_a_type = || GoError::NotAType {
            text: trimmed.to_string(),
        };
        let decls: Vec<TsNode> = named_children(root)
            .into_iter()
            .filter(|child| child.kind() != "package_clause")
            .collect();
        let [decl] = decls.as_slice() else {
            return Err(not_a_type());
        };
        if decl.kind() != "type_declaration" {
            return Err(not_a_type());
        }
        let specs = named_children(*decl);
        let [spec] = specs.as_slice() else {
            return Err(not_a_type());
        };
        if spec.kind() != "type_spec" {
            return Err(not_a_type());
        }
        let ty_node = lowering.field(*spec, "type")?;
        let covers_text = ty_node.start_byte() == TYPE_WRAPPER_PREFIX.len()
            && ty_node.end_byte() == TYPE_WRAPPER_PREFIX.len() + trimmed.len();
        if !covers_text {
            return Err(not_a_type());
        }
        let ty = lowering.ty(ty_node)?;
        trace!(text = trimmed, "parsed type expression");
        Ok(ty)
    }
}

fn named_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn all_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn has_token(node: TsNode, token: &str) -> bool {
    all_children(node)
        .iter()
        .any(|child| !child.is_named() && child.kind() == token)
}

/// Lowers tree-sitter nodes of one source text into the owned tree.
struct Lowering<'a> {
    source: &'a str,
    /// Byte offset subtracted from every span.
    offset: usize,
    /// Line count subtracted from every span.
    line_offset: usize,
}

impl<'a> Lowering<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line_offset: 0,
        }
    }

    fn span(&self, node: TsNode) -> Span {
        let lo = node.start_byte().saturating_sub(self.offset);
        let hi = node.end_byte().saturating_sub(self.offset);
        let line = (node.start_position().row + 1).saturating_sub(self.line_offset);
        let end_line = (node.end_position().row + 1).saturating_sub(self.line_offset);
        Span::new(lo as u32, hi as u32, line as u32, end_line as u32)
    }

    fn text(&self, node: TsNode) -> &'a str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn ident(&self, node: TsNode) -> Ident {
        Ident::with_span(self.text(node), self.span(node))
    }

    fn field<'t>(&self, node: TsNode<'t>, field: &'static str) -> Result<TsNode<'t>> {
        node.child_by_field_name(field).ok_or(GoError::Missing {
            node: node.kind(),
            field,
            span: self.span(node),
        })
    }

    fn unsupported(&self, context: &'static str, node: TsNode) -> GoError {
        GoError::Unsupported {
            context,
            kind: node.kind().to_string(),
            span: self.span(node),
        }
    }

    fn check_errors(&self, root: TsNode) -> Result<()> {
        if let Some(bad) = first_error(root) {
            return Err(GoError::Syntax {
                span: self.span(bad),
                snippet: self.text(bad).chars().take(40).collect(),
            });
        }
        Ok(())
    }

    fn file(&self, root: TsNode) -> Result<File> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut decls = Vec::new();
        let mut doc: Vec<TsNode> = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "comment" {
                let adjacent = doc
                    .last()
                    .is_some_and(|last| last.end_position().row + 1 == child.start_position().row);
                if !adjacent {
                    doc.clear();
                }
                doc.push(child);
                continue;
            }
            let attached = match doc.last() {
                Some(last) if last.end_position().row + 1 == child.start_position().row => doc
                    .iter()
                    .map(|comment| self.text(*comment).trim_end().to_string())
                    .collect(),
                _ => Vec::new(),
            };
            doc.clear();

            match child.kind() {
                "package_clause" => {
                    let name = named_children(child)
                        .into_iter()
                        .next()
                        .ok_or(GoError::Missing {
                            node: "package_clause",
                            field: "name",
                            span: self.span(child),
                        })?;
                    package = Some(self.ident(name));
                }
                "import_declaration" => imports.extend(self.import_declaration(child)?),
                "type_declaration" => {
                    for (idx, spec) in named_children(child).into_iter().enumerate() {
                        let doc = if idx == 0 { attached.clone() } else { Vec::new() };
                        decls.push(Decl::Type(self.type_spec(spec, doc)?));
                    }
                }
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.func_decl(child, attached)?));
                }
                "var_declaration" | "const_declaration" => {
                    for (idx, spec) in self.value_specs(child)?.into_iter().enumerate() {
                        let mut spec = spec;
                        if idx == 0 {
                            spec.doc = attached.clone();
                        }
                        decls.push(Decl::Value(spec));
                    }
                }
                _ => return Err(self.unsupported("top-level declaration", child)),
            }
        }

        let package = package.ok_or(GoError::Missing {
            node: "source_file",
            field: "package clause",
            span: self.span(root),
        })?;
        Ok(File {
            package,
            imports,
            decls,
            objects: ObjectTable::default(),
            span: self.span(root),
        })
    }

    fn import_declaration(&self, node: TsNode) -> Result<Vec<ImportSpec>> {
        let mut specs = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => specs.push(self.import_spec(child)?),
                "import_spec_list" => {
                    for spec in named_children(child) {
                        specs.push(self.import_spec(spec)?);
                    }
                }
                _ => return Err(self.unsupported("import", child)),
            }
        }
        Ok(specs)
    }

    fn import_spec(&self, node: TsNode) -> Result<ImportSpec> {
        let path = self.field(node, "path")?;
        let path = self
            .text(path)
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        Ok(ImportSpec {
            name: node.child_by_field_name("name").map(|name| self.ident(name)),
            path,
            span: self.span(node),
        })
    }

    fn type_spec(&self, node: TsNode, doc: Vec<String>) -> Result<TypeSpec> {
        let alias = match node.kind() {
            "type_spec" => false,
            "type_alias" => true,
            _ => return Err(self.unsupported("type declaration", node)),
        };
        if let Some(params) = node.child_by_field_name("type_parameters") {
            return Err(self.unsupported("type declaration", params));
        }
        Ok(TypeSpec {
            doc,
            name: self.ident(self.field(node, "name")?),
            alias,
            ty: self.ty(self.field(node, "type")?)?,
            span: self.span(node),
        })
    }

    fn value_specs(&self, node: TsNode) -> Result<Vec<ValueSpec>> {
        let keyword = if node.kind() == "const_declaration" {
            ValueKeyword::Const
        } else {
            ValueKeyword::Var
        };
        let mut specs = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "var_spec" | "const_spec" => specs.push(self.value_spec(child, keyword)?),
                "var_spec_list" => {
                    for spec in named_children(child) {
                        specs.push(self.value_spec(spec, keyword)?);
                    }
                }
                _ => return Err(self.unsupported("value declaration", child)),
            }
        }
        Ok(specs)
    }

    fn value_spec(&self, node: TsNode, keyword: ValueKeyword) -> Result<ValueSpec> {
        let mut cursor = node.walk();
        let names = node
            .children_by_field_name("name", &mut cursor)
            .map(|name| self.ident(name))
            .collect();
        let ty = node
            .child_by_field_name("type")
            .map(|ty| self.ty(ty))
            .transpose()?;
        let values = match node.child_by_field_name("value") {
            Some(list) => self.expr_list(list)?,
            None => Vec::new(),
        };
        Ok(ValueSpec {
            doc: Vec::new(),
            keyword,
            names,
            ty,
            values,
            span: self.span(node),
        })
    }

    fn func_decl(&self, node: TsNode, doc: Vec<String>) -> Result<FuncDecl> {
        if let Some(params) = node.child_by_field_name("type_parameters") {
            return Err(self.unsupported("function declaration", params));
        }
        let recv = node
            .child_by_field_name("receiver")
            .map(|recv| self.field_list(recv))
            .transpose()?;
        let body = node
            .child_by_field_name("body")
            .map(|body| self.block(body))
            .transpose()?;
        Ok(FuncDecl {
            doc,
            recv,
            name: self.ident(self.field(node, "name")?),
            ty: self.func_type(node)?,
            body,
            span: self.span(node),
        })
    }

    /// Signature of a function declaration, function literal or function type.
    fn func_type(&self, node: TsNode) -> Result<FuncType> {
        let params = self.field_list(self.field(node, "parameters")?)?;
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => Some(self.field_list(result)?),
            Some(result) => {
                let ty = self.ty(result)?;
                let span = ty.span;
                Some(FieldList {
                    list: vec![Field::new(Vec::new(), ty)],
                    span,
                })
            }
            None => None,
        };
        let span = match node.child_by_field_name("result") {
            Some(result) => self.span(self.field(node, "parameters")?).to(self.span(result)),
            None => params.span,
        };
        Ok(FuncType {
            params,
            results,
            span,
        })
    }

    fn field_list(&self, node: TsNode) -> Result<FieldList> {
        let mut list = Vec::new();
        for child in named_children(node) {
            let variadic = match child.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => return Err(self.unsupported("parameter", child)),
            };
            let mut cursor = child.walk();
            let names = child
                .children_by_field_name("name", &mut cursor)
                .map(|name| self.ident(name))
                .collect();
            list.push(Field {
                names,
                ty: self.ty(self.field(child, "type")?)?,
                variadic,
                tag: None,
                span: self.span(child),
            });
        }
        Ok(FieldList {
            list,
            span: self.span(node),
        })
    }

    fn struct_fields(&self, node: TsNode) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for list in named_children(node) {
            for decl in named_children(list) {
                if decl.kind() != "field_declaration" {
                    return Err(self.unsupported("struct field", decl));
                }
                let mut cursor = decl.walk();
                let names: Vec<Ident> = decl
                    .children_by_field_name("name", &mut cursor)
                    .map(|name| self.ident(name))
                    .collect();
                let ty_node = self.field(decl, "type")?;
                let mut ty = self.ty(ty_node)?;
                if names.is_empty() && has_token(decl, "*") {
                    let span = self.span(decl);
                    ty = Type::new(TypeKind::Pointer(Box::new(ty)), span);
                }
                fields.push(Field {
                    names,
                    ty,
                    variadic: false,
                    tag: decl
                        .child_by_field_name("tag")
                        .map(|tag| self.text(tag).to_string()),
                    span: self.span(decl),
                });
            }
        }
        Ok(fields)
    }

    fn ty(&self, node: TsNode) -> Result<Type> {
        let span = self.span(node);
        let kind = match node.kind() {
            "type_identifier" | "identifier" => TypeKind::Name(self.ident(node)),
            "qualified_type" => TypeKind::Qualified {
                package: self.ident(self.field(node, "package")?),
                name: self.ident(self.field(node, "name")?),
            },
            "pointer_type" => {
                let elem = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or(GoError::Missing {
                        node: "pointer_type",
                        field: "element",
                        span,
                    })?;
                TypeKind::Pointer(Box::new(self.ty(elem)?))
            }
            "slice_type" => TypeKind::Slice(Box::new(self.ty(self.field(node, "element")?)?)),
            "array_type" => TypeKind::Array {
                len: Some(Box::new(self.expr(self.field(node, "length")?)?)),
                elem: Box::new(self.ty(self.field(node, "element")?)?),
            },
            "implicit_length_array_type" => TypeKind::Array {
                len: None,
                elem: Box::new(self.ty(self.field(node, "element")?)?),
            },
            "map_type" => TypeKind::Map {
                key: Box::new(self.ty(self.field(node, "key")?)?),
                value: Box::new(self.ty(self.field(node, "value")?)?),
            },
            "channel_type" => {
                let tokens: Vec<TsNode> = all_children(node)
                    .into_iter()
                    .filter(|child| !child.is_named())
                    .collect();
                let dir = match tokens.first().map(|token| token.kind()) {
                    Some("<-") => ChanDir::Recv,
                    _ if tokens.iter().any(|token| token.kind() == "<-") => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                TypeKind::Chan {
                    dir,
                    elem: Box::new(self.ty(self.field(node, "value")?)?),
                }
            }
            "function_type" => TypeKind::Func(self.func_type(node)?),
            "interface_type" => {
                let mut elems = Vec::new();
                for child in named_children(node) {
                    match child.kind() {
                        "method_elem" | "method_spec" => elems.push(InterfaceElem::Method {
                            name: self.ident(self.field(child, "name")?),
                            ty: self.func_type(child)?,
                        }),
                        "type_elem" | "constraint_elem" => {
                            let types = named_children(child);
                            let [single] = types.as_slice() else {
                                return Err(self.unsupported("interface element", child));
                            };
                            elems.push(InterfaceElem::Embed(self.ty(*single)?));
                        }
                        _ => elems.push(InterfaceElem::Embed(self.ty(child)?)),
                    }
                }
                TypeKind::Interface(elems)
            }
            "struct_type" => TypeKind::Struct(self.struct_fields(node)?),
            "parenthesized_type" => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or(GoError::Missing {
                        node: "parenthesized_type",
                        field: "type",
                        span,
                    })?;
                TypeKind::Paren(Box::new(self.ty(inner)?))
            }
            "generic_type" => {
                let base = self.ty(self.field(node, "type")?)?;
                let mut args = Vec::new();
                for arg in named_children(self.field(node, "type_arguments")?) {
                    let arg = if arg.kind() == "type_elem" {
                        let types = named_children(arg);
                        let [single] = types.as_slice() else {
                            return Err(self.unsupported("type argument", arg));
                        };
                        *single
                    } else {
                        arg
                    };
                    args.push(self.ty(arg)?);
                }
                TypeKind::Generic {
                    base: Box::new(base),
                    args,
                }
            }
            _ => return Err(self.unsupported("type", node)),
        };
        Ok(Type::new(kind, span))
    }

    fn expr_list(&self, node: TsNode) -> Result<Vec<Expr>> {
        if node.kind() != "expression_list" {
            return Ok(vec![self.expr(node)?]);
        }
        named_children(node)
            .into_iter()
            .map(|child| self.expr(child))
            .collect()
    }

    fn single_child<'t>(&self, node: TsNode<'t>, field: &'static str) -> Result<TsNode<'t>> {
        named_children(node)
            .into_iter()
            .next()
            .ok_or(GoError::Missing {
                node: node.kind(),
                field,
                span: self.span(node),
            })
    }

    fn boxed(&self, node: TsNode) -> Result<Box<Expr>> {
        Ok(Box::new(self.expr(node)?))
    }

    fn expr(&self, node: TsNode) -> Result<Expr> {
        let span = self.span(node);
        let lit = |kind| {
            ExprKind::Lit(BasicLit {
                kind,
                value: self.text(node).to_string(),
            })
        };
        let kind = match node.kind() {
            "identifier" | "nil" | "true" | "false" | "iota" => ExprKind::Ident(self.ident(node)),
            "int_literal" => lit(LitKind::Int),
            "float_literal" => lit(LitKind::Float),
            "imaginary_literal" => lit(LitKind::Imag),
            "rune_literal" => lit(LitKind::Char),
            "interpreted_string_literal" | "raw_string_literal" => lit(LitKind::String),
            "composite_literal" => ExprKind::Composite {
                ty: Some(self.ty(self.field(node, "type")?)?),
                elts: self.literal_value(self.field(node, "body")?)?,
            },
            "literal_value" => ExprKind::Composite {
                ty: None,
                elts: self.literal_value(node)?,
            },
            "func_literal" => ExprKind::FuncLit {
                ty: self.func_type(node)?,
                body: self.block(self.field(node, "body")?)?,
            },
            "parenthesized_expression" => {
                ExprKind::Paren(self.boxed(self.single_child(node, "expression")?)?)
            }
            "selector_expression" => ExprKind::Selector {
                x: self.boxed(self.field(node, "operand")?)?,
                sel: self.ident(self.field(node, "field")?),
            },
            "index_expression" => ExprKind::Index {
                x: self.boxed(self.field(node, "operand")?)?,
                index: self.boxed(self.field(node, "index")?)?,
            },
            "slice_expression" => {
                let bound = |field: &str| -> Result<Option<Box<Expr>>> {
                    node.child_by_field_name(field)
                        .map(|child| self.boxed(child))
                        .transpose()
                };
                ExprKind::Slice {
                    x: self.boxed(self.field(node, "operand")?)?,
                    low: bound("start")?,
                    high: bound("end")?,
                    max: bound("capacity")?,
                }
            }
            "type_assertion_expression" => {
                let ty = self.field(node, "type")?;
                ExprKind::TypeAssert {
                    x: self.boxed(self.field(node, "operand")?)?,
                    ty: Some(self.ty(ty)?),
                }
            }
            "type_conversion_expression" => {
                let ty = self.field(node, "type")?;
                ExprKind::Call {
                    fun: Box::new(Expr::new(ExprKind::Type(self.ty(ty)?), self.span(ty))),
                    args: vec![self.expr(self.field(node, "operand")?)?],
                    ellipsis: false,
                }
            }
            "call_expression" => {
                if let Some(args) = node.child_by_field_name("type_arguments") {
                    return Err(self.unsupported("call", args));
                }
                let mut args = Vec::new();
                let mut ellipsis = false;
                for arg in named_children(self.field(node, "arguments")?) {
                    if arg.kind() == "variadic_argument" {
                        ellipsis = true;
                        args.push(self.expr(self.single_child(arg, "expression")?)?);
                    } else {
                        args.push(self.expr(arg)?);
                    }
                }
                ExprKind::Call {
                    fun: self.boxed(self.field(node, "function")?)?,
                    args,
                    ellipsis,
                }
            }
            "unary_expression" => ExprKind::Unary {
                op: self.text(self.field(node, "operator")?).to_string(),
                x: self.boxed(self.field(node, "operand")?)?,
            },
            "binary_expression" => ExprKind::Binary {
                op: self.text(self.field(node, "operator")?).to_string(),
                x: self.boxed(self.field(node, "left")?)?,
                y: self.boxed(self.field(node, "right")?)?,
            },
            "slice_type" | "map_type" | "array_type" | "implicit_length_array_type"
            | "channel_type" | "function_type" | "interface_type" | "struct_type"
            | "pointer_type" | "qualified_type" | "generic_type" | "type_identifier" => {
                ExprKind::Type(self.ty(node)?)
            }
            _ => return Err(self.unsupported("expression", node)),
        };
        Ok(Expr::new(kind, span))
    }

    fn literal_value(&self, node: TsNode) -> Result<Vec<Expr>> {
        let mut elts = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "literal_element" => elts.push(self.element(child)?),
                "keyed_element" => {
                    let (key, value) = match (
                        child.child_by_field_name("key"),
                        child.child_by_field_name("value"),
                    ) {
                        (Some(key), Some(value)) => (key, value),
                        _ => {
                            let parts = named_children(child);
                            let [key, value] = parts.as_slice() else {
                                return Err(self.unsupported("keyed element", child));
                            };
                            (*key, *value)
                        }
                    };
                    elts.push(Expr::new(
                        ExprKind::KeyValue {
                            key: Box::new(self.element(key)?),
                            value: Box::new(self.element(value)?),
                        },
                        self.span(child),
                    ));
                }
                _ => elts.push(self.expr(child)?),
            }
        }
        Ok(elts)
    }

    fn element(&self, node: TsNode) -> Result<Expr> {
        if node.kind() == "literal_element" {
            self.expr(self.single_child(node, "value")?)
        } else {
            self.expr(node)
        }
    }

    fn block(&self, node: TsNode) -> Result<Block> {
        let mut stmts = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "statement_list" {
                let mut inner = child.walk();
                for stmt in child.named_children(&mut inner) {
                    if let Some(stmt) = self.stmt(stmt)? {
                        stmts.push(stmt);
                    }
                }
            } else if let Some(stmt) = self.stmt(child)? {
                stmts.push(stmt);
            }
        }
        Ok(Block {
            stmts,
            span: self.span(node),
        })
    }

    fn boxed_stmt(&self, node: Option<TsNode>) -> Result<Option<Box<Stmt>>> {
        match node {
            Some(node) => Ok(self.stmt(node)?.map(Box::new)),
            None => Ok(None),
        }
    }

    /// Lower one statement; `None` for empty statements.
    fn stmt(&self, node: TsNode) -> Result<Option<Stmt>> {
        let span = self.span(node);
        let kind = match node.kind() {
            "empty_statement" => return Ok(None),
            "comment" => StmtKind::Comment(self.text(node).trim_end().to_string()),
            "expression_statement" => {
                StmtKind::Expr(self.expr(self.single_child(node, "expression")?)?)
            }
            "assignment_statement" => StmtKind::Assign {
                lhs: self.expr_list(self.field(node, "left")?)?,
                op: self.text(self.field(node, "operator")?).to_string(),
                rhs: self.expr_list(self.field(node, "right")?)?,
            },
            "short_var_declaration" => StmtKind::Assign {
                lhs: self.expr_list(self.field(node, "left")?)?,
                op: ":=".to_string(),
                rhs: self.expr_list(self.field(node, "right")?)?,
            },
            "inc_statement" | "dec_statement" => StmtKind::IncDec {
                x: self.expr(self.single_child(node, "operand")?)?,
                inc: node.kind() == "inc_statement",
            },
            "return_statement" => match named_children(node).into_iter().next() {
                Some(list) => StmtKind::Return(self.expr_list(list)?),
                None => StmtKind::Return(Vec::new()),
            },
            "if_statement" => StmtKind::If {
                init: self.boxed_stmt(node.child_by_field_name("initializer"))?,
                cond: self.expr(self.field(node, "condition")?)?,
                then: self.block(self.field(node, "consequence")?)?,
                els: self.boxed_stmt(node.child_by_field_name("alternative"))?,
            },
            "for_statement" => return self.for_stmt(node).map(Some),
            "defer_statement" => StmtKind::Defer(self.expr(self.single_child(node, "call")?)?),
            "go_statement" => StmtKind::Go(self.expr(self.single_child(node, "call")?)?),
            "break_statement"
            | "continue_statement"
            | "goto_statement"
            | "fallthrough_statement" => {
                let keyword = node.kind().trim_end_matches("_statement").to_string();
                StmtKind::Branch {
                    keyword,
                    label: named_children(node)
                        .into_iter()
                        .next()
                        .map(|label| self.ident(label)),
                }
            }
            "block" => StmtKind::Block(self.block(node)?),
            "var_declaration" | "const_declaration" => {
                let mut specs = self.value_specs(node)?;
                if specs.len() != 1 {
                    return Err(self.unsupported("grouped local declaration", node));
                }
                StmtKind::Decl(specs.remove(0))
            }
            _ => return Err(self.unsupported("statement", node)),
        };
        Ok(Some(Stmt::new(kind, span)))
    }

    fn for_stmt(&self, node: TsNode) -> Result<Stmt> {
        let span = self.span(node);
        let body = self.block(self.field(node, "body")?)?;
        let header = named_children(node)
            .into_iter()
            .find(|child| Some(*child) != node.child_by_field_name("body"));

        let kind = match header {
            None => StmtKind::For {
                init: None,
                cond: None,
                post: None,
                body,
            },
            Some(clause) if clause.kind() == "for_clause" => StmtKind::For {
                init: self.boxed_stmt(clause.child_by_field_name("initializer"))?,
                cond: clause
                    .child_by_field_name("condition")
                    .map(|cond| self.expr(cond))
                    .transpose()?,
                post: self.boxed_stmt(clause.child_by_field_name("update"))?,
                body,
            },
            Some(clause) if clause.kind() == "range_clause" => {
                let targets = match clause.child_by_field_name("left") {
                    Some(left) => self.expr_list(left)?,
                    None => Vec::new(),
                };
                let mut targets = targets.into_iter();
                StmtKind::Range {
                    key: targets.next(),
                    value: targets.next(),
                    define: has_token(clause, ":="),
                    x: self.expr(self.field(clause, "right")?)?,
                    body,
                }
            }
            Some(cond) => StmtKind::For {
                init: None,
                cond: Some(self.expr(cond)?),
                post: None,
                body,
            },
        };
        Ok(Stmt::new(kind, span))
    }
}

fn first_error(node: TsNode) -> Option<TsNode> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<TsNode> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
