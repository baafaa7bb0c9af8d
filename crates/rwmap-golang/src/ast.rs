//! Owned Go syntax tree.
//!
//! The tree mirrors the shape of Go's own `go/ast` closely enough that
//! rewrites can be expressed structurally: types and expressions are distinct
//! node families, every node carries a [`Span`], and identifiers may be linked
//! to the [`Object`] they resolve to through the file's [`ObjectTable`].

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Index of an [`Object`] inside a file's [`ObjectTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjKind {
    Type,
    Func,
    Var,
    Const,
}

/// A named entity an identifier can resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    pub span: Span,
}

/// Side table of every object declared in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTable {
    objects: Vec<Object>,
}

impl ObjectTable {
    pub fn insert(&mut self, object: Object) -> ObjId {
        let id = ObjId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    pub fn get(&self, id: ObjId) -> Option<&Object> {
        self.objects.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut Object> {
        self.objects.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(idx, object)| (ObjId(idx as u32), object))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub obj: Option<ObjId>,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            obj: None,
            span: Span::null(),
        }
    }

    pub fn with_span(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            obj: None,
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub objects: ObjectTable,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
            span: Span::null(),
        }
    }
}

/// One top-level declaration. Grouped declarations are split so that every
/// `Decl` carries exactly one spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
    Value(ValueSpec),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Type(spec) => spec.name.as_str(),
            Decl::Func(func) => func.name.as_str(),
            Decl::Value(spec) => spec.names.first().map(Ident::as_str).unwrap_or("_"),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Type(spec) => spec.span,
            Decl::Func(func) => func.span,
            Decl::Value(spec) => spec.span,
        }
    }

    pub fn doc(&self) -> &[String] {
        match self {
            Decl::Type(spec) => &spec.doc,
            Decl::Func(func) => &func.doc,
            Decl::Value(spec) => &spec.doc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub doc: Vec<String>,
    pub name: Ident,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKeyword {
    Var,
    Const,
}

impl ValueKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKeyword::Var => "var",
            ValueKeyword::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSpec {
    pub doc: Vec<String>,
    pub keyword: ValueKeyword,
    pub names: Vec<Ident>,
    pub ty: Option<Type>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub doc: Vec<String>,
    pub recv: Option<FieldList>,
    pub name: Ident,
    pub ty: FuncType,
    pub body: Option<Block>,
    pub span: Span,
}

impl FuncDecl {
    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncType {
    pub params: FieldList,
    pub results: Option<FieldList>,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldList {
    pub list: Vec<Field>,
    pub span: Span,
}

impl FieldList {
    pub fn new(list: Vec<Field>) -> Self {
        Self {
            list,
            span: Span::null(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Number of entries the list declares, counting every name of a field
    /// that shares one type between several names.
    pub fn arity(&self) -> usize {
        self.list.iter().map(|field| field.names.len().max(1)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Type,
    pub variadic: bool,
    pub tag: Option<String>,
    pub span: Span,
}

impl Field {
    pub fn new(names: Vec<Ident>, ty: Type) -> Self {
        let span = ty.span;
        Self {
            names,
            ty,
            variadic: false,
            tag: None,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Name(Ident),
    Qualified { package: Ident, name: Ident },
    Pointer(Box<Type>),
    Slice(Box<Type>),
    /// `len` is `None` for `[...]T`.
    Array { len: Option<Box<Expr>>, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Func(FuncType),
    Interface(Vec<InterfaceElem>),
    Struct(Vec<Field>),
    Generic { base: Box<Type>, args: Vec<Type> },
    Paren(Box<Type>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterfaceElem {
    Method { name: Ident, ty: FuncType },
    Embed(Type),
}

impl Type {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Name(Ident::new(name)), Span::null())
    }

    /// The empty interface `interface{}`.
    pub fn empty_interface(span: Span) -> Self {
        Self::new(TypeKind::Interface(Vec::new()), span)
    }

    /// Whether this node is the universal placeholder type `interface{}`.
    pub fn is_placeholder(&self) -> bool {
        matches!(&self.kind, TypeKind::Interface(elems) if elems.is_empty())
    }

    /// Element type when this is a slice type.
    pub fn slice_elem(&self) -> Option<&Type> {
        match &self.kind {
            TypeKind::Slice(elem) => Some(elem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(Ident),
    Lit(BasicLit),
    Composite { ty: Option<Type>, elts: Vec<Expr> },
    KeyValue { key: Box<Expr>, value: Box<Expr> },
    FuncLit { ty: FuncType, body: Block },
    Paren(Box<Expr>),
    Selector { x: Box<Expr>, sel: Ident },
    Index { x: Box<Expr>, index: Box<Expr> },
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    /// `ty` is `None` for the `x.(type)` form of a type switch.
    TypeAssert { x: Box<Expr>, ty: Option<Type> },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },
    Unary { op: String, x: Box<Expr> },
    Binary {
        op: String,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    /// A type in expression position: `make([]T, n)`, `[]byte(s)`.
    Type(Type),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicLit {
    pub kind: LitKind,
    /// Literal text exactly as written, quotes included.
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(ident: Ident) -> Self {
        let span = ident.span;
        Self::new(ExprKind::Ident(ident), span)
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Whether this is a call of the plain identifier `name`, e.g. `make(...)`.
    pub fn is_call_to(&self, name: &str) -> bool {
        match &self.kind {
            ExprKind::Call { fun, .. } => fun.as_ident().is_some_and(|ident| ident.name == name),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Expr(Expr),
    /// `=`, `:=` and every compound assignment such as `+=`.
    Assign {
        lhs: Vec<Expr>,
        op: String,
        rhs: Vec<Expr>,
    },
    IncDec { x: Expr, inc: bool },
    Return(Vec<Expr>),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        x: Expr,
        body: Block,
    },
    Defer(Expr),
    Go(Expr),
    /// `break`, `continue`, `goto` and `fallthrough`.
    Branch { keyword: String, label: Option<Ident> },
    Block(Block),
    Decl(ValueSpec),
    Comment(String),
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Binding power of a Go binary operator, 1 (`||`) through 5 (`*`).
pub fn binary_precedence(op: &str) -> u8 {
    match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "+" | "-" | "|" | "^" => 4,
        "*" | "/" | "%" | "<<" | ">>" | "&" | "&^" => 5,
        _ => 0,
    }
}

/// Precedence of unary expressions; binds tighter than every binary operator.
pub const UNARY_PRECEDENCE: u8 = 6;

/// Precedence of primary expressions (selectors, calls, indexing).
pub const HIGHEST_PRECEDENCE: u8 = 7;
