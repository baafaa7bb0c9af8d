//! Structural rewrites over the Go tree.
//!
//! Each primitive is a small visitor that knows nothing about which template
//! declaration it is applied to. Primitives report how much they changed so
//! handlers can notice when the template no longer has the shape they expect.

use std::collections::{BTreeMap, BTreeSet};

use rwmap_golang::ast::*;
use rwmap_golang::visit::{
    walk_expr_mut, walk_stmt_mut, walk_type, walk_type_mut, Node, Visit, VisitMut,
};
use thiserror::Error;

use crate::type_expr::{MapArgument, TypeExpr};

/// A declaration does not look the way its handler expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ShapeMismatch(pub String);

impl ShapeMismatch {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

pub type RewriteResult<T> = std::result::Result<T, ShapeMismatch>;

/// Fails with `detail` unless a rewrite changed something.
pub fn expect_rewrites(count: usize, detail: &str) -> RewriteResult<usize> {
    if count == 0 {
        Err(ShapeMismatch::new(detail))
    } else {
        Ok(count)
    }
}

/// Number of `interface{}` nodes under `node`.
pub fn count_placeholders<N: Node + ?Sized>(node: &N) -> usize {
    struct Counter(usize);

    impl Visit for Counter {
        fn visit_type(&mut self, ty: &Type) {
            if ty.is_placeholder() {
                self.0 += 1;
            } else {
                walk_type(self, ty);
            }
        }
    }

    let mut counter = Counter(0);
    node.accept(&mut counter);
    counter.0
}

struct Substitute<'a> {
    with: &'a TypeExpr,
    count: usize,
}

impl VisitMut for Substitute<'_> {
    fn visit_type_mut(&mut self, ty: &mut Type) {
        if ty.is_placeholder() {
            *ty = self.with.instantiate(ty.span);
            self.count += 1;
        } else {
            walk_type_mut(self, ty);
        }
    }
}

/// Replaces every placeholder under `node` with `with`. The inserted type is
/// not searched again, so a caller type that itself mentions `interface{}`
/// survives intact.
pub fn substitute<N: Node + ?Sized>(node: &mut N, with: &TypeExpr) -> usize {
    let mut substitute = Substitute { with, count: 0 };
    node.accept_mut(&mut substitute);
    substitute.count
}

struct SubstituteMapTypes<'a> {
    key: &'a TypeExpr,
    value: &'a TypeExpr,
    count: usize,
}

impl VisitMut for SubstituteMapTypes<'_> {
    fn visit_type_mut(&mut self, ty: &mut Type) {
        let both_placeholders = matches!(
            &ty.kind,
            TypeKind::Map { key, value } if key.is_placeholder() && value.is_placeholder()
        );
        if both_placeholders {
            let span = ty.span;
            ty.kind = TypeKind::Map {
                key: Box::new(self.key.instantiate(span)),
                value: Box::new(self.value.instantiate(span)),
            };
            self.count += 1;
        } else {
            walk_type_mut(self, ty);
        }
    }
}

/// Rewrites `map[interface{}]interface{}` to `map[K]V`. Maps where only one
/// half is still a placeholder are left alone.
pub fn substitute_map_types<N: Node + ?Sized>(
    node: &mut N,
    key: &TypeExpr,
    value: &TypeExpr,
) -> usize {
    let mut substitute = SubstituteMapTypes {
        key,
        value,
        count: 0,
    };
    node.accept_mut(&mut substitute);
    substitute.count
}

/// What the shared type of a key/value field pair looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `key, value interface{}`
    Single,
    /// `keys, values []interface{}`
    Sequence,
}

impl Slot {
    fn matches(self, ty: &Type) -> bool {
        match self {
            Slot::Single => ty.is_placeholder(),
            Slot::Sequence => ty.slice_elem().is_some_and(Type::is_placeholder),
        }
    }
}

/// Specializes a field list made of one field that declares a key and a value
/// with one shared placeholder type.
///
/// With equal key and value types the field stays merged and gets the key
/// type. Otherwise it is split in two: the key name keeps the field with the
/// key type, and the value name moves to a new field right after it with the
/// value type.
pub fn split_dual_slot(
    list: &mut FieldList,
    slot: Slot,
    arg: &MapArgument,
) -> RewriteResult<()> {
    let found = list.list.len();
    let [field] = list.list.as_mut_slice() else {
        return Err(ShapeMismatch::new(format!(
            "expected one key/value field, found {found}"
        )));
    };
    if field.names.len() != 2 {
        return Err(ShapeMismatch::new(format!(
            "expected a key/value field with two names, found {}",
            field.names.len()
        )));
    }
    if !slot.matches(&field.ty) {
        return Err(ShapeMismatch::new(format!(
            "key/value field does not have the {slot:?} placeholder type"
        )));
    }

    if arg.same_types() {
        substitute(field, &arg.key);
        return Ok(());
    }

    let value_name = field.names.remove(1);
    let mut value_field = Field::new(vec![value_name], field.ty.clone());
    value_field.span = field.span;
    substitute(field, &arg.key);
    substitute(&mut value_field, &arg.value);
    list.list.push(value_field);
    Ok(())
}

struct BulkAllocations<'a> {
    key: &'a TypeExpr,
    value: &'a TypeExpr,
    count: usize,
    error: Option<ShapeMismatch>,
}

impl VisitMut for BulkAllocations<'_> {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let StmtKind::Assign { lhs, rhs, .. } = &mut stmt.kind {
            if let ([target], [call]) = (lhs.as_slice(), rhs.as_mut_slice()) {
                if call.is_call_to("make") {
                    self.retype(target, call);
                }
            }
        }
        walk_stmt_mut(self, stmt);
    }
}

impl BulkAllocations<'_> {
    fn retype(&mut self, target: &Expr, call: &mut Expr) {
        let ExprKind::Call { args, .. } = &mut call.kind else {
            return;
        };
        let Some(allocated) = args.first_mut() else {
            return;
        };
        if count_placeholders(&*allocated) == 0 {
            return;
        }
        let with = match target.as_ident().map(Ident::as_str) {
            Some("keys") => self.key,
            Some("values") => self.value,
            other => {
                self.error.get_or_insert(ShapeMismatch::new(format!(
                    "placeholder allocation assigned to `{}`, expected `keys` or `values`",
                    other.unwrap_or("<expression>")
                )));
                return;
            }
        };
        substitute(allocated, with);
        self.count += 1;
    }
}

/// Retypes `keys = make([]interface{}, ...)` to the key type and
/// `values = make([]interface{}, ...)` to the value type.
///
/// The allocations are told apart only by the name they are assigned to, so
/// any placeholder allocation bound to another name, or a different number of
/// allocations than `expected`, is reported instead of guessed at.
pub fn retype_bulk_allocations(
    block: &mut Block,
    key: &TypeExpr,
    value: &TypeExpr,
    expected: usize,
) -> RewriteResult<usize> {
    let mut allocations = BulkAllocations {
        key,
        value,
        count: 0,
        error: None,
    };
    allocations.visit_block_mut(block);
    if let Some(error) = allocations.error {
        return Err(error);
    }
    if allocations.count != expected {
        return Err(ShapeMismatch::new(format!(
            "expected {expected} keys/values allocation(s), found {}",
            allocations.count
        )));
    }
    Ok(allocations.count)
}

struct AbsentSentinel<'a> {
    result: &'a Ident,
    count: usize,
}

impl VisitMut for AbsentSentinel<'_> {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let StmtKind::Return(results) = &mut stmt.kind {
            for expr in results {
                if expr.as_ident().is_some_and(|ident| ident.name == "nil") {
                    let mut ident = self.result.clone();
                    ident.span = expr.span;
                    *expr = Expr::ident(ident);
                    self.count += 1;
                }
            }
            return;
        }
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        // a function literal's returns belong to the literal
        if !matches!(expr.kind, ExprKind::FuncLit { .. }) {
            walk_expr_mut(self, expr);
        }
    }
}

/// Replaces `nil` operands of `return` statements with the named result
/// `result`, so the function returns the zero value of the concrete type.
pub fn rewrite_absent_sentinel(block: &mut Block, result: &Ident) -> usize {
    let mut sentinel = AbsentSentinel { result, count: 0 };
    sentinel.visit_block_mut(block);
    sentinel.count
}

/// Template identifiers renamed after an output name.
pub const HELPER_NAMES: [&str; 4] = ["entry", "readOnly", "expunged", "newEntry"];

/// Old name to new name for the container type and its private helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTable {
    entries: BTreeMap<String, String>,
}

impl RenameTable {
    pub const CONTAINER: &'static str = "Map";

    /// `Map` becomes `name`; each helper gets `name` capitalized as a suffix.
    pub fn for_output(name: &str) -> Self {
        let suffix = capitalize(name);
        let mut entries = BTreeMap::new();
        entries.insert(Self::CONTAINER.to_string(), name.to_string());
        for helper in HELPER_NAMES {
            entries.insert(helper.to_string(), format!("{helper}{suffix}"));
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Whether renaming twice gives the same tree as renaming once, i.e. no
    /// new name is itself renamed again.
    pub fn is_idempotent(&self) -> bool {
        self.entries
            .iter()
            .all(|(old, new)| old == new || !self.entries.contains_key(new))
    }

    /// Renames every declared object named in the table together with every
    /// identifier bound to it. Identifiers without an object link, such as
    /// method names, selector fields and names inside caller-supplied types,
    /// are never touched. Returns the number of identifiers renamed.
    pub fn apply(&self, file: &mut File) -> usize {
        let mut renamed = BTreeSet::new();
        for (id, object) in file.objects.iter() {
            if self.get(&object.name).is_some_and(|new| new != object.name) {
                renamed.insert(id);
            }
        }
        if renamed.is_empty() {
            return 0;
        }

        let mut targets = BTreeMap::new();
        for &id in &renamed {
            if let Some(object) = file.objects.get_mut(id) {
                if let Some(new) = self.entries.get(&object.name) {
                    object.name = new.clone();
                    targets.insert(id, new.clone());
                }
            }
        }

        let mut rename = Rename { targets, count: 0 };
        rename.visit_file_mut(file);
        rename.count
    }
}

struct Rename {
    targets: BTreeMap<ObjId, String>,
    count: usize,
}

impl VisitMut for Rename {
    fn visit_ident_mut(&mut self, ident: &mut Ident) {
        if let Some(new) = ident.obj.and_then(|id| self.targets.get(&id)) {
            ident.name = new.clone();
            self.count += 1;
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rwmap_golang::{GoParser, GoSerializer};

    fn parser() -> GoParser {
        GoParser::new().expect("grammar should load")
    }

    fn type_expr(text: &str) -> TypeExpr {
        TypeExpr::parse(&mut parser(), text).expect("valid type")
    }

    fn map_arg(key: &str, value: &str) -> MapArgument {
        MapArgument {
            key: type_expr(key),
            value: type_expr(value),
        }
    }

    fn parse_func(source: &str) -> FuncDecl {
        let file = parser()
            .parse_file(&format!("package p\n\n{source}"))
            .expect("valid source");
        match file.decls.into_iter().next() {
            Some(Decl::Func(func)) => func,
            other => panic!("expected a function, got {other:?}"),
        }
    }

    fn signature(func: &FuncDecl) -> String {
        let mut func = func.clone();
        func.doc.clear();
        let file = File {
            package: Ident::new("p"),
            imports: Vec::new(),
            decls: vec![Decl::Func(func)],
            objects: ObjectTable::default(),
            span: Default::default(),
        };
        GoSerializer::new()
            .serialize_file(&file)
            .trim_start_matches("package p\n\n")
            .trim_end()
            .to_string()
    }

    #[test]
    fn substitute_replaces_nested_placeholders() {
        let mut func =
            parse_func("func f(a interface{}, b []*interface{}, c func(interface{}) error) {}\n");
        let count = substitute(&mut func.ty, &type_expr("string"));
        assert_eq!(count, 3);
        assert_eq!(
            signature(&func),
            "func f(a string, b []*string, c func(string) error) {}"
        );
    }

    #[test]
    fn substitute_does_not_descend_into_the_replacement() {
        let mut func = parse_func("func f(a interface{}) {}\n");
        let count = substitute(&mut func.ty, &type_expr("map[string]interface{}"));
        assert_eq!(count, 1);
        assert_eq!(count_placeholders(&func.ty), 1);
    }

    #[test]
    fn map_types_need_both_halves_to_be_placeholders() {
        let mut func = parse_func(
            "func f(a map[interface{}]interface{}, b map[string]interface{}) {}\n",
        );
        let count = substitute_map_types(&mut func.ty, &type_expr("int"), &type_expr("bool"));
        assert_eq!(count, 1);
        assert_eq!(
            signature(&func),
            "func f(a map[int]bool, b map[string]interface{}) {}"
        );
    }

    #[test]
    fn dual_slot_splits_when_types_differ() {
        let mut func = parse_func("func f(keys, values []interface{}) {}\n");
        let arg = map_arg("string", "*Item");
        split_dual_slot(&mut func.ty.params, Slot::Sequence, &arg).unwrap();
        assert_eq!(signature(&func), "func f(keys []string, values []*Item) {}");
    }

    #[test]
    fn dual_slot_stays_merged_when_types_match() {
        let mut func = parse_func("func f(key, value interface{}) {}\n");
        split_dual_slot(&mut func.ty.params, Slot::Single, &map_arg("int", "int")).unwrap();
        assert_eq!(func.ty.params.list.len(), 1);
        assert_eq!(signature(&func), "func f(key, value int) {}");
    }

    #[test]
    fn dual_slot_rejects_other_shapes() {
        let arg = map_arg("int", "string");
        for source in [
            "func f(key interface{}) {}\n",
            "func f(key, value int) {}\n",
            "func f(key, value interface{}, extra int) {}\n",
        ] {
            let mut func = parse_func(source);
            assert!(
                split_dual_slot(&mut func.ty.params, Slot::Single, &arg).is_err(),
                "{source}"
            );
        }
        let mut func = parse_func("func f(key, value interface{}) {}\n");
        assert!(split_dual_slot(&mut func.ty.params, Slot::Sequence, &arg).is_err());
    }

    #[test]
    fn bulk_allocations_follow_the_assigned_name() {
        let mut func = parse_func(
            "func f(n int) (keys, values []interface{}) {\n\tkeys = make([]interface{}, 0, n)\n\tvalues = make([]interface{}, 0, n)\n\treturn\n}\n",
        );
        let body = func.body.as_mut().unwrap();
        let count =
            retype_bulk_allocations(body, &type_expr("string"), &type_expr("float64"), 2).unwrap();
        assert_eq!(count, 2);
        assert_eq!(count_placeholders(&*body), 0);
        let rendered = GoSerializer::new().serialize_file(&File {
            package: Ident::new("p"),
            imports: Vec::new(),
            decls: vec![Decl::Func(func)],
            objects: ObjectTable::default(),
            span: Default::default(),
        });
        assert!(rendered.contains("keys = make([]string, 0, n)"), "{rendered}");
        assert!(rendered.contains("values = make([]float64, 0, n)"), "{rendered}");
    }

    #[test]
    fn bulk_allocations_reject_unknown_targets() {
        let mut func = parse_func("func f() {\n\titems := make([]interface{}, 0)\n\t_ = items\n}\n");
        let err = retype_bulk_allocations(
            func.body.as_mut().unwrap(),
            &type_expr("string"),
            &type_expr("int"),
            1,
        )
        .unwrap_err();
        assert!(err.0.contains("`items`"), "{err}");

        let mut func = parse_func("func f() {\n\tkeys := make([]interface{}, 0)\n\t_ = keys\n}\n");
        assert!(retype_bulk_allocations(
            func.body.as_mut().unwrap(),
            &type_expr("string"),
            &type_expr("int"),
            2,
        )
        .is_err());
    }

    #[test]
    fn absent_sentinel_only_rewrites_return_operands() {
        let mut func = parse_func(
            "func f(ok bool) (value interface{}, found bool) {\n\tvar p *int = nil\n\tif !ok {\n\t\treturn nil, false\n\t}\n\tg := func() interface{} {\n\t\treturn nil\n\t}\n\t_, _ = p, g\n\treturn\n}\n",
        );
        let result = func.ty.results.as_ref().unwrap().list[0].names[0].clone();
        let count = rewrite_absent_sentinel(func.body.as_mut().unwrap(), &result);
        assert_eq!(count, 1);
        let body = func.body.as_ref().unwrap();
        let StmtKind::If { then, .. } = &body.stmts[1].kind else {
            panic!("expected if statement");
        };
        let StmtKind::Return(results) = &then.stmts[0].kind else {
            panic!("expected return statement");
        };
        let rewritten = results[0].as_ident().unwrap();
        assert_eq!(rewritten.name, "value");
        assert_eq!(rewritten.obj, result.obj);
    }

    #[test]
    fn rename_follows_object_links() {
        let mut file = parser()
            .parse_file(
                "package p\n\ntype Map struct {\n\tentry *entry\n}\n\ntype entry struct{}\n\nfunc (m *Map) Map() *Map {\n\treturn m\n}\n\nvar data map[string]Map\n",
            )
            .unwrap();
        let table = RenameTable::for_output("counter");
        let count = table.apply(&mut file);
        assert_eq!(count, 6);
        assert!(file.binding_mismatches().is_empty());
        assert_eq!(
            GoSerializer::new().serialize_file(&file),
            "package p\n\ntype counter struct {\n\tentry *entryCounter\n}\n\ntype entryCounter struct{}\n\nfunc (m *counter) Map() *counter {\n\treturn m\n}\n\nvar data map[string]counter\n"
        );
    }

    #[test]
    fn rename_twice_equals_rename_once() {
        let source = "package p\n\ntype Map struct{}\n\nfunc newEntry() *Map {\n\treturn &Map{}\n}\n";
        let table = RenameTable::for_output("Store");
        assert!(table.is_idempotent());
        let mut once = parser().parse_file(source).unwrap();
        table.apply(&mut once);
        let mut twice = once.clone();
        assert_eq!(table.apply(&mut twice), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn rename_table_detects_chained_names() {
        assert!(RenameTable::for_output("Map").is_idempotent());
        assert!(!RenameTable::for_output("entry").is_idempotent());
        assert!(!RenameTable::for_output("readOnly").is_idempotent());
    }
}
