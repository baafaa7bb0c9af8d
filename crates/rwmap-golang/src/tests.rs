use pretty_assertions::assert_eq;

use crate::ast::*;
use crate::imports::{normalize_imports, package_name_for_path, used_packages, KnownPackages};
use crate::{GoError, GoParser, GoSerializer};

const STORE_SOURCE: &str = r#"package demo

import (
	"errors"
	"sync"
)

var ErrEmpty = errors.New("empty")

// Store keeps values.
// It is safe for concurrent use.
type Store struct {
	data map[string][]int
	mu   sync.RWMutex
}

func (s *Store) Get(key string) ([]int, bool) {
	s.mu.RLock()
	defer s.mu.RUnlock()
	values, ok := s.data[key]
	return values, ok
}

func (s *Store) Sum(key string) (total int, err error) {
	values, ok := s.Get(key)
	if !ok {
		return 0, ErrEmpty
	}

	for i := 0; i < len(values); i++ {
		total += values[i] * 2
	}
	return
}

func (s *Store) Each(f func(key string, values []int) bool) {
	for key, values := range s.data {
		if !f(key, values) {
			break
		}
	}
}

func count(s *Store) int {
	n := 0
	s.Each(func(key string, values []int) bool {
		n++
		return true
	})
	return n
}

func apply(xs []int, fn func(int) int) []int {
	out := make([]int, 0, len(xs))
	for _, x := range xs {
		out = append(out, fn(x+1))
	}
	return out[1 : len(out)-1]
}
"#;

fn parse(source: &str) -> File {
    let mut parser = GoParser::new().expect("grammar should load");
    parser.parse_file(source).expect("parse should succeed")
}

fn func<'a>(file: &'a File, name: &str) -> &'a FuncDecl {
    file.decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Func(func) if func.name.name == name => Some(func),
            _ => None,
        })
        .unwrap_or_else(|| panic!("missing func {name}"))
}

fn first_value(source: &str) -> Expr {
    let file = parse(source);
    match &file.decls[0] {
        Decl::Value(spec) => spec.values[0].clone(),
        other => panic!("expected value declaration, got {other:?}"),
    }
}

#[test]
fn parse_basic_go_source() {
    let file = parse(STORE_SOURCE);

    assert_eq!(file.package.name, "demo");
    assert_eq!(
        file.imports.iter().map(|spec| spec.path.as_str()).collect::<Vec<_>>(),
        vec!["errors", "sync"]
    );
    let names: Vec<&str> = file.decls.iter().map(Decl::name).collect();
    assert_eq!(
        names,
        vec!["ErrEmpty", "Store", "Get", "Sum", "Each", "count", "apply"]
    );

    let Decl::Type(store) = &file.decls[1] else {
        panic!("expected type declaration");
    };
    assert_eq!(
        store.doc,
        vec![
            "// Store keeps values.".to_string(),
            "// It is safe for concurrent use.".to_string()
        ]
    );
    let TypeKind::Struct(fields) = &store.ty.kind else {
        panic!("expected struct type");
    };
    assert_eq!(fields.len(), 2);
    assert!(matches!(fields[0].ty.kind, TypeKind::Map { .. }));
    assert!(matches!(fields[1].ty.kind, TypeKind::Qualified { .. }));

    let get = func(&file, "Get");
    assert!(get.is_method());
    assert_eq!(get.ty.params.arity(), 1);
    assert_eq!(get.ty.results.as_ref().map(FieldList::arity), Some(2));
}

#[test]
fn serialize_round_trips_gofmt_source() {
    let file = parse(STORE_SOURCE);
    let output = GoSerializer::new().serialize_file(&file);
    assert_eq!(output, STORE_SOURCE);
}

#[test]
fn resolver_links_identifiers_to_objects() {
    let file = parse(STORE_SOURCE);
    assert!(file.binding_mismatches().is_empty());

    let store_obj = match &file.decls[1] {
        Decl::Type(spec) => spec.name.obj.expect("type name is declared"),
        _ => unreachable!(),
    };
    let get = func(&file, "Get");
    let recv = get.recv.as_ref().expect("Get is a method");
    let TypeKind::Pointer(elem) = &recv.list[0].ty.kind else {
        panic!("expected pointer receiver");
    };
    let TypeKind::Name(name) = &elem.kind else {
        panic!("expected named receiver type");
    };
    assert_eq!(name.obj, Some(store_obj));
    // methods are not package-scope objects
    assert_eq!(get.name.obj, None);

    let count = func(&file, "count");
    let body = count.body.as_ref().expect("count has a body");
    let StmtKind::Assign { lhs, .. } = &body.stmts[0].kind else {
        panic!("expected n := 0");
    };
    let declared = lhs[0].as_ident().and_then(|ident| ident.obj);
    let StmtKind::Return(results) = &body.stmts[2].kind else {
        panic!("expected return n");
    };
    assert_eq!(results[0].as_ident().and_then(|ident| ident.obj), declared);
    assert!(declared.is_some());
}

#[test]
fn binary_spacing_follows_expression_depth() {
    let serializer = GoSerializer::new();
    let cases = [
        ("var x = a*b + c\n", "a*b + c"),
        ("var x = (a + b) * c\n", "(a + b) * c"),
        ("var x = f(a+b, c)\n", "f(a+b, c)"),
        ("var x = f(a + b)\n", "f(a + b)"),
        ("var x = s[i+1:]\n", "s[i+1:]"),
        ("var x = !ok && n > 0\n", "!ok && n > 0"),
    ];
    for (decl, expected) in cases {
        let expr = first_value(&format!("package p\n\n{decl}"));
        assert_eq!(serializer.expr_to_string(&expr), expected);
    }
}

#[test]
fn parse_type_accepts_single_type_expressions() {
    let mut parser = GoParser::new().expect("grammar should load");

    let ty = parser.parse_type("map[string]*pkg.Widget").expect("valid type");
    let TypeKind::Map { key, value } = &ty.kind else {
        panic!("expected map type, got {ty:?}");
    };
    assert!(matches!(&key.kind, TypeKind::Name(ident) if ident.name == "string"));
    assert!(matches!(&value.kind, TypeKind::Pointer(inner)
        if matches!(inner.kind, TypeKind::Qualified { .. })));
    assert_eq!(ty.span.lo, 0);
    assert_eq!(ty.span.hi, "map[string]*pkg.Widget".len() as u32);
    assert_eq!(ty.span.line, 1);

    let ty = parser.parse_type("  [16]byte ").expect("valid type");
    assert_eq!(GoSerializer::new().type_to_string(&ty), "[16]byte");

    let ty = parser.parse_type("interface{}").expect("valid type");
    assert!(ty.is_placeholder());
}

#[test]
fn parse_type_rejects_everything_else() {
    let mut parser = GoParser::new().expect("grammar should load");
    for text in ["", "map[string]", "int; var x int", "[]int extra", "func("] {
        assert!(parser.parse_type(text).is_err(), "{text:?} should not parse");
    }
}

#[test]
fn syntax_errors_are_reported() {
    let mut parser = GoParser::new().expect("grammar should load");
    let err = parser
        .parse_file("package main\n\nfunc broken( {\n")
        .expect_err("source is malformed");
    assert!(matches!(err, GoError::Syntax { .. }), "got {err:?}");
    assert!(err.span().is_some());
}

#[test]
fn unsupported_syntax_is_reported() {
    let mut parser = GoParser::new().expect("grammar should load");
    let err = parser
        .parse_file("package main\n\nfunc Id[T any](x T) T {\n\treturn x\n}\n")
        .expect_err("type parameters are outside the subset");
    assert!(matches!(err, GoError::Unsupported { .. }), "got {err:?}");
}

#[test]
fn grouped_declarations_are_split() {
    let file = parse("package p\n\n// Pair types.\ntype (\n\tA int\n\tB = string\n)\n");
    assert_eq!(file.decls.len(), 2);
    assert_eq!(file.decls[0].doc(), ["// Pair types.".to_string()]);
    assert!(file.decls[1].doc().is_empty());
    let Decl::Type(b) = &file.decls[1] else {
        panic!("expected type declaration");
    };
    assert!(b.alias);
}

#[test]
fn normalize_imports_adds_known_and_drops_unused() {
    let mut file = parse(
        "package p\n\nimport (\n\t\"fmt\"\n\t\"sync\"\n)\n\nvar mu sync.Mutex\n\nvar api = jsoniter.ConfigFastest\n",
    );
    assert_eq!(
        used_packages(&file).into_iter().collect::<Vec<_>>(),
        vec!["jsoniter".to_string(), "sync".to_string()]
    );

    let changes = normalize_imports(&mut file, &KnownPackages::default());
    assert_eq!(changes.removed, vec!["fmt".to_string()]);
    assert_eq!(changes.added, vec!["github.com/json-iterator/go".to_string()]);

    let output = GoSerializer::new().serialize_file(&file);
    assert_eq!(
        output,
        "package p\n\nimport (\n\t\"sync\"\n\n\t\"github.com/json-iterator/go\"\n)\n\nvar mu sync.Mutex\n\nvar api = jsoniter.ConfigFastest\n"
    );
}

#[test]
fn local_variables_shadow_package_qualifiers() {
    let file = parse(
        "package p\n\nfunc f() int {\n\tstrings := []int{1}\n\treturn len(strings)\n}\n\nfunc g(sort T) {\n\tsort.Do()\n}\n",
    );
    assert!(used_packages(&file).is_empty());
}

#[test]
fn package_names_are_derived_from_paths() {
    assert_eq!(package_name_for_path("sync/atomic"), "atomic");
    assert_eq!(package_name_for_path("github.com/go-redis/redis/v8"), "redis");
    assert_eq!(package_name_for_path("github.com/mattn/go-sqlite3"), "sqlite3");
    let known = KnownPackages::default();
    assert_eq!(known.name_for_path("github.com/json-iterator/go"), "jsoniter");
}

#[test]
fn dump_ast_serializes_to_json() {
    let file = parse("package p\n\ntype Set map[string]struct{}\n");
    let json = serde_json::to_value(&file).expect("ast is serializable");
    assert_eq!(json["package"]["name"], "p");
    assert_eq!(
        GoSerializer::new().serialize_file(&file),
        "package p\n\ntype Set map[string]struct{}\n"
    );
}
