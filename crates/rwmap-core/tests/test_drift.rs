use rwmap_core::registry::Namespace;
use rwmap_core::{Drift, Error, Extension, SpecializeOptions, Specializer, Stage, Template};

fn stock_source() -> String {
    Template::new(Extension::Accumulate).source().to_string()
}

fn run(source: String) -> Result<(), Error> {
    let options = SpecializeOptions::new("map[string]int").with_extension(Extension::Accumulate);
    let mut specializer = Specializer::with_template(options, Template::from_source(source));
    let result = specializer.specialize().map(|_| ());
    if result.is_err() {
        assert_eq!(specializer.stage(), Stage::Failed);
    }
    result
}

fn drift(source: String) -> Drift {
    match run(source) {
        Err(Error::TemplateDrift(drift)) => drift,
        other => panic!("expected template drift, got {other:?}"),
    }
}

/// Cuts the function starting at `header` (through its closing brace).
fn remove_func(source: &str, header: &str) -> String {
    let start = source
        .find(header)
        .unwrap_or_else(|| panic!("template has no {header:?}"));
    let end = start
        + source[start..]
            .find("\n}\n")
            .expect("function has a closing brace")
        + "\n}\n".len();
    format!("{}{}", &source[..start], &source[end..])
}

#[test]
fn stock_template_has_no_drift() {
    run(stock_source()).expect("stock template specializes");
}

/// `(header, registry entry)` for every top-level func and type of the template.
fn declaration_headers(source: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter_map(|line| {
            if let Some(rest) = line.strip_prefix("func (m *Map) ") {
                let name = &rest[..rest.find('(')?];
                Some((format!("func (m *Map) {name}("), format!("function {name}")))
            } else if let Some(rest) = line.strip_prefix("type ") {
                let name = rest.split_whitespace().next()?;
                Some((format!("type {name} "), format!("type {name}")))
            } else {
                None
            }
        })
        .collect()
}

#[test]
fn removed_declarations_are_unconsumed() {
    let source = stock_source();
    let headers = declaration_headers(&source);
    assert_eq!(headers.len(), 22);
    for (header, entry) in headers {
        match drift(remove_func(&source, &header)) {
            Drift::Unconsumed { entries } => assert_eq!(entries, vec![entry], "{header}"),
            other => panic!("{header}: expected unconsumed entries, got {other:?}"),
        }
    }
}

#[test]
fn added_declarations_are_unrecognized() {
    let cases = [
        (
            "\nfunc (m *Map) Len() int {\n\treturn len(m.data)\n}\n",
            Namespace::Func,
            "Len",
        ),
        (
            "\nvar ErrMissing = errors.New(\"missing\")\n",
            Namespace::Value,
            "ErrMissing",
        ),
        ("\ntype Pair struct {\n\tkey interface{}\n}\n", Namespace::Type, "Pair"),
        // a second declaration with a name already claimed
        (
            "\nfunc (m *Map) Delete(key interface{}) {}\n",
            Namespace::Func,
            "Delete",
        ),
    ];
    for (extra, expected_namespace, expected_name) in cases {
        let source = format!("{}{extra}", stock_source());
        match drift(source) {
            Drift::Unrecognized { namespace, name } => {
                assert_eq!(namespace, expected_namespace);
                assert_eq!(name, expected_name);
            }
            other => panic!("{expected_name}: expected unrecognized, got {other:?}"),
        }
    }
}

#[test]
fn changed_signatures_are_shape_drift() {
    let source = stock_source().replace(
        "func (m *Map) Store(key, value interface{}) {",
        "func (m *Map) Store(key interface{}, value interface{}) {",
    );
    match drift(source) {
        Drift::Shape {
            namespace, name, ..
        } => {
            assert_eq!(namespace, Namespace::Func);
            assert_eq!(name, "Store");
        }
        other => panic!("expected shape drift, got {other:?}"),
    }

    let source = stock_source().replace(
        "func (m *Map) Range(f func(key, value interface{}) bool) {",
        "func (m *Map) Range(f interface{}) {",
    );
    assert!(matches!(drift(source), Drift::Shape { name, .. } if name == "Range"));
}

#[test]
fn renamed_bulk_allocation_target_is_drift() {
    let source = stock_source().replacen(
        "\tkeys := make([]interface{}, 0, len(m.data))",
        "\tks := make([]interface{}, 0, len(m.data))",
        1,
    );
    match drift(source) {
        Drift::Shape { name, detail, .. } => {
            assert_eq!(name, "DeleteAll");
            assert!(detail.contains("`ks`"), "{detail}");
        }
        other => panic!("expected shape drift, got {other:?}"),
    }
}

#[test]
fn missing_absent_sentinel_is_drift() {
    let source = stock_source().replacen("\t\treturn nil, false\n", "\t\treturn\n", 1);
    assert!(matches!(drift(source), Drift::Shape { name, .. } if name == "Load"));
}

#[test]
fn placeholder_outside_any_rewrite_is_drift() {
    let source = stock_source().replace(
        "func (m *Map) Init() *Map {\n",
        "func (m *Map) Init() *Map {\n\tvar _ interface{} = m\n",
    );
    assert!(matches!(drift(source), Drift::Placeholder { count: 1 }));
}

#[test]
fn placeholder_in_untouched_declaration_is_drift() {
    let source = stock_source().replace(
        "func (m *Map) ToDB() (data []byte, err error) {",
        "func (m *Map) ToDB() (data interface{}, err error) {",
    );
    assert!(matches!(drift(source), Drift::Shape { name, .. } if name == "ToDB"));
}

#[test]
fn unparsable_template_is_malformed() {
    let err = run("package rwmap\n\nfunc (m *Map) Load(".to_string()).unwrap_err();
    assert!(matches!(err, Error::MalformedTemplate(_)), "{err:?}");
}
