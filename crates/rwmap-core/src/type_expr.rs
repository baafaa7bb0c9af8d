use std::ops::Range;

use rwmap_golang::ast::{Expr, Field, Ident, Type, TypeKind};
use rwmap_golang::visit::{walk_expr_mut, walk_field_mut, walk_type_mut, Node, VisitMut};
use rwmap_golang::{GoParser, GoSerializer, Span};

use crate::error::{Error, Result};
use crate::rewrite::count_placeholders;

/// A caller-supplied key or value type.
///
/// `text` is the canonical gofmt rendering of `tree`; two expressions are the
/// same type exactly when their texts are equal.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    text: String,
    tree: Type,
}

impl TypeExpr {
    pub fn new(tree: Type) -> Self {
        let text = GoSerializer::new().type_to_string(&tree);
        Self { text, tree }
    }

    pub fn parse(parser: &mut GoParser, text: &str) -> Result<Self> {
        parser
            .parse_type(text)
            .map(Self::new)
            .map_err(|err| Error::MalformedTypeExpression {
                text: text.to_string(),
                span: (0, text.len()).into(),
                reason: err.to_string(),
            })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Type {
        &self.tree
    }

    /// A fresh copy of the type whose every node sits at `span`, the position
    /// of the placeholder it replaces.
    pub fn instantiate(&self, span: Span) -> Type {
        let mut ty = self.tree.clone();
        ty.accept_mut(&mut SpanSetter(span));
        ty
    }

    pub fn contains_placeholder(&self) -> bool {
        count_placeholders(&self.tree) > 0
    }
}

impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for TypeExpr {}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

struct SpanSetter(Span);

impl VisitMut for SpanSetter {
    fn visit_type_mut(&mut self, ty: &mut Type) {
        ty.span = self.0;
        walk_type_mut(self, ty);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        expr.span = self.0;
        walk_expr_mut(self, expr);
    }

    fn visit_field_mut(&mut self, field: &mut Field) {
        field.span = self.0;
        walk_field_mut(self, field);
    }

    fn visit_ident_mut(&mut self, ident: &mut Ident) {
        ident.span = self.0;
    }
}

/// The positional `map[K]V` argument split into its key and value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapArgument {
    pub key: TypeExpr,
    pub value: TypeExpr,
}

impl MapArgument {
    pub fn parse(parser: &mut GoParser, text: &str) -> Result<Self> {
        if !text.trim_start().starts_with("map") {
            return Err(Error::InvalidArgument(format!(
                "expected a map type `map[K]V`, got `{text}`"
            )));
        }
        let ty = match parser.parse_type(text) {
            Ok(ty) => ty,
            Err(err) => return Err(locate_malformed_half(parser, text, err.to_string())),
        };
        match ty.kind {
            TypeKind::Map { key, value } => Ok(Self {
                key: TypeExpr::new(*key),
                value: TypeExpr::new(*value),
            }),
            _ => Err(Error::InvalidArgument(format!(
                "expected a map type `map[K]V`, got `{text}`"
            ))),
        }
    }

    /// Whether key and value are the same type, which decides whether
    /// key/value parameter pairs stay merged.
    pub fn same_types(&self) -> bool {
        self.key == self.value
    }
}

/// Points the error at whichever half of `map[K]V` fails to parse on its own.
fn locate_malformed_half(parser: &mut GoParser, text: &str, reason: String) -> Error {
    let malformed = |span: Range<usize>, reason: String| Error::MalformedTypeExpression {
        text: text.to_string(),
        span: (span.start, span.end - span.start).into(),
        reason,
    };
    let Some((key, value)) = split_map_halves(text) else {
        return malformed(0..text.len(), reason);
    };
    if parser.parse_type(&text[key.clone()]).is_err() {
        return malformed(key, "key type does not parse".to_string());
    }
    if parser.parse_type(&text[value.clone()]).is_err() {
        return malformed(value, "value type does not parse".to_string());
    }
    malformed(0..text.len(), reason)
}

/// Byte ranges of `K` and `V` in `map[K]V`, found by bracket matching.
fn split_map_halves(text: &str) -> Option<(Range<usize>, Range<usize>)> {
    let start = text.find("map")? + "map".len();
    let open = start + text[start..].find('[')?;
    if !text[start..open].trim().is_empty() {
        return None;
    }
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let close = open + offset;
                    return Some((open + 1..close, close + 1..text.len()));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> GoParser {
        GoParser::new().expect("grammar should load")
    }

    #[test]
    fn map_argument_splits_key_and_value() {
        let arg = MapArgument::parse(&mut parser(), "map[string][]*pkg.Item").unwrap();
        assert_eq!(arg.key.text(), "string");
        assert_eq!(arg.value.text(), "[]*pkg.Item");
        assert!(!arg.same_types());

        let arg = MapArgument::parse(&mut parser(), "map[int]int").unwrap();
        assert!(arg.same_types());
    }

    #[test]
    fn non_map_arguments_are_invalid() {
        for text in ["[]int", "string", "mapping", "chan int"] {
            let err = MapArgument::parse(&mut parser(), text).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{text}: {err:?}");
        }
    }

    #[test]
    fn malformed_halves_are_labelled() {
        let err = MapArgument::parse(&mut parser(), "map[string]").unwrap_err();
        let Error::MalformedTypeExpression { span, reason, .. } = &err else {
            panic!("expected malformed type expression, got {err:?}");
        };
        assert_eq!(span.offset(), "map[string]".len());
        assert_eq!(reason, "value type does not parse");

        let err = MapArgument::parse(&mut parser(), "map[func(]int").unwrap_err();
        let Error::MalformedTypeExpression { span, reason, .. } = &err else {
            panic!("expected malformed type expression, got {err:?}");
        };
        assert_eq!((span.offset(), span.len()), (4, 5));
        assert_eq!(reason, "key type does not parse");
    }

    #[test]
    fn instantiate_moves_every_node_to_the_given_span() {
        let expr = TypeExpr::parse(&mut parser(), "map[string]*Item").unwrap();
        let span = Span::new(40, 51, 7, 7);
        let ty = expr.instantiate(span);
        assert_eq!(ty.span, span);
        let TypeKind::Map { key, value } = &ty.kind else {
            panic!("expected map type");
        };
        assert_eq!(key.span, span);
        let TypeKind::Pointer(inner) = &value.kind else {
            panic!("expected pointer type");
        };
        assert_eq!(inner.span, span);
        assert_eq!(GoSerializer::new().type_to_string(&ty), "map[string]*Item");
    }

    #[test]
    fn placeholder_inside_caller_type_is_detected() {
        assert!(TypeExpr::parse(&mut parser(), "[]interface{}")
            .unwrap()
            .contains_placeholder());
        assert!(!TypeExpr::parse(&mut parser(), "[]any").unwrap().contains_placeholder());
    }
}
