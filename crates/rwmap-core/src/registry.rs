//! The declarations the template is expected to contain, each bound to the
//! rewrite that specializes it.
//!
//! The registry is the contract between the template text and the
//! specializer: every template declaration must have an entry here and every
//! entry must be claimed by exactly one declaration.

use std::collections::BTreeMap;

use derive_more::Display;
use rwmap_golang::ast::{Block, FieldList, FuncDecl, Ident, TypeKind, TypeSpec, ValueSpec};

use crate::rewrite::{
    count_placeholders, expect_rewrites, retype_bulk_allocations, rewrite_absent_sentinel,
    split_dual_slot, substitute, substitute_map_types, RewriteResult, ShapeMismatch, Slot,
};
use crate::type_expr::MapArgument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Namespace {
    #[display("type")]
    Type,
    #[display("function")]
    Func,
    #[display("value")]
    Value,
}

pub type TypeHandler = fn(&mut TypeSpec, &MapArgument) -> RewriteResult<()>;
pub type FuncHandler = fn(&mut FuncDecl, &MapArgument) -> RewriteResult<()>;
pub type ValueHandler = fn(&mut ValueSpec, &MapArgument) -> RewriteResult<()>;

/// Handlers keyed by declaration name, one table per namespace. Taking a
/// handler removes it, so a second declaration with the same name is
/// reported as unrecognized.
#[derive(Debug, Clone)]
pub struct DeclarationRegistry {
    types: BTreeMap<&'static str, TypeHandler>,
    funcs: BTreeMap<&'static str, FuncHandler>,
    values: BTreeMap<&'static str, ValueHandler>,
}

impl Default for DeclarationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationRegistry {
    /// The entries are the same whichever accumulate variant the template
    /// carries; both variants declare `AddStore` and `AddStores` with the same
    /// signatures.
    pub fn new() -> Self {
        let types: [(&'static str, TypeHandler); 1] = [("Map", container)];
        let funcs: [(&'static str, FuncHandler); 21] = [
            ("checkData", map_types_in_body),
            ("Init", map_types_in_body),
            ("Change", map_types_in_params),
            ("Load", load),
            ("Store", key_value_params),
            ("Stores", keys_values_params),
            ("StoreMap", store_map),
            ("LoadOrStore", store_returning_value),
            ("LoadAndDelete", load),
            ("Delete", key_param),
            ("DeleteAll", delete_all),
            ("Range", range),
            ("Items", items),
            ("ItemMap", item_map),
            ("FromDB", untouched),
            ("ToDB", untouched),
            ("MarshalJSON", untouched),
            ("UnmarshalJSON", map_types_in_body),
            ("String", untouched),
            ("AddStore", store_returning_value),
            ("AddStores", keys_values_params),
        ];
        Self {
            types: BTreeMap::from(types),
            funcs: BTreeMap::from(funcs),
            values: BTreeMap::new(),
        }
    }

    pub fn take_type(&mut self, name: &str) -> Option<TypeHandler> {
        self.types.remove(name)
    }

    pub fn take_func(&mut self, name: &str) -> Option<FuncHandler> {
        self.funcs.remove(name)
    }

    pub fn take_value(&mut self, name: &str) -> Option<ValueHandler> {
        self.values.remove(name)
    }

    /// Entries no declaration has claimed yet, as `namespace name`.
    pub fn pending(&self) -> Vec<String> {
        let types = self.types.keys().map(|name| (Namespace::Type, name));
        let funcs = self.funcs.keys().map(|name| (Namespace::Func, name));
        let values = self.values.keys().map(|name| (Namespace::Value, name));
        types
            .chain(funcs)
            .chain(values)
            .map(|(namespace, name)| format!("{namespace} {name}"))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len() + self.funcs.len() + self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn results(func: &mut FuncDecl) -> RewriteResult<&mut FieldList> {
    func.ty
        .results
        .as_mut()
        .filter(|results| !results.is_empty())
        .ok_or_else(|| ShapeMismatch::new("expected results"))
}

fn body(func: &mut FuncDecl) -> RewriteResult<&mut Block> {
    func.body
        .as_mut()
        .ok_or_else(|| ShapeMismatch::new("expected a body"))
}

fn first_result_name(func: &FuncDecl) -> RewriteResult<Ident> {
    func.ty
        .results
        .as_ref()
        .and_then(|results| results.list.first())
        .and_then(|field| field.names.first())
        .cloned()
        .ok_or_else(|| ShapeMismatch::new("expected a named first result"))
}

/// `type Map struct { data map[interface{}]interface{}; ... }`
fn container(spec: &mut TypeSpec, arg: &MapArgument) -> RewriteResult<()> {
    let TypeKind::Struct(fields) = &mut spec.ty.kind else {
        return Err(ShapeMismatch::new("expected a struct type"));
    };
    let backing = fields
        .first_mut()
        .ok_or_else(|| ShapeMismatch::new("expected a backing map field"))?;
    expect_rewrites(
        substitute_map_types(backing, &arg.key, &arg.value),
        "backing field is not map[interface{}]interface{}",
    )?;
    Ok(())
}

fn map_types_in_body(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    let count = substitute_map_types(body(func)?, &arg.key, &arg.value);
    expect_rewrites(count, "expected a placeholder map in the body")?;
    Ok(())
}

fn map_types_in_params(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    let count = substitute_map_types(&mut func.ty.params, &arg.key, &arg.value);
    expect_rewrites(count, "expected a placeholder map parameter")?;
    Ok(())
}

fn key_param(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    let count = substitute(&mut func.ty.params, &arg.key);
    expect_rewrites(count, "expected a placeholder key parameter")?;
    Ok(())
}

fn value_results(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    let count = substitute(results(func)?, &arg.value);
    expect_rewrites(count, "expected a placeholder value result")?;
    Ok(())
}

/// `func (m *Map) Load(key interface{}) (value interface{}, ok bool)` and
/// `LoadAndDelete`, which return `nil` for a missing key.
fn load(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    key_param(func, arg)?;
    value_results(func, arg)?;
    let result = first_result_name(func)?;
    let count = rewrite_absent_sentinel(body(func)?, &result);
    expect_rewrites(count, "expected a `return nil, ...` for a missing key")?;
    Ok(())
}

/// `(key, value interface{})`
fn key_value_params(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    split_dual_slot(&mut func.ty.params, Slot::Single, arg)
}

/// `(keys, values []interface{})`
fn keys_values_params(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    split_dual_slot(&mut func.ty.params, Slot::Sequence, arg)
}

fn store_map(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    map_types_in_params(func, arg)?;
    // the body only ranges over the argument; nothing to require there
    substitute_map_types(body(func)?, &arg.key, &arg.value);
    Ok(())
}

/// `LoadOrStore` and `AddStore`: a key/value pair in, a value out.
fn store_returning_value(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    key_value_params(func, arg)?;
    value_results(func, arg)
}

fn delete_all(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    retype_bulk_allocations(body(func)?, &arg.key, &arg.value, 1)?;
    Ok(())
}

/// `Range(f func(key, value interface{}) bool)`
fn range(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    let [callback] = func.ty.params.list.as_mut_slice() else {
        return Err(ShapeMismatch::new("expected a single callback parameter"));
    };
    let TypeKind::Func(callback) = &mut callback.ty.kind else {
        return Err(ShapeMismatch::new("callback parameter is not a function type"));
    };
    split_dual_slot(&mut callback.params, Slot::Single, arg)
}

/// `Items() (keys, values []interface{})`
fn items(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    split_dual_slot(results(func)?, Slot::Sequence, arg)?;
    retype_bulk_allocations(body(func)?, &arg.key, &arg.value, 2)?;
    Ok(())
}

fn item_map(func: &mut FuncDecl, arg: &MapArgument) -> RewriteResult<()> {
    let count = substitute_map_types(results(func)?, &arg.key, &arg.value);
    expect_rewrites(count, "expected a placeholder map result")?;
    map_types_in_body(func, arg)
}

/// Declarations that never mention the placeholder.
fn untouched(func: &mut FuncDecl, _arg: &MapArgument) -> RewriteResult<()> {
    match count_placeholders(&*func) {
        0 => Ok(()),
        count => Err(ShapeMismatch::new(format!(
            "expected no placeholder types, found {count}"
        ))),
    }
}
