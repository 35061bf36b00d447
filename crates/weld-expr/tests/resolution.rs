//! Integration tests for type resolution.
//!
//! These tests exercise:
//! - Interning and single resolution of shared sub-expressions
//! - Declared and undeclared identifiers
//! - Package-prefix precedence, multi-segment class paths and imports
//! - Getter conventions and static receivers
//! - Memoized failures

use std::cell::Cell;

use weld_expr::error::ResolveError;
use weld_expr::expr::{BinaryOp, LiteralKind};
use weld_expr::model::{ImportTable, TypeCatalog, TypeModel, TypeNotFound};
use weld_expr::pool::{ExprPool, Resolution};
use weld_expr::ty::TypeDesc;

// ── Helpers ────────────────────────────────────────────────────────────

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new().with_default_package("java.lang");
    catalog
        .add_class("java.lang.Object")
        .method("toString", &[], "java.lang.String");
    catalog.add_class("java.lang.String").method("length", &[], "int");
    catalog
        .add_class("java.lang.Math")
        .method("max", &["int", "int"], "int");
    catalog
        .add_class("android.view.View")
        .field("VISIBLE", "int")
        .field("GONE", "int");
    catalog
        .add_class("com.example.User")
        .field("name", "java.lang.String")
        .method("getAge", &[], "int")
        .method("isActive", &[], "boolean");
    catalog.add_class("foo.Bar");
    catalog
}

/// Wraps a catalog and counts every query made against it.
struct CountingModel {
    inner: TypeCatalog,
    finds: Cell<usize>,
    fields: Cell<usize>,
    methods: Cell<usize>,
}

impl CountingModel {
    fn new() -> Self {
        CountingModel {
            inner: catalog(),
            finds: Cell::new(0),
            fields: Cell::new(0),
            methods: Cell::new(0),
        }
    }

    fn total(&self) -> usize {
        self.finds.get() + self.fields.get() + self.methods.get()
    }
}

impl TypeModel for CountingModel {
    fn find_type(&self, name: &str, imports: &ImportTable) -> Result<TypeDesc, TypeNotFound> {
        self.finds.set(self.finds.get() + 1);
        self.inner.find_type(name, imports)
    }

    fn field_type(&self, owner: &TypeDesc, field: &str) -> Option<TypeDesc> {
        self.fields.set(self.fields.get() + 1);
        self.inner.field_type(owner, field)
    }

    fn method_return_type(
        &self,
        owner: &TypeDesc,
        method: &str,
        args: &[TypeDesc],
    ) -> Option<TypeDesc> {
        self.methods.set(self.methods.get() + 1);
        self.inner.method_return_type(owner, method, args)
    }
}

fn user_pool() -> ExprPool {
    let mut pool = ExprPool::new();
    pool.declare("user", "com.example.User").unwrap();
    pool
}

// ── Identity and memoization ───────────────────────────────────────────

#[test]
fn test_shared_subexpression_resolves_once() {
    let model = CountingModel::new();
    let mut pool = user_pool();
    let user = pool.identifier("user");
    let name = pool.field_access(user, "name");
    let again = pool.field_access(user, "name");
    assert_eq!(name, again);

    let len = pool.method_call(name, "length", vec![]);
    assert_eq!(pool.resolve_value(name, &model), Ok(TypeDesc::string()));
    assert_eq!(pool.resolve_value(len, &model), Ok(TypeDesc::int()));
    assert_eq!(pool.resolve_value(again, &model), Ok(TypeDesc::string()));

    assert_eq!(model.finds.get(), 1, "declared type looked up once");
    assert_eq!(model.fields.get(), 1, "field looked up once");
    assert_eq!(model.methods.get(), 1);
}

#[test]
fn test_failure_is_memoized() {
    let model = CountingModel::new();
    let mut pool = ExprPool::new();
    let missing = pool.identifier("missing");
    let call = pool.method_call(missing, "length", vec![]);

    let first = pool.resolve_type(call, &model);
    let queries = model.total();
    let second = pool.resolve_type(call, &model);

    assert_eq!(first, second);
    assert_eq!(model.total(), queries, "no model queries on repeat");
    assert_eq!(
        first,
        Err(ResolveError::UndefinedVariable {
            name: "missing".into(),
            span: None,
        })
    );
    assert!(pool.failure(missing).is_some());
    assert!(pool.failure(call).is_some());
    assert_eq!(pool.find("id(missing)"), Some(missing), "failed node stays in the pool");
}

// ── Identifiers ────────────────────────────────────────────────────────

#[test]
fn test_round_trip_declared_identifier() {
    let mut catalog = TypeCatalog::new().with_default_package("java.lang");
    catalog.add_class("java.lang.String").method("length", &[], "int");
    let mut pool = ExprPool::new();
    let x = pool.declare("x", "String").unwrap();

    assert_eq!(pool.resolve_type(x, &catalog), Ok(TypeDesc::string()));
    assert!(pool.construct_dependencies(x).is_empty());

    let sum = pool.binary(BinaryOp::Add, x, x);
    assert_eq!(pool.resolve_type(sum, &catalog), Ok(TypeDesc::string()));
    let deps = pool.construct_dependencies(sum);
    assert_eq!(deps.len(), 1);
    assert!(deps.contains(&x));
}

#[test]
fn test_undeclared_identifier_is_undefined() {
    let mut pool = ExprPool::new();
    let ghost = pool.identifier("ghost");
    assert_eq!(
        pool.resolve_type(ghost, &catalog()),
        Err(ResolveError::UndefinedVariable {
            name: "ghost".into(),
            span: None,
        })
    );
}

#[test]
fn test_declared_type_resolves_through_imports() {
    let mut imports = ImportTable::new();
    imports.insert("Person", "com.example.User");
    let mut pool = ExprPool::with_imports(imports);
    let person = pool.declare("person", "Person").unwrap();
    let name = pool.field_access(person, "name");
    assert_eq!(pool.resolve_type(name, &catalog()), Ok(TypeDesc::string()));
}

#[test]
fn test_bare_class_name_as_value_is_ambiguous() {
    let mut pool = ExprPool::new();
    let math = pool.identifier("Math");
    assert_eq!(
        pool.resolve_value(math, &catalog()),
        Err(ResolveError::AmbiguousPackageOrValue {
            name: "Math".into(),
            span: None,
        })
    );
}

// ── Package prefixes ───────────────────────────────────────────────────

#[test]
fn test_package_prefix_wins_when_qualified_type_exists() {
    let mut pool = ExprPool::new();
    let foo = pool.identifier("foo");
    let bar = pool.field_access(foo, "Bar");

    assert_eq!(
        pool.resolve_type(bar, &catalog()),
        Ok(TypeDesc::reference("foo.Bar"))
    );
    assert!(matches!(pool.resolution(bar), Some(Resolution::TypeRef(_))));
    assert!(pool.resolution(foo).is_none(), "prefix stays typeless");
    assert!(pool.failure(foo).is_none(), "prefix raises nothing");
}

#[test]
fn test_package_prefix_falls_back_to_variable() {
    let mut pool = ExprPool::new();
    let foo = pool.identifier("foo");
    let baz = pool.field_access(foo, "Baz");
    assert_eq!(
        pool.resolve_type(baz, &catalog()),
        Err(ResolveError::UndefinedVariable {
            name: "foo".into(),
            span: None,
        })
    );
}

#[test]
fn test_multi_segment_static_field() {
    let mut pool = ExprPool::new();
    let android = pool.identifier("android");
    let view_pkg = pool.field_access(android, "view");
    let view = pool.field_access(view_pkg, "View");
    let visible = pool.field_access(view, "VISIBLE");

    assert_eq!(pool.resolve_value(visible, &catalog()), Ok(TypeDesc::int()));
    assert_eq!(
        pool.resolution(view),
        Some(&Resolution::TypeRef(TypeDesc::reference("android.view.View")))
    );
    assert!(pool.resolution(view_pkg).is_none());
    assert!(pool.resolution(android).is_none());
    assert!(!pool.is_dynamic(visible));
    assert!(pool.construct_dependencies(visible).is_empty());
    assert_eq!(pool.package_path(view).as_deref(), Some("android.view.View"));
}

#[test]
fn test_class_path_as_value_is_ambiguous() {
    let mut pool = ExprPool::new();
    let android = pool.identifier("android");
    let view_pkg = pool.field_access(android, "view");
    let view = pool.field_access(view_pkg, "View");

    assert_eq!(
        pool.resolve_value(view, &catalog()),
        Err(ResolveError::AmbiguousPackageOrValue {
            name: "android.view.View".into(),
            span: None,
        })
    );
    assert_eq!(
        pool.resolve_type(view, &catalog()),
        Ok(TypeDesc::reference("android.view.View"))
    );
}

#[test]
fn test_imported_class_as_static_receiver() {
    let mut imports = ImportTable::new();
    imports.import("android.view.View");
    let mut pool = ExprPool::with_imports(imports);
    let view = pool.identifier("View");
    let gone = pool.field_access(view, "GONE");
    assert_eq!(pool.resolve_value(gone, &catalog()), Ok(TypeDesc::int()));
    assert!(pool.resolution(view).is_none());
}

#[test]
fn test_static_call_depends_on_arguments_only() {
    let mut pool = ExprPool::new();
    let a = pool.declare("a", "int").unwrap();
    let one = pool.literal(LiteralKind::Int, "1");
    let math = pool.identifier("Math");
    let call = pool.method_call(math, "max", vec![a, one]);

    assert_eq!(pool.resolve_value(call, &catalog()), Ok(TypeDesc::int()));
    let deps = pool.construct_dependencies(call);
    assert_eq!(deps.len(), 1);
    assert!(deps.contains(&a));
}

// ── Members and operators ──────────────────────────────────────────────

#[test]
fn test_getter_fallback() {
    let mut pool = user_pool();
    let user = pool.identifier("user");
    let age = pool.field_access(user, "age");
    let active = pool.field_access(user, "active");
    let email = pool.field_access(user, "email");
    let catalog = catalog();

    assert_eq!(pool.resolve_value(age, &catalog), Ok(TypeDesc::int()));
    assert_eq!(pool.resolve_value(active, &catalog), Ok(TypeDesc::boolean()));
    assert_eq!(
        pool.resolve_value(email, &catalog),
        Err(ResolveError::NoSuchField {
            owner: TypeDesc::reference("com.example.User"),
            field: "email".into(),
            span: None,
        })
    );
}

#[test]
fn test_first_failing_operand_aborts() {
    let mut pool = ExprPool::new();
    let first = pool.identifier("first");
    let second = pool.identifier("second");
    let sum = pool.binary(BinaryOp::Add, first, second);
    let err = pool.resolve_type(sum, &catalog()).unwrap_err();
    assert_eq!(err.name(), "first");
    assert!(pool.failure(second).is_none(), "right operand never visited");
}

#[test]
fn test_operator_mismatch_names_operand_types() {
    let mut pool = user_pool();
    let user = pool.identifier("user");
    let one = pool.literal(LiteralKind::Int, "1");
    let and = pool.binary(BinaryOp::And, user, one);
    assert_eq!(
        pool.resolve_type(and, &catalog()),
        Err(ResolveError::OperatorMismatch {
            op: "&&".into(),
            operands: vec![TypeDesc::reference("com.example.User"), TypeDesc::int()],
            span: None,
        })
    );
}
