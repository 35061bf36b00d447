//! Integration tests for whole-unit compilation: lowering, dependency
//! extraction and the generator-facing output.

use std::fmt::Write;

use weld_expr::diagnostics::DiagnosticOptions;
use weld_expr::expr::{BinaryOp, LiteralKind};
use weld_expr::model::TypeCatalog;
use weld_expr::pool::ExprPool;
use weld_expr::syntax::{lower, lower_root, SyntaxExpr};
use weld_expr::ty::TypeDesc;
use weld_expr::{compile_unit, CompiledUnit};

// ── Helpers ────────────────────────────────────────────────────────────

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new().with_default_package("java.lang");
    catalog.add_class("java.lang.Object");
    catalog.add_class("java.lang.String").method("length", &[], "int");
    catalog.add_class("android.view.View").field("VISIBLE", "int");
    catalog
        .add_class("com.example.User")
        .field("name", "java.lang.String")
        .method("getAge", &[], "int");
    catalog
}

fn ident(name: &str) -> SyntaxExpr {
    SyntaxExpr::ident(name)
}

fn bindings() -> Vec<SyntaxExpr> {
    vec![
        SyntaxExpr::binary(
            BinaryOp::Add,
            ident("user").field("name"),
            SyntaxExpr::literal(LiteralKind::String, "!"),
        ),
        ident("android").field("view").field("View").field("VISIBLE"),
        SyntaxExpr::ternary(
            ident("flag"),
            ident("user").field("age"),
            SyntaxExpr::literal(LiteralKind::Int, "0"),
        ),
    ]
}

fn compile(trees: &[SyntaxExpr]) -> (ExprPool, CompiledUnit) {
    let mut pool = ExprPool::new();
    pool.declare("user", "com.example.User").unwrap();
    pool.declare("flag", "boolean").unwrap();
    for tree in trees {
        lower_root(&mut pool, tree);
    }
    let unit = compile_unit(&mut pool, &catalog());
    (pool, unit)
}

fn summarize(unit: &CompiledUnit) -> String {
    let mut out = String::new();
    for binding in &unit.bindings {
        writeln!(out, "{} : {}", binding.key, binding.ty).unwrap();
        for dep in &binding.dependencies {
            writeln!(out, "  <- {}", dep).unwrap();
        }
    }
    for observer in &unit.observers {
        let ty = observer.ty.as_ref().map(|t| t.to_string()).unwrap_or_default();
        writeln!(
            out,
            "observe {} ({}) -> {}",
            observer.name,
            ty,
            observer.bindings.join(", ")
        )
        .unwrap();
    }
    for err in &unit.errors {
        writeln!(out, "error[{}] {}: {}", err.code, err.key, err.message).unwrap();
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_unit_summary() {
    let (_, unit) = compile(&bindings());
    insta::assert_snapshot!(summarize(&unit), @r#"
    bin(field(id(user).name) + lit:string("!")) : java.lang.String
      <- field(id(user).name)
      <- id(user)
    field(field(field(id(android).view).View).VISIBLE) : int
    tern(id(flag) ? field(id(user).age) : lit:int("0")) : int
      <- field(id(user).age)
      <- id(flag)
      <- id(user)
    observe flag (boolean) -> tern(id(flag) ? field(id(user).age) : lit:int("0"))
    observe user (com.example.User) -> bin(field(id(user).name) + lit:string("!")), tern(id(flag) ? field(id(user).age) : lit:int("0"))
    "#);
}

#[test]
fn test_output_is_independent_of_registration_order() {
    let trees = bindings();
    let mut reversed = trees.clone();
    reversed.reverse();

    let (_, forward) = compile(&trees);
    let (_, backward) = compile(&reversed);
    assert_eq!(forward, backward);
}

#[test]
fn test_duplicate_binding_is_one_root() {
    let tree = ident("user").field("name");
    let (pool, unit) = compile(&[tree.clone(), tree]);
    assert_eq!(pool.roots().len(), 1);
    assert_eq!(unit.bindings.len(), 1);
}

#[test]
fn test_static_expression_has_no_dependencies() {
    let tree = SyntaxExpr::binary(
        BinaryOp::Mul,
        SyntaxExpr::literal(LiteralKind::Int, "2"),
        SyntaxExpr::literal(LiteralKind::Long, "3"),
    );
    let (_, unit) = compile(&[tree]);
    assert_eq!(unit.bindings[0].ty, TypeDesc::long());
    assert!(unit.bindings[0].dependencies.is_empty());
    assert!(unit.observers.is_empty());
}

#[test]
fn test_leaf_dependency_law() {
    let mut pool = ExprPool::new();
    let a = pool.declare("a", "int").unwrap();
    let b = pool.declare("b", "int").unwrap();
    let ab = pool.binary(BinaryOp::Add, a, b);
    let outer = pool.binary(BinaryOp::Mul, ab, a);
    pool.resolve_type(outer, &catalog()).unwrap();

    let mut expected = pool.construct_dependencies(ab);
    expected.insert(ab);
    expected.extend(pool.construct_dependencies(a));
    expected.insert(a);
    assert_eq!(pool.construct_dependencies(outer), expected);
    assert_eq!(expected.len(), 3);
}

#[test]
fn test_failed_binding_does_not_affect_siblings() {
    let trees = vec![
        ident("usr").field("name").at(2, 10),
        ident("user").field("name"),
    ];
    let (pool, unit) = compile(&trees);

    assert_eq!(unit.bindings.len(), 1);
    assert_eq!(unit.bindings[0].key, "field(id(user).name)");
    assert_eq!(unit.errors.len(), 1);
    assert_eq!(unit.errors[0].code, "B0001");
    assert_eq!(unit.errors[0].key, "field(id(usr).name)");
    assert!(pool.find("field(id(usr).name)").is_some());
}

#[test]
fn test_error_span_points_at_failing_node() {
    let source = "@{usr.name}";
    let tree = ident("usr").at(2, 5).field("name").at(2, 10);
    let (_, unit) = compile(&[tree]);

    assert_eq!(unit.errors[0].span, Some(2..5));
    let rendered = unit.render_errors(source, "main.xml", &DiagnosticOptions::colorless());
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].contains("undefined variable `usr`"), "{}", rendered[0]);
}

#[test]
fn test_class_path_binding_is_ambiguous() {
    let (_, unit) = compile(&[ident("android").field("view").field("View")]);
    insta::assert_snapshot!(summarize(&unit), @"error[B0003] field(field(id(android).view).View): `android.view.View` names a package or class, but a value is expected here");
}

#[test]
fn test_lowering_reuses_nodes_across_bindings() {
    let mut pool = ExprPool::new();
    pool.declare("user", "com.example.User").unwrap();
    let first = lower(&mut pool, &ident("user").field("name"));
    let second = lower(&mut pool, &ident("user").field("name").call("length", vec![]));
    assert_eq!(pool.get(second).children(), vec![first]);
    assert_eq!(pool.len(), 3);
}
