//! Semantic analysis through the public API.
//!
//! Each test builds a small program, runs `check` / `analyze_with`, and looks
//! at the diagnostics or inferred types that come back.

use brew_lang::syntax::ast::*;
use brew_lang::{Diagnostic, DiagnosticSink, ErrorCode, Options, check, check_with, analyze_with};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn ok(decls: Vec<Decl>) -> brew_lang::TypeTable {
    check(&Program::new(decls)).unwrap_or_else(|errs| {
        panic!("expected analysis to succeed, got diagnostics: {errs:#?}");
    })
}

fn err(decls: Vec<Decl>) -> Vec<Diagnostic> {
    match check(&Program::new(decls)) {
        Ok(_)  => panic!("expected analysis to fail but it succeeded"),
        Err(e) => e,
    }
}

fn codes(errs: &[Diagnostic]) -> Vec<ErrorCode> {
    errs.iter().map(Diagnostic::code).collect()
}

fn main_fn(locals: Vec<VarDecl>, stmts: Vec<Stmt>) -> Decl {
    FnDecl::new("main", Type::Void, vec![]).with_body(Block::new(locals, stmts)).into()
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn duplicate_global_is_one_conflict() {
    let errs = err(vec![
        VarDecl::new("x", Type::Int).at(1, 1).into(),
        VarDecl::new("x", Type::Int).at(2, 1).into(),
    ]);
    assert_eq!(codes(&errs), [ErrorCode::S001]);
    assert!(errs[0].to_string().contains("line 1"), "{}", errs[0]);
}

#[test]
fn int_condition_is_one_test_error() {
    let errs = err(vec![main_fn(
        vec![VarDecl::new("y", Type::Int)],
        vec![Stmt::If(IfStmt::new(Expr::var("y").at(3, 9), Block::default(), None))],
    )]);
    assert_eq!(codes(&errs), [ErrorCode::S016]);
    assert_eq!(errs[0].span(), Span::new(3, 9));
}

#[test]
fn inherited_method_resolves_through_subclass() {
    let call = Expr::method(Expr::new_object("B"), "f", vec![Expr::int(3)]);
    let id = call.id;
    let types = ok(vec![
        ClassDecl::new("A")
            .member(FnDecl::new("f", Type::Int, vec![VarDecl::new("n", Type::Int)]).with_body(
                Block::new(vec![], vec![Stmt::Return(Some(Expr::var("n")), Span::default())]),
            ))
            .into(),
        ClassDecl::new("B").extends("A").into(),
        main_fn(vec![], vec![Stmt::Expr(call)]),
    ]);
    assert_eq!(types.get(id), Some(&Type::Int));
}

#[test]
fn array_subscript_and_length() {
    let bad = Expr::index(Expr::var("a"), Expr::bool(true));
    let field = Expr::field(Expr::var("a"), "length");
    let call = Expr::method(Expr::var("a"), "length", vec![]);
    let errs = err(vec![main_fn(
        vec![VarDecl::new("a", Type::array_of(Type::Int))],
        vec![Stmt::Expr(bad), Stmt::Expr(field), Stmt::Expr(call)],
    )]);
    assert_eq!(codes(&errs), [ErrorCode::S018]);
}

#[test]
fn call_arity_mismatch_suppresses_argument_checks() {
    let f: Decl = FnDecl::new("f", Type::Void, vec![VarDecl::new("n", Type::Int)])
        .with_body(Block::default())
        .into();
    let errs = err(vec![
        f,
        main_fn(vec![], vec![
            Stmt::Expr(Expr::call("f", vec![Expr::int(1)])),
            Stmt::Expr(Expr::call("f", vec![Expr::int(1), Expr::bool(true)])),
        ]),
    ]);
    assert_eq!(codes(&errs), [ErrorCode::S010]);
}

#[test]
fn interface_contract_violation_and_fix() {
    let iface = || -> Decl {
        InterfaceDecl::new("I", vec![FnDecl::new("m", Type::Bool, vec![VarDecl::new("x", Type::Int)])]).into()
    };
    let errs = err(vec![
        iface(),
        ClassDecl::new("C")
            .implements("I")
            .member(FnDecl::new("m", Type::Void, vec![VarDecl::new("x", Type::Int)]).with_body(Block::default()))
            .into(),
    ]);
    assert_eq!(codes(&errs), [ErrorCode::S003]);

    ok(vec![
        iface(),
        ClassDecl::new("C")
            .implements("I")
            .member(FnDecl::new("m", Type::Bool, vec![VarDecl::new("x", Type::Int)]).with_body(
                Block::new(vec![], vec![Stmt::Return(Some(Expr::bool(true)), Span::default())]),
            ))
            .into(),
    ]);
}

#[test]
fn options_turn_off_return_checks() {
    let decls = || vec![
        FnDecl::new("f", Type::Int, vec![])
            .with_body(Block::new(vec![], vec![Stmt::Return(None, Span::default())]))
            .into(),
    ];
    assert_eq!(codes(&err(decls())), [ErrorCode::S012]);
    assert!(check_with(&Program::new(decls()), &Options::default().with_return_checks(false)).is_ok());
}

// ─── Sinks ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Rendered(Vec<String>);

impl DiagnosticSink for Rendered {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic.render());
    }
}

#[test]
fn custom_sink_receives_diagnostics_in_order() {
    let program = Program::new(vec![
        main_fn(vec![], vec![
            Stmt::Break(Span::new(2, 5)),
            Stmt::Expr(Expr::this().at(3, 5)),
        ]),
    ]);
    let mut sink = Rendered::default();
    let types = analyze_with(&program, &Options::default(), &mut sink);
    assert_eq!(sink.0.len(), 2);
    assert!(sink.0[0].starts_with("[S015] 2:5"), "{}", sink.0[0]);
    assert!(sink.0[1].starts_with("[S014] 3:5"), "{}", sink.0[1]);
    assert_eq!(types.len(), 1);
}
