//! Pass 3 — Type Checker (declarations and statements)
//!
//! Re-enters each class's member scope, opens a function scope for formals
//! and a block scope per `{}`, and checks every statement form. Expressions
//! are handed to `check_expr`.

use tracing::{debug, instrument};

use crate::error::Diagnostic;
use crate::syntax::ast::*;
use super::TypeTable;
use super::checker::{Context, TypeChecker};
use super::symbols::{ScopeId, ScopeKind, Symbol};

impl<'a, 'o> TypeChecker<'a, 'o> {
    pub fn run(mut self, program: &'a Program) -> (TypeTable, Vec<Diagnostic>) {
        for decl in &program.decls {
            if self.is_registered(Symbol::from_decl(decl)) {
                self.check_decl(decl);
            }
        }
        debug!(typed = self.types.len(), diagnostics = self.diagnostics.len(), "checked bodies");
        (self.types, self.diagnostics)
    }

    /// A declaration that lost a name clash is not analysed further.
    fn is_registered(&self, symbol: Symbol<'a>) -> bool {
        self.scopes.lookup_local(symbol.name()).is_some_and(|s| s.is_same(&symbol))
    }

    // ── Scope helpers ─────────────────────────────────────────────────────────

    /// Run `f` with the persistent member scope `id` active.
    fn within(&mut self, id: ScopeId, f: impl FnOnce(&mut Self)) {
        let prev = self.scopes.activate(id);
        f(self);
        self.scopes.activate(prev);
    }

    /// Run `f` inside a fresh nested scope that is discarded afterwards.
    fn in_scope(&mut self, kind: ScopeKind, f: impl FnOnce(&mut Self)) {
        self.scopes.push(kind);
        f(self);
        self.scopes.pop();
    }

    fn declare_local(&mut self, var: &'a VarDecl) {
        self.check_type_exists(&var.ty, var.span);
        let symbol = Symbol::Variable(var);
        if let Err(prev) = self.scopes.declare(symbol) {
            self.report(symbol.conflict_with(&prev));
        }
    }

    // ── Declarations ──────────────────────────────────────────────────────────

    fn check_decl(&mut self, decl: &'a Decl) {
        match decl {
            Decl::Var(v)       => { self.check_type_exists(&v.ty, v.span); }
            Decl::Fn(f)        => self.check_function(f, Context::default()),
            Decl::Class(c)     => self.check_class(c),
            Decl::Interface(i) => self.check_interface(i),
        }
    }

    #[instrument(skip_all, fields(class = %c.name))]
    fn check_class(&mut self, c: &'a ClassDecl) {
        let Some(id) = self.scopes.members_of(&c.name) else { return };
        let ctx = Context::default().in_class(c);
        self.within(id, |this| {
            for member in &c.members {
                if !this.is_registered(Symbol::from_member(member)) {
                    continue;
                }
                match member {
                    Member::Field(v)  => { this.check_type_exists(&v.ty, v.span); }
                    Member::Method(f) => this.check_function(f, ctx),
                }
            }
        });
    }

    fn check_interface(&mut self, i: &'a InterfaceDecl) {
        let Some(id) = self.scopes.members_of(&i.name) else { return };
        self.within(id, |this| {
            for method in &i.members {
                if this.is_registered(Symbol::Function(method)) {
                    this.check_function(method, Context::default());
                }
            }
        });
    }

    /// Formals live in their own scope; the body block opens another one
    /// beneath it.
    fn check_function(&mut self, f: &'a FnDecl, ctx: Context<'a>) {
        debug!(function = %f.name, formals = f.formals.len(), "checking function");
        let ctx = ctx.in_function(f);
        self.check_type_exists(&f.return_ty, f.span);
        self.in_scope(ScopeKind::Function, |this| {
            for formal in &f.formals {
                this.declare_local(formal);
            }
            if let Some(body) = &f.body {
                this.check_block(body, ctx);
            }
        });
    }

    // ── Statements ────────────────────────────────────────────────────────────

    pub fn check_block(&mut self, block: &'a Block, ctx: Context<'a>) {
        self.in_scope(ScopeKind::Block, |this| {
            for var in &block.decls {
                this.declare_local(var);
            }
            for stmt in &block.stmts {
                this.check_stmt(stmt, ctx);
            }
        });
    }

    pub fn check_stmt(&mut self, stmt: &'a Stmt, ctx: Context<'a>) {
        match stmt {
            Stmt::Block(b) => self.check_block(b, ctx),

            Stmt::If(s) => {
                self.check_test(&s.test, ctx);
                self.check_stmt(&s.then_branch, ctx);
                if let Some(else_branch) = &s.else_branch {
                    self.check_stmt(else_branch, ctx);
                }
            }

            Stmt::While(s) => {
                self.check_test(&s.test, ctx);
                self.check_stmt(&s.body, ctx.in_loop());
            }

            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    self.check_expr(init, ctx);
                }
                self.check_test(&s.test, ctx);
                if let Some(step) = &s.step {
                    self.check_expr(step, ctx);
                }
                self.check_stmt(&s.body, ctx.in_loop());
            }

            Stmt::Switch(s) => {
                let ty = self.check_expr(&s.test, ctx);
                if !ty.is_error() && ty != Type::Int {
                    self.report(Diagnostic::SwitchTestNotInteger { span: s.test.span });
                }
                let bodies = s.cases.iter().map(|c| &c.body).chain(s.default.as_ref());
                for body in bodies {
                    for stmt in body {
                        self.check_stmt(stmt, ctx.in_loop());
                    }
                }
            }

            Stmt::Break(span) => {
                if !ctx.breakable {
                    self.report(Diagnostic::BreakOutsideLoop { span: *span });
                }
            }

            Stmt::Return(value, span) => self.check_return(value.as_ref(), *span, ctx),

            Stmt::Print(args, _) => {
                for (position, arg) in args.iter().enumerate() {
                    let given = self.check_expr(arg, ctx);
                    let printable = matches!(given, Type::Int | Type::Bool | Type::String);
                    if !given.is_error() && !printable {
                        self.report(Diagnostic::PrintArgMismatch { position: position + 1, given, span: arg.span });
                    }
                }
            }

            Stmt::Expr(e) => { self.check_expr(e, ctx); }
        }
    }

    /// Conditions of `if`, `while` and `for` must be `bool`.
    fn check_test(&mut self, test: &'a Expr, ctx: Context<'a>) {
        let ty = self.check_expr(test, ctx);
        if !ty.is_error() && ty != Type::Bool {
            self.report(Diagnostic::TestNotBoolean { span: test.span });
        }
    }

    /// A bare `return` gives `void`.
    fn check_return(&mut self, value: Option<&'a Expr>, span: Span, ctx: Context<'a>) {
        let given = match value {
            Some(e) => self.check_expr(e, ctx),
            None => Type::Void,
        };
        if !self.options.check_return_types {
            return;
        }
        let Some(function) = ctx.function else { return };
        let expected = self.resolver().resolve_type(&function.return_ty);
        if !given.is_compatible_with(&expected) {
            let span = value.map_or(span, |e| e.span);
            self.report(Diagnostic::ReturnMismatch { given, expected, span });
        }
    }
}
