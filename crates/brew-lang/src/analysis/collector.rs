//! Pass 1 — Declaration Collector
//!
//! Walks top-level declarations in order and populates the scope chain:
//! - Binds every top-level name in the global scope
//! - Creates the persistent member scope of each class and interface
//! - Binds fields, methods and interface signatures in those scopes
//!
//! A declaration that clashes with an earlier one in the same scope is
//! reported and dropped; its body is never analysed.

use tracing::debug;

use crate::error::Diagnostic;
use crate::syntax::ast::*;
use super::symbols::{ScopeChain, ScopeId, ScopeKind, Symbol};

pub struct Collector<'a> {
    pub scopes: ScopeChain<'a>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Collector<'a> {
    pub fn new(table_capacity: usize) -> Self {
        Self { scopes: ScopeChain::new(table_capacity), diagnostics: Vec::new() }
    }

    pub fn collect(mut self, program: &'a Program) -> (ScopeChain<'a>, Vec<Diagnostic>) {
        for decl in &program.decls {
            self.collect_top_level(decl);
        }
        debug!(
            declared = self.scopes.scope(self.scopes.global()).symbols().count(),
            conflicts = self.diagnostics.len(),
            "collected top-level declarations",
        );
        (self.scopes, self.diagnostics)
    }

    fn collect_top_level(&mut self, decl: &'a Decl) {
        let global = self.scopes.global();
        if !self.declare(global, Symbol::from_decl(decl)) {
            return;
        }
        match decl {
            Decl::Class(c)     => self.collect_class(c),
            Decl::Interface(i) => self.collect_interface(i),
            Decl::Var(_) | Decl::Fn(_) => {}
        }
    }

    // ── Classes ───────────────────────────────────────────────────────────────

    fn collect_class(&mut self, c: &'a ClassDecl) {
        let id = self.scopes.create_members(ScopeKind::Class, &c.name);
        for member in &c.members {
            self.declare(id, Symbol::from_member(member));
        }
    }

    // ── Interfaces ────────────────────────────────────────────────────────────

    fn collect_interface(&mut self, i: &'a InterfaceDecl) {
        let id = self.scopes.create_members(ScopeKind::Interface, &i.name);
        for method in &i.members {
            self.declare(id, Symbol::Function(method));
        }
    }

    /// Returns `false` (after reporting) when the name is already bound in `scope`.
    fn declare(&mut self, scope: ScopeId, symbol: Symbol<'a>) -> bool {
        match self.scopes.declare_in(scope, symbol) {
            Ok(()) => true,
            Err(prev) => {
                self.diagnostics.push(symbol.conflict_with(&prev));
                false
            }
        }
    }
}
