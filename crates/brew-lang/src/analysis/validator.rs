//! Pass 2 — Class Validator
//!
//! Runs once every top-level name and member is registered:
//! - Links each class scope to its superclass and interfaces
//! - Checks that overriding methods keep the inherited signature
//! - Checks that every interface a class claims is fully implemented

use tracing::{debug, instrument};

use crate::error::{Diagnostic, Role};
use crate::syntax::ast::*;
use super::symbols::{ScopeChain, ScopeId, Symbol};

pub struct Validator<'s, 'a> {
    scopes: &'s mut ScopeChain<'a>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'s, 'a> Validator<'s, 'a> {
    pub fn new(scopes: &'s mut ScopeChain<'a>) -> Self {
        Self { scopes, diagnostics: Vec::new() }
    }

    pub fn validate(mut self, program: &'a Program) -> Vec<Diagnostic> {
        let classes: Vec<(&'a ClassDecl, ScopeId)> = program.decls.iter()
            .filter_map(|d| match d {
                Decl::Class(c) => self.member_scope(c).map(|id| (c, id)),
                _ => None,
            })
            .collect();

        // All links first, so override and contract checks see whole chains.
        for &(c, id) in &classes {
            self.link(c, id);
        }
        for &(c, id) in &classes {
            self.check_class(c, id);
        }
        self.diagnostics
    }

    /// Member scope of `c`, unless `c` lost a name clash at the top level.
    fn member_scope(&self, c: &'a ClassDecl) -> Option<ScopeId> {
        let declared = self.scopes.lookup_global(&c.name)?;
        if !declared.is_same(&Symbol::Class(c)) {
            return None;
        }
        self.scopes.members_of(&c.name)
    }

    // ── Inheritance links ─────────────────────────────────────────────────────

    fn link(&mut self, c: &'a ClassDecl, id: ScopeId) {
        if let Some(superclass) = &c.extends {
            match self.scopes.lookup_global(superclass) {
                Some(Symbol::Class(_)) => {
                    if let Some(sup) = self.scopes.members_of(superclass) {
                        if !self.scopes.link_superclass(id, sup) {
                            self.diagnostics.push(Diagnostic::CyclicInheritance {
                                class: c.name.clone(),
                                span: c.span,
                            });
                        }
                    }
                }
                _ => self.diagnostics.push(Diagnostic::IdentifierNotDeclared {
                    name: superclass.clone(),
                    role: Role::Class,
                    span: c.span,
                }),
            }
        }

        for interface in &c.implements {
            match self.scopes.lookup_global(interface) {
                Some(Symbol::Interface(_)) => {
                    if let Some(iid) = self.scopes.members_of(interface) {
                        self.scopes.add_interface(id, iid);
                    }
                }
                _ => self.diagnostics.push(Diagnostic::IdentifierNotDeclared {
                    name: interface.clone(),
                    role: Role::Interface,
                    span: c.span,
                }),
            }
        }
    }

    // ── Overrides and contracts ───────────────────────────────────────────────

    #[instrument(skip_all, fields(class = %c.name))]
    fn check_class(&mut self, c: &'a ClassDecl, id: ScopeId) {
        debug!("validating class");
        self.check_overrides(c, id);
        self.check_contracts(c, id);
    }

    fn check_overrides(&mut self, c: &'a ClassDecl, id: ScopeId) {
        let Some(superclass) = self.scopes.scope(id).superclass else { return };
        for member in &c.members {
            let own = Symbol::from_member(member);
            let registered = self.scopes.scope(id).lookup_local(member.name());
            if !registered.is_some_and(|s| s.is_same(&own)) {
                continue;
            }
            let Some(inherited) = self.scopes.lookup_in_class(superclass, member.name()) else {
                continue;
            };
            match (own, inherited) {
                (Symbol::Function(f), Symbol::Function(g)) => {
                    if !f.signature_matches(g) {
                        self.diagnostics.push(Diagnostic::OverrideMismatch {
                            name: f.name.clone(),
                            class: c.name.clone(),
                            span: f.span,
                        });
                    }
                }
                // A field may shadow an inherited field.
                (Symbol::Variable(_), Symbol::Variable(_)) => {}
                _ => self.diagnostics.push(own.conflict_with(&inherited)),
            }
        }
    }

    fn check_contracts(&mut self, c: &'a ClassDecl, id: ScopeId) {
        let interfaces = self.scopes.scope(id).interfaces.clone();
        for iid in interfaces {
            let Some(owner) = self.scopes.scope(iid).owner else { continue };
            let Some(Symbol::Interface(interface)) = self.scopes.lookup_global(owner) else {
                continue;
            };
            for required in &interface.members {
                let registered = self.scopes.scope(iid).lookup_local(&required.name);
                if !registered.is_some_and(|s| s.is_same(&Symbol::Function(required))) {
                    continue;
                }
                let provided = self.scopes.lookup_in_class(id, &required.name);
                let satisfied = matches!(provided, Some(Symbol::Function(f)) if f.signature_matches(required));
                if !satisfied {
                    self.diagnostics.push(Diagnostic::InterfaceNotImplemented {
                        class: c.name.clone(),
                        interface: interface.name.clone(),
                        method: required.name.clone(),
                        span: c.span,
                    });
                }
            }
        }
    }
}
