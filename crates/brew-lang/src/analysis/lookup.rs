//! Centralized name resolution for the checker.
//!
//! Resolves bare names and `base.member` by consulting, in order:
//! 1. Lexical scopes (blocks, then formals)
//! 2. The enclosing class and its superclass chain
//! 3. The global scope
//!
//! Qualified lookups only search a class and its superclasses; interfaces
//! constrain what a class provides but never answer a lookup.

use tracing::trace;

use crate::types::Type;
use super::symbols::{ScopeChain, ScopeKind, Symbol};

pub struct Resolver<'s, 'a> {
    scopes: &'s ScopeChain<'a>,
}

impl<'s, 'a> Resolver<'s, 'a> {
    pub fn new(scopes: &'s ScopeChain<'a>) -> Self {
        Self { scopes }
    }

    /// Resolve a bare identifier from the active scope outward.
    pub fn resolve_unqualified(&self, name: &str) -> Option<Symbol<'a>> {
        let found = self.scopes.lookup_chain(name);
        trace!(name, found = ?found.map(|s| s.kind()), "resolve unqualified");
        found
    }

    /// Resolve `base.name` given the type of `base`.
    pub fn resolve_member(&self, base: &Type, name: &str) -> Option<Symbol<'a>> {
        match base {
            Type::Array(_) if name == "length" => Some(Symbol::ArrayLength),
            Type::Named(owner) => {
                let id = self.scopes.members_of(owner)?;
                match self.scopes.scope(id).kind {
                    ScopeKind::Class => self.scopes.lookup_in_class(id, name),
                    // A value of interface type exposes exactly the interface's methods.
                    _ => self.scopes.scope(id).lookup_local(name),
                }
            }
            _ => None,
        }
    }

    /// Member scope of `name` if it names a class (not an interface).
    fn class_scope(&self, name: &str) -> Option<super::symbols::ScopeId> {
        let id = self.scopes.members_of(name)?;
        (self.scopes.scope(id).kind == ScopeKind::Class).then_some(id)
    }

    /// A declared type as the checker should see it: any named component that
    /// is not a class or interface turns the whole type into `Error`.
    pub fn resolve_type(&self, ty: &Type) -> Type {
        if self.undeclared_type(ty).is_some() { Type::Error } else { ty.clone() }
    }

    /// First named component of `ty` that does not denote a class or interface.
    pub fn undeclared_type<'t>(&self, ty: &'t Type) -> Option<&'t str> {
        match ty {
            Type::Named(n) => match self.scopes.lookup_global(n) {
                Some(Symbol::Class(_) | Symbol::Interface(_)) => None,
                _ => Some(n),
            },
            Type::Array(elem) => self.undeclared_type(elem),
            _ => None,
        }
    }

    /// Class that declares the field `name` reached through a value of type
    /// `base`: the nearest scope on the superclass chain binding it.
    pub fn declaring_class(&self, base: &Type, name: &str) -> Option<&'a str> {
        let id = self.class_scope(base.type_name()?)?;
        self.scopes.ancestry(id)
            .find(|s| self.scopes.scope(*s).lookup_local(name).is_some())
            .and_then(|s| self.scopes.scope(s).owner)
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        let Some(id) = self.class_scope(class) else { return false };
        self.scopes.ancestry(id).any(|s| self.scopes.scope(s).owner == Some(ancestor))
    }
}
