use std::hash::BuildHasher;

use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::trace;

use crate::error::{DeclInfo, DeclKind, Diagnostic};
use crate::syntax::ast::{ClassDecl, Decl, FnDecl, InterfaceDecl, Member, Span, VarDecl};

// ─── Symbol ───────────────────────────────────────────────────────────────────

/// What a name is bound to. Borrows the declaration from the tree.
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    Variable(&'a VarDecl),
    Class(&'a ClassDecl),
    Interface(&'a InterfaceDecl),
    Function(&'a FnDecl),
    /// Synthesized `length` member of every array: an int field, or a
    /// zero-argument method returning int.
    ArrayLength,
}

impl<'a> Symbol<'a> {
    pub fn from_decl(decl: &'a Decl) -> Self {
        match decl {
            Decl::Var(v)       => Symbol::Variable(v),
            Decl::Class(c)     => Symbol::Class(c),
            Decl::Interface(i) => Symbol::Interface(i),
            Decl::Fn(f)        => Symbol::Function(f),
        }
    }

    pub fn from_member(member: &'a Member) -> Self {
        match member {
            Member::Field(v)  => Symbol::Variable(v),
            Member::Method(f) => Symbol::Function(f),
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Symbol::Variable(v)  => &v.name,
            Symbol::Class(c)     => &c.name,
            Symbol::Interface(i) => &i.name,
            Symbol::Function(f)  => &f.name,
            Symbol::ArrayLength  => "length",
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Symbol::Variable(_) | Symbol::ArrayLength => DeclKind::Variable,
            Symbol::Class(_)     => DeclKind::Class,
            Symbol::Interface(_) => DeclKind::Interface,
            Symbol::Function(_)  => DeclKind::Function,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Symbol::Variable(v)  => v.span,
            Symbol::Class(c)     => c.span,
            Symbol::Interface(i) => i.span,
            Symbol::Function(f)  => f.span,
            Symbol::ArrayLength  => Span::default(),
        }
    }

    pub fn info(&self) -> DeclInfo {
        DeclInfo { name: self.name().to_string(), kind: self.kind(), span: self.span() }
    }

    /// Whether both symbols denote the very same declaration node.
    pub fn is_same(&self, other: &Symbol<'a>) -> bool {
        match (self, other) {
            (Symbol::Variable(a), Symbol::Variable(b))   => std::ptr::eq(*a, *b),
            (Symbol::Class(a), Symbol::Class(b))         => std::ptr::eq(*a, *b),
            (Symbol::Interface(a), Symbol::Interface(b)) => std::ptr::eq(*a, *b),
            (Symbol::Function(a), Symbol::Function(b))   => std::ptr::eq(*a, *b),
            (Symbol::ArrayLength, Symbol::ArrayLength)   => true,
            _ => false,
        }
    }

    /// Conflict diagnostic for `self` arriving where `prev` is already bound.
    pub fn conflict_with(&self, prev: &Symbol<'a>) -> Diagnostic {
        Diagnostic::DeclConflict { new: self.info(), prev: prev.info() }
    }
}

// ─── SymbolTable ──────────────────────────────────────────────────────────────

const MIN_CAPACITY: usize = 4;

struct Entry<V> {
    name: Box<str>,
    value: V,
}

/// Open-addressed map from name to value with linear probing.
///
/// Entries are never removed; a table lives exactly as long as its scope.
/// The slot array doubles before the load factor would pass 3/4, so there is
/// always an empty slot to end a probe sequence.
pub struct SymbolTable<V> {
    slots: Vec<Option<Entry<V>>>,
    len: usize,
    hasher: FxBuildHasher,
}

impl<V> SymbolTable<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            len: 0,
            hasher: FxBuildHasher,
        }
    }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn capacity(&self) -> usize { self.slots.len() }

    /// Returns `false` if `name` is already bound in this table; the existing
    /// binding is kept.
    pub fn declare(&mut self, name: &str, value: V) -> bool {
        if (self.len + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }
        let index = self.probe(name);
        if self.slots[index].is_some() {
            return false;
        }
        self.slots[index] = Some(Entry { name: name.into(), value });
        self.len += 1;
        true
    }

    pub fn lookup_local(&self, name: &str) -> Option<&V> {
        self.slots[self.probe(name)].as_ref().map(|e| &e.value)
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.slots.iter().flatten().map(|e| (&*e.name, &e.value))
    }

    /// Index of the slot holding `name`, or of the empty slot ending its probe.
    fn probe(&self, name: &str) -> usize {
        let mask = self.slots.len() - 1;
        let mut index = self.hasher.hash_one(name) as usize & mask;
        loop {
            match &self.slots[index] {
                Some(e) if &*e.name != name => index = (index + 1) & mask,
                _ => return index,
            }
        }
    }

    fn grow(&mut self) {
        let doubled = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, (0..doubled).map(|_| None).collect());
        for entry in old.into_iter().flatten() {
            let index = self.probe(&entry.name);
            self.slots[index] = Some(entry);
        }
    }
}

// ─── Scope ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Class,
    Interface,
    Function,
    Block,
}

pub struct Scope<'a> {
    pub kind: ScopeKind,
    /// Enclosing scope. Not an owner: all scopes live in the `ScopeChain`.
    pub parent: Option<ScopeId>,
    /// Class scopes only: the superclass's member scope.
    pub superclass: Option<ScopeId>,
    /// Class scopes only: member scopes of the implemented interfaces.
    pub interfaces: Vec<ScopeId>,
    /// Name of the class or interface owning a member scope.
    pub owner: Option<&'a str>,
    table: SymbolTable<Symbol<'a>>,
}

impl<'a> Scope<'a> {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: Option<&'a str>, capacity: usize) -> Self {
        Self {
            kind,
            parent,
            superclass: None,
            interfaces: Vec::new(),
            owner,
            table: SymbolTable::with_capacity(capacity),
        }
    }

    pub fn lookup_local(&self, name: &str) -> Option<Symbol<'a>> {
        self.table.lookup_local(name).copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol<'a>> + '_ {
        self.table.iter().map(|(_, s)| *s)
    }
}

// ─── ScopeChain ───────────────────────────────────────────────────────────────

/// Every scope of one analysis run, plus the innermost active one.
///
/// Class and interface member scopes are created once and persist for the
/// whole run; function and block scopes are pushed on entry and discarded on
/// exit, so they always sit at the end of the arena.
pub struct ScopeChain<'a> {
    scopes: Vec<Scope<'a>>,
    current: ScopeId,
    members: FxHashMap<&'a str, ScopeId>,
    capacity: usize,
}

impl<'a> ScopeChain<'a> {
    pub fn new(capacity: usize) -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, None, None, capacity)],
            current: ScopeId(0),
            members: FxHashMap::default(),
            capacity,
        }
    }

    pub fn global(&self) -> ScopeId { ScopeId(0) }

    pub fn current(&self) -> ScopeId { self.current }

    pub fn scope(&self, id: ScopeId) -> &Scope<'a> {
        &self.scopes[id.0]
    }

    pub fn depth(&self) -> usize {
        std::iter::successors(Some(self.current), |id| self.scope(*id).parent).count()
    }

    /// Create the persistent member scope of a class or interface.
    pub fn create_members(&mut self, kind: ScopeKind, owner: &'a str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(kind, Some(self.global()), Some(owner), self.capacity));
        self.members.insert(owner, id);
        id
    }

    /// Member scope registered for a class or interface name.
    pub fn members_of(&self, owner: &str) -> Option<ScopeId> {
        self.members.get(owner).copied()
    }

    /// Open a nested function or block scope inside the active one.
    pub fn push(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(kind, Some(self.current), None, self.capacity));
        self.current = id;
        trace!(?kind, depth = self.depth(), "push scope");
        id
    }

    /// Close the active function or block scope and discard it.
    pub fn pop(&mut self) {
        debug_assert_eq!(self.current.0 + 1, self.scopes.len(), "only the newest scope can be popped");
        let closed = self.scopes.pop();
        if let Some(parent) = closed.and_then(|s| s.parent) {
            self.current = parent;
        }
        trace!(depth = self.depth(), "pop scope");
    }

    /// Make `id` the active scope, returning the previously active one.
    pub fn activate(&mut self, id: ScopeId) -> ScopeId {
        std::mem::replace(&mut self.current, id)
    }

    /// Bind `symbol` in scope `id`. On a clash the existing binding is kept
    /// and returned.
    pub fn declare_in(&mut self, id: ScopeId, symbol: Symbol<'a>) -> Result<(), Symbol<'a>> {
        let table = &mut self.scopes[id.0].table;
        if table.declare(symbol.name(), symbol) {
            return Ok(());
        }
        match table.lookup_local(symbol.name()) {
            Some(prev) => Err(*prev),
            None => Ok(()),
        }
    }

    pub fn declare(&mut self, symbol: Symbol<'a>) -> Result<(), Symbol<'a>> {
        self.declare_in(self.current, symbol)
    }

    pub fn lookup_local(&self, name: &str) -> Option<Symbol<'a>> {
        self.scope(self.current).lookup_local(name)
    }

    pub fn lookup_global(&self, name: &str) -> Option<Symbol<'a>> {
        self.scope(self.global()).lookup_local(name)
    }

    /// Innermost to outermost. A class scope met on the way is searched with
    /// its superclass chain before moving on to the global scope.
    pub fn lookup_chain(&self, name: &str) -> Option<Symbol<'a>> {
        let mut next = Some(self.current);
        while let Some(id) = next {
            let scope = self.scope(id);
            let found = match scope.kind {
                ScopeKind::Class => self.lookup_in_class(id, name),
                _ => scope.lookup_local(name),
            };
            if found.is_some() {
                return found;
            }
            next = scope.parent;
        }
        None
    }

    /// A class's own members, then each superclass in turn. Interfaces are
    /// never searched.
    pub fn lookup_in_class(&self, class: ScopeId, name: &str) -> Option<Symbol<'a>> {
        self.ancestry(class).find_map(|id| self.scope(id).lookup_local(name))
    }

    /// `class` followed by its superclass scopes, nearest first.
    pub fn ancestry(&self, class: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(class), |id| self.scope(*id).superclass)
            .take(self.scopes.len())
    }

    /// Link `class` to `superclass`. Refused (returns `false`) when the link
    /// would close a cycle.
    pub fn link_superclass(&mut self, class: ScopeId, superclass: ScopeId) -> bool {
        if self.ancestry(superclass).any(|id| id == class) {
            return false;
        }
        self.scopes[class.0].superclass = Some(superclass);
        true
    }

    pub fn add_interface(&mut self, class: ScopeId, interface: ScopeId) {
        self.scopes[class.0].interfaces.push(interface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn declare_rejects_duplicates_and_keeps_first() {
        let mut t: SymbolTable<i32> = SymbolTable::with_capacity(8);
        assert!(t.declare("x", 1));
        assert!(!t.declare("x", 2));
        assert_eq!(t.lookup_local("x"), Some(&1));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn table_grows_past_initial_capacity() {
        let mut t: SymbolTable<usize> = SymbolTable::with_capacity(4);
        for i in 0..200 {
            assert!(t.declare(&format!("name{i}"), i));
        }
        assert_eq!(t.len(), 200);
        assert!(t.capacity() >= 256);
        for i in 0..200 {
            assert_eq!(t.lookup_local(&format!("name{i}")), Some(&i));
        }
        assert_eq!(t.lookup_local("missing"), None);
    }

    #[test]
    fn iter_visits_every_entry() {
        let mut t: SymbolTable<u8> = SymbolTable::with_capacity(4);
        t.declare("a", 1);
        t.declare("b", 2);
        t.declare("c", 3);
        let mut names: Vec<&str> = t.iter().map(|(n, _)| n).collect();
        names.sort();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let outer = VarDecl::new("x", Type::Int);
        let inner = VarDecl::new("x", Type::Bool);
        let mut chain = ScopeChain::new(8);
        chain.push(ScopeKind::Function);
        assert!(chain.declare(Symbol::Variable(&outer)).is_ok());
        chain.push(ScopeKind::Block);
        assert!(chain.declare(Symbol::Variable(&inner)).is_ok());

        let found = chain.lookup_chain("x").expect("x visible");
        assert!(found.is_same(&Symbol::Variable(&inner)));

        chain.pop();
        let found = chain.lookup_chain("x").expect("x visible");
        assert!(found.is_same(&Symbol::Variable(&outer)));
    }

    #[test]
    fn conflicting_declare_returns_previous() {
        let first = VarDecl::new("x", Type::Int).at(1, 1);
        let second = VarDecl::new("x", Type::Int).at(2, 1);
        let mut chain = ScopeChain::new(8);
        chain.declare(Symbol::Variable(&first)).expect("first declare");
        let prev = chain.declare(Symbol::Variable(&second)).expect_err("second must clash");
        assert!(prev.is_same(&Symbol::Variable(&first)));
    }

    #[test]
    fn class_lookup_walks_superclasses_not_interfaces() {
        let base_field = VarDecl::new("x", Type::Int);
        let iface_field = VarDecl::new("y", Type::Int);
        let mut chain = ScopeChain::new(8);
        let base = chain.create_members(ScopeKind::Class, "A");
        let derived = chain.create_members(ScopeKind::Class, "B");
        let iface = chain.create_members(ScopeKind::Interface, "I");
        chain.declare_in(base, Symbol::Variable(&base_field)).expect("declare x");
        chain.declare_in(iface, Symbol::Variable(&iface_field)).expect("declare y");
        assert!(chain.link_superclass(derived, base));
        chain.add_interface(derived, iface);

        assert!(chain.lookup_in_class(derived, "x").is_some());
        assert!(chain.lookup_in_class(derived, "y").is_none());
    }

    #[test]
    fn cyclic_superclass_link_is_refused() {
        let mut chain = ScopeChain::new(8);
        let a = chain.create_members(ScopeKind::Class, "A");
        let b = chain.create_members(ScopeKind::Class, "B");
        assert!(chain.link_superclass(a, b));
        assert!(!chain.link_superclass(b, a));
        assert!(!chain.link_superclass(a, a));
        assert_eq!(chain.ancestry(a).count(), 2);
    }

    #[test]
    fn method_scope_sees_class_members_before_globals() {
        let global_x = VarDecl::new("x", Type::Bool);
        let field_x = VarDecl::new("x", Type::Int);
        let mut chain = ScopeChain::new(8);
        chain.declare(Symbol::Variable(&global_x)).expect("global x");
        let class = chain.create_members(ScopeKind::Class, "A");
        chain.declare_in(class, Symbol::Variable(&field_x)).expect("field x");

        let prev = chain.activate(class);
        chain.push(ScopeKind::Function);
        let found = chain.lookup_chain("x").expect("x visible");
        assert!(found.is_same(&Symbol::Variable(&field_x)));
        chain.pop();
        chain.activate(prev);

        let found = chain.lookup_chain("x").expect("x visible");
        assert!(found.is_same(&Symbol::Variable(&global_x)));
    }
}
