pub mod symbols;
pub mod collector;
pub mod lookup;
pub mod validator;
pub mod checker;
pub mod statements;


use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::config::Options;
use crate::error::{Diagnostic, DiagnosticSink};
use crate::syntax::ast::{Expr, NodeId, Program};
use crate::types::Type;
use checker::TypeChecker;
use collector::Collector;
use validator::Validator;
pub use symbols::{ScopeChain, SymbolTable};

// ─── Result ───────────────────────────────────────────────────────────────────

/// Inferred type of every checked expression, written once per node.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: FxHashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn type_of(&self, expr: &Expr) -> Option<&Type> {
        self.get(expr.id)
    }

    pub fn len(&self) -> usize { self.types.len() }

    pub fn is_empty(&self) -> bool { self.types.is_empty() }

    pub(crate) fn record(&mut self, id: NodeId, ty: Type) {
        let previous = self.types.insert(id, ty);
        debug_assert!(previous.is_none(), "expression {id:?} typed twice");
    }
}

pub struct Analysis {
    pub types: TypeTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ─── Entry points ─────────────────────────────────────────────────────────────

/// Full analysis pipeline:
/// 1. Collector   — bind top-level names and class/interface members
/// 2. Validator   — link inheritance, check overrides and interface contracts
/// 3. TypeChecker — check every declaration body, statement and expression
///
/// Diagnostics reach `sink` pass by pass, each pass in discovery order.
#[instrument(skip_all, fields(decls = program.decls.len()))]
pub fn analyze_with(program: &Program, options: &Options, sink: &mut impl DiagnosticSink) -> TypeTable {
    // ── Pass 1: collect declarations ──────────────────────────────────────────
    let (mut scopes, collect_errors) = Collector::new(options.table_capacity).collect(program);
    let mut reported = collect_errors.len();
    collect_errors.into_iter().for_each(|d| sink.report(d));

    // ── Pass 2: inheritance and contracts ─────────────────────────────────────
    let validate_errors = Validator::new(&mut scopes).validate(program);
    reported += validate_errors.len();
    validate_errors.into_iter().for_each(|d| sink.report(d));

    // ── Pass 3: bodies, statements and expressions ────────────────────────────
    let (types, check_errors) = TypeChecker::new(scopes, options).run(program);
    reported += check_errors.len();
    check_errors.into_iter().for_each(|d| sink.report(d));

    debug!(diagnostics = reported, typed = types.len(), "analysis finished");
    types
}

/// Run the pipeline and keep everything it found.
pub fn analyze(program: &Program, options: &Options) -> Analysis {
    let mut diagnostics = Vec::new();
    let types = analyze_with(program, options, &mut diagnostics);
    Analysis { types, diagnostics }
}
