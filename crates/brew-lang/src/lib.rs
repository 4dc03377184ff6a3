pub mod syntax;
pub mod types;
pub mod analysis;
pub mod config;
pub mod error;

pub use analysis::{Analysis, TypeTable, analyze, analyze_with};
pub use config::{FieldAccess, Options};
pub use error::{DeclInfo, DeclKind, Diagnostic, DiagnosticSink, ErrorCode, Role};
pub use types::Type;

use syntax::ast::Program;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Check a whole program with default options. Succeeds with the type of
/// every expression only when no diagnostic was produced.
pub fn check(program: &Program) -> Result<TypeTable, Vec<Diagnostic>> {
    check_with(program, &Options::default())
}

pub fn check_with(program: &Program, options: &Options) -> Result<TypeTable, Vec<Diagnostic>> {
    let Analysis { types, diagnostics } = analyze(program, options);
    if diagnostics.is_empty() { Ok(types) } else { Err(diagnostics) }
}
