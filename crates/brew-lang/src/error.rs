use std::fmt;

use thiserror::Error;

use crate::syntax::ast::{Operator, Span};
use crate::types::Type;

/// Stable diagnostic codes. All semantic codes share the `S` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Declarations
    S001, // declaration conflicts with a previous one in the same scope
    S002, // method does not match inherited signature
    S003, // class does not implement an interface method
    S004, // cyclic inheritance

    // Name resolution
    S005, // identifier not declared
    S006, // field not found in base type
    S007, // declaration not accessible as a field

    // Type compatibility
    S008, // incompatible operands
    S009, // incompatible operand
    S010, // wrong argument count
    S011, // argument type mismatch
    S012, // return type mismatch
    S013, // print argument type mismatch

    // Context
    S014, // `this` outside class scope
    S015, // `break` outside loop
    S016, // test expression is not bool
    S017, // brackets on a non-array
    S018, // array subscript is not int
    S019, // array size is not int
    S020, // switch expression is not int
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S001 => "S001",
            Self::S002 => "S002",
            Self::S003 => "S003",
            Self::S004 => "S004",
            Self::S005 => "S005",
            Self::S006 => "S006",
            Self::S007 => "S007",
            Self::S008 => "S008",
            Self::S009 => "S009",
            Self::S010 => "S010",
            Self::S011 => "S011",
            Self::S012 => "S012",
            Self::S013 => "S013",
            Self::S014 => "S014",
            Self::S015 => "S015",
            Self::S016 => "S016",
            Self::S017 => "S017",
            Self::S018 => "S018",
            Self::S019 => "S019",
            Self::S020 => "S020",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Operands ─────────────────────────────────────────────────────────────────

/// What an unresolved identifier was expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Variable,
    Function,
    Type,
    Class,
    Interface,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Variable  => "variable",
            Role::Function  => "function",
            Role::Type      => "type",
            Role::Class     => "class",
            Role::Interface => "interface",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Variable,
    Class,
    Interface,
    Function,
}

/// Snapshot of a declaration, enough for the renderer to point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclInfo {
    pub name: String,
    pub kind: DeclKind,
    pub span: Span,
}

// ─── Diagnostic ───────────────────────────────────────────────────────────────

/// One semantic violation with structured operands. `Display` gives a
/// default rendering; callers wanting their own text match on the variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("declaration of '{}' here conflicts with declaration on line {}", .new.name, .prev.span.line)]
    DeclConflict { new: DeclInfo, prev: DeclInfo },

    #[error("method '{name}' must match inherited type signature")]
    OverrideMismatch { name: String, class: String, span: Span },

    #[error("class '{class}' does not implement entire interface '{interface}' (missing '{method}')")]
    InterfaceNotImplemented { class: String, interface: String, method: String, span: Span },

    #[error("class '{class}' has a cyclic inheritance chain")]
    CyclicInheritance { class: String, span: Span },

    #[error("no declaration found for {role} '{name}'")]
    IdentifierNotDeclared { name: String, role: Role, span: Span },

    #[error("{base} has no such field '{name}'")]
    FieldNotFoundInBase { name: String, base: Type, span: Span },

    #[error("'{name}' is not accessible as a field{}", .base.as_ref().map(|b| format!(" of {b}")).unwrap_or_default())]
    InaccessibleField { name: String, base: Option<Type>, span: Span },

    #[error("incompatible operands: {left} {op} {right}")]
    IncompatibleOperands { op: Operator, left: Type, right: Type, span: Span },

    #[error("incompatible operand: {op} {operand}")]
    IncompatibleOperand { op: Operator, operand: Type, span: Span },

    #[error("function '{name}' expects {expected} arguments but {actual} given")]
    NumArgsMismatch { name: String, expected: usize, actual: usize, span: Span },

    #[error("incompatible argument {position}: {given} given, {expected} expected")]
    ArgMismatch { position: usize, given: Type, expected: Type, span: Span },

    #[error("incompatible return: {given} given, {expected} expected")]
    ReturnMismatch { given: Type, expected: Type, span: Span },

    #[error("incompatible argument {position}: {given} given, int/bool/string expected")]
    PrintArgMismatch { position: usize, given: Type, span: Span },

    #[error("'this' is only valid within class scope")]
    ThisOutsideClassScope { span: Span },

    #[error("break is only allowed inside a loop")]
    BreakOutsideLoop { span: Span },

    #[error("test expression must have boolean type")]
    TestNotBoolean { span: Span },

    #[error("[] can only be applied to arrays")]
    BracketsOnNonArray { span: Span },

    #[error("array subscript must be an integer")]
    SubscriptNotInteger { span: Span },

    #[error("size for NewArray must be an integer")]
    NewArraySizeNotInteger { span: Span },

    #[error("switch expression must have integer type")]
    SwitchTestNotInteger { span: Span },
}

impl Diagnostic {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DeclConflict { .. }            => ErrorCode::S001,
            Self::OverrideMismatch { .. }        => ErrorCode::S002,
            Self::InterfaceNotImplemented { .. } => ErrorCode::S003,
            Self::CyclicInheritance { .. }       => ErrorCode::S004,
            Self::IdentifierNotDeclared { .. }   => ErrorCode::S005,
            Self::FieldNotFoundInBase { .. }     => ErrorCode::S006,
            Self::InaccessibleField { .. }       => ErrorCode::S007,
            Self::IncompatibleOperands { .. }    => ErrorCode::S008,
            Self::IncompatibleOperand { .. }     => ErrorCode::S009,
            Self::NumArgsMismatch { .. }         => ErrorCode::S010,
            Self::ArgMismatch { .. }             => ErrorCode::S011,
            Self::ReturnMismatch { .. }          => ErrorCode::S012,
            Self::PrintArgMismatch { .. }        => ErrorCode::S013,
            Self::ThisOutsideClassScope { .. }   => ErrorCode::S014,
            Self::BreakOutsideLoop { .. }        => ErrorCode::S015,
            Self::TestNotBoolean { .. }          => ErrorCode::S016,
            Self::BracketsOnNonArray { .. }      => ErrorCode::S017,
            Self::SubscriptNotInteger { .. }     => ErrorCode::S018,
            Self::NewArraySizeNotInteger { .. }  => ErrorCode::S019,
            Self::SwitchTestNotInteger { .. }    => ErrorCode::S020,
        }
    }

    /// Primary location. For conflicts, the newer declaration.
    pub fn span(&self) -> Span {
        match self {
            Self::DeclConflict { new, .. } => new.span,
            Self::OverrideMismatch { span, .. }
            | Self::InterfaceNotImplemented { span, .. }
            | Self::CyclicInheritance { span, .. }
            | Self::IdentifierNotDeclared { span, .. }
            | Self::FieldNotFoundInBase { span, .. }
            | Self::InaccessibleField { span, .. }
            | Self::IncompatibleOperands { span, .. }
            | Self::IncompatibleOperand { span, .. }
            | Self::NumArgsMismatch { span, .. }
            | Self::ArgMismatch { span, .. }
            | Self::ReturnMismatch { span, .. }
            | Self::PrintArgMismatch { span, .. }
            | Self::ThisOutsideClassScope { span }
            | Self::BreakOutsideLoop { span }
            | Self::TestNotBoolean { span }
            | Self::BracketsOnNonArray { span }
            | Self::SubscriptNotInteger { span }
            | Self::NewArraySizeNotInteger { span }
            | Self::SwitchTestNotInteger { span } => *span,
        }
    }

    /// `[S008] 4:12 — incompatible operands: int + bool`
    pub fn render(&self) -> String {
        let span = self.span();
        format!("[{}] {}:{} — {}", self.code(), span.line, span.column, self)
    }
}

// ─── Sink ─────────────────────────────────────────────────────────────────────

/// Receives diagnostics in the order the analyzer discovers them.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
