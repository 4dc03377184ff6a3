//! Pass 3 — Type Checker (expressions)
//!
//! Visits every expression once, children first, records its type and checks
//! operand compatibility. Typing is delegated to pure helpers (`Type`,
//! `OperatorTable`, `Resolver`); this module decides which diagnostic fires.
//! An `Error` operand never produces a diagnostic of its own and always
//! yields `Error`, so one mistake is reported once.
//!
//! Statement and declaration checking lives in `statements.rs`.

use tracing::trace;

use crate::config::{FieldAccess, Options};
use crate::error::{Diagnostic, Role};
use crate::syntax::ast::*;
use crate::types::operators::OperatorTable;
use super::TypeTable;
use super::lookup::Resolver;
use super::symbols::{ScopeChain, Symbol};

// ─── Context ──────────────────────────────────────────────────────────────────

/// What encloses the node being checked. Passed down by value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'a> {
    pub class: Option<&'a ClassDecl>,
    pub function: Option<&'a FnDecl>,
    /// Inside a loop or switch body, where `break` is valid.
    pub breakable: bool,
}

impl<'a> Context<'a> {
    pub fn in_class(self, class: &'a ClassDecl) -> Self {
        Self { class: Some(class), ..self }
    }

    pub fn in_function(self, function: &'a FnDecl) -> Self {
        Self { function: Some(function), breakable: false, ..self }
    }

    pub fn in_loop(self) -> Self {
        Self { breakable: true, ..self }
    }
}

// ─── Checker ──────────────────────────────────────────────────────────────────

/// Resolved target of a call expression.
enum Callee<'a> {
    Function(&'a FnDecl),
    ArrayLength,
    /// Already reported, or the base was an `Error`.
    Unresolved,
}

pub struct TypeChecker<'a, 'o> {
    pub(super) scopes: ScopeChain<'a>,
    pub(super) types: TypeTable,
    pub(super) diagnostics: Vec<Diagnostic>,
    pub(super) options: &'o Options,
    operators: OperatorTable,
}

impl<'a, 'o> TypeChecker<'a, 'o> {
    pub fn new(scopes: ScopeChain<'a>, options: &'o Options) -> Self {
        Self {
            scopes,
            types: TypeTable::default(),
            diagnostics: Vec::new(),
            options,
            operators: OperatorTable::default(),
        }
    }

    pub(super) fn resolver(&self) -> Resolver<'_, 'a> {
        Resolver::new(&self.scopes)
    }

    pub(super) fn report(&mut self, diagnostic: Diagnostic) {
        trace!(code = %diagnostic.code(), "report");
        self.diagnostics.push(diagnostic);
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    pub fn check_expr(&mut self, expr: &'a Expr, ctx: Context<'a>) -> Type {
        let ty = match &expr.kind {
            ExprKind::IntLit(_)    => Type::Int,
            ExprKind::DoubleLit(_) => Type::Double,
            ExprKind::BoolLit(_)   => Type::Bool,
            ExprKind::StringLit(_) => Type::String,
            ExprKind::Null         => Type::Null,
            ExprKind::ReadInteger  => Type::Int,
            ExprKind::ReadLine     => Type::String,

            ExprKind::Binary { op, left, right } => {
                let l = self.check_expr(left, ctx);
                let r = self.check_expr(right, ctx);
                self.check_binary(*op, l, r, expr.span)
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand, ctx);
                let result = self.operators.unary_type(*op, &ty);
                if result.is_error() && !ty.is_error() {
                    self.report(Diagnostic::IncompatibleOperand {
                        op: Operator::Unary(*op),
                        operand: ty,
                        span: expr.span,
                    });
                }
                result
            }

            ExprKind::Postfix { op, operand } => {
                let ty = self.check_expr(operand, ctx);
                let result = if operand.is_lvalue() {
                    self.operators.postfix_type(*op, &ty)
                } else {
                    Type::Error
                };
                if result.is_error() && !ty.is_error() {
                    self.report(Diagnostic::IncompatibleOperand {
                        op: Operator::Postfix(*op),
                        operand: ty,
                        span: expr.span,
                    });
                }
                result
            }

            ExprKind::Assign { target, value } => {
                let l = self.check_expr(target, ctx);
                let r = self.check_expr(value, ctx);
                self.check_assign(l, r, expr.span)
            }

            ExprKind::This => match ctx.class {
                Some(class) => Type::named(&class.name),
                None => {
                    self.report(Diagnostic::ThisOutsideClassScope { span: expr.span });
                    Type::Error
                }
            },

            ExprKind::ArrayAccess { base, subscript } => {
                let base_ty = self.check_expr(base, ctx);
                let index_ty = self.check_expr(subscript, ctx);
                if !base_ty.is_error() && base_ty.element_type().is_none() {
                    self.report(Diagnostic::BracketsOnNonArray { span: base.span });
                }
                if !index_ty.is_error() && index_ty != Type::Int {
                    self.report(Diagnostic::SubscriptNotInteger { span: subscript.span });
                }
                base_ty.element_type().cloned().unwrap_or(Type::Error)
            }

            ExprKind::FieldAccess { base, field } => {
                self.check_field_access(base.as_deref(), field, expr.span, ctx)
            }

            ExprKind::Call { base, name, args } => {
                self.check_call(base.as_deref(), name, args, expr.span, ctx)
            }

            ExprKind::New(class) => match self.scopes.lookup_global(class) {
                Some(Symbol::Class(_)) => Type::named(class),
                _ => {
                    self.report(Diagnostic::IdentifierNotDeclared {
                        name: class.clone(),
                        role: Role::Class,
                        span: expr.span,
                    });
                    Type::Error
                }
            },

            ExprKind::NewArray { size, elem } => {
                let size_ty = self.check_expr(size, ctx);
                if !size_ty.is_error() && size_ty != Type::Int {
                    self.report(Diagnostic::NewArraySizeNotInteger { span: size.span });
                }
                self.check_type_exists(elem, expr.span);
                Type::array_of(elem.clone())
            }
        };
        self.types.record(expr.id, ty.clone());
        ty
    }

    // ── Operators ─────────────────────────────────────────────────────────────

    fn check_binary(&mut self, op: BinOp, l: Type, r: Type, span: Span) -> Type {
        let result = self.operators.binary_type(op, &l, &r);
        if result.is_error() && !l.is_error() && !r.is_error() {
            self.report(Diagnostic::IncompatibleOperands {
                op: Operator::Binary(op),
                left: l,
                right: r,
                span,
            });
        }
        result
    }

    fn check_assign(&mut self, l: Type, r: Type, span: Span) -> Type {
        if l.is_error() || r.is_error() {
            return Type::Error;
        }
        if r.is_compatible_with(&l) {
            return l;
        }
        self.report(Diagnostic::IncompatibleOperands { op: Operator::Assign, left: l, right: r, span });
        Type::Error
    }

    // ── Field access ──────────────────────────────────────────────────────────

    fn check_field_access(
        &mut self,
        base: Option<&'a Expr>,
        field: &str,
        span: Span,
        ctx: Context<'a>,
    ) -> Type {
        let Some(base) = base else {
            let found = self.resolver().resolve_unqualified(field);
            return match found {
                Some(Symbol::Variable(v)) => self.resolver().resolve_type(&v.ty),
                // `ClassName` on its own: a static-style class reference.
                Some(Symbol::Class(c)) => Type::named(&c.name),
                Some(Symbol::ArrayLength) => Type::Int,
                Some(Symbol::Function(_) | Symbol::Interface(_)) => {
                    self.report(Diagnostic::InaccessibleField { name: field.to_string(), base: None, span });
                    Type::Error
                }
                None => {
                    self.report(Diagnostic::IdentifierNotDeclared {
                        name: field.to_string(),
                        role: Role::Variable,
                        span,
                    });
                    Type::Error
                }
            };
        };

        let base_ty = self.check_expr(base, ctx);
        if base_ty.is_error() {
            return Type::Error;
        }
        let member = self.resolver().resolve_member(&base_ty, field);
        match member {
            Some(Symbol::ArrayLength) => Type::Int,
            Some(Symbol::Variable(v)) if self.may_access_field(&base_ty, field, ctx) => {
                self.resolver().resolve_type(&v.ty)
            }
            Some(_) => {
                self.report(Diagnostic::InaccessibleField {
                    name: field.to_string(),
                    base: Some(base_ty),
                    span,
                });
                Type::Error
            }
            None => {
                self.report(Diagnostic::FieldNotFoundInBase { name: field.to_string(), base: base_ty, span });
                Type::Error
            }
        }
    }

    /// Under `FieldAccess::Protected`, `obj.f` is only legal inside the class
    /// declaring `f` or one of its subclasses.
    fn may_access_field(&self, base: &Type, field: &str, ctx: Context<'a>) -> bool {
        if self.options.field_access == FieldAccess::Public {
            return true;
        }
        let resolver = self.resolver();
        match (ctx.class, resolver.declaring_class(base, field)) {
            (Some(current), Some(owner)) => resolver.is_subclass_of(&current.name, owner),
            _ => false,
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────────

    fn check_call(
        &mut self,
        base: Option<&'a Expr>,
        name: &str,
        args: &'a [Expr],
        span: Span,
        ctx: Context<'a>,
    ) -> Type {
        let callee = match base {
            None => match self.resolver().resolve_unqualified(name) {
                Some(Symbol::Function(f)) => Callee::Function(f),
                _ => {
                    self.report(Diagnostic::IdentifierNotDeclared {
                        name: name.to_string(),
                        role: Role::Function,
                        span,
                    });
                    Callee::Unresolved
                }
            },
            Some(base) => {
                let base_ty = self.check_expr(base, ctx);
                if base_ty.is_error() {
                    Callee::Unresolved
                } else {
                    let member = self.resolver().resolve_member(&base_ty, name);
                    match member {
                        Some(Symbol::Function(f)) => Callee::Function(f),
                        Some(Symbol::ArrayLength) => Callee::ArrayLength,
                        _ => {
                            self.report(Diagnostic::FieldNotFoundInBase {
                                name: name.to_string(),
                                base: base_ty,
                                span,
                            });
                            Callee::Unresolved
                        }
                    }
                }
            }
        };

        // Arguments are checked even when the callee is unknown.
        let arg_types: Vec<Type> = args.iter().map(|a| self.check_expr(a, ctx)).collect();

        match callee {
            Callee::Unresolved => Type::Error,
            Callee::ArrayLength => {
                if !args.is_empty() {
                    self.report(Diagnostic::NumArgsMismatch {
                        name: name.to_string(),
                        expected: 0,
                        actual: args.len(),
                        span,
                    });
                }
                Type::Int
            }
            Callee::Function(f) => {
                self.check_actuals(f, args, &arg_types, span);
                self.resolver().resolve_type(&f.return_ty)
            }
        }
    }

    /// Count first; only when it matches, one check per argument.
    fn check_actuals(&mut self, f: &'a FnDecl, args: &'a [Expr], arg_types: &[Type], span: Span) {
        if f.formals.len() != args.len() {
            self.report(Diagnostic::NumArgsMismatch {
                name: f.name.clone(),
                expected: f.formals.len(),
                actual: args.len(),
                span,
            });
            return;
        }
        for (position, ((arg, given), formal)) in args.iter().zip(arg_types).zip(&f.formals).enumerate() {
            let expected = self.resolver().resolve_type(&formal.ty);
            if !given.is_compatible_with(&expected) {
                self.report(Diagnostic::ArgMismatch {
                    position: position + 1,
                    given: given.clone(),
                    expected,
                    span: arg.span,
                });
            }
        }
    }

    // ── Declared types ────────────────────────────────────────────────────────

    /// Report a named type that denotes no class or interface. Returns whether
    /// the type is usable.
    pub(super) fn check_type_exists(&mut self, ty: &Type, span: Span) -> bool {
        let missing = self.resolver().undeclared_type(ty).map(str::to_string);
        match missing {
            Some(name) => {
                self.report(Diagnostic::IdentifierNotDeclared { name, role: Role::Type, span });
                false
            }
            None => true,
        }
    }
}
