//! Operator typing table — maps (operator, operand types) → result type.
//!
//! Queried by the expression checker. Lookups are pure: they never report,
//! they only answer `Type::Error` when a combination is not registered, and
//! the checker decides whether that deserves a diagnostic.

use rustc_hash::FxHashMap;

use crate::syntax::ast::{BinOp, PostfixOp, UnOp};
use crate::types::Type;

// ─── Families ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpFamily {
    Arithmetic,
    Relational,
    Equality,
    Logical,
}

impl BinOp {
    pub fn family(self) -> OpFamily {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => OpFamily::Arithmetic,
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq              => OpFamily::Relational,
            BinOp::Eq | BinOp::NotEq                                       => OpFamily::Equality,
            BinOp::And | BinOp::Or                                         => OpFamily::Logical,
        }
    }
}

// ─── Table ────────────────────────────────────────────────────────────────────

pub struct OperatorTable {
    binary: FxHashMap<(BinOp, &'static str, &'static str), &'static str>,
    unary: FxHashMap<(UnOp, &'static str), &'static str>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self { binary: FxHashMap::default(), unary: FxHashMap::default() }
    }

    pub fn register(&mut self, op: BinOp, lhs: &'static str, rhs: &'static str, ret: &'static str) {
        self.binary.insert((op, lhs, rhs), ret);
    }

    pub fn register_unary(&mut self, op: UnOp, operand: &'static str, ret: &'static str) {
        self.unary.insert((op, operand), ret);
    }

    /// Result type of `lhs op rhs`. `Error` when either operand is `Error` or
    /// the combination is not valid.
    pub fn binary_type(&self, op: BinOp, lhs: &Type, rhs: &Type) -> Type {
        if lhs.is_error() || rhs.is_error() {
            return Type::Error;
        }
        if op.family() == OpFamily::Equality {
            return equality_type(lhs, rhs);
        }
        let (Some(lk), Some(rk)) = (type_to_key(lhs), type_to_key(rhs)) else {
            return Type::Error;
        };
        self.binary.get(&(op, lk, rk)).map_or(Type::Error, |ret| key_to_type(ret))
    }

    pub fn unary_type(&self, op: UnOp, operand: &Type) -> Type {
        if operand.is_error() {
            return Type::Error;
        }
        type_to_key(operand)
            .and_then(|k| self.unary.get(&(op, k)))
            .map_or(Type::Error, |ret| key_to_type(ret))
    }

    /// `x++` / `x--` keep the operand's numeric type.
    pub fn postfix_type(&self, _op: PostfixOp, operand: &Type) -> Type {
        if operand.is_numeric() { operand.clone() } else { Type::Error }
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        let mut t = Self::new();
        register_numeric(&mut t, "int");
        register_numeric(&mut t, "double");
        register_bool(&mut t);
        t
    }
}

fn register_numeric(t: &mut OperatorTable, key: &'static str) {
    use BinOp::*;
    for op in [Add, Sub, Mul, Div, Mod] {
        t.register(op, key, key, key);
    }
    for op in [Lt, LtEq, Gt, GtEq] {
        t.register(op, key, key, "bool");
    }
    t.register_unary(UnOp::Neg, key, key);
}

fn register_bool(t: &mut OperatorTable) {
    t.register(BinOp::And, "bool", "bool", "bool");
    t.register(BinOp::Or, "bool", "bool", "bool");
    t.register_unary(UnOp::Not, "bool", "bool");
}

/// `==` / `!=` accept any pair compatible in either direction, except `void`.
fn equality_type(lhs: &Type, rhs: &Type) -> Type {
    if matches!(lhs, Type::Void) || matches!(rhs, Type::Void) {
        return Type::Error;
    }
    if lhs.is_compatible_with(rhs) || rhs.is_compatible_with(lhs) {
        Type::Bool
    } else {
        Type::Error
    }
}

// ─── Key helpers ──────────────────────────────────────────────────────────────

/// Map a primitive `Type` to its table key. `None` for named/array types.
pub fn type_to_key(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::Int    => Some("int"),
        Type::Double => Some("double"),
        Type::Bool   => Some("bool"),
        Type::String => Some("string"),
        _            => None,
    }
}

pub fn key_to_type(key: &str) -> Type {
    match key {
        "int"    => Type::Int,
        "double" => Type::Double,
        "bool"   => Type::Bool,
        "string" => Type::String,
        _        => Type::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_requires_matching_numeric_operands() {
        let t = OperatorTable::default();
        assert_eq!(t.binary_type(BinOp::Add, &Type::Int, &Type::Int), Type::Int);
        assert_eq!(t.binary_type(BinOp::Mul, &Type::Double, &Type::Double), Type::Double);
        assert_eq!(t.binary_type(BinOp::Add, &Type::Int, &Type::Double), Type::Error);
        assert_eq!(t.binary_type(BinOp::Sub, &Type::String, &Type::String), Type::Error);
    }

    #[test]
    fn relational_yields_bool() {
        let t = OperatorTable::default();
        assert_eq!(t.binary_type(BinOp::Lt, &Type::Int, &Type::Int), Type::Bool);
        assert_eq!(t.binary_type(BinOp::GtEq, &Type::Bool, &Type::Bool), Type::Error);
    }

    #[test]
    fn equality_accepts_null_against_named() {
        let t = OperatorTable::default();
        let a = Type::named("A");
        assert_eq!(t.binary_type(BinOp::Eq, &a, &Type::Null), Type::Bool);
        assert_eq!(t.binary_type(BinOp::NotEq, &Type::Null, &a), Type::Bool);
        assert_eq!(t.binary_type(BinOp::Eq, &a, &Type::named("B")), Type::Error);
        assert_eq!(t.binary_type(BinOp::Eq, &Type::Void, &Type::Void), Type::Error);
    }

    #[test]
    fn error_operands_propagate() {
        let t = OperatorTable::default();
        assert_eq!(t.binary_type(BinOp::Add, &Type::Error, &Type::Int), Type::Error);
        assert_eq!(t.unary_type(UnOp::Not, &Type::Error), Type::Error);
    }

    #[test]
    fn unary_operators() {
        let t = OperatorTable::default();
        assert_eq!(t.unary_type(UnOp::Neg, &Type::Double), Type::Double);
        assert_eq!(t.unary_type(UnOp::Not, &Type::Bool), Type::Bool);
        assert_eq!(t.unary_type(UnOp::Not, &Type::Int), Type::Error);
    }
}
