//! Type model.
//!
//! Types are plain values. Named types compare nominally; `Error` marks an
//! expression whose problem has already been reported and is never
//! equivalent to anything, while still being accepted wherever a type is
//! expected so that one mistake produces one diagnostic.

pub mod operators;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Double,
    Bool,
    String,
    Void,
    /// Type of the `null` literal.
    Null,
    /// Already reported; suppresses further diagnostics.
    Error,
    /// A class or interface, by declared name.
    Named(String),
    Array(Box<Type>),
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(name.into())
    }

    pub fn array_of(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    /// Structural on arrays, nominal on named types. `Error` is equivalent to
    /// nothing, itself included.
    pub fn is_equivalent_to(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => false,
            (Type::Array(a), Type::Array(b))    => a.is_equivalent_to(b),
            (Type::Named(a), Type::Named(b))    => a == b,
            (a, b)                              => a == b,
        }
    }

    /// Whether a value of `self` may flow into a slot of type `target`:
    /// equivalence, `null` into any named type, or an `Error` on either side.
    pub fn is_compatible_with(&self, target: &Type) -> bool {
        if self.is_error() || target.is_error() {
            return true;
        }
        if matches!((self, target), (Type::Null, Type::Named(_))) {
            return true;
        }
        self.is_equivalent_to(target)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int       => f.write_str("int"),
            Type::Double    => f.write_str("double"),
            Type::Bool      => f.write_str("bool"),
            Type::String    => f.write_str("string"),
            Type::Void      => f.write_str("void"),
            Type::Null      => f.write_str("null"),
            Type::Error     => f.write_str("error"),
            Type::Named(n)  => f.write_str(n),
            Type::Array(e)  => write!(f, "{e}[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_equivalent_to_themselves_only() {
        assert!(Type::Int.is_equivalent_to(&Type::Int));
        assert!(!Type::Int.is_equivalent_to(&Type::Double));
        assert!(!Type::Bool.is_equivalent_to(&Type::String));
    }

    #[test]
    fn arrays_compare_by_element() {
        let ints = Type::array_of(Type::Int);
        assert!(ints.is_equivalent_to(&Type::array_of(Type::Int)));
        assert!(!ints.is_equivalent_to(&Type::array_of(Type::Double)));
        let nested = Type::array_of(Type::array_of(Type::named("A")));
        assert!(nested.is_equivalent_to(&Type::array_of(Type::array_of(Type::named("A")))));
    }

    #[test]
    fn named_types_are_nominal() {
        assert!(Type::named("A").is_equivalent_to(&Type::named("A")));
        assert!(!Type::named("A").is_equivalent_to(&Type::named("B")));
    }

    #[test]
    fn error_is_equivalent_to_nothing() {
        assert!(!Type::Error.is_equivalent_to(&Type::Error));
        assert!(!Type::Error.is_equivalent_to(&Type::Int));
        assert!(!Type::Int.is_equivalent_to(&Type::Error));
    }

    #[test]
    fn error_is_compatible_with_everything() {
        assert!(Type::Error.is_compatible_with(&Type::Int));
        assert!(Type::named("A").is_compatible_with(&Type::Error));
    }

    #[test]
    fn null_flows_into_named_types_only() {
        assert!(Type::Null.is_compatible_with(&Type::named("A")));
        assert!(!Type::Null.is_compatible_with(&Type::Int));
        assert!(!Type::named("A").is_compatible_with(&Type::Null));
        assert!(!Type::Null.is_compatible_with(&Type::array_of(Type::Int)));
    }

    #[test]
    fn display_names() {
        assert_eq!(Type::array_of(Type::array_of(Type::Int)).to_string(), "int[][]");
        assert_eq!(Type::named("Shape").to_string(), "Shape");
        assert_eq!(Type::Error.to_string(), "error");
    }
}
