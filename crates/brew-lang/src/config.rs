//! Analyzer options.

/// Who may read `obj.field` on a class-typed `obj`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldAccess {
    /// Any code may access fields through a qualified reference.
    #[default]
    Public,
    /// Only code inside the field's class or one of its subclasses.
    Protected,
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Compare `return` values against the enclosing function's declared type.
    pub check_return_types: bool,
    pub field_access: FieldAccess,
    /// Initial slot count of every symbol table.
    pub table_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check_return_types: true,
            field_access: FieldAccess::Public,
            table_capacity: 16,
        }
    }
}

impl Options {
    pub fn with_return_checks(mut self, enabled: bool) -> Self {
        self.check_return_types = enabled;
        self
    }

    pub fn with_field_access(mut self, access: FieldAccess) -> Self {
        self.field_access = access;
        self
    }

    pub fn with_table_capacity(mut self, capacity: usize) -> Self {
        self.table_capacity = capacity;
        self
    }
}
