use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

pub use crate::types::Type;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Identity of an expression node. Keys the inferred-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(0);

impl NodeId {
    /// Mint an id no other node in this process carries.
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self { decls }
    }
}

// ─── Declarations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Decl {
    Var(VarDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Fn(FnDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Var(v)       => &v.name,
            Decl::Class(c)     => &c.name,
            Decl::Interface(i) => &i.name,
            Decl::Fn(f)        => &f.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Var(v)       => v.span,
            Decl::Class(c)     => c.span,
            Decl::Interface(i) => i.span,
            Decl::Fn(f)        => f.span,
        }
    }
}

impl From<VarDecl> for Decl {
    fn from(v: VarDecl) -> Self { Decl::Var(v) }
}

impl From<ClassDecl> for Decl {
    fn from(c: ClassDecl) -> Self { Decl::Class(c) }
}

impl From<InterfaceDecl> for Decl {
    fn from(i: InterfaceDecl) -> Self { Decl::Interface(i) }
}

impl From<FnDecl> for Decl {
    fn from(f: FnDecl) -> Self { Decl::Fn(f) }
}

/// `int x;`. Also used for formals and block locals.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty, span: Span::default() }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }
}

/// `class B extends A implements I, J { ... }`
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub members: Vec<Member>,
    pub span: Span,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.extends = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    pub fn member(mut self, member: impl Into<Member>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }
}

/// A class body holds fields and methods only.
#[derive(Debug, Clone)]
pub enum Member {
    Field(VarDecl),
    Method(FnDecl),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(v)  => &v.name,
            Member::Method(f) => &f.name,
        }
    }
}

impl From<VarDecl> for Member {
    fn from(v: VarDecl) -> Self { Member::Field(v) }
}

impl From<FnDecl> for Member {
    fn from(f: FnDecl) -> Self { Member::Method(f) }
}

/// `interface I { bool m(int x); }`. Members are signatures only.
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub members: Vec<FnDecl>,
    pub span: Span,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>, members: Vec<FnDecl>) -> Self {
        Self { name: name.into(), members, span: Span::default() }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }
}

/// A function or method. `body == None` marks a signature-only member.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub name: String,
    pub return_ty: Type,
    pub formals: Vec<VarDecl>,
    pub body: Option<Block>,
    pub span: Span,
}

impl FnDecl {
    pub fn new(name: impl Into<String>, return_ty: Type, formals: Vec<VarDecl>) -> Self {
        Self { name: name.into(), return_ty, formals, body: None, span: Span::default() }
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }

    /// Same arity, pairwise-equivalent formal types and equivalent return type.
    pub fn signature_matches(&self, other: &FnDecl) -> bool {
        self.return_ty.is_equivalent_to(&other.return_ty)
            && self.formals.len() == other.formals.len()
            && self.formals.iter()
                .zip(&other.formals)
                .all(|(a, b)| a.ty.is_equivalent_to(&b.ty))
    }
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `{ int x; x = 1; }`
    Block(Block),
    /// `if (test) stmt else stmt`
    If(IfStmt),
    /// `while (test) stmt`
    While(WhileStmt),
    /// `for (init; test; step) stmt`
    For(ForStmt),
    /// `switch (test) { case 1: ... default: ... }`
    Switch(SwitchStmt),
    Break(Span),
    /// `return expr;` or bare `return;`
    Return(Option<Expr>, Span),
    /// `Print(a, b, c);`
    Print(Vec<Expr>, Span),
    /// A standalone expression used as a statement (e.g. a call or assignment).
    Expr(Expr),
}

impl From<Block> for Stmt {
    fn from(b: Block) -> Self { Stmt::Block(b) }
}

impl From<Expr> for Stmt {
    fn from(e: Expr) -> Self { Stmt::Expr(e) }
}

/// Local declarations come first, then statements.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub decls: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Self {
        Self { decls, stmts, span: Span::default() }
    }
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub test: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

impl IfStmt {
    pub fn new(test: Expr, then_branch: impl Into<Stmt>, else_branch: Option<Stmt>) -> Self {
        Self {
            test,
            then_branch: Box::new(then_branch.into()),
            else_branch: else_branch.map(Box::new),
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub test: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

impl WhileStmt {
    pub fn new(test: Expr, body: impl Into<Stmt>) -> Self {
        Self { test, body: Box::new(body.into()), span: Span::default() }
    }
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Expr>,
    pub test: Expr,
    pub step: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

impl ForStmt {
    pub fn new(init: Option<Expr>, test: Expr, step: Option<Expr>, body: impl Into<Stmt>) -> Self {
        Self { init, test, step, body: Box::new(body.into()), span: Span::default() }
    }
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub test: Expr,
    pub cases: Vec<CaseStmt>,
    pub default: Option<Vec<Stmt>>,
    pub span: Span,
}

impl SwitchStmt {
    pub fn new(test: Expr, cases: Vec<CaseStmt>, default: Option<Vec<Stmt>>) -> Self {
        Self { test, cases, default, span: Span::default() }
    }
}

#[derive(Debug, Clone)]
pub struct CaseStmt {
    pub label: i64,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl CaseStmt {
    pub fn new(label: i64, body: Vec<Stmt>) -> Self {
        Self { label, body, span: Span::default() }
    }
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    DoubleLit(f64),
    BoolLit(bool),
    StringLit(String),
    Null,

    /// `a + b`, `a == b`, `a && b`, etc.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `-x`, `!x`
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },

    /// `x++`, `x--`
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
    },

    /// `target = value`
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    This,

    /// `base[subscript]`
    ArrayAccess {
        base: Box<Expr>,
        subscript: Box<Expr>,
    },

    /// `field` or `base.field`. Without a base this may still denote a
    /// member reached through an implicit `this`.
    FieldAccess {
        base: Option<Box<Expr>>,
        field: String,
    },

    /// `name(args)` or `base.name(args)`
    Call {
        base: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },

    /// `new C`
    New(String),

    /// `NewArray(size, T)`
    NewArray {
        size: Box<Expr>,
        elem: Type,
    },

    ReadInteger,
    ReadLine,
}

/// A copy is a new node: every expression in it gets its own id.
impl Clone for Expr {
    fn clone(&self) -> Self {
        Self { id: NodeId::fresh(), kind: self.kind.clone(), span: self.span }
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self { id: NodeId::fresh(), kind, span: Span::default() }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }

    /// Only field and array accesses denote storage locations.
    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, ExprKind::FieldAccess { .. } | ExprKind::ArrayAccess { .. })
    }

    pub fn int(value: i64) -> Self { Self::new(ExprKind::IntLit(value)) }
    pub fn double(value: f64) -> Self { Self::new(ExprKind::DoubleLit(value)) }
    pub fn bool(value: bool) -> Self { Self::new(ExprKind::BoolLit(value)) }
    pub fn string(value: impl Into<String>) -> Self { Self::new(ExprKind::StringLit(value.into())) }
    pub fn null() -> Self { Self::new(ExprKind::Null) }
    pub fn this() -> Self { Self::new(ExprKind::This) }
    pub fn read_integer() -> Self { Self::new(ExprKind::ReadInteger) }
    pub fn read_line() -> Self { Self::new(ExprKind::ReadLine) }

    /// Unqualified name reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::new(ExprKind::FieldAccess { base: None, field: name.into() })
    }

    pub fn field(base: Expr, field: impl Into<String>) -> Self {
        Self::new(ExprKind::FieldAccess { base: Some(Box::new(base)), field: field.into() })
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call { base: None, name: name.into(), args })
    }

    pub fn method(base: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call { base: Some(Box::new(base)), name: name.into(), args })
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) })
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary { op, operand: Box::new(operand) })
    }

    pub fn postfix(op: PostfixOp, operand: Expr) -> Self {
        Self::new(ExprKind::Postfix { op, operand: Box::new(operand) })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::new(ExprKind::Assign { target: Box::new(target), value: Box::new(value) })
    }

    pub fn index(base: Expr, subscript: Expr) -> Self {
        Self::new(ExprKind::ArrayAccess { base: Box::new(base), subscript: Box::new(subscript) })
    }

    pub fn new_object(class: impl Into<String>) -> Self {
        Self::new(ExprKind::New(class.into()))
    }

    pub fn new_array(size: Expr, elem: Type) -> Self {
        Self::new(ExprKind::NewArray { size: Box::new(size), elem })
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod,
    Lt, LtEq, Gt, GtEq,
    Eq, NotEq,
    And, Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOp {
    Incr,
    Decr,
}

/// Any operator a diagnostic may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Binary(BinOp),
    Unary(UnOp),
    Postfix(PostfixOp),
    Assign,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add   => "+",
            BinOp::Sub   => "-",
            BinOp::Mul   => "*",
            BinOp::Div   => "/",
            BinOp::Mod   => "%",
            BinOp::Lt    => "<",
            BinOp::LtEq  => "<=",
            BinOp::Gt    => ">",
            BinOp::GtEq  => ">=",
            BinOp::Eq    => "==",
            BinOp::NotEq => "!=",
            BinOp::And   => "&&",
            BinOp::Or    => "||",
        };
        f.write_str(s)
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { UnOp::Neg => "-", UnOp::Not => "!" })
    }
}

impl fmt::Display for PostfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { PostfixOp::Incr => "++", PostfixOp::Decr => "--" })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Binary(op)  => op.fmt(f),
            Operator::Unary(op)   => op.fmt(f),
            Operator::Postfix(op) => op.fmt(f),
            Operator::Assign      => f.write_str("="),
        }
    }
}
