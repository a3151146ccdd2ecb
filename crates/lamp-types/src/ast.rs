//! Syntax tree node definitions.
//!
//! The external parser lowers its parse tree into these nodes; the evaluator
//! walks them. Node names follow the grammar rules (`if_block`,
//! `default_func`, `struct_ref`, ...) so the two sides read the same way.

/// A parsed source unit: the ordered statement list of one file or one
/// REPL line.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// Operator spelling, used in type-mismatch messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Operator spelling, used in type-mismatch messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A bare expression statement.
    Expr(Expr),
    /// `name = expr` — evaluates to the assigned value.
    AssignVar { name: String, value: Expr },
    /// `target.member = expr` — struct member write.
    AssignStruct {
        target: String,
        member: String,
        value: Expr,
    },
    /// `if (cond) { ... }`
    IfBlock { cond: Expr, body: Vec<Stmt> },
    /// `repeat (n) { ... }` — count is evaluated once.
    RepeatBlock { count: Expr, body: Vec<Stmt> },
    /// `for (x in list) { ... }`
    ForBlock {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    /// `func name(p1, p2) { ... }`
    FuncBlock {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    /// `struct Name { m1, m2 }`
    StructBlock { name: String, members: Vec<String> },
    /// `import path` / `import path (a, b)`
    Import {
        path: String,
        filter: Option<Vec<String>>,
    },
    /// `@extern("python", "file.py", "symbol")`
    MetaFunction {
        language: String,
        module: String,
        symbol: String,
    },
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// `[e1, e2, ...]` — flattened at evaluation time.
    List(Vec<Expr>),
    /// `{k1: v1, k2: v2}` — merged left to right, last write wins.
    Dict(Vec<(Expr, Expr)>),
    /// Variable read.
    Var(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// Arithmetic.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Comparison.
    Compare {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `out(e)` — prints in script mode, yields its value in the REPL.
    Out(Box<Expr>),
    /// `sqrt(e)` — integral results demote to Int.
    Sqrt(Box<Expr>),
    /// `pow(a, b)`
    Pow(Box<Expr>, Box<Expr>),
    /// Unqualified call: `name(args)`.
    DefaultFunc { name: String, args: Vec<Expr> },
    /// Namespaced call: `ns:name(args)`.
    NamespaceFunc {
        namespace: String,
        name: String,
        args: Vec<Expr>,
    },
    /// Struct type reference: `ns:Name`.
    StructRef { namespace: String, name: String },
    /// Struct member read: `target.member`.
    StructVal { target: String, member: String },
}
