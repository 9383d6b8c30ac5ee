use crate::common::{Lit, Spanned};

/// Binary infix operators, ordered the same way `compiler::parse` tables
/// their precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Built-in forms recognized by call-position name and lowered straight
/// to their dedicated opcode rather than an ordinary `CALL`/`CALL_LIT`:
/// `coroutine(f)`, `resume(c, ...)`, `yield(...)`, `print(...)`, `keys(m)`,
/// `values(m)`, `inherit(child, parent)`, `status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Keys,
    Values,
    Inherit,
    Status,
    Coroutine,
    Resume,
    Yield,
}

impl Builtin {
    /// Recognizes a call-position name as one of the builtin forms. Only
    /// `print`, `keys`, `values`, `inherit`, and `status` are matched by
    /// plain identifier here — `coroutine`/`resume`/`yield` are reserved
    /// keywords the parser already routes separately.
    pub fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "print" => Builtin::Print,
            "keys" => Builtin::Keys,
            "values" => Builtin::Values,
            "inherit" => Builtin::Inherit,
            "status" => Builtin::Status,
            _ => return None,
        })
    }
}

/// A node of the parsed expression tree. Every node is wrapped in a
/// [`Spanned`] so compile errors can point back at source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A comma-separated list of value expressions, e.g. the right-hand
    /// side of `a, b = f()` or the arguments to a call.
    Multi(Vec<Spanned<Expr>>),

    /// A bare name lookup: `x`.
    Name(String),

    Literal(Lit),

    Binary(BinOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Unary(UnOp, Box<Spanned<Expr>>),
    Logical(LogicOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),

    /// `base.name`
    Field(Box<Spanned<Expr>>, String),
    /// `base[index]`
    Index(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `callee(args)`
    Call(Box<Spanned<Expr>>, Vec<Spanned<Expr>>),
    /// `receiver:method(args)`
    MethodCall(Box<Spanned<Expr>>, String, Vec<Spanned<Expr>>),

    If {
        cond: Box<Spanned<Expr>>,
        then_block: Vec<Spanned<Expr>>,
        else_block: Vec<Spanned<Expr>>,
    },
    While {
        cond: Box<Spanned<Expr>>,
        body: Vec<Spanned<Expr>>,
    },
    For {
        key: String,
        value: Option<String>,
        iter: Box<Spanned<Expr>>,
        body: Vec<Spanned<Expr>>,
    },
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Vec<Spanned<Expr>>,
    },
    Return(Vec<Spanned<Expr>>),
    Break,
    Continue,

    Builtin(Builtin, Vec<Spanned<Expr>>),

    Vec(Vec<Spanned<Expr>>),
    Map(Vec<(Spanned<Expr>, Spanned<Expr>)>),

    /// `global` / `local`, evaluated to the corresponding scope-as-a-map.
    Global,
    Local,

    /// `targets = values`
    Assign(Vec<Spanned<Expr>>, Vec<Spanned<Expr>>),

    /// A double-quoted string literal containing `$name`/`${expr}`
    /// interpolation, desugared at parse time into a list of alternating
    /// literal and expression pieces that lowering joins with `CONCAT`.
    Interpolated(Vec<InterpPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Str(String),
    Expr(Spanned<Expr>),
}
