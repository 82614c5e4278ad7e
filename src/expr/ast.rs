//! Expression AST for morph rule expressions.
//!
//! Rule expressions are small arithmetic formulas over alias symbols, e.g.
//! `k_suit * 0.5 + strength / 100`. All values are `f32`; comparison and
//! logical operators produce `1.0`/`0.0`, and operands are treated as true
//! when greater than `0.5`.

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal (e.g., 42.5)
    Literal(f32),
    /// A symbol reference (an alias or a built-in constant)
    Symbol(String),
    /// A binary operation (e.g., left + right)
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A unary operation (e.g., -x, !condition)
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// A conditional expression (if condition then true_expr else false_expr)
    Conditional {
        condition: Box<Expr>,
        true_expr: Box<Expr>,
        false_expr: Box<Expr>,
    },
    /// A function call (e.g., min(a, b))
    Function { name: String, args: Vec<Expr> },
}

/// Argument count for a built-in function, or `None` if the name is unknown.
///
/// Checked at compile time so evaluation never has to fail.
pub(crate) fn builtin_arity(name: &str) -> Option<usize> {
    match name {
        "abs" | "floor" | "ceil" | "sqrt" => Some(1),
        "min" | "max" => Some(2),
        "clamp" => Some(3),
        _ => None,
    }
}

fn truthy(v: f32) -> bool {
    v > 0.5
}

fn from_bool(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    /// Evaluate the expression, reading symbol values through `vars`.
    ///
    /// Assumes the expression was validated at compile time: unknown symbols
    /// and functions cannot occur here. Division by (near-)zero yields 0.0
    /// instead of leaking inf/NaN into morph values.
    pub fn eval_with(&self, vars: &dyn Fn(&str) -> f32) -> f32 {
        match self {
            Expr::Literal(v) => *v,
            Expr::Symbol(name) => vars(name),
            Expr::BinOp { op, left, right } => {
                let l = left.eval_with(vars);
                let r = right.eval_with(vars);
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => {
                        if r.abs() < f32::EPSILON {
                            0.0
                        } else {
                            l / r
                        }
                    }
                    BinOp::Mod => {
                        if r.abs() < f32::EPSILON {
                            0.0
                        } else {
                            l % r
                        }
                    }
                    BinOp::Gt => from_bool(l > r),
                    BinOp::Lt => from_bool(l < r),
                    BinOp::Gte => from_bool(l >= r),
                    BinOp::Lte => from_bool(l <= r),
                    BinOp::Eq => from_bool((l - r).abs() < f32::EPSILON),
                    BinOp::Neq => from_bool((l - r).abs() >= f32::EPSILON),
                    BinOp::And => from_bool(truthy(l) && truthy(r)),
                    BinOp::Or => from_bool(truthy(l) || truthy(r)),
                }
            }
            Expr::UnaryOp { op, operand } => {
                let v = operand.eval_with(vars);
                match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Not => from_bool(!truthy(v)),
                }
            }
            Expr::Conditional {
                condition,
                true_expr,
                false_expr,
            } => {
                if truthy(condition.eval_with(vars)) {
                    true_expr.eval_with(vars)
                } else {
                    false_expr.eval_with(vars)
                }
            }
            Expr::Function { name, args } => {
                let vals: Vec<f32> = args.iter().map(|a| a.eval_with(vars)).collect();
                match (name.as_str(), vals.as_slice()) {
                    ("abs", [v]) => v.abs(),
                    ("floor", [v]) => v.floor(),
                    ("ceil", [v]) => v.ceil(),
                    ("sqrt", [v]) => {
                        if *v < 0.0 {
                            0.0
                        } else {
                            v.sqrt()
                        }
                    }
                    ("min", [a, b]) => a.min(*b),
                    ("max", [a, b]) => a.max(*b),
                    ("clamp", [v, lo, hi]) => v.max(*lo).min(*hi),
                    _ => {
                        debug_assert!(false, "unvalidated function '{}'", name);
                        0.0
                    }
                }
            }
        }
    }
}

/// Error type for expression parsing and compilation
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}
