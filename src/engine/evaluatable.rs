//! Constant-or-expression value cells.
//!
//! An `Evaluatable` starts out as a plain constant and can be switched to a
//! compiled expression at runtime. A failed compile never changes evaluation
//! behavior; the error is kept for the caller to inspect.

use crate::expr::{CompiledExpr, SymbolTable};

/// Value types an expression result can be read back as
pub trait ExprValue: Clone {
    fn from_scalar(v: f32) -> Self;
}

impl ExprValue for f32 {
    fn from_scalar(v: f32) -> Self {
        v
    }
}

impl ExprValue for bool {
    fn from_scalar(v: f32) -> Self {
        v > 0.5
    }
}

#[derive(Debug, Clone)]
pub struct Evaluatable<T: ExprValue> {
    default_value: T,
    expr: Option<CompiledExpr>,
    use_expr: bool,
    compiler_error: Option<String>,
}

impl<T: ExprValue> Evaluatable<T> {
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            expr: None,
            use_expr: false,
            compiler_error: None,
        }
    }

    /// Switch to constant mode
    pub fn set_constant(&mut self, value: T) {
        self.default_value = value;
        self.use_expr = false;
    }

    /// Try to compile `text` and switch to expression mode.
    ///
    /// On failure the previous mode and value stay in effect and the
    /// compiler error is retrievable through [`last_error`](Self::last_error).
    pub fn set_expression(&mut self, text: &str, table: &SymbolTable) -> bool {
        match CompiledExpr::compile(text, table) {
            Ok(compiled) => {
                self.expr = Some(compiled);
                self.use_expr = true;
                self.compiler_error = None;
                true
            }
            Err(e) => {
                self.compiler_error = Some(e.to_string());
                false
            }
        }
    }

    /// Expression value when in expression mode, the constant otherwise
    pub fn evaluate(&self, values: &[f32]) -> T {
        match (&self.expr, self.use_expr) {
            (Some(expr), true) => T::from_scalar(expr.evaluate(values)),
            _ => self.default_value.clone(),
        }
    }

    pub fn is_expression(&self) -> bool {
        self.use_expr
    }

    /// Last compile failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.compiler_error.as_deref()
    }

    /// Symbols referenced by the compiled expression (empty in constant mode)
    pub fn referenced_symbols(&self) -> &[String] {
        match (&self.expr, self.use_expr) {
            (Some(expr), true) => expr.referenced_symbols(),
            _ => &[],
        }
    }
}
