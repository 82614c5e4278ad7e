//! Expression engine: AST, parser, symbol table and compiled expressions.
//!
//! Rule expressions are compiled once at script-load time against the rule
//! set's symbol table and evaluated many times against per-character
//! snapshots.

pub mod ast;
mod parser;
pub mod symbols;

pub use ast::{BinOp, Expr, ParseError, UnaryOp};
pub use symbols::{is_constant, CompiledExpr, SymbolTable};
