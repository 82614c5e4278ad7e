//! Symbol table and compiled expressions.
//!
//! A `SymbolTable` maps alias symbols to value slots; a `CompiledExpr` is an
//! AST bound against one table, with every free variable resolved to a slot
//! at compile time. Evaluation reads slot values from a caller-supplied
//! buffer (the rule set's snapshot) and can no longer fail.

use ahash::AHashMap;

use super::ast::{builtin_arity, Expr, ParseError};

/// Built-in constants, always available and never shadowable by aliases
pub fn is_constant(name: &str) -> bool {
    matches!(name, "pi" | "epsilon" | "inf")
}

fn constant_value(name: &str) -> Option<f32> {
    match name {
        "pi" => Some(std::f32::consts::PI),
        "epsilon" => Some(f32::EPSILON),
        "inf" => Some(f32::INFINITY),
        _ => None,
    }
}

fn is_legal_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Registry of declared symbols, each bound to a value slot.
///
/// Synonymous symbols (aliases collapsed onto the same source) share a slot.
#[derive(Debug, Default)]
pub struct SymbolTable {
    slots: AHashMap<String, usize>,
    slot_count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new symbol in its own fresh slot.
    ///
    /// Fails on redefinition, on illegal symbol names, and on the reserved
    /// constant names.
    pub fn add_variable(&mut self, name: &str) -> Option<usize> {
        if !is_legal_symbol(name) || is_constant(name) || self.slots.contains_key(name) {
            return None;
        }
        let slot = self.slot_count;
        self.slots.insert(name.to_string(), slot);
        self.slot_count += 1;
        Some(slot)
    }

    /// Register a symbol as a synonym of an already-allocated slot
    pub fn add_synonym(&mut self, name: &str, slot: usize) -> bool {
        if !is_legal_symbol(name) || is_constant(name) || self.slots.contains_key(name) {
            return false;
        }
        debug_assert!(slot < self.slot_count);
        self.slots.insert(name.to_string(), slot);
        true
    }

    /// Unregister a symbol, releasing its slot if it was the most recent one.
    /// Used to roll back a failed alias declaration.
    pub fn remove(&mut self, name: &str) {
        if let Some(slot) = self.slots.remove(name) {
            if slot + 1 == self.slot_count && !self.slots.values().any(|&s| s == slot) {
                self.slot_count -= 1;
            }
        }
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Number of allocated value slots (synonyms don't add slots)
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.slot_count = 0;
    }
}

/// An expression compiled against a symbol table
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    ast: Expr,
    bindings: AHashMap<String, usize>,
    referenced: Vec<String>,
}

impl CompiledExpr {
    /// Parse and bind an expression.
    ///
    /// Every free variable must be a registered symbol or a built-in
    /// constant; function names and arities are checked here so that
    /// evaluation is infallible.
    pub fn compile(text: &str, table: &SymbolTable) -> Result<Self, ParseError> {
        let ast = Expr::parse(text)?;
        let mut bindings = AHashMap::new();
        let mut referenced = Vec::new();
        bind(&ast, table, &mut bindings, &mut referenced)?;
        Ok(Self {
            ast,
            bindings,
            referenced,
        })
    }

    /// Evaluate against a slot-value buffer (the snapshot)
    pub fn evaluate(&self, values: &[f32]) -> f32 {
        self.ast.eval_with(&|name| {
            if let Some(&slot) = self.bindings.get(name) {
                values.get(slot).copied().unwrap_or(0.0)
            } else {
                constant_value(name).unwrap_or(0.0)
            }
        })
    }

    /// Symbols the expression references, excluding built-in constants,
    /// in first-appearance order without duplicates
    pub fn referenced_symbols(&self) -> &[String] {
        &self.referenced
    }
}

fn bind(
    expr: &Expr,
    table: &SymbolTable,
    bindings: &mut AHashMap<String, usize>,
    referenced: &mut Vec<String>,
) -> Result<(), ParseError> {
    match expr {
        Expr::Literal(_) => Ok(()),
        Expr::Symbol(name) => {
            if is_constant(name) || bindings.contains_key(name) {
                return Ok(());
            }
            match table.slot_of(name) {
                Some(slot) => {
                    bindings.insert(name.clone(), slot);
                    referenced.push(name.clone());
                    Ok(())
                }
                None => Err(ParseError::new(format!("Unknown symbol '{}'", name))),
            }
        }
        Expr::BinOp { left, right, .. } => {
            bind(left, table, bindings, referenced)?;
            bind(right, table, bindings, referenced)
        }
        Expr::UnaryOp { operand, .. } => bind(operand, table, bindings, referenced),
        Expr::Conditional {
            condition,
            true_expr,
            false_expr,
        } => {
            bind(condition, table, bindings, referenced)?;
            bind(true_expr, table, bindings, referenced)?;
            bind(false_expr, table, bindings, referenced)
        }
        Expr::Function { name, args } => {
            match builtin_arity(name) {
                Some(arity) if arity == args.len() => {}
                Some(arity) => {
                    return Err(ParseError::new(format!(
                        "Function '{}' expects {} args, got {}",
                        name,
                        arity,
                        args.len()
                    )));
                }
                None => {
                    return Err(ParseError::new(format!("Unknown function '{}'", name)));
                }
            }
            for arg in args {
                bind(arg, table, bindings, referenced)?;
            }
            Ok(())
        }
    }
}
