//! One class's rule-evaluation state: alias registry, rule store and the
//! per-character value snapshot.
//!
//! A `RuleSet` is built once from scripts and then queried with the
//! two-phase snapshot/evaluate protocol. The owner (the manager) wraps each
//! instance in a `Mutex`, which serializes snapshot, evaluate and reload
//! against each other; instances for different class keys never contend.

use ahash::AHashMap;

use crate::core::error::{Result, RulesError};
use crate::core::types::{MorphResult, ResultTable, VisibleLayer};
use crate::engine::alias::{AcquireFn, Alias, SourceKind};
use crate::engine::evaluatable::Evaluatable;
use crate::expr::{is_constant, SymbolTable};
use crate::host::{Character, SourceResolver};

/// What to do when a new rule targets a morph that already has rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    Overwrite,
    Append,
}

/// A compiled rule contributing to one target morph
pub struct Rule {
    pub target: String,
    pub is_setter: bool,
    expr: Evaluatable<f32>,
    /// Canonical symbols of the aliases the expression references
    external_symbols: Vec<String>,
}

impl Rule {
    pub fn evaluate(&self, snapshot: &[f32]) -> f32 {
        self.expr.evaluate(snapshot)
    }

    pub fn external_symbols(&self) -> &[String] {
        &self.external_symbols
    }
}

/// Alias registry + rule store + value snapshot for one character class
#[derive(Default)]
pub struct RuleSet {
    symbols: SymbolTable,
    /// Canonical symbol -> alias. Synonyms live in `synonyms`, not here.
    aliases: AHashMap<String, Alias>,
    /// Synonym symbol -> canonical symbol
    synonyms: AHashMap<String, String>,
    /// Target morph -> rules in declaration order
    rules: AHashMap<String, Vec<Rule>>,
    /// Per-slot alias values captured by the latest snapshot; holds the
    /// declared defaults until the first snapshot runs
    value_snapshot: Vec<f32>,
    loaded: bool,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once any alias or rule has been accepted since the last clear
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.aliases.clear();
        self.synonyms.clear();
        self.rules.clear();
        self.value_snapshot.clear();
        self.loaded = false;
    }

    /// Declare an alias binding `symbol` to the source named `source_id`.
    ///
    /// Candidate kinds allowed by `mask` are tried in fixed precedence:
    /// attribute, worn keyword, visible worn keyword, entity keyword, body
    /// part, rule output; the first that resolves wins. If another alias
    /// already binds the same resolved source, `symbol` becomes a synonym
    /// sharing its value slot. On failure nothing is left registered.
    pub fn declare_alias(
        &mut self,
        symbol: &str,
        source_id: &str,
        mask: SourceKind,
        default_value: f32,
        resolver: &dyn SourceResolver,
    ) -> Result<()> {
        // Collapse aliases referencing the same attribute/keyword/morph
        if let Some(canonical) = self.find_same_reference(source_id, mask) {
            let slot = self.aliases[&canonical].slot;
            if !self.symbols.add_synonym(symbol, slot) {
                return Err(RulesError::SymbolRedefinition(symbol.to_string()));
            }
            if let Some(alias) = self.aliases.get_mut(&canonical) {
                alias.equivalent_symbols.push(symbol.to_string());
            }
            self.synonyms.insert(symbol.to_string(), canonical);
            self.loaded = true;
            return Ok(());
        }

        let slot = self
            .symbols
            .add_variable(symbol)
            .ok_or_else(|| RulesError::SymbolRedefinition(symbol.to_string()))?;
        debug_assert_eq!(slot, self.value_snapshot.len());
        self.value_snapshot.push(default_value);

        match Self::resolve_source(source_id, mask, resolver) {
            Some((kind, acquire)) => {
                self.aliases.insert(
                    symbol.to_string(),
                    Alias::new(symbol, source_id, kind, slot, acquire),
                );
                self.loaded = true;
                Ok(())
            }
            None => {
                self.symbols.remove(symbol);
                self.value_snapshot.pop();
                Err(RulesError::UnresolvedSource {
                    symbol: symbol.to_string(),
                    source_id: source_id.to_string(),
                })
            }
        }
    }

    fn resolve_source(
        source_id: &str,
        mask: SourceKind,
        resolver: &dyn SourceResolver,
    ) -> Option<(SourceKind, AcquireFn)> {
        if mask.contains(SourceKind::ATTRIBUTE) {
            if let Some(id) = resolver.resolve_attribute(source_id) {
                return Some((
                    SourceKind::ATTRIBUTE,
                    Box::new(move |c, _| c.attribute(id)),
                ));
            }
        }
        if mask.contains(SourceKind::WORN_KEYWORD) {
            if let Some(id) = resolver.resolve_keyword(source_id) {
                return Some((
                    SourceKind::WORN_KEYWORD,
                    Box::new(move |c, _| bool_value(c.has_worn_keyword(id, VisibleLayer::ANY))),
                ));
            }
        }
        if mask.contains(SourceKind::VISIBLE_WORN_KEYWORD) {
            if let Some(id) = resolver.resolve_keyword(source_id) {
                return Some((
                    SourceKind::VISIBLE_WORN_KEYWORD,
                    Box::new(move |c, layer| bool_value(c.has_worn_keyword(id, layer))),
                ));
            }
        }
        if mask.contains(SourceKind::ENTITY_KEYWORD) {
            if let Some(id) = resolver.resolve_keyword(source_id) {
                return Some((
                    SourceKind::ENTITY_KEYWORD,
                    Box::new(move |c, _| bool_value(c.has_entity_keyword(id))),
                ));
            }
        }
        if mask.contains(SourceKind::BODY_PART) {
            if let Some(id) = resolver.resolve_body_part(source_id) {
                return Some((
                    SourceKind::BODY_PART,
                    Box::new(move |c, _| bool_value(c.has_body_part(id))),
                ));
            }
        }
        if mask.contains(SourceKind::RULE_OUTPUT) {
            let name = source_id.to_string();
            return Some((
                SourceKind::RULE_OUTPUT,
                Box::new(move |c, _| c.morph_value(&name)),
            ));
        }
        None
    }

    fn find_same_reference(&self, source_id: &str, mask: SourceKind) -> Option<String> {
        self.aliases
            .values()
            .find(|a| a.is_same_reference(source_id, mask))
            .map(|a| a.symbol.clone())
    }

    /// Canonical alias for any declared symbol, following synonyms
    pub fn canonical_alias(&self, symbol: &str) -> Option<&Alias> {
        if let Some(alias) = self.aliases.get(symbol) {
            return Some(alias);
        }
        self.synonyms
            .get(symbol)
            .and_then(|canonical| self.aliases.get(canonical))
    }

    /// Compile and store a rule for `target`.
    ///
    /// Setters always overwrite the whole existing list. Adders follow
    /// `policy`; appending onto a trailing setter is rejected. Rules that
    /// fail to compile or would close a reference cycle are rejected and the
    /// existing list stays untouched.
    pub fn add_rule(
        &mut self,
        target: &str,
        expr_text: &str,
        is_setter: bool,
        policy: CollisionPolicy,
    ) -> Result<()> {
        let mut expr = Evaluatable::new(0.0f32);
        if !expr.set_expression(expr_text, &self.symbols) {
            return Err(RulesError::RuleCompile {
                target: target.to_string(),
                message: expr.last_error().unwrap_or("unknown error").to_string(),
            });
        }

        // Resolve referenced symbols to canonical aliases; synonyms count as
        // their canonical alias so cycle checks can't be dodged by renaming
        let mut external_symbols = Vec::new();
        for symbol in expr.referenced_symbols() {
            if let Some(alias) = self.canonical_alias(symbol) {
                if !external_symbols.contains(&alias.symbol) {
                    external_symbols.push(alias.symbol.clone());
                }
            }
        }

        let rule = Rule {
            target: target.to_string(),
            is_setter,
            expr,
            external_symbols,
        };

        if let Some(symbol) = self.morph_loop_alias(&rule) {
            return Err(RulesError::CircularReference {
                target: target.to_string(),
                symbol,
            });
        }

        // A Setter always overwrites existing rules for the same morph
        let policy = if is_setter {
            CollisionPolicy::Overwrite
        } else {
            policy
        };

        match self.rules.get_mut(target) {
            None => {
                self.rules.insert(target.to_string(), vec![rule]);
            }
            Some(list) => match policy {
                CollisionPolicy::Overwrite => {
                    list.clear();
                    list.push(rule);
                }
                CollisionPolicy::Append => {
                    if list.last().is_some_and(|r| r.is_setter) {
                        return Err(RulesError::SetterCollision(target.to_string()));
                    }
                    list.push(rule);
                }
            },
        }

        self.loaded = true;
        Ok(())
    }

    /// Would storing `rule` close a reference loop back to its own target?
    ///
    /// Walks rule-output aliases depth-first through the already-stored rule
    /// graph; returns the offending alias symbol on a hit. Stored rules are
    /// acyclic by induction, so the walk terminates.
    pub fn morph_loop_alias(&self, rule: &Rule) -> Option<String> {
        self.morph_loop_impl(rule, &rule.target)
    }

    fn morph_loop_impl(&self, rule: &Rule, root_target: &str) -> Option<String> {
        for symbol in &rule.external_symbols {
            let alias = match self.aliases.get(symbol) {
                Some(a) => a,
                None => continue,
            };
            if !alias.kind.contains(SourceKind::RULE_OUTPUT) {
                continue;
            }
            if alias.source_id == root_target {
                return Some(symbol.clone());
            }
            if let Some(list) = self.rules.get(alias.source_id.as_str()) {
                for stored in list {
                    if self.morph_loop_impl(stored, root_target).is_some() {
                        return Some(symbol.clone());
                    }
                }
            }
        }
        None
    }

    /// Freeze the character's current state into the value snapshot.
    ///
    /// Chooses the visibility layer from the character's suit state, then
    /// runs every canonical alias's acquisition once; synonyms share slots
    /// and are populated for free.
    pub fn snapshot(&mut self, character: &dyn Character) {
        let layer = if character.suited() {
            VisibleLayer::SUIT
        } else {
            VisibleLayer::APPAREL
        };

        let values = &mut self.value_snapshot;
        for alias in self.aliases.values() {
            values[alias.slot] = alias.acquire(character, layer);
        }
    }

    /// Compute the result table for every target morph from the current
    /// snapshot.
    ///
    /// Within one target the first setter wins; otherwise adders sum. An
    /// all-adder result of exactly zero is suppressed, while a setter zero
    /// is emitted ("set to zero" is an instruction, "adds nothing" is not).
    pub fn evaluate(&self, out: &mut ResultTable) {
        out.clear();

        for (target, list) in &self.rules {
            let mut is_setter = false;
            let mut value = 0.0f32;

            for rule in list {
                if rule.is_setter {
                    is_setter = true;
                    value = rule.evaluate(&self.value_snapshot);
                    break;
                }
                value += rule.evaluate(&self.value_snapshot);
            }

            if !is_setter && value == 0.0 {
                continue;
            }
            out.insert(target.clone(), MorphResult { is_setter, value });
        }
    }

    /// Override one symbol's snapshot value (host scripting hook).
    /// Returns false for unknown symbols.
    pub fn set_symbol_value(&mut self, symbol: &str, value: f32) -> bool {
        match self.symbols.slot_of(symbol) {
            Some(slot) => {
                self.value_snapshot[slot] = value;
                true
            }
            None => false,
        }
    }

    /// Current snapshot value of a symbol, if declared
    pub fn symbol_value(&self, symbol: &str) -> Option<f32> {
        self.symbols
            .slot_of(symbol)
            .and_then(|slot| self.value_snapshot.get(slot).copied())
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol) || is_constant(symbol)
    }

    /// Rules currently stored for a target morph
    pub fn rules_for(&self, target: &str) -> &[Rule] {
        self.rules.get(target).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn bool_value(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}
