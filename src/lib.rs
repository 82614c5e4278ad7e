//! Morphrules - data-driven character morph evaluation
//!
//! Scripts declare aliases binding expression symbols to character state
//! (attributes, worn keywords, body parts, prior morph outputs) and rules
//! computing target morph values from them. The engine compiles rules once
//! per character class, snapshots a character's state, and produces a table
//! of setter/adder results for the host to apply.

pub mod core;
pub mod engine;
pub mod expr;
pub mod host;

pub use crate::core::{Result, RulesError};
pub use crate::engine::{CollisionPolicy, RuleSet, RuleSetManager, SourceKind};
pub use crate::host::{apply_results, Character, MorphSession, SourceResolver};
