//! Rule evaluation core: aliases, rule sets, script loading and the
//! per-class manager.

pub mod alias;
pub mod evaluatable;
pub mod manager;
pub mod ruleset;
pub mod script;

pub use alias::{Alias, SourceKind};
pub use evaluatable::Evaluatable;
pub use manager::{RuleSetManager, SharedRuleSet};
pub use ruleset::{CollisionPolicy, Rule, RuleSet};
pub use script::{AliasDef, RulesBlock, ScriptFile};
