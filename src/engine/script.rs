//! JSON rule-script parsing and best-effort loading into a [`RuleSet`].
//!
//! A script carries an alias block and a rule block:
//!
//! ```json
//! {
//!     "Aliases": {
//!         "heavy": { "EditorID": "ArmorHeavy", "Type": "wornKeyword" },
//!         "str":   { "EditorID": "AVStrength", "Type": "actorValue", "Default": 10.0 }
//!     },
//!     "Rules": {
//!         "Adders":  { "MuscleTone": "str / 100" },
//!         "Setters": { "ShoulderWidth": "if heavy then 0.8 else 0.5" }
//!     }
//! }
//! ```
//!
//! Loading is best-effort: a bad alias or rule is logged and skipped, the
//! rest of the script still applies. Only unreadable files and malformed
//! JSON abort the whole script.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::core::error::Result;
use crate::engine::alias::SourceKind;
use crate::engine::ruleset::{CollisionPolicy, RuleSet};
use crate::host::SourceResolver;

/// Top-level script layout. Ordered maps keep alias declaration and rule
/// insertion deterministic across loads.
#[derive(Debug, Default, Deserialize)]
pub struct ScriptFile {
    #[serde(rename = "Aliases", default)]
    pub aliases: BTreeMap<String, AliasDef>,
    #[serde(rename = "Rules", default)]
    pub rules: RulesBlock,
}

#[derive(Debug, Default, Deserialize)]
pub struct RulesBlock {
    #[serde(rename = "Adders", default)]
    pub adders: BTreeMap<String, String>,
    #[serde(rename = "Setters", default)]
    pub setters: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct AliasDef {
    #[serde(rename = "EditorID")]
    pub editor_id: String,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Default", default)]
    pub default_value: f32,
}

/// Map a script `Type` string to a source-kind mask. Unknown strings fall
/// back to the open mask with a warning so typos degrade instead of failing.
fn source_mask(kind: Option<&str>) -> SourceKind {
    match kind {
        None => SourceKind::ANY,
        Some("actorValue") => SourceKind::ATTRIBUTE,
        Some("wornKeyword") => SourceKind::WORN_KEYWORD,
        Some("visibleWornKeyword") => SourceKind::VISIBLE_WORN_KEYWORD,
        Some("npcKeyword") => SourceKind::ENTITY_KEYWORD,
        Some("morph") => SourceKind::RULE_OUTPUT,
        Some("headpart") => SourceKind::BODY_PART,
        Some(other) => {
            warn!(kind = other, "Unknown alias type, treating as unrestricted");
            SourceKind::ANY
        }
    }
}

impl ScriptFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl RuleSet {
    /// Load one parsed script. Returns true when every alias and rule was
    /// accepted.
    pub fn load_script(
        &mut self,
        script: &ScriptFile,
        clear_existing: bool,
        policy: CollisionPolicy,
        resolver: &dyn SourceResolver,
    ) -> bool {
        if clear_existing {
            self.clear();
        }

        let mut ok = true;

        for (symbol, def) in &script.aliases {
            let mask = source_mask(def.kind.as_deref());
            if let Err(e) =
                self.declare_alias(symbol, &def.editor_id, mask, def.default_value, resolver)
            {
                error!(symbol, error = %e, "Skipping alias");
                ok = false;
            }
        }

        // Adders load before setters, so a script carrying both for one
        // target ends with the setter in charge
        for (target, expr) in &script.rules.adders {
            if let Err(e) = self.add_rule(target, expr, false, policy) {
                error!(target, error = %e, "Skipping adder rule");
                ok = false;
            }
        }
        for (target, expr) in &script.rules.setters {
            if let Err(e) = self.add_rule(target, expr, true, policy) {
                error!(target, error = %e, "Skipping setter rule");
                ok = false;
            }
        }

        ok
    }

    /// Read, parse and load a script file. I/O and JSON failures abort the
    /// file; per-item failures are logged and skipped.
    pub fn load_script_file(
        &mut self,
        path: &Path,
        clear_existing: bool,
        policy: CollisionPolicy,
        resolver: &dyn SourceResolver,
    ) -> Result<bool> {
        debug!(path = %path.display(), clear_existing, "Loading rule script");
        let text = std::fs::read_to_string(path)?;
        let script = ScriptFile::parse(&text)?;
        Ok(self.load_script(&script, clear_existing, policy, resolver))
    }
}
