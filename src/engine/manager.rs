//! Rule-set registry keyed by character class, plus directory loading.
//!
//! On-disk layout, rooted at the data directory passed to
//! [`RuleSetManager::load_all`]:
//!
//! ```text
//! <root>/
//!     HumanRace/
//!         race_master.json        (optional, loads into both sexes)
//!         male/
//!             master.json         (required per sex dir)
//!             10_overlay.json     (extras, loaded alphabetically)
//!         female/
//!             master.json
//!     VulpineRace/
//!         ...
//! ```
//!
//! Directory and file-name matching is case-insensitive; extras within one
//! sex directory load in lexicographic order so the result is independent of
//! filesystem enumeration order.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use ahash::AHashMap;
use tracing::{error, info, warn};

use crate::core::types::{ClassKey, RaceId, ResultTable, Sex};
use crate::engine::ruleset::{CollisionPolicy, RuleSet};
use crate::host::{Character, SourceResolver};

const RACE_MASTER_FILE: &str = "race_master.json";
const SEX_MASTER_FILE: &str = "master.json";

/// Shared, lockable handle to one class's rule set
pub type SharedRuleSet = Arc<Mutex<RuleSet>>;

/// Owns every loaded rule set, one per (race, sex) class.
///
/// Lookups take a read lock on the registry; per-set work happens under the
/// individual set's mutex so evaluation for different classes runs in
/// parallel.
#[derive(Default)]
pub struct RuleSetManager {
    sets: RwLock<AHashMap<ClassKey, SharedRuleSet>>,
}

impl RuleSetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ClassKey) -> Option<SharedRuleSet> {
        self.sets.read().unwrap().get(&key).cloned()
    }

    /// Fetch the rule set for `key`, creating an empty one when absent.
    /// The boolean is true when this call created the instance.
    pub fn get_or_create(&self, key: ClassKey) -> (SharedRuleSet, bool) {
        if let Some(existing) = self.get(key) {
            return (existing, false);
        }
        let mut sets = self.sets.write().unwrap();
        // Another thread may have won the race between the read and write lock
        match sets.get(&key) {
            Some(existing) => (Arc::clone(existing), false),
            None => {
                let created = Arc::new(Mutex::new(RuleSet::new()));
                sets.insert(key, Arc::clone(&created));
                (created, true)
            }
        }
    }

    pub fn clear_all(&self) {
        self.sets.write().unwrap().clear();
    }

    /// Snapshot the character and evaluate its class's rules in one step.
    /// None when no rule set is loaded for the class.
    pub fn evaluate_for(&self, character: &dyn Character) -> Option<ResultTable> {
        let shared = self.get(character.class_key())?;
        let mut rs = shared.lock().unwrap();
        if !rs.is_loaded() {
            return None;
        }
        rs.snapshot(character);
        let mut out = ResultTable::default();
        rs.evaluate(&mut out);
        Some(out)
    }

    /// Drop everything and reload the whole rule tree from `root`.
    ///
    /// Each immediate subdirectory names a race; unresolvable names are
    /// skipped with a warning. Per race: an optional race master loads into
    /// both sexes first (clearing them), then each sex directory overlays
    /// its own master and extras.
    pub fn load_all(&self, root: &Path, resolver: &dyn SourceResolver) {
        self.clear_all();
        info!(root = %root.display(), "Loading morph rule tree");

        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                error!(root = %root.display(), error = %e, "Cannot read rule tree root");
                return;
            }
        };

        for entry in entries.flatten() {
            let race_dir = entry.path();
            if !race_dir.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            let race = match resolver.resolve_race(&dir_name) {
                Some(race) => race,
                None => {
                    warn!(directory = dir_name, "Directory does not name a race, skipping");
                    continue;
                }
            };
            self.load_race_dir(&race_dir, race, resolver);
        }

        // Surface classes that ended up with a created-but-empty rule set
        for (key, shared) in self.sets.read().unwrap().iter() {
            if !shared.lock().unwrap().is_loaded() {
                warn!(?key, "Rule set instance exists but nothing loaded into it");
            }
        }
    }

    fn load_race_dir(&self, race_dir: &Path, race: RaceId, resolver: &dyn SourceResolver) {
        if let Some(race_master) = find_entry_ci(race_dir, RACE_MASTER_FILE, false) {
            for sex in [Sex::Male, Sex::Female] {
                let (shared, _) = self.get_or_create(ClassKey::new(race, sex));
                let mut rs = shared.lock().unwrap();
                if let Err(e) =
                    rs.load_script_file(&race_master, true, CollisionPolicy::Append, resolver)
                {
                    error!(path = %race_master.display(), error = %e, "Failed to load race master");
                }
            }
        }

        let mut any_sex_dir = false;
        for (sex, dir_name) in [(Sex::Male, "male"), (Sex::Female, "female")] {
            if let Some(sex_dir) = find_entry_ci(race_dir, dir_name, true) {
                any_sex_dir = true;
                self.load_sex_dir(&sex_dir, ClassKey::new(race, sex), resolver);
            }
        }

        if !any_sex_dir {
            warn!(directory = %race_dir.display(), "Race directory has no male/ or female/ subdirectory");
        }
    }

    /// Load one sex directory: master.json first, remaining scripts
    /// alphabetically as appending overlays.
    fn load_sex_dir(&self, sex_dir: &Path, key: ClassKey, resolver: &dyn SourceResolver) {
        let master = match find_entry_ci(sex_dir, SEX_MASTER_FILE, false) {
            Some(master) => master,
            None => {
                error!(directory = %sex_dir.display(), "Missing master.json, directory skipped");
                return;
            }
        };

        let (shared, is_new) = self.get_or_create(key);
        let mut rs = shared.lock().unwrap();

        // A race master may already have populated this instance; only a
        // freshly created one starts from scratch
        if let Err(e) = rs.load_script_file(&master, is_new, CollisionPolicy::Append, resolver) {
            error!(path = %master.display(), error = %e, "Failed to load sex master");
        }

        for path in sorted_extra_scripts(sex_dir, &master) {
            if let Err(e) = rs.load_script_file(&path, false, CollisionPolicy::Append, resolver) {
                error!(path = %path.display(), error = %e, "Failed to load overlay script");
            }
        }
    }
}

/// Case-insensitive lookup of a direct child by name
fn find_entry_ci(dir: &Path, name: &str, want_dir: bool) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            let path = entry.path();
            if path.is_dir() == want_dir {
                return Some(path);
            }
        }
    }
    None
}

/// Every .json in `dir` except `master`, lexicographically by file name
fn sorted_extra_scripts(dir: &Path, master: &Path) -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p != master
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    scripts.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    scripts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AttributeId, BodyPartId, KeywordId};

    struct NullResolver;

    impl SourceResolver for NullResolver {
        fn resolve_attribute(&self, _editor_id: &str) -> Option<AttributeId> {
            None
        }

        fn resolve_keyword(&self, _editor_id: &str) -> Option<KeywordId> {
            None
        }

        fn resolve_body_part(&self, _editor_id: &str) -> Option<BodyPartId> {
            None
        }

        fn resolve_race(&self, name: &str) -> Option<RaceId> {
            match name {
                "HumanRace" => Some(RaceId(1)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_get_or_create_reuses_instance() {
        let manager = RuleSetManager::new();
        let key = ClassKey::new(RaceId(1), Sex::Female);

        let (first, created) = manager.get_or_create(key);
        assert!(created);
        let (second, created_again) = manager.get_or_create(key);
        assert!(!created_again);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let manager = RuleSetManager::new();
        assert!(manager.get(ClassKey::new(RaceId(9), Sex::Male)).is_none());
    }

    #[test]
    fn test_clear_all_drops_instances() {
        let manager = RuleSetManager::new();
        let key = ClassKey::new(RaceId(1), Sex::Male);
        manager.get_or_create(key);
        manager.clear_all();
        assert!(manager.get(key).is_none());
    }

    #[test]
    fn test_load_all_missing_root_is_harmless() {
        let manager = RuleSetManager::new();
        manager.load_all(Path::new("/definitely/not/here"), &NullResolver);
        assert!(manager
            .get(ClassKey::new(RaceId(1), Sex::Male))
            .is_none());
    }
}
