//! Seams toward the host simulation.
//!
//! The engine never touches game data directly: editor ids are resolved once
//! at load time through [`SourceResolver`], per-character state is read at
//! snapshot time through [`Character`], and evaluated results are handed to
//! a [`MorphSession`] for application.

use crate::core::types::{
    AttributeId, BodyPartId, ClassKey, KeywordId, ResultTable, VisibleLayer,
};

/// Resolves script-side editor ids to host handles at load time
pub trait SourceResolver {
    fn resolve_attribute(&self, editor_id: &str) -> Option<AttributeId>;
    fn resolve_keyword(&self, editor_id: &str) -> Option<KeywordId>;
    fn resolve_body_part(&self, editor_id: &str) -> Option<BodyPartId>;
    /// Resolve a rule-set directory name to a race
    fn resolve_race(&self, name: &str) -> Option<crate::core::types::RaceId>;
}

/// Observable state of one simulated character.
///
/// Keyword and body-part queries are presence checks; the snapshot maps them
/// to 1.0/0.0.
pub trait Character {
    fn class_key(&self) -> ClassKey;

    /// Whether the suit layer is the one currently shown
    fn suited(&self) -> bool;

    fn attribute(&self, id: AttributeId) -> f32;

    /// Is any equipped item on `layer` carrying this keyword?
    fn has_worn_keyword(&self, id: KeywordId, layer: VisibleLayer) -> bool;

    fn has_entity_keyword(&self, id: KeywordId) -> bool;

    fn has_body_part(&self, id: BodyPartId) -> bool;

    /// Current value of a named morph on the character. Rule-output aliases
    /// read previously applied results through this.
    fn morph_value(&self, name: &str) -> f32;
}

/// Application side of the pipeline: buffers morph commits and pushes them
/// to the presentation layer with diffing
pub trait MorphSession {
    /// Reset the working state to the character's unmodified morphs
    fn restore(&mut self);

    /// Overwrite a morph with an absolute value
    fn commit_absolute(&mut self, name: &str, value: f32);

    /// Add a delta on top of the current morph value
    fn commit_relative(&mut self, name: &str, delta: f32);

    /// Apply buffered commits whose change exceeds `threshold`; returns the
    /// largest magnitude of change seen
    fn push(&mut self, threshold: f32) -> f32;
}

/// Feed an evaluation result table into a session: setters commit absolute
/// values, adders commit deltas. Returns true when the push changed the
/// character by more than `threshold`.
pub fn apply_results(
    session: &mut dyn MorphSession,
    results: &ResultTable,
    threshold: f32,
) -> bool {
    session.restore();
    for (name, result) in results {
        if result.is_setter {
            session.commit_absolute(name, result.value);
        } else {
            session.commit_relative(name, result.value);
        }
    }
    session.push(threshold) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MorphResult;
    use ahash::AHashMap;

    #[derive(Default)]
    struct RecordingSession {
        restored: bool,
        absolute: AHashMap<String, f32>,
        relative: AHashMap<String, f32>,
        pushed_magnitude: f32,
    }

    impl MorphSession for RecordingSession {
        fn restore(&mut self) {
            self.restored = true;
            self.absolute.clear();
            self.relative.clear();
        }

        fn commit_absolute(&mut self, name: &str, value: f32) {
            self.absolute.insert(name.to_string(), value);
        }

        fn commit_relative(&mut self, name: &str, delta: f32) {
            self.relative.insert(name.to_string(), delta);
        }

        fn push(&mut self, _threshold: f32) -> f32 {
            self.pushed_magnitude = self
                .absolute
                .values()
                .chain(self.relative.values())
                .map(|v| v.abs())
                .fold(0.0, f32::max);
            self.pushed_magnitude
        }
    }

    #[test]
    fn test_apply_results_routes_setters_and_adders() {
        let mut results = ResultTable::default();
        results.insert(
            "scale".to_string(),
            MorphResult {
                is_setter: false,
                value: 0.4,
            },
        );
        results.insert(
            "jaw".to_string(),
            MorphResult {
                is_setter: true,
                value: 0.9,
            },
        );

        let mut session = RecordingSession::default();
        let changed = apply_results(&mut session, &results, 0.05);

        assert!(session.restored);
        assert_eq!(session.absolute.get("jaw"), Some(&0.9));
        assert_eq!(session.relative.get("scale"), Some(&0.4));
        assert!(changed);
    }

    #[test]
    fn test_apply_results_below_threshold() {
        let mut results = ResultTable::default();
        results.insert(
            "scale".to_string(),
            MorphResult {
                is_setter: false,
                value: 0.01,
            },
        );

        let mut session = RecordingSession::default();
        assert!(!apply_results(&mut session, &results, 0.05));
    }
}
