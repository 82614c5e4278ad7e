//! Shared mock host for integration tests

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use ahash::{AHashMap, AHashSet};
use morphrules::core::types::{
    AttributeId, BodyPartId, ClassKey, KeywordId, RaceId, Sex, VisibleLayer,
};
use morphrules::host::{Character, SourceResolver};

/// Route engine logs through the test harness; RUST_LOG controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Resolver over fixed name lists; ids are list positions
#[derive(Default)]
pub struct TestResolver {
    pub attributes: Vec<String>,
    pub keywords: Vec<String>,
    pub body_parts: Vec<String>,
    pub races: Vec<String>,
}

impl TestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_races(races: &[&str]) -> Self {
        Self {
            races: races.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn keyword(mut self, name: &str) -> Self {
        self.keywords.push(name.to_string());
        self
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.attributes.push(name.to_string());
        self
    }

    pub fn body_part(mut self, name: &str) -> Self {
        self.body_parts.push(name.to_string());
        self
    }
}

impl SourceResolver for TestResolver {
    fn resolve_attribute(&self, editor_id: &str) -> Option<AttributeId> {
        self.attributes
            .iter()
            .position(|a| a == editor_id)
            .map(|i| AttributeId(i as u32))
    }

    fn resolve_keyword(&self, editor_id: &str) -> Option<KeywordId> {
        self.keywords
            .iter()
            .position(|k| k == editor_id)
            .map(|i| KeywordId(i as u32))
    }

    fn resolve_body_part(&self, editor_id: &str) -> Option<BodyPartId> {
        self.body_parts
            .iter()
            .position(|p| p == editor_id)
            .map(|i| BodyPartId(i as u32))
    }

    fn resolve_race(&self, name: &str) -> Option<RaceId> {
        self.races
            .iter()
            .position(|r| r == name)
            .map(|i| RaceId(i as u32))
    }
}

/// Mutable character fixture
pub struct TestCharacter {
    pub key: ClassKey,
    pub suited: bool,
    pub attributes: AHashMap<u32, f32>,
    pub worn_apparel: AHashSet<u32>,
    pub worn_suit: AHashSet<u32>,
    pub entity_keywords: AHashSet<u32>,
    pub body_parts: AHashSet<u32>,
    pub morphs: AHashMap<String, f32>,
}

impl TestCharacter {
    pub fn new(race: RaceId, sex: Sex) -> Self {
        Self {
            key: ClassKey::new(race, sex),
            suited: false,
            attributes: AHashMap::new(),
            worn_apparel: AHashSet::new(),
            worn_suit: AHashSet::new(),
            entity_keywords: AHashSet::new(),
            body_parts: AHashSet::new(),
            morphs: AHashMap::new(),
        }
    }
}

impl Character for TestCharacter {
    fn class_key(&self) -> ClassKey {
        self.key
    }

    fn suited(&self) -> bool {
        self.suited
    }

    fn attribute(&self, id: AttributeId) -> f32 {
        self.attributes.get(&id.0).copied().unwrap_or(0.0)
    }

    fn has_worn_keyword(&self, id: KeywordId, layer: VisibleLayer) -> bool {
        (layer.contains(VisibleLayer::APPAREL) && self.worn_apparel.contains(&id.0))
            || (layer.contains(VisibleLayer::SUIT) && self.worn_suit.contains(&id.0))
    }

    fn has_entity_keyword(&self, id: KeywordId) -> bool {
        self.entity_keywords.contains(&id.0)
    }

    fn has_body_part(&self, id: BodyPartId) -> bool {
        self.body_parts.contains(&id.0)
    }

    fn morph_value(&self, name: &str) -> f32 {
        self.morphs.get(name).copied().unwrap_or(0.0)
    }
}
