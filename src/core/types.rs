//! Core type definitions used throughout the codebase

use ahash::AHashMap;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Opaque race handle, resolved once from an editor id by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RaceId(pub u32);

/// Opaque handle for a base attribute (actor value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(pub u32);

/// Opaque handle for an equipment or entity keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeywordId(pub u32);

/// Opaque handle for a selectable body part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyPartId(pub u32);

/// Character sex, the second half of a rule-set class key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Selects which rule-set instance governs a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassKey {
    pub race: RaceId,
    pub sex: Sex,
}

impl ClassKey {
    pub fn new(race: RaceId, sex: Sex) -> Self {
        Self { race, sex }
    }
}

bitflags! {
    /// Which layer of worn equipment is currently visible on a character.
    ///
    /// Visible-worn-keyword aliases only see equipment on the active layer;
    /// plain worn-keyword aliases always query `ANY`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VisibleLayer: u8 {
        const APPAREL = 1 << 0;
        const SUIT = 1 << 1;
        const ANY = Self::APPAREL.bits() | Self::SUIT.bits();
    }
}

/// One evaluated contribution for a target morph parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphResult {
    pub is_setter: bool,
    pub value: f32,
}

/// Morph name -> evaluated result, produced fresh by every evaluate call
pub type ResultTable = AHashMap<String, MorphResult>;
