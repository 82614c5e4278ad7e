//! Alias bindings from expression symbols to value sources.

use std::fmt;

use bitflags::bitflags;

use crate::core::types::VisibleLayer;
use crate::host::Character;

bitflags! {
    /// Kinds of value sources an alias can bind to.
    ///
    /// Used both as the resolved kind of one alias (a single bit) and as the
    /// mask of kinds a declaration is allowed to resolve against. `ANY`
    /// deliberately excludes `BODY_PART`: body-part aliases must be declared
    /// with an explicit type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceKind: u8 {
        const ATTRIBUTE = 1 << 0;
        const WORN_KEYWORD = 1 << 1;
        const VISIBLE_WORN_KEYWORD = 1 << 2;
        const ENTITY_KEYWORD = 1 << 3;
        const RULE_OUTPUT = 1 << 4;
        const BODY_PART = 1 << 5;

        const EQUIPMENT_KEYWORD = Self::WORN_KEYWORD.bits() | Self::VISIBLE_WORN_KEYWORD.bits();
        const KEYWORD = Self::EQUIPMENT_KEYWORD.bits() | Self::ENTITY_KEYWORD.bits();
        const ANY = Self::ATTRIBUTE.bits()
            | Self::WORN_KEYWORD.bits()
            | Self::VISIBLE_WORN_KEYWORD.bits()
            | Self::ENTITY_KEYWORD.bits()
            | Self::RULE_OUTPUT.bits();
    }
}

/// Reads one alias's value off a character during snapshot
pub type AcquireFn = Box<dyn Fn(&dyn Character, VisibleLayer) -> f32 + Send + Sync>;

/// A named binding from an expression symbol to one acquisition source.
///
/// Immutable once the owning rule set is built; synonyms collapsed onto this
/// alias share its value slot.
pub struct Alias {
    pub symbol: String,
    pub source_id: String,
    pub kind: SourceKind,
    pub slot: usize,
    pub equivalent_symbols: Vec<String>,
    acquire: AcquireFn,
}

impl Alias {
    pub fn new(
        symbol: impl Into<String>,
        source_id: impl Into<String>,
        kind: SourceKind,
        slot: usize,
        acquire: AcquireFn,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            source_id: source_id.into(),
            kind,
            slot,
            equivalent_symbols: Vec::new(),
            acquire,
        }
    }

    /// Does this alias bind the same underlying source, for any of the
    /// requested kinds?
    pub fn is_same_reference(&self, source_id: &str, mask: SourceKind) -> bool {
        self.kind.intersects(mask) && self.source_id == source_id
    }

    pub fn acquire(&self, character: &dyn Character, layer: VisibleLayer) -> f32 {
        (self.acquire)(character, layer)
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias")
            .field("symbol", &self.symbol)
            .field("source_id", &self.source_id)
            .field("kind", &self.kind)
            .field("slot", &self.slot)
            .field("equivalent_symbols", &self.equivalent_symbols)
            .finish()
    }
}
