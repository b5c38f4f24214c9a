//! Text id ranges.
//!
//! Script rows and native scripts refer to texts by signed id; the range an id falls in
//! tells which text table owns it.

use serde::{Deserialize, Serialize};

pub const MIN_DB_SCRIPT_STRING_ID: i32 = 2_000_000_000;
pub const MAX_DB_SCRIPT_STRING_ID: i32 = 2_000_010_000;

/// Size of each negative text block.
pub const TEXT_SOURCE_RANGE: i32 = -1_000_000;

/// Table a text id belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextSource {
    /// `db_script_string`, used by database scripts.
    DbScriptString,
    /// `script_texts`, used by native scripts.
    ScriptText,
    /// `custom_texts`
    Custom,
    /// `gossip_texts`
    Gossip,
}

impl TextSource {
    /// Classify a text id; `None` for 0 and ids outside every range.
    pub fn from_id(id: i32) -> Option<TextSource> {
        const TEXT_START: i32 = TEXT_SOURCE_RANGE;
        const CUSTOM_START: i32 = TEXT_SOURCE_RANGE * 2;
        const GOSSIP_START: i32 = TEXT_SOURCE_RANGE * 3;
        const GOSSIP_END: i32 = TEXT_SOURCE_RANGE * 4 + 1;

        match id {
            MIN_DB_SCRIPT_STRING_ID..=MAX_DB_SCRIPT_STRING_ID => Some(TextSource::DbScriptString),
            i if i <= TEXT_START && i > CUSTOM_START => Some(TextSource::ScriptText),
            i if i <= CUSTOM_START && i > GOSSIP_START => Some(TextSource::Custom),
            i if i <= GOSSIP_START && i >= GOSSIP_END => Some(TextSource::Gossip),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_block_boundaries() {
        assert_eq!(TextSource::from_id(2_000_000_000), Some(TextSource::DbScriptString));
        assert_eq!(TextSource::from_id(2_000_010_000), Some(TextSource::DbScriptString));
        assert_eq!(TextSource::from_id(2_000_010_001), None);
        assert_eq!(TextSource::from_id(-1_000_000), Some(TextSource::ScriptText));
        assert_eq!(TextSource::from_id(-1_999_999), Some(TextSource::ScriptText));
        assert_eq!(TextSource::from_id(-2_000_000), Some(TextSource::Custom));
        assert_eq!(TextSource::from_id(-3_000_000), Some(TextSource::Gossip));
        assert_eq!(TextSource::from_id(-3_999_999), Some(TextSource::Gossip));
        assert_eq!(TextSource::from_id(-4_000_000), None);
    }

    #[test]
    fn zero_and_small_ids_are_unclassified() {
        assert_eq!(TextSource::from_id(0), None);
        assert_eq!(TextSource::from_id(42), None);
        assert_eq!(TextSource::from_id(-999_999), None);
    }
}
