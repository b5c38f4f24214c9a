//! Script texts and the generic text output helper.

use std::collections::{BTreeSet, HashMap};

use log::{error, info, warn};
use thiserror::Error;

use dbscript_data::{ChatType, ScriptTextRow, TextSource};

use crate::guid::ObjectGuid;
use crate::world::{EffectError, World, WorldEffect};

/// Text plus the presentation data stored with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub content: String,
    pub sound: u32,
    pub chat_type: ChatType,
    pub language: u32,
    pub emote: u32,
}

/// Loaded text table, keyed by signed text id.
#[derive(Debug, Clone, Default)]
pub struct ScriptTexts {
    entries: HashMap<i32, TextEntry>,
}

impl ScriptTexts {
    /// Build the table from persisted rows, skipping (and logging) unusable ones.
    pub fn from_rows(rows: impl IntoIterator<Item = ScriptTextRow>) -> Self {
        let mut entries = HashMap::new();
        for row in rows {
            if TextSource::from_id(row.entry).is_none() {
                error!("text entry {} is outside every text range, skipped", row.entry);
                continue;
            }
            let Some(chat_type) = ChatType::from_raw(u32::from(row.chat_type)) else {
                error!("text entry {} has unknown chat type {}, skipped", row.entry, row.chat_type);
                continue;
            };
            if entries.contains_key(&row.entry) {
                warn!("text entry {} defined more than once, keeping the first", row.entry);
                continue;
            }
            entries.insert(
                row.entry,
                TextEntry {
                    content: row.content,
                    sound: row.sound,
                    chat_type,
                    language: row.language,
                    emote: row.emote,
                },
            );
        }
        info!("{} script texts loaded", entries.len());
        Self { entries }
    }

    pub fn get(&self, id: i32) -> Option<&TextEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ids in `ids` that have no loaded text.
    pub fn missing_ids(&self, ids: impl IntoIterator<Item = i32>) -> BTreeSet<i32> {
        ids.into_iter().filter(|id| !self.contains(*id)).collect()
    }
}

/// Why a text could not be output.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("text id {0} is outside every text range")]
    OutOfRange(i32),
    #[error("text entry {0} not found")]
    Missing(i32),
    #[error("text entry {0} is a whisper but has no player target")]
    NeedsPlayerTarget(i32),
    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Speak text `entry` as `source`, with the text's own sound, emote, chat type and language.
///
/// # Errors
/// - when the id is unknown, a whisper has no player target, or the world refuses an effect
pub fn do_script_text(
    texts: &ScriptTexts,
    entry: i32,
    source: ObjectGuid,
    target: Option<ObjectGuid>,
    world: &mut dyn World,
) -> Result<(), TextError> {
    if TextSource::from_id(entry).is_none() {
        return Err(TextError::OutOfRange(entry));
    }
    let text = texts.get(entry).ok_or(TextError::Missing(entry))?;
    if text.chat_type.needs_player_target() && !target.is_some_and(|t| t.kind.is_player()) {
        return Err(TextError::NeedsPlayerTarget(entry));
    }

    if text.sound != 0 {
        world.apply(WorldEffect::PlaySound {
            source,
            sound_id: text.sound,
            listener: None,
            distance_dependent: false,
        })?;
    }
    if text.emote != 0 && source.is_unit() {
        world.apply(WorldEffect::Emote {
            entity: source,
            emote_id: text.emote,
        })?;
    }
    world.apply(WorldEffect::Say {
        speaker: source,
        target,
        text_id: entry,
        chat_type: text.chat_type,
        language: text.language,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::EntityKind;
    use crate::sim::SimWorld;
    use dbscript_data::Position;

    fn row(entry: i32, chat_type: u8, sound: u32, emote: u32) -> ScriptTextRow {
        ScriptTextRow {
            entry,
            content: format!("text {entry}"),
            sound,
            chat_type,
            language: 0,
            emote,
        }
    }

    #[test]
    fn rows_outside_ranges_or_with_bad_chat_type_are_skipped() {
        let texts = ScriptTexts::from_rows(vec![
            row(2_000_000_001, 0, 0, 0),
            row(-1_000_010, 1, 0, 0),
            row(17, 0, 0, 0),
            row(2_000_000_002, 42, 0, 0),
        ]);
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(-1_000_010));
        assert_eq!(
            texts.missing_ids([2_000_000_001, 2_000_000_002]),
            BTreeSet::from([2_000_000_002])
        );
    }

    #[test]
    fn do_script_text_plays_sound_emote_and_speech() {
        let texts = ScriptTexts::from_rows(vec![row(-1_000_001, 1, 8_000, 5)]);
        let mut world = SimWorld::new();
        let npc = world.spawn(EntityKind::Creature, 10, Position::default());
        do_script_text(&texts, -1_000_001, npc, None, &mut world).unwrap();
        let effects = world.take_effects();
        assert_eq!(effects.len(), 3);
        assert!(matches!(effects[0], WorldEffect::PlaySound { sound_id: 8_000, .. }));
        assert!(matches!(effects[1], WorldEffect::Emote { emote_id: 5, .. }));
        assert!(matches!(
            effects[2],
            WorldEffect::Say {
                chat_type: ChatType::Yell,
                ..
            }
        ));
    }

    #[test]
    fn whispers_need_a_player() {
        let texts = ScriptTexts::from_rows(vec![row(-1_000_002, 4, 0, 0)]);
        let mut world = SimWorld::new();
        let npc = world.spawn(EntityKind::Creature, 10, Position::default());
        let err = do_script_text(&texts, -1_000_002, npc, None, &mut world).unwrap_err();
        assert!(matches!(err, TextError::NeedsPlayerTarget(-1_000_002)));
        assert!(matches!(
            do_script_text(&texts, -1_000_003, npc, None, &mut world),
            Err(TextError::Missing(_))
        ));
    }
}
