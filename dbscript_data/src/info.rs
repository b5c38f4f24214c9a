//! Decoded script commands.
//!
//! [`ScriptInfo`] is the typed form of a [`ScriptRow`]. The command payload is a sum type,
//! so reading parameters that belong to another command is impossible; everything that
//! depends only on the tag is answered by the command table.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::command::{BuddyKind, CommandId, CommandSpec, DataFlags};
use crate::defs::{MAX_TEXT_ID, Position, ScriptRow, VISIBLE_RANGE};
use crate::text::TextSource;
use crate::validate::{ValidationError, check_buddy};

/// Chat types usable by `TALK`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatType {
    Say = 0,
    Yell = 1,
    TextEmote = 2,
    BossEmote = 3,
    Whisper = 4,
    BossWhisper = 5,
    ZoneYell = 6,
    ZoneEmote = 7,
}

impl ChatType {
    pub fn from_raw(raw: u32) -> Option<ChatType> {
        Some(match raw {
            0 => ChatType::Say,
            1 => ChatType::Yell,
            2 => ChatType::TextEmote,
            3 => ChatType::BossEmote,
            4 => ChatType::Whisper,
            5 => ChatType::BossWhisper,
            6 => ChatType::ZoneYell,
            7 => ChatType::ZoneEmote,
            _ => return None,
        })
    }

    /// Whispers need a player to whisper to.
    pub fn needs_player_target(self) -> bool {
        matches!(self, ChatType::Whisper | ChatType::BossWhisper)
    }
}

/// Movement generator requested by `MOVEMENT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    Idle = 0,
    Random = 1,
    Waypoint = 2,
}

/// Caster and target roles for `CAST_SPELL` (low two bits of `datalong2`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastDirection {
    SourceToTarget = 0,
    SourceToSource = 1,
    TargetToTarget = 2,
    TargetToSource = 3,
}

/// How `MODIFY_NPC_FLAGS` combines its mask with the current flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcFlagOp {
    Toggle = 0,
    Add = 1,
    Remove = 2,
}

/// Faction side for `UPDATE_TEMPLATE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Alliance = 0,
    Horde = 1,
}

bitflags! {
    /// `GO_LOCK_STATE` operations.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GoLockFlags: u32 {
        const LOCK = 0x01;
        const UNLOCK = 0x02;
        const NOT_INTERACTABLE = 0x04;
        const INTERACTABLE = 0x08;
    }
}

/// Number of unit stand states.
pub const MAX_UNIT_STAND_STATE: u32 = 10;

/// Last AI event type usable from scripts, exclusive.
pub const MAXIMAL_AI_EVENT_EVENTAI: u32 = 8;

/// Custom AI event types reserved for native scripts.
pub const AI_EVENT_CUSTOM_RANGE: std::ops::RangeInclusive<u32> = 100..=105;

/// Typed command payload; one variant per command tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Talk {
        chat_type: ChatType,
        language: u32,
        text_ids: [i32; MAX_TEXT_ID],
    },
    Emote {
        emote_id: u32,
    },
    FieldSet {
        field: u32,
        value: u32,
    },
    /// Destination comes from the row position, or the target with the additional flag.
    MoveTo {
        travel_time: u32,
    },
    FlagSet {
        field: u32,
        mask: u32,
    },
    FlagRemove {
        field: u32,
        mask: u32,
    },
    TeleportTo {
        map_id: u32,
    },
    QuestExplored {
        quest_id: u32,
        distance: u32,
    },
    KillCredit {
        creature_entry: u32,
        group_credit: bool,
    },
    RespawnGameObject {
        db_guid: u32,
        despawn_delay: i32,
    },
    TempSummonCreature {
        creature_entry: u32,
        despawn_delay: u32,
        unique_limit: u32,
        unique_distance: u32,
    },
    OpenDoor {
        db_guid: u32,
        reset_delay: i32,
    },
    CloseDoor {
        db_guid: u32,
        reset_delay: i32,
    },
    ActivateObject,
    RemoveAura {
        spell_id: u32,
        from_source: bool,
    },
    CastSpell {
        spell_id: u32,
        direction: CastDirection,
        triggered: bool,
    },
    PlaySound {
        sound_id: u32,
        target_only: bool,
        distance_dependent: bool,
    },
    CreateItem {
        item_entry: u32,
        amount: u32,
    },
    DespawnSelf {
        despawn_delay: u32,
    },
    PlayMovie {
        movie_id: u32,
    },
    Movement {
        movement_type: MovementType,
    },
    SetActiveObject {
        active: bool,
    },
    /// Faction 0 restores the template faction.
    SetFaction {
        faction_id: u32,
    },
    /// 0 demorphs; the additional flag reads the value as a display id.
    MorphToEntryOrModel {
        entry_or_model: u32,
    },
    /// 0 dismounts; the additional flag reads the value as a display id.
    MountToEntryOrModel {
        entry_or_model: u32,
    },
    SetRun {
        run: bool,
    },
    AttackStart,
    GoLockState {
        lock_state: GoLockFlags,
    },
    StandState {
        stand_state: u32,
    },
    ModifyNpcFlags {
        flags: u32,
        op: NpcFlagOp,
    },
    SendTaxiPath {
        path_id: u32,
    },
    /// `npc_entry` 0 terminates unconditionally.
    TerminateScript {
        npc_entry: u32,
        search_distance: u32,
        waypoint_wait_diff: i32,
    },
    PauseWaypoints {
        pause: bool,
    },
    Reserved1,
    TerminateCond {
        condition_id: u32,
        fail_quest: u32,
    },
    SendAiEvent {
        event_type: u32,
        radius: u32,
    },
    SetFacing {
        reset: bool,
    },
    MoveDynamic {
        max_dist: u32,
        min_dist: u32,
    },
    SendMail {
        template_id: u32,
        alt_sender: u32,
        delay_secs: i32,
    },
    SetFly {
        fly: bool,
    },
    DespawnGameObject,
    Respawn,
    SetEquipmentSlots {
        reset_default: bool,
        slots: [i32; 3],
    },
    ResetGameObject,
    UpdateTemplate {
        entry: u32,
        team: Team,
    },
}

impl ScriptCommand {
    /// Tag of this payload.
    pub fn id(&self) -> CommandId {
        use ScriptCommand::*;
        match self {
            Talk { .. } => CommandId::Talk,
            Emote { .. } => CommandId::Emote,
            FieldSet { .. } => CommandId::FieldSet,
            MoveTo { .. } => CommandId::MoveTo,
            FlagSet { .. } => CommandId::FlagSet,
            FlagRemove { .. } => CommandId::FlagRemove,
            TeleportTo { .. } => CommandId::TeleportTo,
            QuestExplored { .. } => CommandId::QuestExplored,
            KillCredit { .. } => CommandId::KillCredit,
            RespawnGameObject { .. } => CommandId::RespawnGameObject,
            TempSummonCreature { .. } => CommandId::TempSummonCreature,
            OpenDoor { .. } => CommandId::OpenDoor,
            CloseDoor { .. } => CommandId::CloseDoor,
            ActivateObject => CommandId::ActivateObject,
            RemoveAura { .. } => CommandId::RemoveAura,
            CastSpell { .. } => CommandId::CastSpell,
            PlaySound { .. } => CommandId::PlaySound,
            CreateItem { .. } => CommandId::CreateItem,
            DespawnSelf { .. } => CommandId::DespawnSelf,
            PlayMovie { .. } => CommandId::PlayMovie,
            Movement { .. } => CommandId::Movement,
            SetActiveObject { .. } => CommandId::SetActiveObject,
            SetFaction { .. } => CommandId::SetFaction,
            MorphToEntryOrModel { .. } => CommandId::MorphToEntryOrModel,
            MountToEntryOrModel { .. } => CommandId::MountToEntryOrModel,
            SetRun { .. } => CommandId::SetRun,
            AttackStart => CommandId::AttackStart,
            GoLockState { .. } => CommandId::GoLockState,
            StandState { .. } => CommandId::StandState,
            ModifyNpcFlags { .. } => CommandId::ModifyNpcFlags,
            SendTaxiPath { .. } => CommandId::SendTaxiPath,
            TerminateScript { .. } => CommandId::TerminateScript,
            PauseWaypoints { .. } => CommandId::PauseWaypoints,
            Reserved1 => CommandId::Reserved1,
            TerminateCond { .. } => CommandId::TerminateCond,
            SendAiEvent { .. } => CommandId::SendAiEvent,
            SetFacing { .. } => CommandId::SetFacing,
            MoveDynamic { .. } => CommandId::MoveDynamic,
            SendMail { .. } => CommandId::SendMail,
            SetFly { .. } => CommandId::SetFly,
            DespawnGameObject => CommandId::DespawnGameObject,
            Respawn => CommandId::Respawn,
            SetEquipmentSlots { .. } => CommandId::SetEquipmentSlots,
            ResetGameObject => CommandId::ResetGameObject,
            UpdateTemplate { .. } => CommandId::UpdateTemplate,
        }
    }

    /// Non-zero text ids of a `TALK` command; empty for every other command.
    pub fn text_ids(&self) -> Vec<i32> {
        match self {
            ScriptCommand::Talk { text_ids, .. } => text_ids.iter().copied().filter(|id| *id != 0).collect(),
            _ => Vec::new(),
        }
    }
}

/// Who a command acts on besides the trigger's own source and target.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuddyDescriptor {
    /// Template entry of the buddy; 0 when no buddy is used.
    pub entry: u32,
    /// Search radius, or a persisted db guid with `BUDDY_BY_GUID`.
    pub search_radius_or_guid: u32,
    pub kind: BuddyKind,
}

impl BuddyDescriptor {
    pub fn is_set(&self) -> bool {
        self.entry != 0
    }
}

/// Options affecting how rows are decoded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Largest accepted buddy search radius.
    pub max_search_radius: f32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_search_radius: VISIBLE_RANGE,
        }
    }
}

/// One decoded, validated script command.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInfo {
    /// Trigger key owning this command.
    pub id: u32,
    /// Milliseconds after the trigger fired.
    pub delay: u32,
    pub command: ScriptCommand,
    pub position: Position,
    pub buddy: BuddyDescriptor,
    pub flags: DataFlags,
}

impl ScriptInfo {
    /// Decode a row with default options.
    ///
    /// # Errors
    /// - when the row names an unknown or reserved command, carries undefined flags,
    ///   a malformed buddy descriptor, or values outside the command's domain
    pub fn from_row(row: &ScriptRow) -> Result<ScriptInfo, ValidationError> {
        Self::decode(row, &DecodeOptions::default())
    }

    /// Decode and validate a persisted row.
    ///
    /// # Errors
    /// - see [`ScriptInfo::from_row`]
    pub fn decode(row: &ScriptRow, opts: &DecodeOptions) -> Result<ScriptInfo, ValidationError> {
        let id = CommandId::from_raw(row.command).ok_or(ValidationError::UnknownCommand {
            id: row.id,
            command: row.command,
        })?;
        let spec = id.spec();
        if !spec.loadable {
            return Err(ValidationError::ReservedCommand { id: row.id, command: id });
        }
        let flags = DataFlags::from_bits(row.data_flags).ok_or(ValidationError::InvalidFlags {
            id: row.id,
            command: id,
            flags: row.data_flags,
        })?;
        if flags.contains(DataFlags::COMMAND_ADDITIONAL) && !spec.additional_flag {
            return Err(ValidationError::UnsupportedAdditionalFlag { id: row.id, command: id });
        }

        let buddy = check_buddy(row, spec, flags, opts)?;
        let position = Position::new(row.x, row.y, row.z, row.o);
        let command = decode_command(row, spec, flags, &position)?;

        Ok(ScriptInfo {
            id: row.id,
            delay: row.delay,
            command,
            position,
            buddy,
            flags,
        })
    }

    pub fn command_id(&self) -> CommandId {
        self.command.id()
    }

    pub fn spec(&self) -> &'static CommandSpec {
        self.command_id().spec()
    }

    pub fn is_creature_buddy(&self) -> bool {
        self.command_id().is_creature_buddy()
    }

    pub fn has_additional_script_flag(&self) -> bool {
        self.command_id().has_additional_script_flag()
    }

    pub fn has_flag(&self, flag: DataFlags) -> bool {
        self.flags.contains(flag)
    }

    /// `SCRIPT_FLAG_COMMAND_ADDITIONAL` is set (only possible where the command supports it).
    pub fn additional(&self) -> bool {
        self.flags.contains(DataFlags::COMMAND_ADDITIONAL)
    }

    /// Gameobject db guid referenced directly by the command, if any.
    pub fn go_guid(&self) -> Option<u32> {
        match self.command {
            ScriptCommand::RespawnGameObject { db_guid, .. }
            | ScriptCommand::OpenDoor { db_guid, .. }
            | ScriptCommand::CloseDoor { db_guid, .. } => Some(db_guid),
            _ => None,
        }
    }
}

fn invalid(row: &ScriptRow, spec: &CommandSpec, context: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        id: row.id,
        command: spec.id,
        context: context.into(),
    }
}

fn require_nonzero(row: &ScriptRow, spec: &CommandSpec, value: u32, what: &str) -> Result<u32, ValidationError> {
    if value == 0 {
        Err(invalid(row, spec, format!("{what} must not be 0")))
    } else {
        Ok(value)
    }
}

fn require_map_coord(row: &ScriptRow, spec: &CommandSpec, pos: &Position) -> Result<(), ValidationError> {
    if pos.is_valid_map_coord() {
        Ok(())
    } else {
        Err(invalid(
            row,
            spec,
            format!("invalid coordinates ({}, {}, {})", pos.x, pos.y, pos.z),
        ))
    }
}

#[allow(clippy::too_many_lines, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
fn decode_command(
    row: &ScriptRow,
    spec: &CommandSpec,
    flags: DataFlags,
    pos: &Position,
) -> Result<ScriptCommand, ValidationError> {
    use ScriptCommand as Cmd;
    let additional = flags.contains(DataFlags::COMMAND_ADDITIONAL);

    let command = match spec.id {
        CommandId::Talk => {
            let chat_type = ChatType::from_raw(row.datalong)
                .ok_or_else(|| invalid(row, spec, format!("unknown chat type {}", row.datalong)))?;
            let text_ids = [row.dataint, row.dataint2, row.dataint3, row.dataint4];
            if text_ids[0] == 0 {
                return Err(invalid(row, spec, "first text id (dataint) must be set"));
            }
            if let Some(bad) = text_ids.iter().find(|t| **t != 0 && TextSource::from_id(**t).is_none()) {
                return Err(invalid(row, spec, format!("text id {bad} is outside every text range")));
            }
            Cmd::Talk {
                chat_type,
                language: row.datalong4,
                text_ids,
            }
        },
        CommandId::Emote => Cmd::Emote {
            emote_id: require_nonzero(row, spec, row.datalong, "emote id")?,
        },
        CommandId::FieldSet => Cmd::FieldSet {
            field: row.datalong,
            value: row.datalong2,
        },
        CommandId::MoveTo => {
            if !additional {
                require_map_coord(row, spec, pos)?;
            }
            Cmd::MoveTo {
                travel_time: row.datalong2,
            }
        },
        CommandId::FlagSet => Cmd::FlagSet {
            field: row.datalong,
            mask: row.datalong2,
        },
        CommandId::FlagRemove => Cmd::FlagRemove {
            field: row.datalong,
            mask: row.datalong2,
        },
        CommandId::TeleportTo => {
            require_map_coord(row, spec, pos)?;
            Cmd::TeleportTo { map_id: row.datalong }
        },
        CommandId::QuestExplored => {
            let quest_id = require_nonzero(row, spec, row.datalong, "quest id")?;
            if row.datalong2 as f32 > VISIBLE_RANGE {
                return Err(invalid(row, spec, format!("distance {} beyond visible range", row.datalong2)));
            }
            Cmd::QuestExplored {
                quest_id,
                distance: row.datalong2,
            }
        },
        CommandId::KillCredit => Cmd::KillCredit {
            creature_entry: require_nonzero(row, spec, row.datalong, "creature entry")?,
            group_credit: row.datalong2 != 0,
        },
        CommandId::RespawnGameObject => Cmd::RespawnGameObject {
            db_guid: require_nonzero(row, spec, row.datalong, "gameobject guid")?,
            despawn_delay: row.datalong2 as i32,
        },
        CommandId::TempSummonCreature => {
            require_map_coord(row, spec, pos)?;
            Cmd::TempSummonCreature {
                creature_entry: require_nonzero(row, spec, row.datalong, "creature entry")?,
                despawn_delay: row.datalong2,
                unique_limit: row.datalong3,
                unique_distance: row.datalong4,
            }
        },
        CommandId::OpenDoor => Cmd::OpenDoor {
            db_guid: require_nonzero(row, spec, row.datalong, "door guid")?,
            reset_delay: row.datalong2 as i32,
        },
        CommandId::CloseDoor => Cmd::CloseDoor {
            db_guid: require_nonzero(row, spec, row.datalong, "door guid")?,
            reset_delay: row.datalong2 as i32,
        },
        CommandId::ActivateObject => Cmd::ActivateObject,
        CommandId::RemoveAura => Cmd::RemoveAura {
            spell_id: require_nonzero(row, spec, row.datalong, "spell id")?,
            from_source: row.datalong2 != 0,
        },
        CommandId::CastSpell => {
            let spell_id = require_nonzero(row, spec, row.datalong, "spell id")?;
            if row.datalong2 > 0x07 {
                return Err(invalid(row, spec, format!("cast flags {:#x} out of range", row.datalong2)));
            }
            let direction = match row.datalong2 & 0x03 {
                0 => CastDirection::SourceToTarget,
                1 => CastDirection::SourceToSource,
                2 => CastDirection::TargetToTarget,
                _ => CastDirection::TargetToSource,
            };
            Cmd::CastSpell {
                spell_id,
                direction,
                triggered: row.datalong2 & 0x04 != 0,
            }
        },
        CommandId::PlaySound => {
            if row.datalong2 > 0x03 {
                return Err(invalid(row, spec, format!("sound flags {:#x} out of range", row.datalong2)));
            }
            Cmd::PlaySound {
                sound_id: require_nonzero(row, spec, row.datalong, "sound id")?,
                target_only: row.datalong2 & 0x01 != 0,
                distance_dependent: row.datalong2 & 0x02 != 0,
            }
        },
        CommandId::CreateItem => Cmd::CreateItem {
            item_entry: require_nonzero(row, spec, row.datalong, "item entry")?,
            amount: require_nonzero(row, spec, row.datalong2, "item amount")?,
        },
        CommandId::DespawnSelf => Cmd::DespawnSelf {
            despawn_delay: row.datalong,
        },
        CommandId::PlayMovie => Cmd::PlayMovie { movie_id: row.datalong },
        CommandId::Movement => {
            let movement_type = match row.datalong {
                0 => MovementType::Idle,
                1 => MovementType::Random,
                2 => MovementType::Waypoint,
                other => return Err(invalid(row, spec, format!("unknown movement type {other}"))),
            };
            Cmd::Movement { movement_type }
        },
        CommandId::SetActiveObject => Cmd::SetActiveObject {
            active: row.datalong != 0,
        },
        CommandId::SetFaction => Cmd::SetFaction {
            faction_id: row.datalong,
        },
        CommandId::MorphToEntryOrModel => Cmd::MorphToEntryOrModel {
            entry_or_model: row.datalong,
        },
        CommandId::MountToEntryOrModel => Cmd::MountToEntryOrModel {
            entry_or_model: row.datalong,
        },
        CommandId::SetRun => Cmd::SetRun { run: row.datalong != 0 },
        CommandId::AttackStart => Cmd::AttackStart,
        CommandId::GoLockState => {
            let lock_state = GoLockFlags::from_bits(row.datalong)
                .filter(|f| !f.is_empty())
                .ok_or_else(|| invalid(row, spec, format!("invalid lock state {:#x}", row.datalong)))?;
            if lock_state.contains(GoLockFlags::LOCK | GoLockFlags::UNLOCK)
                || lock_state.contains(GoLockFlags::INTERACTABLE | GoLockFlags::NOT_INTERACTABLE)
            {
                return Err(invalid(row, spec, format!("contradicting lock state {:#x}", row.datalong)));
            }
            Cmd::GoLockState { lock_state }
        },
        CommandId::StandState => {
            if row.datalong >= MAX_UNIT_STAND_STATE {
                return Err(invalid(row, spec, format!("stand state {} out of range", row.datalong)));
            }
            Cmd::StandState {
                stand_state: row.datalong,
            }
        },
        CommandId::ModifyNpcFlags => {
            let op = match row.datalong2 {
                0 => NpcFlagOp::Toggle,
                1 => NpcFlagOp::Add,
                2 => NpcFlagOp::Remove,
                other => return Err(invalid(row, spec, format!("unknown npc flag operation {other}"))),
            };
            Cmd::ModifyNpcFlags {
                flags: row.datalong,
                op,
            }
        },
        CommandId::SendTaxiPath => Cmd::SendTaxiPath {
            path_id: require_nonzero(row, spec, row.datalong, "taxi path id")?,
        },
        CommandId::TerminateScript => {
            if row.datalong != 0 && (row.datalong2 == 0 || row.datalong2 as f32 > VISIBLE_RANGE) {
                return Err(invalid(
                    row,
                    spec,
                    format!("search distance {} invalid for npc search", row.datalong2),
                ));
            }
            Cmd::TerminateScript {
                npc_entry: row.datalong,
                search_distance: row.datalong2,
                waypoint_wait_diff: row.dataint,
            }
        },
        CommandId::PauseWaypoints => Cmd::PauseWaypoints {
            pause: row.datalong != 0,
        },
        CommandId::Reserved1 => return Err(ValidationError::ReservedCommand { id: row.id, command: spec.id }),
        CommandId::TerminateCond => Cmd::TerminateCond {
            condition_id: require_nonzero(row, spec, row.datalong, "condition id")?,
            fail_quest: row.datalong2,
        },
        CommandId::SendAiEvent => {
            if row.datalong >= MAXIMAL_AI_EVENT_EVENTAI && !AI_EVENT_CUSTOM_RANGE.contains(&row.datalong) {
                return Err(invalid(row, spec, format!("unknown AI event type {}", row.datalong)));
            }
            Cmd::SendAiEvent {
                event_type: row.datalong,
                radius: row.datalong2,
            }
        },
        CommandId::SetFacing => Cmd::SetFacing {
            reset: row.datalong != 0,
        },
        CommandId::MoveDynamic => {
            if row.datalong != 0 && row.datalong2 > row.datalong {
                return Err(invalid(
                    row,
                    spec,
                    format!("min distance {} above max distance {}", row.datalong2, row.datalong),
                ));
            }
            Cmd::MoveDynamic {
                max_dist: row.datalong,
                min_dist: row.datalong2,
            }
        },
        CommandId::SendMail => {
            if row.dataint < 0 {
                return Err(invalid(row, spec, format!("negative mail delay {}", row.dataint)));
            }
            Cmd::SendMail {
                template_id: require_nonzero(row, spec, row.datalong, "mail template id")?,
                alt_sender: row.datalong2,
                delay_secs: row.dataint,
            }
        },
        CommandId::SetFly => Cmd::SetFly { fly: row.datalong != 0 },
        CommandId::DespawnGameObject => Cmd::DespawnGameObject,
        CommandId::Respawn => Cmd::Respawn,
        CommandId::SetEquipmentSlots => Cmd::SetEquipmentSlots {
            reset_default: row.datalong != 0,
            slots: [row.dataint, row.dataint2, row.dataint3],
        },
        CommandId::ResetGameObject => Cmd::ResetGameObject,
        CommandId::UpdateTemplate => {
            let team = match row.datalong2 {
                0 => Team::Alliance,
                1 => Team::Horde,
                other => return Err(invalid(row, spec, format!("unknown faction team {other}"))),
            };
            Cmd::UpdateTemplate {
                entry: require_nonzero(row, spec, row.datalong, "creature entry")?,
                team,
            }
        },
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(command: CommandId) -> ScriptRow {
        ScriptRow {
            id: 100,
            command: command as u32,
            ..ScriptRow::default()
        }
    }

    #[test]
    fn decodes_talk_with_random_texts() {
        let r = ScriptRow {
            datalong: 1,
            datalong4: 7,
            dataint: 2_000_000_001,
            dataint3: 2_000_000_003,
            ..row(CommandId::Talk)
        };
        let info = ScriptInfo::from_row(&r).expect("talk decodes");
        assert_eq!(
            info.command,
            ScriptCommand::Talk {
                chat_type: ChatType::Yell,
                language: 7,
                text_ids: [2_000_000_001, 0, 2_000_000_003, 0],
            }
        );
        assert_eq!(info.command.text_ids(), vec![2_000_000_001, 2_000_000_003]);
        assert!(!info.buddy.is_set());
    }

    #[test]
    fn talk_without_first_text_is_rejected() {
        let r = ScriptRow {
            dataint2: 2_000_000_001,
            ..row(CommandId::Talk)
        };
        assert!(matches!(
            ScriptInfo::from_row(&r),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unknown_and_reserved_commands_are_rejected() {
        let unknown = ScriptRow {
            command: 99,
            ..ScriptRow::default()
        };
        assert!(matches!(
            ScriptInfo::from_row(&unknown),
            Err(ValidationError::UnknownCommand { command: 99, .. })
        ));
        assert!(matches!(
            ScriptInfo::from_row(&row(CommandId::Reserved1)),
            Err(ValidationError::ReservedCommand { .. })
        ));
    }

    #[test]
    fn undefined_flag_bits_are_rejected() {
        let r = ScriptRow {
            data_flags: 0x80,
            ..row(CommandId::Respawn)
        };
        assert!(matches!(
            ScriptInfo::from_row(&r),
            Err(ValidationError::InvalidFlags { flags: 0x80, .. })
        ));
    }

    #[test]
    fn additional_flag_only_where_supported() {
        let unsupported = ScriptRow {
            data_flags: DataFlags::COMMAND_ADDITIONAL.bits(),
            datalong: 5,
            ..row(CommandId::Emote)
        };
        assert!(matches!(
            ScriptInfo::from_row(&unsupported),
            Err(ValidationError::UnsupportedAdditionalFlag { .. })
        ));

        let supported = ScriptRow {
            data_flags: DataFlags::COMMAND_ADDITIONAL.bits(),
            datalong: 1,
            ..row(CommandId::TerminateCond)
        };
        let info = ScriptInfo::from_row(&supported).expect("terminate cond decodes");
        assert!(info.additional());
    }

    #[test]
    fn cast_spell_flags_split_into_direction_and_triggered() {
        let r = ScriptRow {
            datalong: 133,
            datalong2: 0x04 | 0x03,
            ..row(CommandId::CastSpell)
        };
        let info = ScriptInfo::from_row(&r).unwrap();
        assert_eq!(
            info.command,
            ScriptCommand::CastSpell {
                spell_id: 133,
                direction: CastDirection::TargetToSource,
                triggered: true,
            }
        );
    }

    #[test]
    fn go_lock_state_rejects_contradictions() {
        let r = ScriptRow {
            datalong: 0x01 | 0x02,
            ..row(CommandId::GoLockState)
        };
        assert!(ScriptInfo::from_row(&r).is_err());
        let ok = ScriptRow {
            datalong: 0x01 | 0x04,
            ..row(CommandId::GoLockState)
        };
        assert!(ScriptInfo::from_row(&ok).is_ok());
    }

    #[test]
    fn teleport_needs_valid_coordinates() {
        let r = ScriptRow {
            x: 50_000.0,
            ..row(CommandId::TeleportTo)
        };
        assert!(ScriptInfo::from_row(&r).is_err());
    }

    #[test]
    fn go_guid_helper_only_for_gameobject_commands() {
        let r = ScriptRow {
            datalong: 4242,
            datalong2: 30,
            ..row(CommandId::OpenDoor)
        };
        assert_eq!(ScriptInfo::from_row(&r).unwrap().go_guid(), Some(4242));
        let respawn = ScriptInfo::from_row(&row(CommandId::Respawn)).unwrap();
        assert_eq!(respawn.go_guid(), None);
    }

    #[test]
    fn predicates_follow_command_table() {
        let info = ScriptInfo::from_row(&row(CommandId::ResetGameObject)).unwrap();
        assert!(!info.is_creature_buddy());
        assert!(!info.has_additional_script_flag());
        assert_eq!(info.buddy.kind, BuddyKind::GameObject);
    }
}
