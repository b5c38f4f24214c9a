//! Command tags and the table describing each of them.
//!
//! Every property that depends only on the command tag (which raw columns it reads, what
//! kind of entity a buddy search looks for, whether `SCRIPT_FLAG_COMMAND_ADDITIONAL` means
//! anything) lives in [`COMMAND_TABLE`]. Helpers elsewhere go through [`CommandId::spec`].

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of command tags, including the reserved one.
pub const COMMAND_COUNT: usize = 45;

/// Numeric tag of a script command as stored in the `command` column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum CommandId {
    Talk = 0,
    Emote = 1,
    FieldSet = 2,
    MoveTo = 3,
    FlagSet = 4,
    FlagRemove = 5,
    TeleportTo = 6,
    QuestExplored = 7,
    KillCredit = 8,
    RespawnGameObject = 9,
    TempSummonCreature = 10,
    OpenDoor = 11,
    CloseDoor = 12,
    ActivateObject = 13,
    RemoveAura = 14,
    CastSpell = 15,
    PlaySound = 16,
    CreateItem = 17,
    DespawnSelf = 18,
    PlayMovie = 19,
    Movement = 20,
    SetActiveObject = 21,
    SetFaction = 22,
    MorphToEntryOrModel = 23,
    MountToEntryOrModel = 24,
    SetRun = 25,
    AttackStart = 26,
    GoLockState = 27,
    StandState = 28,
    ModifyNpcFlags = 29,
    SendTaxiPath = 30,
    TerminateScript = 31,
    PauseWaypoints = 32,
    Reserved1 = 33,
    TerminateCond = 34,
    SendAiEvent = 35,
    SetFacing = 36,
    MoveDynamic = 37,
    SendMail = 38,
    SetFly = 39,
    DespawnGameObject = 40,
    Respawn = 41,
    SetEquipmentSlots = 42,
    ResetGameObject = 43,
    UpdateTemplate = 44,
}

impl CommandId {
    /// Tag for a raw `command` column value, if it names a known command.
    pub fn from_raw(raw: u32) -> Option<CommandId> {
        COMMAND_TABLE.get(raw as usize).map(|spec| spec.id)
    }

    /// The table entry describing this command.
    pub fn spec(self) -> &'static CommandSpec {
        &COMMAND_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Buddy searches for this command look for creatures (as opposed to gameobjects).
    pub fn is_creature_buddy(self) -> bool {
        self.spec().buddy == BuddyKind::Creature
    }

    /// `SCRIPT_FLAG_COMMAND_ADDITIONAL` has a meaning for this command.
    pub fn has_additional_script_flag(self) -> bool {
        self.spec().additional_flag
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u32)
    }
}

/// Kind of world object a buddy search looks for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuddyKind {
    Creature,
    GameObject,
}

/// Raw numeric columns of a persisted row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RawField {
    DataLong,
    DataLong2,
    DataLong3,
    DataLong4,
    DataInt,
    DataInt2,
    DataInt3,
    DataInt4,
}

impl RawField {
    pub const ALL: [RawField; 8] = [
        RawField::DataLong,
        RawField::DataLong2,
        RawField::DataLong3,
        RawField::DataLong4,
        RawField::DataInt,
        RawField::DataInt2,
        RawField::DataInt3,
        RawField::DataInt4,
    ];

    pub fn column(self) -> &'static str {
        match self {
            RawField::DataLong => "datalong",
            RawField::DataLong2 => "datalong2",
            RawField::DataLong3 => "datalong3",
            RawField::DataLong4 => "datalong4",
            RawField::DataInt => "dataint",
            RawField::DataInt2 => "dataint2",
            RawField::DataInt3 => "dataint3",
            RawField::DataInt4 => "dataint4",
        }
    }
}

/// Static description of one command tag.
#[derive(Debug)]
pub struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    /// Raw columns the decoder reads for this command.
    pub layout: &'static [RawField],
    pub buddy: BuddyKind,
    pub additional_flag: bool,
    /// `datalong2`/`datalong3` carry an old-style buddy entry and search radius.
    pub legacy_buddy: bool,
    /// False for tags that exist in the numbering but may not appear in data.
    pub loadable: bool,
}

use RawField::{DataInt, DataInt2, DataInt3, DataInt4, DataLong, DataLong2, DataLong3, DataLong4};

const NONE: &[RawField] = &[];
const L1: &[RawField] = &[DataLong];
const L12: &[RawField] = &[DataLong, DataLong2];
// datalong2/datalong3 are the legacy per-command buddy entry and radius
const L123: &[RawField] = &[DataLong, DataLong2, DataLong3];
const LEGACY_BUDDY: &[RawField] = &[DataLong2, DataLong3];

const fn spec(
    id: CommandId,
    name: &'static str,
    layout: &'static [RawField],
    buddy: BuddyKind,
    additional_flag: bool,
) -> CommandSpec {
    CommandSpec {
        id,
        name,
        layout,
        buddy,
        additional_flag,
        legacy_buddy: false,
        loadable: true,
    }
}

const fn legacy(mut spec: CommandSpec) -> CommandSpec {
    spec.legacy_buddy = true;
    spec
}

use BuddyKind::{Creature as C, GameObject as G};

/// Tag → properties. Indexed by the numeric tag.
#[rustfmt::skip]
pub static COMMAND_TABLE: [CommandSpec; COMMAND_COUNT] = [
    legacy(spec(CommandId::Talk, "TALK", &[DataLong, DataLong2, DataLong3, DataLong4, DataInt, DataInt2, DataInt3, DataInt4], C, false)),
    legacy(spec(CommandId::Emote, "EMOTE", L123, C, false)),
    spec(CommandId::FieldSet, "FIELD_SET", L12, C, false),
    spec(CommandId::MoveTo, "MOVE_TO", &[DataLong2], C, true),
    spec(CommandId::FlagSet, "FLAG_SET", L12, C, false),
    spec(CommandId::FlagRemove, "FLAG_REMOVE", L12, C, false),
    spec(CommandId::TeleportTo, "TELEPORT_TO", L1, C, false),
    spec(CommandId::QuestExplored, "QUEST_EXPLORED", L12, C, false),
    spec(CommandId::KillCredit, "KILL_CREDIT", L12, C, false),
    spec(CommandId::RespawnGameObject, "RESPAWN_GAMEOBJECT", L12, G, false),
    spec(CommandId::TempSummonCreature, "TEMP_SUMMON_CREATURE", &[DataLong, DataLong2, DataLong3, DataLong4], C, true),
    spec(CommandId::OpenDoor, "OPEN_DOOR", L12, G, false),
    spec(CommandId::CloseDoor, "CLOSE_DOOR", L12, G, false),
    spec(CommandId::ActivateObject, "ACTIVATE_OBJECT", NONE, G, false),
    spec(CommandId::RemoveAura, "REMOVE_AURA", L12, C, false),
    spec(CommandId::CastSpell, "CAST_SPELL", L12, C, true),
    spec(CommandId::PlaySound, "PLAY_SOUND", L12, C, false),
    spec(CommandId::CreateItem, "CREATE_ITEM", L12, C, false),
    spec(CommandId::DespawnSelf, "DESPAWN_SELF", L1, C, false),
    spec(CommandId::PlayMovie, "PLAY_MOVIE", L1, C, false),
    legacy(spec(CommandId::Movement, "MOVEMENT", L123, C, true)),
    legacy(spec(CommandId::SetActiveObject, "SET_ACTIVEOBJECT", L123, C, false)),
    legacy(spec(CommandId::SetFaction, "SET_FACTION", L123, C, false)),
    legacy(spec(CommandId::MorphToEntryOrModel, "MORPH_TO_ENTRY_OR_MODEL", L123, C, true)),
    legacy(spec(CommandId::MountToEntryOrModel, "MOUNT_TO_ENTRY_OR_MODEL", L123, C, true)),
    legacy(spec(CommandId::SetRun, "SET_RUN", L123, C, false)),
    legacy(spec(CommandId::AttackStart, "ATTACK_START", LEGACY_BUDDY, C, false)),
    legacy(spec(CommandId::GoLockState, "GO_LOCK_STATE", L123, G, false)),
    legacy(spec(CommandId::StandState, "STAND_STATE", L123, C, false)),
    spec(CommandId::ModifyNpcFlags, "MODIFY_NPC_FLAGS", L12, C, false),
    spec(CommandId::SendTaxiPath, "SEND_TAXI_PATH", L1, C, false),
    spec(CommandId::TerminateScript, "TERMINATE_SCRIPT", &[DataLong, DataLong2, DataInt], C, true),
    spec(CommandId::PauseWaypoints, "PAUSE_WAYPOINTS", L1, C, false),
    CommandSpec { id: CommandId::Reserved1, name: "RESERVED_1", layout: NONE, buddy: C, additional_flag: false, legacy_buddy: false, loadable: false },
    spec(CommandId::TerminateCond, "TERMINATE_COND", L12, C, true),
    spec(CommandId::SendAiEvent, "SEND_AI_EVENT", L12, C, false),
    spec(CommandId::SetFacing, "SET_FACING", L1, C, true),
    spec(CommandId::MoveDynamic, "MOVE_DYNAMIC", L12, C, true),
    spec(CommandId::SendMail, "SEND_MAIL", &[DataLong, DataLong2, DataInt], C, false),
    spec(CommandId::SetFly, "SET_FLY", L1, C, true),
    spec(CommandId::DespawnGameObject, "DESPAWN_GO", NONE, G, false),
    spec(CommandId::Respawn, "RESPAWN", NONE, C, false),
    spec(CommandId::SetEquipmentSlots, "SET_EQUIPMENT_SLOTS", &[DataLong, DataInt, DataInt2, DataInt3], C, false),
    spec(CommandId::ResetGameObject, "RESET_GO", NONE, G, false),
    spec(CommandId::UpdateTemplate, "UPDATE_TEMPLATE", L12, C, false),
];

bitflags! {
    /// `data_flags` column: buddy resolution and role transformation.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DataFlags: u8 {
        /// s -> b
        const BUDDY_AS_TARGET = 0x01;
        /// t* -> s*, applied after the buddy substitution
        const REVERSE_DIRECTION = 0x02;
        /// s* -> s*, applied last
        const SOURCE_TARGETS_SELF = 0x04;
        /// meaning depends on the command
        const COMMAND_ADDITIONAL = 0x08;
        const BUDDY_BY_GUID = 0x10;
        const BUDDY_IS_PET = 0x20;
        const BUDDY_IS_DESPAWNED = 0x40;
    }
}

impl DataFlags {
    /// Flags that only make sense together with a buddy entry.
    pub const BUDDY_MODES: DataFlags = DataFlags::BUDDY_BY_GUID
        .union(DataFlags::BUDDY_IS_PET)
        .union(DataFlags::BUDDY_IS_DESPAWNED);
}
