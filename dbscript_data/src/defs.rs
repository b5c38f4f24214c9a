use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum distance (yards) for buddy searches and proximity checks: the visible range.
pub const VISIBLE_RANGE: f32 = 166.0;

/// Coordinates beyond this are outside every map.
pub const MAP_HALF_SIZE: f32 = 17_066.666;

/// Number of alternative text ids a `TALK` command can carry.
pub const MAX_TEXT_ID: usize = 4;

/// One persisted script row, exactly as stored.
///
/// Column meaning depends on `command`; see [`crate::info::ScriptInfo::from_row`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptRow {
    /// Trigger key (quest id, spell id, event id, gameobject guid, ...)
    pub id: u32,
    pub delay: u32,
    pub command: u32,
    pub datalong: u32,
    pub datalong2: u32,
    pub datalong3: u32,
    pub datalong4: u32,
    pub dataint: i32,
    pub dataint2: i32,
    pub dataint3: i32,
    pub dataint4: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub o: f32,
    pub buddy_entry: u32,
    pub search_radius_or_guid: u32,
    pub data_flags: u8,
}

/// The nine script tables, partitioned by the origin of their trigger keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScriptTable {
    QuestEnd,
    QuestStart,
    Spell,
    GameObject,
    GameObjectTemplate,
    Event,
    Gossip,
    CreatureDeath,
    CreatureMovement,
}

impl ScriptTable {
    pub const ALL: [ScriptTable; 9] = [
        ScriptTable::QuestEnd,
        ScriptTable::QuestStart,
        ScriptTable::Spell,
        ScriptTable::GameObject,
        ScriptTable::GameObjectTemplate,
        ScriptTable::Event,
        ScriptTable::Gossip,
        ScriptTable::CreatureDeath,
        ScriptTable::CreatureMovement,
    ];

    /// Storage name of the table.
    pub fn table_name(self) -> &'static str {
        match self {
            ScriptTable::QuestEnd => "quest_end_scripts",
            ScriptTable::QuestStart => "quest_start_scripts",
            ScriptTable::Spell => "spell_scripts",
            ScriptTable::GameObject => "gameobject_scripts",
            ScriptTable::GameObjectTemplate => "gameobject_template_scripts",
            ScriptTable::Event => "event_scripts",
            ScriptTable::Gossip => "gossip_scripts",
            ScriptTable::CreatureDeath => "creature_death_scripts",
            ScriptTable::CreatureMovement => "creature_movement_scripts",
        }
    }

    /// Position of the table in [`ScriptTable::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look a table up by its storage name.
    pub fn from_name(name: &str) -> Option<ScriptTable> {
        ScriptTable::ALL.into_iter().find(|t| t.table_name() == name)
    }
}

impl fmt::Display for ScriptTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A point in a map, with orientation.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub o: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32, o: f32) -> Self {
        Self { x, y, z, o }
    }

    /// 3D distance, ignoring orientation.
    pub fn distance(&self, other: &Position) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.o == 0.0
    }

    /// Finite and inside the map bounds.
    pub fn is_valid_map_coord(&self) -> bool {
        [self.x, self.y, self.z, self.o].iter().all(|v| v.is_finite())
            && self.x.abs() <= MAP_HALF_SIZE
            && self.y.abs() <= MAP_HALF_SIZE
    }
}

/// A `db_script_string` row: text plus presentation data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptTextRow {
    pub entry: i32,
    pub content: String,
    pub sound: u32,
    pub chat_type: u8,
    pub language: u32,
    pub emote: u32,
}

/// Binds an area trigger or event id to a script name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBindingRow {
    pub id: u32,
    pub script_name: String,
}

/// Script names referenced by templates, and the id bindings that use them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptNamesDef {
    pub names: Vec<String>,
    pub area_triggers: Vec<ScriptBindingRow>,
    pub events: Vec<ScriptBindingRow>,
}

/// One waypoint of a scripted creature path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMoveRow {
    pub creature_entry: u32,
    pub point_id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub wait_time: u32,
}

/// Escort quest data for a creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscortDataRow {
    pub creature_entry: u32,
    pub quest_entry: u32,
    pub escort_faction: u32,
    #[serde(default)]
    pub last_waypoint_entry: u32,
}

/// Waypoint and escort data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointsDef {
    pub points: Vec<PointMoveRow>,
    pub escorts: Vec<EscortDataRow>,
}
