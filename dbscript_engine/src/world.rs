//! The engine's view of the game world.
//!
//! Scripts never hold references into the world. They carry [`ObjectGuid`]s, look entities up
//! through [`World`] every time they run a step, and describe every mutation as a
//! [`WorldEffect`] that the world applies (or refuses with an [`EffectError`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dbscript_data::{BuddyKind, ChatType, GoLockFlags, MovementType, NpcFlagOp, Position, Team};

use crate::guid::ObjectGuid;

/// Whether an entity is alive, dead, or removed from the map.
#[derive(Copy, Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeState {
    #[default]
    Alive,
    Dead,
    Despawned,
}

/// Snapshot of one entity as the engine needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub guid: ObjectGuid,
    pub position: Position,
    pub state: LifeState,
    /// Player holding an item, or the owner of a pet.
    pub owner: Option<ObjectGuid>,
    pub pet: Option<ObjectGuid>,
    /// Native script bound to this entity's template (0 = none).
    pub script_id: u32,
    /// Persisted spawn id; 0 for temporary objects.
    pub db_guid: u32,
}

impl EntityInfo {
    pub fn new(guid: ObjectGuid, position: Position) -> Self {
        Self {
            guid,
            position,
            state: LifeState::Alive,
            owner: None,
            pet: None,
            script_id: 0,
            db_guid: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == LifeState::Alive
    }

    /// Present on the map, dead or alive.
    pub fn is_in_world(&self) -> bool {
        self.state != LifeState::Despawned
    }
}

/// Parameters of a nearest-entity search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuddyQuery {
    pub kind: BuddyKind,
    pub entry: u32,
    pub radius: f32,
    /// Also consider dead and despawned entities.
    pub include_dead: bool,
}

/// Display change for morph and mount commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayChange {
    /// Back to the native display (demorph / dismount).
    Restore,
    /// Display of a creature template.
    Entry(u32),
    /// Explicit display id.
    Model(u32),
}

/// Where `SET_FACING` turns a creature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Facing {
    Toward { target: ObjectGuid, lock_target: bool },
    Orientation(f32),
    Reset,
}

/// A resolved world mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEffect {
    Say {
        speaker: ObjectGuid,
        target: Option<ObjectGuid>,
        text_id: i32,
        chat_type: ChatType,
        language: u32,
    },
    Emote {
        entity: ObjectGuid,
        emote_id: u32,
    },
    PlaySound {
        source: ObjectGuid,
        sound_id: u32,
        /// Only this player hears it.
        listener: Option<ObjectGuid>,
        distance_dependent: bool,
    },
    SetField {
        entity: ObjectGuid,
        field: u32,
        value: u32,
    },
    SetFlag {
        entity: ObjectGuid,
        field: u32,
        mask: u32,
    },
    RemoveFlag {
        entity: ObjectGuid,
        field: u32,
        mask: u32,
    },
    MoveTo {
        entity: ObjectGuid,
        destination: Position,
        travel_time: u32,
    },
    Teleport {
        player: ObjectGuid,
        map_id: u32,
        destination: Position,
    },
    AreaExplored {
        player: ObjectGuid,
        quest_id: u32,
    },
    FailQuest {
        player: ObjectGuid,
        quest_id: u32,
    },
    KillCredit {
        player: ObjectGuid,
        creature_entry: u32,
        group: bool,
    },
    RespawnGameObject {
        gameobject: ObjectGuid,
        despawn_delay: i32,
    },
    SummonCreature {
        summoner: ObjectGuid,
        creature_entry: u32,
        position: Position,
        despawn_delay: u32,
        active: bool,
    },
    UseDoor {
        door: ObjectGuid,
        open: bool,
        reset_delay: i32,
    },
    ActivateObject {
        gameobject: ObjectGuid,
        activator: ObjectGuid,
    },
    RemoveAura {
        entity: ObjectGuid,
        spell_id: u32,
    },
    CastSpell {
        caster: ObjectGuid,
        target: ObjectGuid,
        spell_id: u32,
        triggered: bool,
        interrupt_previous: bool,
    },
    CreateItem {
        player: ObjectGuid,
        item_entry: u32,
        amount: u32,
    },
    Despawn {
        entity: ObjectGuid,
        delay_ms: u32,
    },
    PlayMovie {
        player: ObjectGuid,
        movie_id: u32,
    },
    SetMovement {
        creature: ObjectGuid,
        movement_type: MovementType,
        around_current: bool,
    },
    SetActive {
        entity: ObjectGuid,
        active: bool,
    },
    /// Faction 0 restores the template faction.
    SetFaction {
        creature: ObjectGuid,
        faction_id: u32,
    },
    Morph {
        creature: ObjectGuid,
        display: DisplayChange,
    },
    Mount {
        creature: ObjectGuid,
        display: DisplayChange,
    },
    SetRun {
        creature: ObjectGuid,
        run: bool,
    },
    AttackStart {
        attacker: ObjectGuid,
        victim: ObjectGuid,
    },
    SetGoLockState {
        gameobject: ObjectGuid,
        lock_state: GoLockFlags,
    },
    SetStandState {
        entity: ObjectGuid,
        stand_state: u32,
    },
    ModifyNpcFlags {
        creature: ObjectGuid,
        flags: u32,
        op: NpcFlagOp,
    },
    SendTaxiPath {
        player: ObjectGuid,
        path_id: u32,
    },
    AdjustWaypointWait {
        creature: ObjectGuid,
        diff_ms: i32,
    },
    PauseWaypoints {
        creature: ObjectGuid,
        pause: bool,
    },
    SendAiEvent {
        sender: ObjectGuid,
        invoker: ObjectGuid,
        event_type: u32,
        /// 0 sends only to the invoker.
        radius: u32,
    },
    SetFacing {
        creature: ObjectGuid,
        facing: Facing,
    },
    SendMail {
        sender: Option<ObjectGuid>,
        player: ObjectGuid,
        template_id: u32,
        alt_sender: u32,
        delay_secs: u32,
    },
    SetFly {
        creature: ObjectGuid,
        fly: bool,
        always_stand: bool,
    },
    DespawnGameObject {
        gameobject: ObjectGuid,
    },
    Respawn {
        creature: ObjectGuid,
    },
    SetEquipment {
        creature: ObjectGuid,
        reset_default: bool,
        slots: [i32; 3],
    },
    ResetGameObject {
        gameobject: ObjectGuid,
    },
    UpdateTemplate {
        creature: ObjectGuid,
        entry: u32,
        team: Team,
    },
}

/// Why the world refused an effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    #[error("entity {0} not found")]
    EntityNotFound(ObjectGuid),
    #[error("{entity} cannot {action}")]
    Unsupported { entity: ObjectGuid, action: &'static str },
    #[error("spell {spell_id} failed: {reason}")]
    SpellFailed { spell_id: u32, reason: String },
}

/// Everything the script engine reads from or does to the world.
///
/// The trait is object safe; the engine only ever sees `&dyn World` / `&mut dyn World`.
pub trait World {
    /// Look an entity up; `None` once it has been removed from the world entirely.
    fn entity(&self, guid: ObjectGuid) -> Option<EntityInfo>;

    /// Nearest matching entity within `query.radius` of `origin`, excluding `origin` itself.
    fn find_nearest(&self, origin: ObjectGuid, query: &BuddyQuery) -> Option<ObjectGuid>;

    /// Entity spawned from the persisted spawn `db_guid`.
    fn find_by_db_guid(&self, kind: BuddyKind, db_guid: u32) -> Option<ObjectGuid>;

    /// Living creatures of `entry` within `radius` of `origin`.
    fn count_nearby(&self, origin: ObjectGuid, entry: u32, radius: f32) -> usize;

    /// Evaluate an externally defined condition.
    fn condition_met(&self, condition_id: u32, source: Option<ObjectGuid>, target: Option<ObjectGuid>) -> bool;

    /// Apply one mutation.
    ///
    /// # Errors
    /// - when the effect cannot be applied to the given entities
    fn apply(&mut self, effect: WorldEffect) -> Result<(), EffectError>;
}
