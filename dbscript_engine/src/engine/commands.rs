//! Execution of single script commands.
//!
//! [`execute`] resolves the command's source and target, then hands the typed payload to one
//! handler per command. Handlers check the roles they need, turn the command into
//! [`WorldEffect`]s and log what they did:
//! ```text
//! └─ command: NAME (n) details
//! ```

use log::{info, warn};
use rand::Rng;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;

use dbscript_data::{
    BuddyKind, CastDirection, ChatType, CommandId, GoLockFlags, MovementType, NpcFlagOp, Position, ScriptCommand,
    ScriptInfo, Team,
};

use crate::engine::action::RuntimeAction;
use crate::engine::{StepError, StepOutcome};
use crate::guid::{EntityKind, ObjectGuid};
use crate::resolver::{Resolved, resolve};
use crate::texts::ScriptTexts;
use crate::world::{BuddyQuery, DisplayChange, Facing, World, WorldEffect};

/// Roles a command may require of its source or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Any,
    Unit,
    Creature,
    Player,
    GameObject,
}

impl Expect {
    fn accepts(self, kind: EntityKind) -> bool {
        match self {
            Expect::Any => true,
            Expect::Unit => kind.is_unit_kind(),
            Expect::Creature => matches!(kind, EntityKind::Creature | EntityKind::Pet),
            Expect::Player => kind == EntityKind::Player,
            Expect::GameObject => kind == EntityKind::GameObject,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Expect::Any => "world object",
            Expect::Unit => "unit",
            Expect::Creature => "creature",
            Expect::Player => "player",
            Expect::GameObject => "gameobject",
        }
    }
}

/// Per-command context: the resolved roles plus the command being run.
struct Step<'a> {
    info: &'a ScriptInfo,
    command: CommandId,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
}

impl Step<'_> {
    fn require(&self, role: &'static str, guid: Option<ObjectGuid>, expect: Expect) -> Result<ObjectGuid, StepError> {
        let guid = guid.ok_or(StepError::MissingRole {
            command: self.command,
            role,
        })?;
        if expect.accepts(guid.kind) {
            Ok(guid)
        } else {
            Err(StepError::WrongRole {
                command: self.command,
                role,
                guid,
                expected: expect.name(),
            })
        }
    }

    fn source(&self, expect: Expect) -> Result<ObjectGuid, StepError> {
        self.require("source", self.source, expect)
    }

    fn target(&self, expect: Expect) -> Result<ObjectGuid, StepError> {
        self.require("target", self.target, expect)
    }

    /// Target if it matches, otherwise the source.
    fn target_or_source(&self, expect: Expect) -> Result<ObjectGuid, StepError> {
        self.pick([self.target, self.source], expect)
    }

    /// Source if it matches, otherwise the target.
    fn source_or_target(&self, expect: Expect) -> Result<ObjectGuid, StepError> {
        self.pick([self.source, self.target], expect)
    }

    fn pick(&self, candidates: [Option<ObjectGuid>; 2], expect: Expect) -> Result<ObjectGuid, StepError> {
        candidates
            .into_iter()
            .flatten()
            .find(|guid| expect.accepts(guid.kind))
            .ok_or(StepError::MissingRole {
                command: self.command,
                role: expect.name(),
            })
    }

    fn position_of(&self, world: &dyn World, guid: ObjectGuid) -> Result<Position, StepError> {
        world
            .entity(guid)
            .map(|e| e.position)
            .ok_or(StepError::EntityGone {
                command: self.command,
                guid,
            })
    }
}

/// Run one command of `action`.
///
/// # Errors
/// - [`StepError::BuddyNotFound`] when the buddy cannot be resolved
/// - role, lookup and effect failures; the caller logs them and continues with the next command
pub fn execute(
    info: &ScriptInfo,
    action: &RuntimeAction,
    world: &mut dyn World,
    texts: &ScriptTexts,
    rng: &mut StdRng,
) -> Result<StepOutcome, StepError> {
    let Resolved { source, target } = resolve(info, action.source, action.target, &*world)?;
    let step = Step {
        info,
        command: info.command_id(),
        source,
        target,
    };
    let additional = info.additional();

    use ScriptCommand::*;
    match &info.command {
        Talk {
            chat_type,
            language,
            text_ids,
        } => talk(&step, world, texts, rng, *chat_type, *language, text_ids)?,
        Emote { emote_id } => emote(&step, world, *emote_id)?,
        FieldSet { field, value } => field_set(&step, world, *field, *value)?,
        MoveTo { travel_time } => move_to(&step, world, *travel_time, additional)?,
        FlagSet { field, mask } => flag_change(&step, world, *field, *mask, true)?,
        FlagRemove { field, mask } => flag_change(&step, world, *field, *mask, false)?,
        TeleportTo { map_id } => teleport_to(&step, world, *map_id)?,
        QuestExplored { quest_id, distance } => quest_explored(&step, world, *quest_id, *distance)?,
        KillCredit {
            creature_entry,
            group_credit,
        } => kill_credit(&step, world, *creature_entry, *group_credit)?,
        RespawnGameObject { db_guid, despawn_delay } => respawn_gameobject(&step, world, *db_guid, *despawn_delay)?,
        TempSummonCreature {
            creature_entry,
            despawn_delay,
            unique_limit,
            unique_distance,
        } => temp_summon(
            &step,
            world,
            *creature_entry,
            *despawn_delay,
            (*unique_limit, *unique_distance),
            additional,
        )?,
        OpenDoor { db_guid, reset_delay } => use_door(&step, world, *db_guid, *reset_delay, true)?,
        CloseDoor { db_guid, reset_delay } => use_door(&step, world, *db_guid, *reset_delay, false)?,
        ActivateObject => activate_object(&step, world)?,
        RemoveAura { spell_id, from_source } => remove_aura(&step, world, *spell_id, *from_source)?,
        CastSpell {
            spell_id,
            direction,
            triggered,
        } => cast_spell(&step, world, *spell_id, *direction, *triggered, additional)?,
        PlaySound {
            sound_id,
            target_only,
            distance_dependent,
        } => play_sound(&step, world, *sound_id, *target_only, *distance_dependent)?,
        CreateItem { item_entry, amount } => create_item(&step, world, *item_entry, *amount)?,
        DespawnSelf { despawn_delay } => despawn_self(&step, world, *despawn_delay)?,
        PlayMovie { movie_id } => play_movie(&step, world, *movie_id)?,
        Movement { movement_type } => movement(&step, world, *movement_type, additional)?,
        SetActiveObject { active } => set_active_object(&step, world, *active)?,
        SetFaction { faction_id } => set_faction(&step, world, *faction_id)?,
        MorphToEntryOrModel { entry_or_model } => morph_or_mount(&step, world, *entry_or_model, additional, false)?,
        MountToEntryOrModel { entry_or_model } => morph_or_mount(&step, world, *entry_or_model, additional, true)?,
        SetRun { run } => set_run(&step, world, *run)?,
        AttackStart => attack_start(&step, world)?,
        GoLockState { lock_state } => go_lock_state(&step, world, *lock_state)?,
        StandState { stand_state: state } => stand_state(&step, world, *state)?,
        ModifyNpcFlags { flags, op } => modify_npc_flags(&step, world, *flags, *op)?,
        SendTaxiPath { path_id } => send_taxi_path(&step, world, *path_id)?,
        TerminateScript {
            npc_entry,
            search_distance,
            waypoint_wait_diff,
        } => {
            return terminate_script(&step, world, *npc_entry, *search_distance, *waypoint_wait_diff, additional);
        },
        PauseWaypoints { pause } => pause_waypoints(&step, world, *pause)?,
        Reserved1 => {
            debug_assert!(false, "reserved command reached the engine");
            return Err(StepError::Undispatchable(step.command));
        },
        TerminateCond {
            condition_id,
            fail_quest,
        } => return terminate_cond(&step, world, *condition_id, *fail_quest, additional),
        SendAiEvent { event_type, radius } => send_ai_event(&step, world, *event_type, *radius)?,
        SetFacing { reset } => set_facing(&step, world, *reset, additional)?,
        MoveDynamic { max_dist, min_dist } => move_dynamic(&step, world, rng, *max_dist, *min_dist, additional)?,
        SendMail {
            template_id,
            alt_sender,
            delay_secs,
        } => send_mail(&step, world, *template_id, *alt_sender, *delay_secs)?,
        SetFly { fly } => set_fly(&step, world, *fly, additional)?,
        DespawnGameObject => despawn_gameobject(&step, world)?,
        Respawn => respawn(&step, world)?,
        SetEquipmentSlots { reset_default, slots } => set_equipment(&step, world, *reset_default, *slots)?,
        ResetGameObject => reset_gameobject(&step, world)?,
        UpdateTemplate { entry, team } => update_template(&step, world, *entry, *team)?,
    }
    Ok(StepOutcome::Continue)
}

fn talk(
    step: &Step<'_>,
    world: &mut dyn World,
    texts: &ScriptTexts,
    rng: &mut StdRng,
    chat_type: ChatType,
    language: u32,
    text_ids: &[i32],
) -> Result<(), StepError> {
    let speaker = step.source(Expect::Any)?;
    let target = if chat_type.needs_player_target() {
        Some(step.target(Expect::Player)?)
    } else {
        step.target
    };
    let candidates: Vec<i32> = text_ids.iter().copied().filter(|id| *id != 0).collect();
    let text_id = *candidates.choose(rng).ok_or(StepError::MissingRole {
        command: step.command,
        role: "text id",
    })?;
    if !texts.contains(text_id) {
        return Err(StepError::MissingText(text_id));
    }
    world.apply(WorldEffect::Say {
        speaker,
        target,
        text_id,
        chat_type,
        language,
    })?;
    info!("└─ command: {} {speaker} says text {text_id} ({chat_type:?})", step.command);
    Ok(())
}

fn emote(step: &Step<'_>, world: &mut dyn World, emote_id: u32) -> Result<(), StepError> {
    let entity = step.source(Expect::Unit)?;
    world.apply(WorldEffect::Emote { entity, emote_id })?;
    info!("└─ command: {} {entity} plays emote {emote_id}", step.command);
    Ok(())
}

fn field_set(step: &Step<'_>, world: &mut dyn World, field: u32, value: u32) -> Result<(), StepError> {
    let entity = step.source(Expect::Any)?;
    world.apply(WorldEffect::SetField { entity, field, value })?;
    info!("└─ command: {} {entity} field {field} = {value}", step.command);
    Ok(())
}

fn flag_change(step: &Step<'_>, world: &mut dyn World, field: u32, mask: u32, set: bool) -> Result<(), StepError> {
    let entity = step.source(Expect::Any)?;
    let effect = if set {
        WorldEffect::SetFlag { entity, field, mask }
    } else {
        WorldEffect::RemoveFlag { entity, field, mask }
    };
    world.apply(effect)?;
    info!("└─ command: {} {entity} field {field} mask {mask:#x}", step.command);
    Ok(())
}

fn move_to(step: &Step<'_>, world: &mut dyn World, travel_time: u32, to_target: bool) -> Result<(), StepError> {
    let entity = step.source(Expect::Creature)?;
    let destination = if to_target {
        let target = step.target(Expect::Any)?;
        step.position_of(&*world, target)?
    } else {
        step.info.position
    };
    world.apply(WorldEffect::MoveTo {
        entity,
        destination,
        travel_time,
    })?;
    info!(
        "└─ command: {} {entity} moving to ({:.1}, {:.1}, {:.1}) in {travel_time}ms",
        step.command, destination.x, destination.y, destination.z
    );
    Ok(())
}

fn teleport_to(step: &Step<'_>, world: &mut dyn World, map_id: u32) -> Result<(), StepError> {
    let player = step.target_or_source(Expect::Player)?;
    let destination = step.info.position;
    world.apply(WorldEffect::Teleport {
        player,
        map_id,
        destination,
    })?;
    info!("└─ command: {} {player} to map {map_id}", step.command);
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn quest_explored(step: &Step<'_>, world: &mut dyn World, quest_id: u32, distance: u32) -> Result<(), StepError> {
    let player = step.target_or_source(Expect::Player)?;
    let other = [step.source, step.target]
        .into_iter()
        .flatten()
        .find(|guid| *guid != player && !guid.kind.is_player())
        .ok_or(StepError::MissingRole {
            command: step.command,
            role: "creature or gameobject",
        })?;

    let in_range = distance == 0 || {
        let from = step.position_of(&*world, other)?;
        let to = step.position_of(&*world, player)?;
        from.distance(&to) <= distance as f32
    };
    if in_range {
        world.apply(WorldEffect::AreaExplored { player, quest_id })?;
        info!("└─ command: {} quest {quest_id} explored by {player}", step.command);
    } else {
        world.apply(WorldEffect::FailQuest { player, quest_id })?;
        info!("└─ command: {} {player} too far, quest {quest_id} failed", step.command);
    }
    Ok(())
}

fn kill_credit(step: &Step<'_>, world: &mut dyn World, creature_entry: u32, group: bool) -> Result<(), StepError> {
    let player = step.target_or_source(Expect::Player)?;
    world.apply(WorldEffect::KillCredit {
        player,
        creature_entry,
        group,
    })?;
    info!("└─ command: {} {player} credited for {creature_entry} (group: {group})", step.command);
    Ok(())
}

fn gameobject_by_db_guid(step: &Step<'_>, world: &dyn World, db_guid: u32) -> Result<ObjectGuid, StepError> {
    world
        .find_by_db_guid(BuddyKind::GameObject, db_guid)
        .ok_or(StepError::DbGuidNotFound {
            command: step.command,
            db_guid,
        })
}

fn respawn_gameobject(step: &Step<'_>, world: &mut dyn World, db_guid: u32, despawn_delay: i32) -> Result<(), StepError> {
    let gameobject = gameobject_by_db_guid(step, &*world, db_guid)?;
    world.apply(WorldEffect::RespawnGameObject {
        gameobject,
        despawn_delay,
    })?;
    info!("└─ command: {} respawning {gameobject} (despawn in {despawn_delay}s)", step.command);
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn temp_summon(
    step: &Step<'_>,
    world: &mut dyn World,
    creature_entry: u32,
    despawn_delay: u32,
    (unique_limit, unique_distance): (u32, u32),
    active: bool,
) -> Result<(), StepError> {
    let summoner = step.source(Expect::Any)?;
    if unique_limit != 0 {
        let nearby = world.count_nearby(summoner, creature_entry, unique_distance as f32);
        if nearby >= unique_limit as usize {
            info!(
                "└─ command: {} skipped, {nearby} of {creature_entry} already within {unique_distance}",
                step.command
            );
            return Ok(());
        }
    }
    world.apply(WorldEffect::SummonCreature {
        summoner,
        creature_entry,
        position: step.info.position,
        despawn_delay,
        active,
    })?;
    info!("└─ command: {} {summoner} summons {creature_entry}", step.command);
    Ok(())
}

fn use_door(step: &Step<'_>, world: &mut dyn World, db_guid: u32, reset_delay: i32, open: bool) -> Result<(), StepError> {
    let door = gameobject_by_db_guid(step, &*world, db_guid)?;
    world.apply(WorldEffect::UseDoor {
        door,
        open,
        reset_delay,
    })?;
    info!("└─ command: {} {door} (reset after {reset_delay}s)", step.command);
    Ok(())
}

fn activate_object(step: &Step<'_>, world: &mut dyn World) -> Result<(), StepError> {
    let activator = step.source(Expect::Unit)?;
    let gameobject = step.target(Expect::GameObject)?;
    world.apply(WorldEffect::ActivateObject { gameobject, activator })?;
    info!("└─ command: {} {activator} activates {gameobject}", step.command);
    Ok(())
}

fn remove_aura(step: &Step<'_>, world: &mut dyn World, spell_id: u32, from_source: bool) -> Result<(), StepError> {
    let entity = if from_source {
        step.source(Expect::Unit)?
    } else {
        step.target(Expect::Unit)?
    };
    world.apply(WorldEffect::RemoveAura { entity, spell_id })?;
    info!("└─ command: {} aura {spell_id} removed from {entity}", step.command);
    Ok(())
}

fn cast_spell(
    step: &Step<'_>,
    world: &mut dyn World,
    spell_id: u32,
    direction: CastDirection,
    triggered: bool,
    interrupt_previous: bool,
) -> Result<(), StepError> {
    let (caster, target) = match direction {
        CastDirection::SourceToTarget => (step.source(Expect::Unit)?, step.target(Expect::Any)?),
        CastDirection::SourceToSource => {
            let s = step.source(Expect::Unit)?;
            (s, s)
        },
        CastDirection::TargetToTarget => {
            let t = step.target(Expect::Unit)?;
            (t, t)
        },
        CastDirection::TargetToSource => (step.target(Expect::Unit)?, step.source(Expect::Any)?),
    };
    world.apply(WorldEffect::CastSpell {
        caster,
        target,
        spell_id,
        triggered,
        interrupt_previous,
    })?;
    info!("└─ command: {} {caster} casts {spell_id} at {target}", step.command);
    Ok(())
}

fn play_sound(
    step: &Step<'_>,
    world: &mut dyn World,
    sound_id: u32,
    target_only: bool,
    distance_dependent: bool,
) -> Result<(), StepError> {
    let source = step.source(Expect::Any)?;
    let listener = if target_only {
        Some(step.target(Expect::Player)?)
    } else {
        None
    };
    world.apply(WorldEffect::PlaySound {
        source,
        sound_id,
        listener,
        distance_dependent,
    })?;
    info!("└─ command: {} {source} plays sound {sound_id}", step.command);
    Ok(())
}

fn create_item(step: &Step<'_>, world: &mut dyn World, item_entry: u32, amount: u32) -> Result<(), StepError> {
    let player = step.target_or_source(Expect::Player)?;
    world.apply(WorldEffect::CreateItem {
        player,
        item_entry,
        amount,
    })?;
    info!("└─ command: {} {amount}x {item_entry} for {player}", step.command);
    Ok(())
}

fn despawn_self(step: &Step<'_>, world: &mut dyn World, delay_ms: u32) -> Result<(), StepError> {
    let entity = step.source_or_target(Expect::Creature)?;
    world.apply(WorldEffect::Despawn { entity, delay_ms })?;
    info!("└─ command: {} {entity} despawns in {delay_ms}ms", step.command);
    Ok(())
}

fn play_movie(step: &Step<'_>, world: &mut dyn World, movie_id: u32) -> Result<(), StepError> {
    let player = step.target(Expect::Player)?;
    world.apply(WorldEffect::PlayMovie { player, movie_id })?;
    info!("└─ command: {} movie {movie_id} for {player}", step.command);
    Ok(())
}

fn movement(
    step: &Step<'_>,
    world: &mut dyn World,
    movement_type: MovementType,
    around_current: bool,
) -> Result<(), StepError> {
    let creature = step.source_or_target(Expect::Creature)?;
    world.apply(WorldEffect::SetMovement {
        creature,
        movement_type,
        around_current,
    })?;
    info!("└─ command: {} {creature} now uses {movement_type:?} movement", step.command);
    Ok(())
}

fn set_active_object(step: &Step<'_>, world: &mut dyn World, active: bool) -> Result<(), StepError> {
    let entity = step.source(Expect::Creature)?;
    world.apply(WorldEffect::SetActive { entity, active })?;
    info!("└─ command: {} {entity} active = {active}", step.command);
    Ok(())
}

fn set_faction(step: &Step<'_>, world: &mut dyn World, faction_id: u32) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::SetFaction { creature, faction_id })?;
    if faction_id == 0 {
        info!("└─ command: {} {creature} faction restored", step.command);
    } else {
        info!("└─ command: {} {creature} faction = {faction_id}", step.command);
    }
    Ok(())
}

fn morph_or_mount(
    step: &Step<'_>,
    world: &mut dyn World,
    entry_or_model: u32,
    is_model: bool,
    mount: bool,
) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    let display = match (entry_or_model, is_model) {
        (0, _) => DisplayChange::Restore,
        (model, true) => DisplayChange::Model(model),
        (entry, false) => DisplayChange::Entry(entry),
    };
    let effect = if mount {
        WorldEffect::Mount { creature, display }
    } else {
        WorldEffect::Morph { creature, display }
    };
    world.apply(effect)?;
    info!("└─ command: {} {creature} {display:?}", step.command);
    Ok(())
}

fn set_run(step: &Step<'_>, world: &mut dyn World, run: bool) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::SetRun { creature, run })?;
    info!("└─ command: {} {creature} run = {run}", step.command);
    Ok(())
}

fn attack_start(step: &Step<'_>, world: &mut dyn World) -> Result<(), StepError> {
    let attacker = step.source(Expect::Creature)?;
    let victim = step.target(Expect::Unit)?;
    world.apply(WorldEffect::AttackStart { attacker, victim })?;
    info!("└─ command: {} {attacker} attacks {victim}", step.command);
    Ok(())
}

fn go_lock_state(step: &Step<'_>, world: &mut dyn World, lock_state: GoLockFlags) -> Result<(), StepError> {
    let gameobject = step.source(Expect::GameObject)?;
    world.apply(WorldEffect::SetGoLockState { gameobject, lock_state })?;
    info!("└─ command: {} {gameobject} {lock_state:?}", step.command);
    Ok(())
}

fn stand_state(step: &Step<'_>, world: &mut dyn World, stand_state: u32) -> Result<(), StepError> {
    let entity = step.source(Expect::Unit)?;
    world.apply(WorldEffect::SetStandState { entity, stand_state })?;
    info!("└─ command: {} {entity} stand state {stand_state}", step.command);
    Ok(())
}

fn modify_npc_flags(step: &Step<'_>, world: &mut dyn World, flags: u32, op: NpcFlagOp) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::ModifyNpcFlags { creature, flags, op })?;
    info!("└─ command: {} {creature} {op:?} {flags:#x}", step.command);
    Ok(())
}

fn send_taxi_path(step: &Step<'_>, world: &mut dyn World, path_id: u32) -> Result<(), StepError> {
    let player = step.target_or_source(Expect::Player)?;
    world.apply(WorldEffect::SendTaxiPath { player, path_id })?;
    info!("└─ command: {} {player} on taxi path {path_id}", step.command);
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn terminate_script(
    step: &Step<'_>,
    world: &mut dyn World,
    npc_entry: u32,
    search_distance: u32,
    waypoint_wait_diff: i32,
    terminate_if_found: bool,
) -> Result<StepOutcome, StepError> {
    let terminate = if npc_entry == 0 {
        true
    } else {
        let Some(searcher) = step.source.or(step.target) else {
            return Err(StepError::MissingRole {
                command: step.command,
                role: "searcher",
            });
        };
        let query = BuddyQuery {
            kind: BuddyKind::Creature,
            entry: npc_entry,
            radius: search_distance as f32,
            include_dead: false,
        };
        let found = world.find_nearest(searcher, &query).is_some();
        found == terminate_if_found
    };
    if !terminate {
        info!("└─ command: {} script {} continues", step.command, step.info.id);
        return Ok(StepOutcome::Continue);
    }

    // the wait shift is secondary, the script terminates either way
    if waypoint_wait_diff != 0 {
        let adjusted = step.source(Expect::Creature).and_then(|creature| {
            world.apply(WorldEffect::AdjustWaypointWait {
                creature,
                diff_ms: waypoint_wait_diff,
            })?;
            Ok(())
        });
        if let Err(e) = adjusted {
            warn!("{}: waypoint wait not adjusted: {e}", step.command);
        }
    }
    info!("└─ command: {} script {} terminated", step.command, step.info.id);
    Ok(StepOutcome::Terminate)
}

fn pause_waypoints(step: &Step<'_>, world: &mut dyn World, pause: bool) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::PauseWaypoints { creature, pause })?;
    info!("└─ command: {} {creature} waypoints paused = {pause}", step.command);
    Ok(())
}

fn terminate_cond(
    step: &Step<'_>,
    world: &mut dyn World,
    condition_id: u32,
    fail_quest: u32,
    terminate_when_false: bool,
) -> Result<StepOutcome, StepError> {
    let met = world.condition_met(condition_id, step.source, step.target);
    if met == terminate_when_false {
        info!("└─ command: {} condition {condition_id} = {met}, continuing", step.command);
        return Ok(StepOutcome::Continue);
    }

    if fail_quest != 0 {
        let failed = step.target_or_source(Expect::Player).and_then(|player| {
            world.apply(WorldEffect::FailQuest {
                player,
                quest_id: fail_quest,
            })?;
            Ok(())
        });
        if let Err(e) = failed {
            warn!("{}: quest {fail_quest} not failed: {e}", step.command);
        }
    }
    info!(
        "└─ command: {} condition {condition_id} = {met}, script {} terminated",
        step.command, step.info.id
    );
    Ok(StepOutcome::Terminate)
}

fn send_ai_event(step: &Step<'_>, world: &mut dyn World, event_type: u32, radius: u32) -> Result<(), StepError> {
    let sender = step.source(Expect::Creature)?;
    let invoker = step.target(Expect::Unit)?;
    world.apply(WorldEffect::SendAiEvent {
        sender,
        invoker,
        event_type,
        radius,
    })?;
    info!("└─ command: {} {sender} sends event {event_type} (radius {radius})", step.command);
    Ok(())
}

fn set_facing(step: &Step<'_>, world: &mut dyn World, reset: bool, lock_target: bool) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    let facing = if reset {
        Facing::Reset
    } else if lock_target {
        Facing::Toward {
            target: step.target(Expect::Unit)?,
            lock_target,
        }
    } else if let Some(target) = step.target {
        Facing::Toward {
            target,
            lock_target: false,
        }
    } else {
        Facing::Orientation(step.info.position.o)
    };
    world.apply(WorldEffect::SetFacing { creature, facing })?;
    info!("└─ command: {} {creature} {facing:?}", step.command);
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn move_dynamic(
    step: &Step<'_>,
    world: &mut dyn World,
    rng: &mut StdRng,
    max_dist: u32,
    min_dist: u32,
    relative_to_target: bool,
) -> Result<(), StepError> {
    let entity = step.source(Expect::Creature)?;
    let anchor = step.target(Expect::Any)?;
    let center = step.position_of(&*world, anchor)?;

    let destination = if max_dist == 0 {
        center
    } else {
        let distance = rng.random_range(min_dist.min(max_dist) as f32..=max_dist as f32);
        let angle = if relative_to_target {
            center.o + step.info.position.o
        } else if step.info.position.o != 0.0 {
            step.info.position.o
        } else {
            rng.random_range(0.0..std::f32::consts::TAU)
        };
        Position::new(
            center.x + distance * angle.cos(),
            center.y + distance * angle.sin(),
            center.z,
            center.o,
        )
    };
    world.apply(WorldEffect::MoveTo {
        entity,
        destination,
        travel_time: 0,
    })?;
    info!(
        "└─ command: {} {entity} moving around {anchor} to ({:.1}, {:.1})",
        step.command, destination.x, destination.y
    );
    Ok(())
}

fn send_mail(
    step: &Step<'_>,
    world: &mut dyn World,
    template_id: u32,
    alt_sender: u32,
    delay_secs: i32,
) -> Result<(), StepError> {
    let player = step.target(Expect::Player)?;
    let sender = step.source.filter(|s| *s != player);
    world.apply(WorldEffect::SendMail {
        sender,
        player,
        template_id,
        alt_sender,
        delay_secs: u32::try_from(delay_secs).unwrap_or_default(),
    })?;
    info!("└─ command: {} mail template {template_id} to {player}", step.command);
    Ok(())
}

fn set_fly(step: &Step<'_>, world: &mut dyn World, fly: bool, always_stand: bool) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::SetFly {
        creature,
        fly,
        always_stand,
    })?;
    info!("└─ command: {} {creature} fly = {fly}", step.command);
    Ok(())
}

fn despawn_gameobject(step: &Step<'_>, world: &mut dyn World) -> Result<(), StepError> {
    let gameobject = step.target(Expect::GameObject)?;
    world.apply(WorldEffect::DespawnGameObject { gameobject })?;
    info!("└─ command: {} {gameobject} despawned", step.command);
    Ok(())
}

fn respawn(step: &Step<'_>, world: &mut dyn World) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::Respawn { creature })?;
    info!("└─ command: {} {creature} respawned", step.command);
    Ok(())
}

fn set_equipment(step: &Step<'_>, world: &mut dyn World, reset_default: bool, slots: [i32; 3]) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::SetEquipment {
        creature,
        reset_default,
        slots,
    })?;
    info!("└─ command: {} {creature} equipment {slots:?} (reset: {reset_default})", step.command);
    Ok(())
}

fn reset_gameobject(step: &Step<'_>, world: &mut dyn World) -> Result<(), StepError> {
    let gameobject = step.target(Expect::GameObject)?;
    world.apply(WorldEffect::ResetGameObject { gameobject })?;
    info!("└─ command: {} {gameobject} reset", step.command);
    Ok(())
}

fn update_template(step: &Step<'_>, world: &mut dyn World, entry: u32, team: Team) -> Result<(), StepError> {
    let creature = step.source(Expect::Creature)?;
    world.apply(WorldEffect::UpdateTemplate { creature, entry, team })?;
    info!("└─ command: {} {creature} now uses template {entry} ({team:?})", step.command);
    Ok(())
}
