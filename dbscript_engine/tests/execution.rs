use std::collections::HashMap;
use std::sync::Arc;

use dbscript_data::{CommandId, DataFlags, Position, ScriptInfo, ScriptRow, ScriptTable, ScriptTextRow};
use dbscript_engine as de;
use de::*;

fn info(row: ScriptRow) -> ScriptInfo {
    ScriptInfo::from_row(&row).unwrap()
}

fn row(delay: u32, command: CommandId) -> ScriptRow {
    ScriptRow {
        id: 1,
        delay,
        command: command as u32,
        ..ScriptRow::default()
    }
}

fn field_set(delay: u32, field: u32, flags: DataFlags) -> ScriptInfo {
    info(ScriptRow {
        datalong: field,
        datalong2: 1,
        data_flags: flags.bits(),
        ..row(delay, CommandId::FieldSet)
    })
}

fn set_fields(effects: &[WorldEffect]) -> Vec<(ObjectGuid, u32)> {
    effects
        .iter()
        .filter_map(|e| match e {
            WorldEffect::SetField { entity, field, .. } => Some((*entity, *field)),
            _ => None,
        })
        .collect()
}

struct Fixture {
    engine: ScriptEngine,
    world: SimWorld,
    texts: ScriptTexts,
    npc: ObjectGuid,
    player: ObjectGuid,
}

impl Fixture {
    fn new() -> Self {
        let mut world = SimWorld::new();
        let npc = world.spawn(EntityKind::Creature, 3000, Position::new(0.0, 0.0, 0.0, 0.0));
        let player = world.spawn(EntityKind::Player, 0, Position::new(5.0, 0.0, 0.0, 0.0));
        Self {
            engine: ScriptEngine::seeded(7),
            world,
            texts: ScriptTexts::default(),
            npc,
            player,
        }
    }

    fn fire(&mut self, commands: Vec<ScriptInfo>) -> bool {
        self.fire_as(commands, Some(self.npc), Some(self.player))
    }

    fn fire_as(&mut self, commands: Vec<ScriptInfo>, source: Option<ObjectGuid>, target: Option<ObjectGuid>) -> bool {
        self.engine
            .fire(ScriptTable::Event, 1, Arc::from(commands), source, target, 0, &self.world)
    }

    fn run_until(&mut self, now_ms: u64) -> Vec<WorldEffect> {
        self.engine.update(now_ms, &mut self.world, &self.texts);
        self.world.take_effects()
    }
}

#[test]
fn commands_run_in_stable_delay_order() {
    let mut fx = Fixture::new();
    fx.fire(vec![
        field_set(200, 1, DataFlags::empty()),
        field_set(0, 2, DataFlags::empty()),
        field_set(200, 3, DataFlags::empty()),
        field_set(100, 4, DataFlags::empty()),
        field_set(0, 5, DataFlags::empty()),
    ]);
    let order: Vec<u32> = set_fields(&fx.run_until(1_000)).into_iter().map(|(_, f)| f).collect();
    assert_eq!(order, vec![2, 5, 4, 1, 3]);
}

#[test]
fn reverse_direction_and_self_target_rewrite_roles() {
    let mut fx = Fixture::new();
    fx.fire(vec![
        field_set(0, 1, DataFlags::empty()),
        field_set(0, 2, DataFlags::REVERSE_DIRECTION),
        info(ScriptRow {
            datalong: 100,
            data_flags: DataFlags::SOURCE_TARGETS_SELF.bits(),
            ..row(0, CommandId::CastSpell)
        }),
    ]);
    let effects = fx.run_until(0);
    assert_eq!(set_fields(&effects), vec![(fx.npc, 1), (fx.player, 2)]);
    assert!(effects.iter().any(|e| matches!(
        e,
        WorldEffect::CastSpell { caster, target, spell_id: 100, .. } if *caster == fx.npc && *target == fx.npc
    )));
}

#[test]
fn buddy_replaces_source_or_target() {
    let mut fx = Fixture::new();
    let guard = fx.world.spawn(EntityKind::Creature, 3002, Position::new(10.0, 0.0, 0.0, 0.0));
    fx.fire(vec![
        info(ScriptRow {
            datalong: 1,
            datalong2: 1,
            buddy_entry: 3002,
            search_radius_or_guid: 20,
            ..row(0, CommandId::FieldSet)
        }),
        info(ScriptRow {
            datalong: 2,
            datalong2: 1,
            buddy_entry: 3002,
            search_radius_or_guid: 20,
            data_flags: (DataFlags::BUDDY_AS_TARGET | DataFlags::REVERSE_DIRECTION).bits(),
            ..row(0, CommandId::FieldSet)
        }),
        // out of range: skipped, the sequence goes on
        info(ScriptRow {
            datalong: 3,
            datalong2: 1,
            buddy_entry: 3002,
            search_radius_or_guid: 5,
            ..row(0, CommandId::FieldSet)
        }),
        field_set(0, 4, DataFlags::empty()),
    ]);
    let effects = fx.run_until(0);
    assert_eq!(set_fields(&effects), vec![(guard, 1), (guard, 2), (fx.npc, 4)]);
}

#[test]
fn despawning_the_source_stops_the_sequence() {
    let mut fx = Fixture::new();
    fx.fire(vec![
        field_set(0, 1, DataFlags::empty()),
        field_set(1_000, 2, DataFlags::empty()),
        field_set(2_000, 3, DataFlags::empty()),
    ]);
    assert_eq!(set_fields(&fx.run_until(500)).len(), 1);
    let counter = fx.engine.counter();
    assert_eq!(counter.get(), 1);

    fx.world.set_state(fx.npc, LifeState::Despawned);
    assert!(set_fields(&fx.run_until(5_000)).is_empty());
    assert_eq!(counter.get(), 0);
    assert_eq!(fx.engine.pending(), 0);
}

#[test]
fn removing_an_item_owner_cancels_item_scripts() {
    let mut fx = Fixture::new();
    let item = fx.world.spawn(EntityKind::Item, 6948, Position::default());
    if let Some(entity) = fx.world.get_mut(item) {
        entity.owner = Some(fx.player);
    }
    let commands: Vec<ScriptInfo> = vec![field_set(1_000, 1, DataFlags::REVERSE_DIRECTION)];
    assert!(fx.engine.fire(
        ScriptTable::Spell,
        8690,
        Arc::from(commands),
        Some(item),
        Some(fx.player),
        0,
        &fx.world
    ));
    assert_eq!(fx.engine.cancel_for(fx.player), 1);
    assert!(!fx.engine.counter().is_script_scheduled());
}

#[test]
fn talk_picks_uniformly_among_set_ids() {
    let mut fx = Fixture::new();
    let ids = [2_000_000_001, 2_000_000_002, 2_000_000_003];
    fx.texts = ScriptTexts::from_rows(ids.iter().map(|id| ScriptTextRow {
        entry: *id,
        content: format!("line {id}"),
        ..ScriptTextRow::default()
    }));
    let talk = info(ScriptRow {
        dataint: ids[0],
        dataint2: ids[1],
        dataint4: ids[2],
        ..row(0, CommandId::Talk)
    });

    let rounds = 3_000;
    for _ in 0..rounds {
        fx.fire(vec![talk.clone()]);
    }
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for effect in fx.run_until(0) {
        if let WorldEffect::Say { text_id, .. } = effect {
            *counts.entry(text_id).or_default() += 1;
        }
    }
    assert_eq!(counts.values().sum::<usize>(), rounds);
    assert_eq!(counts.len(), 3);
    for id in ids {
        let n = counts[&id];
        assert!((800..=1_200).contains(&n), "text {id} chosen {n} times");
    }
}

#[test]
fn terminate_script_checks_for_a_nearby_npc() {
    let terminate = |flags: DataFlags| {
        info(ScriptRow {
            datalong: 3002,
            datalong2: 20,
            dataint: 500,
            data_flags: flags.bits(),
            ..row(10, CommandId::TerminateScript)
        })
    };

    // no guard around: terminates and shifts the waypoint wait
    let mut fx = Fixture::new();
    fx.fire(vec![terminate(DataFlags::empty()), field_set(20, 1, DataFlags::empty())]);
    let effects = fx.run_until(100);
    assert!(set_fields(&effects).is_empty());
    assert!(effects.contains(&WorldEffect::AdjustWaypointWait {
        creature: fx.npc,
        diff_ms: 500
    }));

    // inverted: terminates only while the guard is near
    let mut fx = Fixture::new();
    fx.fire(vec![terminate(DataFlags::COMMAND_ADDITIONAL), field_set(20, 1, DataFlags::empty())]);
    assert_eq!(set_fields(&fx.run_until(100)).len(), 1);
    assert_eq!(fx.engine.counter().get(), 0);
}

#[test]
fn terminate_script_without_a_creature_source_still_terminates() {
    let mut fx = Fixture::new();
    let lever = fx.world.spawn(EntityKind::GameObject, 170_001, Position::default());
    fx.fire_as(
        vec![
            info(ScriptRow {
                dataint: 500,
                ..row(0, CommandId::TerminateScript)
            }),
            field_set(10, 42, DataFlags::REVERSE_DIRECTION),
        ],
        Some(lever),
        Some(fx.player),
    );
    let effects = fx.run_until(100);
    assert!(set_fields(&effects).is_empty());
    assert!(!effects.iter().any(|e| matches!(e, WorldEffect::AdjustWaypointWait { .. })));
    assert_eq!(fx.engine.counter().get(), 0);
}

#[test]
fn terminate_script_searches_from_the_target_when_there_is_no_source() {
    let commands = || {
        vec![
            info(ScriptRow {
                datalong: 3002,
                datalong2: 20,
                data_flags: DataFlags::COMMAND_ADDITIONAL.bits(),
                ..row(0, CommandId::TerminateScript)
            }),
            field_set(10, 42, DataFlags::REVERSE_DIRECTION),
        ]
    };

    // guard near the player: terminates
    let mut fx = Fixture::new();
    fx.world.spawn(EntityKind::Creature, 3002, Position::new(10.0, 0.0, 0.0, 0.0));
    let player = fx.player;
    fx.fire_as(commands(), None, Some(player));
    assert!(set_fields(&fx.run_until(100)).is_empty());

    // nobody around: the sequence goes on
    let mut fx = Fixture::new();
    let player = fx.player;
    fx.fire_as(commands(), None, Some(player));
    assert_eq!(set_fields(&fx.run_until(100)), vec![(player, 42)]);
}

#[test]
fn terminate_cond_without_a_player_still_terminates() {
    let mut fx = Fixture::new();
    fx.world.set_condition(9, true);
    let npc = fx.npc;
    fx.fire_as(
        vec![
            info(ScriptRow {
                datalong: 9,
                datalong2: 555,
                ..row(0, CommandId::TerminateCond)
            }),
            field_set(10, 42, DataFlags::empty()),
        ],
        Some(npc),
        None,
    );
    let effects = fx.run_until(100);
    assert!(set_fields(&effects).is_empty());
    assert!(!effects.iter().any(|e| matches!(e, WorldEffect::FailQuest { .. })));
    assert_eq!(fx.engine.counter().get(), 0);
}

#[test]
fn terminate_cond_fails_the_quest() {
    let mut fx = Fixture::new();
    fx.world.set_condition(42, true);
    fx.fire(vec![
        info(ScriptRow {
            datalong: 42,
            datalong2: 9010,
            ..row(0, CommandId::TerminateCond)
        }),
        field_set(10, 1, DataFlags::empty()),
    ]);
    let effects = fx.run_until(100);
    assert!(set_fields(&effects).is_empty());
    assert!(effects.contains(&WorldEffect::FailQuest {
        player: fx.player,
        quest_id: 9010
    }));

    let mut fx = Fixture::new();
    fx.fire(vec![
        info(ScriptRow {
            datalong: 42,
            ..row(0, CommandId::TerminateCond)
        }),
        field_set(10, 1, DataFlags::empty()),
    ]);
    assert_eq!(set_fields(&fx.run_until(100)).len(), 1);
}

#[test]
fn effect_failures_do_not_abort_the_sequence() {
    let mut fx = Fixture::new();
    fx.world.failing_spells.insert(100);
    fx.fire(vec![
        info(ScriptRow {
            datalong: 100,
            ..row(0, CommandId::CastSpell)
        }),
        // needs a gameobject target, gets a player
        info(row(0, CommandId::ResetGameObject)),
        field_set(0, 1, DataFlags::empty()),
    ]);
    let effects = fx.run_until(0);
    assert_eq!(set_fields(&effects), vec![(fx.npc, 1)]);
    assert_eq!(effects.len(), 1);
    assert_eq!(fx.engine.counter().get(), 0);
}

#[test]
fn summons_respect_the_unique_limit() {
    let mut fx = Fixture::new();
    let summon = info(ScriptRow {
        datalong: 3005,
        datalong2: 10_000,
        datalong3: 1,
        datalong4: 30,
        x: 1.0,
        y: 1.0,
        ..row(0, CommandId::TempSummonCreature)
    });
    fx.fire(vec![summon.clone()]);
    fx.fire(vec![summon]);
    let effects = fx.run_until(0);
    let summons = effects
        .iter()
        .filter(|e| matches!(e, WorldEffect::SummonCreature { creature_entry: 3005, .. }))
        .count();
    assert_eq!(summons, 1);
}
