//! In-memory reference world.
//!
//! `SimWorld` keeps a flat table of entities and records every effect it accepts. The binary
//! uses it for dry runs of the loaded tables and the tests use it to observe what scripts do.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};

use dbscript_data::{BuddyKind, Position};

use crate::guid::{EntityKind, ObjectGuid};
use crate::world::{BuddyQuery, EffectError, EntityInfo, LifeState, World, WorldEffect};

/// Simple world state for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    pub entities: BTreeMap<ObjectGuid, EntityInfo>,
    /// Unit fields touched by `FIELD_SET` / `FLAG_SET` / `FLAG_REMOVE`.
    pub fields: HashMap<(ObjectGuid, u32), u32>,
    /// Outcome of external conditions; unknown ids evaluate to false.
    pub conditions: HashMap<u32, bool>,
    /// Spells that always fail to cast.
    pub failing_spells: HashSet<u32>,
    /// Accepted effects, in application order.
    pub effects: Vec<WorldEffect>,
    next_counter: u32,
}

impl SimWorld {
    pub fn new() -> Self {
        let world = Self {
            next_counter: 1,
            ..Self::default()
        };
        info!("new, empty 'SimWorld' created");
        world
    }

    /// Add an entity with a fresh counter and return its guid.
    pub fn spawn(&mut self, kind: EntityKind, entry: u32, position: Position) -> ObjectGuid {
        let guid = ObjectGuid::new(kind, entry, self.bump_counter());
        self.entities.insert(guid, EntityInfo::new(guid, position));
        guid
    }

    /// Add a fully specified entity.
    pub fn insert(&mut self, info: EntityInfo) {
        self.next_counter = self.next_counter.max(info.guid.counter + 1);
        self.entities.insert(info.guid, info);
    }

    pub fn get_mut(&mut self, guid: ObjectGuid) -> Option<&mut EntityInfo> {
        self.entities.get_mut(&guid)
    }

    /// Remove an entity from the world entirely.
    pub fn remove(&mut self, guid: ObjectGuid) -> Option<EntityInfo> {
        self.entities.remove(&guid)
    }

    pub fn set_state(&mut self, guid: ObjectGuid, state: LifeState) {
        if let Some(entity) = self.entities.get_mut(&guid) {
            entity.state = state;
        }
    }

    pub fn set_condition(&mut self, condition_id: u32, value: bool) {
        self.conditions.insert(condition_id, value);
    }

    pub fn field(&self, guid: ObjectGuid, field: u32) -> u32 {
        self.fields.get(&(guid, field)).copied().unwrap_or_default()
    }

    /// Recorded effects and clears the log.
    pub fn take_effects(&mut self) -> Vec<WorldEffect> {
        std::mem::take(&mut self.effects)
    }

    fn bump_counter(&mut self) -> u32 {
        let counter = self.next_counter.max(1);
        self.next_counter = counter + 1;
        counter
    }

    fn require(&mut self, guid: ObjectGuid) -> Result<&mut EntityInfo, EffectError> {
        self.entities.get_mut(&guid).ok_or(EffectError::EntityNotFound(guid))
    }

    fn require_kind(&mut self, guid: ObjectGuid, kind: EntityKind, action: &'static str) -> Result<(), EffectError> {
        let entity = self.require(guid)?;
        if entity.guid.kind == kind {
            Ok(())
        } else {
            Err(EffectError::Unsupported { entity: guid, action })
        }
    }

    fn position_of(&self, guid: ObjectGuid) -> Option<Position> {
        self.entities.get(&guid).map(|e| e.position)
    }
}

impl World for SimWorld {
    fn entity(&self, guid: ObjectGuid) -> Option<EntityInfo> {
        self.entities.get(&guid).cloned()
    }

    fn find_nearest(&self, origin: ObjectGuid, query: &BuddyQuery) -> Option<ObjectGuid> {
        let from = self.position_of(origin)?;
        self.entities
            .values()
            .filter(|e| e.guid != origin)
            .filter(|e| e.guid.kind.matches_buddy(query.kind) && e.guid.entry == query.entry)
            .filter(|e| query.include_dead || e.is_alive())
            .map(|e| (e.position.distance(&from), e.guid))
            .filter(|(dist, _)| *dist <= query.radius)
            // BTreeMap iteration is ordered by guid, so ties keep the lowest guid
            .fold(None, |best: Option<(f32, ObjectGuid)>, candidate| match best {
                Some(current) if current.0 <= candidate.0 => Some(current),
                _ => Some(candidate),
            })
            .map(|(_, guid)| guid)
    }

    fn find_by_db_guid(&self, kind: BuddyKind, db_guid: u32) -> Option<ObjectGuid> {
        self.entities
            .values()
            .find(|e| e.db_guid == db_guid && e.guid.kind.matches_buddy(kind))
            .map(|e| e.guid)
    }

    fn count_nearby(&self, origin: ObjectGuid, entry: u32, radius: f32) -> usize {
        let Some(from) = self.position_of(origin) else {
            return 0;
        };
        self.entities
            .values()
            .filter(|e| e.guid.kind.is_creature() && e.guid.entry == entry && e.is_alive())
            .filter(|e| e.position.distance(&from) <= radius)
            .count()
    }

    fn condition_met(&self, condition_id: u32, _source: Option<ObjectGuid>, _target: Option<ObjectGuid>) -> bool {
        self.conditions.get(&condition_id).copied().unwrap_or(false)
    }

    fn apply(&mut self, effect: WorldEffect) -> Result<(), EffectError> {
        match &effect {
            WorldEffect::SetField { entity, field, value } => {
                self.require(*entity)?;
                self.fields.insert((*entity, *field), *value);
            },
            WorldEffect::SetFlag { entity, field, mask } => {
                self.require(*entity)?;
                *self.fields.entry((*entity, *field)).or_default() |= *mask;
            },
            WorldEffect::RemoveFlag { entity, field, mask } => {
                self.require(*entity)?;
                *self.fields.entry((*entity, *field)).or_default() &= !*mask;
            },
            WorldEffect::MoveTo {
                entity, destination, ..
            } => {
                self.require(*entity)?.position = *destination;
            },
            WorldEffect::Teleport {
                player, destination, ..
            } => {
                self.require_kind(*player, EntityKind::Player, "teleport")?;
                self.require(*player)?.position = *destination;
            },
            WorldEffect::CastSpell { caster, target, spell_id, .. } => {
                self.require(*caster)?;
                self.require(*target)?;
                if self.failing_spells.contains(spell_id) {
                    return Err(EffectError::SpellFailed {
                        spell_id: *spell_id,
                        reason: "spell marked as failing".into(),
                    });
                }
            },
            WorldEffect::SummonCreature {
                creature_entry,
                position,
                summoner,
                ..
            } => {
                self.require(*summoner)?;
                let guid = self.spawn(EntityKind::Creature, *creature_entry, *position);
                debug!("summoned {guid}");
            },
            WorldEffect::Despawn { entity, .. } => {
                self.require(*entity)?.state = LifeState::Despawned;
            },
            WorldEffect::DespawnGameObject { gameobject } => {
                self.require_kind(*gameobject, EntityKind::GameObject, "despawn as gameobject")?;
                self.require(*gameobject)?.state = LifeState::Despawned;
            },
            WorldEffect::RespawnGameObject { gameobject, .. } | WorldEffect::ResetGameObject { gameobject } => {
                self.require_kind(*gameobject, EntityKind::GameObject, "respawn as gameobject")?;
                self.require(*gameobject)?.state = LifeState::Alive;
            },
            WorldEffect::Respawn { creature } => {
                self.require_kind(*creature, EntityKind::Creature, "respawn as creature")?;
                self.require(*creature)?.state = LifeState::Alive;
            },
            WorldEffect::UseDoor { door, .. }
            | WorldEffect::ActivateObject { gameobject: door, .. }
            | WorldEffect::SetGoLockState { gameobject: door, .. } => {
                self.require_kind(*door, EntityKind::GameObject, "act as gameobject")?;
            },
            WorldEffect::Say { speaker, .. } => {
                self.require(*speaker)?;
            },
            WorldEffect::FailQuest { player, .. }
            | WorldEffect::AreaExplored { player, .. }
            | WorldEffect::KillCredit { player, .. }
            | WorldEffect::CreateItem { player, .. }
            | WorldEffect::PlayMovie { player, .. }
            | WorldEffect::SendTaxiPath { player, .. }
            | WorldEffect::SendMail { player, .. } => {
                self.require_kind(*player, EntityKind::Player, "receive player effects")?;
            },
            WorldEffect::UpdateTemplate { creature, entry, .. } => {
                self.require_kind(*creature, EntityKind::Creature, "change template")?;
                let entity = self.require(*creature)?;
                let new_guid = ObjectGuid::new(entity.guid.kind, *entry, entity.guid.counter);
                debug!("{creature} now uses template {entry} ({new_guid})");
            },
            WorldEffect::Emote { entity, .. }
            | WorldEffect::PlaySound { source: entity, .. }
            | WorldEffect::RemoveAura { entity, .. }
            | WorldEffect::SetMovement { creature: entity, .. }
            | WorldEffect::SetActive { entity, .. }
            | WorldEffect::SetFaction { creature: entity, .. }
            | WorldEffect::Morph { creature: entity, .. }
            | WorldEffect::Mount { creature: entity, .. }
            | WorldEffect::SetRun { creature: entity, .. }
            | WorldEffect::AttackStart { attacker: entity, .. }
            | WorldEffect::SetStandState { entity, .. }
            | WorldEffect::ModifyNpcFlags { creature: entity, .. }
            | WorldEffect::AdjustWaypointWait { creature: entity, .. }
            | WorldEffect::PauseWaypoints { creature: entity, .. }
            | WorldEffect::SendAiEvent { sender: entity, .. }
            | WorldEffect::SetFacing { creature: entity, .. }
            | WorldEffect::SetFly { creature: entity, .. }
            | WorldEffect::SetEquipment { creature: entity, .. } => {
                self.require(*entity)?;
            },
        }
        self.effects.push(effect);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32) -> Position {
        Position::new(x, 0.0, 0.0, 0.0)
    }

    #[test]
    fn nearest_prefers_closest_then_lowest_guid() {
        let mut world = SimWorld::new();
        let origin = world.spawn(EntityKind::Player, 0, at(0.0));
        let far = world.spawn(EntityKind::Creature, 100, at(10.0));
        let near_a = world.spawn(EntityKind::Creature, 100, at(5.0));
        let near_b = world.spawn(EntityKind::Creature, 100, at(-5.0));
        let query = BuddyQuery {
            kind: BuddyKind::Creature,
            entry: 100,
            radius: 20.0,
            include_dead: false,
        };
        assert_eq!(world.find_nearest(origin, &query), Some(near_a));

        world.set_state(near_a, LifeState::Dead);
        world.remove(near_b);
        assert_eq!(world.find_nearest(origin, &query), Some(far));
        let with_dead = BuddyQuery {
            include_dead: true,
            ..query
        };
        assert_eq!(world.find_nearest(origin, &with_dead), Some(near_a));
    }

    #[test]
    fn nearest_respects_radius_and_kind() {
        let mut world = SimWorld::new();
        let origin = world.spawn(EntityKind::Creature, 1, at(0.0));
        world.spawn(EntityKind::GameObject, 100, at(3.0));
        world.spawn(EntityKind::Creature, 100, at(30.0));
        let query = BuddyQuery {
            kind: BuddyKind::Creature,
            entry: 100,
            radius: 20.0,
            include_dead: false,
        };
        assert_eq!(world.find_nearest(origin, &query), None);
    }

    #[test]
    fn flag_effects_update_fields() {
        let mut world = SimWorld::new();
        let npc = world.spawn(EntityKind::Creature, 1, at(0.0));
        world
            .apply(WorldEffect::SetFlag {
                entity: npc,
                field: 59,
                mask: 0b110,
            })
            .unwrap();
        world
            .apply(WorldEffect::RemoveFlag {
                entity: npc,
                field: 59,
                mask: 0b010,
            })
            .unwrap();
        assert_eq!(world.field(npc, 59), 0b100);
        assert_eq!(world.effects.len(), 2);
    }

    #[test]
    fn failing_spell_is_not_recorded() {
        let mut world = SimWorld::new();
        let npc = world.spawn(EntityKind::Creature, 1, at(0.0));
        world.failing_spells.insert(99);
        let err = world
            .apply(WorldEffect::CastSpell {
                caster: npc,
                target: npc,
                spell_id: 99,
                triggered: false,
                interrupt_previous: false,
            })
            .unwrap_err();
        assert!(matches!(err, EffectError::SpellFailed { spell_id: 99, .. }));
        assert!(world.effects.is_empty());
    }

    #[test]
    fn player_effects_need_a_player() {
        let mut world = SimWorld::new();
        let npc = world.spawn(EntityKind::Creature, 1, at(0.0));
        let err = world
            .apply(WorldEffect::KillCredit {
                player: npc,
                creature_entry: 5,
                group: false,
            })
            .unwrap_err();
        assert!(matches!(err, EffectError::Unsupported { .. }));
    }
}
