//! Native script callbacks.
//!
//! Native scripts are bound by name. Storage references the names (creature and gameobject
//! templates, area triggers, events); each distinct name gets a sequential script id, with id 0
//! meaning "no script". A registered [`ScriptHooks`] implementation receives the calls for
//! entities whose template carries its id. Every hook returns `None` when it does not handle
//! the call and the registry substitutes the default.

use std::collections::HashMap;

use log::{debug, info, warn};

use dbscript_data::ScriptNamesDef;

use crate::guid::ObjectGuid;
use crate::world::World;

/// Dialog status returned when no script decides it.
pub const DIALOG_STATUS_UNDEFINED: u32 = 100;

/// Aura application passed to the aura dummy hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuraInfo {
    pub spell_id: u32,
    pub effect_index: u8,
    pub caster: Option<ObjectGuid>,
    pub holder: ObjectGuid,
}

/// Per-creature AI produced by a native script.
pub trait CreatureAi: Send {
    fn update(&mut self, _diff_ms: u32, _world: &mut dyn World) {}
    fn on_just_died(&mut self, _killer: Option<ObjectGuid>, _world: &mut dyn World) {}
    fn on_ai_event(&mut self, _event_type: u32, _sender: ObjectGuid, _invoker: ObjectGuid, _world: &mut dyn World) {}
}

/// Per-gameobject AI produced by a native script.
pub trait GameObjectAi: Send {
    fn update(&mut self, _diff_ms: u32, _world: &mut dyn World) {}
}

/// Per-map instance state produced by a native script.
pub trait InstanceData: Send {
    fn initialize(&mut self) {}
    fn data(&self, _kind: u32) -> u32 {
        0
    }
    fn set_data(&mut self, _kind: u32, _value: u32) {}
}

/// Callbacks a native script may handle. Every hook defaults to "not handled".
#[allow(unused_variables)]
pub trait ScriptHooks: Send + Sync {
    fn gossip_hello_creature(&self, world: &mut dyn World, player: ObjectGuid, creature: ObjectGuid) -> Option<bool> {
        None
    }
    fn gossip_hello_gameobject(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid) -> Option<bool> {
        None
    }
    fn gossip_select_creature(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        creature: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> Option<bool> {
        None
    }
    fn gossip_select_gameobject(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        go: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> Option<bool> {
        None
    }
    fn quest_accept_creature(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        creature: ObjectGuid,
        quest_id: u32,
    ) -> Option<bool> {
        None
    }
    fn quest_accept_gameobject(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        go: ObjectGuid,
        quest_id: u32,
    ) -> Option<bool> {
        None
    }
    fn quest_accept_item(&self, world: &mut dyn World, player: ObjectGuid, item: ObjectGuid, quest_id: u32) -> Option<bool> {
        None
    }
    fn quest_rewarded_creature(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        creature: ObjectGuid,
        quest_id: u32,
    ) -> Option<bool> {
        None
    }
    fn quest_rewarded_gameobject(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        go: ObjectGuid,
        quest_id: u32,
    ) -> Option<bool> {
        None
    }
    fn dialog_status_creature(&self, world: &mut dyn World, player: ObjectGuid, creature: ObjectGuid) -> Option<u32> {
        None
    }
    fn dialog_status_gameobject(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid) -> Option<u32> {
        None
    }
    fn gameobject_use(&self, world: &mut dyn World, user: ObjectGuid, go: ObjectGuid) -> Option<bool> {
        None
    }
    fn gameobject_open(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid) -> Option<bool> {
        None
    }
    fn item_use(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        item: ObjectGuid,
        target: Option<ObjectGuid>,
    ) -> Option<bool> {
        None
    }
    fn area_trigger(&self, world: &mut dyn World, player: ObjectGuid, trigger_id: u32) -> Option<bool> {
        None
    }
    fn process_event(
        &self,
        world: &mut dyn World,
        event_id: u32,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        is_start: bool,
    ) -> Option<bool> {
        None
    }
    fn effect_dummy_creature(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        creature: ObjectGuid,
    ) -> Option<bool> {
        None
    }
    /// A script-effect spell hit `creature`; `original_caster` is who started the spell.
    fn effect_script_effect_creature(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        creature: ObjectGuid,
        original_caster: ObjectGuid,
    ) -> Option<bool> {
        None
    }
    fn effect_dummy_gameobject(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        go: ObjectGuid,
    ) -> Option<bool> {
        None
    }
    fn effect_dummy_item(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        item: ObjectGuid,
    ) -> Option<bool> {
        None
    }
    fn aura_dummy(&self, world: &mut dyn World, aura: &AuraInfo, apply: bool) -> Option<bool> {
        None
    }
    fn creature_ai(&self, creature: ObjectGuid) -> Option<Box<dyn CreatureAi>> {
        None
    }
    fn gameobject_ai(&self, go: ObjectGuid) -> Option<Box<dyn GameObjectAi>> {
        None
    }
    fn instance_data(&self, map_id: u32) -> Option<Box<dyn InstanceData>> {
        None
    }
}

/// Name table plus the registered hook implementations.
#[derive(Default)]
pub struct ScriptRegistry {
    names: Vec<String>,
    ids: HashMap<String, u32>,
    hooks: HashMap<u32, Box<dyn ScriptHooks>>,
    area_triggers: HashMap<u32, u32>,
    events: HashMap<u32, u32>,
    instance_scripts: HashMap<u32, u32>,
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("names", &self.names)
            .field("registered", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self {
            names: vec![String::new()],
            ..Self::default()
        }
    }

    /// Registry pre-seeded with every name storage references.
    pub fn from_def(def: &ScriptNamesDef) -> Self {
        let mut registry = Self::new();
        for name in &def.names {
            registry.intern(name);
        }
        for binding in &def.area_triggers {
            let id = registry.intern(&binding.script_name);
            registry.area_triggers.insert(binding.id, id);
        }
        for binding in &def.events {
            let id = registry.intern(&binding.script_name);
            registry.events.insert(binding.id, id);
        }
        info!(
            "{} script names loaded ({} area triggers, {} events bound)",
            registry.script_ids_count() - 1,
            registry.area_triggers.len(),
            registry.events.len()
        );
        registry
    }

    /// Id of `name`, assigning the next free one when it is new. The empty name is id 0.
    fn intern(&mut self, name: &str) -> u32 {
        if self.names.is_empty() {
            self.names.push(String::new());
        }
        if name.is_empty() {
            return 0;
        }
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = u32::try_from(self.names.len()).unwrap_or(u32::MAX);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Bind `hooks` to `name`; returns the script id.
    pub fn register(&mut self, name: &str, hooks: Box<dyn ScriptHooks>) -> u32 {
        let known = self.ids.contains_key(name);
        let id = self.intern(name);
        if !known {
            warn!("script '{name}' is not referenced by any template or binding");
        }
        if self.hooks.insert(id, hooks).is_some() {
            warn!("script '{name}' registered twice, keeping the newer hooks");
        }
        debug!("script '{name}' registered as id {id}");
        id
    }

    /// Bind the instance script `name` to a map.
    pub fn bind_instance(&mut self, map_id: u32, name: &str) -> u32 {
        let id = self.intern(name);
        self.instance_scripts.insert(map_id, id);
        id
    }

    pub fn script_id(&self, name: &str) -> u32 {
        self.ids.get(name).copied().unwrap_or(0)
    }

    pub fn script_name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Number of ids, including the reserved id 0.
    pub fn script_ids_count(&self) -> usize {
        self.names.len().max(1)
    }

    pub fn area_trigger_script_id(&self, trigger_id: u32) -> u32 {
        self.area_triggers.get(&trigger_id).copied().unwrap_or(0)
    }

    pub fn event_id_script_id(&self, event_id: u32) -> u32 {
        self.events.get(&event_id).copied().unwrap_or(0)
    }

    pub fn is_registered(&self, id: u32) -> bool {
        self.hooks.contains_key(&id)
    }

    fn hooks_for_id(&self, id: u32) -> Option<&dyn ScriptHooks> {
        if id == 0 {
            return None;
        }
        self.hooks.get(&id).map(|hooks| &**hooks)
    }

    fn hooks_for(&self, world: &dyn World, guid: ObjectGuid) -> Option<&dyn ScriptHooks> {
        let id = world.entity(guid)?.script_id;
        self.hooks_for_id(id)
    }

    pub fn gossip_hello_creature(&self, world: &mut dyn World, player: ObjectGuid, creature: ObjectGuid) -> bool {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.gossip_hello_creature(world, player, creature))
            .unwrap_or(false)
    }

    pub fn gossip_hello_gameobject(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.gossip_hello_gameobject(world, player, go))
            .unwrap_or(false)
    }

    pub fn gossip_select_creature(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        creature: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> bool {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.gossip_select_creature(world, player, creature, sender, action, code))
            .unwrap_or(false)
    }

    pub fn gossip_select_gameobject(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        go: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.gossip_select_gameobject(world, player, go, sender, action, code))
            .unwrap_or(false)
    }

    pub fn quest_accept_creature(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        creature: ObjectGuid,
        quest_id: u32,
    ) -> bool {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.quest_accept_creature(world, player, creature, quest_id))
            .unwrap_or(false)
    }

    pub fn quest_accept_gameobject(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid, quest_id: u32) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.quest_accept_gameobject(world, player, go, quest_id))
            .unwrap_or(false)
    }

    pub fn quest_accept_item(&self, world: &mut dyn World, player: ObjectGuid, item: ObjectGuid, quest_id: u32) -> bool {
        self.hooks_for(&*world, item)
            .and_then(|h| h.quest_accept_item(world, player, item, quest_id))
            .unwrap_or(false)
    }

    pub fn quest_rewarded_creature(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        creature: ObjectGuid,
        quest_id: u32,
    ) -> bool {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.quest_rewarded_creature(world, player, creature, quest_id))
            .unwrap_or(false)
    }

    pub fn quest_rewarded_gameobject(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        go: ObjectGuid,
        quest_id: u32,
    ) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.quest_rewarded_gameobject(world, player, go, quest_id))
            .unwrap_or(false)
    }

    pub fn dialog_status_creature(&self, world: &mut dyn World, player: ObjectGuid, creature: ObjectGuid) -> u32 {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.dialog_status_creature(world, player, creature))
            .unwrap_or(DIALOG_STATUS_UNDEFINED)
    }

    pub fn dialog_status_gameobject(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid) -> u32 {
        self.hooks_for(&*world, go)
            .and_then(|h| h.dialog_status_gameobject(world, player, go))
            .unwrap_or(DIALOG_STATUS_UNDEFINED)
    }

    pub fn gameobject_use(&self, world: &mut dyn World, user: ObjectGuid, go: ObjectGuid) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.gameobject_use(world, user, go))
            .unwrap_or(false)
    }

    /// A player opened a gameobject (lock picking, chests).
    pub fn gameobject_open(&self, world: &mut dyn World, player: ObjectGuid, go: ObjectGuid) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.gameobject_open(world, player, go))
            .unwrap_or(false)
    }

    pub fn item_use(
        &self,
        world: &mut dyn World,
        player: ObjectGuid,
        item: ObjectGuid,
        target: Option<ObjectGuid>,
    ) -> bool {
        self.hooks_for(&*world, item)
            .and_then(|h| h.item_use(world, player, item, target))
            .unwrap_or(false)
    }

    pub fn area_trigger(&self, world: &mut dyn World, player: ObjectGuid, trigger_id: u32) -> bool {
        self.hooks_for_id(self.area_trigger_script_id(trigger_id))
            .and_then(|h| h.area_trigger(world, player, trigger_id))
            .unwrap_or(false)
    }

    pub fn process_event(
        &self,
        world: &mut dyn World,
        event_id: u32,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        is_start: bool,
    ) -> bool {
        self.hooks_for_id(self.event_id_script_id(event_id))
            .and_then(|h| h.process_event(world, event_id, source, target, is_start))
            .unwrap_or(false)
    }

    pub fn effect_dummy_creature(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        creature: ObjectGuid,
    ) -> bool {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.effect_dummy_creature(world, caster, spell_id, effect_index, creature))
            .unwrap_or(false)
    }

    pub fn effect_script_effect_creature(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        creature: ObjectGuid,
        original_caster: ObjectGuid,
    ) -> bool {
        self.hooks_for(&*world, creature)
            .and_then(|h| h.effect_script_effect_creature(world, caster, spell_id, effect_index, creature, original_caster))
            .unwrap_or(false)
    }

    pub fn effect_dummy_gameobject(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        go: ObjectGuid,
    ) -> bool {
        self.hooks_for(&*world, go)
            .and_then(|h| h.effect_dummy_gameobject(world, caster, spell_id, effect_index, go))
            .unwrap_or(false)
    }

    pub fn effect_dummy_item(
        &self,
        world: &mut dyn World,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: u8,
        item: ObjectGuid,
    ) -> bool {
        self.hooks_for(&*world, item)
            .and_then(|h| h.effect_dummy_item(world, caster, spell_id, effect_index, item))
            .unwrap_or(false)
    }

    /// Aura dummy dispatch goes to the script of the aura's holder.
    pub fn aura_dummy(&self, world: &mut dyn World, aura: &AuraInfo, apply: bool) -> bool {
        self.hooks_for(&*world, aura.holder)
            .and_then(|h| h.aura_dummy(world, aura, apply))
            .unwrap_or(false)
    }

    pub fn creature_ai(&self, world: &dyn World, creature: ObjectGuid) -> Option<Box<dyn CreatureAi>> {
        self.hooks_for(world, creature)?.creature_ai(creature)
    }

    pub fn gameobject_ai(&self, world: &dyn World, go: ObjectGuid) -> Option<Box<dyn GameObjectAi>> {
        self.hooks_for(world, go)?.gameobject_ai(go)
    }

    pub fn instance_data(&self, map_id: u32) -> Option<Box<dyn InstanceData>> {
        let id = self.instance_scripts.get(&map_id).copied()?;
        self.hooks_for_id(id)?.instance_data(map_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::EntityKind;
    use crate::sim::SimWorld;
    use dbscript_data::{Position, ScriptBindingRow};

    struct Greeter;

    impl ScriptHooks for Greeter {
        fn gossip_hello_creature(&self, _world: &mut dyn World, _player: ObjectGuid, _creature: ObjectGuid) -> Option<bool> {
            Some(true)
        }

        fn dialog_status_creature(&self, _world: &mut dyn World, _player: ObjectGuid, _creature: ObjectGuid) -> Option<u32> {
            Some(2)
        }

        fn area_trigger(&self, _world: &mut dyn World, _player: ObjectGuid, trigger_id: u32) -> Option<bool> {
            Some(trigger_id == 4_000)
        }
    }

    fn names() -> ScriptNamesDef {
        ScriptNamesDef {
            names: vec!["npc_greeter".into(), "go_lever".into(), "npc_greeter".into()],
            area_triggers: vec![ScriptBindingRow {
                id: 4_000,
                script_name: "npc_greeter".into(),
            }],
            events: vec![ScriptBindingRow {
                id: 77,
                script_name: "event_bells".into(),
            }],
        }
    }

    #[test]
    fn ids_are_sequential_and_zero_is_reserved() {
        let registry = ScriptRegistry::from_def(&names());
        assert_eq!(registry.script_name(0), Some(""));
        assert_eq!(registry.script_id("npc_greeter"), 1);
        assert_eq!(registry.script_id("go_lever"), 2);
        assert_eq!(registry.script_id("event_bells"), 3);
        assert_eq!(registry.script_id("unknown"), 0);
        assert_eq!(registry.script_ids_count(), 4);
        assert_eq!(registry.area_trigger_script_id(4_000), 1);
        assert_eq!(registry.event_id_script_id(77), 3);
        assert_eq!(registry.event_id_script_id(78), 0);
    }

    #[test]
    fn dispatch_uses_the_entity_script_and_defaults_otherwise() {
        let mut registry = ScriptRegistry::from_def(&names());
        let id = registry.register("npc_greeter", Box::new(Greeter));
        let mut world = SimWorld::new();
        let player = world.spawn(EntityKind::Player, 0, Position::default());
        let greeter = world.spawn(EntityKind::Creature, 100, Position::default());
        let plain = world.spawn(EntityKind::Creature, 101, Position::default());
        if let Some(entity) = world.get_mut(greeter) {
            entity.script_id = id;
        }

        assert!(registry.gossip_hello_creature(&mut world, player, greeter));
        assert_eq!(registry.dialog_status_creature(&mut world, player, greeter), 2);
        assert!(!registry.gossip_hello_creature(&mut world, player, plain));
        assert_eq!(
            registry.dialog_status_creature(&mut world, player, plain),
            DIALOG_STATUS_UNDEFINED
        );
        // hooks the script does not implement fall back too
        assert!(!registry.gameobject_use(&mut world, player, greeter));
        assert!(registry.creature_ai(&world, greeter).is_none());
        assert!(registry.area_trigger(&mut world, player, 4_000));
        assert!(!registry.area_trigger(&mut world, player, 4_001));
    }

    struct Chest;

    impl ScriptHooks for Chest {
        fn gameobject_open(&self, _world: &mut dyn World, _player: ObjectGuid, _go: ObjectGuid) -> Option<bool> {
            Some(true)
        }

        fn effect_script_effect_creature(
            &self,
            _world: &mut dyn World,
            caster: ObjectGuid,
            spell_id: u32,
            _effect_index: u8,
            _creature: ObjectGuid,
            original_caster: ObjectGuid,
        ) -> Option<bool> {
            Some(spell_id == 9_000 && caster == original_caster)
        }
    }

    #[test]
    fn open_and_script_effect_hooks_reach_the_bound_script() {
        let mut registry = ScriptRegistry::from_def(&names());
        let id = registry.register("go_lever", Box::new(Chest));
        let mut world = SimWorld::new();
        let player = world.spawn(EntityKind::Player, 0, Position::default());
        let lever = world.spawn(EntityKind::GameObject, 200, Position::default());
        let npc = world.spawn(EntityKind::Creature, 201, Position::default());
        for guid in [lever, npc] {
            if let Some(entity) = world.get_mut(guid) {
                entity.script_id = id;
            }
        }

        assert!(registry.gameobject_open(&mut world, player, lever));
        assert!(registry.effect_script_effect_creature(&mut world, player, 9_000, 0, npc, player));
        assert!(!registry.effect_script_effect_creature(&mut world, player, 9_000, 0, npc, lever));

        // unbound entities get the default
        let crate_go = world.spawn(EntityKind::GameObject, 202, Position::default());
        assert!(!registry.gameobject_open(&mut world, player, crate_go));
    }

    #[test]
    fn registering_an_unreferenced_name_still_gets_an_id() {
        let mut registry = ScriptRegistry::from_def(&names());
        let id = registry.register("npc_forgotten", Box::new(Greeter));
        assert_eq!(id, 4);
        assert!(registry.is_registered(id));
        assert_eq!(registry.script_name(id), Some("npc_forgotten"));
    }
}
