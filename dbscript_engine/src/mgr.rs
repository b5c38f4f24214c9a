//! The script manager: loaded tables plus the engine that runs them.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};

use dbscript_data::ScriptTable;

use crate::engine::{ScheduledScriptCounter, ScriptEngine};
use crate::guid::ObjectGuid;
use crate::loader::config::EngineConfig;
use crate::loader::scripts::LoadReport;
use crate::loader::{LoadedData, load_all, load_script_table};
use crate::registry::ScriptRegistry;
use crate::store::ScriptStore;
use crate::texts::{ScriptTexts, TextError, do_script_text};
use crate::waypoints::ScriptWaypoints;
use crate::world::World;

/// A world event that may start a script sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Trigger {
    QuestEnd(u32),
    QuestStart(u32),
    Spell(u32),
    /// A spawned gameobject was used, by persisted spawn id.
    GameObjectUse(u32),
    /// Any gameobject of a template was used, by template entry.
    GameObjectTemplate(u32),
    Event(u32),
    Gossip(u32),
    CreatureDeath(u32),
    CreatureMovement(u32),
}

impl Trigger {
    pub fn table(self) -> ScriptTable {
        match self {
            Trigger::QuestEnd(_) => ScriptTable::QuestEnd,
            Trigger::QuestStart(_) => ScriptTable::QuestStart,
            Trigger::Spell(_) => ScriptTable::Spell,
            Trigger::GameObjectUse(_) => ScriptTable::GameObject,
            Trigger::GameObjectTemplate(_) => ScriptTable::GameObjectTemplate,
            Trigger::Event(_) => ScriptTable::Event,
            Trigger::Gossip(_) => ScriptTable::Gossip,
            Trigger::CreatureDeath(_) => ScriptTable::CreatureDeath,
            Trigger::CreatureMovement(_) => ScriptTable::CreatureMovement,
        }
    }

    pub fn key(self) -> u32 {
        match self {
            Trigger::QuestEnd(key)
            | Trigger::QuestStart(key)
            | Trigger::Spell(key)
            | Trigger::GameObjectUse(key)
            | Trigger::GameObjectTemplate(key)
            | Trigger::Event(key)
            | Trigger::Gossip(key)
            | Trigger::CreatureDeath(key)
            | Trigger::CreatureMovement(key) => key,
        }
    }
}

/// Script tables, texts, bindings and the running engine.
#[derive(Debug)]
pub struct ScriptMgr {
    config: EngineConfig,
    store: ScriptStore,
    registry: ScriptRegistry,
    texts: ScriptTexts,
    waypoints: ScriptWaypoints,
    engine: ScriptEngine,
}

impl ScriptMgr {
    /// A manager with empty tables.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: ScriptStore::new(),
            registry: ScriptRegistry::new(),
            texts: ScriptTexts::default(),
            waypoints: ScriptWaypoints::default(),
            engine: ScriptEngine::new(),
        }
    }

    /// Load every table and auxiliary file named by `config`.
    ///
    /// # Errors
    /// Errors bubble up from file IO or deserialization of files that exist. Missing files
    /// leave their table empty.
    pub fn load(config: EngineConfig) -> Result<(Self, Vec<LoadReport>)> {
        let LoadedData {
            texts,
            names,
            waypoints,
            tables,
        } = load_all(&config).context("while loading script data")?;

        let mut mgr = Self::new(config);
        mgr.texts = texts;
        mgr.waypoints = waypoints;
        mgr.registry = ScriptRegistry::from_def(&names);

        let mut reports = Vec::with_capacity(tables.len());
        for (scripts, report) in tables {
            mgr.store.replace(report.table, scripts);
            reports.push(report);
        }
        info!(
            "script manager ready: {} commands in {} tables",
            reports.iter().map(LoadReport::loaded).sum::<usize>(),
            reports.len()
        );
        Ok((mgr, reports))
    }

    /// Replace the engine, e.g. with a seeded one.
    pub fn with_engine(mut self, engine: ScriptEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Fire the sequence bound to `trigger`; returns whether anything was scheduled.
    pub fn start_script(
        &mut self,
        trigger: Trigger,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        now_ms: u64,
        world: &dyn World,
    ) -> bool {
        let (table, key) = (trigger.table(), trigger.key());
        let commands = self.store.lookup(table, key);
        self.engine.fire(table, key, commands, source, target, now_ms, world)
    }

    /// Run everything due at `now_ms`; returns how many commands ran.
    pub fn update(&mut self, now_ms: u64, world: &mut dyn World) -> usize {
        self.engine.update(now_ms, world, &self.texts)
    }

    /// Drop the pending scripts of an entity that died or left the world.
    pub fn on_entity_removed(&mut self, guid: ObjectGuid) -> usize {
        self.engine.cancel_for(guid)
    }

    /// Reload one table from its file.
    ///
    /// Follows the same rules as the initial load, so a table without a file comes back
    /// empty. Actions already running keep the sequence they started with. On any error the
    /// old table stays active.
    ///
    /// # Errors
    /// Returns an error if an existing table file cannot be read or parsed.
    pub fn reload(&self, table: ScriptTable) -> Result<LoadReport> {
        match load_script_table(&self.config, table, &self.texts) {
            Ok((scripts, report)) => {
                self.store.replace(table, scripts);
                info!("reloaded {table}: {} commands", report.loaded());
                Ok(report)
            },
            Err(e) => {
                error!("reload of {table} failed, keeping the loaded scripts: {e:#}");
                Err(e)
            },
        }
    }

    /// Reload every table. A failing table keeps its old contents and does not stop the others.
    pub fn reload_all(&self) -> Vec<(ScriptTable, Result<LoadReport>)> {
        ScriptTable::ALL
            .into_iter()
            .map(|table| (table, self.reload(table)))
            .collect()
    }

    /// Speak a text through the world, with its own sound, emote and chat type.
    ///
    /// # Errors
    /// See [`do_script_text`].
    pub fn do_script_text(
        &self,
        entry: i32,
        source: ObjectGuid,
        target: Option<ObjectGuid>,
        world: &mut dyn World,
    ) -> Result<(), TextError> {
        do_script_text(&self.texts, entry, source, target, world)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.registry
    }

    pub fn texts(&self) -> &ScriptTexts {
        &self.texts
    }

    pub fn waypoints(&self) -> &ScriptWaypoints {
        &self.waypoints
    }

    pub fn engine(&self) -> &ScriptEngine {
        &self.engine
    }

    pub fn counter(&self) -> Arc<ScheduledScriptCounter> {
        self.engine.counter()
    }

    pub fn is_script_scheduled(&self) -> bool {
        self.engine.counter().is_script_scheduled()
    }
}
