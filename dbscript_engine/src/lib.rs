#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const DBSCRIPT_ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod data_paths;
pub mod engine;
pub mod guid;
pub mod loader;
pub mod mgr;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod sim;
pub mod store;
pub mod texts;
pub mod waypoints;
pub mod world;

// Re-exports for convenience
pub use data_paths::data_path;
pub use engine::{RuntimeAction, ScheduledScriptCounter, ScriptEngine, StepError, StepOutcome};
pub use guid::{EntityKind, ObjectGuid};
pub use loader::config::{EngineConfig, load_config};
pub use loader::scripts::LoadReport;
pub use mgr::{ScriptMgr, Trigger};
pub use registry::{
    AuraInfo, CreatureAi, DIALOG_STATUS_UNDEFINED, GameObjectAi, InstanceData, ScriptHooks, ScriptRegistry,
};
pub use sim::SimWorld;
pub use store::{ScriptMapMap, ScriptStore};
pub use texts::{ScriptTexts, TextError, do_script_text};
pub use waypoints::ScriptWaypoints;
pub use world::{BuddyQuery, EffectError, EntityInfo, LifeState, World, WorldEffect};
