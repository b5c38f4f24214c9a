//! Running fired script sequences.
//!
//! [`ScriptEngine::fire`] turns a trigger into a [`RuntimeAction`] and parks it in the
//! scheduler. Every [`ScriptEngine::update`] tick pops the actions whose next command is due and
//! runs commands until the action either waits for a later delay, terminates, or runs out.

pub mod action;
pub mod commands;
pub mod counter;

pub use action::RuntimeAction;
pub use counter::ScheduledScriptCounter;

use std::sync::Arc;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use dbscript_data::{CommandId, ScriptTable};

use crate::guid::{EntityKind, ObjectGuid};
use crate::scheduler::Scheduler;
use crate::store::ScriptSequence;
use crate::texts::ScriptTexts;
use crate::world::{EffectError, World};

/// Why one command of a sequence was skipped.
///
/// A failed command never aborts its sequence; the engine logs the error and moves on.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{command}: buddy {entry} not found (search radius or guid {search_radius_or_guid})")]
    BuddyNotFound {
        command: CommandId,
        entry: u32,
        search_radius_or_guid: u32,
    },
    #[error("{command}: no {role} available")]
    MissingRole { command: CommandId, role: &'static str },
    #[error("{command}: {role} {guid} is not a {expected}")]
    WrongRole {
        command: CommandId,
        role: &'static str,
        guid: ObjectGuid,
        expected: &'static str,
    },
    #[error("{command}: {guid} is no longer in the world")]
    EntityGone { command: CommandId, guid: ObjectGuid },
    #[error("{command}: no gameobject spawned from db guid {db_guid}")]
    DbGuidNotFound { command: CommandId, db_guid: u32 },
    #[error("text entry {0} not found")]
    MissingText(i32),
    #[error(transparent)]
    Effect(#[from] EffectError),
    #[error("{0} cannot be executed")]
    Undispatchable(CommandId),
}

impl StepError {
    /// Buddy lookups fail routinely (the buddy simply is not around) and are logged quietly.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, StepError::BuddyNotFound { .. })
    }
}

/// What the sequence does after a command ran.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// Abandon the rest of the sequence.
    Terminate,
}

/// Scheduler of fired sequences plus the randomness commands draw from.
#[derive(Debug)]
pub struct ScriptEngine {
    scheduler: Scheduler<RuntimeAction>,
    counter: Arc<ScheduledScriptCounter>,
    rng: StdRng,
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Engine drawing from `rng`; seed it for reproducible runs.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            scheduler: Scheduler::default(),
            counter: Arc::new(ScheduledScriptCounter::new()),
            rng,
        }
    }

    /// Engine with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Shared handle to the in-flight counter.
    pub fn counter(&self) -> Arc<ScheduledScriptCounter> {
        Arc::clone(&self.counter)
    }

    /// Number of actions waiting for their next command.
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    /// Earliest time any pending action becomes due.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Iterate over waiting actions.
    pub fn actions(&self) -> impl Iterator<Item = &RuntimeAction> {
        self.scheduler.pending()
    }

    /// Fire `commands` for a trigger at `now_ms`.
    ///
    /// Returns `false` when there is nothing to run.
    #[allow(clippy::too_many_arguments)]
    pub fn fire(
        &mut self,
        table: ScriptTable,
        key: u32,
        commands: ScriptSequence,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        now_ms: u64,
        world: &dyn World,
    ) -> bool {
        if commands.is_empty() {
            debug!("{table} has no script for key {key}");
            return false;
        }
        let owner = source
            .filter(|s| s.kind == EntityKind::Item)
            .and_then(|item| world.entity(item))
            .and_then(|item| item.owner);

        let action = RuntimeAction::new(table, key, commands, source, target, owner, now_ms);
        let Some(due) = action.next_due() else {
            return false;
        };
        info!(
            "{table} {key} fired as {} ({} commands, source {}, target {})",
            action.id,
            action.remaining(),
            describe(source),
            describe(target)
        );
        self.scheduler.schedule_at(due, action);
        self.counter.increase();
        true
    }

    /// Run every command due at or before `now_ms`; returns how many commands ran.
    pub fn update(&mut self, now_ms: u64, world: &mut dyn World, texts: &ScriptTexts) -> usize {
        let mut executed = 0;
        while let Some((_, mut action)) = self.scheduler.pop_due(now_ms) {
            loop {
                let Some(info) = action.current() else {
                    debug!("{} {} finished", action.table, action.key);
                    self.counter.decrease();
                    break;
                };
                let due = action.started_at + u64::from(info.delay);
                if due > now_ms {
                    self.scheduler.schedule_at(due, action);
                    break;
                }
                if let Some(gone) = missing_participant(&action, &*world) {
                    info!(
                        "{} {} abandoned with {} commands left, {gone} left the world",
                        action.table,
                        action.key,
                        action.remaining()
                    );
                    self.counter.decrease();
                    break;
                }

                executed += 1;
                let outcome = commands::execute(info, &action, world, texts, &mut self.rng);
                match outcome {
                    Ok(StepOutcome::Continue) => {},
                    Ok(StepOutcome::Terminate) => {
                        info!("{} {} terminated by script {}", action.table, action.key, info.id);
                        self.counter.decrease();
                        break;
                    },
                    Err(err) if err.is_resolution_failure() => {
                        debug!("{} {} command skipped: {err}", action.table, action.key);
                    },
                    Err(err) => {
                        warn!("{} {} command skipped: {err}", action.table, action.key);
                    },
                }
                action.advance();
            }
        }
        executed
    }

    /// Drop every pending action whose source or owner is `guid`; returns how many were dropped.
    pub fn cancel_for(&mut self, guid: ObjectGuid) -> usize {
        let dropped = self.scheduler.cancel_where(|action| action.involves(guid)).len();
        if dropped > 0 {
            self.counter.decrease_by(dropped);
            info!("{dropped} pending scripts of {guid} cancelled");
        }
        dropped
    }
}

/// A source or owner that has left the world since the action was fired.
fn missing_participant(action: &RuntimeAction, world: &dyn World) -> Option<ObjectGuid> {
    [action.source, action.owner]
        .into_iter()
        .flatten()
        .find(|guid| !world.entity(*guid).is_some_and(|e| e.is_in_world()))
}

fn describe(guid: Option<ObjectGuid>) -> String {
    guid.map_or_else(|| "none".to_string(), |g| g.to_string())
}
