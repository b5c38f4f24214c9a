use uuid::Uuid;

use dbscript_data::{ScriptInfo, ScriptTable};

use crate::guid::ObjectGuid;
use crate::store::ScriptSequence;

/// One firing of a script sequence.
///
/// The sequence itself is shared read-only with the store snapshot it came from, so a reload
/// never changes what an in-flight action executes.
#[derive(Debug, Clone)]
pub struct RuntimeAction {
    pub id: Uuid,
    pub table: ScriptTable,
    pub key: u32,
    pub source: Option<ObjectGuid>,
    pub target: Option<ObjectGuid>,
    /// Owner of the source when the source is an item.
    pub owner: Option<ObjectGuid>,
    /// Trigger time; command delays are offsets from here.
    pub started_at: u64,
    commands: ScriptSequence,
    order: Vec<usize>,
    cursor: usize,
}

impl RuntimeAction {
    pub fn new(
        table: ScriptTable,
        key: u32,
        commands: ScriptSequence,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        owner: Option<ObjectGuid>,
        started_at: u64,
    ) -> Self {
        let mut order: Vec<usize> = (0..commands.len()).collect();
        // stable: equal delays keep load order
        order.sort_by_key(|idx| commands[*idx].delay);
        Self {
            id: Uuid::new_v4(),
            table,
            key,
            source,
            target,
            owner,
            started_at,
            commands,
            order,
            cursor: 0,
        }
    }

    /// Command the action will run next.
    pub fn current(&self) -> Option<&ScriptInfo> {
        self.order.get(self.cursor).map(|idx| &self.commands[*idx])
    }

    /// Absolute time the next command becomes due.
    pub fn next_due(&self) -> Option<u64> {
        self.current().map(|info| self.started_at + u64::from(info.delay))
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.order.len()
    }

    pub fn remaining(&self) -> usize {
        self.order.len().saturating_sub(self.cursor)
    }

    /// The sequence this action runs, in execution order.
    pub fn commands(&self) -> impl Iterator<Item = &ScriptInfo> {
        self.order.iter().map(|idx| &self.commands[*idx])
    }

    /// Whether removing `guid` from the world invalidates this action.
    pub fn involves(&self, guid: ObjectGuid) -> bool {
        self.source == Some(guid) || self.owner == Some(guid)
    }
}
