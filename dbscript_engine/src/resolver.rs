//! Buddy and role resolution for a single command.
//!
//! Starting from the action's source and target: substitute the buddy (replacing the target
//! with `BUDDY_AS_TARGET`, the source otherwise), then swap the two for `REVERSE_DIRECTION`,
//! then point the target at the source for `SOURCE_TARGETS_SELF`.

use log::debug;

use dbscript_data::{DataFlags, ScriptInfo};

use crate::engine::StepError;
use crate::guid::ObjectGuid;
use crate::world::{BuddyQuery, World};

/// Source and target a command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub source: Option<ObjectGuid>,
    pub target: Option<ObjectGuid>,
}

/// Resolve the effective source and target of `info`.
///
/// # Errors
/// - [`StepError::BuddyNotFound`] when a buddy is configured but cannot be found
pub fn resolve(
    info: &ScriptInfo,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
    world: &dyn World,
) -> Result<Resolved, StepError> {
    let mut resolved = Resolved { source, target };

    if info.buddy.is_set() {
        let buddy = find_buddy(info, source.or(target), world).ok_or(StepError::BuddyNotFound {
            command: info.command_id(),
            entry: info.buddy.entry,
            search_radius_or_guid: info.buddy.search_radius_or_guid,
        })?;
        debug!("script {} {}: buddy resolved to {buddy}", info.id, info.command_id());
        if info.has_flag(DataFlags::BUDDY_AS_TARGET) {
            resolved.target = Some(buddy);
        } else {
            resolved.source = Some(buddy);
        }
    }

    if info.has_flag(DataFlags::REVERSE_DIRECTION) {
        std::mem::swap(&mut resolved.source, &mut resolved.target);
    }
    if info.has_flag(DataFlags::SOURCE_TARGETS_SELF) {
        resolved.target = resolved.source;
    }
    Ok(resolved)
}

#[allow(clippy::cast_precision_loss)]
fn find_buddy(info: &ScriptInfo, searcher: Option<ObjectGuid>, world: &dyn World) -> Option<ObjectGuid> {
    let buddy = &info.buddy;
    let include_dead = info.has_flag(DataFlags::BUDDY_IS_DESPAWNED);

    if !info.flags.intersects(DataFlags::BUDDY_BY_GUID | DataFlags::BUDDY_IS_PET) {
        let query = BuddyQuery {
            kind: buddy.kind,
            entry: buddy.entry,
            radius: buddy.search_radius_or_guid as f32,
            include_dead,
        };
        return world.find_nearest(searcher?, &query);
    }

    let found = if info.has_flag(DataFlags::BUDDY_BY_GUID) {
        world.find_by_db_guid(buddy.kind, buddy.search_radius_or_guid)?
    } else {
        world.entity(searcher?)?.pet?
    };

    // guid and pet lookups still honour the entry, kind and life state
    let entity = world.entity(found)?;
    let matches = entity.guid.entry == buddy.entry && entity.guid.kind.matches_buddy(buddy.kind);
    (matches && (include_dead || entity.is_alive())).then_some(found)
}
