//! Object identifiers handed to the engine by the world.

use std::fmt;

use serde::{Deserialize, Serialize};
use variantly::Variantly;

use dbscript_data::BuddyKind;

/// Kinds of objects a script can refer to.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Variantly)]
pub enum EntityKind {
    Player,
    Creature,
    Pet,
    GameObject,
    Item,
    Corpse,
}

impl EntityKind {
    /// Players, creatures and pets.
    pub fn is_unit_kind(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Creature | EntityKind::Pet)
    }

    /// Whether a buddy search for `kind` may return this kind of object.
    pub fn matches_buddy(self, kind: BuddyKind) -> bool {
        match kind {
            BuddyKind::Creature => matches!(self, EntityKind::Creature | EntityKind::Pet),
            BuddyKind::GameObject => self == EntityKind::GameObject,
        }
    }
}

/// Runtime identity of a world object: kind, template entry and a per-kind counter.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectGuid {
    pub kind: EntityKind,
    pub entry: u32,
    pub counter: u32,
}

impl ObjectGuid {
    pub fn new(kind: EntityKind, entry: u32, counter: u32) -> Self {
        Self { kind, entry, counter }
    }

    pub fn player(counter: u32) -> Self {
        Self::new(EntityKind::Player, 0, counter)
    }

    pub fn creature(entry: u32, counter: u32) -> Self {
        Self::new(EntityKind::Creature, entry, counter)
    }

    pub fn gameobject(entry: u32, counter: u32) -> Self {
        Self::new(EntityKind::GameObject, entry, counter)
    }

    pub fn item(entry: u32, counter: u32) -> Self {
        Self::new(EntityKind::Item, entry, counter)
    }

    pub fn is_unit(&self) -> bool {
        self.kind.is_unit_kind()
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entry == 0 {
            write!(f, "{:?} #{}", self.kind, self.counter)
        } else {
            write!(f, "{:?} {} #{}", self.kind, self.entry, self.counter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_entry_when_present() {
        assert_eq!(ObjectGuid::player(3).to_string(), "Player #3");
        assert_eq!(ObjectGuid::creature(3000, 12).to_string(), "Creature 3000 #12");
    }

    #[test]
    fn pets_count_as_creature_buddies() {
        assert!(EntityKind::Pet.matches_buddy(BuddyKind::Creature));
        assert!(!EntityKind::Pet.matches_buddy(BuddyKind::GameObject));
        assert!(EntityKind::GameObject.matches_buddy(BuddyKind::GameObject));
        assert!(EntityKind::Player.is_player());
        assert!(EntityKind::Item.is_not_player());
    }
}
