//! Scripted waypoint paths and escort data, keyed by creature entry.

use std::collections::HashMap;

use log::{info, warn};

use dbscript_data::{EscortDataRow, PointMoveRow, WaypointsDef};

#[derive(Debug, Clone, Default)]
pub struct ScriptWaypoints {
    points: HashMap<u32, Vec<PointMoveRow>>,
    escorts: HashMap<u32, EscortDataRow>,
}

impl ScriptWaypoints {
    pub fn from_def(def: WaypointsDef) -> Self {
        let mut points: HashMap<u32, Vec<PointMoveRow>> = HashMap::new();
        for point in def.points {
            points.entry(point.creature_entry).or_default().push(point);
        }
        for list in points.values_mut() {
            list.sort_by_key(|p| p.point_id);
            let before = list.len();
            list.dedup_by_key(|p| p.point_id);
            if list.len() != before {
                warn!(
                    "creature {} has duplicate waypoint ids, keeping the first of each",
                    list[0].creature_entry
                );
            }
        }

        let mut escorts = HashMap::new();
        for escort in def.escorts {
            if let Some(previous) = escorts.insert(escort.creature_entry, escort) {
                warn!("escort data for creature {} defined more than once", previous.creature_entry);
            }
        }
        info!("{} waypoint paths and {} escorts loaded", points.len(), escorts.len());
        Self { points, escorts }
    }

    /// Waypoints of `entry` ordered by point id; empty when the creature has no path.
    pub fn point_move_list(&self, entry: u32) -> &[PointMoveRow] {
        self.points.get(&entry).map_or(&[], Vec::as_slice)
    }

    pub fn escort_data(&self, entry: u32) -> Option<&EscortDataRow> {
        self.escorts.get(&entry)
    }

    pub fn path_count(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(entry: u32, point_id: u32) -> PointMoveRow {
        PointMoveRow {
            creature_entry: entry,
            point_id,
            x: 1.0,
            y: 0.0,
            z: 0.0,
            wait_time: 0,
        }
    }

    #[test]
    fn points_are_ordered_and_unknown_entries_are_empty() {
        let waypoints = ScriptWaypoints::from_def(WaypointsDef {
            points: vec![point(7, 3), point(7, 1), point(8, 1), point(7, 2)],
            escorts: vec![EscortDataRow {
                creature_entry: 7,
                quest_entry: 900,
                escort_faction: 10,
                last_waypoint_entry: 3,
            }],
        });
        let ids: Vec<u32> = waypoints.point_move_list(7).iter().map(|p| p.point_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(waypoints.point_move_list(9).is_empty());
        assert_eq!(waypoints.escort_data(7).map(|e| e.quest_entry), Some(900));
        assert!(waypoints.escort_data(8).is_none());
        assert_eq!(waypoints.path_count(), 2);
    }
}
