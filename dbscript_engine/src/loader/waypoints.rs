//! Waypoint and escort data.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use dbscript_data::WaypointsDef;

use crate::waypoints::ScriptWaypoints;

/// Read the waypoint file and build the lookup tables.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_waypoints(path: &Path) -> Result<ScriptWaypoints> {
    let text = fs::read_to_string(path).with_context(|| format!("reading script waypoints from '{}'", path.display()))?;
    let def: WaypointsDef =
        ron::from_str(&text).with_context(|| format!("parsing script waypoints RON from '{}'", path.display()))?;
    Ok(ScriptWaypoints::from_def(def))
}
