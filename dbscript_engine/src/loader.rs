//! Loading script data from the data directory.
//!
//! Script tables and their auxiliary files are RON; the engine configuration is TOML.

pub mod config;
pub mod names;
pub mod scripts;
pub mod texts;
pub mod waypoints;

use std::path::Path;

use anyhow::Result;
use log::warn;

use dbscript_data::{ScriptNamesDef, ScriptTable};

use crate::loader::config::EngineConfig;
use crate::loader::names::load_script_names;
use crate::loader::scripts::{LoadReport, build_table, check_script_texts, load_table};
use crate::loader::texts::load_texts;
use crate::loader::waypoints::load_waypoints;
use crate::store::ScriptMapMap;
use crate::texts::ScriptTexts;
use crate::waypoints::ScriptWaypoints;

/// Everything read from the data directory at startup.
#[derive(Debug)]
pub struct LoadedData {
    pub texts: ScriptTexts,
    pub names: ScriptNamesDef,
    pub waypoints: ScriptWaypoints,
    pub tables: Vec<(ScriptMapMap, LoadReport)>,
}

/// Load an optional file with `load`, or fall back to the default when it does not exist.
///
/// # Errors
/// Errors from `load` for files that exist.
pub fn load_optional<T: Default>(path: &Path, what: &str, load: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    if path.exists() {
        load(path)
    } else {
        warn!("no {what} file at '{}', starting without {what}", path.display());
        Ok(T::default())
    }
}

/// Load one script table and check its TALK texts.
///
/// A table without a file is empty; a file that cannot be parsed is an error.
///
/// # Errors
/// Returns an error if an existing table file cannot be read or parsed.
pub fn load_script_table(
    config: &EngineConfig,
    table: ScriptTable,
    texts: &ScriptTexts,
) -> Result<(ScriptMapMap, LoadReport)> {
    let path = config.table_path(table);
    let (scripts, mut report) = if path.exists() {
        load_table(&path, table, &config.decode_options())?
    } else {
        warn!("no rows file for {table} at '{}', table is empty", path.display());
        build_table(&[], table, &config.decode_options())
    };
    report.missing_texts = check_script_texts(table, &scripts, texts);
    Ok((scripts, report))
}

/// Load texts, names, waypoints and every script table.
///
/// # Errors
/// Errors bubble up from file IO or deserialization of files that exist.
pub fn load_all(config: &EngineConfig) -> Result<LoadedData> {
    let texts = load_optional(&config.path_for(&config.texts_file), "script text", load_texts)?;
    let names = load_optional(&config.path_for(&config.names_file), "script name", load_script_names)?;
    let waypoints = load_optional(&config.path_for(&config.waypoints_file), "waypoint", load_waypoints)?;
    let tables = ScriptTable::ALL
        .into_iter()
        .map(|table| load_script_table(config, table, &texts))
        .collect::<Result<Vec<_>>>()?;
    Ok(LoadedData {
        texts,
        names,
        waypoints,
        tables,
    })
}
