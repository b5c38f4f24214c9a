//! Engine configuration.
//!
//! Read from `dbscripts.toml`. Every key is optional; a missing or broken file falls back to
//! the defaults with a warning, so a bare data directory is enough to start the engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use dbscript_data::{DecodeOptions, ScriptTable, VISIBLE_RANGE};

/// Where the engine finds its data and how strictly it decodes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data directory, relative to the config file.
    pub data_dir: PathBuf,
    /// Largest accepted buddy search radius.
    pub max_search_radius: f32,
    pub texts_file: String,
    pub names_file: String,
    pub waypoints_file: String,
    /// File name overrides, keyed by table name.
    pub tables: BTreeMap<String, String>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            max_search_radius: VISIBLE_RANGE,
            texts_file: "db_script_string.ron".to_string(),
            names_file: "script_names.ron".to_string(),
            waypoints_file: "script_waypoints.ron".to_string(),
            tables: BTreeMap::new(),
            base_dir: PathBuf::new(),
        }
    }
}

impl EngineConfig {
    /// Defaults rooted at `dir` instead of the working directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn data_root(&self) -> PathBuf {
        self.base_dir.join(&self.data_dir)
    }

    /// Path of a data file named `file`.
    pub fn path_for(&self, file: &str) -> PathBuf {
        self.data_root().join(file)
    }

    /// Path of the rows file of `table`.
    pub fn table_path(&self, table: ScriptTable) -> PathBuf {
        match self.tables.get(table.table_name()) {
            Some(file) => self.path_for(file),
            None => self.path_for(&format!("{}.ron", table.table_name())),
        }
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_search_radius: self.max_search_radius,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.max_search_radius.is_finite() && self.max_search_radius > 0.0) {
            bail!("max_search_radius must be positive, got {}", self.max_search_radius);
        }
        let unknown: Vec<&str> = self
            .tables
            .keys()
            .map(String::as_str)
            .filter(|name| ScriptTable::from_name(name).is_none())
            .collect();
        if !unknown.is_empty() {
            bail!("unknown script tables in [tables]: {}", unknown.join(", "));
        }
        Ok(())
    }
}

/// Load the engine configuration, falling back to defaults on error.
///
/// This never fails; problems are logged with `warn!` and the defaults are used, rooted at the
/// directory the config file was expected in.
pub fn load_config(path: &Path) -> EngineConfig {
    match try_load_config(path) {
        Ok(config) => {
            info!("engine configuration loaded from '{}'", path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load engine configuration from '{}': {e:#}. Using defaults.",
                path.display()
            );
            EngineConfig::in_dir(base_dir_of(path))
        },
    }
}

/// Load the engine configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or holds invalid values.
pub fn try_load_config(path: &Path) -> Result<EngineConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading engine configuration from '{}'", path.display()))?;
    let mut config: EngineConfig = toml::from_str(&text)
        .with_context(|| format!("parsing engine configuration from '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating engine configuration from '{}'", path.display()))?;
    config.base_dir = base_dir_of(path);
    Ok(config)
}

fn base_dir_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_use_table_names() {
        let config = EngineConfig::in_dir("/srv/world");
        assert_eq!(
            config.table_path(ScriptTable::Spell),
            PathBuf::from("/srv/world/./spell_scripts.ron")
        );
        assert!((config.decode_options().max_search_radius - VISIBLE_RANGE).abs() < f32::EPSILON);
    }

    #[test]
    fn overrides_and_partial_files_parse() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "data_dir = \"scripts\"\nmax_search_radius = 80.0\n\n[tables]\nevent_scripts = \"events.ron\""
        )
        .unwrap();
        let config = try_load_config(file.path()).unwrap();
        let base = file.path().parent().unwrap();
        assert_eq!(config.table_path(ScriptTable::Event), base.join("scripts/events.ron"));
        assert_eq!(config.table_path(ScriptTable::Gossip), base.join("scripts/gossip_scripts.ron"));
        assert_eq!(config.texts_file, "db_script_string.ron");
        assert!((config.max_search_radius - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_files_fall_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[tables]\nnot_a_table = \"x.ron\"").unwrap();
        assert!(try_load_config(file.path()).is_err());
        let config = load_config(file.path());
        assert!(config.tables.is_empty());
        assert_eq!(config.data_root(), file.path().parent().unwrap().join("."));

        let missing = load_config(Path::new("/nonexistent/dbscripts.toml"));
        assert_eq!(missing.data_root(), PathBuf::from("/nonexistent/."));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
