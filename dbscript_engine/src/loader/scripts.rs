//! Script table rows: reading, decoding and grouping by trigger key.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};

use dbscript_data::{DecodeOptions, RawField, ScriptInfo, ScriptRow, ScriptTable, ValidationError, unused_columns};

use crate::store::ScriptMapMap;
use crate::texts::ScriptTexts;

/// What happened while building one table.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub table: ScriptTable,
    /// Rows read from storage.
    pub rows: usize,
    /// Distinct trigger keys kept.
    pub keys: usize,
    /// Rows rejected by validation.
    pub skipped: Vec<ValidationError>,
    /// Rows kept despite non-zero columns their command never reads.
    pub warnings: usize,
    /// TALK text ids with no loaded text.
    pub missing_texts: BTreeSet<i32>,
}

impl LoadReport {
    /// Commands kept.
    pub fn loaded(&self) -> usize {
        self.rows - self.skipped.len()
    }
}

/// Read the raw rows of a table file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a RON list of rows.
pub fn load_script_rows(path: &Path) -> Result<Vec<ScriptRow>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading script rows from '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing script rows RON from '{}'", path.display()))
}

/// Decode `rows` and group them by trigger key, keeping load order within each key.
///
/// Rows that fail validation are logged and left out; they never abort the table.
pub fn build_table(rows: &[ScriptRow], table: ScriptTable, opts: &DecodeOptions) -> (ScriptMapMap, LoadReport) {
    let mut grouped: BTreeMap<u32, Vec<ScriptInfo>> = BTreeMap::new();
    let mut skipped = Vec::new();
    let mut warnings = 0;

    for row in rows {
        let info = match ScriptInfo::decode(row, opts) {
            Ok(info) => info,
            Err(e) => {
                error!("{table}: {e}, row skipped");
                skipped.push(e);
                continue;
            },
        };
        let unused = unused_columns(row, info.spec());
        if !unused.is_empty() {
            warnings += 1;
            warn!(
                "{table}: script {} {} has values in unused columns {}",
                info.id,
                info.command_id(),
                unused.iter().map(|f| RawField::column(*f)).collect::<Vec<_>>().join(", ")
            );
        }
        grouped.entry(info.id).or_default().push(info);
    }

    let scripts: ScriptMapMap = grouped.into_iter().map(|(key, seq)| (key, Arc::from(seq))).collect();
    let report = LoadReport {
        table,
        rows: rows.len(),
        keys: scripts.len(),
        skipped,
        warnings,
        missing_texts: BTreeSet::new(),
    };
    info!(
        "{table}: {} commands for {} keys loaded ({} rows skipped)",
        report.loaded(),
        report.keys,
        report.skipped.len()
    );
    (scripts, report)
}

/// Read and build one table file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed. Invalid rows are not errors.
pub fn load_table(path: &Path, table: ScriptTable, opts: &DecodeOptions) -> Result<(ScriptMapMap, LoadReport)> {
    let rows = load_script_rows(path).with_context(|| format!("while loading {table}"))?;
    Ok(build_table(&rows, table, opts))
}

/// TALK text ids in `scripts` that `texts` does not define, logged per command.
pub fn check_script_texts(table: ScriptTable, scripts: &ScriptMapMap, texts: &ScriptTexts) -> BTreeSet<i32> {
    let mut missing = BTreeSet::new();
    for info in scripts.values().flat_map(|seq| seq.iter()) {
        for id in texts.missing_ids(info.command.text_ids()) {
            error!("{table}: script {} {} uses text {id}, which is not loaded", info.id, info.command_id());
            missing.insert(id);
        }
    }
    missing
}
