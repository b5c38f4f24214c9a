//! `db_script_string` text rows.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use dbscript_data::ScriptTextRow;

use crate::texts::ScriptTexts;

/// Read the script text file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_text_rows(path: &Path) -> Result<Vec<ScriptTextRow>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading script texts from '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing script texts RON from '{}'", path.display()))
}

/// Read the script text file and build the text table.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_texts(path: &Path) -> Result<ScriptTexts> {
    Ok(ScriptTexts::from_rows(load_text_rows(path)?))
}
