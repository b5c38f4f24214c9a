//! Script names and the area trigger / event bindings that reference them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use dbscript_data::ScriptNamesDef;

/// Read the script names file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or binds one id twice.
pub fn load_script_names(path: &Path) -> Result<ScriptNamesDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading script names from '{}'", path.display()))?;
    let def: ScriptNamesDef =
        ron::from_str(&text).with_context(|| format!("parsing script names RON from '{}'", path.display()))?;
    check_bindings(&def)?;
    Ok(def)
}

fn check_bindings(def: &ScriptNamesDef) -> Result<()> {
    let mut problems = Vec::new();
    for (kind, bindings) in [("area trigger", &def.area_triggers), ("event", &def.events)] {
        let mut seen = std::collections::HashSet::new();
        for binding in bindings {
            if binding.script_name.is_empty() {
                problems.push(format!("{kind} {} is bound to an empty script name", binding.id));
            } else if !seen.insert(binding.id) {
                problems.push(format!("{kind} {} is bound more than once", binding.id));
            }
        }
    }
    if !problems.is_empty() {
        bail!("invalid script bindings: {}", problems.join("; "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn duplicate_bindings_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(names: ["npc_a"], area_triggers: [(id: 1, script_name: "at_a"), (id: 1, script_name: "at_b")])"#
        )
        .unwrap();
        let err = load_script_names(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("area trigger 1 is bound more than once"));
    }

    #[test]
    fn names_file_loads() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"(names: ["npc_a"], events: [(id: 9, script_name: "event_a")])"#).unwrap();
        let def = load_script_names(file.path()).unwrap();
        assert_eq!(def.names, vec!["npc_a".to_string()]);
        assert_eq!(def.events[0].id, 9);
        assert!(def.area_triggers.is_empty());
    }
}
