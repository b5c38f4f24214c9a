use std::fmt;

use crate::command::{CommandId, CommandSpec, DataFlags, RawField};
use crate::defs::ScriptRow;
use crate::info::{BuddyDescriptor, DecodeOptions, ScriptInfo};

/// Reason a persisted row cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownCommand { id: u32, command: u32 },
    ReservedCommand { id: u32, command: CommandId },
    InvalidFlags { id: u32, command: CommandId, flags: u8 },
    UnsupportedAdditionalFlag { id: u32, command: CommandId },
    MalformedBuddy { id: u32, command: CommandId, reason: String },
    InvalidValue { id: u32, command: CommandId, context: String },
}

impl ValidationError {
    /// Trigger key of the offending row.
    pub fn row_id(&self) -> u32 {
        match self {
            ValidationError::UnknownCommand { id, .. }
            | ValidationError::ReservedCommand { id, .. }
            | ValidationError::InvalidFlags { id, .. }
            | ValidationError::UnsupportedAdditionalFlag { id, .. }
            | ValidationError::MalformedBuddy { id, .. }
            | ValidationError::InvalidValue { id, .. } => *id,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownCommand { id, command } => {
                write!(f, "script {id}: unknown command {command}")
            },
            ValidationError::ReservedCommand { id, command } => {
                write!(f, "script {id}: command {command} is reserved")
            },
            ValidationError::InvalidFlags { id, command, flags } => {
                write!(f, "script {id}: {command} has undefined data_flags {flags:#04x}")
            },
            ValidationError::UnsupportedAdditionalFlag { id, command } => {
                write!(f, "script {id}: {command} does not support SCRIPT_FLAG_COMMAND_ADDITIONAL")
            },
            ValidationError::MalformedBuddy { id, command, reason } => {
                write!(f, "script {id}: {command} has a malformed buddy ({reason})")
            },
            ValidationError::InvalidValue { id, command, context } => {
                write!(f, "script {id}: {command} invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

fn malformed(row: &ScriptRow, spec: &CommandSpec, reason: impl Into<String>) -> ValidationError {
    ValidationError::MalformedBuddy {
        id: row.id,
        command: spec.id,
        reason: reason.into(),
    }
}

/// Buddy entry and radius after folding in the old per-command columns.
fn effective_buddy(row: &ScriptRow, spec: &CommandSpec) -> Result<(u32, u32), ValidationError> {
    let row_level = (row.buddy_entry, row.search_radius_or_guid);
    if !spec.legacy_buddy || (row.datalong2 == 0 && row.datalong3 == 0) {
        return Ok(row_level);
    }
    let legacy = (row.datalong2, row.datalong3);
    if row_level == (0, 0) || row_level == legacy {
        Ok(legacy)
    } else {
        Err(malformed(
            row,
            spec,
            format!(
                "datalong2/datalong3 ({}, {}) disagree with buddy_entry/search_radius ({}, {})",
                legacy.0, legacy.1, row_level.0, row_level.1
            ),
        ))
    }
}

/// Check the buddy columns and flags of a row and build its descriptor.
///
/// # Errors
/// - [`ValidationError::MalformedBuddy`] for any inconsistent combination
#[allow(clippy::cast_precision_loss)]
pub fn check_buddy(
    row: &ScriptRow,
    spec: &CommandSpec,
    flags: DataFlags,
    opts: &DecodeOptions,
) -> Result<BuddyDescriptor, ValidationError> {
    let (entry, radius_or_guid) = effective_buddy(row, spec)?;

    if entry == 0 {
        if radius_or_guid != 0 {
            return Err(malformed(row, spec, format!("search radius/guid {radius_or_guid} without buddy entry")));
        }
        if flags.intersects(DataFlags::BUDDY_MODES) {
            return Err(malformed(row, spec, "buddy flags without buddy entry"));
        }
        if flags.contains(DataFlags::BUDDY_AS_TARGET) {
            return Err(malformed(row, spec, "SCRIPT_FLAG_BUDDY_AS_TARGET without buddy entry"));
        }
    } else if flags.contains(DataFlags::BUDDY_BY_GUID) {
        if flags.contains(DataFlags::BUDDY_IS_PET) {
            return Err(malformed(row, spec, "buddy cannot be searched by guid and as pet"));
        }
        if radius_or_guid == 0 {
            return Err(malformed(row, spec, "buddy guid 0"));
        }
    } else if !flags.contains(DataFlags::BUDDY_IS_PET)
        && (radius_or_guid == 0 || radius_or_guid as f32 > opts.max_search_radius)
    {
        return Err(malformed(
            row,
            spec,
            format!(
                "search radius {radius_or_guid} outside 1..={}",
                opts.max_search_radius
            ),
        ));
    }

    Ok(BuddyDescriptor {
        entry,
        search_radius_or_guid: radius_or_guid,
        kind: spec.buddy,
    })
}

fn raw_value(row: &ScriptRow, field: RawField) -> i64 {
    match field {
        RawField::DataLong => i64::from(row.datalong),
        RawField::DataLong2 => i64::from(row.datalong2),
        RawField::DataLong3 => i64::from(row.datalong3),
        RawField::DataLong4 => i64::from(row.datalong4),
        RawField::DataInt => i64::from(row.dataint),
        RawField::DataInt2 => i64::from(row.dataint2),
        RawField::DataInt3 => i64::from(row.dataint3),
        RawField::DataInt4 => i64::from(row.dataint4),
    }
}

/// Columns that hold a non-zero value the command never reads.
pub fn unused_columns(row: &ScriptRow, spec: &CommandSpec) -> Vec<RawField> {
    RawField::ALL
        .into_iter()
        .filter(|f| !spec.layout.contains(f) && raw_value(row, *f) != 0)
        .collect()
}

/// Decode every row and collect the ones that would be rejected.
///
/// ```
/// use dbscript_data::{CommandId, DecodeOptions, ScriptRow, validate_rows};
///
/// let rows = vec![
///     ScriptRow { id: 1, command: CommandId::Respawn as u32, ..ScriptRow::default() },
///     ScriptRow { id: 2, command: 33, ..ScriptRow::default() },
/// ];
/// let errors = validate_rows(&rows, &DecodeOptions::default());
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].row_id(), 2);
/// ```
pub fn validate_rows(rows: &[ScriptRow], opts: &DecodeOptions) -> Vec<ValidationError> {
    rows.iter()
        .filter_map(|row| ScriptInfo::decode(row, opts).err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emote(buddy_entry: u32, radius: u32, flags: DataFlags) -> ScriptRow {
        ScriptRow {
            id: 7,
            command: CommandId::Emote as u32,
            datalong: 1,
            buddy_entry,
            search_radius_or_guid: radius,
            data_flags: flags.bits(),
            ..ScriptRow::default()
        }
    }

    fn buddy_of(row: &ScriptRow) -> Result<BuddyDescriptor, ValidationError> {
        ScriptInfo::from_row(row).map(|info| info.buddy)
    }

    #[test]
    fn radius_without_entry_is_rejected() {
        assert!(matches!(
            buddy_of(&emote(0, 20, DataFlags::empty())),
            Err(ValidationError::MalformedBuddy { .. })
        ));
    }

    #[test]
    fn buddy_flags_need_an_entry() {
        for flag in [DataFlags::BUDDY_BY_GUID, DataFlags::BUDDY_IS_PET, DataFlags::BUDDY_IS_DESPAWNED] {
            assert!(buddy_of(&emote(0, 0, flag)).is_err(), "{flag:?}");
        }
        assert!(buddy_of(&emote(0, 0, DataFlags::BUDDY_AS_TARGET)).is_err());
    }

    #[test]
    fn guid_and_pet_are_exclusive() {
        let row = emote(100, 5, DataFlags::BUDDY_BY_GUID | DataFlags::BUDDY_IS_PET);
        assert!(buddy_of(&row).is_err());
        assert!(buddy_of(&emote(100, 0, DataFlags::BUDDY_BY_GUID)).is_err());
        assert!(buddy_of(&emote(100, 12_345, DataFlags::BUDDY_BY_GUID)).is_ok());
    }

    #[test]
    fn radius_must_be_within_visible_range() {
        assert!(buddy_of(&emote(100, 0, DataFlags::empty())).is_err());
        assert!(buddy_of(&emote(100, 167, DataFlags::empty())).is_err());
        let ok = buddy_of(&emote(100, 166, DataFlags::empty())).unwrap();
        assert_eq!(ok.entry, 100);
        assert_eq!(ok.search_radius_or_guid, 166);
        assert!(buddy_of(&emote(100, 0, DataFlags::BUDDY_IS_PET)).is_ok());
    }

    #[test]
    fn configured_radius_limit_applies() {
        let opts = DecodeOptions { max_search_radius: 50.0 };
        assert!(ScriptInfo::decode(&emote(100, 60, DataFlags::empty()), &opts).is_err());
        assert!(ScriptInfo::decode(&emote(100, 40, DataFlags::empty()), &opts).is_ok());
    }

    #[test]
    fn legacy_columns_fold_into_buddy() {
        let row = ScriptRow {
            datalong2: 3000,
            datalong3: 30,
            ..emote(0, 0, DataFlags::empty())
        };
        let buddy = buddy_of(&row).unwrap();
        assert_eq!((buddy.entry, buddy.search_radius_or_guid), (3000, 30));

        let same = ScriptRow {
            datalong2: 3000,
            datalong3: 30,
            ..emote(3000, 30, DataFlags::empty())
        };
        assert!(buddy_of(&same).is_ok());

        let conflicting = ScriptRow {
            datalong2: 3000,
            datalong3: 30,
            ..emote(4000, 30, DataFlags::empty())
        };
        assert!(buddy_of(&conflicting).is_err());
    }

    #[test]
    fn unused_columns_are_reported() {
        let row = ScriptRow {
            datalong4: 9,
            dataint: -1,
            ..emote(0, 0, DataFlags::empty())
        };
        let unused = unused_columns(&row, CommandId::Emote.spec());
        assert_eq!(unused, vec![RawField::DataLong4, RawField::DataInt]);
    }

    #[test]
    fn error_display_names_row_and_command() {
        let err = buddy_of(&emote(0, 20, DataFlags::empty())).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("script 7: EMOTE (1)"), "{text}");
        assert_eq!(err.row_id(), 7);
    }
}
