//! Shared data model for database scripts: persisted rows, the command table and row validation.

pub mod command;
pub mod defs;
pub mod info;
pub mod text;
pub mod validate;

pub use command::{BuddyKind, COMMAND_COUNT, COMMAND_TABLE, CommandId, CommandSpec, DataFlags, RawField};
pub use defs::*;
pub use info::{
    BuddyDescriptor, CastDirection, ChatType, DecodeOptions, GoLockFlags, MovementType, NpcFlagOp, ScriptCommand,
    ScriptInfo, Team,
};
pub use text::{MAX_DB_SCRIPT_STRING_ID, MIN_DB_SCRIPT_STRING_ID, TextSource};
pub use validate::{ValidationError, check_buddy, unused_columns, validate_rows};
