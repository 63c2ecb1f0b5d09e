//! Errors reported by the placeholder list
//!
//! Searching for something that is not there is not an error: lookups return
//! `Option`. The variants here are precondition violations, the caller has to
//! fix the call (or the persisted data) to make them go away.

use thiserror::Error;

use crate::list::Level;

/// Errors that can occur when mutating or reading a placeholder list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// An index did not point into the addressed view
    #[error("index {index} out of bounds for {level} view of length {len}")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        level: Level,
    },

    /// An item had neither a panel nor a placeholder
    #[error("an item without a panel needs at least one placeholder")]
    EmptyPlaceholderItem,

    /// `move_to` walked off the end of a chain
    #[error("cannot move entry by {delta} in the {level} view")]
    MoveOutOfRange { delta: isize, level: Level },

    /// `bind` was called on a list that is already bound
    #[error("placeholder list is already bound to its strategy")]
    AlreadyBound,

    /// The persisted map was not written by a placeholder list
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// The persisted map has a version this crate cannot read
    #[error("version unknown: {0}")]
    UnknownVersion(u32),

    /// A record of the persisted map is missing data or has the wrong type
    #[error("malformed record #{record}: {reason}")]
    MalformedRecord { record: usize, reason: String },
}

impl ListError {
    pub(crate) fn malformed(record: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record,
            reason: reason.into(),
        }
    }
}
