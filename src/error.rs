//! Error types for save-file parsing and repair
//!
//! Every failure the library can produce maps onto one of these kinds.
//! The container codec swallows per-slot failures (the slot is marked
//! empty and parsing continues); everything else propagates to the caller.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SaveError>;

/// All failure modes of the save toolkit.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The first four bytes match no known platform.
    #[error("invalid save file magic: {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// A read ran past the end of the buffer.
    #[error("truncated read at offset {offset}: wanted {wanted} more bytes")]
    Truncated { offset: usize, wanted: usize },

    /// An event id references a block that is not in the BST table.
    #[error("event flag {0} references an unknown block")]
    UnknownFlag(u32),

    /// A computed byte position falls outside the event-flag bitmap.
    #[error("byte position {position} exceeds bitmap length {len}")]
    OutOfRange { position: usize, len: usize },

    /// `eventflag_bst.txt` was not found on any search path.
    #[error("eventflag_bst.txt not found on any search path")]
    MissingResource,

    /// A substructure serialized to the wrong number of bytes.
    /// Indicates a codec bug; the mutation that hit it is aborted
    /// before any byte reaches the raw buffer.
    #[error("{what} serialized to {got} bytes, expected {expected}")]
    InternalLayout {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// A mutation was attempted on an empty character slot.
    #[error("character slot {0} is empty")]
    SlotEmpty(usize),

    /// Caller-supplied argument outside the accepted domain.
    #[error("{0}")]
    InvalidArgument(String),

    /// Underlying I/O failure during load or save.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed preset JSON on import.
    #[error("preset JSON: {0}")]
    PresetJson(#[from] serde_json::Error),
}
