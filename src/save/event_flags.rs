//! Event-flag bitmap codec
//!
//! The game persists EMEVD flags as a 0x1BF99F-byte bitmap. Flag ids are
//! grouped in blocks of `FLAG_DIVISOR`; each known block maps to a
//! 125-byte page through a table extracted from the game's
//! CSFd4VirtualMemoryFlag tree. Bits are MSB-first within a byte.
//!
//! The table is loaded once per process from `eventflag_bst.txt`
//! (`"<block_id>,<block_offset>"` per line) and is read-only afterwards,
//! so it is shared without a lock.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, SaveError};

/// Flags per block.
pub const FLAG_DIVISOR: u32 = 1000;
/// Bytes per block page.
pub const BLOCK_SIZE: usize = 125;
/// Size of the serialized bitmap inside a slot.
pub const EVENT_FLAGS_SIZE: usize = 0x1BF99F;

/// Resource file name.
pub const BST_FILE_NAME: &str = "eventflag_bst.txt";

/// `block_id → block_offset` table.
pub type BstMap = HashMap<u32, u32>;

static BST: OnceCell<BstMap> = OnceCell::new();

// =============================================================================
// TABLE LOADING
// =============================================================================

/// Candidate locations for `eventflag_bst.txt`, checked in order:
/// current directory, `resources/`, alongside the executable, alongside
/// the crate source.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from(BST_FILE_NAME),
        Path::new("resources").join(BST_FILE_NAME),
    ];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join(BST_FILE_NAME));
        }
    }
    paths.push(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("resources")
            .join(BST_FILE_NAME),
    );
    paths
}

/// Parse the `"<block_id>,<block_offset>"` line format.
/// Blank lines are skipped; anything else malformed is ignored with a
/// warning so a hand-edited table cannot brick the tool.
fn parse_table(text: &str) -> BstMap {
    let mut map = BstMap::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, ',');
        let block = parts.next().and_then(|v| v.trim().parse::<u32>().ok());
        let offset = parts.next().and_then(|v| v.trim().parse::<u32>().ok());
        match (block, offset) {
            (Some(block), Some(offset)) => {
                map.insert(block, offset);
            }
            _ => warn!(line_no, line, "skipping malformed BST line"),
        }
    }
    map
}

fn load_table() -> Result<BstMap> {
    for path in search_paths() {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let map = parse_table(&text);
                debug!(path = %path.display(), blocks = map.len(), "loaded event-flag BST");
                return Ok(map);
            }
            Err(_) => continue,
        }
    }
    Err(SaveError::MissingResource)
}

/// The process-wide table, loading it from disk on first use.
fn table() -> Result<&'static BstMap> {
    BST.get_or_try_init(load_table)
}

/// Install a table directly, bypassing the file search. Intended for
/// tests and embedders; a no-op if a table is already installed.
pub fn install_table(map: BstMap) {
    let _ = BST.set(map);
}

// =============================================================================
// BIT ADDRESSING
// =============================================================================

/// Resolve an event id to its (byte, bit) position inside the bitmap.
fn locate(bitmap_len: usize, event_id: u32) -> Result<(usize, u32)> {
    let block = event_id / FLAG_DIVISOR;
    let index = (event_id % FLAG_DIVISOR) as usize;

    let block_offset = *table()?
        .get(&block)
        .ok_or(SaveError::UnknownFlag(event_id))?;

    let byte_position = block_offset as usize * BLOCK_SIZE + index / 8;
    if byte_position >= bitmap_len {
        return Err(SaveError::OutOfRange {
            position: byte_position,
            len: bitmap_len,
        });
    }
    let bit_position = 7 - (index % 8) as u32;
    Ok((byte_position, bit_position))
}

/// Read a single event flag from the bitmap.
pub fn get_flag(bitmap: &[u8], event_id: u32) -> Result<bool> {
    let (byte_position, bit_position) = locate(bitmap.len(), event_id)?;
    Ok((bitmap[byte_position] >> bit_position) & 1 == 1)
}

/// Set or clear a single event flag in the bitmap.
pub fn set_flag(bitmap: &mut [u8], event_id: u32, state: bool) -> Result<()> {
    let (byte_position, bit_position) = locate(bitmap.len(), event_id)?;
    if state {
        bitmap[byte_position] |= 1 << bit_position;
    } else {
        bitmap[byte_position] &= !(1 << bit_position);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
