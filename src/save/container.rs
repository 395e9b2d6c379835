//! Container codec
//!
//! Splits the ~27 MiB file image into header, ten slot regions, the
//! common region and the trailing regulation blob, recording the absolute
//! offset of every region. Parsing is restartable at slot boundaries: a
//! failure inside one slot marks it empty and resumes at the next
//! boundary, so files from game versions with unknown minor layout
//! changes still load.

use tracing::{debug, warn};

use crate::codec::SaveCursor;
use crate::error::{Result, SaveError};
use crate::save::checksum::CHECKSUM_SIZE;
use crate::save::common::{UserData10, USER_DATA_10_PAYLOAD_SIZE};
use crate::save::slot::Slot;

/// BND4 archive magic (regular PC save).
pub const MAGIC_BND4: [u8; 4] = *b"BND4";
/// Decrypted SL2 magic (PC save unpacked by other tools).
pub const MAGIC_SL2: [u8; 4] = *b"SL2\0";
/// PlayStation save magic.
pub const MAGIC_PS: [u8; 4] = [0xCB, 0x01, 0x9C, 0x2C];

/// Header size following the magic.
pub const HEADER_SIZE_PC: usize = 0x2FC;
pub const HEADER_SIZE_PS: usize = 0x6C;

/// Character slots in a save file.
pub const SLOT_COUNT: usize = 10;
/// Payload bytes of one slot (excluding the PC checksum prefix).
pub const SLOT_PAYLOAD_SIZE: usize = 0x280000;

/// Size of the trailing `UserData11` regulation blob.
pub const USER_DATA_11_SIZE: usize = 0x240010;

/// Everything the container codec extracts from a file image.
#[derive(Debug)]
pub(crate) struct ParsedContainer {
    pub magic: [u8; 4],
    pub is_ps: bool,
    pub header: Vec<u8>,
    pub slots: Vec<Slot>,
    pub slot_offsets: Vec<usize>,
    pub common: UserData10,
    pub user_data_10_offset: usize,
    pub user_data_11: Vec<u8>,
}

/// Classify the platform from the magic bytes.
fn platform_of(magic: [u8; 4]) -> Result<bool> {
    if magic == MAGIC_BND4 || magic == MAGIC_SL2 {
        Ok(false)
    } else if magic == MAGIC_PS {
        Ok(true)
    } else {
        Err(SaveError::InvalidMagic(magic))
    }
}

/// Size of one slot region including the platform's checksum prefix.
pub(crate) fn slot_region_size(is_ps: bool) -> usize {
    if is_ps {
        SLOT_PAYLOAD_SIZE
    } else {
        CHECKSUM_SIZE + SLOT_PAYLOAD_SIZE
    }
}

pub(crate) fn parse(raw: &[u8]) -> Result<ParsedContainer> {
    let mut cur = SaveCursor::new(raw);

    let magic = cur.read_array::<4>()?;
    let is_ps = platform_of(magic)?;
    let header = cur.read_bytes(if is_ps { HEADER_SIZE_PS } else { HEADER_SIZE_PC })?;

    let mut slots = Vec::with_capacity(SLOT_COUNT);
    let mut slot_offsets = Vec::with_capacity(SLOT_COUNT);

    for slot_index in 0..SLOT_COUNT {
        let slot_start = cur.position();
        slot_offsets.push(slot_start);

        if !is_ps {
            let digest = cur.read_array::<{ CHECKSUM_SIZE }>()?;
            // An all-zero digest marks a slot the game never wrote
            if digest == [0u8; CHECKSUM_SIZE] {
                cur.skip(SLOT_PAYLOAD_SIZE)?;
                slots.push(Slot::default());
                continue;
            }
        }

        match Slot::read(&mut cur, SLOT_PAYLOAD_SIZE) {
            Ok(slot) => slots.push(slot),
            Err(err) => {
                warn!(slot_index, %err, "slot parse failed, marking empty");
                slots.push(Slot::default());
            }
        }
        // Land exactly on the boundary regardless of what the slot codec
        // consumed, so later slots survive a bad one
        let next = slot_start + slot_region_size(is_ps);
        if next > raw.len() {
            return Err(SaveError::Truncated {
                offset: cur.position(),
                wanted: next - raw.len(),
            });
        }
        cur.seek_to(next);
    }

    let user_data_10_offset = cur.position();
    if !is_ps {
        cur.skip(CHECKSUM_SIZE)?;
    }
    let common = UserData10::read(&mut cur)?;
    cur.seek_to(
        user_data_10_offset
            + if is_ps { 0 } else { CHECKSUM_SIZE }
            + USER_DATA_10_PAYLOAD_SIZE,
    );

    if !is_ps {
        cur.skip(CHECKSUM_SIZE)?;
    }
    let user_data_11 = cur.read_bytes(USER_DATA_11_SIZE)?;

    debug!(
        is_ps,
        active = slots.iter().filter(|s| !s.is_empty()).count(),
        "parsed save container"
    );

    Ok(ParsedContainer {
        magic,
        is_ps,
        header,
        slots,
        slot_offsets,
        common,
        user_data_10_offset,
        user_data_11,
    })
}

// =============================================================================
// TESTS
// =============================================================================
