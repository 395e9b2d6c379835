//! MD5 checksum engine
//!
//! On PC every slot region and the common region carry a 16-byte MD5
//! prefix over the payload that follows. The engine never decides when
//! to recompute; the facade invokes it after mutations and before any
//! write to disk.

use md5::{Digest, Md5};

/// Byte length of a checksum prefix.
pub const CHECKSUM_SIZE: usize = 0x10;

/// MD5 digest of a byte range.
pub fn digest(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Recompute the digest over `raw[region_offset + 16 .. + 16 + payload_len]`
/// and overwrite the 16-byte prefix at `region_offset`.
pub fn refresh_region(raw: &mut [u8], region_offset: usize, payload_len: usize) {
    let payload_start = region_offset + CHECKSUM_SIZE;
    let sum = digest(&raw[payload_start..payload_start + payload_len]);
    raw[region_offset..payload_start].copy_from_slice(&sum);
}

/// Check a region's prefix against its payload.
pub fn verify_region(raw: &[u8], region_offset: usize, payload_len: usize) -> bool {
    let payload_start = region_offset + CHECKSUM_SIZE;
    let sum = digest(&raw[payload_start..payload_start + payload_len]);
    raw[region_offset..payload_start] == sum
}
