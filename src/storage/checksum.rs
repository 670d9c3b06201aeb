//! CRC32 checksums for storage unit records
//!
//! Every record carries a trailing CRC32 (IEEE polynomial) over its length
//! prefix and body. Readers verify it before decoding any field.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
