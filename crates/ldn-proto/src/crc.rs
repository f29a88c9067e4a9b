//! CRC-32 over packet payloads.
//!
//! The variant is ISO-HDLC (reflected polynomial `0xEDB88320`, initial value
//! `0xFFFFFFFF`, final XOR `0xFFFFFFFF`), the same one zlib and Ethernet use.
//! `crc32fast` provides the table/SIMD implementation.

/// Compute the CRC-32 of `data`.
///
/// An empty buffer yields `0x00000000`.
#[inline]
pub fn calculate_crc32(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }
    crc32fast::hash(data)
}
