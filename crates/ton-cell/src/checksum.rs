//! Checksums used by the TON wire formats.
//!
//! User-friendly addresses carry a CRC16-XMODEM trailer and bags of cells an
//! optional CRC32-C (Castagnoli) trailer. Both are tiny enough to compute
//! bitwise without a lookup table.

/// CRC16-XMODEM (poly 0x1021, init 0, no reflection).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// CRC32-C (reflected poly 0x82F63B78, init and xorout 0xFFFFFFFF).
pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0x82F6_3B78
            } else {
                crc >> 1
            };
        }
    }
    crc ^ 0xFFFF_FFFF
}
