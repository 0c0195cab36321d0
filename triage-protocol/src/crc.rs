//! CRC-16/XMODEM as used by the GM805 command protocol
//!
//! Polynomial 0x1021, initial value 0x0000, no reflection, no final XOR.

/// CRC-CCITT polynomial
const POLY: u16 = 0x1021;

/// Compute the CRC over `data`, returned high byte first
pub fn crc16(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc.to_be_bytes()
}
