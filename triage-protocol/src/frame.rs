//! Frame encoding and response parsing for the GM805 zone-bit protocol.
//!
//! Command frame:
//! - HEADER (2 bytes): 0x7E 0x00
//! - TYPE (1 byte): read / write / save
//! - LENGTH (1 byte): number of DATA bytes
//! - ADDRESS (2 bytes): zone address, big-endian
//! - DATA (LENGTH bytes)
//! - CHECKSUM (2 bytes): CRC-16 of everything before it, or 0xAB 0xCD
//!
//! Response frame:
//! - HEADER (2 bytes): 0x02 0x00
//! - STATUS (1 byte): 0x00 on success
//! - LENGTH (1 byte)
//! - DATA (LENGTH bytes)
//! - CHECKSUM (2 bytes)

use heapless::Vec;

use crate::crc::crc16;

/// Header that opens every host → scanner frame
pub const COMMAND_HEADER: [u8; 2] = [0x7E, 0x00];

/// Header that opens every scanner → host frame
pub const RESPONSE_HEADER: [u8; 2] = [0x02, 0x00];

/// Checksum the scanner accepts when CRC validation is disabled
pub const CHECKSUM_PLACEHOLDER: [u8; 2] = [0xAB, 0xCD];

/// Response status byte for a successful command
pub const STATUS_OK: u8 = 0x00;

/// Maximum DATA bytes carried by one command
pub const MAX_DATA_SIZE: usize = 32;

/// Size of HEADER + TYPE + LENGTH + ADDRESS
pub const COMMAND_PREFIX_SIZE: usize = 6;

/// Maximum complete command size (prefix + data + checksum)
pub const MAX_COMMAND_SIZE: usize = COMMAND_PREFIX_SIZE + MAX_DATA_SIZE + 2;

/// Size of HEADER + STATUS + LENGTH in a response
pub const RESPONSE_PREFIX_SIZE: usize = 4;

/// Errors that can occur during frame encoding or response parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Data exceeds maximum allowed size
    DataTooLarge,
    /// No response header in the received bytes
    MissingHeader,
    /// Header found but the declared length is not fully received
    Incomplete,
    /// Trailing checksum is neither the CRC nor the placeholder
    InvalidChecksum,
}

/// Command type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandType {
    /// Read zone bits
    ReadZone = 0x07,
    /// Write zone bits (volatile until saved)
    WriteZone = 0x08,
    /// Save all zone bits to the scanner's internal flash
    SaveZones = 0x09,
}

/// How the trailing two bytes of a command are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Checksum {
    /// Real CRC-16 over the frame body
    Crc,
    /// Fixed 0xAB 0xCD marker
    Placeholder,
}

impl Checksum {
    /// Map the driver-level `use_crc` flag
    pub fn from_flag(use_crc: bool) -> Self {
        if use_crc {
            Checksum::Crc
        } else {
            Checksum::Placeholder
        }
    }

    /// Checksum bytes for `body`
    pub fn compute(self, body: &[u8]) -> [u8; 2] {
        match self {
            Checksum::Crc => crc16(body),
            Checksum::Placeholder => CHECKSUM_PLACEHOLDER,
        }
    }
}

/// A command frame before its checksum is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command type
    pub kind: CommandType,
    /// Zone address
    pub address: u16,
    /// Data bytes
    pub data: Vec<u8, MAX_DATA_SIZE>,
}

impl Command {
    /// Create a command with arbitrary data
    pub fn new(kind: CommandType, address: u16, data: &[u8]) -> Result<Self, FrameError> {
        let mut vec = Vec::new();
        vec.extend_from_slice(data)
            .map_err(|_| FrameError::DataTooLarge)?;
        Ok(Self {
            kind,
            address,
            data: vec,
        })
    }

    /// Read `count` bytes starting at `address`
    pub fn read_zone(address: u16, count: u8) -> Self {
        let mut data = Vec::new();
        // Capacity is well above one byte
        let _ = data.push(count);
        Self {
            kind: CommandType::ReadZone,
            address,
            data,
        }
    }

    /// Write `data` starting at `address`
    pub fn write_zone(address: u16, data: &[u8]) -> Result<Self, FrameError> {
        Self::new(CommandType::WriteZone, address, data)
    }

    /// Persist the whole zone table
    pub fn save_zones() -> Self {
        Self::read_zone(0x0000, 0x00).with_kind(CommandType::SaveZones)
    }

    fn with_kind(mut self, kind: CommandType) -> Self {
        self.kind = kind;
        self
    }

    /// Encode everything except the checksum
    pub fn body(&self) -> Vec<u8, MAX_COMMAND_SIZE> {
        let mut out = Vec::new();
        // The prefix plus at most MAX_DATA_SIZE bytes always fits
        let _ = out.extend_from_slice(&COMMAND_HEADER);
        let _ = out.push(self.kind as u8);
        let _ = out.push(self.data.len() as u8);
        let _ = out.extend_from_slice(&self.address.to_be_bytes());
        let _ = out.extend_from_slice(&self.data);
        out
    }

    /// Encode the complete frame
    pub fn encode(&self, checksum: Checksum) -> Vec<u8, MAX_COMMAND_SIZE> {
        let mut out = self.body();
        let sum = checksum.compute(&out);
        let _ = out.extend_from_slice(&sum);
        out
    }
}

/// Attach a checksum to an already-built frame body
pub fn seal(body: &[u8], checksum: Checksum) -> Result<Vec<u8, MAX_COMMAND_SIZE>, FrameError> {
    let mut out = Vec::new();
    out.extend_from_slice(body)
        .map_err(|_| FrameError::DataTooLarge)?;
    out.extend_from_slice(&checksum.compute(body))
        .map_err(|_| FrameError::DataTooLarge)?;
    Ok(out)
}

/// A response located inside a receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    /// Status byte (0x00 = success)
    pub status: u8,
    /// Data bytes, exactly as long as the declared length
    pub payload: &'a [u8],
    /// Header through payload, the span covered by the checksum
    covered: &'a [u8],
    /// Trailing checksum, if it has been received
    checksum: Option<[u8; 2]>,
}

impl<'a> Response<'a> {
    /// Locate the first response in `buf`
    ///
    /// Bytes before the header are skipped. Fails with
    /// [`FrameError::MissingHeader`] when no header is present and
    /// [`FrameError::Incomplete`] when the declared data has not all
    /// arrived yet.
    pub fn find(buf: &'a [u8]) -> Result<Self, FrameError> {
        let start = find_header(buf).ok_or(FrameError::MissingHeader)?;
        let frame = &buf[start..];
        if frame.len() < RESPONSE_PREFIX_SIZE {
            return Err(FrameError::Incomplete);
        }

        let status = frame[2];
        let length = frame[3] as usize;
        let end = RESPONSE_PREFIX_SIZE + length;
        if frame.len() < end {
            return Err(FrameError::Incomplete);
        }

        let checksum = frame.get(end..end + 2).map(|c| [c[0], c[1]]);
        Ok(Self {
            status,
            payload: &frame[RESPONSE_PREFIX_SIZE..end],
            covered: &frame[..end],
            checksum,
        })
    }

    /// Locate and validate a response in one step
    pub fn parse(buf: &'a [u8]) -> Result<Self, FrameError> {
        let response = Self::find(buf)?;
        if !response.checksum_valid() {
            return Err(FrameError::InvalidChecksum);
        }
        Ok(response)
    }

    /// Whether the status byte reports success
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Accepts the real CRC, the placeholder, or a checksum not yet received
    pub fn checksum_valid(&self) -> bool {
        match self.checksum {
            None => true,
            Some(sum) => sum == CHECKSUM_PLACEHOLDER || sum == crc16(self.covered),
        }
    }
}

/// Index of the first response header in `buf`
pub fn find_header(buf: &[u8]) -> Option<usize> {
    buf.windows(RESPONSE_HEADER.len())
        .position(|w| w == RESPONSE_HEADER)
}

/// Whether `buf` already holds a header plus all its declared data
pub fn response_complete(buf: &[u8]) -> bool {
    !matches!(
        Response::find(buf),
        Err(FrameError::MissingHeader) | Err(FrameError::Incomplete)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_zone_encoding() {
        let frame = Command::read_zone(0x0002, 1).encode(Checksum::Placeholder);
        assert_eq!(
            frame.as_slice(),
            &[0x7E, 0x00, 0x07, 0x01, 0x00, 0x02, 0x01, 0xAB, 0xCD]
        );
    }

    #[test]
    fn test_write_zone_with_crc() {
        let frame = Command::write_zone(0x0002, &[0x01])
            .unwrap()
            .encode(Checksum::Crc);
        assert_eq!(
            frame.as_slice(),
            &[0x7E, 0x00, 0x08, 0x01, 0x00, 0x02, 0x01, 0xB4, 0x33]
        );
    }

    #[test]
    fn test_save_zones_encoding() {
        let frame = Command::save_zones().encode(Checksum::Placeholder);
        assert_eq!(
            frame.as_slice(),
            &[0x7E, 0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0xAB, 0xCD]
        );
    }

    #[test]
    fn test_address_is_big_endian() {
        let body = Command::write_zone(0x1234, &[0xAA, 0xBB]).unwrap().body();
        assert_eq!(body[3], 2); // length
        assert_eq!(&body[4..6], &[0x12, 0x34]);
        assert_eq!(&body[6..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_data_too_large() {
        let data = [0u8; MAX_DATA_SIZE + 1];
        assert_eq!(
            Command::write_zone(0, &data),
            Err(FrameError::DataTooLarge)
        );
    }

    #[test]
    fn test_seal_matches_encode() {
        let cmd = Command::read_zone(0x0000, 1);
        let sealed = seal(&cmd.body(), Checksum::Crc).unwrap();
        assert_eq!(sealed, cmd.encode(Checksum::Crc));
    }

    #[test]
    fn test_response_after_garbage() {
        let buf = [0xFF, 0x13, 0x02, 0x00, 0x00, 0x01, 0x05, 0xAB, 0xCD];
        let response = Response::parse(&buf).unwrap();
        assert!(response.is_success());
        assert_eq!(response.payload, &[0x05]);
    }

    #[test]
    fn test_response_crc_accepted() {
        // CRC-16 of 02 00 00 01 01 is 0x6793
        let buf = [0x02, 0x00, 0x00, 0x01, 0x01, 0x67, 0x93];
        assert!(Response::parse(&buf).is_ok());
    }

    #[test]
    fn test_response_bad_checksum() {
        let buf = [0x02, 0x00, 0x00, 0x01, 0x01, 0x12, 0x34];
        assert_eq!(Response::parse(&buf), Err(FrameError::InvalidChecksum));
    }

    #[test]
    fn test_response_without_checksum_yet() {
        let buf = [0x02, 0x00, 0x00, 0x01, 0x01];
        let response = Response::parse(&buf).unwrap();
        assert_eq!(response.payload, &[0x01]);
    }

    #[test]
    fn test_response_incomplete() {
        assert_eq!(
            Response::find(&[0x02, 0x00, 0x00]),
            Err(FrameError::Incomplete)
        );
        assert_eq!(
            Response::find(&[0x02, 0x00, 0x00, 0x03, 0x01]),
            Err(FrameError::Incomplete)
        );
        assert!(!response_complete(&[0x02, 0x00, 0x00, 0x03, 0x01]));
    }

    #[test]
    fn test_response_missing_header() {
        assert_eq!(
            Response::find(&[0x7E, 0x00, 0x08]),
            Err(FrameError::MissingHeader)
        );
        assert_eq!(Response::find(&[]), Err(FrameError::MissingHeader));
    }

    #[test]
    fn test_error_status() {
        let buf = [0x02, 0x00, 0x01, 0x00, 0xAB, 0xCD];
        let response = Response::parse(&buf).unwrap();
        assert!(!response.is_success());
        assert!(response.payload.is_empty());
    }

    proptest! {
        #[test]
        fn prop_response_payload_roundtrip(
            status in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..32),
            use_crc in any::<bool>(),
        ) {
            let mut buf = std::vec![0x02, 0x00, status, payload.len() as u8];
            buf.extend_from_slice(&payload);
            let sum = Checksum::from_flag(use_crc).compute(&buf);
            buf.extend_from_slice(&sum);

            let response = Response::parse(&buf).unwrap();
            prop_assert_eq!(response.status, status);
            prop_assert_eq!(response.payload, payload.as_slice());
        }
    }
}
