//! Triage Station Wire Formats
//!
//! This crate defines everything that crosses a wire in the triage station:
//! the GM805 scanner's zone-bit command protocol, the raw scan codes it
//! emits, and the `id-name-route` identity messages carried by both the
//! scanner and the radio channel.
//!
//! # Scanner Frame Overview
//!
//! Commands (host → scanner):
//! ```text
//! ┌────────┬──────┬────────┬─────────┬────────────┬──────────┐
//! │ 7E 00  │ TYPE │ LENGTH │ ADDRESS │ DATA       │ CHECKSUM │
//! │ 2B     │ 1B   │ 1B     │ 2B (BE) │ LENGTH B   │ 2B       │
//! └────────┴──────┴────────┴─────────┴────────────┴──────────┘
//! ```
//!
//! Responses (scanner → host):
//! ```text
//! ┌────────┬────────┬────────┬────────────┬──────────┐
//! │ 02 00  │ STATUS │ LENGTH │ DATA       │ CHECKSUM │
//! │ 2B     │ 1B     │ 1B     │ LENGTH B   │ 2B       │
//! └────────┴────────┴────────┴────────────┴──────────┘
//! ```
//!
//! The checksum is CRC-CCITT (XModem variant) or the fixed `AB CD`
//! placeholder, which the scanner accepts when CRC checking is off.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod code;
pub mod crc;
pub mod frame;
pub mod identity;
pub mod zone;

pub use code::{ScanCode, MAX_CODE_LEN};
pub use crc::crc16;
pub use frame::{Checksum, Command, CommandType, FrameError, Response};
pub use identity::{IdentityRecord, PatientId};
pub use zone::{ScanMode, Zone};
