//! Scan codes as emitted by the scanner
//!
//! After a trigger the scanner writes the decoded symbol followed by a line
//! terminator. Most symbols are text, but nothing stops a code from carrying
//! arbitrary bytes, so decoding falls back to the raw bytes.

use heapless::{String, Vec};

/// Longest code kept; further bytes are discarded
pub const MAX_CODE_LEN: usize = 128;

/// One decoded scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCode {
    /// Code that decoded as UTF-8
    Text(String<MAX_CODE_LEN>),
    /// Code that did not
    Raw(Vec<u8, MAX_CODE_LEN>),
}

impl ScanCode {
    /// Decode the bytes collected from the serial line
    ///
    /// Leading and trailing ASCII whitespace (including the line terminator)
    /// is stripped. Returns `None` when nothing is left, so a scan made of
    /// nothing but whitespace counts as no data.
    ///
    /// Text longer than [`MAX_CODE_LEN`] bytes is cut on a character
    /// boundary. Input only falls back to [`ScanCode::Raw`] when it is not
    /// valid UTF-8 within the kept length.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let trimmed = bytes.trim_ascii();
        if trimmed.is_empty() {
            return None;
        }

        let text = match core::str::from_utf8(trimmed) {
            Ok(text) => Some(text),
            // Invalid bytes past the kept length do not matter
            Err(e) if e.valid_up_to() >= MAX_CODE_LEN => {
                core::str::from_utf8(&trimmed[..e.valid_up_to()]).ok()
            }
            Err(_) => None,
        };

        match text {
            Some(text) => {
                let mut s = String::new();
                for c in text.chars() {
                    if s.push(c).is_err() {
                        break;
                    }
                }
                Some(ScanCode::Text(s))
            }
            None => {
                let kept = &trimmed[..trimmed.len().min(MAX_CODE_LEN)];
                Vec::from_slice(kept).ok().map(ScanCode::Raw)
            }
        }
    }

    /// Text content, if the code decoded as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScanCode::Text(s) => Some(s.as_str()),
            ScanCode::Raw(_) => None,
        }
    }

    /// Underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ScanCode::Text(s) => s.as_bytes(),
            ScanCode::Raw(v) => v.as_slice(),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ScanCode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ScanCode::Text(s) => defmt::write!(f, "Text({=str})", s.as_str()),
            ScanCode::Raw(v) => defmt::write!(f, "Raw({=[u8]})", v.as_slice()),
        }
    }
}
