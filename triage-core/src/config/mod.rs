//! Configuration types
//!
//! Board-agnostic station settings. Pin assignments live in the firmware.

pub mod types;

pub use types::*;
