//! Barcode scanner drivers

pub mod gm805;

pub use gm805::{Gm805, Gm805Config};
