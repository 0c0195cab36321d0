//! Hardware abstraction traits
//!
//! These traits define the interface between the triage logic and the
//! scanner, panel and radio implementations.

pub mod display;
pub mod radio;
pub mod scanner;

pub use display::{DisplayError, SlotDisplay};
pub use radio::{RadioLink, RadioTransport};
pub use scanner::CodeScanner;
