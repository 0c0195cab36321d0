//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in triage-core:
//!
//! - GM805 barcode scanner over a serial port
//! - ST7735 panels sharing one SPI bus behind a select-line demultiplexer
//! - 24-bit BMP decoding for the panel logo
//! - The panel bank that paints triage slots

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod panel;
pub mod scanner;
