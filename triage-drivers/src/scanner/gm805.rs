//! GM805 barcode scanner (serial, zone-bit protocol)
//!
//! The GM805 is configured by reading and writing byte-wide "zones" with
//! framed commands (see `triage_protocol::frame`). In command-trigger mode
//! the host sets bit 0 of the trigger zone and the scanner answers with the
//! decoded symbol as plain bytes, usually ending in CR/LF.
//!
//! # Waits
//!
//! - Command acknowledgements are busy-polled with short blocking sleeps,
//!   bounded by the ack timeout.
//! - Code reads end on a line feed, on an idle gap after the first byte, or
//!   on the overall timeout. The async variant yields between polls.
//!
//! A timeout is a normal outcome and reported as `None`.

use embedded_hal::delay::DelayNs as BlockingDelay;
use embedded_hal_async::delay::DelayNs as AsyncDelay;
use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;

use triage_core::config::StationConfig;
use triage_core::traits::CodeScanner;
use triage_hal::{Clock, UartConfig};
use triage_protocol::frame::{
    self, Checksum, Command, Response, MAX_DATA_SIZE, RESPONSE_HEADER, RESPONSE_PREFIX_SIZE,
};
use triage_protocol::zone::{ScanMode, Zone, HEARTBEAT_FRAME, TRIGGER_BIT};
use triage_protocol::{ScanCode, MAX_CODE_LEN};

/// Capacity for one acknowledgement
pub const RX_BUFFER_SIZE: usize = 64;

/// Raw bytes collected while waiting for an acknowledgement
pub type RxBuffer = Vec<u8, RX_BUFFER_SIZE>;

/// Zone bytes returned by a read
pub type ZoneData = Vec<u8, MAX_DATA_SIZE>;

/// Character times of silence that always count as an idle gap
pub const MIN_IDLE_CHARS: u32 = 8;

/// GM805 driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gm805Config {
    /// Send real CRCs instead of the placeholder
    pub use_crc: bool,
    /// Bound on an acknowledgement wait (ms)
    pub ack_timeout_ms: u32,
    /// Sleep between acknowledgement polls (ms)
    pub ack_poll_ms: u32,
    /// Bound on one code read (ms)
    pub read_timeout_ms: u32,
    /// Silence after the first code byte that ends a read (ms)
    pub idle_gap_ms: u32,
    /// Sleep between code polls (ms)
    pub read_poll_ms: u32,
}

impl Default for Gm805Config {
    fn default() -> Self {
        Self {
            use_crc: false,
            ack_timeout_ms: 300,
            ack_poll_ms: 5,
            read_timeout_ms: 2000,
            idle_gap_ms: 40,
            read_poll_ms: 2,
        }
    }
}

impl Gm805Config {
    /// Take the scanner settings from the station configuration
    pub fn from_station(config: &StationConfig) -> Self {
        Self {
            use_crc: config.use_crc,
            ack_timeout_ms: config.scanner.ack_timeout_ms,
            read_timeout_ms: config.scanner.read_timeout_ms,
            idle_gap_ms: config.scanner.idle_gap_ms,
            ..Self::default()
        }
    }

    /// Raise the idle gap to at least [`MIN_IDLE_CHARS`] character times on `link`
    ///
    /// At slow baud rates a configured gap can be shorter than the pause
    /// between two bytes of the same code.
    pub fn for_link(self, link: &UartConfig) -> Self {
        let floor_ms = link
            .char_time_us()
            .saturating_mul(MIN_IDLE_CHARS)
            .div_ceil(1000);
        Self {
            idle_gap_ms: self.idle_gap_ms.max(floor_ms),
            ..self
        }
    }
}

/// GM805 driver over a serial port
///
/// `T` supplies both the millisecond clock and the sleeps.
pub struct Gm805<P, T> {
    port: P,
    timer: T,
    config: Gm805Config,
}

impl<P, T> Gm805<P, T>
where
    P: Read + ReadReady + Write,
    T: Clock,
{
    /// Create a driver
    pub fn new(port: P, timer: T, config: Gm805Config) -> Self {
        Self {
            port,
            timer,
            config,
        }
    }

    /// Driver configuration
    pub fn config(&self) -> &Gm805Config {
        &self.config
    }

    /// Release the port and timer
    pub fn release(self) -> (P, T) {
        (self.port, self.timer)
    }

    fn checksum(&self) -> Checksum {
        Checksum::from_flag(self.config.use_crc)
    }

    /// Seal and transmit `payload`; returns `false` if the port failed
    fn transmit(&mut self, payload: &[u8], checksum: Checksum) -> bool {
        let Ok(frame) = frame::seal(payload, checksum) else {
            return false;
        };
        self.write_raw(&frame)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> bool {
        if self.port.write_all(bytes).is_err() || self.port.flush().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("scanner write failed");
            return false;
        }
        true
    }

    /// Move whatever the port has buffered into `buf`
    ///
    /// Bytes beyond the buffer's capacity are discarded.
    fn drain_into(&mut self, buf: &mut RxBuffer) {
        let mut chunk = [0u8; 16];
        while matches!(self.port.read_ready(), Ok(true)) {
            match self.port.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    for &byte in &chunk[..n] {
                        let _ = buf.push(byte);
                    }
                }
            }
        }
    }

    /// Next received byte, if one is waiting
    fn poll_byte(&mut self) -> Option<u8> {
        if !matches!(self.port.read_ready(), Ok(true)) {
            return None;
        }
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    /// Transmit the scanner's link-check frame without waiting
    pub fn heartbeat(&mut self) -> bool {
        self.write_raw(&HEARTBEAT_FRAME)
    }

    /// Set the trigger bit without reading it first or waiting for the ack
    ///
    /// The scanner's acknowledgement is left in the port and skipped by the
    /// next code read.
    pub fn trigger_fire_and_forget(&mut self) {
        let Ok(command) = Command::write_zone(Zone::Trigger.address(), &[TRIGGER_BIT]) else {
            return;
        };
        self.transmit(&command.body(), self.checksum());
    }

    fn begin_read(&self, timeout_ms: u32, idle_gap_ms: u32) -> CodeRead {
        let start = self.timer.now_ms();
        CodeRead {
            start,
            last: start,
            timeout_ms: u64::from(timeout_ms),
            idle_gap_ms: u64::from(idle_gap_ms),
            code: CodeBuffer::new(),
        }
    }

    /// One poll of a code read; the caller sleeps on [`ReadStep::Idle`]
    fn read_step(&mut self, read: &mut CodeRead) -> ReadStep {
        if self.timer.elapsed_ms(read.start) >= read.timeout_ms {
            return ReadStep::Done;
        }
        match self.poll_byte() {
            Some(byte) => {
                read.last = self.timer.now_ms();
                if read.code.push(byte) {
                    ReadStep::Done
                } else {
                    ReadStep::Byte
                }
            }
            None if read.code.has_data() && self.timer.elapsed_ms(read.last) > read.idle_gap_ms => {
                ReadStep::Done
            }
            None => ReadStep::Idle,
        }
    }
}

impl<P, T> Gm805<P, T>
where
    P: Read + ReadReady + Write,
    T: Clock + BlockingDelay,
{
    /// Transmit `payload` with its checksum and optionally wait for the ack
    ///
    /// With `wait_ack`, polls until a response header plus its declared
    /// data has arrived or `ack_timeout_ms` passes. Returns everything
    /// received, or `None` when nothing arrived (or no wait was requested).
    pub fn send_request(
        &mut self,
        payload: &[u8],
        checksum: Checksum,
        wait_ack: bool,
        ack_timeout_ms: u32,
    ) -> Option<RxBuffer> {
        if !self.transmit(payload, checksum) || !wait_ack {
            return None;
        }

        let start = self.timer.now_ms();
        let mut buf = RxBuffer::new();
        while self.timer.elapsed_ms(start) < u64::from(ack_timeout_ms) {
            self.drain_into(&mut buf);
            if frame::response_complete(&buf) {
                return Some(buf);
            }
            BlockingDelay::delay_ms(&mut self.timer, self.config.ack_poll_ms);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("scanner ack timeout, {} bytes", buf.len());
        (!buf.is_empty()).then_some(buf)
    }

    fn request(&mut self, command: &Command) -> Option<RxBuffer> {
        let checksum = self.checksum();
        let timeout = self.config.ack_timeout_ms;
        self.send_request(&command.body(), checksum, true, timeout)
    }

    /// Read `length` bytes of zone data starting at `address`
    ///
    /// `None` on timeout, malformed response, error status, or a short
    /// payload.
    pub fn read_zone(&mut self, address: u16, length: u8) -> Option<ZoneData> {
        let raw = self.request(&Command::read_zone(address, length))?;
        let response = Response::parse(&raw).ok()?;
        let wanted = usize::from(length);
        if !response.is_success() || response.payload.len() < wanted {
            return None;
        }
        Vec::from_slice(&response.payload[..wanted]).ok()
    }

    /// Write zone data (volatile until [`persist_configuration`](Self::persist_configuration))
    ///
    /// Returns whether the scanner acknowledged success.
    pub fn write_zone(&mut self, address: u16, data: &[u8]) -> bool {
        let Ok(command) = Command::write_zone(address, data) else {
            return false;
        };
        self.request(&command).is_some_and(|raw| acknowledged(&raw))
    }

    /// Save all zones to the scanner's flash
    pub fn persist_configuration(&mut self) -> bool {
        self.request(&Command::save_zones())
            .is_some_and(|raw| acknowledged(&raw))
    }

    /// Read-modify-write the trigger bit
    ///
    /// The scanner clears the bit itself after a read, so it is never
    /// cleared here.
    pub fn trigger_once(&mut self) -> bool {
        let current = self.read_zone_byte(Zone::Trigger);
        self.write_zone(Zone::Trigger.address(), &[current | TRIGGER_BIT])
    }

    /// Switch the operating mode, writing only when it differs
    pub fn set_mode(&mut self, mode: ScanMode, persist: bool) -> bool {
        let current = self.read_zone_byte(Zone::Mode);
        let wanted = mode.apply(current);
        if wanted == current {
            return true;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("scanner mode {} -> {}", ScanMode::from_zone(current), mode);
        let written = self.write_zone(Zone::Mode.address(), &[wanted]);
        if written && persist {
            return self.persist_configuration();
        }
        written
    }

    /// Put the scanner in command-trigger mode
    pub fn set_command_trigger_mode(&mut self, persist: bool) -> bool {
        self.set_mode(ScanMode::Command, persist)
    }

    /// Zone byte, or zero when the read fails
    fn read_zone_byte(&mut self, zone: Zone) -> u8 {
        self.read_zone(zone.address(), 1)
            .and_then(|data| data.first().copied())
            .unwrap_or(0)
    }

    /// Wait for one code, blocking
    pub fn read_code(&mut self, timeout_ms: u32, idle_gap_ms: u32) -> Option<ScanCode> {
        let mut read = self.begin_read(timeout_ms, idle_gap_ms);
        loop {
            match self.read_step(&mut read) {
                ReadStep::Done => break,
                ReadStep::Idle => BlockingDelay::delay_ms(&mut self.timer, self.config.read_poll_ms),
                ReadStep::Byte => {}
            }
        }
        read.code.finish()
    }
}

impl<P, T> Gm805<P, T>
where
    P: Read + ReadReady + Write,
    T: Clock + AsyncDelay,
{
    /// Wait for one code, yielding to the executor between polls
    pub async fn read_code_async(&mut self, timeout_ms: u32, idle_gap_ms: u32) -> Option<ScanCode> {
        let mut read = self.begin_read(timeout_ms, idle_gap_ms);
        loop {
            match self.read_step(&mut read) {
                ReadStep::Done => break,
                ReadStep::Idle => {
                    AsyncDelay::delay_ms(&mut self.timer, self.config.read_poll_ms).await
                }
                ReadStep::Byte => {}
            }
        }
        read.code.finish()
    }
}

impl<P, T> CodeScanner for Gm805<P, T>
where
    P: Read + ReadReady + Write,
    T: Clock + AsyncDelay,
{
    fn trigger(&mut self) {
        self.trigger_fire_and_forget();
    }

    async fn read_code(&mut self) -> Option<ScanCode> {
        let Gm805Config {
            read_timeout_ms,
            idle_gap_ms,
            ..
        } = self.config;
        self.read_code_async(read_timeout_ms, idle_gap_ms).await
    }
}

/// Whether `raw` holds a well-formed success response
fn acknowledged(raw: &[u8]) -> bool {
    Response::parse(raw).is_ok_and(|response| response.is_success())
}

/// State of one code read
struct CodeRead {
    start: u64,
    last: u64,
    timeout_ms: u64,
    idle_gap_ms: u64,
    code: CodeBuffer,
}

/// Outcome of one poll
enum ReadStep {
    /// A byte arrived, poll again straight away
    Byte,
    /// Nothing waiting
    Idle,
    /// Line end, idle gap or timeout
    Done,
}

/// Accumulates one code, skipping acknowledgement frames in front of it
struct CodeBuffer {
    bytes: Vec<u8, { MAX_CODE_LEN + RX_BUFFER_SIZE }>,
}

impl CodeBuffer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Whether the buffer currently holds the start of a response frame
    fn in_ack(&self) -> bool {
        match self.bytes.as_slice() {
            [] => false,
            [first] => *first == RESPONSE_HEADER[0],
            [first, second, ..] => [*first, *second] == RESPONSE_HEADER,
        }
    }

    /// Add a byte; returns `true` at the end of a line
    fn push(&mut self, byte: u8) -> bool {
        if byte == b'\n' && !self.in_ack() {
            return true;
        }
        let _ = self.bytes.push(byte);

        if self.in_ack() && self.bytes.len() >= RESPONSE_PREFIX_SIZE {
            let frame_len = RESPONSE_PREFIX_SIZE + usize::from(self.bytes[3]) + 2;
            if self.bytes.len() >= frame_len {
                self.bytes.clear();
            }
        }
        false
    }

    /// Whether code bytes (not ack bytes) have arrived
    fn has_data(&self) -> bool {
        !self.bytes.is_empty() && !self.in_ack()
    }

    fn finish(self) -> Option<ScanCode> {
        if !self.has_data() {
            return None;
        }
        ScanCode::decode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};
    use embassy_futures::block_on;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use triage_protocol::crc16;

    /// Shared simulated time in nanoseconds
    #[derive(Clone, Default)]
    struct SimTime(Rc<Cell<u64>>);

    impl SimTime {
        fn advance_ns(&self, ns: u64) {
            self.0.set(self.0.get() + ns);
        }

        fn ms(&self) -> u64 {
            self.0.get() / 1_000_000
        }
    }

    impl Clock for SimTime {
        fn now_ms(&self) -> u64 {
            self.ms()
        }
    }

    impl BlockingDelay for SimTime {
        fn delay_ns(&mut self, ns: u32) {
            self.advance_ns(u64::from(ns));
        }
    }

    impl AsyncDelay for SimTime {
        async fn delay_ns(&mut self, ns: u32) {
            self.advance_ns(u64::from(ns));
            embassy_futures::yield_now().await;
        }
    }

    /// Simulated GM805 with a zone table
    struct Device {
        time: SimTime,
        zones: [u8; 16],
        saved: bool,
        silent: bool,
        written: std::vec::Vec<std::vec::Vec<u8>>,
        /// (arrival time in ms, byte)
        rx: VecDeque<(u64, u8)>,
    }

    #[derive(Clone)]
    struct MockPort(Rc<RefCell<Device>>);

    impl MockPort {
        fn new(time: SimTime) -> Self {
            Self(Rc::new(RefCell::new(Device {
                time,
                zones: [0; 16],
                saved: false,
                silent: false,
                written: std::vec::Vec::new(),
                rx: VecDeque::new(),
            })))
        }

        /// Queue bytes arriving `delay_ms` from now
        fn incoming(&self, delay_ms: u64, bytes: &[u8]) {
            let mut dev = self.0.borrow_mut();
            let at = dev.time.ms() + delay_ms;
            for &b in bytes {
                dev.rx.push_back((at, b));
            }
        }

        fn respond(dev: &mut Device, status: u8, data: &[u8]) {
            let mut frame = std::vec![0x02, 0x00, status, data.len() as u8];
            frame.extend_from_slice(data);
            let sum = crc16(&frame);
            frame.extend_from_slice(&sum);
            let at = dev.time.ms() + 1;
            for b in frame {
                dev.rx.push_back((at, b));
            }
        }
    }

    impl embedded_io::ErrorType for MockPort {
        type Error = core::convert::Infallible;
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let mut dev = self.0.borrow_mut();
            dev.written.push(buf.to_vec());
            if dev.silent || buf.len() < 8 || buf[..2] != [0x7E, 0x00] {
                return Ok(buf.len());
            }

            let addr = usize::from(u16::from_be_bytes([buf[4], buf[5]]));
            let data = &buf[6..buf.len() - 2];
            match buf[2] {
                0x07 => {
                    let count = usize::from(data[0]);
                    let bytes = dev.zones[addr..addr + count].to_vec();
                    Self::respond(&mut dev, 0x00, &bytes);
                }
                0x08 => {
                    dev.zones[addr..addr + data.len()].copy_from_slice(data);
                    Self::respond(&mut dev, 0x00, &[0x00]);
                }
                0x09 => {
                    dev.saved = true;
                    Self::respond(&mut dev, 0x00, &[0x00]);
                }
                _ => Self::respond(&mut dev, 0x01, &[]),
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ReadReady for MockPort {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            let dev = self.0.borrow();
            let now = dev.time.ms();
            Ok(dev.rx.front().is_some_and(|&(at, _)| at <= now))
        }
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut dev = self.0.borrow_mut();
            let now = dev.time.ms();
            let mut n = 0;
            while n < buf.len() && dev.rx.front().is_some_and(|&(at, _)| at <= now) {
                if let Some((_, b)) = dev.rx.pop_front() {
                    buf[n] = b;
                    n += 1;
                }
            }
            Ok(n)
        }
    }

    fn scanner() -> (Gm805<MockPort, SimTime>, MockPort, SimTime) {
        let time = SimTime::default();
        let port = MockPort::new(time.clone());
        let driver = Gm805::new(port.clone(), time.clone(), Gm805Config::default());
        (driver, port, time)
    }

    #[test]
    fn test_idle_gap_floor_follows_baud_rate() {
        let config = Gm805Config::default();
        assert_eq!(config.for_link(&UartConfig::scanner()).idle_gap_ms, 40);

        // 8334 us per character at 1200 baud
        let slow = UartConfig::scanner().with_baudrate(1200);
        assert_eq!(config.for_link(&slow).idle_gap_ms, 67);
    }

    #[test]
    fn test_write_then_read_zone() {
        let (mut gm, _port, _time) = scanner();
        assert!(gm.write_zone(0x0004, &[0xDE, 0xAD]));
        assert_eq!(gm.read_zone(0x0004, 2).unwrap().as_slice(), &[0xDE, 0xAD]);
    }

    #[test]
    fn test_request_frames_on_the_wire() {
        let (mut gm, port, _time) = scanner();
        gm.read_zone(0x0002, 1);
        gm.persist_configuration();
        let dev = port.0.borrow();
        assert_eq!(
            dev.written[0],
            [0x7E, 0x00, 0x07, 0x01, 0x00, 0x02, 0x01, 0xAB, 0xCD]
        );
        assert_eq!(
            dev.written[1],
            [0x7E, 0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0xAB, 0xCD]
        );
    }

    #[test]
    fn test_crc_when_enabled() {
        let time = SimTime::default();
        let port = MockPort::new(time.clone());
        let config = Gm805Config {
            use_crc: true,
            ..Gm805Config::default()
        };
        let mut gm = Gm805::new(port.clone(), time, config);
        gm.write_zone(0x0002, &[0x01]);
        assert_eq!(&port.0.borrow().written[0][7..], &[0xB4, 0x33]);
    }

    #[test]
    fn test_ack_timeout_is_no_data() {
        let (mut gm, port, time) = scanner();
        port.0.borrow_mut().silent = true;
        assert_eq!(gm.read_zone(0x0000, 1), None);
        assert!(time.ms() >= 300);
    }

    #[test]
    fn test_no_wait_returns_immediately() {
        let (mut gm, _port, time) = scanner();
        let body = Command::read_zone(0, 1).body();
        assert_eq!(gm.send_request(&body, Checksum::Placeholder, false, 300), None);
        assert_eq!(time.ms(), 0);
    }

    #[test]
    fn test_set_command_trigger_mode_writes_once() {
        let (mut gm, port, _time) = scanner();
        port.0.borrow_mut().zones[0] = 0xF2;

        assert!(gm.set_command_trigger_mode(true));
        {
            let dev = port.0.borrow();
            assert_eq!(dev.zones[0], 0xF1);
            assert!(dev.saved);
            assert_eq!(dev.written.len(), 3); // read, write, save
        }

        // Already in command mode: read only
        assert!(gm.set_command_trigger_mode(false));
        assert_eq!(port.0.borrow().written.len(), 4);
    }

    #[test]
    fn test_trigger_once_sets_bit() {
        let (mut gm, port, _time) = scanner();
        port.0.borrow_mut().zones[2] = 0x40;
        assert!(gm.trigger_once());
        assert_eq!(port.0.borrow().zones[2], 0x41);
    }

    #[test]
    fn test_fire_and_forget_frame() {
        let (mut gm, port, time) = scanner();
        gm.trigger_fire_and_forget();
        assert_eq!(
            port.0.borrow().written[0],
            [0x7E, 0x00, 0x08, 0x01, 0x00, 0x02, 0x01, 0xAB, 0xCD]
        );
        assert_eq!(time.ms(), 0);
    }

    #[test]
    fn test_heartbeat_frame() {
        let (mut gm, port, _time) = scanner();
        assert!(gm.heartbeat());
        assert_eq!(port.0.borrow().written[0], HEARTBEAT_FRAME);
    }

    #[test]
    fn test_read_code_line_terminated() {
        let (mut gm, port, _time) = scanner();
        port.incoming(100, b"42-Kim-ER5\r\nextra");
        let code = gm.read_code(2000, 40).unwrap();
        assert_eq!(code.as_text(), Some("42-Kim-ER5"));
    }

    #[test]
    fn test_read_code_idle_gap() {
        let (mut gm, port, time) = scanner();
        port.incoming(10, b"ABC");
        port.incoming(500, b"DEF");
        let code = gm.read_code(2000, 40).unwrap();
        assert_eq!(code.as_text(), Some("ABC"));
        assert!(time.ms() < 100);
    }

    #[test]
    fn test_read_code_timeout() {
        let (mut gm, _port, time) = scanner();
        assert_eq!(gm.read_code(2000, 40), None);
        assert!(time.ms() >= 2000);
    }

    #[test]
    fn test_read_code_raw_fallback() {
        let (mut gm, port, _time) = scanner();
        port.incoming(5, &[0xC3, 0x28, b'\n']);
        assert_eq!(
            gm.read_code(2000, 40),
            Some(ScanCode::Raw(Vec::from_slice(&[0xC3, 0x28]).unwrap()))
        );
    }

    #[test]
    fn test_async_read_skips_trigger_ack() {
        let (mut gm, port, _time) = scanner();
        CodeScanner::trigger(&mut gm);
        // Ack arrives after 1 ms, the code long after the idle gap
        port.incoming(300, b"7-Lee-OR\r\n");

        let code = block_on(CodeScanner::read_code(&mut gm)).unwrap();
        assert_eq!(code.as_text(), Some("7-Lee-OR"));
    }

    #[test]
    fn test_async_read_code_idle_gap() {
        let (mut gm, port, time) = scanner();
        port.incoming(10, b"ABC");
        port.incoming(500, b"DEF");
        let code = block_on(gm.read_code_async(2000, 40)).unwrap();
        assert_eq!(code.as_text(), Some("ABC"));
        assert!(time.ms() < 100);
    }

    #[test]
    fn test_async_read_code_timeout() {
        let (mut gm, _port, time) = scanner();
        assert_eq!(block_on(gm.read_code_async(2000, 40)), None);
        assert!(time.ms() >= 2000);
    }

    #[test]
    fn test_blocking_and_async_reads_agree() {
        for input in [&b"9-Ng-ICU\r\n"[..], &b"  \r\n"[..], &[0xC3, 0x28, b'\n'][..]] {
            let (mut blocking, port, _time) = scanner();
            port.incoming(20, input);
            let (mut yielding, port, _time) = scanner();
            port.incoming(20, input);
            assert_eq!(
                blocking.read_code(500, 40),
                block_on(yielding.read_code_async(500, 40))
            );
        }
    }

    #[test]
    fn test_ack_timeout_returns_partial_bytes() {
        let (mut gm, port, time) = scanner();
        port.0.borrow_mut().silent = true;
        // Header and status arrive, length and data never do
        port.incoming(1, &[0x02, 0x00, 0x00]);

        let body = Command::read_zone(0, 1).body();
        let raw = gm.send_request(&body, Checksum::Placeholder, true, 300).unwrap();
        assert_eq!(raw.as_slice(), &[0x02, 0x00, 0x00]);
        assert!(time.ms() >= 300);
    }

    #[test]
    fn test_ack_with_line_feed_in_checksum() {
        let mut code = CodeBuffer::new();
        for &b in &[0x02, 0x00, 0x00, 0x01, 0x00, 0x0A, 0x31] {
            assert!(!code.push(b));
        }
        assert!(!code.has_data());
        for &b in b"1-A" {
            code.push(b);
        }
        assert!(code.push(b'\n'));
        assert_eq!(code.finish().unwrap().as_text(), Some("1-A"));
    }
}
