//! The K8055 driver: cached I/O state plus the poll cycle.

use crate::consts::{
    DEFAULT_RW_TIMEOUT, DIGITAL_IN_BIT, DIGITAL_IN_PORTS, DIGITAL_OUT_PORTS, EP_IN, EP_OUT,
    K8055_PID, PACKET_LEN, VELLEMAN_VID,
};
use crate::error::{Error, Result};
use crate::packet::{InputState, OutputState};
use crate::transport::{LibUsbTransport, UsbTransport};
use libusb::Context;
use log::{info, trace, warn};
use std::time::Duration;

/// Driver for one Velleman K8055 board.
///
/// The driver caches output state (set via the `set_*` methods) and input
/// state (refreshed by [`poll`](K8055::poll)); no method other than `poll`
/// touches USB. The device is opened lazily on the first poll and re-opened
/// after any transfer failure, so a board can be unplugged and replugged
/// while the caller keeps polling.
///
/// Not thread-safe: one instance belongs to one caller thread. Concurrent
/// polling of the same instance is out of contract.
pub struct K8055<T: UsbTransport> {
    transport: T,
    device_index: usize,
    outputs: OutputState,
    inputs: InputState,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl<'ctx> K8055<LibUsbTransport<'ctx>> {
    /// Creates a driver for the first K8055 board on the bus.
    ///
    /// No USB traffic happens here; the board is looked up on the first
    /// [`poll`](K8055::poll).
    pub fn new(context: &'ctx Context) -> Self {
        Self::with_device_index(context, 0)
    }

    /// Creates a driver for the `index`-th K8055 board (0 for the first
    /// board, 1 for the second, and so on).
    pub fn with_device_index(context: &'ctx Context, index: usize) -> Self {
        Self::with_transport(LibUsbTransport::new(context), index)
    }
}

impl<T: UsbTransport> K8055<T> {
    /// Creates a driver over an arbitrary transport. Used by the libusb
    /// constructors and by tests driving a scripted transport.
    pub fn with_transport(transport: T, device_index: usize) -> Self {
        K8055 {
            transport,
            device_index,
            outputs: OutputState::default(),
            inputs: InputState::default(),
            read_timeout: DEFAULT_RW_TIMEOUT,
            write_timeout: DEFAULT_RW_TIMEOUT,
        }
    }

    // --- Digital outputs ---

    /// Sets or clears digital output `port` (1..=8) in the cached output
    /// state. Takes effect on the next [`poll`](K8055::poll).
    ///
    /// Output 8 flashes at board startup, so it is best reserved as a status
    /// LED rather than wired to a controlled device.
    pub fn set_digital_output(&mut self, port: u8, on: bool) -> Result<()> {
        if port < 1 || port > DIGITAL_OUT_PORTS {
            return Err(Error::PortOutOfRange {
                port,
                message: format!("digital outputs are ports 1-{}", DIGITAL_OUT_PORTS),
            });
        }
        let mask = 1u8 << (port - 1);
        if on {
            self.outputs.digital |= mask;
        } else {
            self.outputs.digital &= !mask;
        }
        Ok(())
    }

    /// Returns the cached digital output bitmask (bit `n` = port `n + 1`).
    pub fn digital_output_byte(&self) -> u8 {
        self.outputs.digital
    }

    // --- Digital inputs ---

    /// Returns the cached level of digital input `port` (1..=5), as of the
    /// last successful poll.
    pub fn digital_input(&self, port: u8) -> Result<bool> {
        if port < 1 || port > DIGITAL_IN_PORTS {
            return Err(Error::PortOutOfRange {
                port,
                message: format!("digital inputs are ports 1-{}", DIGITAL_IN_PORTS),
            });
        }
        let bit = DIGITAL_IN_BIT[usize::from(port - 1)];
        Ok(self.inputs.digital & (1 << bit) != 0)
    }

    /// Returns the raw digital input bitmask as sent by the board, without
    /// the port-to-bit mapping applied.
    pub fn digital_input_byte(&self) -> u8 {
        self.inputs.digital
    }

    // --- Analog channels ---

    /// Sets analog output 1 in the cached output state (0 = 0V, 255 = +5V
    /// or 0-100% PWM). Takes effect on the next poll.
    pub fn set_analog_output1(&mut self, value: u8) {
        self.outputs.analog1 = value;
    }

    /// Sets analog output 2 in the cached output state (0 = 0V, 255 = +5V
    /// or 0-100% PWM). Takes effect on the next poll.
    pub fn set_analog_output2(&mut self, value: u8) {
        self.outputs.analog2 = value;
    }

    /// Returns the cached analog output 1 value.
    pub fn analog_output1(&self) -> u8 {
        self.outputs.analog1
    }

    /// Returns the cached analog output 2 value.
    pub fn analog_output2(&self) -> u8 {
        self.outputs.analog2
    }

    /// Returns the cached analog input 1 value (0 = 0V, 255 = +5V).
    pub fn analog_input1(&self) -> u8 {
        self.inputs.analog1
    }

    /// Returns the cached analog input 2 value (0 = 0V, 255 = +5V).
    pub fn analog_input2(&self) -> u8 {
        self.inputs.analog2
    }

    // --- Counters and status ---

    /// Returns the cached value of pulse counter 1, masked to its low 8 bits.
    ///
    /// The status packet carries a full 16-bit counter and the driver caches
    /// all of it, but this accessor masks off the high byte. Widening the
    /// return range would change what existing callers observe, so the mask
    /// stays until the counter API is reworked together with the counter
    /// reset commands.
    pub fn counter1(&self) -> u16 {
        self.inputs.counter1 & 0xFF
    }

    /// Returns the cached value of pulse counter 2, masked to its low 8 bits.
    ///
    /// See [`counter1`](K8055::counter1) for the masking caveat.
    pub fn counter2(&self) -> u16 {
        self.inputs.counter2 & 0xFF
    }

    /// Returns the cached status byte (board number + 1).
    pub fn status(&self) -> u8 {
        self.inputs.status
    }

    // --- Timeouts ---

    /// Current interrupt read timeout. Zero blocks indefinitely.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Sets the interrupt read timeout. Zero blocks indefinitely.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Current interrupt write timeout. Zero blocks indefinitely.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Sets the interrupt write timeout. Zero blocks indefinitely.
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    // --- Poll cycle ---

    /// Sends the cached outputs to the board and reads back its status
    /// packet, reconnecting first if the device is not open.
    ///
    /// Returns `true` only if connect, write and read all succeeded in this
    /// call. On any failure the device handle is dropped (so the next poll
    /// starts with a fresh lookup), a warning is logged, and the cached
    /// input state keeps its last successfully read values. No retry happens
    /// within a single call; callers are expected to poll in a loop,
    /// typically sleeping after a failure.
    pub fn poll(&mut self) -> bool {
        self.connect() && self.write_outputs() && self.read_inputs()
    }

    fn connect(&mut self) -> bool {
        if self.transport.is_open() {
            return true;
        }
        match self
            .transport
            .open(VELLEMAN_VID, K8055_PID, self.device_index)
        {
            Ok(true) => {
                info!(
                    "connected K8055 board VID=0x{:04X} PID=0x{:04X} index={}",
                    VELLEMAN_VID, K8055_PID, self.device_index
                );
                true
            }
            Ok(false) => {
                warn!(
                    "no K8055 board found (VID=0x{:04X} PID=0x{:04X} index={})",
                    VELLEMAN_VID, K8055_PID, self.device_index
                );
                false
            }
            Err(e) => {
                warn!(
                    "failed connecting K8055 board index={}: {}",
                    self.device_index, e
                );
                false
            }
        }
    }

    fn write_outputs(&mut self) -> bool {
        let data = self.outputs.encode();
        match self
            .transport
            .write_interrupt(EP_OUT, &data, self.write_timeout)
        {
            Ok(_) => {
                trace!("wrote {:02X?}", data);
                true
            }
            Err(e) => {
                warn!("write failed: {}", e);
                self.transport.close();
                false
            }
        }
    }

    fn read_inputs(&mut self) -> bool {
        let mut data = [0u8; PACKET_LEN];
        match self.transport.read_interrupt(EP_IN, &mut data, self.read_timeout) {
            Ok(n) if n == PACKET_LEN => {
                trace!("read {} bytes: {:02X?}", n, data);
                self.inputs = InputState::decode(&data);
                true
            }
            Ok(n) => {
                warn!("read: expected {} bytes but got {}", PACKET_LEN, n);
                self.transport.close();
                false
            }
            Err(e) => {
                warn!("read failed: {}", e);
                self.transport.close();
                false
            }
        }
    }

    // --- Unimplemented board commands ---
    //
    // Commands 0-4 are part of the board protocol but this driver does not
    // send them yet; they fail with NotImplemented rather than no-opping.

    /// Board reset (command 0). Not implemented; never touches USB.
    pub fn command_reset(&mut self) -> Result<()> {
        Err(Error::NotImplemented("reset"))
    }

    /// Set debounce time for counter 1 (command 1, debounce value in byte
    /// 6). Not implemented; never touches USB.
    pub fn command_set_debounce_counter1(&mut self) -> Result<()> {
        Err(Error::NotImplemented("set debounce counter 1"))
    }

    /// Set debounce time for counter 2 (command 2, debounce value in byte
    /// 7). Not implemented; never touches USB.
    pub fn command_set_debounce_counter2(&mut self) -> Result<()> {
        Err(Error::NotImplemented("set debounce counter 2"))
    }

    /// Reset counter 1 to zero (command 3). Not implemented; never touches
    /// USB.
    pub fn command_reset_counter1(&mut self) -> Result<()> {
        Err(Error::NotImplemented("reset counter 1"))
    }

    /// Reset counter 2 to zero (command 4). Not implemented; never touches
    /// USB.
    pub fn command_reset_counter2(&mut self) -> Result<()> {
        Err(Error::NotImplemented("reset counter 2"))
    }
}
