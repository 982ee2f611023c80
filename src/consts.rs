//! Protocol constants for the Velleman K8055 experiment board.

use std::time::Duration;

/// Velleman Components vendor ID.
pub const VELLEMAN_VID: u16 = 0x10CF;
/// Product ID of the K8055 board (address jumpers SK5/SK6 both on).
pub const K8055_PID: u16 = 0x5500;

/// Interrupt OUT endpoint carrying command packets to the board.
pub const EP_OUT: u8 = 0x01;
/// Interrupt IN endpoint carrying status packets from the board.
pub const EP_IN: u8 = 0x81;

/// Both the command packet and the status packet are exactly this long.
/// A shorter read is a failed poll, never a partial update.
pub const PACKET_LEN: usize = 8;

/// Default interrupt read/write timeout. A zero timeout blocks indefinitely.
pub const DEFAULT_RW_TIMEOUT: Duration = Duration::from_millis(1000);

/// Number of open-collector digital output lines (ports 1..=8).
pub const DIGITAL_OUT_PORTS: u8 = 8;
/// Number of opto-isolated digital input lines (ports 1..=5).
pub const DIGITAL_IN_PORTS: u8 = 5;

// --- Command codes (byte 0 of the OUT packet) ---
pub mod cmd {
    /// Reset the board. Declared by the protocol, not issued by this driver.
    pub const RESET: u8 = 0x00;
    /// Set debounce time for counter 1 (debounce value in byte 6).
    pub const SET_DEBOUNCE_1: u8 = 0x01;
    /// Set debounce time for counter 2 (debounce value in byte 7).
    pub const SET_DEBOUNCE_2: u8 = 0x02;
    /// Reset counter 1 to zero.
    pub const RESET_COUNTER_1: u8 = 0x03;
    /// Reset counter 2 to zero.
    pub const RESET_COUNTER_2: u8 = 0x04;
    /// Set digital outputs and both analog outputs. The only command this
    /// driver currently sends.
    pub const SET_ANALOG_DIGITAL: u8 = 0x05;
}

/// Bit position in the status packet's input bitmask for each digital input
/// port, indexed by `port - 1`. The board scatters the five inputs over the
/// byte: inputs 1,2 in bits 4,5, input 3 in bit 0, inputs 4,5 in bits 6,7.
pub const DIGITAL_IN_BIT: [u8; DIGITAL_IN_PORTS as usize] = [4, 5, 0, 6, 7];
