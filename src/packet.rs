//! The fixed 8-byte command/status packet pair exchanged with the board.
//!
//! Command packet (host → board, interrupt endpoint 0x01):
//!
//! ```text
//! +---+---+---+---+---+---+---+---+
//! |CMD|DIG|An1|An2|Rs1|Rs2|Db1|Db2|
//! +---+---+---+---+---+---+---+---+
//! ```
//!
//! `CMD` is the command code, `DIG` the digital output bitmask, `An1`/`An2`
//! the analog output values. Bytes 4..8 belong to the counter-reset and
//! debounce commands and stay zero for command 5.
//!
//! Status packet (board → host, interrupt endpoint 0x81):
//!
//! ```text
//! +---+---+---+---+---+---+---+---+
//! |DIn|Sta|A1 |A2 |   C1  |   C2  |
//! +---+---+---+---+---+---+---+---+
//! ```
//!
//! `DIn` carries the digital inputs (see [`crate::consts::DIGITAL_IN_BIT`]
//! for the scattered bit layout), `Sta` the status byte (board number + 1),
//! `A1`/`A2` the analog inputs and `C1`/`C2` the two 16-bit pulse counters,
//! big-endian.

use crate::consts::{cmd, PACKET_LEN};

/// Cached output state, written to the board on every poll.
///
/// Mutated only through the driver's setters; a value persists across polls
/// until it is changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputState {
    /// Digital output bitmask, bit `n` = output port `n + 1`.
    pub digital: u8,
    /// Analog output 1, 0 = 0V, 255 = +5V (or 0-100% PWM).
    pub analog1: u8,
    /// Analog output 2, 0 = 0V, 255 = +5V (or 0-100% PWM).
    pub analog2: u8,
}

impl OutputState {
    /// Encodes this state as a "set analog/digital" (command 5) packet.
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        [
            cmd::SET_ANALOG_DIGITAL,
            self.digital,
            self.analog1,
            self.analog2,
            0,
            0,
            0,
            0,
        ]
    }
}

/// Cached input state, overwritten wholesale by every successful read.
///
/// After a failed poll the previous (stale) values remain observable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    /// Digital input bitmask, raw as sent by the board.
    pub digital: u8,
    /// Status byte (board number + 1).
    pub status: u8,
    /// Analog input 1, 0 = 0V, 255 = +5V.
    pub analog1: u8,
    /// Analog input 2, 0 = 0V, 255 = +5V.
    pub analog2: u8,
    /// Pulse counter 1, 16 bits.
    pub counter1: u16,
    /// Pulse counter 2, 16 bits.
    pub counter2: u16,
}

impl InputState {
    /// Decodes a full status packet.
    pub fn decode(data: &[u8; PACKET_LEN]) -> Self {
        InputState {
            digital: data[0],
            status: data[1],
            analog1: data[2],
            analog2: data[3],
            counter1: u16::from_be_bytes([data[4], data[5]]),
            counter2: u16::from_be_bytes([data[6], data[7]]),
        }
    }
}
