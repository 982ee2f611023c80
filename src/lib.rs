//! # k8055-usb
//!
//! A Rust crate for controlling the Velleman K8055 USB experiment board
//! over libusb interrupt transfers.
//!
//! The board offers:
//!
//! *   8 digital outputs (open collector, 100mA)
//! *   5 digital inputs (0 = ground, 1 = open)
//! *   2 analog inputs (0..+5V)
//! *   2 analog outputs (0..+5V, 1k5 output resistance, PWM open collector)
//! *   2 16-bit pulse counters fed by the digital inputs
//!
//! Conversion time is roughly 20 ms per command, and the board draws about
//! 70 mA from USB. Digital output 8 flashes at startup; treat it as a status
//! LED rather than wiring it to a controlled device.
//!
//! ## Model
//!
//! The driver is a cache plus a poll cycle. Output setters
//! ([`K8055::set_digital_output`], [`K8055::set_analog_output1`], ...) only
//! mutate cached state; input getters ([`K8055::digital_input`],
//! [`K8055::analog_input1`], [`K8055::counter1`], ...) only read cached
//! state. [`K8055::poll`] is the single I/O operation: it opens the board if
//! needed, writes one 8-byte command packet with the cached outputs, reads
//! one 8-byte status packet and decodes it into the cached inputs. A failed
//! poll tears the device handle down and leaves the cache stale, so the next
//! poll reconnects from scratch — hot-unplugging the board is survivable.
//!
//! `poll` reports failures as `false` (with a `log` warning), not as errors;
//! drive it in a loop and sleep after a failed cycle:
//!
//! ```no_run
//! use k8055_usb::{K8055, Result};
//! use std::{thread, time::Duration};
//!
//! fn main() -> Result<()> {
//!     let context = libusb::Context::new()?;
//!     let mut board = K8055::new(&context);
//!
//!     board.set_digital_output(1, true)?;
//!     board.set_analog_output1(128);
//!     loop {
//!         if board.poll() {
//!             println!(
//!                 "inputs={:05b} analog1={}",
//!                 board.digital_input_byte(),
//!                 board.analog_input1()
//!             );
//!         } else {
//!             thread::sleep(Duration::from_millis(1000));
//!         }
//!     }
//! }
//! ```
//!
//! ## Threading
//!
//! One `K8055` instance belongs to one thread. There is no internal locking;
//! the cached state and the device handle are unprotected. Run the poll loop
//! on a dedicated thread and share results through your own channel if other
//! threads need them.
//!
//! ## Unimplemented commands
//!
//! The board protocol defines reset, counter-reset and debounce commands
//! (codes 0..=4). The corresponding driver methods
//! ([`K8055::command_reset`], [`K8055::command_reset_counter1`], ...) exist
//! but always return [`Error::NotImplemented`] without touching USB.
//!
//! ## Hardware setup notes
//!
//! *   **Linux udev rules:** grant user permission to the board. Create
//!     `/etc/udev/rules.d/99-k8055.rules`:
//!     ```udev
//!     SUBSYSTEM=="usb", ATTRS{idVendor}=="10cf", ATTRS{idProduct}=="5500", MODE="0666", GROUP="plugdev"
//!     ```
//!     then `sudo udevadm control --reload-rules && sudo udevadm trigger`.
//! *   **Kernel driver:** the board enumerates as HID, so `usbhid` claims
//!     it; the driver detaches the kernel driver before claiming interface 0.
//! *   **Multiple boards:** boards on the default address (SK5/SK6 jumpers
//!     both on) all enumerate as PID 0x5500; pass the board index to
//!     [`K8055::with_device_index`] to pick one.

pub mod consts;
mod driver;
mod error;
pub mod packet;
pub mod transport;

pub use driver::K8055;
pub use error::{Error, Result};
pub use transport::{LibUsbTransport, UsbTransport};

// Re-export the identification constants most callers want at hand.
pub use consts::{K8055_PID, VELLEMAN_VID};
