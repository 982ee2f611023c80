//! USB transport seam between the driver and libusb.
//!
//! The driver only needs four things from USB: look up and open a board by
//! vendor/product ID and index, blocking interrupt writes and reads, and a
//! way to drop the handle. [`UsbTransport`] captures exactly that, so the
//! driver logic can be exercised against a scripted double while
//! [`LibUsbTransport`] talks to real hardware.

use crate::error::Result;
use libusb::{Context, DeviceHandle};
use log::{trace, warn};
use std::time::Duration;

/// Blocking USB transport owned by a single driver instance.
///
/// Implementations hold at most one open device handle. `open` is idempotent
/// while a handle is held; `close` drops it so the next `open` starts a fresh
/// lookup.
pub trait UsbTransport {
    /// Looks up the `index`-th device matching `vendor_id`/`product_id` and
    /// opens it.
    ///
    /// Returns `Ok(true)` when a handle is open after the call (whether
    /// freshly opened or already held), `Ok(false)` when no matching device
    /// is present, and `Err` when enumeration or opening fails.
    fn open(&mut self, vendor_id: u16, product_id: u16, index: usize) -> Result<bool>;

    /// True while a device handle is held.
    fn is_open(&self) -> bool;

    /// Writes `data` to the interrupt OUT endpoint `endpoint`, blocking for
    /// at most `timeout` (zero blocks indefinitely). Returns the number of
    /// bytes written.
    fn write_interrupt(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize>;

    /// Reads into `buf` from the interrupt IN endpoint `endpoint`, blocking
    /// for at most `timeout` (zero blocks indefinitely). Returns the number
    /// of bytes read, which may be fewer than `buf.len()`.
    fn read_interrupt(&mut self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Drops the device handle, if any.
    fn close(&mut self);
}

/// [`UsbTransport`] backed by libusb interrupt transfers.
///
/// Borrows a [`libusb::Context`] created by the caller; the context must
/// outlive the transport (and therefore the driver built on it).
pub struct LibUsbTransport<'ctx> {
    context: &'ctx Context,
    handle: Option<DeviceHandle<'ctx>>,
}

impl<'ctx> LibUsbTransport<'ctx> {
    /// Creates a transport with no device handle; `open` performs the lookup.
    pub fn new(context: &'ctx Context) -> Self {
        LibUsbTransport {
            context,
            handle: None,
        }
    }
}

impl<'ctx> UsbTransport for LibUsbTransport<'ctx> {
    fn open(&mut self, vendor_id: u16, product_id: u16, index: usize) -> Result<bool> {
        if self.handle.is_some() {
            return Ok(true);
        }
        let devices = self.context.devices()?;
        let mut seen = 0usize;
        for device in devices.iter() {
            let descriptor = device.device_descriptor()?;
            if descriptor.vendor_id() != vendor_id || descriptor.product_id() != product_id {
                continue;
            }
            if seen < index {
                seen += 1;
                continue;
            }
            trace!(
                "opening device VID=0x{:04X} PID=0x{:04X} index={} (bus {}, address {})",
                vendor_id,
                product_id,
                index,
                device.bus_number(),
                device.address()
            );
            let mut handle = device.open()?;
            // The board enumerates as a HID device, so usbhid usually holds
            // interface 0. Without detaching it every transfer fails Busy.
            if handle.kernel_driver_active(0).unwrap_or(false) {
                if let Err(e) = handle.detach_kernel_driver(0) {
                    warn!("failed to detach kernel driver: {}", e);
                }
            }
            handle.claim_interface(0)?;
            self.handle = Some(handle);
            return Ok(true);
        }
        Ok(false)
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn write_interrupt(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize> {
        match self.handle {
            Some(ref mut handle) => Ok(handle.write_interrupt(endpoint, data, timeout)?),
            None => Err(libusb::Error::NoDevice.into()),
        }
    }

    fn read_interrupt(&mut self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        match self.handle {
            Some(ref mut handle) => Ok(handle.read_interrupt(endpoint, buf, timeout)?),
            None => Err(libusb::Error::NoDevice.into()),
        }
    }

    fn close(&mut self) {
        // Dropping the handle releases the claimed interface and closes it.
        self.handle = None;
    }
}
