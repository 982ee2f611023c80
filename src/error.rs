use thiserror::Error;

/// Errors that can occur when driving a K8055 board.
///
/// Transport-level failures surface here from the [`crate::UsbTransport`]
/// implementation; [`crate::K8055::poll`] absorbs them into its boolean
/// result, so callers normally only see the contract-violation variants.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying libusb layer.
    #[error("USB transport error: {0}")]
    Usb(#[from] libusb::Error),
    /// No board matched the vendor/product ID at the requested index.
    #[error("no K8055 board found (VID=0x{vendor_id:04X}, PID=0x{product_id:04X}, index={index})")]
    DeviceNotFound {
        /// Vendor ID that was searched for.
        vendor_id: u16,
        /// Product ID that was searched for.
        product_id: u16,
        /// Zero-based index among matching boards.
        index: usize,
    },
    /// Digital port number is outside the valid range for the operation.
    #[error("port {port} out of range: {message}")]
    PortOutOfRange {
        /// The invalid port number that was specified.
        port: u8,
        /// The valid range for this operation.
        message: String,
    },
    /// The board returned fewer bytes than a full status packet.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Expected packet length.
        expected: usize,
        /// Byte count actually returned.
        actual: usize,
    },
    /// The command is declared by the board protocol but not implemented
    /// by this driver.
    #[error("command not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Result type alias for K8055 operations.
pub type Result<T> = std::result::Result<T, Error>;
