//! Common error types for network operations

/// A common error type for link and broker operations.
///
/// Drivers are free to use their own error type; this enum is provided for
/// drivers and mocks that have nothing richer to report.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// No session is open with the broker.
    NotConnected,
    /// A scan could not be performed.
    ScanFailed,
    /// The broker refused the session.
    ConnectionRefused,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotConnected => defmt::write!(f, "NotConnected"),
            Error::ScanFailed => defmt::write!(f, "ScanFailed"),
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
        }
    }
}
