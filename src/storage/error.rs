//! Common error types for storage operations

/// Errors reported by the in-memory key-value store.
///
/// Kept `Copy` and allocation-free so it can be logged from any context.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The store has no free slot for a new key.
    Full,
    /// The key exceeds [`KEY_LEN`](super::KEY_LEN) bytes.
    KeyTooLong,
    /// The value exceeds [`VALUE_LEN`](super::VALUE_LEN) bytes.
    ValueTooLong,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Full => defmt::write!(f, "Full"),
            Error::KeyTooLong => defmt::write!(f, "KeyTooLong"),
            Error::ValueTooLong => defmt::write!(f, "ValueTooLong"),
        }
    }
}
